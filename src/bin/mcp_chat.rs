//! mcp-chat：连接 MCP 服务器并与语言模型交互的命令行工具
//!
//! Usage:
//!   mcp-chat <path-to-server-script> [--config <file>]
//!
//! Starts the server script (`.py` under python, `.js` under node unless a
//! command is configured), lists its capabilities, then reads queries from
//! stdin until `quit` or end of input. Model output and call details go to
//! the configured log file, not the terminal.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use mcp_chat_client::{AgentConfig, CompletionClient, McpAgent, StdioProvider};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((script, config_path)) = parse_args(&args) else {
        print_usage();
        std::process::exit(1);
    };

    if let Err(e) = run(&script, config_path.as_deref()).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"Usage: mcp-chat <path-to-server-script> [--config <file>]

ENVIRONMENT:
    MCP_CHAT_CONFIG             Config file used when --config is absent
    GROQ_API_KEY                API key for the default backend
    RUST_LOG                    Log filter for the log file (default: info)"#
    );
}

fn parse_args(args: &[String]) -> Option<(PathBuf, Option<PathBuf>)> {
    let mut script = None;
    let mut config = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(iter.next()?)),
            "-h" | "--help" => return None,
            other if script.is_none() => script = Some(PathBuf::from(other)),
            _ => return None,
        }
    }
    Some((script?, config))
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

async fn run(script: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = AgentConfig::load(config_path)?;
    init_logging(&config.log_file)?;

    let provider = Arc::new(
        StdioProvider::launch(script, &config.provider)
            .await
            .with_context(|| format!("failed to start server {}", script.display()))?,
    );
    tracing::info!(server = ?provider.server_info(), "connected to capability provider");
    let client = CompletionClient::from_config(&config)?;
    let mut agent = McpAgent::connect(provider.clone(), client).await;

    let tools: Vec<&str> = agent.registry().tools().map(|t| t.name.as_str()).collect();
    println!("\nConnected to server with tools: {tools:?}");

    let outcome = chat_loop(&mut agent).await;
    provider.shutdown().await?;
    outcome
}

async fn chat_loop(agent: &mut McpAgent) -> anyhow::Result<()> {
    println!("\nMCP Client Started!");
    println!("Type your queries or 'quit' to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"\nQuery: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.eq_ignore_ascii_case("quit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match agent.process_query(query).await {
            Ok(answer) => println!("\n{answer}"),
            Err(e) => println!("\nError: {e}"),
        }
    }
    Ok(())
}
