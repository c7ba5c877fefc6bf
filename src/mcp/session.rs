//! Newline-delimited JSON-RPC session with an MCP server.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use super::{
    CallToolResult, CapabilityProvider, GetPromptResult, McpPrompt, McpResource, McpTool,
    ProviderError, ReadResourceResult,
};
use crate::config::ProviderConfig;
use crate::types::tool::CapabilityCategory;
use crate::{Error, ErrorContext};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const METHOD_NOT_FOUND: i64 = -32601;

/// Upper bound on `nextCursor` pages followed for one listing.
const MAX_LIST_PAGES: usize = 64;

/// Session over a spawned server process.
pub type StdioProvider = McpSession<ChildStdout, ChildStdin>;

/// An initialized MCP session over any async byte stream pair.
pub struct McpSession<R, W> {
    channel: Mutex<JsonRpcChannel<R, W>>,
    capabilities: Value,
    server_info: Option<Value>,
    child: Mutex<Option<Child>>,
}

impl<R, W> McpSession<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Run the `initialize` handshake and return a ready session.
    pub async fn connect(reader: R, writer: W) -> Result<Self, ProviderError> {
        let mut channel = JsonRpcChannel::new(reader, writer);
        let result = channel
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            )
            .await?;
        channel
            .notify("notifications/initialized", json!({}))
            .await?;

        let capabilities = result
            .get("capabilities")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        let server_info = result.get("serverInfo").cloned();
        tracing::debug!(?server_info, %capabilities, "MCP session initialized");

        Ok(Self {
            channel: Mutex::new(channel),
            capabilities,
            server_info,
            child: Mutex::new(None),
        })
    }

    /// Whether the server advertised the given capability category.
    pub fn supports(&self, category: CapabilityCategory) -> bool {
        self.capabilities.get(category.as_str()).is_some()
    }

    pub fn server_info(&self) -> Option<&Value> {
        self.server_info.as_ref()
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.channel.lock().await.request(method, params).await
    }

    async fn list_all<T: DeserializeOwned>(
        &self,
        category: CapabilityCategory,
        method: &str,
    ) -> Result<Vec<T>, ProviderError> {
        if !self.supports(category) {
            return Err(ProviderError::Unsupported(category));
        }

        let key = category.as_str();
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_LIST_PAGES {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let mut result = self.request(method, params).await?;
            let page = result.get_mut(key).map(Value::take).unwrap_or(Value::Null);
            if !page.is_null() {
                items.extend(decode::<Vec<T>>(page, key)?);
            }
            match result.get("nextCursor").and_then(Value::as_str) {
                Some(next) if !next.is_empty() => cursor = Some(next.to_string()),
                _ => return Ok(items),
            }
        }
        tracing::warn!(method, pages = MAX_LIST_PAGES, "listing still paginating, truncated");
        Ok(items)
    }

    /// Stop the server process, if this session owns one.
    pub async fn shutdown(&self) -> Result<(), ProviderError> {
        if let Some(mut child) = self.child.lock().await.take() {
            tracing::info!("stopping capability provider");
            child.kill().await?;
        }
        Ok(())
    }
}

impl McpSession<ChildStdout, ChildStdin> {
    /// Spawn the server script and initialize a session over its stdio.
    ///
    /// The child is killed when the session is dropped.
    pub async fn launch(script: &Path, config: &ProviderConfig) -> crate::Result<Self> {
        let (program, args) = launch_command(script, config)?;
        tracing::info!(%program, ?args, "starting capability provider");

        let mut command = Command::new(&program);
        command
            .args(&args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        let mut child = command.spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProviderError::Protocol("child stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProviderError::Protocol("child stdout unavailable".into()))?;

        let mut session = Self::connect(stdout, stdin).await?;
        *session.child.get_mut() = Some(child);
        Ok(session)
    }
}

/// Resolve the program and arguments used to start a server script.
///
/// An explicitly configured command wins; otherwise `.py` scripts run under
/// `python` and `.js` scripts under `node`.
pub fn launch_command(
    script: &Path,
    config: &ProviderConfig,
) -> crate::Result<(String, Vec<String>)> {
    let script_arg = script.to_string_lossy().into_owned();
    let program = match &config.command {
        Some(command) => command.clone(),
        None => match script.extension().and_then(|e| e.to_str()) {
            Some("py") => "python".to_string(),
            Some("js") => "node".to_string(),
            _ => {
                return Err(Error::configuration_with_context(
                    "Server script path must end with .py or .js",
                    ErrorContext::new()
                        .with_field_path("provider.command")
                        .with_details(script_arg)
                        .with_source("stdio_launcher"),
                ))
            }
        },
    };

    let mut args = config.args.clone();
    args.push(script_arg);
    Ok((program, args))
}

#[async_trait]
impl<R, W> CapabilityProvider for McpSession<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn list_tools(&self) -> Result<Vec<McpTool>, ProviderError> {
        self.list_all(CapabilityCategory::Tool, "tools/list").await
    }

    async fn list_resources(&self) -> Result<Vec<McpResource>, ProviderError> {
        self.list_all(CapabilityCategory::Resource, "resources/list")
            .await
    }

    async fn list_prompts(&self) -> Result<Vec<McpPrompt>, ProviderError> {
        self.list_all(CapabilityCategory::Prompt, "prompts/list").await
    }

    #[tracing::instrument(skip(self))]
    async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, ProviderError> {
        let result = self
            .request("resources/read", json!({ "uri": uri }))
            .await?;
        decode(result, "resources/read result")
    }

    #[tracing::instrument(skip(self, arguments))]
    async fn get_prompt(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<GetPromptResult, ProviderError> {
        let mut params = json!({ "name": name });
        if !arguments.is_empty() {
            // prompts/get takes string-valued arguments only
            let stringified: Map<String, Value> = arguments
                .iter()
                .map(|(k, v)| {
                    let s = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), Value::String(s))
                })
                .collect();
            params["arguments"] = Value::Object(stringified);
        }
        let result = self.request("prompts/get", params).await?;
        decode(result, "prompts/get result")
    }

    #[tracing::instrument(skip(self, arguments))]
    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<CallToolResult, ProviderError> {
        let result = self
            .request(
                "tools/call",
                json!({ "name": name, "arguments": Value::Object(arguments.clone()) }),
            )
            .await?;
        decode(result, "tools/call result")
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ProviderError> {
    serde_json::from_value(value).map_err(|e| ProviderError::Protocol(format!("invalid {what}: {e}")))
}

/// One JSON-RPC message per line in each direction.
struct JsonRpcChannel<R, W> {
    reader: BufReader<R>,
    writer: W,
    next_id: u64,
}

impl<R, W> JsonRpcChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            next_id: 1,
        }
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id;
        self.next_id += 1;
        self.write_message(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        }))
        .await?;

        loop {
            let message = self.read_message().await?;
            if message.get("method").is_some() {
                self.handle_server_message(&message).await?;
                continue;
            }
            // A server that could not parse the request answers with a null id.
            if message.get("error").is_some() && message.get("id").map_or(true, Value::is_null) {
                return into_result(message);
            }
            match message.get("id").and_then(Value::as_u64) {
                Some(response_id) if response_id == id => return into_result(message),
                other => {
                    tracing::warn!(?other, expected = id, "discarding response with unexpected id");
                }
            }
        }
    }

    async fn notify(&mut self, method: &str, params: Value) -> Result<(), ProviderError> {
        self.write_message(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        }))
        .await
    }

    /// Notifications are skipped; requests from the server are answered so it
    /// never blocks waiting on us.
    async fn handle_server_message(&mut self, message: &Value) -> Result<(), ProviderError> {
        let method = message
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let Some(id) = message.get("id").cloned() else {
            tracing::debug!(%method, "server notification");
            return Ok(());
        };

        let reply = if method == "ping" {
            json!({ "jsonrpc": "2.0", "id": id, "result": {} })
        } else {
            tracing::debug!(%method, "rejecting server request");
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {
                    "code": METHOD_NOT_FOUND,
                    "message": format!("method not supported by client: {method}")
                }
            })
        };
        self.write_message(&reply).await
    }

    async fn write_message(&mut self, message: &Value) -> Result<(), ProviderError> {
        let mut line = message.to_string();
        tracing::trace!(%line, "-> provider");
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_message(&mut self) -> Result<Value, ProviderError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(ProviderError::Closed);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            tracing::trace!(line = trimmed, "<- provider");
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => return Ok(value),
                Err(e) => tracing::warn!(error = %e, "skipping non-JSON line from provider"),
            }
        }
    }
}

fn into_result(mut message: Value) -> Result<Value, ProviderError> {
    if let Some(error) = message.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let text = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        return Err(ProviderError::Rpc {
            code,
            message: text,
        });
    }
    match message.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(ProviderError::Protocol(
            "response has neither result nor error".into(),
        )),
    }
}
