//! # mcp-chat-client
//!
//! 让语言模型调用 MCP 服务器所提供的工具、资源与提示模板的对话代理。
//!
//! A conversational agent loop that lets a language model invoke the tools,
//! resources and prompt templates exposed by an MCP server, and folds the
//! results back into the conversation.
//!
//! ## Overview
//!
//! At session start the agent lists the server's capabilities and projects
//! them into one flat function namespace: tools keep their name, resources
//! become `get_resource_<name>` and prompts become `use_prompt_<name>`. Each
//! user query then runs as one turn:
//!
//! 1. the query is appended to the conversation log;
//! 2. the backend completes the log with calls allowed;
//! 3. a call intent, native or embedded in the text as
//!    `{"function_call": {...}}`, is dispatched to the server;
//! 4. the result is appended and a follow-up completion, with calls
//!    disallowed, produces the final answer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use mcp_chat_client::{AgentConfig, CompletionClient, McpAgent, StdioProvider};
//!
//! #[tokio::main]
//! async fn main() -> mcp_chat_client::Result<()> {
//!     let config = AgentConfig::load(None)?;
//!     let provider = Arc::new(StdioProvider::launch(Path::new("server.py"), &config.provider).await?);
//!     let client = CompletionClient::from_config(&config)?;
//!
//!     let mut agent = McpAgent::connect(provider.clone(), client).await;
//!     println!("{}", agent.process_query("add 2 and 3").await?);
//!
//!     provider.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | Turn orchestration, conversation log, dispatcher |
//! | [`registry`] | Capabilities fetched once per session |
//! | [`mcp`] | Provider trait, descriptor types, projection, stdio session |
//! | [`client`] | Completion adapter over a driver and the HTTP transport |
//! | [`drivers`] | Backend-specific request building and response parsing |
//! | [`utils`] | Response parser recovering call intents from model text |
//! | [`config`] | YAML / environment / keyring configuration |

pub mod agent;
pub mod client;
pub mod config;
pub mod drivers;
pub mod mcp;
pub mod registry;
pub mod transport;
pub mod types;
pub mod utils;

pub use agent::{Conversation, McpAgent, TurnState};
pub use client::CompletionClient;
pub use config::AgentConfig;
pub use mcp::{CapabilityProvider, ProviderError, StdioProvider};
pub use registry::CapabilityRegistry;
pub use types::{
    message::{AssistantTurn, Message, MessageRole},
    tool::{CallIntent, CapabilityCategory, DispatchResult, FunctionDefinition},
};
pub use utils::parse_assistant_output;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
