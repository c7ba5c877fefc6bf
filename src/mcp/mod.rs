//! MCP 能力模块：工具、资源与提示模板的描述符及提供方接口
//!
//! Capability provider module. Describes the tools, resources and prompt
//! templates an MCP server exposes, the async interface the orchestrator
//! consumes them through, and a stdio JSON-RPC implementation of it.
//!
//! This module handles:
//! - Descriptor types mirroring the server's listing responses
//! - The [`CapabilityProvider`] trait (list / read / get / call)
//! - Projection of descriptors into one function namespace ([`bridge`])
//! - A newline-delimited JSON-RPC session over a child process ([`session`])

pub mod bridge;
pub mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::types::tool::CapabilityCategory;

pub use bridge::{project, CallTarget, PROMPT_PREFIX, RESOURCE_PREFIX};
pub use session::{McpSession, StdioProvider};

/// A tool as received from a server's `tools/list` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    /// Tool name (unique within a server).
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// JSON Schema describing the tool's input parameters.
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Option<Value>,
}

/// A readable resource from `resources/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResource {
    /// Locator used by `resources/read`.
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
}

/// A prompt template from `prompts/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPrompt {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<McpPromptArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpPromptArgument {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// One capability of any category, as fetched at session start.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityDescriptor {
    Tool(McpTool),
    Resource(McpResource),
    Prompt(McpPrompt),
}

impl CapabilityDescriptor {
    pub fn name(&self) -> &str {
        match self {
            CapabilityDescriptor::Tool(t) => &t.name,
            CapabilityDescriptor::Resource(r) => &r.name,
            CapabilityDescriptor::Prompt(p) => &p.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            CapabilityDescriptor::Tool(t) => t.description.as_deref(),
            CapabilityDescriptor::Resource(r) => r.description.as_deref(),
            CapabilityDescriptor::Prompt(p) => p.description.as_deref(),
        }
    }

    pub fn category(&self) -> CapabilityCategory {
        match self {
            CapabilityDescriptor::Tool(_) => CapabilityCategory::Tool,
            CapabilityDescriptor::Resource(_) => CapabilityCategory::Resource,
            CapabilityDescriptor::Prompt(_) => CapabilityCategory::Prompt,
        }
    }
}

/// Content block within a tool result or prompt message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl McpContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: Some(text.into()),
            extra: HashMap::new(),
        }
    }

    /// The text of this block, or its JSON rendering when it carries none.
    pub fn render(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => serde_json::to_string(self).unwrap_or_default(),
        }
    }
}

/// Result of `resources/read`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReadResourceResult {
    #[serde(default)]
    pub contents: Vec<ResourceContents>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContents {
    #[serde(default)]
    pub uri: String,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub blob: Option<String>,
}

impl ResourceContents {
    pub fn text(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: None,
            text: Some(text.into()),
            blob: None,
        }
    }
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetPromptResult {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub messages: Vec<PromptMessage>,
}

impl GetPromptResult {
    /// Text representation of the prompt: the text of every message, one per
    /// line. Falls back to the JSON rendering when no message carries text.
    pub fn render(&self) -> String {
        let texts: Vec<&str> = self
            .messages
            .iter()
            .filter_map(|m| m.content.text.as_deref())
            .collect();
        if texts.is_empty() {
            serde_json::to_string(self).unwrap_or_default()
        } else {
            texts.join("\n")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: McpContent,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<McpContent>,
    /// Whether the tool execution resulted in an error.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    /// All content blocks joined by newlines; empty when there is no content.
    pub fn render(&self) -> String {
        self.content
            .iter()
            .map(McpContent::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Failures talking to a capability provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("server does not support {0}")]
    Unsupported(CapabilityCategory),

    #[error("server connection closed")]
    Closed,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the orchestrator needs from a capability provider.
///
/// Listings may fail independently; callers treat a failed listing as an empty
/// category. Failures of `read_resource`, `get_prompt` and `call_tool` are
/// propagated to whoever runs the turn.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<McpTool>, ProviderError>;

    async fn list_resources(&self) -> Result<Vec<McpResource>, ProviderError>;

    async fn list_prompts(&self) -> Result<Vec<McpPrompt>, ProviderError>;

    async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, ProviderError>;

    async fn get_prompt(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<GetPromptResult, ProviderError>;

    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<CallToolResult, ProviderError>;
}
