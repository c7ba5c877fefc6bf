//! In-memory capability provider that records every call it receives

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use mcp_chat_client::mcp::{
    CallToolResult, GetPromptResult, McpContent, McpPrompt, McpResource, McpTool, PromptMessage,
    ReadResourceResult, ResourceContents,
};
use mcp_chat_client::{CapabilityCategory, CapabilityProvider, ProviderError};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    ReadResource(String),
    GetPrompt(String, Map<String, Value>),
    CallTool(String, Map<String, Value>),
}

#[derive(Default)]
pub struct FakeProvider {
    pub tools: Vec<McpTool>,
    pub resources: Vec<McpResource>,
    pub prompts: Vec<McpPrompt>,
    /// Contents served per resource URI.
    pub contents: HashMap<String, ReadResourceResult>,
    pub prompts_unsupported: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeProvider {
    /// One `add(a, b)` tool, one resource `alpha`, one prompt `greeting`.
    pub fn standard() -> Self {
        let mut contents = HashMap::new();
        contents.insert(
            "file:///alpha.txt".to_string(),
            ReadResourceResult {
                contents: vec![
                    ResourceContents::text("file:///alpha.txt", "alpha body"),
                    ResourceContents::text("file:///alpha.txt", "ignored"),
                ],
            },
        );
        contents.insert("file:///empty.txt".to_string(), ReadResourceResult::default());

        Self {
            tools: vec![
                McpTool {
                    name: "add".into(),
                    description: Some("Add two numbers".into()),
                    input_schema: Some(json!({
                        "type": "object",
                        "properties": {
                            "a": {"type": "number"},
                            "b": {"type": "number"}
                        },
                        "required": ["a", "b"]
                    })),
                },
                McpTool {
                    name: "explode".into(),
                    description: Some("Always fails".into()),
                    input_schema: None,
                },
                McpTool {
                    name: "grumpy".into(),
                    description: Some("Reports a tool-level error".into()),
                    input_schema: None,
                },
            ],
            resources: vec![
                McpResource {
                    uri: "file:///alpha.txt".into(),
                    name: "alpha".into(),
                    description: Some("First letter".into()),
                    mime_type: Some("text/plain".into()),
                },
                McpResource {
                    uri: "file:///empty.txt".into(),
                    name: "empty".into(),
                    description: None,
                    mime_type: None,
                },
            ],
            prompts: vec![McpPrompt {
                name: "greeting".into(),
                description: Some("Greets someone".into()),
                arguments: Vec::new(),
            }],
            contents,
            ..Self::default()
        }
    }

    /// Answer `prompts/list` as a server that does not offer prompts.
    pub fn without_prompts(mut self) -> Self {
        self.prompts_unsupported = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CapabilityProvider for FakeProvider {
    async fn list_tools(&self) -> Result<Vec<McpTool>, ProviderError> {
        Ok(self.tools.clone())
    }

    async fn list_resources(&self) -> Result<Vec<McpResource>, ProviderError> {
        Ok(self.resources.clone())
    }

    async fn list_prompts(&self) -> Result<Vec<McpPrompt>, ProviderError> {
        if self.prompts_unsupported {
            return Err(ProviderError::Unsupported(CapabilityCategory::Prompt));
        }
        Ok(self.prompts.clone())
    }

    async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, ProviderError> {
        self.record(RecordedCall::ReadResource(uri.to_string()));
        self.contents.get(uri).cloned().ok_or(ProviderError::Rpc {
            code: -32002,
            message: format!("unknown resource {uri}"),
        })
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<GetPromptResult, ProviderError> {
        self.record(RecordedCall::GetPrompt(name.to_string(), arguments.clone()));
        Ok(GetPromptResult {
            description: None,
            messages: vec![PromptMessage {
                role: "user".into(),
                content: McpContent::text(format!("Please greet the user warmly ({name}).")),
            }],
        })
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<CallToolResult, ProviderError> {
        self.record(RecordedCall::CallTool(name.to_string(), arguments.clone()));
        match name {
            "add" => {
                let a = arguments.get("a").and_then(Value::as_f64).unwrap_or(0.0);
                let b = arguments.get("b").and_then(Value::as_f64).unwrap_or(0.0);
                Ok(CallToolResult {
                    content: vec![McpContent::text(format!("{}", a + b))],
                    is_error: false,
                })
            }
            "grumpy" => Ok(CallToolResult {
                content: vec![McpContent::text("not today")],
                is_error: true,
            }),
            "explode" => Err(ProviderError::Rpc {
                code: -32603,
                message: "tool crashed".into(),
            }),
            _ => Ok(CallToolResult::default()),
        }
    }
}

pub fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
