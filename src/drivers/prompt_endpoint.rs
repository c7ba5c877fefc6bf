//! Single-prompt completion endpoint.
//!
//! The endpoint takes one flattened prompt and answers `{"answer": "..."}`.
//! It has no function-calling support of its own, so the available functions
//! are described in a system block and the answer goes through
//! [`parse_assistant_output`].

use serde_json::{json, Value};

use super::{bearer_headers, CompletionDriver, DriverRequest};
use crate::config::PromptEndpointConfig;
use crate::types::message::{AssistantTurn, Message, MessageRole};
use crate::types::tool::FunctionDefinition;
use crate::utils::parse_assistant_output;
use crate::Result;

#[derive(Debug)]
pub struct PromptEndpointDriver {
    url: String,
    endpoint: String,
    access_token: Option<String>,
}

impl PromptEndpointDriver {
    pub fn new(url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            endpoint: endpoint.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn from_config(config: &PromptEndpointConfig) -> Self {
        let driver = Self::new(config.api_base_url.clone(), config.endpoint.clone());
        match config.resolve_access_token() {
            Some(token) => driver.with_access_token(token),
            None => {
                tracing::warn!(env = %config.access_token_env, "no access token found for prompt endpoint");
                driver
            }
        }
    }

    /// Flatten the log into `role: content` lines.
    pub fn render_prompt(
        messages: &[Message],
        functions: &[FunctionDefinition],
        allow_call: bool,
    ) -> String {
        let mut lines = Vec::with_capacity(messages.len() + 1);
        if allow_call && !functions.is_empty() {
            lines.push(format!(
                "{}: {}",
                MessageRole::System.as_str(),
                build_tool_instructions(functions)
            ));
        }
        for m in messages {
            let content = match &m.function_call {
                // Show the model its own earlier call so it does not repeat it.
                Some(call) => json!({
                    "function_call": { "name": call.name, "arguments": call.arguments }
                })
                .to_string(),
                None => m.content_str().to_string(),
            };
            lines.push(format!("{}: {}", m.role.as_str(), content));
        }
        lines.join("\n")
    }
}

impl CompletionDriver for PromptEndpointDriver {
    fn backend_id(&self) -> &str {
        &self.endpoint
    }

    fn build_request(
        &self,
        messages: &[Message],
        functions: &[FunctionDefinition],
        allow_call: bool,
    ) -> Result<DriverRequest> {
        let prompt = Self::render_prompt(messages, functions, allow_call);
        let body = json!({
            "access_token": self.access_token.as_deref().unwrap_or_default(),
            "endpoint": self.endpoint,
            "params": { "prompt": prompt },
        });
        Ok(DriverRequest {
            url: self.url.clone(),
            headers: bearer_headers(self.access_token.as_deref()),
            body,
        })
    }

    fn parse_response(&self, body: &Value, allow_call: bool) -> Result<AssistantTurn> {
        let answer = body
            .get("answer")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if allow_call {
            Ok(parse_assistant_output(answer))
        } else {
            Ok(AssistantTurn::text(answer))
        }
    }
}

const TOOL_RULES: &str = r#"Rules:
1. Output only valid JSON when calling a function, with no markdown or extra text.
2. Always use double quotes for keys and string values.
3. If you can answer directly, respond with plain text.
4. Always choose the most appropriate tool.
5. Add no other text when you make a tool call.
6. If a tool call has already been made, analyze its result and present it to the user. Do not execute it again.

Below is the list of tools you can call.
When using a tool, you MUST respond in the following JSON format and ONLY with this:

{
  "function_call": {
    "name": "<tool_name>",
    "arguments": {
      "<arg1>": "<value1>",
      "<arg2>": "<value2>"
    }
  }
}

TOOLS AVAILABLE:"#;

/// System block that teaches a plain-text model the call format and lists
/// every projected function with its parameters.
pub fn build_tool_instructions(functions: &[FunctionDefinition]) -> String {
    let entries = functions
        .iter()
        .map(|f| {
            format!(
                "Tool name: \"{}\"\nDescription: {}\nParameters:\n{}",
                f.name,
                f.description.as_deref().unwrap_or("No description provided."),
                format_parameters(&f.parameters)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{TOOL_RULES}\n{entries}\n")
}

fn format_parameters(schema: &Value) -> String {
    let properties = match schema.get("properties").and_then(Value::as_object) {
        Some(p) if !p.is_empty() => p,
        _ => return "This tool takes no parameters.".to_string(),
    };
    properties
        .iter()
        .map(|(name, prop)| {
            let ty = prop.get("type").and_then(Value::as_str).unwrap_or("string");
            let desc = prop
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            format!("  - \"{name}\" ({ty}): {desc}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
