//! OpenAI-compatible chat completions using the `functions` parameter.
//!
//! Works with Groq, OpenAI and other backends that still accept the legacy
//! `functions` / `function_call` pair.

use serde_json::{json, Value};

use super::{bearer_headers, CompletionDriver, DriverRequest};
use crate::config::OpenAiBackendConfig;
use crate::types::message::{AssistantTurn, Message, MessageRole};
use crate::types::tool::{CallIntent, FunctionDefinition};
use crate::utils::parse_assistant_output;
use crate::{Error, ErrorContext, Result};

#[derive(Debug)]
pub struct OpenAiFunctionsDriver {
    url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: Option<u32>,
}

impl OpenAiFunctionsDriver {
    pub fn new(base_url: &str, model: impl Into<String>) -> Self {
        Self {
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: None,
            max_tokens: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn from_config(config: &OpenAiBackendConfig) -> Self {
        let driver = Self::new(&config.base_url, config.model.clone())
            .with_max_tokens(config.max_tokens);
        match config.resolve_api_key() {
            Some(key) => driver.with_api_key(key),
            None => {
                tracing::warn!(env = %config.api_key_env, "no API key found for completion backend");
                driver
            }
        }
    }

    fn encode_message(message: &Message) -> Value {
        match (&message.role, &message.function_call) {
            (MessageRole::Assistant, Some(call)) => json!({
                "role": "assistant",
                "content": Value::Null,
                "function_call": {
                    "name": call.name,
                    "arguments": call.arguments_json(),
                }
            }),
            (MessageRole::Function, _) => json!({
                "role": "function",
                "name": message.name.as_deref().unwrap_or_default(),
                "content": message.content_str(),
            }),
            (role, _) => json!({
                "role": role.as_str(),
                "content": message.content_str(),
            }),
        }
    }

    /// Structured call from the message itself, if the backend produced one.
    fn native_call(message: &Value) -> Option<CallIntent> {
        if let Some(call) = message.get("function_call").and_then(CallIntent::from_value) {
            return Some(call);
        }
        let tool_calls = message.get("tool_calls")?.as_array()?;
        if tool_calls.len() > 1 {
            tracing::warn!(
                count = tool_calls.len(),
                "backend requested several calls, only the first is executed"
            );
        }
        tool_calls
            .first()
            .and_then(|tc| tc.get("function"))
            .and_then(CallIntent::from_value)
    }
}

impl CompletionDriver for OpenAiFunctionsDriver {
    fn backend_id(&self) -> &str {
        &self.model
    }

    fn build_request(
        &self,
        messages: &[Message],
        functions: &[FunctionDefinition],
        allow_call: bool,
    ) -> Result<DriverRequest> {
        let mut body = json!({
            "model": self.model,
            "messages": messages.iter().map(Self::encode_message).collect::<Vec<_>>(),
        });
        if let Some(mt) = self.max_tokens {
            body["max_tokens"] = json!(mt);
        }
        // An empty functions array is rejected by most backends.
        if !functions.is_empty() {
            body["functions"] = serde_json::to_value(functions)?;
            body["function_call"] = json!(if allow_call { "auto" } else { "none" });
        }

        Ok(DriverRequest {
            url: self.url.clone(),
            headers: bearer_headers(self.api_key.as_deref()),
            body,
        })
    }

    fn parse_response(&self, body: &Value, allow_call: bool) -> Result<AssistantTurn> {
        let message = body.pointer("/choices/0/message").ok_or_else(|| {
            Error::runtime_with_context(
                "completion response has no message",
                ErrorContext::new()
                    .with_field_path("choices[0].message")
                    .with_source("openai_functions_driver"),
            )
        })?;
        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if !allow_call {
            return Ok(AssistantTurn::text(content));
        }

        if let Some(call) = Self::native_call(message) {
            let reasoning = Some(content.trim())
                .filter(|s| !s.is_empty())
                .map(String::from);
            return Ok(AssistantTurn::call(call, reasoning));
        }

        // Some models answer with the call JSON as plain content.
        Ok(parse_assistant_output(content))
    }
}
