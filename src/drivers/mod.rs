//! 后端驱动抽象层：把不同的补全接口统一成同一种助手回合
//!
//! Backend driver abstraction. Each driver turns the conversation log and the
//! projected function schemas into one HTTP request, and turns the backend's
//! JSON answer into an [`AssistantTurn`]. The HTTP exchange itself lives in
//! [`crate::client::CompletionClient`].
//!
//! Drivers differ in whether they can honor `allow_call = false` natively:
//! [`OpenAiFunctionsDriver`] sends `function_call: "none"`, while
//! [`PromptEndpointDriver`] has no such switch and suppresses call parsing on
//! its side instead. Either way no call intent comes back when calls are
//! disallowed.

pub mod openai;
pub mod prompt_endpoint;

use serde_json::Value;
use std::collections::HashMap;

use crate::types::message::{AssistantTurn, Message};
use crate::types::tool::FunctionDefinition;
use crate::Result;

pub use openai::OpenAiFunctionsDriver;
pub use prompt_endpoint::{build_tool_instructions, PromptEndpointDriver};

/// Unified HTTP request representation for backend communication.
#[derive(Debug, Clone)]
pub struct DriverRequest {
    /// Target URL.
    pub url: String,
    /// Request headers (JSON content type is added by the transport).
    pub headers: HashMap<String, String>,
    /// Serialized JSON request body.
    pub body: Value,
}

/// Backend-specific request building and response parsing.
pub trait CompletionDriver: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs.
    fn backend_id(&self) -> &str;

    /// Build the request for one completion over the whole conversation.
    fn build_request(
        &self,
        messages: &[Message],
        functions: &[FunctionDefinition],
        allow_call: bool,
    ) -> Result<DriverRequest>;

    /// Normalize a successful response body.
    fn parse_response(&self, body: &Value, allow_call: bool) -> Result<AssistantTurn>;
}

pub(crate) fn bearer_headers(token: Option<&str>) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("Accept".to_string(), "application/json".to_string());
    if let Some(token) = token {
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
    }
    headers
}
