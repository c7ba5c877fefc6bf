//! Mock completion backend for integration tests

use mcp_chat_client::config::HttpConfig;
use mcp_chat_client::drivers::{CompletionDriver, OpenAiFunctionsDriver, PromptEndpointDriver};
use mcp_chat_client::transport::HttpTransport;
use mcp_chat_client::CompletionClient;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

pub const CHAT_PATH: &str = "/chat/completions";
pub const PROMPT_PATH: &str = "/run";

/// Test fixture that owns a mock server standing in for the LLM backend
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    pub fn openai_client(&self) -> CompletionClient {
        self.client_with(Box::new(
            OpenAiFunctionsDriver::new(&self.base_url, "test-model").with_api_key("sk-test"),
        ))
    }

    pub fn prompt_endpoint_client(&self) -> CompletionClient {
        self.client_with(Box::new(
            PromptEndpointDriver::new(format!("{}{PROMPT_PATH}", self.base_url), "test-endpoint")
                .with_access_token("tok"),
        ))
    }

    fn client_with(&self, driver: Box<dyn CompletionDriver>) -> CompletionClient {
        let transport = HttpTransport::new(&HttpConfig::default()).expect("transport");
        CompletionClient::new(driver, transport)
    }

    /// Chat completion answering with the given assistant message, matched on
    /// the request's `function_call` mode ("auto" or "none").
    pub async fn mock_chat(&mut self, call_mode: &str, message: Value) -> Mock {
        self.mock_chat_times(call_mode, message, 1).await
    }

    pub async fn mock_chat_times(&mut self, call_mode: &str, message: Value, hits: usize) -> Mock {
        self.server
            .mock("POST", CHAT_PATH)
            .match_body(Matcher::PartialJson(json!({ "function_call": call_mode })))
            .expect(hits)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "choices": [{ "index": 0, "message": message }] }).to_string())
            .create_async()
            .await
    }

    /// Chat completion for a request that carries no function list at all.
    pub async fn mock_chat_without_functions(&mut self, message: Value) -> Mock {
        self.server
            .mock("POST", CHAT_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "choices": [{ "index": 0, "message": message }] }).to_string())
            .create_async()
            .await
    }

    /// Prompt endpoint answer for requests whose body matches `pattern`.
    pub async fn mock_prompt(&mut self, pattern: &str, answer: &str) -> Mock {
        self.server
            .mock("POST", PROMPT_PATH)
            .match_body(Matcher::Regex(pattern.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "answer": answer }).to_string())
            .create_async()
            .await
    }

    pub async fn mock_error_response(&mut self, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}
