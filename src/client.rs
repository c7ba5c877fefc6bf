//! Completion client: one driver plus one HTTP transport.
//!
//! Each call sends the full conversation and gets back a normalized
//! [`AssistantTurn`]. Nothing is retried; a failed call surfaces as an error
//! and the caller decides what to do with the turn.

use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{AgentConfig, BackendConfig, HttpConfig};
use crate::drivers::{CompletionDriver, OpenAiFunctionsDriver, PromptEndpointDriver};
use crate::transport::HttpTransport;
use crate::types::message::{AssistantTurn, Message};
use crate::types::tool::FunctionDefinition;
use crate::Result;

#[derive(Debug)]
pub struct CompletionClient {
    driver: Box<dyn CompletionDriver>,
    transport: HttpTransport,
}

impl CompletionClient {
    pub fn new(driver: Box<dyn CompletionDriver>, transport: HttpTransport) -> Self {
        Self { driver, transport }
    }

    pub fn from_backend(backend: &BackendConfig, http: &HttpConfig) -> Result<Self> {
        let driver: Box<dyn CompletionDriver> = match backend {
            BackendConfig::OpenaiFunctions(cfg) => Box::new(OpenAiFunctionsDriver::from_config(cfg)),
            BackendConfig::PromptEndpoint(cfg) => Box::new(PromptEndpointDriver::from_config(cfg)),
        };
        Ok(Self::new(driver, HttpTransport::new(http)?))
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        Self::from_backend(&config.backend, &config.http)
    }

    pub fn backend_id(&self) -> &str {
        self.driver.backend_id()
    }

    /// Run one completion over `messages`.
    ///
    /// With `allow_call = false` the returned turn never carries a call
    /// intent, whatever the backend answered.
    pub async fn complete(
        &self,
        messages: &[Message],
        functions: &[FunctionDefinition],
        allow_call: bool,
    ) -> Result<AssistantTurn> {
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let request = self.driver.build_request(messages, functions, allow_call)?;

        let body = self
            .transport
            .post_json(&request.url, &request.headers, &request.body)
            .await?;

        info!(
            request_id = request_id.as_str(),
            backend = self.driver.backend_id(),
            duration_ms = start.elapsed().as_millis(),
            raw = %body,
            "completion received"
        );

        let mut turn = self.driver.parse_response(&body, allow_call)?;
        if !allow_call {
            turn.call = None;
        }
        debug!(
            request_id = request_id.as_str(),
            has_call = turn.has_call(),
            "completion parsed"
        );
        Ok(turn)
    }
}
