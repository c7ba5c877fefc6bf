//! 编排器：一次用户输入到最终回答的完整回合
//!
//! Turn orchestrator. Owns the session's conversation log, the capability
//! registry fetched at connect time and the projected function schemas, and
//! drives each user query through at most two completions and one dispatch:
//!
//! ```text
//! AwaitingUser -> GeneratingFirst -> Done
//!                                 -> AwaitingDispatch -> GeneratingFollowup -> Done
//! ```
//!
//! Turns run strictly one after another. A failure anywhere in a turn is
//! returned to the caller; whatever was already appended to the log stays
//! there.

pub mod conversation;
pub mod dispatch;

use std::sync::Arc;

use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

use crate::client::CompletionClient;
use crate::mcp::CapabilityProvider;
use crate::registry::CapabilityRegistry;
use crate::types::message::Message;
use crate::types::tool::FunctionDefinition;
use crate::Result;

pub use conversation::Conversation;
pub use dispatch::Dispatcher;

/// Text returned when the first completion yields neither a call nor any text.
pub const NO_TOOL_FALLBACK: &str = "I didn't use any tools.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingUser,
    GeneratingFirst,
    AwaitingDispatch,
    GeneratingFollowup,
    Done,
}

pub struct McpAgent {
    provider: Arc<dyn CapabilityProvider>,
    registry: CapabilityRegistry,
    functions: Vec<FunctionDefinition>,
    client: CompletionClient,
    conversation: Conversation,
    state: TurnState,
    turns: u64,
    session_span: Span,
}

impl McpAgent {
    /// Fetch the registry once and project it. Listing failures only shrink
    /// the registry, so connecting itself cannot fail.
    pub async fn connect(provider: Arc<dyn CapabilityProvider>, client: CompletionClient) -> Self {
        let session_span = info_span!("session", id = %Uuid::new_v4(), backend = client.backend_id());
        let registry = CapabilityRegistry::fetch(provider.as_ref())
            .instrument(session_span.clone())
            .await;
        let functions = registry.function_schemas();

        Self {
            provider,
            registry,
            functions,
            client,
            conversation: Conversation::new(),
            state: TurnState::AwaitingUser,
            turns: 0,
            session_span,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn functions(&self) -> &[FunctionDefinition] {
        &self.functions
    }

    /// Run one turn and return the text to show the user.
    pub async fn process_query(&mut self, query: &str) -> Result<String> {
        self.turns += 1;
        let span = info_span!(parent: &self.session_span, "turn", n = self.turns);
        let outcome = self.run_turn(query).instrument(span).await;
        if outcome.is_err() {
            self.state = TurnState::AwaitingUser;
        }
        outcome
    }

    async fn run_turn(&mut self, query: &str) -> Result<String> {
        info!(query, "user query");
        self.conversation.append(Message::user(query));

        self.state = TurnState::GeneratingFirst;
        let first = self
            .client
            .complete(self.conversation.messages(), &self.functions, true)
            .await?;
        self.conversation.append(first.to_message());

        let Some(intent) = first.call else {
            self.state = TurnState::Done;
            if first.content.is_empty() {
                return Ok(NO_TOOL_FALLBACK.to_string());
            }
            return Ok(first.content);
        };

        self.state = TurnState::AwaitingDispatch;
        let result = Dispatcher::new(&self.registry, self.provider.as_ref())
            .dispatch(&intent)
            .await?;
        info!(
            function = %intent.name,
            is_error = result.is_error,
            result = %result.text,
            "call result"
        );
        self.conversation
            .append(Message::function(intent.name.clone(), result.text));

        self.state = TurnState::GeneratingFollowup;
        let followup = self
            .client
            .complete(self.conversation.messages(), &self.functions, false)
            .await?;
        self.conversation.append(Message::assistant(followup.content.clone()));

        self.state = TurnState::Done;
        Ok(followup.content)
    }
}
