//! Conversation messages exchanged with the completion backend

use serde::{Deserialize, Serialize};

use super::tool::CallIntent;

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Option<String>,
    /// Function name, set on function-result messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Call intent, set on assistant messages that requested a call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<CallIntent>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::text(MessageRole::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, text)
    }

    /// Assistant message carrying a call intent and no visible content.
    pub fn assistant_call(intent: CallIntent) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: None,
            name: None,
            function_call: Some(intent),
        }
    }

    /// Result of a dispatched call, answering the preceding assistant call.
    pub fn function(name: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Function,
            content: Some(result.into()),
            name: Some(name.into()),
            function_call: None,
        }
    }

    fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(text.into()),
            name: None,
            function_call: None,
        }
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Function,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Function => "function",
        }
    }
}

/// What the completion adapter hands back for one backend call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantTurn {
    /// Visible text. Empty whenever a call intent was recovered.
    pub content: String,
    pub call: Option<CallIntent>,
    /// Prose the model emitted before an embedded call marker. Logged, never shown.
    pub reasoning: Option<String>,
}

impl AssistantTurn {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            call: None,
            reasoning: None,
        }
    }

    pub fn call(intent: CallIntent, reasoning: Option<String>) -> Self {
        Self {
            content: String::new(),
            call: Some(intent),
            reasoning,
        }
    }

    pub fn has_call(&self) -> bool {
        self.call.is_some()
    }

    /// The message this turn contributes to the conversation log.
    pub fn to_message(&self) -> Message {
        match &self.call {
            Some(intent) => Message::assistant_call(intent.clone()),
            None => Message::assistant(self.content.clone()),
        }
    }
}
