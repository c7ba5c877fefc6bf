use crate::types::message::Message;

/// Append-only message log for one session.
///
/// Every completion call receives the whole log. Nothing is ever removed or
/// rewritten, so the log grows without bound for the session's lifetime.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        tracing::debug!(role = message.role.as_str(), index = self.messages.len(), "message appended");
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
