use browzai_types::{Message, MessageId};

/// Client-held messages that have no durable identity yet
///
/// Holds at most one transient assistant message; each update replaces it.
#[derive(Debug, Default)]
pub struct TransientState {
    messages: Vec<Message>,
}

impl TransientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        debug_assert!(message.is_transient());
        self.messages.push(message);
    }

    /// Replace the in-progress reply with a fresh entry holding all text so far
    pub fn set_assistant(&mut self, conversation_id: Option<String>, content: &str) {
        self.messages.retain(|m| !m.id.is_transient_assistant());
        self.messages
            .push(Message::transient_assistant(conversation_id, content));
    }

    pub fn assistant(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.id.is_transient_assistant())
    }

    /// Returns whether anything was removed
    pub fn remove(&mut self, id: &MessageId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| &m.id != id);
        self.messages.len() != before
    }

    /// Returns whether anything was cleared; clearing empty state is a no-op
    pub fn clear(&mut self) -> bool {
        let had_messages = !self.messages.is_empty();
        self.messages.clear();
        had_messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
