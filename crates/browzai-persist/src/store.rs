use async_trait::async_trait;
use browzai_types::{Conversation, ConversationWithMessages, Message, Role};

use crate::error::Result;

/// Durable conversation and message storage
///
/// Every operation is scoped to the owning user; a conversation that exists
/// but belongs to someone else is reported as not found.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a conversation seeded with the user's first message
    async fn create_conversation(
        &self,
        user_id: &str,
        first_message: &str,
    ) -> Result<ConversationWithMessages>;

    /// Append a message to an existing conversation
    async fn add_message(
        &self,
        conversation_id: &str,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message>;

    /// Persist the completed assistant reply as a single write
    async fn save_assistant_message(
        &self,
        conversation_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Message> {
        self.add_message(conversation_id, user_id, Role::Assistant, content)
            .await
    }

    /// Conversation with messages in creation order
    async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Option<ConversationWithMessages>>;

    /// Conversations for a user, most recently updated first
    async fn list_conversations(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Conversation>>;

    /// Short name of the backend, reported by health checks
    fn backend(&self) -> &'static str;
}

/// User turns must carry text; an assistant reply may legitimately be empty
pub(crate) fn validate_message(role: Role, content: &str) -> Result<()> {
    if role == Role::User && content.trim().is_empty() {
        return Err(crate::error::StoreError::InvalidMessage(
            "user message content is empty".to_string(),
        ));
    }
    Ok(())
}
