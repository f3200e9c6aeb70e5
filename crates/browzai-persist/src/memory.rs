use async_trait::async_trait;
use browzai_types::{
    title_from_prompt, Conversation, ConversationWithMessages, Message, MessageId, Role,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::{validate_message, ConversationStore};

#[derive(Debug, Clone)]
struct StoredConversation {
    conversation: Conversation,
    messages: Vec<Message>,
}

/// Process-local store, used for development and tests
#[derive(Clone, Default)]
pub struct InMemoryConversationStore {
    conversations: Arc<RwLock<HashMap<String, StoredConversation>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages across all conversations
    pub async fn message_count(&self) -> usize {
        self.conversations
            .read()
            .await
            .values()
            .map(|c| c.messages.len())
            .sum()
    }
}

fn durable_message(conversation_id: &str, role: Role, content: &str) -> Message {
    Message {
        id: MessageId::durable(uuid::Uuid::new_v4().to_string()),
        conversation_id: Some(conversation_id.to_string()),
        content: content.to_string(),
        role,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(
        &self,
        user_id: &str,
        first_message: &str,
    ) -> Result<ConversationWithMessages> {
        validate_message(Role::User, first_message)?;

        let now = Utc::now();
        let conversation = Conversation {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title_from_prompt(first_message),
            created_at: now,
            updated_at: now,
        };
        let messages = vec![durable_message(&conversation.id, Role::User, first_message)];

        let stored = StoredConversation {
            conversation,
            messages,
        };
        self.conversations
            .write()
            .await
            .insert(stored.conversation.id.clone(), stored.clone());

        tracing::debug!(conversation_id = %stored.conversation.id, "Created conversation");

        Ok(ConversationWithMessages {
            conversation: stored.conversation,
            messages: stored.messages,
        })
    }

    async fn add_message(
        &self,
        conversation_id: &str,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message> {
        validate_message(role, content)?;

        let mut conversations = self.conversations.write().await;
        let stored = conversations
            .get_mut(conversation_id)
            .filter(|c| c.conversation.user_id == user_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;

        let message = durable_message(conversation_id, role, content);
        stored.conversation.updated_at = message.created_at;
        stored.messages.push(message.clone());

        Ok(message)
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Option<ConversationWithMessages>> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .get(conversation_id)
            .filter(|c| c.conversation.user_id == user_id)
            .map(|c| ConversationWithMessages {
                conversation: c.conversation.clone(),
                messages: c.messages.clone(),
            }))
    }

    async fn list_conversations(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Conversation>> {
        let conversations = self.conversations.read().await;
        let mut owned: Vec<Conversation> = conversations
            .values()
            .filter(|c| c.conversation.user_id == user_id)
            .map(|c| c.conversation.clone())
            .collect();

        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        if let Some(limit) = limit {
            owned.truncate(limit.max(0) as usize);
        }

        Ok(owned)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
