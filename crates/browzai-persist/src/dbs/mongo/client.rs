use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use browzai_types::{
    title_from_prompt, Conversation, ConversationWithMessages, Message, Role,
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{Client, Collection};

use crate::dbs::mongo::models::{MongoConversation, MongoMessage};
use crate::error::{Result, StoreError};
use crate::store::{validate_message, ConversationStore};

pub struct MongoConversationStore {
    conversations: Collection<MongoConversation>,
    messages: Collection<MongoMessage>,
}

impl MongoConversationStore {
    /// Connect to MongoDB and bind the `conversations` and `messages` collections
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let db = client.database(database);
        Ok(Self {
            conversations: db.collection("conversations"),
            messages: db.collection("messages"),
        })
    }

    async fn owned_conversation(
        &self,
        conversation_id: ObjectId,
        user_id: &str,
    ) -> Result<Option<MongoConversation>> {
        let filter = doc! { "_id": conversation_id, "user_id": user_id };
        Ok(self.conversations.find_one(filter).await?)
    }

    async fn insert_message(
        &self,
        conversation_id: ObjectId,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<MongoMessage> {
        let message = MongoMessage {
            id: ObjectId::new(),
            conversation_id,
            user_id: user_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.messages.insert_one(&message).await?;
        Ok(message)
    }
}

fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|e| StoreError::InvalidId(format!("{}: {}", id, e)))
}

#[async_trait]
impl ConversationStore for MongoConversationStore {
    async fn create_conversation(
        &self,
        user_id: &str,
        first_message: &str,
    ) -> Result<ConversationWithMessages> {
        validate_message(Role::User, first_message)?;

        let now = Utc::now();
        let conversation = MongoConversation {
            id: ObjectId::new(),
            user_id: user_id.to_string(),
            title: title_from_prompt(first_message),
            created_at: now,
            updated_at: now,
        };
        self.conversations.insert_one(&conversation).await?;

        let message = self
            .insert_message(conversation.id, user_id, Role::User, first_message)
            .await?;

        Ok(ConversationWithMessages {
            conversation: conversation.into(),
            messages: vec![message.into()],
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
        let object_id = parse_id(conversation_id)?;

        if self.owned_conversation(object_id, user_id).await?.is_none() {
            return Err(StoreError::ConversationNotFound(conversation_id.to_string()));
        }

        let message = self.insert_message(object_id, user_id, role, content).await?;

        let update = doc! {
            "$set": { "updated_at": bson::DateTime::from_chrono(message.created_at) }
        };
        self.conversations
            .update_one(doc! { "_id": object_id }, update)
            .await?;

        Ok(message.into())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Option<ConversationWithMessages>> {
        let object_id = parse_id(conversation_id)?;

        let Some(conversation) = self.owned_conversation(object_id, user_id).await? else {
            return Ok(None);
        };

        let messages: Vec<MongoMessage> = self
            .messages
            .find(doc! { "conversation_id": object_id })
            .sort(doc! { "created_at": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(Some(ConversationWithMessages {
            conversation: conversation.into(),
            messages: messages.into_iter().map(Message::from).collect(),
        }))
    }

    async fn list_conversations(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Conversation>> {
        let mut find = self
            .conversations
            .find(doc! { "user_id": user_id })
            .sort(doc! { "updated_at": -1 });

        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let conversations: Vec<MongoConversation> = find.await?.try_collect().await?;
        Ok(conversations.into_iter().map(Conversation::from).collect())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
