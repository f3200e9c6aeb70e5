use bson::oid::ObjectId;
use browzai_types::{Conversation, Message, MessageId, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MongoDB-specific conversation document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConversation {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: String,
    pub title: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// MongoDB-specific message document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub conversation_id: ObjectId,
    pub user_id: String,
    pub role: Role,
    pub content: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl From<MongoConversation> for Conversation {
    fn from(doc: MongoConversation) -> Self {
        Self {
            id: doc.id.to_hex(),
            user_id: doc.user_id,
            title: doc.title,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

impl From<MongoMessage> for Message {
    fn from(doc: MongoMessage) -> Self {
        Self {
            id: MessageId::durable(doc.id.to_hex()),
            conversation_id: Some(doc.conversation_id.to_hex()),
            content: doc.content,
            role: doc.role,
            created_at: doc.created_at,
        }
    }
}
