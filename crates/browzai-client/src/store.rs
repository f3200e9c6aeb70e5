use async_trait::async_trait;
use browzai_persist::{ConversationStore, Result, StoreError};
use browzai_types::{Conversation, ConversationWithMessages, Message, MessageId, Role};
use chrono::{DateTime, Utc};
use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::http::ApiConnection;

#[derive(Debug, Deserialize)]
struct WireConversation {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    conversation_id: String,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct WireDetail {
    conversation: WireConversation,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireList {
    conversations: Vec<WireConversation>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
}

#[derive(Serialize)]
struct CreateBody<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct AddMessageBody<'a> {
    role: Role,
    content: &'a str,
}

impl WireConversation {
    fn into_domain(self, user_id: &str) -> Conversation {
        Conversation {
            id: self.id,
            user_id: user_id.to_string(),
            title: self.title,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Self {
            id: MessageId::durable(wire.id),
            conversation_id: Some(wire.conversation_id),
            content: wire.content,
            role: wire.role,
            created_at: wire.created_at,
        }
    }
}

impl WireDetail {
    fn into_domain(self, user_id: &str) -> ConversationWithMessages {
        ConversationWithMessages {
            conversation: self.conversation.into_domain(user_id),
            messages: self.messages.into_iter().map(Message::from).collect(),
        }
    }
}

/// Conversation store reached through the API's conversation routes
///
/// The server derives the owner from the session, so `user_id` only fills in
/// the returned records.
pub struct HttpConversationStore {
    connection: ApiConnection,
}

impl HttpConversationStore {
    pub fn new(connection: ApiConnection) -> Self {
        Self { connection }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Response> {
        builder
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| StoreError::Internal(format!("Malformed store response: {}", e)))
}

async fn error_for(response: Response, conversation_id: Option<&str>) -> StoreError {
    let status = response.status();
    let message = match response.json::<WireError>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };

    match (status, conversation_id) {
        (StatusCode::NOT_FOUND, Some(id)) => StoreError::ConversationNotFound(id.to_string()),
        (StatusCode::BAD_REQUEST, _) => StoreError::InvalidMessage(message),
        _ => StoreError::Remote {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl ConversationStore for HttpConversationStore {
    async fn create_conversation(
        &self,
        user_id: &str,
        first_message: &str,
    ) -> Result<ConversationWithMessages> {
        let response = self
            .send(
                self.connection
                    .request(Method::POST, "/api/conversations")
                    .json(&CreateBody {
                        message: first_message,
                    }),
            )
            .await?;

        if !response.status().is_success() {
            return Err(error_for(response, None).await);
        }

        let detail: WireDetail = read_json(response).await?;
        tracing::debug!(conversation_id = %detail.conversation.id, "Conversation created");
        Ok(detail.into_domain(user_id))
    }

    async fn add_message(
        &self,
        conversation_id: &str,
        _user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message> {
        let path = format!("/api/conversations/{}/messages", conversation_id);
        let response = self
            .send(
                self.connection
                    .request(Method::POST, &path)
                    .json(&AddMessageBody { role, content }),
            )
            .await?;

        if !response.status().is_success() {
            return Err(error_for(response, Some(conversation_id)).await);
        }

        let message: WireMessage = read_json(response).await?;
        Ok(message.into())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Option<ConversationWithMessages>> {
        let path = format!("/api/conversations/{}", conversation_id);
        let response = self
            .send(self.connection.request(Method::GET, &path))
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let detail: WireDetail = read_json(response).await?;
                Ok(Some(detail.into_domain(user_id)))
            }
            _ => Err(error_for(response, Some(conversation_id)).await),
        }
    }

    async fn list_conversations(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Conversation>> {
        let mut builder = self.connection.request(Method::GET, "/api/conversations");
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit)]);
        }

        let response = self.send(builder).await?;
        if !response.status().is_success() {
            return Err(error_for(response, None).await);
        }

        let list: WireList = read_json(response).await?;
        Ok(list
            .conversations
            .into_iter()
            .map(|c| c.into_domain(user_id))
            .collect())
    }

    fn backend(&self) -> &'static str {
        "http"
    }
}
