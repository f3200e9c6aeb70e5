use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use browzai_types::{Conversation, ConversationWithMessages, Message, RequestContext, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

const MAX_LIMIT: i64 = 100;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    /// First user message; also used to derive the title
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddMessageRequest {
    #[schema(value_type = String, example = "user")]
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversationResponse {
    pub id: String,
    pub title: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    #[schema(value_type = String, example = "assistant")]
    pub role: Role,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversationDetailResponse {
    pub conversation: ConversationResponse,
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListConversationsResponse {
    pub conversations: Vec<ConversationResponse>,
    pub has_more: bool,
}

/// List the caller's conversations, most recently updated first
#[utoipa::path(
    get,
    path = "/api/conversations",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of conversations to return (default: 20, max: 100)")
    ),
    responses(
        (status = 200, description = "List of conversations", body = ListConversationsResponse),
        (status = 401, description = "No authenticated session")
    ),
    tag = "conversations"
)]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListConversationsQuery>,
) -> ApiResult<Json<ListConversationsResponse>> {
    let user = ctx.require_user()?;
    let limit = query.limit.clamp(1, MAX_LIMIT);

    let conversations = state
        .store
        .list_conversations(&user.id, Some(limit))
        .await?;

    let has_more = conversations.len() as i64 == limit;
    Ok(Json(ListConversationsResponse {
        conversations: conversations.into_iter().map(conversation_to_response).collect(),
        has_more,
    }))
}

/// Create a conversation from the first user message
#[utoipa::path(
    post,
    path = "/api/conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationDetailResponse),
        (status = 400, description = "Empty message"),
        (status = 401, description = "No authenticated session")
    ),
    tag = "conversations"
)]
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateConversationRequest>,
) -> ApiResult<(StatusCode, Json<ConversationDetailResponse>)> {
    let user = ctx.require_user()?;

    let created = state.store.create_conversation(&user.id, &req.message).await?;
    tracing::info!(
        request_id = %ctx.request_id,
        conversation_id = %created.conversation.id,
        "Conversation created"
    );

    Ok((StatusCode::CREATED, Json(detail_to_response(created)?)))
}

/// Get a conversation with its messages in creation order
#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation details", body = ConversationDetailResponse),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(conversation_id): Path<String>,
) -> ApiResult<Json<ConversationDetailResponse>> {
    let user = ctx.require_user()?;

    let conversation = state
        .store
        .get_conversation(&conversation_id, &user.id)
        .await?
        .ok_or(ApiError::ConversationNotFound(conversation_id))?;

    Ok(Json(detail_to_response(conversation)?))
}

/// Append a message to a conversation
#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_id}/messages",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    request_body = AddMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Invalid message"),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn add_message(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(conversation_id): Path<String>,
    Json(req): Json<AddMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let user = ctx.require_user()?;

    let message = state
        .store
        .add_message(&conversation_id, &user.id, req.role, &req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(message_to_response(message)?)))
}

fn conversation_to_response(conversation: Conversation) -> ConversationResponse {
    ConversationResponse {
        id: conversation.id,
        title: conversation.title,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
    }
}

/// Stored messages always carry a durable id and a conversation
fn message_to_response(message: Message) -> ApiResult<MessageResponse> {
    let id = message.id.as_durable().ok_or(ApiError::Internal)?.to_string();
    let conversation_id = message.conversation_id.ok_or(ApiError::Internal)?;
    Ok(MessageResponse {
        id,
        conversation_id,
        role: message.role,
        content: message.content,
        created_at: message.created_at,
    })
}

fn detail_to_response(detail: ConversationWithMessages) -> ApiResult<ConversationDetailResponse> {
    Ok(ConversationDetailResponse {
        conversation: conversation_to_response(detail.conversation),
        messages: detail
            .messages
            .into_iter()
            .map(message_to_response)
            .collect::<ApiResult<Vec<_>>>()?,
    })
}
