use axum::Json;
use utoipa::OpenApi;

use crate::handlers::stream;
use crate::routes::{auth, conversations, health, profile};

#[derive(OpenApi)]
#[openapi(
    info(title = "Browzai API", description = "Streaming chat backend"),
    paths(
        health::health_check,
        stream::stream_chat,
        conversations::list_conversations,
        conversations::create_conversation,
        conversations::get_conversation,
        conversations::add_message,
        profile::get_profile,
        profile::update_instructions,
        auth::sign_in,
        auth::callback,
        auth::auth_code_error,
        auth::sign_out,
    ),
    components(schemas(
        health::HealthResponse,
        stream::StreamRequest,
        conversations::CreateConversationRequest,
        conversations::AddMessageRequest,
        conversations::ConversationResponse,
        conversations::MessageResponse,
        conversations::ConversationDetailResponse,
        conversations::ListConversationsResponse,
        profile::ProfileResponse,
        profile::UpdateInstructionsRequest,
    )),
    tags(
        (name = "health", description = "Service status"),
        (name = "chat", description = "Streaming replies"),
        (name = "conversations", description = "Conversation history"),
        (name = "profile", description = "Signed-in user"),
        (name = "auth", description = "Sign-in and sessions")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
