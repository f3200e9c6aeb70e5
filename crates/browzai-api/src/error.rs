use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use browzai_persist::StoreError;
use browzai_types::ContextError;
use serde_json::json;
use thiserror::Error;

use crate::identity::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Store(StoreError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Internal server error")]
    Internal,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConversationNotFound(id) => ApiError::ConversationNotFound(id),
            StoreError::InvalidId(msg) | StoreError::InvalidMessage(msg) => {
                ApiError::BadRequest(msg)
            }
            other => ApiError::Store(other),
        }
    }
}

impl From<ContextError> for ApiError {
    fn from(_: ContextError) -> Self {
        ApiError::Unauthorized
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ConversationNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Store(ref e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Auth(ref e) => {
                tracing::error!("Authentication error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
            }
            ApiError::Internal => {
                tracing::error!("Internal error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
