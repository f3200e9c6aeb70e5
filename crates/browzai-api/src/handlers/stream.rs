use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use browzai_llm::{ChatOptions, ChatRequest, Message as LLMMessage, StreamEvent};
use browzai_types::RequestContext;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use utoipa::ToSchema;

use crate::{prompt::system_directive, state::AppState};

/// Chunks buffered between the provider task and the response body
const RELAY_BUFFER: usize = 32;

/// Stream request body (documentation only; the handler validates raw JSON)
#[derive(Debug, Deserialize, ToSchema)]
pub struct StreamRequest {
    pub message: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Stream endpoint failures, rendered as plain text
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid request body")]
    InvalidRequest,

    #[error("Internal Server Error")]
    Upstream,
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = match self {
            StreamError::Unauthorized => StatusCode::UNAUTHORIZED,
            StreamError::InvalidRequest => StatusCode::BAD_REQUEST,
            StreamError::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Validated prompt and optional custom instructions
#[derive(Debug, PartialEq)]
struct ParsedPrompt {
    message: String,
    instructions: Option<String>,
}

fn parse_body(body: &[u8]) -> Result<ParsedPrompt, StreamError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| StreamError::InvalidRequest)?;

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .ok_or(StreamError::InvalidRequest)?
        .to_string();

    // Non-string instructions are ignored rather than rejected
    let instructions = value
        .get("instructions")
        .and_then(Value::as_str)
        .filter(|i| !i.trim().is_empty())
        .map(str::to_string);

    Ok(ParsedPrompt {
        message,
        instructions,
    })
}

/// Relay a model reply to the client as it is generated
///
/// The response body is the raw text of the reply, forwarded chunk by chunk.
/// A provider failure after the first byte aborts the body instead of ending it.
#[utoipa::path(
    post,
    path = "/api/chat/stream",
    request_body = StreamRequest,
    responses(
        (status = 200, description = "Reply text streamed in chunks", content_type = "text/plain"),
        (status = 400, description = "Invalid request body"),
        (status = 401, description = "No authenticated session"),
        (status = 500, description = "Model invocation failed")
    ),
    tag = "chat"
)]
pub async fn stream_chat(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Result<Response, StreamError> {
    let user = ctx.require_user().map_err(|_| StreamError::Unauthorized)?;
    let prompt = parse_body(&body)?;

    let messages = vec![
        LLMMessage::system(system_directive(prompt.instructions.as_deref())),
        LLMMessage::human(prompt.message),
    ];
    let request = ChatRequest::new(state.config.llm.model.clone(), messages)
        .with_options(ChatOptions::new().temperature(state.config.llm.temperature));

    let mut events = state.llm_client.chat_stream(request).await.map_err(|e| {
        tracing::error!(request_id = %ctx.request_id, "Model invocation failed: {:#}", e);
        StreamError::Upstream
    })?;

    tracing::debug!(request_id = %ctx.request_id, user_id = %user.id, "Streaming reply");

    let (tx, rx) = mpsc::channel::<Result<Bytes, std::io::Error>>(RELAY_BUFFER);
    let request_id = ctx.request_id;

    tokio::spawn(async move {
        let mut chunks = 0usize;
        while let Some(event) = events.next().await {
            match event {
                Ok(StreamEvent::Message { content }) => {
                    if content.is_empty() {
                        continue;
                    }
                    if tx.send(Ok(Bytes::from(content))).await.is_err() {
                        tracing::debug!(%request_id, chunks, "Client went away mid-stream");
                        return;
                    }
                    chunks += 1;
                }
                Ok(StreamEvent::Done { finish_reason }) => {
                    tracing::debug!(%request_id, chunks, ?finish_reason, "Reply complete");
                    return;
                }
                Err(e) => {
                    tracing::error!(%request_id, chunks, "Provider stream failed: {:#}", e);
                    let _ = tx.send(Err(std::io::Error::other(e.to_string()))).await;
                    return;
                }
            }
        }
        tracing::debug!(%request_id, chunks, "Provider stream ended");
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(ReceiverStream::new(rx)))
        .map_err(|e| {
            tracing::error!(%request_id, "Failed to build stream response: {}", e);
            StreamError::Upstream
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_body() {
        let parsed = parse_body(br#"{"message":"Hi","instructions":"Be brief."}"#).unwrap();
        assert_eq!(
            parsed,
            ParsedPrompt {
                message: "Hi".to_string(),
                instructions: Some("Be brief.".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_message() {
        for body in [
            &b"not json"[..],
            br#"{}"#,
            br#"{"message":""}"#,
            br#"{"message":"   "}"#,
            br#"{"message":42}"#,
            br#"["Hi"]"#,
        ] {
            assert!(
                matches!(parse_body(body), Err(StreamError::InvalidRequest)),
                "accepted {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_parse_ignores_unusable_instructions() {
        let parsed = parse_body(br#"{"message":"Hi","instructions":7}"#).unwrap();
        assert!(parsed.instructions.is_none());

        let parsed = parse_body(br#"{"message":"Hi","instructions":""}"#).unwrap();
        assert!(parsed.instructions.is_none());
    }

    #[test]
    fn test_error_bodies() {
        assert_eq!(StreamError::InvalidRequest.to_string(), "Invalid request body");
        assert_eq!(StreamError::Upstream.to_string(), "Internal Server Error");
        assert_eq!(
            StreamError::Upstream.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
