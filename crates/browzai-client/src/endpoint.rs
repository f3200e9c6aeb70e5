use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Method;
use serde::Serialize;
use std::pin::Pin;

use crate::error::ConsumerError;
use crate::http::ApiConnection;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, ConsumerError>> + Send>>;

/// Body of a stream request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamPrompt {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Opens a streamed reply for a prompt
#[async_trait]
pub trait StreamEndpoint: Send + Sync {
    /// Resolves once the response has started; chunks follow on the stream
    async fn open(&self, prompt: &StreamPrompt) -> Result<ChunkStream, ConsumerError>;
}

pub struct HttpStreamEndpoint {
    connection: ApiConnection,
}

impl HttpStreamEndpoint {
    pub fn new(connection: ApiConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl StreamEndpoint for HttpStreamEndpoint {
    async fn open(&self, prompt: &StreamPrompt) -> Result<ChunkStream, ConsumerError> {
        let response = self
            .connection
            .request(Method::POST, "/api/chat/stream")
            .json(prompt)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConsumerError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(ConsumerError::from)),
        ))
    }
}
