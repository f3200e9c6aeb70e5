#![allow(dead_code)]

use async_trait::async_trait;
use browzai_client::{ChatView, ChunkStream, ConsumerError, StreamEndpoint, StreamPrompt};
use browzai_types::Message;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// How the fake endpoint answers
#[derive(Clone)]
pub enum Reply {
    Chunks(Vec<Vec<u8>>),
    /// Chunks followed by a read error
    FailAfter(Vec<Vec<u8>>),
    Status(u16, &'static str),
}

impl Reply {
    pub fn text(chunks: &[&str]) -> Self {
        Reply::Chunks(chunks.iter().map(|c| c.as_bytes().to_vec()).collect())
    }

    pub fn text_then_fail(chunks: &[&str]) -> Self {
        Reply::FailAfter(chunks.iter().map(|c| c.as_bytes().to_vec()).collect())
    }
}

pub struct ScriptedEndpoint {
    reply: Reply,
    gate: Option<Arc<Notify>>,
    prompts: Mutex<Vec<StreamPrompt>>,
}

impl ScriptedEndpoint {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            gate: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Hold `open` until the returned notifier fires
    pub fn gated(reply: Reply) -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let endpoint = Arc::new(Self {
            reply,
            gate: Some(gate.clone()),
            prompts: Mutex::new(Vec::new()),
        });
        (endpoint, gate)
    }

    pub fn prompts(&self) -> Vec<StreamPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamEndpoint for ScriptedEndpoint {
    async fn open(&self, prompt: &StreamPrompt) -> Result<ChunkStream, ConsumerError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match self.reply.clone() {
            Reply::Status(status, body) => Err(ConsumerError::Endpoint {
                status,
                body: body.to_string(),
            }),
            Reply::Chunks(chunks) => Ok(Box::pin(async_stream::stream! {
                for chunk in chunks {
                    tokio::task::yield_now().await;
                    yield Ok::<_, ConsumerError>(Bytes::from(chunk));
                }
            })),
            Reply::FailAfter(chunks) => Ok(Box::pin(async_stream::stream! {
                for chunk in chunks {
                    yield Ok::<_, ConsumerError>(Bytes::from(chunk));
                }
                yield Err(ConsumerError::Transport("connection reset".to_string()));
            })),
        }
    }
}

/// View that records every call
#[derive(Default)]
pub struct RecordingView {
    pub renders: Mutex<Vec<Vec<Message>>>,
    pub refreshed: Mutex<Vec<String>>,
    pub navigated: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn renders(&self) -> Vec<Vec<Message>> {
        self.renders.lock().unwrap().clone()
    }

    /// Content of the transient assistant message in each render that had one
    pub fn assistant_snapshots(&self) -> Vec<String> {
        self.renders()
            .iter()
            .filter_map(|r| r.iter().find(|m| m.id.is_transient_assistant()))
            .map(|m| m.content.clone())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn refreshed(&self) -> Vec<String> {
        self.refreshed.lock().unwrap().clone()
    }

    pub fn navigated(&self) -> Vec<String> {
        self.navigated.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatView for RecordingView {
    fn render(&self, transient: &[Message]) {
        self.renders.lock().unwrap().push(transient.to_vec());
    }

    async fn refresh(&self, conversation_id: &str) -> Result<(), ConsumerError> {
        self.refreshed.lock().unwrap().push(conversation_id.to_string());
        Ok(())
    }

    async fn navigate(&self, conversation_id: &str) -> Result<(), ConsumerError> {
        self.navigated.lock().unwrap().push(conversation_id.to_string());
        Ok(())
    }

    fn notify_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}
