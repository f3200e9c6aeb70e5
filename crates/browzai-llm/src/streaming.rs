use anyhow::Result;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::buffer_utils::CircularLineBuffer;
use crate::traits::EventStream;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text generated by the model
    Message { content: String },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub error: Option<ProviderError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    pub role: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

impl ChatStreamChunk {
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }

    fn to_stream_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(choice) = self.choices.first() {
            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    events.push(StreamEvent::Message {
                        content: content.clone(),
                    });
                }
            }

            if let Some(finish_reason) = &choice.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason: Some(finish_reason.clone()),
                });
            }
        }

        events
    }
}

enum Line {
    Skip,
    Done,
    Events(Vec<StreamEvent>),
}

fn parse_line(line: &str) -> Result<Line> {
    // Blank separators, `:` comments and non-data fields carry no text
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(Line::Skip);
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return Ok(Line::Done);
    }

    let chunk: ChatStreamChunk = serde_json::from_str(data)
        .map_err(|e| anyhow::anyhow!("Failed to parse chat chunk: {}", e))?;

    if let Some(error) = chunk.error {
        anyhow::bail!("Provider stream error: {}", error.message);
    }

    Ok(Line::Events(chunk.to_stream_events()))
}

/// Turn a server-sent-events byte stream from `/chat/completions` into events
///
/// Ends after `[DONE]`. Transport and parse failures are yielded as `Err`
/// and terminate the stream.
pub fn parse_chat_sse_stream<S, E>(byte_stream: S) -> EventStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(byte_stream);
        let mut buffer = CircularLineBuffer::with_capacity(8192);

        'read: while let Some(chunk_result) = byte_chunks.next().await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    return;
                }
            };
            buffer.extend(&bytes);

            while let Some(line_result) = buffer.next_line() {
                match line_result.and_then(|line| parse_line(&line)) {
                    Ok(Line::Skip) => continue,
                    Ok(Line::Done) => {
                        yield Ok(StreamEvent::Done { finish_reason: None });
                        break 'read;
                    }
                    Ok(Line::Events(events)) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        // A final frame may arrive without its trailing newline
        if let Some(line_result) = buffer.take_remaining() {
            match line_result.and_then(|line| parse_line(&line)) {
                Ok(Line::Skip) => {}
                Ok(Line::Done) => yield Ok(StreamEvent::Done { finish_reason: None }),
                Ok(Line::Events(events)) => {
                    for event in events {
                        yield Ok(event);
                    }
                }
                Err(e) => yield Err(e),
            }
        }
    })
}
