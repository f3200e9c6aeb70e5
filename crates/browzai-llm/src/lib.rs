pub mod buffer_utils;
pub mod openai;
pub mod streaming;
pub mod traits;
pub mod types;

pub use buffer_utils::CircularLineBuffer;
pub use openai::OpenAIClient;
pub use streaming::{parse_chat_sse_stream, StreamEvent};
pub use traits::{ChatClient, ChatOptions, ChatRequest, EventStream};
pub use types::Message;
