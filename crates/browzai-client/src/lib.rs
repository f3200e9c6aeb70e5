//! Stream consumer for the Browzai chat API
//!
//! [`ChatSession`] drives one chat surface: it echoes the prompt, keeps the
//! conversation in the store, reads the streamed reply into transient state
//! and persists the final text once the stream ends.

pub mod decoder;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod session;
pub mod store;
pub mod transient;
pub mod view;

pub use decoder::Utf8ChunkDecoder;
pub use endpoint::{ChunkStream, HttpStreamEndpoint, StreamEndpoint, StreamPrompt};
pub use error::ConsumerError;
pub use http::ApiConnection;
pub use session::{
    ChatSession, SubmissionState, SubmitOutcome, DEFAULT_CLEANUP_DELAY, ERROR_NOTICE,
};
pub use store::HttpConversationStore;
pub use transient::TransientState;
pub use view::ChatView;
