use browzai_persist::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("Stream endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("View error: {0}")]
    View(String),
}

impl From<reqwest::Error> for ConsumerError {
    fn from(err: reqwest::Error) -> Self {
        ConsumerError::Transport(err.to_string())
    }
}
