use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Connection error: {0}")]
    Connection(String),

    /// Failure reported by a remote store reached over HTTP
    #[error("Remote store error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConversationNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
