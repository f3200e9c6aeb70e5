use async_trait::async_trait;
use browzai_types::Message;

use crate::error::ConsumerError;

/// Presentation surface driven by a `ChatSession`
#[async_trait]
pub trait ChatView: Send + Sync {
    /// Show the current transient messages; called synchronously per update
    fn render(&self, transient: &[Message]);

    /// Reload a conversation that is already on screen
    async fn refresh(&self, conversation_id: &str) -> Result<(), ConsumerError>;

    /// Move to a newly created conversation
    async fn navigate(&self, conversation_id: &str) -> Result<(), ConsumerError>;

    fn notify_error(&self, message: &str);
}
