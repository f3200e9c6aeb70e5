use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix rendered for optimistic user echoes
pub const TRANSIENT_USER_PREFIX: &str = "temp-";

/// Prefix rendered for the in-progress assistant reply
pub const TRANSIENT_ASSISTANT_PREFIX: &str = "temp-ai-";

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-side identity for a message that has not been written to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransientId {
    pub role: Role,
    pub token: Uuid,
}

impl TransientId {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            token: Uuid::new_v4(),
        }
    }
}

impl fmt::Display for TransientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.role {
            Role::User => TRANSIENT_USER_PREFIX,
            Role::Assistant => TRANSIENT_ASSISTANT_PREFIX,
        };
        write!(f, "{}{}", prefix, self.token)
    }
}

/// Message identifier; the two regimes are never interchangeable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "regime", content = "value", rename_all = "snake_case")]
pub enum MessageId {
    /// Assigned by the conversation store on a successful write
    Durable(String),

    /// Assigned client-side before persistence completes
    Transient(TransientId),
}

impl MessageId {
    pub fn durable(id: impl Into<String>) -> Self {
        Self::Durable(id.into())
    }

    pub fn transient(role: Role) -> Self {
        Self::Transient(TransientId::new(role))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn is_transient_assistant(&self) -> bool {
        matches!(self, Self::Transient(TransientId { role: Role::Assistant, .. }))
    }

    /// Durable identifier, if this message has been persisted
    pub fn as_durable(&self) -> Option<&str> {
        match self {
            Self::Durable(id) => Some(id),
            Self::Transient(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Durable(id) => f.write_str(id),
            Self::Transient(id) => id.fmt(f),
        }
    }
}

/// A single turn in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    /// Absent for a message composed before any conversation exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Full text of the turn, never a delta
    pub content: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Optimistic echo of a prompt the user just submitted
    pub fn transient_user(conversation_id: Option<String>, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::transient(Role::User),
            conversation_id,
            content: content.into(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    /// Snapshot of the assistant reply holding everything accumulated so far
    pub fn transient_assistant(
        conversation_id: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::transient(Role::Assistant),
            conversation_id,
            content: content.into(),
            role: Role::Assistant,
            created_at: Utc::now(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.id.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_ids_render_with_prefix() {
        let user = MessageId::transient(Role::User);
        let assistant = MessageId::transient(Role::Assistant);

        assert!(user.to_string().starts_with(TRANSIENT_USER_PREFIX));
        assert!(!user.to_string().starts_with(TRANSIENT_ASSISTANT_PREFIX));
        assert!(assistant.to_string().starts_with(TRANSIENT_ASSISTANT_PREFIX));
    }

    #[test]
    fn test_transient_assistant_detection() {
        assert!(MessageId::transient(Role::Assistant).is_transient_assistant());
        assert!(!MessageId::transient(Role::User).is_transient_assistant());
        assert!(!MessageId::durable("temp-ai-1").is_transient_assistant());
    }

    #[test]
    fn test_durable_never_equals_transient() {
        let transient = MessageId::transient(Role::User);
        let durable = MessageId::durable(transient.to_string());

        assert_eq!(transient.to_string(), durable.to_string());
        assert_ne!(transient, durable);
        assert_eq!(durable.as_durable(), Some(transient.to_string().as_str()));
        assert_eq!(transient.as_durable(), None);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
        assert!(serde_json::from_str::<Role>("\"system\"").is_err());
    }

    #[test]
    fn test_fresh_assistant_snapshots_have_distinct_ids() {
        let first = Message::transient_assistant(None, "Hi");
        let second = Message::transient_assistant(None, "Hi there");

        assert_ne!(first.id, second.id);
        assert!(first.is_transient());
        assert_eq!(second.role, Role::Assistant);
    }
}
