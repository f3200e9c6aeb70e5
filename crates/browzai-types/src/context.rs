use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Authenticated user as resolved from a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Custom instructions forwarded to the model with every prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            instructions: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("No authenticated user in request context")]
    Unauthenticated,
}

/// Immutable per-request context, built once at the edge and passed down explicitly
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub user: Option<User>,
}

impl RequestContext {
    pub fn new(user: Option<User>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn require_user(&self) -> Result<&User, ContextError> {
        self.user.as_ref().ok_or(ContextError::Unauthenticated)
    }
}
