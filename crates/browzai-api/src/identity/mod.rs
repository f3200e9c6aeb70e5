//! Identity and session provider
//!
//! Sessions are opaque tokens handed to the browser in a cookie. Handlers never
//! see tokens; the session middleware resolves them into a `RequestContext`.

mod oauth;

pub use oauth::OAuthIdentityProvider;

use async_trait::async_trait;
use browzai_types::User;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("OAuth provider is not configured: {0}")]
    NotConfigured(String),

    #[error("Code exchange failed: {0}")]
    Exchange(String),

    #[error("User info lookup failed: {0}")]
    UserInfo(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// User behind a session token, `None` when unknown or expired
    async fn resolve_user(&self, token: &str) -> Option<User>;

    /// Provider URL the browser is sent to in order to sign in
    ///
    /// `state` is echoed back to the callback untouched.
    fn sign_in_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError>;

    /// Trade an authorization code for a new session
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, token: &str);

    /// Replace the user's custom instructions; `None` clears them
    async fn update_instructions(
        &self,
        user: &User,
        instructions: Option<String>,
    ) -> Result<User, AuthError>;
}
