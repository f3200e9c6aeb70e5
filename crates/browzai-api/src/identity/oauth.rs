use async_trait::async_trait;
use browzai_types::User;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{AuthError, IdentityProvider, Session};
use crate::config::AuthConfig;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// OAuth 2.0 authorization-code flow with sessions kept in process memory
pub struct OAuthIdentityProvider {
    http: reqwest::Client,
    config: AuthConfig,
    client_secret: String,
    sessions: RwLock<HashMap<String, Session>>,
    instructions: RwLock<HashMap<String, String>>,
}

impl OAuthIdentityProvider {
    pub fn new(config: AuthConfig, client_secret: impl Into<String>) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            config,
            client_secret: client_secret.into(),
            sessions: RwLock::new(HashMap::new()),
            instructions: RwLock::new(HashMap::new()),
        })
    }

    /// Open a session for an already identified user
    ///
    /// Expired sessions are pruned first.
    pub async fn issue_session(&self, user: User) -> Session {
        let session = Session {
            token: uuid::Uuid::new_v4().simple().to_string(),
            user,
            expires_at: Utc::now() + Duration::hours(self.config.session_ttl_hours),
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        if sessions.len() < before {
            tracing::debug!(pruned = before - sessions.len(), "Pruned expired sessions");
        }
        sessions.insert(session.token.clone(), session.clone());
        session
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<User, AuthError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::UserInfo(format!("status {}", response.status())));
        }

        let info: UserInfo = response.json().await?;
        Ok(User {
            id: info.sub,
            email: info.email,
            name: info.name,
            instructions: None,
        })
    }
}

#[async_trait]
impl IdentityProvider for OAuthIdentityProvider {
    async fn resolve_user(&self, token: &str) -> Option<User> {
        let session = self.sessions.read().await.get(token).cloned()?;
        if session.is_expired() {
            self.sessions.write().await.remove(token);
            tracing::debug!(user_id = %session.user.id, "Session expired");
            return None;
        }

        let mut user = session.user;
        user.instructions = self.instructions.read().await.get(&user.id).cloned();
        Some(user)
    }

    fn sign_in_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError> {
        if self.config.client_id.is_empty() {
            return Err(AuthError::NotConfigured("auth.client_id is empty".to_string()));
        }

        let scope = self.config.scopes.join(" ");
        let url = reqwest::Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::NotConfigured(format!("authorize_url: {}", e)))?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Exchange(format!("status {}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        let user = self.fetch_user_info(&token.access_token).await?;

        tracing::info!(user_id = %user.id, "User signed in");
        Ok(self.issue_session(user).await)
    }

    async fn sign_out(&self, token: &str) {
        if let Some(session) = self.sessions.write().await.remove(token) {
            tracing::info!(user_id = %session.user.id, "User signed out");
        }
    }

    async fn update_instructions(
        &self,
        user: &User,
        instructions: Option<String>,
    ) -> Result<User, AuthError> {
        let mut stored = self.instructions.write().await;
        match &instructions {
            Some(text) => stored.insert(user.id.clone(), text.clone()),
            None => stored.remove(&user.id),
        };

        let mut updated = user.clone();
        updated.instructions = instructions;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            site_url: "http://localhost:8000".to_string(),
            development: true,
            cookie_name: "browzai_session".to_string(),
            client_id: "client-123".to_string(),
            authorize_url: "https://accounts.example.com/authorize".to_string(),
            token_url: "https://accounts.example.com/token".to_string(),
            userinfo_url: "https://accounts.example.com/userinfo".to_string(),
            scopes: vec!["openid".to_string(), "email".to_string()],
            session_ttl_hours: 1,
        }
    }

    #[test]
    fn test_sign_in_url_carries_flow_parameters() {
        let provider = OAuthIdentityProvider::new(auth_config(), "secret").unwrap();
        let url = provider
            .sign_in_url("http://localhost:8000/auth/callback", "5f1c0a9e")
            .unwrap();

        let parsed = reqwest::Url::parse(&url).unwrap();
        let params: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["redirect_uri"], "http://localhost:8000/auth/callback");
        assert_eq!(params["scope"], "openid email");
        assert_eq!(params["state"], "5f1c0a9e");
    }

    #[test]
    fn test_sign_in_requires_client_id() {
        let mut config = auth_config();
        config.client_id.clear();
        let provider = OAuthIdentityProvider::new(config, "secret").unwrap();
        assert!(matches!(
            provider.sign_in_url("http://x/cb", "/"),
            Err(AuthError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let provider = OAuthIdentityProvider::new(auth_config(), "secret").unwrap();
        let session = provider.issue_session(User::new("u1")).await;

        assert_eq!(provider.resolve_user(&session.token).await.unwrap().id, "u1");
        assert!(provider.resolve_user("unknown").await.is_none());

        provider.sign_out(&session.token).await;
        assert!(provider.resolve_user(&session.token).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let mut config = auth_config();
        config.session_ttl_hours = 0;
        let provider = OAuthIdentityProvider::new(config, "secret").unwrap();
        let session = provider.issue_session(User::new("u1")).await;

        assert!(provider.resolve_user(&session.token).await.is_none());
    }

    #[tokio::test]
    async fn test_issuing_a_session_prunes_expired_ones() {
        let provider = OAuthIdentityProvider::new(auth_config(), "secret").unwrap();
        let stale = provider.issue_session(User::new("gone")).await;
        provider
            .sessions
            .write()
            .await
            .get_mut(&stale.token)
            .unwrap()
            .expires_at = Utc::now() - Duration::minutes(1);

        let fresh = provider.issue_session(User::new("u1")).await;

        let sessions = provider.sessions.read().await;
        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key(&fresh.token));
    }

    #[tokio::test]
    async fn test_instructions_follow_the_user() {
        let provider = OAuthIdentityProvider::new(auth_config(), "secret").unwrap();
        let session = provider.issue_session(User::new("u1")).await;

        let updated = provider
            .update_instructions(&session.user, Some("Be brief.".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.instructions.as_deref(), Some("Be brief."));

        let resolved = provider.resolve_user(&session.token).await.unwrap();
        assert_eq!(resolved.instructions.as_deref(), Some("Be brief."));

        provider.update_instructions(&resolved, None).await.unwrap();
        let cleared = provider.resolve_user(&session.token).await.unwrap();
        assert!(cleared.instructions.is_none());
    }
}
