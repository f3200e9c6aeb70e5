#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use browzai_api::{
    build_router,
    config::Config,
    identity::{AuthError, IdentityProvider, Session},
    AppState,
};
use browzai_llm::{ChatClient, ChatRequest, EventStream, StreamEvent};
use browzai_persist::InMemoryConversationStore;
use browzai_types::User;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";

/// What the fake provider does with the next request
#[derive(Clone)]
pub enum Script {
    Reply(Vec<&'static str>),
    FailSetup,
    FailAfter(Vec<&'static str>),
}

pub struct FakeChatClient {
    script: Script,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChatClient {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn message_events(chunks: &[&'static str]) -> Vec<Result<StreamEvent>> {
    chunks
        .iter()
        .map(|c| {
            Ok(StreamEvent::Message {
                content: c.to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        self.requests.lock().unwrap().push(request);

        let events = match &self.script {
            Script::FailSetup => anyhow::bail!("Provider API error (503): unavailable"),
            Script::Reply(chunks) => {
                let mut events = message_events(chunks);
                events.push(Ok(StreamEvent::Done {
                    finish_reason: Some("stop".to_string()),
                }));
                events
            }
            Script::FailAfter(chunks) => {
                let mut events = message_events(chunks);
                events.push(Err(anyhow::anyhow!("connection reset by provider")));
                events
            }
        };

        Ok(Box::pin(futures::stream::iter(events)))
    }
}

/// Identity provider with fixed sessions
pub struct StaticIdentity {
    sessions: RwLock<HashMap<String, User>>,
}

impl StaticIdentity {
    pub fn new() -> Arc<Self> {
        let mut sessions = HashMap::new();
        sessions.insert(
            ALICE_TOKEN.to_string(),
            User::new("alice").with_email("alice@example.com"),
        );
        sessions.insert(BOB_TOKEN.to_string(), User::new("bob"));
        Arc::new(Self {
            sessions: RwLock::new(sessions),
        })
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve_user(&self, token: &str) -> Option<User> {
        self.sessions.read().await.get(token).cloned()
    }

    fn sign_in_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError> {
        Ok(format!(
            "https://id.example/authorize?redirect_uri={}&state={}",
            redirect_uri, state
        ))
    }

    async fn exchange_code(&self, code: &str, _redirect_uri: &str) -> Result<Session, AuthError> {
        if code != "good-code" {
            return Err(AuthError::Exchange("invalid_grant".to_string()));
        }
        let session = Session {
            token: "fresh-token".to_string(),
            user: User::new("carol"),
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        };
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.user.clone());
        Ok(session)
    }

    async fn sign_out(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    async fn update_instructions(
        &self,
        user: &User,
        instructions: Option<String>,
    ) -> Result<User, AuthError> {
        let mut sessions = self.sessions.write().await;
        for stored in sessions.values_mut().filter(|u| u.id == user.id) {
            stored.instructions = instructions.clone();
        }
        let mut updated = user.clone();
        updated.instructions = instructions;
        Ok(updated)
    }
}

pub fn test_config(development: bool) -> Config {
    let toml = format!(
        r#"
        [server]
        host = "127.0.0.1"
        port = 0

        [cors]
        enabled = true
        origins = ["*"]

        [llm]
        model = "gpt-4o"
        temperature = 0.7

        [auth]
        site_url = "https://browzai.example"
        development = {development}

        [store]
        backend = "memory"

        [logging]
        level = "debug"
        format = "pretty"
        "#
    );
    toml::from_str(&toml).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryConversationStore>,
    pub llm: Arc<FakeChatClient>,
    pub identity: Arc<StaticIdentity>,
}

pub fn test_app_with(script: Script, development: bool) -> TestApp {
    let store = Arc::new(InMemoryConversationStore::new());
    let llm = FakeChatClient::new(script);
    let identity = StaticIdentity::new();

    let state = Arc::new(AppState::new(
        test_config(development),
        store.clone(),
        llm.clone(),
        identity.clone(),
    ));

    TestApp {
        router: build_router(state),
        store,
        llm,
        identity,
    }
}

pub fn test_app(script: Script) -> TestApp {
    test_app_with(script, true)
}

pub fn authed(builder: axum::http::request::Builder, token: &str) -> axum::http::request::Builder {
    builder.header("cookie", format!("browzai_session={}", token))
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = authed(builder, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = authed(builder, token);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
