use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    handlers::stream,
    middleware::{logging, session},
    openapi,
    routes::{auth, conversations, health, profile},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    // Kept out of the compression layer so chunks reach the client as produced
    let stream_routes = Router::new().route("/api/chat/stream", post(stream::stream_chat));

    let api_routes = Router::new()
        // Health & docs
        .route("/health", get(health::health_check))
        .route("/api/openapi.json", get(openapi::openapi_json))
        // Conversations
        .route(
            "/api/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/api/conversations/:conversation_id",
            get(conversations::get_conversation),
        )
        .route(
            "/api/conversations/:conversation_id/messages",
            post(conversations::add_message),
        )
        // Profile
        .route("/api/me", get(profile::get_profile))
        .route("/api/me/instructions", put(profile::update_instructions))
        // Auth
        .route("/auth/signin", get(auth::sign_in))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/auth-code-error", get(auth::auth_code_error))
        .route("/auth/signout", post(auth::sign_out))
        .layer(CompressionLayer::new());

    Router::new()
        .merge(api_routes)
        .merge(stream_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::resolve_session,
        ))
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let parsed_origins: Vec<HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::permissive()
    }
}
