use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use browzai_api::{
    build_router,
    config::Config,
    identity::{IdentityProvider, OAuthIdentityProvider},
    state::AppState,
};
use browzai_llm::{ChatClient, OpenAIClient};
use browzai_persist::{ConversationStore, InMemoryConversationStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Browzai API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    tracing::info!(model = %config.llm.model, base_url = %config.llm.base_url, "Initializing LLM client");
    let llm_client: Arc<dyn ChatClient> = Arc::new(
        OpenAIClient::new(config.llm_api_key.clone())?.with_base_url(config.llm.base_url.clone()),
    );

    let store = connect_store(&config).await?;
    tracing::info!(backend = store.backend(), "Conversation store ready");

    let identity: Arc<dyn IdentityProvider> = Arc::new(OAuthIdentityProvider::new(
        config.auth.clone(),
        config.oauth_client_secret.clone(),
    )?);
    if config.auth.client_id.is_empty() {
        tracing::warn!("auth.client_id is empty; sign-in is disabled");
    }

    let state = Arc::new(AppState::new(config.clone(), store, llm_client, identity));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn ConversationStore>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryConversationStore::new())),
        #[cfg(feature = "mongodb")]
        "mongodb" => {
            tracing::info!("Connecting to MongoDB");
            let store = browzai_persist::MongoConversationStore::connect(
                &config.mongodb_uri,
                &config.store.database,
            )
            .await?;
            Ok(Arc::new(store))
        }
        other => anyhow::bail!(
            "Unsupported store backend '{}' (the mongodb backend needs the `mongodb` feature)",
            other
        ),
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
