use browzai_llm::ChatClient;
use browzai_persist::ConversationStore;
use std::sync::Arc;

use crate::config::Config;
use crate::identity::IdentityProvider;

/// Shared application state passed to all handlers
///
/// Collaborators are held as trait objects so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ConversationStore>,
    pub llm_client: Arc<dyn ChatClient>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ConversationStore>,
        llm_client: Arc<dyn ChatClient>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            llm_client,
            identity,
        }
    }
}
