use crate::config::AppConfig;
use crate::store::{CommunityStore, InMemoryStore, PgStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CommunityStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = PgStore::connect(&config.database_url, config.db_max_connections).await?;
        if let Err(e) = store.migrate().await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self {
            store: Arc::new(store) as Arc<dyn CommunityStore>,
            config,
        })
    }

    /// State over a process-local store, for tests and local demos.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            store: store as Arc<dyn CommunityStore>,
            config: Arc::new(AppConfig::for_tests()),
        }
    }
}
