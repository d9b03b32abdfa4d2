//! Shared application state for the Axum API server.

use sqlx::PgPool;

use herald_common::config::AppConfig;
use herald_notifier::builders::Composer;
use herald_notifier::queue::EmailQueue;
use herald_store::PgStore;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: PgStore,
    pub composer: Composer<PgStore>,
    pub queue: EmailQueue,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(pool: PgPool, queue: EmailQueue, config: AppConfig) -> Self {
        let store = PgStore::new(pool);
        let composer = Composer::new(store.clone(), config.site_url.clone());
        Self {
            store,
            composer,
            queue,
            config,
        }
    }
}
