use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::domain::Feed;
use crate::fetcher::http_fetcher::{build_client, HttpFetcher};
use crate::fetcher::Fetcher;
use crate::notifier::NotifierRegistry;
use crate::scheduler::Scheduler;
use crate::store::sqlite::SqliteStore;

/// Everything a run needs, built once from a validated configuration.
pub struct AppContext {
    pub config: Config,
    pub feeds: Vec<Feed>,
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub notifiers: Arc<NotifierRegistry>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config.database_path()?;
        tracing::debug!("Opening database at {}", db_path.display());
        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let client = build_client()?;
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::with_client(client.clone()));
        let notifiers = NotifierRegistry::from_config(&config, client)?;

        let feeds = config.resolved_feeds();
        notifiers.ensure_resolves(&feeds)?;

        Ok(Self {
            config,
            feeds,
            store,
            fetcher,
            notifiers: Arc::new(notifiers),
        })
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(
            self.feeds.clone(),
            self.store.clone(),
            self.fetcher.clone(),
            self.notifiers.clone(),
            self.config.jobs(),
        )
    }
}
