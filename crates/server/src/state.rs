use std::sync::Arc;
use seedcrawl_core::{Config, SanitizedConfig, Scraper, TorrentStore};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: Arc<dyn TorrentStore>,
    scraper: Arc<Scraper>,
}

impl AppState {
    pub fn new(config: Config, catalog: Arc<dyn TorrentStore>, scraper: Arc<Scraper>) -> Self {
        Self {
            config,
            catalog,
            scraper,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn catalog(&self) -> &dyn TorrentStore {
        self.catalog.as_ref()
    }

    pub fn scraper(&self) -> &Arc<Scraper> {
        &self.scraper
    }
}
