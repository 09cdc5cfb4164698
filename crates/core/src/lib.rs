pub mod catalog;
pub mod config;
pub mod metrics;
pub mod scraper;
pub mod source;
pub mod testing;

pub use catalog::{
    CatalogError, CatalogStats, IdentifierProvider, ProviderWatermark, SqliteCatalog,
    TorrentEntry, TorrentKey, TorrentStore, TorrentType,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    SanitizedConfig, ServerConfig, SourceConfig,
};
pub use scraper::{
    CallLimiter, CrawlSummary, RecordOutcome, RetryPolicy, ScrapeError, ScrapeReport, Scraper,
    ScraperConfig, SweepReport,
};
pub use source::{EztvClient, RawListing, SourceError, TorrentSource};
