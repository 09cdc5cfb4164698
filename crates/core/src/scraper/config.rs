//! Scraper configuration.

use serde::{Deserialize, Serialize};

use super::RetryPolicy;

/// Configuration for the scrape cycle and its scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Provider tag written on every entry and used as the watermark key.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Last page the crawler may fetch (inclusive).
    #[serde(default = "default_until_page")]
    pub until_page: u32,

    /// Ceiling on concurrently executing searches and detail lookups.
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,

    /// Extra attempts for a failed page fetch (0 = treat as empty page).
    #[serde(default)]
    pub page_retries: u32,

    /// Delay between page fetch attempts (milliseconds).
    #[serde(default = "default_page_retry_backoff")]
    pub page_retry_backoff_ms: u64,

    /// Seconds between scheduled scrape cycles.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Run a cycle immediately when the scheduler starts.
    #[serde(default = "default_true")]
    pub run_on_start: bool,

    /// Entries refreshed per seeder sweep (0 = sweep disabled).
    #[serde(default)]
    pub seeders_sweep_limit: u32,

    /// Seconds between seeder sweeps.
    #[serde(default = "default_seeders_interval")]
    pub seeders_interval_secs: u64,
}

fn default_provider() -> String {
    "EZTV".to_string()
}

fn default_until_page() -> u32 {
    10
}

fn default_max_concurrent_lookups() -> usize {
    1
}

fn default_page_retry_backoff() -> u64 {
    30_000 // 30 seconds
}

fn default_interval() -> u64 {
    3600 // 1 hour
}

fn default_true() -> bool {
    true
}

fn default_seeders_interval() -> u64 {
    21_600 // 6 hours
}

impl ScraperConfig {
    /// Page fetch retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.page_retries,
            backoff_ms: self.page_retry_backoff_ms,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            until_page: default_until_page(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
            page_retries: 0,
            page_retry_backoff_ms: default_page_retry_backoff(),
            interval_secs: default_interval(),
            run_on_start: true,
            seeders_sweep_limit: 0,
            seeders_interval_secs: default_seeders_interval(),
        }
    }
}
