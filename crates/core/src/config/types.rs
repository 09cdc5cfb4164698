use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::scraper::ScraperConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("seedcrawl.db")
}

/// Remote listing source (EZTV) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Base URL of the EZTV mirror (e.g., "https://eztv.re")
    #[serde(default = "default_source_url")]
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Listings requested per page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            timeout_secs: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn default_source_url() -> String {
    "https://eztv.re".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_page_size() -> u32 {
    100
}

/// Sanitized config for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub source: SanitizedSourceConfig,
    pub scraper: ScraperConfig,
}

/// Source config without the mirror URL's query string (mirrors sometimes embed tokens there)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourceConfig {
    pub url: String,
    pub timeout_secs: u32,
    pub page_size: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let url = config
            .source
            .url
            .split('?')
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            source: SanitizedSourceConfig {
                url,
                timeout_secs: config.source.timeout_secs,
                page_size: config.source.page_size,
            },
            scraper: config.scraper.clone(),
        }
    }
}
