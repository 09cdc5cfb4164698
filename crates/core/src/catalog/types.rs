//! Types for the torrent catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content category of a catalog entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TorrentType {
    Movie,
    Series,
    Anime,
}

impl TorrentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentType::Movie => "movie",
            TorrentType::Series => "series",
            TorrentType::Anime => "anime",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(TorrentType::Movie),
            "series" => Some(TorrentType::Series),
            "anime" => Some(TorrentType::Anime),
            _ => None,
        }
    }
}

/// A torrent stored in the catalog.
///
/// Everything except `seeders` is written once, at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentEntry {
    /// Info hash (lowercase hex). Unique within the catalog.
    pub info_hash: String,
    /// Provider tag of the source that produced this entry.
    pub provider: String,
    /// Provider-local torrent id.
    pub torrent_id: String,
    /// Normalized display title.
    pub title: String,
    #[serde(rename = "type")]
    pub torrent_type: TorrentType,
    /// Total size in bytes.
    pub size: u64,
    /// Last known seeder count.
    pub seeders: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<DateTime<Utc>>,
    /// IMDb id ("tt"-prefixed), when the provider knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

/// Natural key used to find a stored entry for an upstream listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TorrentKey {
    InfoHash(String),
    ProviderId { provider: String, torrent_id: String },
}

impl std::fmt::Display for TorrentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TorrentKey::InfoHash(hash) => write!(f, "{}", hash),
            TorrentKey::ProviderId {
                provider,
                torrent_id,
            } => write!(f, "{}:{}", provider, torrent_id),
        }
    }
}

/// Per-provider record of the last successful scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderWatermark {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scraped: Option<DateTime<Utc>>,
}

impl ProviderWatermark {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_scraped: None,
        }
    }
}

/// Catalog statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Total stored torrents.
    pub total_torrents: u64,
    /// Total size of all stored torrents (bytes).
    pub total_size_bytes: u64,
    /// Number of distinct providers.
    pub providers: u32,
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
