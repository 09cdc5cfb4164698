//! Types for the remote listing source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::TorrentKey;

/// A listing as returned by the remote source, before validation.
///
/// Browse pages, IMDb searches and detail lookups all produce this shape;
/// any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torrent_id: Option<String>,
    /// Release name as published (not normalized).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeders: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

impl RawListing {
    /// Natural key of this listing for the given provider.
    ///
    /// Prefers the info hash; falls back to the provider-local id.
    pub fn key(&self, provider: &str) -> Option<TorrentKey> {
        if let Some(hash) = self.info_hash.as_ref().filter(|h| !h.is_empty()) {
            return Some(TorrentKey::InfoHash(hash.to_lowercase()));
        }
        self.torrent_id
            .as_ref()
            .filter(|id| !id.is_empty())
            .map(|id| TorrentKey::ProviderId {
                provider: provider.to_string(),
                torrent_id: id.clone(),
            })
    }

    /// Whether this listing describes the torrent with the given hash or id.
    pub fn matches(&self, info_hash: &str, torrent_id: &str) -> bool {
        let hash_match = self
            .info_hash
            .as_deref()
            .is_some_and(|h| h.eq_ignore_ascii_case(info_hash));
        let id_match = self.torrent_id.as_deref().is_some_and(|id| id == torrent_id);
        hash_match || id_match
    }
}

/// Errors that can occur when talking to the remote source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Source API error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to parse source response: {0}")]
    Parse(String),
}

/// Trait for remote listing sources.
#[async_trait]
pub trait TorrentSource: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Fetch one page of the newest-first listing feed (pages start at 1).
    async fn browse(&self, page: u32) -> Result<Vec<RawListing>, SourceError>;

    /// Fetch every listing known for an IMDb id.
    async fn search(&self, imdb_id: &str) -> Result<Vec<RawListing>, SourceError>;

    /// Fetch a single listing by provider-local id.
    async fn torrent(&self, torrent_id: &str) -> Result<RawListing, SourceError>;
}
