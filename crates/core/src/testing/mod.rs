//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the remote source and the
//! catalog store, allowing scrape cycles to be exercised without network or
//! database.
//!
//! # Example
//!
//! ```rust,ignore
//! use seedcrawl_core::testing::{fixtures, MockCatalog, MockSource};
//!
//! let source = Arc::new(MockSource::new());
//! let catalog = Arc::new(MockCatalog::new());
//!
//! source.set_page(1, vec![fixtures::listing("aaa", "1", "Show S01E01")]).await;
//!
//! let scraper = Scraper::new(config, source.clone(), catalog.clone(), catalog.clone());
//! scraper.scrape().await?;
//! assert_eq!(catalog.len(), 1);
//! ```

mod mock_catalog;
mod mock_source;

pub use mock_catalog::MockCatalog;
pub use mock_source::MockSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::catalog::{TorrentEntry, TorrentType};
    use crate::source::RawListing;

    /// Create a complete listing with reasonable defaults.
    pub fn listing(info_hash: &str, torrent_id: &str, name: &str) -> RawListing {
        RawListing {
            info_hash: Some(info_hash.to_string()),
            torrent_id: Some(torrent_id.to_string()),
            name: Some(name.to_string()),
            size: Some(1024 * 1024 * 350), // 350 MB
            seeders: Some(25),
            upload_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single(),
            imdb_id: None,
        }
    }

    /// Create a listing carrying only a seeder count, as returned by searches.
    pub fn seeders_listing(info_hash: &str, torrent_id: &str, seeders: u32) -> RawListing {
        RawListing {
            info_hash: Some(info_hash.to_string()),
            torrent_id: Some(torrent_id.to_string()),
            seeders: Some(seeders),
            ..Default::default()
        }
    }

    /// Create a listing without a size (invalid for persisting).
    pub fn sizeless_listing(info_hash: &str, torrent_id: &str, name: &str) -> RawListing {
        RawListing {
            size: None,
            ..listing(info_hash, torrent_id, name)
        }
    }

    /// Create a stored EZTV entry with reasonable defaults.
    pub fn entry(info_hash: &str, torrent_id: &str, title: &str) -> TorrentEntry {
        TorrentEntry {
            info_hash: info_hash.to_string(),
            provider: "EZTV".to_string(),
            torrent_id: torrent_id.to_string(),
            title: title.to_string(),
            torrent_type: TorrentType::Series,
            size: 1024 * 1024 * 350,
            seeders: 5,
            upload_date: None,
            imdb_id: None,
        }
    }

    /// Create a stored entry linked to an IMDb id.
    pub fn entry_with_imdb(info_hash: &str, torrent_id: &str, imdb_id: &str) -> TorrentEntry {
        TorrentEntry {
            imdb_id: Some(imdb_id.to_string()),
            ..entry(info_hash, torrent_id, "Show S01E01")
        }
    }
}
