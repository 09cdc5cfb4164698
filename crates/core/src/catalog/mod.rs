//! Torrent catalog - the persistent store the scraper reconciles into.
//!
//! Holds one row per info hash plus one watermark row per provider.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::*;

/// Trait for torrent catalog storage.
pub trait TorrentStore: Send + Sync {
    /// Get the watermark for a provider, creating an empty one if absent.
    fn get_provider(&self, name: &str) -> Result<ProviderWatermark, CatalogError>;

    /// Persist a provider watermark.
    fn save_provider(&self, watermark: &ProviderWatermark) -> Result<(), CatalogError>;

    /// Find a stored entry by natural key.
    fn lookup(&self, key: &TorrentKey) -> Result<Option<TorrentEntry>, CatalogError>;

    /// Insert a new entry.
    ///
    /// Returns `false` if an entry with the same info_hash already exists;
    /// the existing row is left untouched.
    fn create(&self, entry: &TorrentEntry) -> Result<bool, CatalogError>;

    /// Overwrite the seeder count of a stored entry.
    fn refresh_seeders(&self, info_hash: &str, seeders: u32) -> Result<(), CatalogError>;

    /// Entries of a provider ordered by last update, oldest first.
    fn least_recently_updated(
        &self,
        provider: &str,
        limit: u32,
    ) -> Result<Vec<TorrentEntry>, CatalogError>;

    /// Get catalog statistics.
    fn stats(&self) -> Result<CatalogStats, CatalogError>;
}

/// Source of external cross-reference ids for an entry.
pub trait IdentifierProvider: Send + Sync {
    /// IMDb ids known for this entry and for stored entries equivalent to it.
    fn imdb_ids(&self, entry: &TorrentEntry) -> Result<Vec<String>, CatalogError>;
}
