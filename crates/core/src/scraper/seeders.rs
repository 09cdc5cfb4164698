//! Seeder refresh for entries already in the catalog.
//!
//! Fresh seeder counts are looked up by IMDb id first, since one search
//! returns every release of a show. When that path fails the entry's own
//! detail page is fetched instead.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::catalog::{IdentifierProvider, TorrentEntry, TorrentStore};
use crate::metrics;
use crate::source::{RawListing, TorrentSource};

use super::{CallLimiter, ScrapeError};

/// Looks up and persists fresh seeder counts.
pub struct SeederRefresher {
    source: Arc<dyn TorrentSource>,
    store: Arc<dyn TorrentStore>,
    identifiers: Arc<dyn IdentifierProvider>,
    limiter: Arc<CallLimiter>,
}

impl SeederRefresher {
    pub fn new(
        source: Arc<dyn TorrentSource>,
        store: Arc<dyn TorrentStore>,
        identifiers: Arc<dyn IdentifierProvider>,
        limiter: Arc<CallLimiter>,
    ) -> Self {
        Self {
            source,
            store,
            identifiers,
            limiter,
        }
    }

    pub fn limiter(&self) -> &Arc<CallLimiter> {
        &self.limiter
    }

    /// Fetch current listings describing `entry`.
    ///
    /// Searches every IMDb id known for the entry and flattens the results.
    /// If that fails for any reason, falls back to exactly one direct lookup
    /// by torrent id. Both paths go through the call limiter.
    pub async fn update_seeders(
        &self,
        entry: &TorrentEntry,
        identifiers: &dyn IdentifierProvider,
    ) -> Result<Vec<RawListing>, ScrapeError> {
        match self.search_by_identifiers(entry, identifiers).await {
            Ok(listings) => {
                metrics::SEEDER_REFRESHES
                    .with_label_values(&["search", "success"])
                    .inc();
                Ok(listings)
            }
            Err(e) => {
                debug!(
                    info_hash = %entry.info_hash,
                    error = %e,
                    "IMDb search unavailable, falling back to direct lookup"
                );

                let result = self
                    .limiter
                    .schedule(|| self.source.torrent(&entry.torrent_id))
                    .await;
                metrics::record_source_request(self.source.name(), "torrent", &result);

                let status = if result.is_ok() { "success" } else { "error" };
                metrics::SEEDER_REFRESHES
                    .with_label_values(&["direct", status])
                    .inc();

                Ok(vec![result?])
            }
        }
    }

    async fn search_by_identifiers(
        &self,
        entry: &TorrentEntry,
        identifiers: &dyn IdentifierProvider,
    ) -> Result<Vec<RawListing>, ScrapeError> {
        let imdb_ids = identifiers.imdb_ids(entry)?;
        if imdb_ids.is_empty() {
            return Err(ScrapeError::NoIdentifiers(entry.info_hash.clone()));
        }

        let searches = imdb_ids.iter().map(|imdb_id| async move {
            let result = self
                .limiter
                .schedule(|| self.source.search(imdb_id))
                .await;
            metrics::record_source_request(self.source.name(), "search", &result);
            result
        });

        let pages = try_join_all(searches).await?;
        Ok(pages.into_iter().flatten().collect())
    }

    /// Refresh the stored seeder count of `entry`.
    ///
    /// Returns the new count, or `None` when no returned listing matches the
    /// entry or carries a seeder count (nothing is written in that case).
    pub async fn refresh(&self, entry: &TorrentEntry) -> Result<Option<u32>, ScrapeError> {
        let listings = self
            .update_seeders(entry, self.identifiers.as_ref())
            .await?;

        let seeders = find_match(&listings, entry).and_then(|listing| listing.seeders);
        match seeders {
            Some(seeders) => {
                self.store.refresh_seeders(&entry.info_hash, seeders)?;
                debug!(info_hash = %entry.info_hash, seeders = seeders, "Seeders refreshed");
                Ok(Some(seeders))
            }
            None => {
                warn!(
                    info_hash = %entry.info_hash,
                    listings = listings.len(),
                    "No fresh seeder count found"
                );
                Ok(None)
            }
        }
    }
}

/// Listing describing `entry`: info hash match first, then torrent id.
fn find_match<'a>(listings: &'a [RawListing], entry: &TorrentEntry) -> Option<&'a RawListing> {
    listings
        .iter()
        .find(|l| {
            l.info_hash
                .as_deref()
                .is_some_and(|h| h.eq_ignore_ascii_case(&entry.info_hash))
        })
        .or_else(|| {
            listings
                .iter()
                .find(|l| l.matches(&entry.info_hash, &entry.torrent_id))
        })
}
