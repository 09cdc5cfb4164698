//! Reconciliation of listings against the catalog.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::catalog::{TorrentEntry, TorrentStore, TorrentType};
use crate::metrics;
use crate::source::RawListing;

use super::{panic_message, RecordOutcome, ScrapeError, SeederRefresher};

/// Decides, per listing, between inserting a new entry and refreshing a
/// stored one.
pub struct RecordReconciler {
    provider: String,
    store: Arc<dyn TorrentStore>,
    refresher: Arc<SeederRefresher>,
}

impl RecordReconciler {
    pub fn new(
        provider: impl Into<String>,
        store: Arc<dyn TorrentStore>,
        refresher: Arc<SeederRefresher>,
    ) -> Self {
        Self {
            provider: provider.into(),
            store,
            refresher,
        }
    }

    /// Reconcile one listing.
    ///
    /// Known entries only get their seeders refreshed. Unknown listings are
    /// validated, normalized and inserted. At most one store write happens.
    pub async fn process_record(&self, listing: &RawListing) -> Result<RecordOutcome, ScrapeError> {
        if let Some(key) = listing.key(&self.provider) {
            if let Some(existing) = self.store.lookup(&key)? {
                let seeders = self.refresher.refresh(&existing).await?;
                return Ok(RecordOutcome::Refreshed {
                    info_hash: existing.info_hash,
                    seeders,
                });
            }
        }

        let entry = match self.build_entry(listing) {
            Ok(entry) => entry,
            Err(reason) => {
                debug!(
                    torrent_id = listing.torrent_id.as_deref().unwrap_or("-"),
                    reason = %reason,
                    "Invalid torrent record"
                );
                return Ok(RecordOutcome::Invalid { reason });
            }
        };

        if self.store.create(&entry)? {
            debug!(info_hash = %entry.info_hash, title = %entry.title, "Created entry");
            Ok(RecordOutcome::Created(entry))
        } else {
            debug!(info_hash = %entry.info_hash, "Entry appeared concurrently, insert ignored");
            Ok(RecordOutcome::Duplicate {
                info_hash: entry.info_hash,
            })
        }
    }

    /// Reconcile one listing, containing any error or panic to this record.
    pub async fn process_isolated(&self, listing: RawListing) -> RecordOutcome {
        let outcome = match AssertUnwindSafe(self.process_record(&listing))
            .catch_unwind()
            .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(
                    info_hash = listing.info_hash.as_deref().unwrap_or("-"),
                    error = %e,
                    "Failed to process torrent record"
                );
                RecordOutcome::Failed {
                    error: e.to_string(),
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    info_hash = listing.info_hash.as_deref().unwrap_or("-"),
                    panic = %message,
                    "Record processing panicked"
                );
                RecordOutcome::Failed { error: message }
            }
        };

        metrics::RECORDS_PROCESSED
            .with_label_values(&[&self.provider, outcome.label()])
            .inc();
        outcome
    }

    /// Build the canonical entry for a new listing, or the reason it can't be stored.
    fn build_entry(&self, listing: &RawListing) -> Result<TorrentEntry, String> {
        let size = listing
            .size
            .filter(|s| *s > 0)
            .ok_or_else(|| "missing size".to_string())?;
        let info_hash = listing
            .info_hash
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| "missing info hash".to_string())?;
        let title = listing
            .name
            .as_deref()
            .map(normalize_title)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| "missing title".to_string())?;

        Ok(TorrentEntry {
            info_hash: info_hash.to_lowercase(),
            provider: self.provider.clone(),
            torrent_id: listing.torrent_id.clone().unwrap_or_default(),
            title,
            torrent_type: TorrentType::Series,
            size,
            seeders: listing.seeders.unwrap_or(0),
            upload_date: listing.upload_date,
            imdb_id: listing.imdb_id.clone(),
        })
    }
}

/// Collapse every run of whitespace (tabs included) to one space and trim.
pub fn normalize_title(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}
