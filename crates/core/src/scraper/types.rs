//! Types for the scrape cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::catalog::{CatalogError, TorrentEntry};
use crate::source::SourceError;

/// Errors that can occur during a scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Catalog store error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Remote source error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The identifier provider knows no IMDb id for this entry.
    #[error("no identifiers for {0}")]
    NoIdentifiers(String),

    /// A cycle is already in progress on this scraper.
    #[error("a scrape is already running")]
    AlreadyRunning,

    /// A task panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Result of reconciling a single listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Listing could not be persisted; nothing was written.
    Invalid { reason: String },
    /// Entry already stored; seeders refreshed (`None` if no fresh count was found).
    Refreshed {
        info_hash: String,
        seeders: Option<u32>,
    },
    /// New entry inserted.
    Created(TorrentEntry),
    /// Insert was ignored because the key appeared concurrently.
    Duplicate { info_hash: String },
    /// Reconciliation failed for this record only.
    Failed { error: String },
}

impl RecordOutcome {
    /// Metric/log label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            RecordOutcome::Invalid { .. } => "invalid",
            RecordOutcome::Refreshed { .. } => "refreshed",
            RecordOutcome::Created(_) => "created",
            RecordOutcome::Duplicate { .. } => "duplicate",
            RecordOutcome::Failed { .. } => "failed",
        }
    }
}

/// Page fetch retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Fixed delay between attempts (milliseconds).
    pub backoff_ms: u64,
}

impl RetryPolicy {
    /// No retries: a failed fetch ends the crawl.
    pub fn fail_soft() -> Self {
        Self {
            max_retries: 0,
            backoff_ms: 30_000,
        }
    }

    pub fn with_retries(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff_ms: backoff.as_millis() as u64,
        }
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fail_soft()
    }
}

/// Totals for one pagination crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Pages requested (a retried page counts once).
    pub pages_fetched: u32,
    /// Pages whose fetch failed after all attempts.
    pub page_failures: u32,
    pub created: u32,
    pub refreshed: u32,
    pub duplicates: u32,
    pub invalid: u32,
    pub failed: u32,
}

impl CrawlSummary {
    /// Count one record outcome.
    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Invalid { .. } => self.invalid += 1,
            RecordOutcome::Refreshed { .. } => self.refreshed += 1,
            RecordOutcome::Created(_) => self.created += 1,
            RecordOutcome::Duplicate { .. } => self.duplicates += 1,
            RecordOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Total records processed across all pages.
    pub fn records(&self) -> u32 {
        self.created + self.refreshed + self.duplicates + self.invalid + self.failed
    }
}

/// Report of a completed scrape cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub provider: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Watermark value before this cycle.
    pub previous_scraped: Option<DateTime<Utc>>,
    pub summary: CrawlSummary,
}

/// Report of a seeder sweep over stored entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub checked: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub failed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(
            RecordOutcome::Invalid {
                reason: "x".to_string()
            }
            .label(),
            "invalid"
        );
        assert_eq!(
            RecordOutcome::Duplicate {
                info_hash: "a".to_string()
            }
            .label(),
            "duplicate"
        );
        assert_eq!(
            RecordOutcome::Failed {
                error: "e".to_string()
            }
            .label(),
            "failed"
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = CrawlSummary::default();
        summary.record(&RecordOutcome::Invalid {
            reason: "no size".to_string(),
        });
        summary.record(&RecordOutcome::Refreshed {
            info_hash: "a".to_string(),
            seeders: Some(3),
        });
        summary.record(&RecordOutcome::Failed {
            error: "boom".to_string(),
        });

        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.refreshed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.records(), 3);
    }

    #[test]
    fn test_retry_policy_constructors() {
        let policy = RetryPolicy::with_retries(3, Duration::from_millis(250));
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff(), Duration::from_millis(250));
        assert_eq!(RetryPolicy::default().max_retries, 0);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = RecordOutcome::Refreshed {
            info_hash: "abc".to_string(),
            seeders: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "refreshed");
        assert_eq!(json["info_hash"], "abc");
    }
}
