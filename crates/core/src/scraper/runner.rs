//! Scrape cycle runner.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::catalog::{IdentifierProvider, ProviderWatermark, TorrentStore};
use crate::metrics;
use crate::source::TorrentSource;

use super::{
    panic_message, CallLimiter, PaginationCrawler, RecordReconciler, ScrapeError, ScrapeReport,
    ScraperConfig, SeederRefresher, SweepReport,
};

/// Runs scrape cycles for one provider.
///
/// A cycle captures its start time, loads (or creates) the provider
/// watermark, crawls the listing feed and then stores the start time as the
/// new watermark. Only one cycle runs at a time per scraper.
pub struct Scraper {
    config: ScraperConfig,
    store: Arc<dyn TorrentStore>,
    refresher: Arc<SeederRefresher>,
    crawler: PaginationCrawler,
    running: AtomicBool,
}

impl Scraper {
    /// Create a scraper with its own call limiter.
    pub fn new(
        config: ScraperConfig,
        source: Arc<dyn TorrentSource>,
        store: Arc<dyn TorrentStore>,
        identifiers: Arc<dyn IdentifierProvider>,
    ) -> Self {
        let limiter = Arc::new(CallLimiter::new(config.max_concurrent_lookups));
        Self::with_limiter(config, source, store, identifiers, limiter)
    }

    /// Create a scraper sharing an existing call limiter.
    pub fn with_limiter(
        config: ScraperConfig,
        source: Arc<dyn TorrentSource>,
        store: Arc<dyn TorrentStore>,
        identifiers: Arc<dyn IdentifierProvider>,
        limiter: Arc<CallLimiter>,
    ) -> Self {
        let refresher = Arc::new(SeederRefresher::new(
            Arc::clone(&source),
            Arc::clone(&store),
            identifiers,
            limiter,
        ));
        let reconciler = Arc::new(RecordReconciler::new(
            config.provider.clone(),
            Arc::clone(&store),
            Arc::clone(&refresher),
        ));
        let crawler = PaginationCrawler::new(
            config.provider.clone(),
            source,
            reconciler,
            config.until_page,
            config.retry_policy(),
        );

        Self {
            config,
            store,
            refresher,
            crawler,
            running: AtomicBool::new(false),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.config.provider
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<CallLimiter> {
        self.refresher.limiter()
    }

    /// Whether a cycle is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current stored watermark for this provider.
    pub fn watermark(&self) -> Result<ProviderWatermark, ScrapeError> {
        Ok(self.store.get_provider(&self.config.provider)?)
    }

    /// Run one scrape cycle.
    ///
    /// Returns `AlreadyRunning` if another cycle holds this scraper. The
    /// watermark is written only after the crawl completes; a failed write
    /// is the only error a finished crawl reports.
    pub async fn scrape(&self) -> Result<ScrapeReport, ScrapeError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ScrapeError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.running);

        let provider = self.config.provider.as_str();
        let timer = Instant::now();
        info!(provider = provider, "Scrape started");

        let result = self.run_cycle().await;

        metrics::SCRAPE_DURATION
            .with_label_values(&[provider])
            .observe(timer.elapsed().as_secs_f64());
        match &result {
            Ok(report) => {
                metrics::SCRAPE_CYCLES
                    .with_label_values(&[provider, "success"])
                    .inc();
                info!(
                    provider = provider,
                    pages = report.summary.pages_fetched,
                    created = report.summary.created,
                    refreshed = report.summary.refreshed,
                    invalid = report.summary.invalid,
                    failed = report.summary.failed,
                    "Scrape finished"
                );
            }
            Err(e) => {
                metrics::SCRAPE_CYCLES
                    .with_label_values(&[provider, "error"])
                    .inc();
                error!(provider = provider, error = %e, "Scrape failed");
            }
        }

        result
    }

    async fn run_cycle(&self) -> Result<ScrapeReport, ScrapeError> {
        let started_at = Utc::now();
        let mut watermark = self.store.get_provider(&self.config.provider)?;
        let previous_scraped = watermark.last_scraped;

        let summary = AssertUnwindSafe(self.crawler.crawl())
            .catch_unwind()
            .await
            .map_err(|payload| ScrapeError::Panicked(panic_message(payload.as_ref())))?;

        watermark.last_scraped = Some(started_at);
        self.store.save_provider(&watermark)?;

        Ok(ScrapeReport {
            provider: self.config.provider.clone(),
            started_at,
            finished_at: Utc::now(),
            previous_scraped,
            summary,
        })
    }

    /// Refresh seeders of the `limit` least recently updated entries.
    ///
    /// Each entry is refreshed independently; one failure doesn't stop the sweep.
    pub async fn refresh_seeders(&self, limit: u32) -> Result<SweepReport, ScrapeError> {
        let entries = self
            .store
            .least_recently_updated(&self.config.provider, limit)?;
        info!(
            provider = %self.config.provider,
            entries = entries.len(),
            "Seeder sweep started"
        );

        let results = join_all(entries.iter().map(|entry| {
            AssertUnwindSafe(self.refresher.refresh(entry)).catch_unwind()
        }))
        .await;

        let mut report = SweepReport::default();
        for (entry, result) in entries.iter().zip(results) {
            report.checked += 1;
            match result {
                Ok(Ok(Some(_))) => report.updated += 1,
                Ok(Ok(None)) => report.unchanged += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(info_hash = %entry.info_hash, error = %e, "Seeder refresh failed");
                }
                Err(payload) => {
                    report.failed += 1;
                    error!(
                        info_hash = %entry.info_hash,
                        panic = %panic_message(payload.as_ref()),
                        "Seeder refresh panicked"
                    );
                }
            }
        }

        info!(
            provider = %self.config.provider,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed,
            "Seeder sweep finished"
        );
        Ok(report)
    }
}

/// Clears the running flag when a cycle ends, including by unwinding.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
