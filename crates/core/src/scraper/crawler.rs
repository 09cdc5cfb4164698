//! Pagination over the newest-first listing feed.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::metrics;
use crate::source::{RawListing, TorrentSource};

use super::{CrawlSummary, RecordReconciler, RetryPolicy};

/// Walks listing pages from 1 up to a hard bound, reconciling every record.
///
/// Pages are fetched one after another; the records of a page are
/// reconciled concurrently. The crawl stops at the first empty page (a
/// failed fetch counts as empty) or once `until_page` has been processed.
pub struct PaginationCrawler {
    provider: String,
    source: Arc<dyn TorrentSource>,
    reconciler: Arc<RecordReconciler>,
    until_page: u32,
    retry: RetryPolicy,
}

impl PaginationCrawler {
    pub fn new(
        provider: impl Into<String>,
        source: Arc<dyn TorrentSource>,
        reconciler: Arc<RecordReconciler>,
        until_page: u32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider: provider.into(),
            source,
            reconciler,
            until_page,
            retry,
        }
    }

    pub fn until_page(&self) -> u32 {
        self.until_page
    }

    /// Run the crawl to completion. Never fails; failures show up in the summary.
    pub async fn crawl(&self) -> CrawlSummary {
        let mut summary = CrawlSummary::default();
        let mut page = 1;

        loop {
            let listings = self.fetch_page(page, &mut summary).await;

            let outcomes = join_all(
                listings
                    .into_iter()
                    .map(|listing| self.reconciler.process_isolated(listing)),
            )
            .await;
            for outcome in &outcomes {
                summary.record(outcome);
            }

            debug!(
                provider = %self.provider,
                page = page,
                records = outcomes.len(),
                "Page processed"
            );

            if outcomes.is_empty() || page >= self.until_page {
                break;
            }
            page += 1;
        }

        summary
    }

    /// Fetch one page, applying the retry policy. Exhausted retries yield an empty page.
    async fn fetch_page(&self, page: u32, summary: &mut CrawlSummary) -> Vec<RawListing> {
        summary.pages_fetched += 1;
        let mut attempt = 0;

        loop {
            let result = self.source.browse(page).await;
            metrics::record_source_request(self.source.name(), "browse", &result);

            match result {
                Ok(listings) => {
                    let label = if listings.is_empty() { "empty" } else { "success" };
                    metrics::PAGES_FETCHED
                        .with_label_values(&[&self.provider, label])
                        .inc();
                    return listings;
                }
                Err(e) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(
                        page = page,
                        attempt = attempt,
                        error = %e,
                        "Failed to fetch page, retrying in {}ms",
                        self.retry.backoff_ms
                    );
                    tokio::time::sleep(self.retry.backoff()).await;
                }
                Err(e) => {
                    warn!(page = page, error = %e, "Failed to fetch page, stopping crawl");
                    summary.page_failures += 1;
                    metrics::PAGES_FETCHED
                        .with_label_values(&[&self.provider, "error"])
                        .inc();
                    return Vec::new();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::{CallLimiter, SeederRefresher};
    use crate::testing::{fixtures, MockCatalog, MockSource};
    use std::time::Duration;

    struct Harness {
        source: Arc<MockSource>,
        catalog: Arc<MockCatalog>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                source: Arc::new(MockSource::new()),
                catalog: Arc::new(MockCatalog::new()),
            }
        }

        fn crawler(&self, until_page: u32, retry: RetryPolicy) -> PaginationCrawler {
            let refresher = Arc::new(SeederRefresher::new(
                self.source.clone(),
                self.catalog.clone(),
                self.catalog.clone(),
                Arc::new(CallLimiter::new(1)),
            ));
            let reconciler = Arc::new(RecordReconciler::new(
                "EZTV",
                self.catalog.clone(),
                refresher,
            ));
            PaginationCrawler::new("EZTV", self.source.clone(), reconciler, until_page, retry)
        }

        async fn fill_pages(&self, pages: std::ops::RangeInclusive<u32>) {
            for page in pages {
                self.source
                    .set_page(
                        page,
                        vec![fixtures::listing(
                            &format!("hash{}", page),
                            &page.to_string(),
                            &format!("Show S01E{:02}", page),
                        )],
                    )
                    .await;
            }
        }
    }

    #[tokio::test]
    async fn test_stops_at_until_page() {
        let h = Harness::new();
        h.fill_pages(1..=20).await;

        let summary = h.crawler(10, RetryPolicy::fail_soft()).crawl().await;

        assert_eq!(h.source.recorded_browses().await, (1..=10).collect::<Vec<_>>());
        assert_eq!(summary.pages_fetched, 10);
        assert_eq!(summary.created, 10);
        assert_eq!(h.catalog.len(), 10);
    }

    #[tokio::test]
    async fn test_stops_at_first_empty_page() {
        let h = Harness::new();
        h.fill_pages(1..=2).await;
        h.fill_pages(4..=5).await;

        let summary = h.crawler(10, RetryPolicy::fail_soft()).crawl().await;

        assert_eq!(h.source.recorded_browses().await, vec![1, 2, 3]);
        assert_eq!(summary.pages_fetched, 3);
        assert_eq!(summary.created, 2);
    }

    #[tokio::test]
    async fn test_failed_page_stops_without_error() {
        let h = Harness::new();
        h.fill_pages(1..=5).await;
        h.source.fail_page(2).await;

        let summary = h.crawler(10, RetryPolicy::fail_soft()).crawl().await;

        assert_eq!(h.source.recorded_browses().await, vec![1, 2]);
        assert_eq!(summary.page_failures, 1);
        assert_eq!(summary.created, 1);
    }

    #[tokio::test]
    async fn test_retry_policy_recovers_page() {
        let h = Harness::new();
        h.fill_pages(1..=2).await;
        h.source.fail_page_times(2, 2).await;

        let retry = RetryPolicy::with_retries(2, Duration::from_millis(1));
        let summary = h.crawler(10, retry).crawl().await;

        assert_eq!(h.source.recorded_browses().await, vec![1, 2, 2, 2, 3]);
        assert_eq!(summary.page_failures, 0);
        assert_eq!(summary.created, 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted_treated_as_empty() {
        let h = Harness::new();
        h.fill_pages(1..=3).await;
        h.source.fail_page(1).await;

        let retry = RetryPolicy::with_retries(1, Duration::from_millis(1));
        let summary = h.crawler(10, retry).crawl().await;

        assert_eq!(h.source.recorded_browses().await, vec![1, 1]);
        assert_eq!(summary.page_failures, 1);
        assert_eq!(summary.records(), 0);
    }

    #[tokio::test]
    async fn test_invalid_records_keep_the_crawl_going() {
        let h = Harness::new();
        h.source
            .set_page(
                1,
                vec![
                    fixtures::sizeless_listing("aaa", "1", "Broken"),
                    fixtures::listing("bbb", "2", "Fine"),
                ],
            )
            .await;
        h.source
            .set_page(2, vec![fixtures::sizeless_listing("ccc", "3", "Broken")])
            .await;

        let summary = h.crawler(10, RetryPolicy::fail_soft()).crawl().await;

        assert_eq!(h.source.recorded_browses().await, vec![1, 2, 3]);
        assert_eq!(summary.invalid, 2);
        assert_eq!(summary.created, 1);
    }

    #[tokio::test]
    async fn test_one_failing_record_does_not_fail_the_page() {
        let h = Harness::new();
        h.catalog.panic_on_lookup("aaa");
        h.source
            .set_page(
                1,
                vec![
                    fixtures::listing("aaa", "1", "Explodes"),
                    fixtures::listing("bbb", "2", "Fine"),
                ],
            )
            .await;

        let summary = h.crawler(10, RetryPolicy::fail_soft()).crawl().await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 1);
        assert!(h.catalog.entry("bbb").is_some());
    }
}
