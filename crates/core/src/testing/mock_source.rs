//! Mock listing source for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::source::{RawListing, SourceError, TorrentSource};

/// Mock implementation of the TorrentSource trait.
///
/// Provides controllable behavior for testing:
/// - Scripted browse pages, IMDb search results and detail lookups
/// - Injected failures (per page, per IMDb id) and panics
/// - Call recording and a high-water mark of concurrent lookups
///
/// # Example
///
/// ```rust,ignore
/// use seedcrawl_core::testing::{MockSource, fixtures};
///
/// let source = MockSource::new();
/// source.set_page(1, vec![fixtures::listing("aaa", "1", "Show S01E01")]).await;
/// source.fail_page(2).await;
///
/// // ... run a crawl ...
///
/// assert_eq!(source.recorded_browses().await, vec![1, 2]);
/// ```
pub struct MockSource {
    pages: Arc<RwLock<HashMap<u32, Vec<RawListing>>>>,
    /// Remaining failures per page (`u32::MAX` = always fail).
    page_errors: Arc<RwLock<HashMap<u32, u32>>>,
    panic_pages: Arc<RwLock<HashSet<u32>>>,
    search_results: Arc<RwLock<HashMap<String, Vec<RawListing>>>>,
    search_errors: Arc<RwLock<HashSet<String>>>,
    details: Arc<RwLock<HashMap<String, RawListing>>>,
    lookup_delay: Arc<RwLock<Option<Duration>>>,
    browses: Arc<RwLock<Vec<u32>>>,
    searches: Arc<RwLock<Vec<String>>>,
    lookups: Arc<RwLock<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for MockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSource")
            .field("pages", &"<pages>")
            .field("search_results", &"<search_results>")
            .field("details", &"<details>")
            .field("max_in_flight", &self.max_in_flight.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    /// Create a mock source where every page is empty.
    pub fn new() -> Self {
        Self {
            pages: Arc::new(RwLock::new(HashMap::new())),
            page_errors: Arc::new(RwLock::new(HashMap::new())),
            panic_pages: Arc::new(RwLock::new(HashSet::new())),
            search_results: Arc::new(RwLock::new(HashMap::new())),
            search_errors: Arc::new(RwLock::new(HashSet::new())),
            details: Arc::new(RwLock::new(HashMap::new())),
            lookup_delay: Arc::new(RwLock::new(None)),
            browses: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            lookups: Arc::new(RwLock::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the listings returned for a browse page.
    pub async fn set_page(&self, page: u32, listings: Vec<RawListing>) {
        self.pages.write().await.insert(page, listings);
    }

    /// Make every fetch of `page` fail.
    pub async fn fail_page(&self, page: u32) {
        self.page_errors.write().await.insert(page, u32::MAX);
    }

    /// Make the next `times` fetches of `page` fail.
    pub async fn fail_page_times(&self, page: u32, times: u32) {
        self.page_errors.write().await.insert(page, times);
    }

    /// Make fetching `page` panic.
    pub async fn panic_on_page(&self, page: u32) {
        self.panic_pages.write().await.insert(page);
    }

    /// Set the results of an IMDb search.
    pub async fn set_search_results(&self, imdb_id: &str, listings: Vec<RawListing>) {
        self.search_results
            .write()
            .await
            .insert(imdb_id.to_string(), listings);
    }

    /// Make searches for `imdb_id` fail.
    pub async fn fail_search(&self, imdb_id: &str) {
        self.search_errors.write().await.insert(imdb_id.to_string());
    }

    /// Set the listing returned by a direct lookup.
    pub async fn set_detail(&self, torrent_id: &str, listing: RawListing) {
        self.details
            .write()
            .await
            .insert(torrent_id.to_string(), listing);
    }

    /// Delay every search and direct lookup.
    pub async fn set_lookup_delay(&self, delay: Duration) {
        *self.lookup_delay.write().await = Some(delay);
    }

    /// Pages requested, in call order.
    pub async fn recorded_browses(&self) -> Vec<u32> {
        self.browses.read().await.clone()
    }

    /// IMDb ids searched, in call order.
    pub async fn recorded_searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    /// Torrent ids looked up directly, in call order.
    pub async fn recorded_lookups(&self) -> Vec<String> {
        self.lookups.read().await.clone()
    }

    /// Highest number of searches/lookups observed executing at once.
    pub fn max_concurrent_lookups(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter_lookup(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.lookup_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    fn exit_lookup(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TorrentSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn browse(&self, page: u32) -> Result<Vec<RawListing>, SourceError> {
        self.browses.write().await.push(page);

        if self.panic_pages.read().await.contains(&page) {
            panic!("mock browse panicked on page {}", page);
        }

        {
            let mut errors = self.page_errors.write().await;
            if let Some(remaining) = errors.get_mut(&page) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(SourceError::ConnectionFailed(format!(
                        "mock failure on page {}",
                        page
                    )));
                }
            }
        }

        Ok(self
            .pages
            .read()
            .await
            .get(&page)
            .cloned()
            .unwrap_or_default())
    }

    async fn search(&self, imdb_id: &str) -> Result<Vec<RawListing>, SourceError> {
        self.searches.write().await.push(imdb_id.to_string());
        self.enter_lookup().await;

        let result = if self.search_errors.read().await.contains(imdb_id) {
            Err(SourceError::ApiError(format!("mock search failure for {}", imdb_id)))
        } else {
            Ok(self
                .search_results
                .read()
                .await
                .get(imdb_id)
                .cloned()
                .unwrap_or_default())
        };

        self.exit_lookup();
        result
    }

    async fn torrent(&self, torrent_id: &str) -> Result<RawListing, SourceError> {
        self.lookups.write().await.push(torrent_id.to_string());
        self.enter_lookup().await;

        let result = self
            .details
            .read()
            .await
            .get(torrent_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(torrent_id.to_string()));

        self.exit_lookup();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_unknown_page_is_empty() {
        let source = MockSource::new();
        assert!(source.browse(4).await.unwrap().is_empty());
        assert_eq!(source.recorded_browses().await, vec![4]);
    }

    #[tokio::test]
    async fn test_fail_page_times() {
        let source = MockSource::new();
        source
            .set_page(1, vec![fixtures::listing("aaa", "1", "Show")])
            .await;
        source.fail_page_times(1, 1).await;

        assert!(source.browse(1).await.is_err());
        assert_eq!(source.browse(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let source = MockSource::new();
        let err = source.torrent("99").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
        assert_eq!(source.recorded_lookups().await, vec!["99".to_string()]);
    }
}
