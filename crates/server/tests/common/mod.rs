//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! backed by a mock listing source and a real SQLite catalog in a temp dir.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use seedcrawl_core::{
    testing::MockSource, Config, DatabaseConfig, Scraper, ScraperConfig, SqliteCatalog,
};

/// Re-export fixtures for test convenience
pub use seedcrawl_core::testing::fixtures;

/// Test fixture for API testing with a mock source.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_scrape() {
///     let fixture = TestFixture::new().await;
///     fixture.source.set_page(1, vec![fixtures::listing("aaa", "1", "Show")]).await;
///
///     let response = fixture.post("/api/v1/scrape").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock source - configure pages, searches and detail lookups
    pub source: Arc<MockSource>,
    /// The catalog behind the router
    pub catalog: Arc<SqliteCatalog>,
    /// Scraper shared with the router
    pub scraper: Arc<Scraper>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default scraper settings.
    pub async fn new() -> Self {
        Self::with_scraper_config(ScraperConfig::default()).await
    }

    /// Create a test fixture with custom scraper configuration.
    pub async fn with_scraper_config(scraper_config: ScraperConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            scraper: scraper_config.clone(),
            ..Default::default()
        };

        let source = Arc::new(MockSource::new());
        let catalog = Arc::new(SqliteCatalog::new(&db_path).expect("Failed to create catalog"));
        let scraper = Arc::new(Scraper::new(
            scraper_config,
            source.clone(),
            catalog.clone(),
            catalog.clone(),
        ));

        let state = Arc::new(seedcrawl_server::state::AppState::new(
            config,
            catalog.clone(),
            Arc::clone(&scraper),
        ));
        let router = seedcrawl_server::api::create_router(state);

        Self {
            router,
            source,
            catalog,
            scraper,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
