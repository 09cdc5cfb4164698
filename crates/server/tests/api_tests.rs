//! API tests against an in-process router with a mock source.

mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use seedcrawl_core::{TorrentKey, TorrentStore};

use common::{fixtures, TestFixture};

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["scraper"]["provider"], "EZTV");
    assert_eq!(response.body["scraper"]["until_page"], 10);
    assert_eq!(response.body["source"]["url"], "https://eztv.re");
}

#[tokio::test]
async fn test_providers_before_first_scrape() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/providers").await;

    assert_eq!(response.status, StatusCode::OK);
    let providers = response.body.as_array().unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0]["name"], "EZTV");
    assert!(providers[0]["last_scraped"].is_null());
    assert_eq!(providers[0]["running"], false);
}

#[tokio::test]
async fn test_scrape_creates_entries_and_sets_watermark() {
    let fixture = TestFixture::new().await;
    fixture
        .source
        .set_page(
            1,
            vec![
                fixtures::listing("aaa", "1", "Show\tS01E01  720p"),
                fixtures::listing("bbb", "2", "Show S01E02"),
            ],
        )
        .await;

    let response = fixture.post("/api/v1/scrape").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["summary"]["created"], 2);
    assert_eq!(response.body["summary"]["pages_fetched"], 2);

    let entry = fixture
        .catalog
        .lookup(&TorrentKey::InfoHash("aaa".to_string()))
        .unwrap()
        .unwrap();
    assert_eq!(entry.title, "Show S01E01 720p");

    let providers = fixture.get("/api/v1/providers").await;
    let parse = |v: &serde_json::Value| {
        v.as_str()
            .unwrap()
            .parse::<DateTime<Utc>>()
            .unwrap()
    };
    assert_eq!(
        parse(&providers.body[0]["last_scraped"]),
        parse(&response.body["started_at"])
    );

    let stats = fixture.get("/api/v1/catalog/stats").await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["total_torrents"], 2);
}

#[tokio::test]
async fn test_concurrent_scrape_returns_conflict() {
    let fixture = TestFixture::new().await;
    fixture
        .source
        .set_page(1, vec![fixtures::listing("aaa", "1", "Show S01E01")])
        .await;
    // Keep the first cycle busy in a seeder lookup
    fixture.catalog.create(&fixtures::entry("aaa", "1", "Show S01E01")).unwrap();
    fixture
        .source
        .set_lookup_delay(std::time::Duration::from_millis(300))
        .await;

    let scraper = fixture.scraper.clone();
    let first = tokio::spawn(async move { scraper.scrape().await });
    while !fixture.scraper.is_running() {
        tokio::task::yield_now().await;
    }

    let response = fixture.post("/api/v1/scrape").await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.body["error"].as_str().unwrap().contains("already running"));
    assert!(first.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.post("/api/v1/scrape").await;

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("seedcrawl_scrape_cycles_total"));
    assert!(response.text.contains("seedcrawl_catalog_entries"));
    assert!(response.text.contains("seedcrawl_last_scraped_timestamp_seconds"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/nonexistent").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_http_metrics_use_route_labels() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;
    fixture.get("/api/v1/no-such-route-7f3a").await;

    let response = fixture.get("/metrics").await;

    assert!(response
        .text
        .contains(r#"path="/api/v1/health""#));
    assert!(response.text.contains(r#"path="unmatched""#));
    assert!(!response.text.contains("no-such-route-7f3a"));
}
