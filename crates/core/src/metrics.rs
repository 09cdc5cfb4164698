//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Scrape cycles (results, duration)
//! - Pagination (pages fetched, records reconciled)
//! - Remote source calls and the outbound call limiter

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Scrape Cycle Metrics
// =============================================================================

/// Scrape cycles total by result.
pub static SCRAPE_CYCLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("seedcrawl_scrape_cycles_total", "Total scrape cycles"),
        &["provider", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Scrape cycle duration in seconds.
pub static SCRAPE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "seedcrawl_scrape_duration_seconds",
            "Duration of a full scrape cycle",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["provider"],
    )
    .unwrap()
});

// =============================================================================
// Crawl Metrics
// =============================================================================

/// Listing pages fetched by result.
pub static PAGES_FETCHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("seedcrawl_pages_fetched_total", "Total listing pages fetched"),
        &["provider", "result"], // result: "success", "empty", "error"
    )
    .unwrap()
});

/// Records reconciled by outcome.
pub static RECORDS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "seedcrawl_records_processed_total",
            "Total listings reconciled against the catalog",
        ),
        &["provider", "outcome"],
    )
    .unwrap()
});

/// Seeder refreshes by path taken.
pub static SEEDER_REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "seedcrawl_seeder_refreshes_total",
            "Total seeder refresh lookups",
        ),
        &["path", "status"], // path: "search", "direct"
    )
    .unwrap()
});

// =============================================================================
// Source Metrics
// =============================================================================

/// Remote source requests total.
pub static SOURCE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "seedcrawl_source_requests_total",
            "Total remote source requests",
        ),
        &["source", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Outbound lookups currently executing under the limiter.
pub static LIMITER_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "seedcrawl_limiter_in_flight",
        "Outbound lookups currently executing",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Count one source request.
pub fn record_source_request<T, E>(source: &str, operation: &str, result: &Result<T, E>) {
    let status = if result.is_ok() { "success" } else { "error" };
    SOURCE_REQUESTS
        .with_label_values(&[source, operation, status])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Scrape cycles
        Box::new(SCRAPE_CYCLES.clone()),
        Box::new(SCRAPE_DURATION.clone()),
        // Crawl
        Box::new(PAGES_FETCHED.clone()),
        Box::new(RECORDS_PROCESSED.clone()),
        Box::new(SEEDER_REFRESHES.clone()),
        // Source
        Box::new(SOURCE_REQUESTS.clone()),
        Box::new(LIMITER_IN_FLIGHT.clone()),
    ]
}
