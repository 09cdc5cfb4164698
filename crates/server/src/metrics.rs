//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the seedcrawl server:
//! - HTTP request metrics (latency, counts)
//! - Catalog size and scraper status (collected dynamically)
//! - Core scrape metrics, registered from `seedcrawl_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "seedcrawl_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("seedcrawl_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "seedcrawl_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics (collected dynamically)
// =============================================================================

/// Torrent catalog entries.
pub static CATALOG_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "seedcrawl_catalog_entries",
        "Number of entries in the torrent catalog",
    )
    .unwrap()
});

/// Total bytes described by catalog entries.
pub static CATALOG_SIZE_BYTES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "seedcrawl_catalog_size_bytes",
        "Sum of the sizes of all catalog entries",
    )
    .unwrap()
});

// =============================================================================
// Scraper Metrics (collected dynamically)
// =============================================================================

/// Scraper running state (1 = cycle in progress, 0 = idle).
pub static SCRAPER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "seedcrawl_scraper_running",
        "Whether a scrape cycle is in progress (1) or not (0)",
    )
    .unwrap()
});

/// Provider watermark as a unix timestamp.
pub static LAST_SCRAPED_TIMESTAMP: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "seedcrawl_last_scraped_timestamp_seconds",
            "Start time of the last successful scrape cycle",
        ),
        &["provider"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Catalog
    registry
        .register(Box::new(CATALOG_ENTRIES.clone()))
        .unwrap();
    registry
        .register(Box::new(CATALOG_SIZE_BYTES.clone()))
        .unwrap();

    // Scraper
    registry
        .register(Box::new(SCRAPER_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(LAST_SCRAPED_TIMESTAMP.clone()))
        .unwrap();

    // Core metrics (scrape cycles, crawl, source calls)
    for metric in seedcrawl_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the catalog and watermark
/// at scrape time.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Ok(stats) = state.catalog().stats() {
        CATALOG_ENTRIES.set(stats.total_torrents as i64);
        CATALOG_SIZE_BYTES.set(stats.total_size_bytes as i64);
    }

    let scraper = state.scraper();
    SCRAPER_RUNNING.set(if scraper.is_running() { 1 } else { 0 });

    if let Ok(watermark) = scraper.watermark() {
        if let Some(last_scraped) = watermark.last_scraped {
            LAST_SCRAPED_TIMESTAMP
                .with_label_values(&[&watermark.name])
                .set(last_scraped.timestamp());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("seedcrawl_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        // Vec metrics only show up once a label set has been touched
        seedcrawl_core::metrics::SCRAPE_CYCLES
            .with_label_values(&["EZTV", "success"])
            .inc();
        seedcrawl_core::metrics::PAGES_FETCHED
            .with_label_values(&["EZTV", "success"])
            .inc();
        CATALOG_ENTRIES.set(0);
        SCRAPER_RUNNING.set(0);

        let output = encode_metrics();

        assert!(output.contains("seedcrawl_scrape_cycles_total"));
        assert!(output.contains("seedcrawl_pages_fetched_total"));
        assert!(output.contains("seedcrawl_limiter_in_flight"));
        assert!(output.contains("seedcrawl_catalog_entries"));
        assert!(output.contains("seedcrawl_scraper_running"));
    }
}
