//! Scraper API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use seedcrawl_core::{ScrapeError, ScrapeReport};

use super::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Provider status response
#[derive(Debug, Serialize)]
pub struct ProviderResponse {
    pub name: String,
    /// Start time of the last successful cycle
    pub last_scraped: Option<DateTime<Utc>>,
    /// Whether a cycle is currently in progress
    pub running: bool,
    pub until_page: u32,
    pub interval_secs: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/providers
///
/// List providers with their watermark.
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProviderResponse>>, impl IntoResponse> {
    let scraper = state.scraper();

    match scraper.watermark() {
        Ok(watermark) => Ok(Json(vec![ProviderResponse {
            name: watermark.name,
            last_scraped: watermark.last_scraped,
            running: scraper.is_running(),
            until_page: scraper.config().until_page,
            interval_secs: scraper.config().interval_secs,
        }])),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// POST /api/v1/scrape
///
/// Run one scrape cycle now and return its report.
pub async fn run_scrape(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ScrapeReport>, impl IntoResponse> {
    match state.scraper().scrape().await {
        Ok(report) => Ok(Json(report)),
        Err(ScrapeError::AlreadyRunning) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: ScrapeError::AlreadyRunning.to_string(),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
