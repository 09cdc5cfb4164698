pub mod catalog;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod scraper;

pub use routes::create_router;

use serde::Serialize;

/// Error body shared by all handlers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
