//! Incremental scrape engine.
//!
//! A scrape cycle walks the source's newest-first listing pages and
//! reconciles every listing against the catalog: unknown listings are
//! inserted, known ones get a fresh seeder count. Outbound lookups made
//! while refreshing seeders go through a shared [`CallLimiter`].

mod config;
mod crawler;
mod limiter;
mod reconciler;
mod runner;
mod seeders;
mod types;

pub use config::ScraperConfig;
pub use crawler::PaginationCrawler;
pub use limiter::CallLimiter;
pub use reconciler::{normalize_title, RecordReconciler};
pub use runner::Scraper;
pub use seeders::SeederRefresher;
pub use types::*;

use std::any::Any;

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
