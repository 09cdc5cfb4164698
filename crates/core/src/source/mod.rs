//! Remote listing source abstraction.
//!
//! This module provides a `TorrentSource` trait for the paginated listing
//! feed the scraper walks, plus the EZTV HTTP implementation.

mod eztv;
mod types;

pub use eztv::EztvClient;
pub use types::*;
