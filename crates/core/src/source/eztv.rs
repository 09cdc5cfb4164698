//! EZTV listing source implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::SourceConfig;

use super::{RawListing, SourceError, TorrentSource};

static MAGNET_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"magnet:\?xt=urn:btih:([0-9A-Za-z]{32,40})").unwrap());
static PAGE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<title>(.*?)</title>").unwrap());
static SEEDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Seeds:\s*(?:<[^>]+>\s*)*([\d,]+)").unwrap());
static FILESIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Filesize:\s*(?:<[^>]+>\s*)*([\d.]+)\s*(KB|MB|GB|TB)").unwrap()
});
static IMDB_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"imdb\.com/title/(tt\d+)").unwrap());

/// EZTV HTTP client.
///
/// Uses the public `get-torrents` JSON API for browsing and IMDb searches,
/// and the episode page for single-torrent lookups (the API has no such
/// endpoint).
pub struct EztvClient {
    client: Client,
    config: SourceConfig,
}

impl EztvClient {
    /// Create a new EztvClient with the given configuration.
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn build_browse_url(&self, page: u32) -> String {
        format!(
            "{}/api/get-torrents?limit={}&page={}",
            self.base_url(),
            self.config.page_size,
            page
        )
    }

    fn build_search_url(&self, imdb_id: &str) -> String {
        // The API wants the numeric part only
        let numeric = imdb_id.trim_start_matches("tt");
        format!(
            "{}/api/get-torrents?limit={}&imdb_id={}",
            self.base_url(),
            self.config.page_size,
            urlencoding::encode(numeric)
        )
    }

    fn build_detail_url(&self, torrent_id: &str) -> String {
        format!("{}/ep/{}/", self.base_url(), urlencoding::encode(torrent_id))
    }

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        response.text().await.map_err(map_reqwest_error)
    }

    async fn get_torrents(&self, url: &str) -> Result<Vec<RawListing>, SourceError> {
        let body = self.get_text(url).await?;
        let parsed: EztvResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(parsed.torrents.into_iter().map(RawListing::from).collect())
    }
}

#[async_trait]
impl TorrentSource for EztvClient {
    fn name(&self) -> &str {
        "eztv"
    }

    async fn browse(&self, page: u32) -> Result<Vec<RawListing>, SourceError> {
        let url = self.build_browse_url(page);
        let listings = self.get_torrents(&url).await?;
        debug!(page = page, results = listings.len(), "EZTV browse complete");
        Ok(listings)
    }

    async fn search(&self, imdb_id: &str) -> Result<Vec<RawListing>, SourceError> {
        let url = self.build_search_url(imdb_id);
        let listings = self.get_torrents(&url).await?;
        debug!(imdb_id = imdb_id, results = listings.len(), "EZTV search complete");
        Ok(listings)
    }

    async fn torrent(&self, torrent_id: &str) -> Result<RawListing, SourceError> {
        let url = self.build_detail_url(torrent_id);
        let html = self.get_text(&url).await?;
        parse_detail_page(torrent_id, &html)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() {
        SourceError::ConnectionFailed(e.to_string())
    } else {
        SourceError::ApiError(e.to_string())
    }
}

/// Extract a listing from an EZTV episode page.
fn parse_detail_page(torrent_id: &str, html: &str) -> Result<RawListing, SourceError> {
    let info_hash = MAGNET_HASH
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .ok_or_else(|| SourceError::Parse(format!("no magnet link on page {}", torrent_id)))?;

    let name = PAGE_TITLE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| {
            let title = m.as_str().trim();
            title.split(" EZTV").next().unwrap_or(title).trim().to_string()
        })
        .filter(|t| !t.is_empty());

    let seeders = SEEDS
        .captures(html)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse::<u32>().ok());

    let size = FILESIZE.captures(html).and_then(|c| {
        let value: f64 = c.get(1)?.as_str().parse().ok()?;
        let multiplier: f64 = match c.get(2)?.as_str() {
            "KB" => 1024.0,
            "MB" => 1024.0 * 1024.0,
            "GB" => 1024.0 * 1024.0 * 1024.0,
            _ => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        };
        Some((value * multiplier) as u64)
    });

    let imdb_id = IMDB_LINK
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    Ok(RawListing {
        info_hash: Some(info_hash),
        torrent_id: Some(torrent_id.to_string()),
        name,
        size,
        seeders,
        upload_date: None,
        imdb_id,
    })
}

// EZTV API response types
#[derive(Debug, Deserialize)]
struct EztvResponse {
    #[serde(default)]
    torrents: Vec<EztvTorrent>,
}

#[derive(Debug, Deserialize)]
struct EztvTorrent {
    id: Option<NumberOrString>,
    hash: Option<String>,
    filename: Option<String>,
    title: Option<String>,
    imdb_id: Option<NumberOrString>,
    seeds: Option<NumberOrString>,
    date_released_unix: Option<NumberOrString>,
    size_bytes: Option<NumberOrString>,
}

/// EZTV returns some numeric fields as strings and others as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

impl NumberOrString {
    fn as_i64(&self) -> Option<i64> {
        match self {
            NumberOrString::Number(n) => Some(*n),
            NumberOrString::Text(s) => s.trim().parse().ok(),
        }
    }

    fn into_string(self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::Text(s) => s,
        }
    }
}

impl From<EztvTorrent> for RawListing {
    fn from(t: EztvTorrent) -> Self {
        let imdb_id = t
            .imdb_id
            .map(NumberOrString::into_string)
            .map(|id| id.trim().trim_start_matches("tt").to_string())
            .filter(|id| !id.is_empty() && id.chars().any(|c| c != '0'))
            .map(|id| format!("tt{}", id));

        RawListing {
            info_hash: t.hash.map(|h| h.to_lowercase()).filter(|h| !h.is_empty()),
            torrent_id: t.id.map(NumberOrString::into_string),
            name: t.title.or(t.filename),
            size: t.size_bytes.and_then(|s| s.as_i64()).and_then(|s| u64::try_from(s).ok()),
            seeders: t.seeds.and_then(|s| s.as_i64()).and_then(|s| u32::try_from(s).ok()),
            upload_date: t
                .date_released_unix
                .and_then(|d| d.as_i64())
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            imdb_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> EztvClient {
        EztvClient::new(SourceConfig {
            url: "https://eztv.example/".to_string(),
            timeout_secs: 5,
            page_size: 50,
        })
        .unwrap()
    }

    #[test]
    fn test_build_urls() {
        let c = client();
        assert_eq!(
            c.build_browse_url(3),
            "https://eztv.example/api/get-torrents?limit=50&page=3"
        );
        assert_eq!(
            c.build_search_url("tt0944947"),
            "https://eztv.example/api/get-torrents?limit=50&imdb_id=0944947"
        );
        assert_eq!(c.build_detail_url("1234"), "https://eztv.example/ep/1234/");
    }

    #[test]
    fn test_parse_api_response() {
        let json = r#"{
            "torrents_count": 2,
            "limit": 50,
            "page": 1,
            "torrents": [
                {
                    "id": 1984321,
                    "hash": "ABCDEF0123456789ABCDEF0123456789ABCDEF01",
                    "filename": "Show.S01E02.720p.mkv",
                    "title": "Show S01E02 720p\tWEB  x264",
                    "imdb_id": "0944947",
                    "seeds": 41,
                    "date_released_unix": 1700000000,
                    "size_bytes": "734003200"
                },
                {
                    "id": "1984322",
                    "hash": "",
                    "filename": "Other.mkv",
                    "imdb_id": "0",
                    "seeds": "7"
                }
            ]
        }"#;

        let parsed: EztvResponse = serde_json::from_str(json).unwrap();
        let listings: Vec<RawListing> = parsed.torrents.into_iter().map(RawListing::from).collect();

        assert_eq!(listings.len(), 2);
        let first = &listings[0];
        assert_eq!(
            first.info_hash.as_deref(),
            Some("abcdef0123456789abcdef0123456789abcdef01")
        );
        assert_eq!(first.torrent_id.as_deref(), Some("1984321"));
        assert_eq!(first.name.as_deref(), Some("Show S01E02 720p\tWEB  x264"));
        assert_eq!(first.size, Some(734003200));
        assert_eq!(first.seeders, Some(41));
        assert_eq!(first.imdb_id.as_deref(), Some("tt0944947"));
        assert_eq!(first.upload_date.unwrap().timestamp(), 1700000000);

        let second = &listings[1];
        assert!(second.info_hash.is_none());
        assert_eq!(second.torrent_id.as_deref(), Some("1984322"));
        assert_eq!(second.name.as_deref(), Some("Other.mkv"));
        assert!(second.size.is_none());
        assert!(second.imdb_id.is_none());
        assert_eq!(second.seeders, Some(7));
    }

    #[test]
    fn test_parse_empty_page() {
        let parsed: EztvResponse =
            serde_json::from_str(r#"{"torrents_count": 0, "page": 99}"#).unwrap();
        assert!(parsed.torrents.is_empty());
    }

    #[test]
    fn test_parse_detail_page() {
        let html = r#"
            <html><head><title>Show S01E02 720p WEB x264 EZTV</title></head>
            <body>
              <a href="magnet:?xt=urn:btih:ABCDEF0123456789ABCDEF0123456789ABCDEF01&dn=x">Magnet</a>
              <b>Filesize:</b> 1.5 GB
              <b>Seeds:</b> <span class="stat_green">1,204</span>
              <a href="https://www.imdb.com/title/tt0944947/">IMDB</a>
            </body></html>
        "#;

        let listing = parse_detail_page("77", html).unwrap();
        assert_eq!(
            listing.info_hash.as_deref(),
            Some("abcdef0123456789abcdef0123456789abcdef01")
        );
        assert_eq!(listing.torrent_id.as_deref(), Some("77"));
        assert_eq!(listing.name.as_deref(), Some("Show S01E02 720p WEB x264"));
        assert_eq!(listing.seeders, Some(1204));
        assert_eq!(listing.size, Some((1.5 * 1024.0 * 1024.0 * 1024.0) as u64));
        assert_eq!(listing.imdb_id.as_deref(), Some("tt0944947"));
    }

    #[test]
    fn test_parse_detail_page_without_magnet() {
        let err = parse_detail_page("77", "<html><title>Gone</title></html>").unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
