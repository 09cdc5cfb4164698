//! SQLite-backed torrent catalog implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    CatalogError, CatalogStats, IdentifierProvider, ProviderWatermark, TorrentEntry, TorrentKey,
    TorrentStore, TorrentType,
};

const ENTRY_COLUMNS: &str =
    "info_hash, provider, torrent_id, title, type, size, seeders, upload_date, imdb_id";

/// SQLite-backed torrent catalog.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Create a new SQLite catalog, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            -- One row per unique info_hash
            CREATE TABLE IF NOT EXISTS torrents (
                info_hash TEXT PRIMARY KEY,
                provider TEXT NOT NULL,
                torrent_id TEXT NOT NULL,
                title TEXT NOT NULL,
                type TEXT NOT NULL,
                size INTEGER NOT NULL,
                seeders INTEGER NOT NULL DEFAULT 0,
                upload_date TEXT,
                imdb_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_torrents_provider_id ON torrents(provider, torrent_id);
            CREATE INDEX IF NOT EXISTS idx_torrents_title ON torrents(title);
            CREATE INDEX IF NOT EXISTS idx_torrents_imdb ON torrents(imdb_id);
            CREATE INDEX IF NOT EXISTS idx_torrents_updated ON torrents(provider, updated_at);

            -- Last successful scrape per provider
            CREATE TABLE IF NOT EXISTS providers (
                name TEXT PRIMARY KEY,
                last_scraped TEXT
            );
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn now_str() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
        value.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<TorrentEntry> {
        let type_str: String = row.get(4)?;
        let size: i64 = row.get(5)?;
        let upload_date: Option<String> = row.get(7)?;

        Ok(TorrentEntry {
            info_hash: row.get(0)?,
            provider: row.get(1)?,
            torrent_id: row.get(2)?,
            title: row.get(3)?,
            torrent_type: TorrentType::parse(&type_str).unwrap_or(TorrentType::Series),
            size: size.max(0) as u64,
            seeders: row.get(6)?,
            upload_date: Self::parse_timestamp(upload_date),
            imdb_id: row.get(8)?,
        })
    }
}

impl TorrentStore for SqliteCatalog {
    fn get_provider(&self, name: &str) -> Result<ProviderWatermark, CatalogError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR IGNORE INTO providers (name, last_scraped) VALUES (?, NULL)",
            params![name],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        let last_scraped: Option<String> = conn
            .query_row(
                "SELECT last_scraped FROM providers WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(ProviderWatermark {
            name: name.to_string(),
            last_scraped: Self::parse_timestamp(last_scraped),
        })
    }

    fn save_provider(&self, watermark: &ProviderWatermark) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO providers (name, last_scraped) VALUES (?, ?)
             ON CONFLICT(name) DO UPDATE SET last_scraped = excluded.last_scraped",
            params![
                &watermark.name,
                watermark.last_scraped.map(|dt| dt.to_rfc3339())
            ],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn lookup(&self, key: &TorrentKey) -> Result<Option<TorrentEntry>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let result = match key {
            TorrentKey::InfoHash(hash) => conn
                .query_row(
                    &format!("SELECT {} FROM torrents WHERE info_hash = ?", ENTRY_COLUMNS),
                    params![hash.to_lowercase()],
                    Self::row_to_entry,
                )
                .optional(),
            TorrentKey::ProviderId {
                provider,
                torrent_id,
            } => conn
                .query_row(
                    &format!(
                        "SELECT {} FROM torrents WHERE provider = ? AND torrent_id = ? LIMIT 1",
                        ENTRY_COLUMNS
                    ),
                    params![provider, torrent_id],
                    Self::row_to_entry,
                )
                .optional(),
        };

        result.map_err(|e| CatalogError::Database(e.to_string()))
    }

    fn create(&self, entry: &TorrentEntry) -> Result<bool, CatalogError> {
        let size = i64::try_from(entry.size).map_err(|_| {
            CatalogError::Internal(format!("size {} does not fit in the catalog", entry.size))
        })?;

        let conn = self.conn.lock().unwrap();
        let now_str = Self::now_str();

        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO torrents
                    (info_hash, provider, torrent_id, title, type, size, seeders, upload_date, imdb_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    entry.info_hash.to_lowercase(),
                    &entry.provider,
                    &entry.torrent_id,
                    &entry.title,
                    entry.torrent_type.as_str(),
                    size,
                    entry.seeders,
                    entry.upload_date.map(|dt| dt.to_rfc3339()),
                    &entry.imdb_id,
                    &now_str,
                    &now_str,
                ],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    fn refresh_seeders(&self, info_hash: &str, seeders: u32) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();

        let updated = conn
            .execute(
                "UPDATE torrents SET seeders = ?, updated_at = ? WHERE info_hash = ?",
                params![seeders, Self::now_str(), info_hash.to_lowercase()],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(CatalogError::NotFound(info_hash.to_string()));
        }
        Ok(())
    }

    fn least_recently_updated(
        &self,
        provider: &str,
        limit: u32,
    ) -> Result<Vec<TorrentEntry>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM torrents WHERE provider = ? ORDER BY updated_at ASC LIMIT ?",
                ENTRY_COLUMNS
            ))
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![provider, limit], Self::row_to_entry)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(entries)
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(size), 0), COUNT(DISTINCT provider) FROM torrents",
            [],
            |row| {
                let total: i64 = row.get(0)?;
                let size: i64 = row.get(1)?;
                let providers: i64 = row.get(2)?;
                Ok(CatalogStats {
                    total_torrents: total.max(0) as u64,
                    total_size_bytes: size.max(0) as u64,
                    providers: providers.max(0) as u32,
                })
            },
        )
        .map_err(|e| CatalogError::Database(e.to_string()))
    }
}

impl IdentifierProvider for SqliteCatalog {
    fn imdb_ids(&self, entry: &TorrentEntry) -> Result<Vec<String>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT imdb_id FROM torrents
                 WHERE imdb_id IS NOT NULL AND imdb_id != '' AND (info_hash = ?1 OR title = ?2)
                 ORDER BY imdb_id",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![entry.info_hash.to_lowercase(), &entry.title],
                |row| row.get::<_, String>(0),
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }

        if let Some(own) = entry.imdb_id.as_ref().filter(|id| !id.is_empty()) {
            if !ids.contains(own) {
                ids.push(own.clone());
            }
        }
        Ok(ids)
    }
}
