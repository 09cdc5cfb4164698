//! Mock catalog store for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::catalog::{
    CatalogError, CatalogStats, IdentifierProvider, ProviderWatermark, TorrentEntry, TorrentKey,
    TorrentStore,
};

/// Mock implementation of the TorrentStore and IdentifierProvider traits.
///
/// Keeps everything in memory and exposes counters for assertions:
/// - `create_count()` / `refresh_calls()` / `save_count()`
///
/// Failures can be injected for watermark saves, identifier lookups and
/// individual lookups (by info hash, which panics instead of erroring).
pub struct MockCatalog {
    entries: Arc<RwLock<HashMap<String, TorrentEntry>>>,
    /// Update sequence per info hash, for `least_recently_updated`.
    updated: Arc<RwLock<HashMap<String, u64>>>,
    sequence: Arc<AtomicUsize>,
    providers: Arc<RwLock<HashMap<String, ProviderWatermark>>>,
    imdb_ids: Arc<RwLock<HashMap<String, Vec<String>>>>,
    identifier_error: Arc<RwLock<Option<String>>>,
    save_error: Arc<RwLock<Option<String>>>,
    forced_duplicates: Arc<RwLock<HashSet<String>>>,
    panic_lookups: Arc<RwLock<HashSet<String>>>,
    creates: Arc<AtomicUsize>,
    saves: Arc<AtomicUsize>,
    refreshes: Arc<RwLock<Vec<(String, u32)>>>,
}

impl std::fmt::Debug for MockCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCatalog")
            .field("entries", &self.entries.read().unwrap().len())
            .field("creates", &self.creates.load(Ordering::SeqCst))
            .field("saves", &self.saves.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Create an empty mock catalog.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            updated: Arc::new(RwLock::new(HashMap::new())),
            sequence: Arc::new(AtomicUsize::new(0)),
            providers: Arc::new(RwLock::new(HashMap::new())),
            imdb_ids: Arc::new(RwLock::new(HashMap::new())),
            identifier_error: Arc::new(RwLock::new(None)),
            save_error: Arc::new(RwLock::new(None)),
            forced_duplicates: Arc::new(RwLock::new(HashSet::new())),
            panic_lookups: Arc::new(RwLock::new(HashSet::new())),
            creates: Arc::new(AtomicUsize::new(0)),
            saves: Arc::new(AtomicUsize::new(0)),
            refreshes: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Seed an entry directly, bypassing the create counter.
    pub fn insert(&self, entry: TorrentEntry) {
        self.touch(&entry.info_hash);
        self.entries
            .write()
            .unwrap()
            .insert(entry.info_hash.clone(), entry);
    }

    /// Seed a provider watermark.
    pub fn set_watermark(&self, watermark: ProviderWatermark) {
        self.providers
            .write()
            .unwrap()
            .insert(watermark.name.clone(), watermark);
    }

    /// Set the IMDb ids returned for an entry.
    pub fn set_imdb_ids(&self, info_hash: &str, ids: Vec<&str>) {
        self.imdb_ids.write().unwrap().insert(
            info_hash.to_string(),
            ids.into_iter().map(String::from).collect(),
        );
    }

    /// Make identifier lookups fail.
    pub fn fail_identifiers(&self, message: &str) {
        *self.identifier_error.write().unwrap() = Some(message.to_string());
    }

    /// Make watermark saves fail.
    pub fn fail_saves(&self, message: &str) {
        *self.save_error.write().unwrap() = Some(message.to_string());
    }

    /// Make `create` report a conflict for this hash without storing anything.
    pub fn force_duplicate(&self, info_hash: &str) {
        self.forced_duplicates
            .write()
            .unwrap()
            .insert(info_hash.to_string());
    }

    /// Make `lookup` panic for this hash.
    pub fn panic_on_lookup(&self, info_hash: &str) {
        self.panic_lookups
            .write()
            .unwrap()
            .insert(info_hash.to_string());
    }

    /// Get a stored entry by info hash.
    pub fn entry(&self, info_hash: &str) -> Option<TorrentEntry> {
        self.entries.read().unwrap().get(info_hash).cloned()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successful inserts through `create`.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Successful watermark saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Seeder refreshes applied, in call order.
    pub fn refresh_calls(&self) -> Vec<(String, u32)> {
        self.refreshes.read().unwrap().clone()
    }

    /// Stored watermark, without creating one.
    pub fn stored_watermark(&self, name: &str) -> Option<ProviderWatermark> {
        self.providers.read().unwrap().get(name).cloned()
    }

    fn touch(&self, info_hash: &str) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) as u64;
        self.updated
            .write()
            .unwrap()
            .insert(info_hash.to_string(), seq);
    }
}

impl TorrentStore for MockCatalog {
    fn get_provider(&self, name: &str) -> Result<ProviderWatermark, CatalogError> {
        let mut providers = self.providers.write().unwrap();
        Ok(providers
            .entry(name.to_string())
            .or_insert_with(|| ProviderWatermark::new(name))
            .clone())
    }

    fn save_provider(&self, watermark: &ProviderWatermark) -> Result<(), CatalogError> {
        if let Some(message) = self.save_error.read().unwrap().clone() {
            return Err(CatalogError::Database(message));
        }
        self.providers
            .write()
            .unwrap()
            .insert(watermark.name.clone(), watermark.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn lookup(&self, key: &TorrentKey) -> Result<Option<TorrentEntry>, CatalogError> {
        if let TorrentKey::InfoHash(hash) = key {
            if self.panic_lookups.read().unwrap().contains(hash) {
                panic!("mock lookup panicked for {}", hash);
            }
        }

        let entries = self.entries.read().unwrap();
        let found = match key {
            TorrentKey::InfoHash(hash) => entries.get(hash).cloned(),
            TorrentKey::ProviderId {
                provider,
                torrent_id,
            } => entries
                .values()
                .find(|e| &e.provider == provider && &e.torrent_id == torrent_id)
                .cloned(),
        };
        Ok(found)
    }

    fn create(&self, entry: &TorrentEntry) -> Result<bool, CatalogError> {
        if self
            .forced_duplicates
            .read()
            .unwrap()
            .contains(&entry.info_hash)
        {
            return Ok(false);
        }

        {
            let mut entries = self.entries.write().unwrap();
            if entries.contains_key(&entry.info_hash) {
                return Ok(false);
            }
            entries.insert(entry.info_hash.clone(), entry.clone());
        }
        self.touch(&entry.info_hash);
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn refresh_seeders(&self, info_hash: &str, seeders: u32) -> Result<(), CatalogError> {
        {
            let mut entries = self.entries.write().unwrap();
            let entry = entries
                .get_mut(info_hash)
                .ok_or_else(|| CatalogError::NotFound(info_hash.to_string()))?;
            entry.seeders = seeders;
        }
        self.touch(info_hash);
        self.refreshes
            .write()
            .unwrap()
            .push((info_hash.to_string(), seeders));
        Ok(())
    }

    fn least_recently_updated(
        &self,
        provider: &str,
        limit: u32,
    ) -> Result<Vec<TorrentEntry>, CatalogError> {
        let entries = self.entries.read().unwrap();
        let updated = self.updated.read().unwrap();

        let mut matching: Vec<&TorrentEntry> =
            entries.values().filter(|e| e.provider == provider).collect();
        matching.sort_by_key(|e| updated.get(&e.info_hash).copied().unwrap_or(0));

        Ok(matching
            .into_iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let entries = self.entries.read().unwrap();
        Ok(CatalogStats {
            total_torrents: entries.len() as u64,
            total_size_bytes: entries.values().map(|e| e.size).sum(),
            providers: self.providers.read().unwrap().len() as u32,
        })
    }
}

impl IdentifierProvider for MockCatalog {
    fn imdb_ids(&self, entry: &TorrentEntry) -> Result<Vec<String>, CatalogError> {
        if let Some(message) = self.identifier_error.read().unwrap().clone() {
            return Err(CatalogError::Database(message));
        }
        if let Some(ids) = self.imdb_ids.read().unwrap().get(&entry.info_hash) {
            return Ok(ids.clone());
        }
        Ok(entry.imdb_id.iter().cloned().collect())
    }
}
