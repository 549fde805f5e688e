//! Navigation history for the secondary pane.
//!
//! Bounded, most-recent-first, keyed by normalized URL and persisted as
//! JSON under a single key of a [`KeyValueStore`]. Data that fails to parse
//! loads as an empty history.

use crate::base::syncerror::SyncError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use time::OffsetDateTime;
use url::Url;

/// Local persistent key-value storage provided by the host.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SyncError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: DashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// All keys in one pretty-printed JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SyncError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| SyncError::storage_failed(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| SyncError::storage_failed(e.to_string()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // A corrupt file is replaced rather than blocking every write.
        let mut all = self.read_all().unwrap_or_default();
        all.insert(key.to_string(), value.to_string());

        let json =
            serde_json::to_string_pretty(&all).map_err(|e| SyncError::storage_failed(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| SyncError::storage_failed(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    /// Unix milliseconds of the most recent visit.
    pub timestamp: i64,
}

pub struct NavigationHistory {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl NavigationHistory {
    pub const STORAGE_KEY: &'static str = "split-screen-history";
    pub const DEFAULT_CAPACITY: usize = 20;

    /// Load from `store`. Missing, unreadable or corrupt data gives an empty history.
    pub fn load(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        let mut entries = match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => serde_json::from_str::<Vec<HistoryEntry>>(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding corrupt navigation history");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "navigation history unavailable");
                Vec::new()
            }
        };
        entries.truncate(capacity);

        Self {
            store,
            entries,
            capacity,
        }
    }

    /// Move `url` to the front, evicting past capacity, and persist.
    ///
    /// The in-memory history is updated even when persisting fails.
    pub fn record(&mut self, url: &Url, title: Option<&str>) -> Result<(), SyncError> {
        let key = url.as_str();
        self.entries.retain(|e| e.url != key);
        self.entries.insert(
            0,
            HistoryEntry {
                url: key.to_string(),
                title: title.unwrap_or(key).to_string(),
                timestamp: now_millis(),
            },
        );
        self.entries.truncate(self.capacity);
        self.save()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The `n` most recent entries.
    pub fn recent(&self, n: usize) -> &[HistoryEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> Result<(), SyncError> {
        self.entries.clear();
        self.save()
    }

    fn save(&self) -> Result<(), SyncError> {
        let json = serde_json::to_string(&self.entries)
            .map_err(|e| SyncError::storage_failed(e.to_string()))?;
        self.store.set(Self::STORAGE_KEY, &json)
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
