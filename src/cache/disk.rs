//! Disk Persistence Adapter
//!
//! Durable storage for demoted cache entries: one JSON record file per key,
//! named by the SHA-256 hex digest of the cache key, under a configured base
//! directory. The index keeps plain registration order, so disk-tier
//! eviction is FIFO rather than policy-driven.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::Priority;
use crate::error::{CacheError, Result};

// == Disk Record ==
/// Serialized form of an entry while resident on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskRecord {
    /// The original cache key
    pub key: String,
    /// Serialized value bytes, compressed when `compressed` is set
    pub payload: Vec<u8>,
    /// Eviction priority carried across the demotion
    pub priority: Priority,
    /// Creation timestamp (Unix milliseconds)
    pub created: u64,
    /// TTL in milliseconds from `created`, None = never expires
    pub ttl_ms: Option<u64>,
    /// Whether `payload` holds gzip-compressed bytes
    pub compressed: bool,
}

impl DiskRecord {
    /// Checks if the persisted entry has outlived its TTL.
    pub fn is_expired(&self) -> bool {
        match self.ttl_ms {
            Some(ttl) => current_timestamp_ms().saturating_sub(self.created) > ttl,
            None => false,
        }
    }
}

// == Disk Store ==
/// File-per-entry persistence with a FIFO-ordered in-memory index.
#[derive(Debug)]
pub struct DiskStore {
    /// Base directory holding the record files
    dir: PathBuf,
    /// Key to record-file path mapping
    index: HashMap<String, PathBuf>,
    /// Keys in registration order (front = oldest)
    order: VecDeque<String>,
}

impl DiskStore {
    // == Open ==
    /// Creates the backing directory (parents included) and an empty index.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        debug!("Disk cache directory ready at {:?}", dir);
        Ok(Self {
            dir,
            index: HashMap::new(),
            order: VecDeque::new(),
        })
    }

    /// Derives the record path for a key from its SHA-256 digest.
    fn record_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    // == Write ==
    /// Persists a record and registers it in the index.
    ///
    /// Re-writing an already-registered key keeps its original position in
    /// the FIFO order.
    pub async fn write(&mut self, record: &DiskRecord) -> Result<()> {
        let path = self.record_path(&record.key);
        let bytes = serde_json::to_vec(record)?;
        fs::write(&path, bytes).await?;

        if !self.index.contains_key(&record.key) {
            self.order.push_back(record.key.clone());
        }
        self.index.insert(record.key.clone(), path);
        Ok(())
    }

    // == Read ==
    /// Loads and deserializes the record for `key`.
    pub async fn read(&self, key: &str) -> Result<DiskRecord> {
        let path = self.index.get(key).ok_or_else(|| {
            CacheError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no disk record registered for key '{key}'"),
            ))
        })?;
        let bytes = fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // == Remove ==
    /// Drops the index slot for `key` and deletes its backing file.
    ///
    /// File deletion is best effort; a missing or locked file still clears
    /// the index slot. Returns whether the key was registered.
    pub async fn remove(&mut self, key: &str) -> bool {
        match self.index.remove(key) {
            Some(path) => {
                self.order.retain(|k| k != key);
                if let Err(e) = fs::remove_file(&path).await {
                    warn!("Failed to delete cache file {:?}: {}", path, e);
                }
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Removes the oldest-registered entry (FIFO), returning its key.
    pub async fn evict_oldest(&mut self) -> Option<String> {
        let key = self.order.front().cloned()?;
        self.remove(&key).await;
        Some(key)
    }

    // == Introspection ==
    /// Checks whether `key` is registered in the index.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns a snapshot of all registered keys, in registration order.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    // == Clear ==
    /// Drops every index entry and deletes all backing files.
    pub async fn clear(&mut self) {
        for (_, path) in self.index.drain() {
            if let Err(e) = fs::remove_file(&path).await {
                debug!("Failed to delete cache file {:?}: {}", path, e);
            }
        }
        self.order.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(key: &str, payload: &[u8]) -> DiskRecord {
        DiskRecord {
            key: key.to_string(),
            payload: payload.to_vec(),
            priority: Priority::Normal,
            created: current_timestamp_ms(),
            ttl_ms: None,
            compressed: false,
        }
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("cache");

        let store = DiskStore::open(&dir).await.unwrap();

        assert!(dir.is_dir());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut store = DiskStore::open(tmp.path()).await.unwrap();

        store.write(&record("key1", b"payload")).await.unwrap();

        let loaded = store.read("key1").await.unwrap();
        assert_eq!(loaded.key, "key1");
        assert_eq!(loaded.payload, b"payload");
        assert!(!loaded.compressed);
    }

    #[tokio::test]
    async fn test_read_unregistered_key_fails() {
        let tmp = TempDir::new().unwrap();
        let store = DiskStore::open(tmp.path()).await.unwrap();

        assert!(matches!(store.read("missing").await, Err(CacheError::Io(_))));
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let tmp = TempDir::new().unwrap();
        let mut store = DiskStore::open(tmp.path()).await.unwrap();

        store.write(&record("key1", b"payload")).await.unwrap();
        let path = store.record_path("key1");
        assert!(path.exists());

        assert!(store.remove("key1").await);
        assert!(!path.exists());
        assert!(!store.contains("key1"));
        assert!(!store.remove("key1").await);
    }

    #[tokio::test]
    async fn test_evict_oldest_is_fifo() {
        let tmp = TempDir::new().unwrap();
        let mut store = DiskStore::open(tmp.path()).await.unwrap();

        store.write(&record("first", b"1")).await.unwrap();
        store.write(&record("second", b"2")).await.unwrap();
        store.write(&record("third", b"3")).await.unwrap();

        assert_eq!(store.evict_oldest().await, Some("first".to_string()));
        assert_eq!(store.evict_oldest().await, Some("second".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_rewrite_keeps_fifo_position() {
        let tmp = TempDir::new().unwrap();
        let mut store = DiskStore::open(tmp.path()).await.unwrap();

        store.write(&record("first", b"1")).await.unwrap();
        store.write(&record("second", b"2")).await.unwrap();
        store.write(&record("first", b"updated")).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.evict_oldest().await, Some("first".to_string()));
    }

    #[tokio::test]
    async fn test_clear_removes_all_files() {
        let tmp = TempDir::new().unwrap();
        let mut store = DiskStore::open(tmp.path()).await.unwrap();

        store.write(&record("a", b"1")).await.unwrap();
        store.write(&record("b", b"2")).await.unwrap();

        store.clear().await;

        assert!(store.is_empty());
        let remaining: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_record_expiry() {
        let mut rec = record("key", b"payload");
        assert!(!rec.is_expired());

        rec.ttl_ms = Some(10);
        rec.created = current_timestamp_ms().saturating_sub(100);
        assert!(rec.is_expired());
    }

    #[test]
    fn test_distinct_keys_get_distinct_paths() {
        let store = DiskStore {
            dir: PathBuf::from("/tmp/cache"),
            index: HashMap::new(),
            order: VecDeque::new(),
        };

        assert_ne!(store.record_path("a"), store.record_path("b"));
        assert_eq!(store.record_path("a"), store.record_path("a"));
    }
}
