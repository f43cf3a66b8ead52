//! Tier Manager Module
//!
//! Orchestrates the three cache tiers: fast in-memory, compressed in-memory,
//! and on-disk. Implements get/set/delete/clear, promotion on hit, demotion
//! on tier overflow, the maintenance sweep, and statistics aggregation.
//!
//! All tier bookkeeping lives behind a single async mutex, so every
//! promotion/demotion sequence and capacity-enforcement loop is atomic with
//! respect to concurrent callers.

use std::collections::HashMap;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::cache::codec;
use crate::cache::disk::{DiskRecord, DiskStore};
use crate::cache::{
    CacheEntry, CacheEvent, CacheStats, EventBus, EvictionPolicy, Payload, PredictiveTracker,
    Priority, StatsSnapshot, Tier, TierShelf,
};
use crate::config::CacheConfig;
use crate::error::Result;

// == Tier Sizes ==
/// Entry counts per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierSizes {
    pub fast: usize,
    pub compressed: usize,
    pub disk_indexed: usize,
}

// == Maintenance Report ==
/// Summary of one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Expired entries swept from the fast tier
    pub expired_fast: usize,
    /// Expired entries swept from the compressed tier
    pub expired_compressed: usize,
    /// Disk records dropped because they expired or failed to load
    pub disk_dropped: usize,
    /// Predictive patterns whose decayed score fell below the floor
    pub patterns_dropped: usize,
}

impl MaintenanceReport {
    /// Total cache entries removed by the pass (patterns excluded).
    pub fn total_removed(&self) -> usize {
        self.expired_fast + self.expired_compressed + self.disk_dropped
    }
}

// == Cache State ==
/// All mutable tier bookkeeping, owned by one lock.
struct CacheState {
    /// Fast in-memory tier
    fast: TierShelf,
    /// Compressed in-memory tier
    compressed: TierShelf,
    /// Disk tier, None when persistence is disabled or directory init failed
    disk: Option<DiskStore>,
    /// Cumulative performance counters
    stats: CacheStats,
    /// Key-prefix write scores
    predictive: PredictiveTracker,
}

// == Tiered Cache ==
/// Multi-tier object cache storing serializable values behind string keys.
///
/// Entries enter the fast tier on `set`, demote toward the compressed and
/// disk tiers under capacity pressure, and promote back to the fast tier on
/// hits in a colder tier. Shared as `Arc<TieredCache>` between callers and
/// the maintenance task.
pub struct TieredCache {
    /// Tier bookkeeping, serialized behind a single lock
    state: Mutex<CacheState>,
    /// Single-flight guard for maintenance passes
    sweep_guard: Mutex<()>,
    /// Observability notifications
    events: EventBus,
    /// Victim-selection policy for the in-memory tiers
    policy: EvictionPolicy,
    config: CacheConfig,
}

impl TieredCache {
    // == Constructor ==
    /// Builds a cache from the given configuration.
    ///
    /// If the disk directory cannot be created, disk persistence is disabled
    /// for the session and demotions past the compressed tier become plain
    /// evictions; the cache degrades to smaller effective capacity instead
    /// of failing.
    pub async fn new(config: CacheConfig) -> Self {
        let disk = if config.disk_enabled {
            match DiskStore::open(&config.disk_dir).await {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!(
                        "Disk cache directory init failed, disk tier disabled: {}",
                        e
                    );
                    None
                }
            }
        } else {
            None
        };

        Self {
            state: Mutex::new(CacheState {
                fast: TierShelf::new(),
                compressed: TierShelf::new(),
                disk,
                stats: CacheStats::new(config.stats_window),
                predictive: PredictiveTracker::new(),
            }),
            sweep_guard: Mutex::new(()),
            events: EventBus::new(),
            policy: config.eviction_policy,
            config,
        }
    }

    // == Get ==
    /// Retrieves a value by key, checking fast, then compressed, then disk.
    ///
    /// A hit in a colder tier promotes the entry back to the fast tier.
    /// Expired entries are removed and reported as misses. Disk I/O,
    /// deserialization, and decompression failures are absorbed as misses
    /// with the offending entry dropped.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let started = Instant::now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let found = self.lookup(state, key).await;
        state
            .stats
            .record_latency(started.elapsed().as_secs_f64() * 1000.0);

        match found {
            Some((value, tier)) => match serde_json::from_value::<T>(value) {
                Ok(typed) => {
                    state.stats.hits += 1;
                    self.events.emit(CacheEvent::Hit {
                        key: key.to_string(),
                        tier,
                    });
                    Some(typed)
                }
                Err(e) => {
                    // The lookup landed the entry in the fast tier; drop it
                    warn!("Cached value for '{}' failed to deserialize: {}", key, e);
                    state.fast.remove(key);
                    state.stats.misses += 1;
                    self.events.emit(CacheEvent::Miss {
                        key: key.to_string(),
                    });
                    None
                }
            },
            None => {
                state.stats.misses += 1;
                self.events.emit(CacheEvent::Miss {
                    key: key.to_string(),
                });
                None
            }
        }
    }

    /// Walks the tiers for `key`, promoting colder-tier hits into the fast
    /// tier. Returns the value and the tier that served it.
    async fn lookup(
        &self,
        state: &mut CacheState,
        key: &str,
    ) -> Option<(serde_json::Value, Tier)> {
        // Fast tier
        if state.fast.contains(key) {
            let expired = state.fast.get(key).map(|e| e.is_expired()).unwrap_or(false);
            if expired {
                state.fast.remove(key);
                state.stats.fast_misses += 1;
                debug!("Fast-tier entry '{}' expired on access", key);
                return None;
            }
            if let Some(entry) = state.fast.get_mut(key) {
                self.policy.on_access(entry);
                if let Payload::Raw(value) = &entry.payload {
                    state.stats.fast_hits += 1;
                    return Some((value.clone(), Tier::Fast));
                }
            }
            // A compressed payload never belongs in the fast tier; drop it
            state.fast.remove(key);
            state.stats.fast_misses += 1;
            return None;
        }
        state.stats.fast_misses += 1;

        // Compressed tier
        if let Some(mut entry) = state.compressed.remove(key) {
            if entry.is_expired() {
                state.stats.compressed_misses += 1;
                debug!("Compressed-tier entry '{}' expired on access", key);
                return None;
            }

            let mut was_compressed = false;
            let value = match &entry.payload {
                Payload::Raw(value) => Some(value.clone()),
                Payload::Compressed(bytes) => {
                    was_compressed = true;
                    match codec::decompress(bytes)
                        .and_then(|raw| serde_json::from_slice(&raw).map_err(Into::into))
                    {
                        Ok(value) => Some(value),
                        Err(e) => {
                            warn!("Dropping corrupt compressed entry '{}': {}", key, e);
                            None
                        }
                    }
                }
            };

            let Some(value) = value else {
                state.stats.compressed_misses += 1;
                return None;
            };
            if was_compressed {
                state.stats.decompressions += 1;
            }
            state.stats.compressed_hits += 1;

            // Promote: discard the compressed payload, re-enter the fast tier
            entry.payload = Payload::Raw(value.clone());
            entry.tier = Tier::Fast;
            self.policy.on_access(&mut entry);
            state.fast.insert(key.to_string(), entry);
            self.enforce_fast(state).await;

            return Some((value, Tier::Compressed));
        }
        state.stats.compressed_misses += 1;

        // Disk tier
        if let Some(disk) = state.disk.as_mut() {
            if disk.contains(key) {
                let record = match disk.read(key).await {
                    Ok(record) => record,
                    Err(e) => {
                        warn!("Disk read failed for '{}', treating as miss: {}", key, e);
                        disk.remove(key).await;
                        state.stats.disk_misses += 1;
                        return None;
                    }
                };
                state.stats.disk_reads += 1;

                if record.is_expired() {
                    disk.remove(key).await;
                    state.stats.disk_misses += 1;
                    debug!("Disk-tier entry '{}' expired on access", key);
                    return None;
                }

                let decoded = if record.compressed {
                    codec::decompress(&record.payload).and_then(|raw| {
                        serde_json::from_slice(&raw)
                            .map(|value| (value, raw.len()))
                            .map_err(Into::into)
                    })
                } else {
                    serde_json::from_slice(&record.payload)
                        .map(|value| (value, record.payload.len()))
                        .map_err(Into::into)
                };
                let (value, raw_len): (serde_json::Value, usize) = match decoded {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        warn!("Disk record for '{}' unreadable, dropping: {}", key, e);
                        disk.remove(key).await;
                        state.stats.disk_misses += 1;
                        return None;
                    }
                };
                if record.compressed {
                    state.stats.decompressions += 1;
                }

                // Leaving the disk tier; the fresh entry enters the fast tier
                disk.remove(key).await;
                state.stats.disk_hits += 1;

                let mut entry = CacheEntry::new(
                    record.key,
                    value.clone(),
                    raw_len,
                    record.priority,
                    record.ttl_ms,
                );
                entry.created = record.created;
                self.policy.on_insert(&mut entry);
                state.fast.insert(key.to_string(), entry);
                self.enforce_fast(state).await;

                return Some((value, Tier::Disk));
            }
            state.stats.disk_misses += 1;
        }

        None
    }

    // == Set ==
    /// Stores a value at NORMAL priority with the configured default TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_with(key, value, Priority::Normal, None).await
    }

    /// Stores a value with explicit priority and TTL.
    ///
    /// The entry always enters the fast tier, overwriting any residency the
    /// key had in colder tiers. A serialization failure aborts only this
    /// call, leaving prior tier state intact.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - Any serializable value
    /// * `priority` - Eviction priority; HIGH/CRITICAL pin the entry
    /// * `ttl_ms` - TTL in milliseconds (uses the configured default if None)
    pub async fn set_with<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        priority: Priority,
        ttl_ms: Option<u64>,
    ) -> Result<()> {
        // Serialize before touching tier state, so a failure changes nothing
        let json = serde_json::to_value(value)?;
        let size = serde_json::to_vec(&json)?.len();
        let ttl = ttl_ms.or(self.config.default_ttl_ms);

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        // A key lives in at most one tier; clear colder residency first
        state.compressed.remove(key);
        if let Some(disk) = state.disk.as_mut() {
            disk.remove(key).await;
        }

        let mut entry = CacheEntry::new(key.to_string(), json, size, priority, ttl);
        self.policy.on_insert(&mut entry);
        state.fast.insert(key.to_string(), entry);
        self.enforce_fast(state).await;

        if self.config.predictive_enabled {
            state.predictive.record(key);
        }

        debug!("Stored '{}' ({} bytes, {:?})", key, size, priority);
        Ok(())
    }

    // == Capacity Enforcement ==
    /// Demotes eviction victims until the fast tier is within capacity.
    ///
    /// Stops early if every remaining entry is pinned, letting the tier
    /// exceed its nominal capacity by the pinned count.
    async fn enforce_fast(&self, state: &mut CacheState) {
        while state.fast.len() > self.config.fast_capacity {
            let Some(victim) = self.policy.select_victim(state.fast.iter_ordered()) else {
                debug!("Fast tier over capacity but all entries pinned");
                break;
            };
            if let Some(entry) = state.fast.remove(&victim) {
                state.stats.evictions += 1;
                debug!("Demoting '{}' to compressed tier", victim);
                self.demote_to_compressed(state, entry).await;
            }
        }
    }

    /// Moves an entry into the compressed tier, physically compressing it
    /// when compression is enabled and the entry clears the size threshold.
    async fn demote_to_compressed(&self, state: &mut CacheState, mut entry: CacheEntry) {
        entry.tier = Tier::Compressed;

        if self.config.compression_enabled && entry.size > self.config.compression_threshold {
            if let Payload::Raw(value) = &entry.payload {
                let compressed = serde_json::to_vec(value)
                    .map_err(Into::into)
                    .and_then(|raw| codec::compress(&raw).map(|c| (raw.len(), c)));
                match compressed {
                    Ok((raw_len, bytes)) => {
                        if !bytes.is_empty() {
                            state
                                .stats
                                .record_compression_ratio(raw_len as f64 / bytes.len() as f64);
                        }
                        state.stats.compressions += 1;
                        entry.payload = Payload::Compressed(bytes);
                    }
                    Err(e) => {
                        warn!(
                            "Compression failed for '{}', keeping raw payload: {}",
                            entry.key, e
                        );
                    }
                }
            }
        }

        let key = entry.key.clone();
        state.compressed.insert(key, entry);
        self.enforce_compressed(state).await;
    }

    /// Demotes eviction victims until the compressed tier is within capacity.
    async fn enforce_compressed(&self, state: &mut CacheState) {
        while state.compressed.len() > self.config.compressed_capacity {
            let Some(victim) = self.policy.select_victim(state.compressed.iter_ordered()) else {
                debug!("Compressed tier over capacity but all entries pinned");
                break;
            };
            if let Some(entry) = state.compressed.remove(&victim) {
                state.stats.evictions += 1;
                self.demote_to_disk(state, entry).await;
            }
        }
    }

    /// Persists an entry to the disk tier, or drops it when persistence is
    /// unavailable. Disk write failures are absorbed: the entry is simply
    /// gone, the same as an eviction without persistence.
    async fn demote_to_disk(&self, state: &mut CacheState, entry: CacheEntry) {
        let Some(disk) = state.disk.as_mut() else {
            debug!("Disk tier disabled, dropping '{}'", entry.key);
            return;
        };

        // The record carries the payload in whatever form it already has
        let (payload, compressed) = match &entry.payload {
            Payload::Raw(value) => match serde_json::to_vec(value) {
                Ok(bytes) => (bytes, false),
                Err(e) => {
                    warn!("Cannot serialize '{}' for disk, dropping: {}", entry.key, e);
                    return;
                }
            },
            Payload::Compressed(bytes) => (bytes.clone(), true),
        };
        let record = DiskRecord {
            key: entry.key.clone(),
            payload,
            priority: entry.priority,
            created: entry.created,
            ttl_ms: entry.ttl_ms,
            compressed,
        };

        match disk.write(&record).await {
            Ok(()) => {
                state.stats.disk_writes += 1;
                debug!("Demoted '{}' to disk tier", entry.key);
            }
            Err(e) => {
                warn!("Disk write failed for '{}', entry dropped: {}", entry.key, e);
                return;
            }
        }

        // Disk tier runs plain FIFO, not the configured policy
        while disk.len() > self.config.disk_capacity {
            match disk.evict_oldest().await {
                Some(dropped) => {
                    state.stats.evictions += 1;
                    debug!("Disk tier evicted oldest entry '{}'", dropped);
                }
                None => break,
            }
        }
    }

    // == Delete ==
    /// Removes a key from whichever tier holds it.
    ///
    /// All three tiers are checked defensively, so deletion stays robust
    /// even if bookkeeping ever let a key exist twice. Returns whether
    /// anything was actually removed.
    pub async fn delete(&self, key: &str) -> bool {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let mut removed = state.fast.remove(key).is_some();
        removed |= state.compressed.remove(key).is_some();
        if let Some(disk) = state.disk.as_mut() {
            removed |= disk.remove(key).await;
        }

        if removed {
            self.events.emit(CacheEvent::Deleted {
                key: key.to_string(),
            });
        }
        removed
    }

    // == Clear ==
    /// Empties all three tiers, deletes all backing files, and resets
    /// statistics and predictive scores.
    pub async fn clear(&self) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        state.fast.clear();
        state.compressed.clear();
        if let Some(disk) = state.disk.as_mut() {
            disk.clear().await;
        }
        state.stats.reset();
        state.predictive.clear();

        self.events.emit(CacheEvent::Cleared);
        info!("Cache cleared");
    }

    // == Warm Cache ==
    /// Preloads the keys returned by `key_lister`, fetching each value via
    /// `loader` and inserting it at HIGH priority. A loader failure for one
    /// key is logged and does not abort the remaining warm-up work.
    pub async fn warm_cache<K, L, T>(&self, key_lister: K, loader: L)
    where
        K: FnOnce() -> Vec<String>,
        L: Fn(&str) -> anyhow::Result<T>,
        T: Serialize,
    {
        let keys = key_lister();
        info!("Warming cache with {} keys", keys.len());

        for key in keys {
            match loader(&key) {
                Ok(value) => {
                    if let Err(e) = self.set_with(&key, &value, Priority::High, None).await {
                        warn!("Warm-up insert failed for '{}': {}", key, e);
                    }
                }
                Err(e) => warn!("Warm-up loader failed for '{}': {}", key, e),
            }
        }
    }

    // == Maintenance ==
    /// Runs one maintenance pass: sweeps expired entries from all tiers,
    /// drops unreadable disk records, and decays predictive scores.
    ///
    /// Passes are single-flight; a pass that finds another one in flight
    /// returns an empty report.
    pub async fn run_maintenance(&self) -> MaintenanceReport {
        let Ok(_sweep) = self.sweep_guard.try_lock() else {
            debug!("Maintenance already in flight, skipping");
            return MaintenanceReport::default();
        };

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let mut report = MaintenanceReport::default();

        report.expired_fast = Self::sweep_shelf(&mut state.fast);
        report.expired_compressed = Self::sweep_shelf(&mut state.compressed);

        if let Some(disk) = state.disk.as_mut() {
            for key in disk.keys() {
                let drop_record = match disk.read(&key).await {
                    Ok(record) => record.is_expired(),
                    Err(e) => {
                        warn!("Maintenance cannot load disk record '{}': {}", key, e);
                        true
                    }
                };
                if drop_record {
                    disk.remove(&key).await;
                    report.disk_dropped += 1;
                }
            }
        }

        report.patterns_dropped = state.predictive.decay();

        if report.total_removed() > 0 {
            info!(
                "Maintenance removed {} entries ({} fast, {} compressed, {} disk)",
                report.total_removed(),
                report.expired_fast,
                report.expired_compressed,
                report.disk_dropped
            );
        } else {
            debug!("Maintenance found nothing to remove");
        }
        report
    }

    /// Removes expired entries from one shelf, returning how many.
    fn sweep_shelf(shelf: &mut TierShelf) -> usize {
        let expired: Vec<String> = shelf
            .iter_ordered()
            .filter(|entry| entry.is_expired())
            .map(|entry| entry.key.clone())
            .collect();
        for key in &expired {
            shelf.remove(key);
        }
        expired.len()
    }

    // == Observability ==
    /// Returns a snapshot of the cumulative statistics.
    pub async fn stats(&self) -> StatsSnapshot {
        self.state.lock().await.stats.snapshot()
    }

    /// Returns entry counts per tier.
    pub async fn sizes(&self) -> TierSizes {
        let state = self.state.lock().await;
        TierSizes {
            fast: state.fast.len(),
            compressed: state.compressed.len(),
            disk_indexed: state.disk.as_ref().map(DiskStore::len).unwrap_or(0),
        }
    }

    /// Reports which tier currently holds `key`, without touching any
    /// access bookkeeping.
    pub async fn locate(&self, key: &str) -> Option<Tier> {
        let state = self.state.lock().await;
        if state.fast.contains(key) {
            Some(Tier::Fast)
        } else if state.compressed.contains(key) {
            Some(Tier::Compressed)
        } else if state.disk.as_ref().is_some_and(|d| d.contains(key)) {
            Some(Tier::Disk)
        } else {
            None
        }
    }

    /// Returns a snapshot of the tracked key-prefix access scores.
    pub async fn access_patterns(&self) -> HashMap<String, f64> {
        self.state.lock().await.predictive.snapshot()
    }

    /// Registers a new observer for cache notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// The configured maintenance interval, in milliseconds.
    pub fn maintenance_interval_ms(&self) -> u64 {
        self.config.maintenance_interval_ms
    }
}
