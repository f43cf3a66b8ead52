//! Cache Statistics Module
//!
//! Tracks cache performance metrics: overall and per-tier hit/miss counts,
//! eviction and compression counters, disk I/O counters, and bounded rolling
//! samples for access latency and compression ratio.

use std::collections::VecDeque;

use serde::Serialize;

// == Rolling Window ==
/// Bounded sample buffer; once full, the oldest sample is dropped.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// Creates an empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, sample: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Mean of the retained samples, 0.0 when empty.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().sum::<f64>() / self.samples.len() as f64
        }
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// == Cache Stats ==
/// Cumulative cache performance counters.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Successful retrievals across all tiers
    pub hits: u64,
    /// Retrievals that found the key in no tier
    pub misses: u64,
    pub fast_hits: u64,
    pub fast_misses: u64,
    pub compressed_hits: u64,
    pub compressed_misses: u64,
    pub disk_hits: u64,
    pub disk_misses: u64,
    /// Entries demoted or dropped by capacity enforcement
    pub evictions: u64,
    pub compressions: u64,
    pub decompressions: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
    /// Recent access latencies in milliseconds
    access_latency_ms: RollingWindow,
    /// Recent original/compressed size ratios
    compression_ratio: RollingWindow,
    /// Sample capacity used by both windows
    window: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates stats with all counters at zero and the given sample window.
    pub fn new(window: usize) -> Self {
        Self {
            hits: 0,
            misses: 0,
            fast_hits: 0,
            fast_misses: 0,
            compressed_hits: 0,
            compressed_misses: 0,
            disk_hits: 0,
            disk_misses: 0,
            evictions: 0,
            compressions: 0,
            decompressions: 0,
            disk_reads: 0,
            disk_writes: 0,
            access_latency_ms: RollingWindow::new(window),
            compression_ratio: RollingWindow::new(window),
            window,
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no accesses have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Samples ==
    /// Records one access latency sample in milliseconds.
    pub fn record_latency(&mut self, latency_ms: f64) {
        self.access_latency_ms.push(latency_ms);
    }

    /// Records one original/compressed size ratio sample.
    pub fn record_compression_ratio(&mut self, ratio: f64) {
        self.compression_ratio.push(ratio);
    }

    // == Reset ==
    /// Zeroes every counter and empties both sample windows.
    pub fn reset(&mut self) {
        *self = Self::new(self.window);
    }

    // == Snapshot ==
    /// Produces a serializable snapshot with derived values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits,
            misses: self.misses,
            fast_hits: self.fast_hits,
            fast_misses: self.fast_misses,
            compressed_hits: self.compressed_hits,
            compressed_misses: self.compressed_misses,
            disk_hits: self.disk_hits,
            disk_misses: self.disk_misses,
            evictions: self.evictions,
            compressions: self.compressions,
            decompressions: self.decompressions,
            disk_reads: self.disk_reads,
            disk_writes: self.disk_writes,
            hit_rate: self.hit_rate(),
            avg_access_latency_ms: self.access_latency_ms.mean(),
            avg_compression_ratio: self.compression_ratio.mean(),
            captured_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time view of the cache counters with derived rates.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub fast_hits: u64,
    pub fast_misses: u64,
    pub compressed_hits: u64,
    pub compressed_misses: u64,
    pub disk_hits: u64,
    pub disk_misses: u64,
    pub evictions: u64,
    pub compressions: u64,
    pub decompressions: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
    /// hits / (hits + misses), 0.0 when no accesses yet
    pub hit_rate: f64,
    /// Mean latency over the recent-access window, in milliseconds
    pub avg_access_latency_ms: f64,
    /// Mean original/compressed ratio over the recent-compression window
    pub avg_compression_ratio: f64,
    /// RFC 3339 timestamp of when this snapshot was taken
    pub captured_at: String,
}
