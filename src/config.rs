//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::EvictionPolicy;

/// Cache engine configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the fast in-memory tier
    pub fast_capacity: usize,
    /// Maximum number of entries in the compressed in-memory tier
    pub compressed_capacity: usize,
    /// Maximum number of entries indexed in the disk tier
    pub disk_capacity: usize,
    /// Base directory for disk-tier record files
    pub disk_dir: PathBuf,
    /// Minimum serialized size in bytes before a demoted value is compressed
    pub compression_threshold: usize,
    /// Victim-selection policy for the in-memory tiers
    pub eviction_policy: EvictionPolicy,
    /// Default TTL in milliseconds for entries without explicit TTL (None = never expire)
    pub default_ttl_ms: Option<u64>,
    /// Whether demotions past the compressed tier persist to disk
    pub disk_enabled: bool,
    /// Whether demoted values above the threshold are compressed
    pub compression_enabled: bool,
    /// Background maintenance sweep interval in milliseconds
    pub maintenance_interval_ms: u64,
    /// Number of recent samples kept for latency and compression-ratio stats
    pub stats_window: usize,
    /// Whether key-prefix access patterns are tracked on `set`
    pub predictive_enabled: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_FAST_CAPACITY` - Fast-tier entry limit (default: 100)
    /// - `CACHE_COMPRESSED_CAPACITY` - Compressed-tier entry limit (default: 500)
    /// - `CACHE_DISK_CAPACITY` - Disk-tier entry limit (default: 1000)
    /// - `CACHE_DIR` - Disk-tier directory (default: "cache_data")
    /// - `CACHE_COMPRESSION_THRESHOLD` - Compression threshold in bytes (default: 1024)
    /// - `CACHE_EVICTION_POLICY` - "lru" or "lfu"; unknown values fall back to LRU
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: unset, never expire)
    /// - `CACHE_DISK_ENABLED` - Enable disk persistence (default: true)
    /// - `CACHE_COMPRESSION_ENABLED` - Enable compression (default: true)
    /// - `CACHE_MAINTENANCE_INTERVAL_MS` - Sweep interval (default: 60000)
    /// - `CACHE_STATS_WINDOW` - Rolling stats sample count (default: 100)
    /// - `CACHE_PREDICTIVE_ENABLED` - Enable access-pattern tracking (default: true)
    pub fn from_env() -> Self {
        Self {
            fast_capacity: env::var("CACHE_FAST_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            compressed_capacity: env::var("CACHE_COMPRESSED_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            disk_capacity: env::var("CACHE_DISK_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            disk_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("cache_data")),
            compression_threshold: env::var("CACHE_COMPRESSION_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            eviction_policy: env::var("CACHE_EVICTION_POLICY")
                .map(|v| EvictionPolicy::parse(&v))
                .unwrap_or_default(),
            default_ttl_ms: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
            disk_enabled: env::var("CACHE_DISK_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            compression_enabled: env::var("CACHE_COMPRESSION_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            maintenance_interval_ms: env::var("CACHE_MAINTENANCE_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60_000),
            stats_window: env::var("CACHE_STATS_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            predictive_enabled: env::var("CACHE_PREDICTIVE_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fast_capacity: 100,
            compressed_capacity: 500,
            disk_capacity: 1000,
            disk_dir: PathBuf::from("cache_data"),
            compression_threshold: 1024,
            eviction_policy: EvictionPolicy::default(),
            default_ttl_ms: None,
            disk_enabled: true,
            compression_enabled: true,
            maintenance_interval_ms: 60_000,
            stats_window: 100,
            predictive_enabled: true,
        }
    }
}
