//! Tiercache - a multi-tier object cache
//!
//! Stores arbitrary serializable values behind string keys across three
//! local tiers: fast in-memory, compressed in-memory, and on-disk. Hot data
//! is promoted toward fast storage on access; cold data is demoted toward
//! slower, space-efficient storage when tiers fill; expired data is swept by
//! a periodic maintenance task.
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tiercache::{CacheConfig, TieredCache, spawn_maintenance_task};
//!
//! let config = CacheConfig::from_env();
//! let interval = config.maintenance_interval_ms;
//! let cache = Arc::new(TieredCache::new(config).await);
//! let maintenance = spawn_maintenance_task(cache.clone(), interval);
//!
//! cache.set("user:42", &"profile data").await?;
//! let value: Option<String> = cache.get("user:42").await;
//!
//! maintenance.shutdown().await;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{
    CacheEvent, EvictionPolicy, MaintenanceReport, Priority, StatsSnapshot, Tier, TierSizes,
    TieredCache,
};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{spawn_maintenance_task, MaintenanceTask};
