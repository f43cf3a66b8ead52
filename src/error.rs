//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.
//!
//! No variant here is fatal to the owning process: read-path failures are
//! absorbed as cache misses inside the tier manager, and only `set` surfaces
//! its own serialization failure to the caller.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the tiered cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Value could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Disk tier I/O failure
    #[error("Disk I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Compression or decompression failure
    #[error("Compression error: {0}")]
    Compression(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
