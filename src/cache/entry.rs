//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support,
//! tier residency, and eviction-policy bookkeeping.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Priority ==
/// Eviction priority of a cache entry.
///
/// `High` and `Critical` entries are pinned: they are never selected as
/// eviction victims, even when their tier is over capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    /// Whether this priority exempts an entry from victim selection.
    pub fn is_pinned(&self) -> bool {
        matches!(self, Priority::High | Priority::Critical)
    }
}

// == Tier ==
/// Storage location of a cache entry, ordered fast to slow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Fast,
    Compressed,
    Disk,
}

// == Payload ==
/// The held form of a cached value.
///
/// An entry holds either the raw value or its compressed serialized form,
/// never both. Entries demoted below the compression threshold stay `Raw`
/// even while resident in the compressed tier.
#[derive(Debug, Clone)]
pub enum Payload {
    /// The value as stored by the caller
    Raw(serde_json::Value),
    /// Gzip-compressed serialized form of the value
    Compressed(Vec<u8>),
}

// == Cache Entry ==
/// Represents a single cache entry with payload and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Key identifying this entry, unique across all tiers
    pub key: String,
    /// The stored value, raw or compressed
    pub payload: Payload,
    /// Byte length of the serialized value, computed once at insertion
    pub size: usize,
    /// Eviction priority
    pub priority: Priority,
    /// Creation timestamp (Unix milliseconds)
    pub created: u64,
    /// Timestamp of the most recent read (Unix milliseconds)
    pub accessed: u64,
    /// Access counter, reset to 1 on (re)insertion
    pub hits: u64,
    /// TTL in milliseconds from `created`, None = never expires
    pub ttl_ms: Option<u64>,
    /// Current tier residency
    pub tier: Tier,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry holding a raw value, resident in the fast tier.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `value` - The value in its JSON form
    /// * `size` - Byte length of the value's serialized form
    /// * `priority` - Eviction priority
    /// * `ttl_ms` - Optional TTL in milliseconds
    pub fn new(
        key: String,
        value: serde_json::Value,
        size: usize,
        priority: Priority,
        ttl_ms: Option<u64>,
    ) -> Self {
        let now = current_timestamp_ms();
        Self {
            key,
            payload: Payload::Raw(value),
            size,
            priority,
            created: now,
            accessed: now,
            hits: 1,
            ttl_ms,
            tier: Tier::Fast,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once strictly more than its TTL has elapsed since
    /// creation; an entry checked at exactly its TTL boundary is still live.
    ///
    /// # Returns
    /// - `true` if the entry has a TTL and `now - created > ttl`
    /// - `false` if the entry has no TTL (never expires) or TTL hasn't elapsed
    pub fn is_expired(&self) -> bool {
        match self.ttl_ms {
            Some(ttl) => current_timestamp_ms().saturating_sub(self.created) > ttl,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.ttl_ms.map(|ttl| {
            let elapsed = current_timestamp_ms().saturating_sub(self.created);
            ttl.saturating_sub(elapsed)
        })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
