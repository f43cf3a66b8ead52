//! Eviction Policy Module
//!
//! Victim-selection logic for the in-memory tiers. Policies are a tagged
//! variant dispatched through one interface, so the engine can swap
//! strategies at startup without trait objects.

use tracing::warn;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::CacheEntry;

// == Eviction Policy ==
/// Victim-selection strategy for a cache tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Least Recently Used: evict the entry with the oldest access timestamp
    #[default]
    Lru,
    /// Least Frequently Used: evict the entry with the fewest hits
    Lfu,
}

impl EvictionPolicy {
    // == Parse ==
    /// Resolves a policy identifier, falling back to LRU for unknown names.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "lru" => Self::Lru,
            "lfu" => Self::Lfu,
            other => {
                warn!("Unknown eviction policy '{}', falling back to LRU", other);
                Self::Lru
            }
        }
    }

    // == On Insert ==
    /// Initializes policy bookkeeping for a newly (re)inserted entry.
    ///
    /// The hit count restarts at 1 so LFU accounting treats a rewritten key
    /// as fresh, and the access timestamp is stamped for LRU.
    pub fn on_insert(&self, entry: &mut CacheEntry) {
        entry.hits = 1;
        entry.accessed = current_timestamp_ms();
    }

    // == On Access ==
    /// Updates policy bookkeeping on every hit.
    pub fn on_access(&self, entry: &mut CacheEntry) {
        entry.hits += 1;
        entry.accessed = current_timestamp_ms();
    }

    // == Select Victim ==
    /// Scans a tier's entries and returns the key to evict.
    ///
    /// Pinned entries (HIGH/CRITICAL priority) are never candidates. Ties are
    /// broken by the first entry encountered, so callers must iterate in the
    /// tier's stable insertion order.
    ///
    /// # Returns
    /// `None` when every entry is pinned, in which case the tier is allowed
    /// to exceed its nominal capacity.
    pub fn select_victim<'a, I>(&self, entries: I) -> Option<String>
    where
        I: Iterator<Item = &'a CacheEntry>,
    {
        let mut victim: Option<(&'a str, u64)> = None;

        for entry in entries {
            if entry.priority.is_pinned() {
                continue;
            }
            let score = match self {
                Self::Lru => entry.accessed,
                Self::Lfu => entry.hits,
            };
            match victim {
                Some((_, best)) if score >= best => {}
                _ => victim = Some((entry.key.as_str(), score)),
            }
        }

        victim.map(|(key, _)| key.to_string())
    }
}
