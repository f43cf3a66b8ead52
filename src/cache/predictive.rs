//! Predictive Access Tracker
//!
//! Tracks write frequency per key-prefix pattern. The signal is advisory:
//! it is exposed for inspection and decayed during maintenance, but does not
//! drive prefetching.

use std::collections::HashMap;

// == Constants ==
/// Delimiter separating a key's pattern prefix from its remainder.
const PATTERN_DELIMITER: char = ':';
/// Multiplicative decay applied to every score each maintenance pass.
const DECAY_FACTOR: f64 = 0.9;
/// Scores at or below this value are dropped during decay.
const SCORE_FLOOR: f64 = 1.0;

// == Predictive Tracker ==
/// Running per-pattern write scores.
#[derive(Debug, Default)]
pub struct PredictiveTracker {
    scores: HashMap<String, f64>,
}

impl PredictiveTracker {
    // == Constructor ==
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record ==
    /// Records one write against the key's pattern.
    ///
    /// The pattern is the prefix up to the first `:`; a key without a
    /// delimiter contributes its whole key as its own pattern.
    pub fn record(&mut self, key: &str) {
        let pattern = key.split(PATTERN_DELIMITER).next().unwrap_or(key);
        *self.scores.entry(pattern.to_string()).or_insert(0.0) += 1.0;
    }

    // == Decay ==
    /// Decays every score by the fixed factor, dropping scores that fall to
    /// or below the floor. Returns how many patterns were dropped.
    pub fn decay(&mut self) -> usize {
        let before = self.scores.len();
        self.scores.retain(|_, score| {
            *score *= DECAY_FACTOR;
            *score > SCORE_FLOOR
        });
        before - self.scores.len()
    }

    // == Introspection ==
    /// Returns a snapshot of the tracked pattern scores.
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.scores.clone()
    }

    /// Number of tracked patterns.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether no patterns are tracked.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    // == Clear ==
    /// Drops all tracked patterns.
    pub fn clear(&mut self) {
        self.scores.clear();
    }
}
