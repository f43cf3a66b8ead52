//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify the engine's core correctness properties:
//! capacity enforcement, single-tier residency, round-trip storage, and
//! statistics accuracy.

use proptest::prelude::*;

use crate::cache::TieredCache;
use crate::config::CacheConfig;

// == Test Configuration ==
const TEST_FAST_CAPACITY: usize = 8;
const TEST_COMPRESSED_CAPACITY: usize = 8;

fn test_config() -> CacheConfig {
    CacheConfig {
        fast_capacity: TEST_FAST_CAPACITY,
        compressed_capacity: TEST_COMPRESSED_CAPACITY,
        disk_enabled: false,
        ..CacheConfig::default()
    }
}

// == Strategies ==
/// Generates valid cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,32}"
}

/// Generates valid cache values
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,128}"
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // For any sequence of operations, the in-memory tier sizes never exceed
    // their configured capacities once the operation settles.
    #[test]
    fn prop_capacity_enforcement(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let cache = TieredCache::new(test_config()).await;

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(&key, &value).await.unwrap();
                    }
                    CacheOp::Get { key } => {
                        let _: Option<String> = cache.get(&key).await;
                    }
                    CacheOp::Delete { key } => {
                        cache.delete(&key).await;
                    }
                }
                let sizes = cache.sizes().await;
                prop_assert!(
                    sizes.fast <= TEST_FAST_CAPACITY,
                    "Fast tier size {} exceeds capacity {}",
                    sizes.fast,
                    TEST_FAST_CAPACITY
                );
                prop_assert!(
                    sizes.compressed <= TEST_COMPRESSED_CAPACITY,
                    "Compressed tier size {} exceeds capacity {}",
                    sizes.compressed,
                    TEST_COMPRESSED_CAPACITY
                );
            }
            Ok(())
        })?;
    }

    // For any sequence of operations, every key is resident in at most one
    // tier afterward.
    #[test]
    fn prop_single_tier_residency(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let cache = TieredCache::new(test_config()).await;
            let mut touched: Vec<String> = Vec::new();

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(&key, &value).await.unwrap();
                        touched.push(key);
                    }
                    CacheOp::Get { key } => {
                        let _: Option<String> = cache.get(&key).await;
                    }
                    CacheOp::Delete { key } => {
                        cache.delete(&key).await;
                    }
                }
            }

            // Locating a key is itself tier-exclusive; cross-check against
            // the total entry count to catch double residency.
            let sizes = cache.sizes().await;
            touched.sort();
            touched.dedup();
            let resident = {
                let mut count = 0;
                for key in &touched {
                    if cache.locate(key).await.is_some() {
                        count += 1;
                    }
                }
                count
            };
            prop_assert_eq!(
                resident,
                sizes.fast + sizes.compressed + sizes.disk_indexed,
                "Tier sizes disagree with per-key residency"
            );
            Ok(())
        })?;
    }

    // For any valid key-value pair, storing then retrieving returns the
    // exact same value.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_value_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let cache = TieredCache::new(test_config()).await;

            cache.set(&key, &value).await.unwrap();

            let retrieved: Option<String> = cache.get(&key).await;
            prop_assert_eq!(retrieved, Some(value), "Round-trip value mismatch");
            Ok(())
        })?;
    }

    // For any key, storing V1 then V2 results in GET returning V2, with a
    // single resident entry.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let cache = TieredCache::new(test_config()).await;

            cache.set(&key, &value1).await.unwrap();
            cache.set(&key, &value2).await.unwrap();

            let retrieved: Option<String> = cache.get(&key).await;
            prop_assert_eq!(retrieved, Some(value2), "Overwrite should return new value");

            let sizes = cache.sizes().await;
            prop_assert_eq!(
                sizes.fast + sizes.compressed + sizes.disk_indexed,
                1,
                "Exactly one entry should remain after overwrite"
            );
            Ok(())
        })?;
    }

    // For any sequence of operations, hits and misses accurately count the
    // GET outcomes.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let cache = TieredCache::new(test_config()).await;
            let mut expected_hits: u64 = 0;
            let mut expected_misses: u64 = 0;

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(&key, &value).await.unwrap();
                    }
                    CacheOp::Get { key } => {
                        let result: Option<String> = cache.get(&key).await;
                        match result {
                            Some(_) => expected_hits += 1,
                            None => expected_misses += 1,
                        }
                    }
                    CacheOp::Delete { key } => {
                        cache.delete(&key).await;
                    }
                }
            }

            let stats = cache.stats().await;
            prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
            prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");

            let total = expected_hits + expected_misses;
            let expected_rate = if total == 0 {
                0.0
            } else {
                expected_hits as f64 / total as f64
            };
            prop_assert!(
                (stats.hit_rate - expected_rate).abs() < f64::EPSILON,
                "Hit rate {} != expected {}",
                stats.hit_rate,
                expected_rate
            );
            Ok(())
        })?;
    }

    // For any key that exists, DELETE removes it from every tier.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in valid_value_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let cache = TieredCache::new(test_config()).await;

            cache.set(&key, &value).await.unwrap();
            prop_assert!(cache.delete(&key).await, "Delete should report removal");

            let retrieved: Option<String> = cache.get(&key).await;
            prop_assert!(retrieved.is_none(), "Key should not exist after delete");
            prop_assert!(cache.locate(&key).await.is_none(), "No tier should hold the key");
            Ok(())
        })?;
    }
}
