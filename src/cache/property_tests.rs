//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check byte accounting, the capacity bound and LRU order.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::cache::EvictionStore;

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,3}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..24)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Vec<u8> },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

fn live_bytes(store: &EvictionStore) -> usize {
    store
        .get_all()
        .iter()
        .map(|(key, value)| key.len() + value.len())
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // current_bytes equals the sum of live key+value lengths after every
    // insertion, update, eviction and removal.
    #[test]
    fn prop_byte_accounting_matches_live_entries(
        max_bytes in prop_oneof![Just(0usize), 8usize..64],
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let mut store = EvictionStore::new(max_bytes, None);

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value),
                CacheOp::Get { key } => { store.get(&key); }
                CacheOp::Remove { key } => { store.remove(&key); }
            }
            prop_assert_eq!(store.current_bytes(), live_bytes(&store));
            prop_assert!(
                max_bytes == 0 || store.current_bytes() <= max_bytes,
                "current_bytes {} exceeds max {}",
                store.current_bytes(),
                max_bytes
            );
        }
    }

    // The entry touched last is never the one evicted while it still fits.
    #[test]
    fn prop_most_recent_key_survives_eviction(
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let max_bytes = 32;
        let mut store = EvictionStore::new(max_bytes, None);

        for op in ops {
            let touched = match op {
                CacheOp::Set { key, value } => {
                    let fits = key.len() + value.len() <= max_bytes;
                    store.set(key.clone(), value);
                    fits.then_some(key)
                }
                CacheOp::Get { key } => store.get(&key).map(|_| key),
                CacheOp::Remove { key } => {
                    store.remove(&key);
                    None
                }
            };
            if let Some(key) = touched {
                prop_assert!(store.get_all().contains_key(&key), "{} was evicted", key);
                let recency = store.keys_by_recency();
                prop_assert_eq!(recency.first(), Some(&key));
            }
        }
    }

    // Eviction order matches a simple reference model of recency.
    #[test]
    fn prop_eviction_follows_recency_model(
        ops in prop::collection::vec(cache_op_strategy(), 1..60)
    ) {
        let max_bytes = 24;
        let mut store = EvictionStore::new(max_bytes, None);
        let mut model: Vec<(String, Vec<u8>)> = Vec::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    model.retain(|(k, _)| k != &key);
                    model.insert(0, (key.clone(), value.clone()));
                    while model.iter().map(|(k, v)| k.len() + v.len()).sum::<usize>() > max_bytes {
                        model.pop();
                    }
                    store.set(key, value);
                }
                CacheOp::Get { key } => {
                    if let Some(pos) = model.iter().position(|(k, _)| k == &key) {
                        let entry = model.remove(pos);
                        model.insert(0, entry);
                    }
                    store.get(&key);
                }
                CacheOp::Remove { key } => {
                    model.retain(|(k, _)| k != &key);
                    store.remove(&key);
                }
            }
            let expected: Vec<String> = model.iter().map(|(k, _)| k.clone()).collect();
            prop_assert_eq!(store.keys_by_recency(), expected);
        }

        let expected: HashMap<String, Vec<u8>> = model.into_iter().collect();
        prop_assert_eq!(store.get_all(), expected);
    }
}
