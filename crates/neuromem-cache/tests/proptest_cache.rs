//! Property-based tests for the neural cache.
//!
//! - The capacity bound holds after every store
//! - Surviving keys are exactly the most recent distinct keys, oldest first
//! - Preprocessing always yields the codec input length
//!
//! Run with: cargo test -p neuromem-cache --test proptest_cache

use proptest::prelude::*;

use neuromem_cache::{postprocess, preprocess, CacheConfig, NeuralCache, Payload};
use neuromem_codec::PassthroughCodec;

fn cache(capacity: usize) -> NeuralCache<u8, PassthroughCodec> {
    let config = CacheConfig {
        capacity,
        train_steps: 1,
        ..Default::default()
    };
    NeuralCache::new(config, PassthroughCodec::new(4)).unwrap()
}

/// Expected survivors under first-insertion FIFO with the given capacity.
fn expected_keys(keys: &[u8], capacity: usize) -> Vec<u8> {
    let mut order: Vec<u8> = Vec::new();
    for &k in keys {
        if !order.contains(&k) {
            order.push(k);
        }
        while order.len() > capacity {
            order.remove(0);
        }
    }
    order
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Property: size never exceeds capacity after a store returns.
    #[test]
    fn prop_capacity_invariant(
        capacity in 1usize..8,
        keys in prop::collection::vec(0u8..16, 0..64),
    ) {
        let cache = cache(capacity);
        for &k in &keys {
            cache.store(k, vec![k]).unwrap();
            prop_assert!(cache.len() <= capacity);
        }
    }

    /// Property: the survivors match a reference FIFO model.
    #[test]
    fn prop_fifo_order_matches_model(
        capacity in 1usize..8,
        keys in prop::collection::vec(0u8..16, 0..64),
    ) {
        let cache = cache(capacity);
        for &k in &keys {
            cache.store(k, vec![k]).unwrap();
        }
        prop_assert_eq!(cache.keys(), expected_keys(&keys, capacity));
    }

    /// Property: preprocessing fits any byte payload to the input size.
    #[test]
    fn prop_preprocess_fits_length(
        bytes in prop::collection::vec(any::<u8>(), 0..64),
        size in 1usize..48,
    ) {
        let buffer = preprocess(&Payload::Bytes(bytes.clone()), size).unwrap();
        prop_assert_eq!(buffer.len(), size);
        prop_assert!(buffer.iter().all(|v| (0.0..=1.0).contains(v)));

        let restored = postprocess(&buffer);
        let kept = bytes.len().min(size);
        prop_assert_eq!(&restored[..kept], &bytes[..kept]);
        prop_assert!(restored[kept..].iter().all(|&b| b == 0));
    }
}
