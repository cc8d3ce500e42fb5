//! Property-based tests for the queue-fed memory.
//!
//! - Queue overflow keeps exactly the newest submissions
//! - The cache capacity bound holds once the queue drains
//!
//! Run with: cargo test -p neuromem --test proptest_memory

use proptest::prelude::*;
use std::time::Duration;

use neuromem::{CacheConfig, MemoryConfig, NeuralMemory, PassthroughCodec, QueueConfig};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        ..ProptestConfig::default()
    })]

    /// Property: saves made before the consumer starts keep only the newest
    /// `queue_capacity`, and the cache keeps at most `cache_capacity` of those.
    #[test]
    fn prop_overflow_then_drain(
        queue_capacity in 1usize..8,
        cache_capacity in 1usize..8,
        saves in 0u32..24,
    ) {
        let config = MemoryConfig {
            cache: CacheConfig {
                capacity: cache_capacity,
                train_steps: 1,
                ..Default::default()
            },
            queue: QueueConfig { capacity: queue_capacity },
            ..Default::default()
        };
        let memory = NeuralMemory::<u32, _>::with_codec(&config, PassthroughCodec::new(4)).unwrap();

        let keys = runtime().block_on(async {
            for k in 0..saves {
                memory.save(k, vec![k as u8; 4]);
            }
            let consumer = memory.spawn_consumer().unwrap();
            memory.drain_timeout(Duration::from_secs(10)).await.unwrap();
            consumer.shutdown().await.unwrap();
            memory.cache().keys()
        });

        let executed = (saves as usize).min(queue_capacity);
        let kept = executed.min(cache_capacity);
        let expected: Vec<u32> = (saves - kept as u32..saves).collect();

        prop_assert_eq!(keys, expected);
        let stats = memory.stats();
        prop_assert_eq!(stats.queue.discarded as usize, saves as usize - executed);
        prop_assert_eq!(stats.cache.stores as usize, executed);
        prop_assert!(stats.cache.entries <= cache_capacity);
    }
}
