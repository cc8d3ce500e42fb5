//! Many producers, one consumer, concurrent readers.

use neuromem::{CacheConfig, MemoryConfig, NeuralMemory, PassthroughCodec, QueueConfig};
use std::time::Duration;

const PRODUCERS: u64 = 32;

fn memory(cache_capacity: usize) -> NeuralMemory<u64, PassthroughCodec> {
    let config = MemoryConfig {
        cache: CacheConfig {
            capacity: cache_capacity,
            train_steps: 2,
            ..Default::default()
        },
        queue: QueueConfig { capacity: 256 },
        ..Default::default()
    };
    NeuralMemory::with_codec(&config, PassthroughCodec::new(8)).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_all_land() {
    let memory = memory(1024);
    let consumer = memory.spawn_consumer().unwrap();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let memory = memory.clone();
            tokio::spawn(async move {
                // Two saves per producer, in order
                memory.save(p * 2, vec![p as u8; 8]);
                memory.save(p * 2 + 1, vec![p as u8; 8]);
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    memory.drain_timeout(Duration::from_secs(30)).await.unwrap();

    let keys = memory.cache().keys();
    assert_eq!(keys.len(), (PRODUCERS * 2) as usize);

    // Per-producer submission order survives the interleaving
    for p in 0..PRODUCERS {
        let first = keys.iter().position(|&k| k == p * 2).unwrap();
        let second = keys.iter().position(|&k| k == p * 2 + 1).unwrap();
        assert!(first < second, "producer {} out of order", p);
    }

    let stats = memory.stats();
    assert_eq!(stats.queue.submitted, PRODUCERS * 2);
    assert_eq!(stats.queue.executed, PRODUCERS * 2);
    assert_eq!(stats.queue.discarded, 0);

    consumer.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_run_alongside_writes() {
    let memory = memory(16);
    let consumer = memory.spawn_consumer().unwrap();

    let reader = {
        let memory = memory.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                assert!(memory.cache().len() <= 16);
                for k in 0..64u64 {
                    if let Some(value) = memory.retrieve(&k).unwrap() {
                        assert_eq!(value.len(), 8);
                    }
                    let _ = memory.nearby(&k);
                }
                tokio::task::yield_now().await;
            }
        })
    };

    for k in 0..64u64 {
        memory.save(k, vec![k as u8; 8]);
    }
    memory.drain_timeout(Duration::from_secs(30)).await.unwrap();
    reader.await.unwrap();

    assert_eq!(memory.cache().len(), 16);
    assert_eq!(memory.cache().keys(), (48..64).collect::<Vec<_>>());

    consumer.shutdown().await.unwrap();
}
