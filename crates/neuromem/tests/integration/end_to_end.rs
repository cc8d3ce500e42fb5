//! Full save -> train -> evict -> query scenarios.

use super::small_config;
use neuromem::{AutoencoderCodec, CacheConfig, MemoryConfig, NeuralMemory, PassthroughCodec, QueueConfig};
use std::time::Duration;

const DRAIN: Duration = Duration::from_secs(30);

fn key(i: usize) -> String {
    format!("k{}", i)
}

/// Mean squared error between a byte value and its reconstruction, in [0, 1] units.
fn reconstruction_error(original: &[u8], decoded: &[u8]) -> f32 {
    let n = decoded.len() as f32;
    decoded
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let o = original.get(i).copied().unwrap_or(0) as f32;
            ((o - d as f32) / 255.0).powi(2)
        })
        .sum::<f32>()
        / n
}

#[tokio::test]
async fn test_capacity_five_six_keys() {
    let memory = NeuralMemory::<String, AutoencoderCodec>::from_config(&small_config(5, 5)).unwrap();
    let consumer = memory.spawn_consumer().unwrap();

    // k5 sits closer to k4 than k3 does
    let values = [10u8, 20, 30, 40, 48, 60];
    for (i, &value) in (1..=6).zip(values.iter()) {
        memory.save(key(i), vec![value; 16]);
    }
    memory.drain_timeout(DRAIN).await.unwrap();

    assert_eq!(memory.retrieve(&key(1)).unwrap(), None);
    for i in 2..=6 {
        let value = memory.retrieve(&key(i)).unwrap().expect("key should be present");
        assert_eq!(value.len(), 16);
    }
    assert_eq!(
        memory.cache().keys(),
        (2..=6).map(key).collect::<Vec<_>>()
    );

    assert_eq!(memory.nearby(&key(4)), Some(key(5)));
    assert_eq!(memory.nearby(&key(2)), Some(key(3)));
    assert_eq!(memory.nearby(&key(6)), Some(key(5)));

    let stats = memory.stats();
    assert_eq!(stats.cache.stores, 6);
    assert_eq!(stats.cache.evictions, 1);
    assert_eq!(stats.queue.executed, 6);
    assert!(stats.cache.last_loss.is_some());

    consumer.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_nearby_only_considers_adjacent_entries() {
    let config = MemoryConfig {
        cache: CacheConfig {
            capacity: 8,
            train_steps: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let memory = NeuralMemory::<String, _>::with_codec(&config, PassthroughCodec::new(4)).unwrap();
    let consumer = memory.spawn_consumer().unwrap();

    // k1 is identical to k4 but not adjacent to it
    memory.save(key(1), vec![200u8; 4]);
    memory.save(key(2), vec![0u8; 4]);
    memory.save(key(3), vec![100u8; 4]);
    memory.save(key(4), vec![200u8; 4]);
    memory.save(key(5), vec![10u8; 4]);
    memory.drain_timeout(DRAIN).await.unwrap();

    assert_eq!(memory.nearby(&key(4)), Some(key(3)));
    assert_eq!(memory.nearby(&key(1)), Some(key(2)));
    assert_eq!(memory.nearby(&key(9)), None);

    consumer.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_zero_training_keeps_padded_length() {
    let memory = NeuralMemory::<String, AutoencoderCodec>::from_config(&small_config(4, 0)).unwrap();
    let consumer = memory.spawn_consumer().unwrap();

    let (_, handle) = memory.save_with_handle(key(1), b"abc".as_slice());
    assert!(handle.outcome().await.is_completed());

    let value = memory.retrieve(&key(1)).unwrap().unwrap();
    assert_eq!(value.len(), 16);
    assert_eq!(memory.stats().cache.last_loss, None);

    consumer.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_training_improves_reconstruction() {
    let original: Vec<u8> = (0..16).map(|i| (i * 15) as u8).collect();

    let untrained = NeuralMemory::<String, AutoencoderCodec>::from_config(&small_config(4, 0)).unwrap();
    let trained = NeuralMemory::<String, AutoencoderCodec>::from_config(&small_config(4, 300)).unwrap();

    let mut errors = Vec::new();
    for memory in [&untrained, &trained] {
        let consumer = memory.spawn_consumer().unwrap();
        let (_, handle) = memory.save_with_handle(key(1), original.clone());
        assert!(handle.outcome().await.is_completed());

        let decoded = memory.retrieve(&key(1)).unwrap().unwrap();
        errors.push(reconstruction_error(&original, &decoded));
        consumer.shutdown().await.unwrap();
    }

    assert!(
        errors[1] < errors[0],
        "training did not help: untrained {}, trained {}",
        errors[0],
        errors[1]
    );
}

#[tokio::test]
async fn test_get_range_and_nearby_range() {
    let config = MemoryConfig {
        cache: CacheConfig {
            capacity: 8,
            train_steps: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let memory = NeuralMemory::<i64, _>::with_codec(&config, PassthroughCodec::new(2)).unwrap();
    let consumer = memory.spawn_consumer().unwrap();

    for (k, v) in [(1i64, 0u8), (2, 10), (3, 30), (4, 100)] {
        memory.save(k, vec![v; 2]);
    }
    memory.drain_timeout(DRAIN).await.unwrap();

    let values = memory.get_range(&2, Some(&4)).unwrap();
    assert_eq!(values, vec![(2, vec![10, 10]), (3, vec![30, 30])]);

    let values = memory.get_range(&3, None).unwrap();
    assert_eq!(values.len(), 2);
    assert!(memory.get_range(&9, None).unwrap().is_empty());

    // Each position resolves to its closer adjacent entry
    let neighbors = memory.nearby_range(&1, &3).unwrap();
    assert_eq!(neighbors, vec![vec![10, 10], vec![0, 0], vec![10, 10]]);
    assert!(memory.nearby_range(&3, &1).unwrap().is_empty());

    consumer.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_queue_overflow_through_facade() {
    let config = MemoryConfig {
        cache: CacheConfig {
            capacity: 100,
            train_steps: 1,
            ..Default::default()
        },
        queue: QueueConfig { capacity: 3 },
        ..Default::default()
    };
    let memory = NeuralMemory::<i64, _>::with_codec(&config, PassthroughCodec::new(2)).unwrap();

    for k in 1..=5i64 {
        memory.save(k, vec![k as u8; 2]);
    }
    assert_eq!(memory.stats().queue.discarded, 2);

    let consumer = memory.spawn_consumer().unwrap();
    memory.drain_timeout(DRAIN).await.unwrap();

    assert_eq!(memory.cache().keys(), vec![3, 4, 5]);
    assert_eq!(memory.retrieve(&1).unwrap(), None);

    consumer.shutdown().await.unwrap();
}
