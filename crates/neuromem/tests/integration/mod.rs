//! Integration tests for the neural memory.
//!
//! Run with: cargo test -p neuromem --test integration

mod concurrency;
mod end_to_end;

use neuromem::{AutoencoderConfig, CacheConfig, MemoryConfig, OptimizerConfig, QueueConfig};

/// Small, seeded autoencoder configuration that trains quickly.
pub fn small_config(cache_capacity: usize, train_steps: usize) -> MemoryConfig {
    MemoryConfig {
        cache: CacheConfig {
            capacity: cache_capacity,
            train_steps,
            ..Default::default()
        },
        queue: QueueConfig { capacity: 64 },
        codec: AutoencoderConfig {
            input_size: 16,
            encoding_size: 8,
            hidden_size: 32,
            dropout: 0.0,
            optimizer: OptimizerConfig {
                learning_rate: 0.01,
                ..Default::default()
            },
            seed: Some(7),
        },
        ..Default::default()
    }
}
