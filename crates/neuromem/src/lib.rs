//! # Neuromem
//!
//! A bounded key-value memory that stores every value through a learned
//! codec, fed by an asynchronous training queue.
//!
//! ## Quick Start
//!
//! ```ignore
//! use neuromem::prelude::*;
//!
//! let config = MemoryConfig::from_file("neuromem.toml")?;
//! let memory = NeuralMemory::<i64, AutoencoderCodec>::from_config(&config)?;
//! let consumer = memory.spawn_consumer()?;
//!
//! memory.save(1, "hello");
//! memory.drain().await;
//! let value = memory.retrieve(&1)?;
//!
//! consumer.shutdown().await?;
//! ```
//!
//! ## Crates
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | `neuromem-codec` | Codec trait, dense autoencoder, passthrough codec |
//! | `neuromem-cache` | Bounded insertion-ordered cache with adjacency queries |
//! | `neuromem-queue` | Drop-oldest task queue with a single consumer |
//! | `neuromem` | Wiring, configuration, statistics |

mod config;
mod error;
mod memory;

pub use config::MemoryConfig;
pub use error::{MemoryError, Result};
pub use memory::{DynNeuralMemory, MemoryStats, NeuralMemory};

pub use neuromem_cache::{
    postprocess, preprocess, CacheConfig, CacheError, CacheKey, CacheStats, NeuralCache, Payload,
    Retention,
};
pub use neuromem_codec::{
    build_codec, AutoencoderCodec, AutoencoderConfig, Codec, CodecError, CodecKind,
    OptimizerConfig, PassthroughCodec, TrainingStats,
};
pub use neuromem_queue::{
    ConsumerHandle, QueueConfig, QueueError, QueueStats, TaskHandle, TaskId, TaskOutcome,
    TaskQueue,
};

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        AutoencoderCodec, CacheConfig, Codec, MemoryConfig, MemoryError, NeuralMemory, Payload,
        PassthroughCodec, QueueConfig, Result, TaskOutcome,
    };
}
