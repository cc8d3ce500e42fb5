//! Cache + queue wiring

use crate::{MemoryConfig, MemoryError, Result};
use neuromem_cache::{CacheKey, CacheStats, NeuralCache, Payload};
use neuromem_codec::{build_codec, AutoencoderCodec, Codec};
use neuromem_queue::{ConsumerHandle, QueueConfig, QueueStats, TaskHandle, TaskId, TaskQueue};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Combined statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Cache statistics
    pub cache: CacheStats,
    /// Queue statistics
    pub queue: QueueStats,
}

/// Neural memory with a codec picked at runtime
pub type DynNeuralMemory<K> = NeuralMemory<K, Box<dyn Codec>>;

/// A neural cache whose writes go through a background training queue.
///
/// Writes (`save`) are queued and executed one at a time by a single
/// consumer, so the cache sees exactly one writer. Reads go straight to the
/// cache and may observe it before a queued write lands.
///
/// Cloning is cheap; clones share the same cache and queue.
pub struct NeuralMemory<K: CacheKey, C: Codec + 'static> {
    cache: Arc<NeuralCache<K, C>>,
    queue: Arc<TaskQueue>,
}

impl<K: CacheKey, C: Codec + 'static> NeuralMemory<K, C> {
    /// Wire an existing cache to a new queue
    pub fn new(cache: NeuralCache<K, C>, queue_config: QueueConfig) -> Result<Self> {
        let queue = TaskQueue::new(queue_config)?;
        Ok(Self {
            cache: Arc::new(cache),
            queue: Arc::new(queue),
        })
    }

    /// Build from configuration around a caller-supplied codec
    pub fn with_codec(config: &MemoryConfig, codec: C) -> Result<Self> {
        config.validate()?;
        let cache = NeuralCache::new(config.cache.clone(), codec)?;
        Self::new(cache, config.queue.clone())
    }

    /// Queue a store of `payload` under `key`. Never waits.
    ///
    /// If the queue is full the oldest queued store is dropped.
    pub fn save(&self, key: K, payload: impl Into<Payload>) -> TaskId {
        self.queue
            .submit(store_task(Arc::clone(&self.cache), key, payload.into()))
    }

    /// Queue a store and get a handle that resolves once it has run
    pub fn save_with_handle(&self, key: K, payload: impl Into<Payload>) -> (TaskId, TaskHandle) {
        self.queue
            .submit_with_handle(store_task(Arc::clone(&self.cache), key, payload.into()))
    }

    /// Reconstruct the value stored under `key`
    pub fn retrieve(&self, key: &K) -> Result<Option<Vec<u8>>> {
        Ok(self.cache.retrieve(key)?)
    }

    /// The closer of `key`'s immediate neighbors in insertion order
    pub fn nearby(&self, key: &K) -> Option<K> {
        self.cache.nearest_neighbor(key)
    }

    /// Decoded nearest neighbors for each position from `from` to `to` inclusive
    pub fn nearby_range(&self, from: &K, to: &K) -> Result<Vec<Vec<u8>>> {
        Ok(self.cache.range_neighbors(from, to)?)
    }

    /// Decoded values from `from` up to, but excluding, `to_exclusive`
    pub fn get_range(&self, from: &K, to_exclusive: Option<&K>) -> Result<Vec<(K, Vec<u8>)>> {
        Ok(self.cache.retrieve_range(from, to_exclusive)?)
    }

    /// Start the background consumer on the tokio runtime
    pub fn spawn_consumer(&self) -> Result<ConsumerHandle> {
        let handle = Arc::clone(&self.queue).spawn()?;
        info!("Neural memory consumer started");
        Ok(handle)
    }

    /// Wait for every queued store to finish
    pub async fn drain(&self) {
        self.queue.drain().await
    }

    /// [`NeuralMemory::drain`] with a deadline
    pub async fn drain_timeout(&self, timeout: Duration) -> Result<()> {
        Ok(self.queue.drain_timeout(timeout).await?)
    }

    /// Cache and queue statistics
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            cache: self.cache.stats(),
            queue: self.queue.stats(),
        }
    }

    /// Underlying cache
    pub fn cache(&self) -> &Arc<NeuralCache<K, C>> {
        &self.cache
    }

    /// Underlying queue
    pub fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }
}

impl<K: CacheKey> NeuralMemory<K, AutoencoderCodec> {
    /// Build with a freshly initialized autoencoder
    pub fn from_config(config: &MemoryConfig) -> Result<Self> {
        let codec = AutoencoderCodec::new(config.codec.clone())?;
        Self::with_codec(config, codec)
    }
}

impl<K: CacheKey> NeuralMemory<K, Box<dyn Codec>> {
    /// Build with the codec named by `config.codec_kind`
    pub fn from_config_dyn(config: &MemoryConfig) -> Result<Self> {
        let codec = build_codec(config.codec_kind, config.codec.clone())?;
        Self::with_codec(config, codec)
    }
}

impl<K: CacheKey, C: Codec + 'static> Clone for NeuralMemory<K, C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<K: CacheKey, C: Codec + 'static> std::fmt::Debug for NeuralMemory<K, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeuralMemory")
            .field("cache", &self.cache)
            .field("queue", &self.queue)
            .finish()
    }
}

/// Training is CPU-bound, so the store runs on the blocking pool.
fn store_task<K: CacheKey, C: Codec + 'static>(
    cache: Arc<NeuralCache<K, C>>,
    key: K,
    payload: Payload,
) -> impl Future<Output = Result<()>> + Send + 'static {
    async move {
        debug!("Storing {:?}", key);
        match tokio::task::spawn_blocking(move || cache.store(key, payload)).await {
            Ok(stored) => stored.map(|_| ()).map_err(MemoryError::from),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(MemoryError::Cancelled(e.to_string())),
        }
    }
}
