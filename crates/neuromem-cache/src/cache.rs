//! Bounded, insertion-ordered neural cache

use crate::payload::{postprocess, preprocess, Payload};
use crate::{CacheError, Result};
use indexmap::IndexMap;
use metrics::{counter, gauge};
use neuromem_codec::{mean_squared_error, Codec};
use parking_lot::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::{debug, info};

/// Keys usable in the cache
pub trait CacheKey: Hash + Eq + Clone + Debug + Send + Sync + 'static {}

impl<T: Hash + Eq + Clone + Debug + Send + Sync + 'static> CacheKey for T {}

/// What the cache keeps for each entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Keep the preprocessed buffer; retrieval runs encode then decode
    #[default]
    Buffer,
    /// Keep the codec's latent vector; retrieval runs decode only
    Latent,
}

/// Configuration for the neural cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub capacity: usize,
    /// Codec training steps per store
    pub train_steps: usize,
    /// Stop training early once a step reaches this loss
    pub target_loss: Option<f32>,
    /// Log training loss every N steps
    pub log_interval: usize,
    /// Stored representation
    pub retention: Retention,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 12_000,
            train_steps: 500,
            target_loss: None,
            log_interval: 20,
            retention: Retention::Buffer,
        }
    }
}

impl CacheConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig("capacity must be at least 1".into()));
        }
        Ok(())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Completed stores
    pub stores: u64,
    /// Entries evicted by the capacity bound
    pub evictions: u64,
    /// Point lookups
    pub lookups: u64,
    /// Lookups that found their key
    pub hits: u64,
    /// Entries in cache
    pub entries: usize,
    /// Maximum entries
    pub capacity: usize,
    /// Final training loss of the most recent store
    pub last_loss: Option<f32>,
}

impl CacheStats {
    /// Hit rate
    pub fn hit_rate(&self) -> f32 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f32 / self.lookups as f32
        }
    }
}

const NO_LOSS: u32 = u32::MAX;

/// Bounded key-value cache that routes every value through a codec.
///
/// Entries are kept in first-insertion order. Once a store pushes the
/// cache past `capacity`, entries are evicted from the oldest end.
/// Reads never reorder entries.
///
/// Training takes the codec write lock one step at a time, so a read issued
/// during a store waits for at most one training step. Stores running from
/// several threads interleave their steps on the shared codec.
pub struct NeuralCache<K: CacheKey, C: Codec> {
    config: CacheConfig,
    codec: RwLock<C>,
    entries: RwLock<IndexMap<K, Vec<f32>>>,
    stores: AtomicU64,
    evictions: AtomicU64,
    lookups: AtomicU64,
    hits: AtomicU64,
    last_loss: AtomicU32,
}

impl<K: CacheKey, C: Codec> NeuralCache<K, C> {
    /// Create a new cache around a codec
    pub fn new(config: CacheConfig, codec: C) -> Result<Self> {
        config.validate()?;

        info!(
            "Neural cache ready: capacity {}, input {}, encoding {}, {} train steps",
            config.capacity,
            codec.input_size(),
            codec.encoding_size(),
            config.train_steps
        );

        Ok(Self {
            config,
            codec: RwLock::new(codec),
            entries: RwLock::new(IndexMap::new()),
            stores: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            last_loss: AtomicU32::new(NO_LOSS),
        })
    }

    /// Configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Buffer length expected by the codec
    pub fn input_size(&self) -> usize {
        self.codec.read().input_size()
    }

    /// Train the codec on a value and store it under `key`.
    ///
    /// Returns the preprocessed buffer. An existing key keeps its position in
    /// the insertion order. Invalid payloads fail before anything is mutated.
    pub fn store(&self, key: K, payload: impl Into<Payload>) -> Result<Vec<f32>> {
        let payload = payload.into();

        let buffer = preprocess(&payload, self.input_size())?;
        let loss = self.train(&buffer)?;
        let stored = match self.config.retention {
            Retention::Buffer => buffer.clone(),
            Retention::Latent => self.codec.read().encode(&buffer)?,
        };

        let (evicted, len) = {
            let mut entries = self.entries.write();
            entries.insert(key.clone(), stored);

            let mut evicted = 0u64;
            while entries.len() > self.config.capacity {
                if let Some((old_key, _)) = entries.shift_remove_index(0) {
                    debug!("Evicted {:?}", old_key);
                    evicted += 1;
                }
            }
            (evicted, entries.len())
        };

        self.stores.fetch_add(1, Ordering::Relaxed);
        self.evictions.fetch_add(evicted, Ordering::Relaxed);
        if let Some(loss) = loss {
            self.last_loss.store(loss.to_bits(), Ordering::Relaxed);
        }

        counter!("neuromem_store_total").increment(1);
        counter!("neuromem_evictions_total").increment(evicted);
        gauge!("neuromem_cache_entries").set(len as f64);

        debug!("Stored {:?} ({} entries, {} evicted)", key, len, evicted);

        Ok(buffer)
    }

    /// Run the configured number of training steps; returns the last loss
    fn train(&self, buffer: &[f32]) -> Result<Option<f32>> {
        let mut last = None;

        for step in 0..self.config.train_steps {
            let mut codec = self.codec.write();
            let loss = codec.train(buffer)?;
            // Queued readers get the lock before the next step
            RwLockWriteGuard::unlock_fair(codec);
            last = Some(loss);

            if self.config.log_interval > 0 && step % self.config.log_interval == 0 {
                debug!("Step {}, loss {:.6}", step, loss);
            }

            if let Some(target) = self.config.target_loss {
                if loss <= target {
                    debug!("Reached target loss {:.6} at step {}", target, step);
                    break;
                }
            }
        }

        Ok(last)
    }

    /// Reconstruct the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key was never stored or has been evicted.
    pub fn retrieve(&self, key: &K) -> Result<Option<Vec<u8>>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let stored = match self.entries.read().get(key) {
            Some(stored) => stored.clone(),
            None => return Ok(None),
        };

        self.hits.fetch_add(1, Ordering::Relaxed);
        self.reconstruct(&stored).map(Some)
    }

    /// Store a value and immediately reconstruct it
    pub fn store_and_retrieve(
        &self,
        key: K,
        payload: impl Into<Payload>,
    ) -> Result<Option<Vec<u8>>> {
        self.store(key.clone(), payload)?;
        self.retrieve(&key)
    }

    /// The closer of `key`'s immediate predecessor and successor.
    ///
    /// Distance is the mean squared error between stored vectors. Ties go to
    /// the predecessor. Returns `None` if `key` is absent or has no neighbors.
    pub fn nearest_neighbor(&self, key: &K) -> Option<K> {
        let entries = self.entries.read();
        let idx = entries.get_index_of(key)?;
        nearest_at(&entries, idx).map(|(k, _)| k.clone())
    }

    /// Decoded nearest neighbors for each position from `from` to `to` inclusive.
    ///
    /// Positions without a neighbor are skipped. Empty if either key is absent.
    pub fn range_neighbors(&self, from: &K, to: &K) -> Result<Vec<Vec<u8>>> {
        let neighbors: Vec<Vec<f32>> = {
            let entries = self.entries.read();
            let (start, end) = match (entries.get_index_of(from), entries.get_index_of(to)) {
                (Some(start), Some(end)) => (start, end),
                _ => return Ok(Vec::new()),
            };

            if start > end {
                Vec::new()
            } else {
                (start..=end)
                    .filter_map(|idx| nearest_at(&entries, idx).map(|(_, v)| v.clone()))
                    .collect()
            }
        };

        neighbors.iter().map(|v| self.reconstruct(v)).collect()
    }

    /// Decoded values from `from` up to, but excluding, `to_exclusive`.
    ///
    /// A missing `to_exclusive` extends the range to the newest entry. Empty if
    /// `from` is absent or comes after `to_exclusive`.
    pub fn retrieve_range(&self, from: &K, to_exclusive: Option<&K>) -> Result<Vec<(K, Vec<u8>)>> {
        let selected: Vec<(K, Vec<f32>)> = {
            let entries = self.entries.read();
            let start = match entries.get_index_of(from) {
                Some(start) => start,
                None => return Ok(Vec::new()),
            };
            let end = to_exclusive
                .and_then(|to| entries.get_index_of(to))
                .unwrap_or(entries.len());

            if start >= end {
                Vec::new()
            } else {
                entries
                    .iter()
                    .skip(start)
                    .take(end - start)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            }
        };

        selected
            .into_iter()
            .map(|(k, v)| Ok((k, self.reconstruct(&v)?)))
            .collect()
    }

    fn reconstruct(&self, stored: &[f32]) -> Result<Vec<u8>> {
        let codec = self.codec.read();
        let output = match self.config.retention {
            Retention::Buffer => codec.reconstruct(stored)?,
            Retention::Latent => codec.decode(stored)?,
        };
        Ok(postprocess(&output))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether `key` is currently stored
    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Keys from oldest to newest
    pub fn keys(&self) -> Vec<K> {
        self.entries.read().keys().cloned().collect()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let last_loss = match self.last_loss.load(Ordering::Relaxed) {
            NO_LOSS => None,
            bits => Some(f32::from_bits(bits)),
        };

        CacheStats {
            stores: self.stores.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            entries: self.len(),
            capacity: self.config.capacity,
            last_loss,
        }
    }

    /// Remove all entries. The codec keeps its trained state.
    pub fn clear(&self) {
        self.entries.write().clear();
        gauge!("neuromem_cache_entries").set(0.0);
    }
}

/// Closer of the entries adjacent to `idx`
fn nearest_at<K>(entries: &IndexMap<K, Vec<f32>>, idx: usize) -> Option<(&K, &Vec<f32>)> {
    let (_, center) = entries.get_index(idx)?;

    let prev = idx.checked_sub(1).and_then(|i| entries.get_index(i));
    let next = entries.get_index(idx + 1);

    [prev, next]
        .into_iter()
        .flatten()
        .map(|(k, v)| (k, v, mean_squared_error(center, v)))
        .fold(None, |best: Option<(&K, &Vec<f32>, f32)>, cand| match best {
            Some(b) if b.2 <= cand.2 => Some(b),
            _ => Some(cand),
        })
        .map(|(k, v, _)| (k, v))
}

impl<K: CacheKey, C: Codec> std::fmt::Debug for NeuralCache<K, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeuralCache")
            .field("config", &self.config)
            .field("entries", &self.len())
            .finish()
    }
}
