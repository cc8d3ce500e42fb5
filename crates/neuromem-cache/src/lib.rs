//! Neural Memory Cache
//!
//! A bounded key-value store that pushes every value through a learned
//! codec before keeping it:
//! - Oldest-first eviction once capacity is exceeded
//! - Codec training on every store (reconstruction objective)
//! - Adjacency-based similarity between neighboring entries
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Neural Cache                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  Payload ─> preprocess ─> Codec::train ─> insert ─> evict    │
//! │  text        /255, pad     train_steps     ordered   oldest  │
//! │  bytes       or truncate                             first   │
//! │  buffer                                                      │
//! │                                                              │
//! │  Entries (insertion order):                                  │
//! │  ┌──────┬──────┬──────┬──────┬──────┐                        │
//! │  │  k1  │  k2  │  k3  │  k4  │  k5  │ <- newest              │
//! │  └──────┴──────┴──────┴──────┴──────┘                        │
//! │  oldest    nearest_neighbor(k3) compares k2 and k4 only      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups of evicted or unknown keys return `None`; forgetting is normal.

mod cache;
mod error;
mod payload;

pub use cache::{CacheConfig, CacheKey, CacheStats, NeuralCache, Retention};
pub use error::{CacheError, Result};
pub use payload::{postprocess, preprocess, Payload, BYTE_SCALE};

/// Prelude for common imports
pub mod prelude {
    pub use super::{CacheConfig, NeuralCache, Payload, Result, Retention};
}
