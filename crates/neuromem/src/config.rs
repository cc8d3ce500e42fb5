//! Combined configuration for cache, queue and codec

use crate::Result;
use neuromem_cache::CacheConfig;
use neuromem_codec::{AutoencoderConfig, CodecKind};
use neuromem_queue::QueueConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Neural memory configuration.
///
/// Every section is optional in TOML; missing values take their defaults.
///
/// ```toml
/// codec_kind = "autoencoder"
///
/// [cache]
/// capacity = 12000
/// train_steps = 500
///
/// [queue]
/// capacity = 12000
///
/// [codec]
/// input_size = 1024
/// encoding_size = 512
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Cache settings
    pub cache: CacheConfig,
    /// Queue settings
    pub queue: QueueConfig,
    /// Which codec to build
    pub codec_kind: CodecKind,
    /// Codec settings; `input_size` also sizes the passthrough codec
    pub codec: AutoencoderConfig,
}

impl MemoryConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        self.queue.validate()?;
        self.codec.validate()?;
        Ok(())
    }
}
