//! Identity codec

use crate::stats::TrainingStats;
use crate::traits::{check_len, Codec};
use crate::Result;

/// Codec that stores buffers verbatim.
///
/// Reconstruction is exact, so training always reports zero loss. Useful
/// when the cache should hold values without lossy compression.
#[derive(Debug, Clone)]
pub struct PassthroughCodec {
    size: usize,
    stats: TrainingStats,
}

impl PassthroughCodec {
    /// Create a passthrough codec for buffers of `size` values
    pub fn new(size: usize) -> Self {
        Self {
            size,
            stats: TrainingStats::default(),
        }
    }
}

impl Codec for PassthroughCodec {
    fn input_size(&self) -> usize {
        self.size
    }

    fn encoding_size(&self) -> usize {
        self.size
    }

    fn encode(&self, input: &[f32]) -> Result<Vec<f32>> {
        check_len(self.size, input.len())?;
        Ok(input.to_vec())
    }

    fn decode(&self, latent: &[f32]) -> Result<Vec<f32>> {
        check_len(self.size, latent.len())?;
        Ok(latent.to_vec())
    }

    fn train(&mut self, sample: &[f32]) -> Result<f32> {
        check_len(self.size, sample.len())?;
        self.stats.update(0.0, 0.0);
        Ok(0.0)
    }

    fn stats(&self) -> Option<TrainingStats> {
        Some(self.stats.clone())
    }
}
