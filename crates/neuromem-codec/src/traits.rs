//! The codec contract used by the cache.
//!
//! ```text
//! buffer [N] ──encode──> latent [E] ──decode──> reconstruction [N]
//!     │                                              │
//!     └──────────────── train (MSE) ─────────────────┘
//! ```

use crate::error::{CodecError, Result};
use crate::stats::TrainingStats;

/// A trainable reconstruction codec.
///
/// Implementations compress a fixed-length buffer of `input_size()` values
/// into `encoding_size()` values and reconstruct an approximation from it.
/// `train` adapts the codec so that its reconstruction of the sample moves
/// toward the sample itself.
pub trait Codec: Send + Sync {
    /// Length of the buffers accepted by `encode` and `train`.
    fn input_size(&self) -> usize;

    /// Length of the latent vectors produced by `encode`.
    fn encoding_size(&self) -> usize;

    /// Compress a buffer of `input_size()` values.
    fn encode(&self, input: &[f32]) -> Result<Vec<f32>>;

    /// Reconstruct a buffer from a latent vector of `encoding_size()` values.
    fn decode(&self, latent: &[f32]) -> Result<Vec<f32>>;

    /// Run one reconstruction training step on `sample`.
    ///
    /// Returns the mean squared reconstruction error measured during the step.
    fn train(&mut self, sample: &[f32]) -> Result<f32>;

    /// Full encode-then-decode path.
    fn reconstruct(&self, input: &[f32]) -> Result<Vec<f32>> {
        let latent = self.encode(input)?;
        self.decode(&latent)
    }

    /// Training statistics, if the codec tracks them.
    fn stats(&self) -> Option<TrainingStats> {
        None
    }
}

impl<C: Codec + ?Sized> Codec for Box<C> {
    fn input_size(&self) -> usize {
        (**self).input_size()
    }

    fn encoding_size(&self) -> usize {
        (**self).encoding_size()
    }

    fn encode(&self, input: &[f32]) -> Result<Vec<f32>> {
        (**self).encode(input)
    }

    fn decode(&self, latent: &[f32]) -> Result<Vec<f32>> {
        (**self).decode(latent)
    }

    fn train(&mut self, sample: &[f32]) -> Result<f32> {
        (**self).train(sample)
    }

    fn reconstruct(&self, input: &[f32]) -> Result<Vec<f32>> {
        (**self).reconstruct(input)
    }

    fn stats(&self) -> Option<TrainingStats> {
        (**self).stats()
    }
}

/// Check a vector length against the expected dimension.
pub(crate) fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(CodecError::DimensionMismatch { expected, actual })
    }
}

/// Mean squared error between two equal-length slices.
pub fn mean_squared_error(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() {
        return 0.0;
    }

    let sum: f32 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    sum / a.len() as f32
}
