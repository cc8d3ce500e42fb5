//! Dense autoencoder codec
//!
//! ```text
//! encoder: [N] ─Dense(ReLU)─> [H] ─dropout─ Dense(tanh) ─> [E]
//! decoder: [E] ─Dense(ReLU)─> [H] ─dropout─ Dense(sigmoid) ─> [N]
//! ```
//!
//! Each `train` call is one AdamW step on the reconstruction loss of a single
//! sample. Dropout is only active during training.
//!
//! Each side has a single hidden layer. There is no second `Dense(E, tanh)`
//! stage around the latent, so dropout applies to one hidden activation per side.

use crate::layer::{Activation, Dense};
use crate::optimizer::{AdamW, OptimizerConfig};
use crate::stats::TrainingStats;
use crate::traits::{check_len, mean_squared_error, Codec};
use crate::{CodecError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Autoencoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoencoderConfig {
    /// Buffer length (N)
    pub input_size: usize,
    /// Latent length (E)
    pub encoding_size: usize,
    /// Hidden layer width (H)
    pub hidden_size: usize,
    /// Dropout rate applied to hidden activations while training
    pub dropout: f32,
    /// Optimizer hyperparameters
    pub optimizer: OptimizerConfig,
    /// Seed for weight init and dropout masks
    pub seed: Option<u64>,
}

impl Default for AutoencoderConfig {
    fn default() -> Self {
        Self {
            input_size: 1024,
            encoding_size: 512,
            hidden_size: 256,
            dropout: 0.2,
            optimizer: OptimizerConfig::default(),
            seed: None,
        }
    }
}

impl AutoencoderConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 || self.encoding_size == 0 || self.hidden_size == 0 {
            return Err(CodecError::InvalidConfig(format!(
                "layer sizes must be non-zero (input {}, encoding {}, hidden {})",
                self.input_size, self.encoding_size, self.hidden_size
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(CodecError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        self.optimizer.validate()
    }
}

/// Dense autoencoder implementing [`Codec`]
pub struct AutoencoderCodec {
    config: AutoencoderConfig,
    enc_hidden: Dense,
    enc_latent: Dense,
    dec_hidden: Dense,
    dec_output: Dense,
    optimizer: AdamW,
    rng: StdRng,
    stats: TrainingStats,
}

impl AutoencoderCodec {
    /// Build a freshly initialized autoencoder
    pub fn new(config: AutoencoderConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let (n, e, h) = (config.input_size, config.encoding_size, config.hidden_size);
        let enc_hidden = Dense::new(n, h, Activation::Relu, &mut rng);
        let enc_latent = Dense::new(h, e, Activation::Tanh, &mut rng);
        let dec_hidden = Dense::new(e, h, Activation::Relu, &mut rng);
        let dec_output = Dense::new(h, n, Activation::Sigmoid, &mut rng);
        let optimizer = AdamW::new(config.optimizer.clone());

        let codec = Self {
            config,
            enc_hidden,
            enc_latent,
            dec_hidden,
            dec_output,
            optimizer,
            rng,
            stats: TrainingStats::default(),
        };

        debug!(
            "Autoencoder {} -> {} -> {}: {} parameters",
            n,
            h,
            e,
            codec.num_params()
        );

        Ok(codec)
    }

    /// Configuration
    pub fn config(&self) -> &AutoencoderConfig {
        &self.config
    }

    /// Number of trainable parameters
    pub fn num_params(&self) -> usize {
        self.enc_hidden.num_params()
            + self.enc_latent.num_params()
            + self.dec_hidden.num_params()
            + self.dec_output.num_params()
    }

    /// Inverted dropout mask; all ones when dropout is disabled
    fn dropout_mask(&mut self, len: usize) -> Vec<f32> {
        let p = self.config.dropout;
        if p == 0.0 {
            return vec![1.0; len];
        }

        let keep = 1.0 - p;
        (0..len)
            .map(|_| {
                if self.rng.gen::<f32>() < keep {
                    1.0 / keep
                } else {
                    0.0
                }
            })
            .collect()
    }
}

fn mul(values: &[f32], mask: &[f32]) -> Vec<f32> {
    values.iter().zip(mask).map(|(v, m)| v * m).collect()
}

impl Codec for AutoencoderCodec {
    fn input_size(&self) -> usize {
        self.config.input_size
    }

    fn encoding_size(&self) -> usize {
        self.config.encoding_size
    }

    fn encode(&self, input: &[f32]) -> Result<Vec<f32>> {
        check_len(self.config.input_size, input.len())?;
        let hidden = self.enc_hidden.forward(input);
        Ok(self.enc_latent.forward(&hidden))
    }

    fn decode(&self, latent: &[f32]) -> Result<Vec<f32>> {
        check_len(self.config.encoding_size, latent.len())?;
        let hidden = self.dec_hidden.forward(latent);
        Ok(self.dec_output.forward(&hidden))
    }

    fn train(&mut self, sample: &[f32]) -> Result<f32> {
        check_len(self.config.input_size, sample.len())?;

        // Forward
        let h1 = self.enc_hidden.forward(sample);
        let mask1 = self.dropout_mask(h1.len());
        let h1_dropped = mul(&h1, &mask1);
        let latent = self.enc_latent.forward(&h1_dropped);

        let h2 = self.dec_hidden.forward(&latent);
        let mask2 = self.dropout_mask(h2.len());
        let h2_dropped = mul(&h2, &mask2);
        let output = self.dec_output.forward(&h2_dropped);

        let loss = mean_squared_error(&output, sample);
        if !loss.is_finite() {
            warn!("Autoencoder diverged after {} steps", self.stats.total_steps);
            return Err(CodecError::Diverged {
                step: self.stats.total_steps,
                loss,
            });
        }

        // Backward
        let scale = 2.0 / sample.len() as f32;
        let grad_output: Vec<f32> = output
            .iter()
            .zip(sample)
            .map(|(y, x)| scale * (y - x))
            .collect();

        let grad_h2 = mul(
            &self.dec_output.backward(&h2_dropped, &output, &grad_output, true),
            &mask2,
        );
        let grad_latent = self.dec_hidden.backward(&latent, &h2, &grad_h2, true);
        let grad_h1 = mul(
            &self.enc_latent.backward(&h1_dropped, &latent, &grad_latent, true),
            &mask1,
        );
        self.enc_hidden.backward(sample, &h1, &grad_h1, false);

        // Update
        self.optimizer.begin_step();
        for layer in [
            &mut self.enc_hidden,
            &mut self.enc_latent,
            &mut self.dec_hidden,
            &mut self.dec_output,
        ] {
            layer.apply_gradients(&self.optimizer);
        }

        self.stats.update(loss, self.optimizer.learning_rate());
        Ok(loss)
    }

    fn stats(&self) -> Option<TrainingStats> {
        Some(self.stats.clone())
    }
}

impl std::fmt::Debug for AutoencoderCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoencoderCodec")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}
