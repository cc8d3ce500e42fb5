//! AdamW optimizer over flat parameter slices

use crate::{CodecError, Result};
use serde::{Deserialize, Serialize};

/// Optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Learning rate
    pub learning_rate: f32,
    /// First moment decay
    pub beta1: f32,
    /// Second moment decay
    pub beta2: f32,
    /// Numerical stability term
    pub epsilon: f32,
    /// Decoupled weight decay (0.0 = plain Adam)
    pub weight_decay: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 5e-4,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            weight_decay: 0.0,
        }
    }
}

impl OptimizerConfig {
    /// Validate hyperparameters
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(CodecError::InvalidConfig(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(CodecError::InvalidConfig(format!(
                    "{} must be in [0, 1), got {}",
                    name, beta
                )));
            }
        }
        if self.epsilon <= 0.0 || self.weight_decay < 0.0 {
            return Err(CodecError::InvalidConfig(
                "epsilon must be positive and weight decay non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// First and second moment estimates for one parameter tensor
#[derive(Debug, Clone)]
pub struct Moments {
    m: Vec<f32>,
    v: Vec<f32>,
}

impl Moments {
    /// Zeroed moments for `len` parameters
    pub fn new(len: usize) -> Self {
        Self {
            m: vec![0.0; len],
            v: vec![0.0; len],
        }
    }
}

/// AdamW optimizer
#[derive(Debug, Clone)]
pub struct AdamW {
    config: OptimizerConfig,
    step: u32,
}

impl AdamW {
    /// Create new optimizer
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config, step: 0 }
    }

    /// Advance the shared step counter; call once per training step before `apply`.
    pub fn begin_step(&mut self) {
        self.step = self.step.saturating_add(1);
    }

    /// Current step
    pub fn current_step(&self) -> u32 {
        self.step
    }

    /// Learning rate
    pub fn learning_rate(&self) -> f32 {
        self.config.learning_rate
    }

    /// Update `params` in place from `grads`
    pub fn apply(&self, params: &mut [f32], grads: &[f32], moments: &mut Moments) {
        let OptimizerConfig {
            learning_rate: lr,
            beta1,
            beta2,
            epsilon,
            weight_decay,
        } = self.config;

        let t = self.step.max(1) as i32;
        let bias1 = 1.0 - beta1.powi(t);
        let bias2 = 1.0 - beta2.powi(t);

        for (((p, &g), m), v) in params
            .iter_mut()
            .zip(grads)
            .zip(moments.m.iter_mut())
            .zip(moments.v.iter_mut())
        {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;

            let m_hat = *m / bias1;
            let v_hat = *v / bias2;

            *p -= lr * (m_hat / (v_hat.sqrt() + epsilon) + weight_decay * *p);
        }
    }
}
