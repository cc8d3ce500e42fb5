//! Dense layers with manual backpropagation

use crate::optimizer::{AdamW, Moments};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Elementwise activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// f(x) = x
    Identity,
    /// f(x) = max(0, x)
    Relu,
    /// f(x) = tanh(x)
    Tanh,
    /// f(x) = 1 / (1 + e^-x)
    Sigmoid,
}

impl Activation {
    /// Apply to a pre-activation value
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Identity => x,
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }

    /// Derivative expressed in terms of the activation output
    #[inline]
    pub fn derivative(self, y: f32) -> f32 {
        match self {
            Activation::Identity => 1.0,
            Activation::Relu => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Tanh => 1.0 - y * y,
            Activation::Sigmoid => y * (1.0 - y),
        }
    }
}

/// Fully connected layer: y = act(W x + b)
///
/// Weights are stored row-major as `[out_dim][in_dim]`.
#[derive(Debug, Clone)]
pub struct Dense {
    in_dim: usize,
    out_dim: usize,
    activation: Activation,
    weights: Vec<f32>,
    bias: Vec<f32>,
    grad_weights: Vec<f32>,
    grad_bias: Vec<f32>,
    moments_weights: Moments,
    moments_bias: Moments,
}

impl Dense {
    /// Create a layer with Glorot-uniform weights and zero bias
    pub fn new<R: Rng>(in_dim: usize, out_dim: usize, activation: Activation, rng: &mut R) -> Self {
        let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
        let weights = (0..in_dim * out_dim)
            .map(|_| rng.gen_range(-limit..=limit))
            .collect();

        Self {
            in_dim,
            out_dim,
            activation,
            weights,
            bias: vec![0.0; out_dim],
            grad_weights: vec![0.0; in_dim * out_dim],
            grad_bias: vec![0.0; out_dim],
            moments_weights: Moments::new(in_dim * out_dim),
            moments_bias: Moments::new(out_dim),
        }
    }

    /// Input dimension
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    /// Output dimension
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Number of trainable parameters
    pub fn num_params(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    /// Forward pass. `input.len()` must equal `in_dim`.
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        debug_assert_eq!(input.len(), self.in_dim);

        self.weights
            .chunks_exact(self.in_dim)
            .zip(&self.bias)
            .map(|(row, b)| {
                let z: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + b;
                self.activation.apply(z)
            })
            .collect()
    }

    /// Backward pass for one sample.
    ///
    /// `output` is the activation output produced by `forward(input)` and
    /// `grad_output` is dL/d(output). Parameter gradients are overwritten.
    /// Returns dL/d(input) when `input_grad` is set, an empty vector otherwise.
    pub fn backward(
        &mut self,
        input: &[f32],
        output: &[f32],
        grad_output: &[f32],
        input_grad: bool,
    ) -> Vec<f32> {
        let delta: Vec<f32> = output
            .iter()
            .zip(grad_output)
            .map(|(&y, &g)| g * self.activation.derivative(y))
            .collect();

        let mut grad_input = if input_grad {
            vec![0.0; self.in_dim]
        } else {
            Vec::new()
        };

        for o in 0..self.out_dim {
            let d = delta[o];
            self.grad_bias[o] = d;

            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                self.grad_weights[row + i] = d * input[i];
            }

            if input_grad && d != 0.0 {
                for i in 0..self.in_dim {
                    grad_input[i] += self.weights[row + i] * d;
                }
            }
        }

        grad_input
    }

    /// Apply the gradients from the last `backward` call
    pub fn apply_gradients(&mut self, optimizer: &AdamW) {
        optimizer.apply(&mut self.weights, &self.grad_weights, &mut self.moments_weights);
        optimizer.apply(&mut self.bias, &self.grad_bias, &mut self.moments_bias);
    }

    #[cfg(test)]
    pub(crate) fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    #[cfg(test)]
    pub(crate) fn grad_weights(&self) -> &[f32] {
        &self.grad_weights
    }
}
