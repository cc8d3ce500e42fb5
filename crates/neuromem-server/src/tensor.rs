//! Tensor wire type

use serde::{Deserialize, Serialize};

use crate::{Result, ServerError};

/// Largest element count accepted from a client
pub const MAX_ELEMENTS: usize = 1 << 24;

/// Flat tensor as sent over the wire
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetTensor {
    /// Dimensions
    pub shape: Vec<i64>,
    /// Row-major elements
    #[serde(default)]
    pub data: Vec<f32>,
}

impl NetTensor {
    /// Fit `data` to the element count declared by `shape`.
    ///
    /// Any non-positive dimension clears both fields. Otherwise `data` is
    /// zero-padded or truncated to the product of `shape` (an empty shape is
    /// a scalar). Fails only if the declared count exceeds [`MAX_ELEMENTS`].
    pub fn normalize(mut self) -> Result<Self> {
        if self.shape.iter().any(|&dim| dim <= 0) {
            self.shape.clear();
            self.data.clear();
            return Ok(self);
        }

        let expected = self
            .shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim as usize))
            .filter(|&n| n <= MAX_ELEMENTS)
            .ok_or_else(|| {
                ServerError::InvalidInput(format!(
                    "tensor shape {:?} exceeds {} elements",
                    self.shape, MAX_ELEMENTS
                ))
            })?;

        self.data.resize(expected, 0.0);
        Ok(self)
    }

    /// One-dimensional tensor holding byte values
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            shape: vec![bytes.len() as i64],
            data: bytes.iter().map(|&b| b as f32).collect(),
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tensor has no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
