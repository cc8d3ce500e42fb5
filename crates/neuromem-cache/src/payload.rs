//! Payloads and the byte <-> buffer conversion

use crate::{CacheError, Result};
use serde::{Deserialize, Serialize};

/// Largest value a byte element can take
pub const BYTE_SCALE: f32 = 255.0;

/// A value accepted by the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    /// UTF-8 text, stored as its bytes
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Numeric buffer whose elements are byte values in `[0, 255]`
    Buffer(Vec<f32>),
}

impl Payload {
    /// Number of byte elements before fitting
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Bytes(bytes) => bytes.len(),
            Payload::Buffer(values) => values.len(),
        }
    }

    /// Whether the payload has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<Vec<f32>> for Payload {
    fn from(values: Vec<f32>) -> Self {
        Payload::Buffer(values)
    }
}

/// Scale a payload to `[0, 1]` and fit it to `size` elements.
///
/// Shorter inputs are right-padded with zeros, longer inputs are truncated.
pub fn preprocess(payload: &Payload, size: usize) -> Result<Vec<f32>> {
    let mut buffer: Vec<f32> = match payload {
        Payload::Text(text) => scale_bytes(text.as_bytes(), size),
        Payload::Bytes(bytes) => scale_bytes(bytes, size),
        Payload::Buffer(values) => {
            if let Some((idx, value)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0 || **v > BYTE_SCALE)
            {
                return Err(CacheError::InvalidInput(format!(
                    "element {} = {} is not a byte value",
                    idx, value
                )));
            }
            values.iter().take(size).map(|v| v / BYTE_SCALE).collect()
        }
    };

    buffer.resize(size, 0.0);
    Ok(buffer)
}

fn scale_bytes(bytes: &[u8], size: usize) -> Vec<f32> {
    bytes
        .iter()
        .take(size)
        .map(|&b| b as f32 / BYTE_SCALE)
        .collect()
}

/// Inverse of [`preprocess`]: scale back to bytes.
pub fn postprocess(buffer: &[f32]) -> Vec<u8> {
    buffer
        .iter()
        .map(|v| (v * BYTE_SCALE).round().clamp(0.0, BYTE_SCALE) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_are_scaled_and_padded() {
        let buffer = preprocess(&Payload::from(vec![0u8, 255, 51]), 5).unwrap();
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer[0], 0.0);
        assert_eq!(buffer[1], 1.0);
        assert!((buffer[2] - 0.2).abs() < 1e-6);
        assert_eq!(&buffer[3..], &[0.0, 0.0]);
    }

    #[test]
    fn test_truncates_long_input() {
        let bytes: Vec<u8> = (0..10).collect();
        let buffer = preprocess(&Payload::from(bytes), 4).unwrap();
        assert_eq!(postprocess(&buffer), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_exact_length_passes_through() {
        let buffer = preprocess(&Payload::from(vec![10u8, 20, 30]), 3).unwrap();
        assert_eq!(postprocess(&buffer), vec![10, 20, 30]);
    }

    #[test]
    fn test_text_uses_utf8_bytes() {
        let buffer = preprocess(&Payload::from("hé"), 4).unwrap();
        assert_eq!(postprocess(&buffer), vec![b'h', 0xC3, 0xA9, 0]);
    }

    #[test]
    fn test_numeric_buffer() {
        let buffer = preprocess(&Payload::from(vec![0.0f32, 127.5, 255.0]), 3).unwrap();
        assert_eq!(buffer, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_numeric_buffer_rejects_non_bytes() {
        for bad in [f32::NAN, f32::INFINITY, -1.0, 256.0] {
            let result = preprocess(&Payload::from(vec![1.0, bad]), 4);
            assert!(matches!(result, Err(CacheError::InvalidInput(_))), "{}", bad);
        }
    }

    #[test]
    fn test_postprocess_rounds_and_clamps() {
        assert_eq!(postprocess(&[0.0, 0.5, 1.0, 1.5, -0.2]), vec![0, 128, 255, 255, 0]);
        assert_eq!(postprocess(&[2.9999 / 255.0]), vec![3]);
    }

    #[test]
    fn test_payload_len() {
        assert_eq!(Payload::from("abc").len(), 3);
        assert!(Payload::Bytes(vec![]).is_empty());
    }
}
