//! Learned reconstruction codecs
//!
//! This crate provides the codec half of the neural memory cache:
//! - The [`Codec`] contract (encode / decode / train)
//! - A dense autoencoder trained online with AdamW
//! - A passthrough codec for exact storage
//! - Running training statistics

mod autoencoder;
mod error;
mod layer;
mod optimizer;
mod passthrough;
mod stats;
mod traits;

pub use autoencoder::{AutoencoderCodec, AutoencoderConfig};
pub use error::{CodecError, Result};
pub use layer::{Activation, Dense};
pub use optimizer::{AdamW, Moments, OptimizerConfig};
pub use passthrough::PassthroughCodec;
pub use stats::TrainingStats;
pub use traits::{mean_squared_error, Codec};

/// Codec choice for configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    /// Dense autoencoder (lossy, trained on every store)
    #[default]
    Autoencoder,
    /// Identity codec (exact)
    Passthrough,
}

/// Build a boxed codec of the given kind
pub fn build_codec(kind: CodecKind, config: AutoencoderConfig) -> Result<Box<dyn Codec>> {
    match kind {
        CodecKind::Autoencoder => Ok(Box::new(AutoencoderCodec::new(config)?)),
        CodecKind::Passthrough => {
            config.validate()?;
            Ok(Box::new(PassthroughCodec::new(config.input_size)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_codec() {
        let config = AutoencoderConfig {
            input_size: 8,
            encoding_size: 4,
            hidden_size: 8,
            seed: Some(1),
            ..Default::default()
        };

        let codec = build_codec(CodecKind::Passthrough, config.clone()).unwrap();
        assert_eq!(codec.encoding_size(), 8);

        let codec = build_codec(CodecKind::Autoencoder, config).unwrap();
        assert_eq!(codec.encoding_size(), 4);
        assert_eq!(codec.encode(&[0.5; 8]).unwrap().len(), 4);
    }

    #[test]
    fn test_codec_kind_serde() {
        let kind: CodecKind = serde_json::from_str("\"passthrough\"").unwrap();
        assert_eq!(kind, CodecKind::Passthrough);
        assert_eq!(CodecKind::default(), CodecKind::Autoencoder);
    }
}
