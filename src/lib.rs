//! Fractal (PIFS) image compression.
//!
//! An image is encoded as one affine self-similarity mapping per range block:
//! which downsampled domain block to copy, how to flip and rotate it, and the
//! contrast/brightness to apply. Decoding iterates those mappings on any seed
//! grid until it settles near the original.

pub mod block;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod fit;
pub mod grid;
pub mod record;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use block::Block;
pub use config::PifsConfig;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use fit::{Fit, FitStrategy};
pub use grid::{Position, SampleGrid};
pub use record::{Compressed, TransformRecord};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PifsError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(
        "Bounds error: block of size {size} at ({}, {}) exceeds grid of dimension {dimension}",
        .origin.x,
        .origin.y
    )]
    OutOfBounds {
        origin: Position,
        size: usize,
        dimension: usize,
    },
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid transform record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, PifsError>;

/// Compresses images into transform records and reconstructs them again.
#[derive(Clone, Debug, Default)]
pub struct Compressor {
    config: PifsConfig,
}

impl Compressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: PifsConfig) -> Self {
        Self { config }
    }

    pub fn with_block_sizes(mut self, range: usize, domain: usize) -> Self {
        self.config.range_block_size = range;
        self.config.domain_block_size = domain;
        self
    }

    pub fn with_simple_fit(mut self, enabled: bool) -> Self {
        self.config.use_simple_fit = enabled;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.config.decode_iterations = iterations;
        self
    }

    pub fn with_channel(mut self, channel: usize) -> Self {
        self.config.channel = channel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn config(&self) -> &PifsConfig {
        &self.config
    }

    /// Compress the configured channel of `image`, which must be square.
    pub fn compress_image(&self, image: &image::DynamicImage) -> Result<Compressed> {
        self.config.validate()?;
        let grid = SampleGrid::from_image(image, self.config.channel)?;
        self.compress(&grid)
    }

    pub fn compress(&self, grid: &SampleGrid) -> Result<Compressed> {
        Encoder::new(self.config.clone())?.compress(grid)
    }

    /// Decode using the block sizes stored in `compressed`; iteration count and
    /// seed come from this compressor's configuration.
    pub fn decompress(&self, compressed: &Compressed) -> Result<SampleGrid> {
        let config = PifsConfig {
            range_block_size: compressed.range_block_size,
            domain_block_size: compressed.domain_block_size,
            ..self.config.clone()
        };
        let decoder = Decoder::new(config)?;
        let dimension = decoder.dimension_for(compressed.records.len())?;
        if dimension != compressed.dimension {
            return Err(PifsError::DimensionMismatch {
                expected: compressed.dimension,
                actual: dimension,
            });
        }
        decoder.decode(&compressed.records)
    }

    pub fn decompress_image(&self, compressed: &Compressed) -> Result<image::GrayImage> {
        Ok(self.decompress(compressed)?.to_luma8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let compressor = Compressor::new()
            .with_block_sizes(8, 16)
            .with_simple_fit(true)
            .with_iterations(3)
            .with_channel(2)
            .with_seed(7);
        let config = compressor.config();
        assert_eq!(config.range_block_size, 8);
        assert_eq!(config.domain_block_size, 16);
        assert!(config.use_simple_fit);
        assert_eq!(config.decode_iterations, 3);
        assert_eq!(config.channel, 2);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn decompress_uses_stored_block_sizes() {
        let grid = SampleGrid::from_fn(16, |(x, y)| ((x / 2 + y / 2) % 2) as f32);
        let compressed = Compressor::new().with_block_sizes(8, 16).compress(&grid).unwrap();
        assert_eq!(compressed.records.len(), 4);

        let restored = Compressor::new().decompress(&compressed).unwrap();
        assert_eq!(restored.dimension(), 16);
    }

    #[test]
    fn decompress_rejects_inconsistent_dimension() {
        let grid = SampleGrid::filled(8, 0.5);
        let mut compressed = Compressor::new().compress(&grid).unwrap();
        compressed.dimension = 16;
        assert!(matches!(
            Compressor::new().decompress(&compressed),
            Err(PifsError::DimensionMismatch { expected: 16, actual: 8 })
        ));
    }

    #[test]
    fn decompress_rejects_hostile_block_sizes() {
        let record = r#"{"source":{"x":0,"y":0},"flip":0,"rotation":0,"contrast":1.0,"brightness":0.0}"#;
        let artifacts = [
            format!(
                r#"{{"dimension":8,"range_block_size":9223372036854775808,"domain_block_size":0,"records":[{}]}}"#,
                record
            ),
            format!(
                r#"{{"dimension":8,"range_block_size":1073741824,"domain_block_size":2147483648,"records":[{0},{0},{0},{0}]}}"#,
                record
            ),
        ];
        for json in &artifacts {
            let compressed = Compressed::from_json(json).unwrap();
            assert!(matches!(Compressor::new().decompress(&compressed), Err(PifsError::Config(_))));
        }
    }

    #[test]
    fn error_messages_are_capitalized() {
        let errors = [
            PifsError::OutOfBounds { origin: Position::new(1, 2), size: 4, dimension: 4 },
            PifsError::DimensionMismatch { expected: 16, actual: 8 },
            PifsError::InvalidRecord { index: 3, reason: "rotation 7".into() },
        ];
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages[0],
            "Bounds error: block of size 4 at (1, 2) exceeds grid of dimension 4"
        );
        assert_eq!(messages[1], "Dimension mismatch: expected 16, got 8");
        assert_eq!(messages[2], "Invalid transform record 3: rotation 7");
    }
}
