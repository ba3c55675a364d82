//! Compression settings, passed explicitly to the encoder and decoder.

use crate::fit::FitStrategy;
use crate::{PifsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest grid edge accepted for encoding or decoding.
pub const MAX_DIMENSION: usize = 1 << 14;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PifsConfig {
    pub range_block_size: usize,
    pub domain_block_size: usize,
    pub use_simple_fit: bool,
    pub decode_iterations: usize,
    /// Image channel to compress (0 = red .. 3 = alpha).
    pub channel: usize,
    /// Seed for the random grid decoding starts from.
    pub seed: u64,
}

impl Default for PifsConfig {
    fn default() -> Self {
        Self {
            range_block_size: 4,
            domain_block_size: 8,
            use_simple_fit: false,
            decode_iterations: 8,
            channel: 0,
            seed: 0,
        }
    }
}

impl PifsConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn fit_strategy(&self) -> FitStrategy {
        if self.use_simple_fit {
            FitStrategy::Simple
        } else {
            FitStrategy::LeastSquares
        }
    }

    /// Check block sizes. Domain blocks are downsampled exactly once, so they
    /// must be twice the range size.
    pub fn validate(&self) -> Result<()> {
        if self.range_block_size == 0 || self.range_block_size > MAX_DIMENSION {
            return Err(PifsError::Config(format!(
                "range block size must be between 1 and {}, got {}",
                MAX_DIMENSION, self.range_block_size
            )));
        }
        let expected = self.range_block_size * 2;
        if self.domain_block_size != expected {
            return Err(PifsError::Config(format!(
                "domain block size must be twice the range block size ({}), got {}",
                expected, self.domain_block_size
            )));
        }
        if self.channel > 3 {
            return Err(PifsError::Config(format!("channel must be 0-3, got {}", self.channel)));
        }
        Ok(())
    }

    /// Check that a grid of `dimension` tiles evenly into domain (and so range) blocks.
    pub fn validate_grid(&self, dimension: usize) -> Result<()> {
        if dimension > MAX_DIMENSION {
            return Err(PifsError::Config(format!(
                "grid dimension {} exceeds the maximum of {}",
                dimension, MAX_DIMENSION
            )));
        }
        let size = self.domain_block_size;
        if size == 0 || dimension == 0 || dimension % size != 0 {
            return Err(PifsError::Config(format!(
                "grid dimension {} is not a positive multiple of the domain block size {}",
                dimension, self.domain_block_size
            )));
        }
        Ok(())
    }
}
