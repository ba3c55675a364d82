//! The compressed artifact: one transform record per range block.

use crate::grid::Position;
use crate::{PifsConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mapping for a single range block. Records are stored in the row-major order
/// of the range-block partition, which is how the decoder pairs them back up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    /// Anchor of the domain block in the grid.
    pub source: Position,
    /// 0 = none, 1 = vertical, 2 = horizontal.
    pub flip: u8,
    /// Quarter turns counter-clockwise, 0-3.
    pub rotation: u8,
    pub contrast: f32,
    pub brightness: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Compressed {
    pub dimension: usize,
    pub range_block_size: usize,
    pub domain_block_size: usize,
    pub records: Vec<TransformRecord>,
}

impl Compressed {
    pub fn new(dimension: usize, config: &PifsConfig, records: Vec<TransformRecord>) -> Self {
        Self {
            dimension,
            range_block_size: config.range_block_size,
            domain_block_size: config.domain_block_size,
            records,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer(file, self)?;
        Ok(())
    }

    pub fn read_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
