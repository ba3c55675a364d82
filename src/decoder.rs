//! Iterated reconstruction from transform records.

use crate::block::{self, Block};
use crate::grid::SampleGrid;
use crate::record::TransformRecord;
use crate::{PifsConfig, PifsError, Result};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct Decoder {
    config: PifsConfig,
}

impl Decoder {
    pub fn new(config: PifsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PifsConfig {
        &self.config
    }

    /// Grid dimension implied by a record count: records form a square of range blocks.
    pub fn dimension_for(&self, record_count: usize) -> Result<usize> {
        let side = (record_count as f64).sqrt().round() as usize;
        if record_count == 0 || side.checked_mul(side) != Some(record_count) {
            return Err(PifsError::InvalidRecord {
                index: record_count,
                reason: format!(
                    "{} records do not form a square grid of range blocks",
                    record_count
                ),
            });
        }
        let dimension = side.checked_mul(self.config.range_block_size).ok_or_else(|| {
            PifsError::Config(format!(
                "{} range blocks of size {} per axis overflow the grid dimension",
                side, self.config.range_block_size
            ))
        })?;
        self.config.validate_grid(dimension)?;
        Ok(dimension)
    }

    /// Decode from a uniform random grid seeded with the configured seed.
    pub fn decode(&self, records: &[TransformRecord]) -> Result<SampleGrid> {
        let dimension = self.dimension_for(records.len())?;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.decode_from(records, SampleGrid::random(dimension, &mut rng))
    }

    /// Run the configured number of iterations starting from `seed`.
    pub fn decode_from(&self, records: &[TransformRecord], seed: SampleGrid) -> Result<SampleGrid> {
        let mut grid = seed;
        let mut blocks = self.prepare(records, &grid)?;
        info!(
            "decoding {0}x{0} grid from {1} records, {2} iterations",
            grid.dimension(),
            records.len(),
            self.config.decode_iterations
        );
        for iteration in 0..self.config.decode_iterations {
            self.pass(&mut blocks, &mut grid)?;
            debug!("finished iteration {}", iteration + 1);
        }
        Ok(grid)
    }

    /// Apply every record once, updating `grid` in place.
    pub fn iterate(&self, records: &[TransformRecord], grid: &mut SampleGrid) -> Result<()> {
        let mut blocks = self.prepare(records, grid)?;
        self.pass(&mut blocks, grid)
    }

    fn prepare(&self, records: &[TransformRecord], grid: &SampleGrid) -> Result<Vec<Block>> {
        let dimension = self.dimension_for(records.len())?;
        if grid.dimension() != dimension {
            return Err(PifsError::DimensionMismatch {
                expected: dimension,
                actual: grid.dimension(),
            });
        }

        let mut blocks = block::partition(grid, self.config.range_block_size)?;
        for (index, (block, record)) in blocks.iter_mut().zip(records).enumerate() {
            validate_record(index, record)?;
            trace!(
                "record {}: flip={}, rot={}, c={}, b={}",
                index,
                record.flip,
                record.rotation,
                record.contrast,
                record.brightness
            );
            block.set_transform(*record);
        }
        Ok(blocks)
    }

    // Blocks later in the pass read regions that earlier blocks already rewrote.
    fn pass(&self, blocks: &mut [Block], grid: &mut SampleGrid) -> Result<()> {
        let domain_size = self.config.domain_block_size;
        for block in blocks.iter_mut() {
            let source = grid.extract(block.transform().source, domain_size)?;
            block.apply_reconstruction(source.into_array());
            grid.write(block.pos(), block.samples())?;
        }
        Ok(())
    }
}

fn validate_record(index: usize, record: &TransformRecord) -> Result<()> {
    if record.flip > 2 {
        let reason = format!("flip {} is not 0, 1 or 2", record.flip);
        return Err(PifsError::InvalidRecord { index, reason });
    }
    if record.rotation > 3 {
        let reason = format!("rotation {} exceeds 3", record.rotation);
        return Err(PifsError::InvalidRecord { index, reason });
    }
    Ok(())
}
