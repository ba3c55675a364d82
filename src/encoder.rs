//! Exhaustive range/domain block search.

use crate::block::{self, Block};
use crate::fit::{self, Fit, FitStrategy};
use crate::grid::{Position, SampleGrid};
use crate::record::{Compressed, TransformRecord};
use crate::{PifsConfig, PifsError, Result};
use log::{debug, info};

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

/// Flip modes tried for each domain position (none, vertical).
pub const DOMAIN_FLIPS: u8 = 2;
/// Rotation counts tried for each domain position (0-2 quarter turns).
pub const DOMAIN_ROTATIONS: u8 = 3;

/// Best candidate found for one range block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Index into the candidate list.
    pub index: usize,
    pub fit: Fit,
    pub error: f32,
}

pub struct Encoder {
    config: PifsConfig,
}

impl Encoder {
    pub fn new(config: PifsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PifsConfig {
        &self.config
    }

    /// Non-overlapping range blocks in canonical order.
    pub fn range_blocks(&self, grid: &SampleGrid) -> Result<Vec<Block>> {
        block::partition(grid, self.config.range_block_size)
    }

    /// Every domain tile, downsampled to range size, in each flip/rotation variant.
    /// Candidates are ordered by position, then flip, then rotation.
    pub fn domain_candidates(&self, grid: &SampleGrid) -> Result<Vec<Block>> {
        let size = self.config.domain_block_size;
        let per_axis = grid.dimension() / size;
        let mut candidates =
            Vec::with_capacity(per_axis * per_axis * (DOMAIN_FLIPS * DOMAIN_ROTATIONS) as usize);

        for i in 0..per_axis {
            for j in 0..per_axis {
                let mut reduced = Block::cut(grid, Position::new(i * size, j * size), size)?;
                reduced.downsample();
                for flip in 0..DOMAIN_FLIPS {
                    for rotation in 0..DOMAIN_ROTATIONS {
                        let mut variant = reduced.clone();
                        variant.flip(flip);
                        variant.rotate(rotation);
                        candidates.push(variant);
                    }
                }
            }
        }
        Ok(candidates)
    }

    /// Score every candidate against `range` and keep the first one with the
    /// lowest error. Returns `None` only when there are no candidates.
    pub fn best_match(&self, range: &Block, candidates: &[Block]) -> Option<Match> {
        if candidates.is_empty() {
            return None;
        }
        Some(find_best(range, candidates, self.config.fit_strategy()))
    }

    /// Encode `grid` into one record per range block, in partition order.
    pub fn encode(&self, grid: &SampleGrid) -> Result<Vec<TransformRecord>> {
        self.config.validate_grid(grid.dimension())?;

        let mut ranges = self.range_blocks(grid)?;
        info!("partitioned {0}x{0} grid into {1} range blocks", grid.dimension(), ranges.len());

        let candidates = self.domain_candidates(grid)?;
        info!("generated {} domain candidates", candidates.len());
        if candidates.is_empty() {
            return Err(PifsError::Config(format!(
                "{0}x{0} grid holds no domain block of size {1}",
                grid.dimension(),
                self.config.domain_block_size
            )));
        }

        let strategy = self.config.fit_strategy();

        #[cfg(not(target_arch = "wasm32"))]
        let matches: Vec<Match> =
            ranges.par_iter().map(|range| find_best(range, &candidates, strategy)).collect();
        #[cfg(target_arch = "wasm32")]
        let matches: Vec<Match> =
            ranges.iter().map(|range| find_best(range, &candidates, strategy)).collect();

        let mut records = Vec::with_capacity(ranges.len());
        let mut total_error = 0f64;
        for (range, found) in ranges.iter_mut().zip(matches) {
            let domain = &candidates[found.index];
            range.set_link(found.index);
            range.set_transform(TransformRecord {
                source: domain.pos(),
                flip: domain.transform().flip,
                rotation: domain.transform().rotation,
                contrast: found.fit.contrast,
                brightness: found.fit.brightness,
            });
            total_error += found.error as f64;
            records.push(*range.transform());
        }

        info!("matched {} range blocks", records.len());
        debug!("total squared error {:.6}", total_error);
        Ok(records)
    }

    pub fn compress(&self, grid: &SampleGrid) -> Result<Compressed> {
        let records = self.encode(grid)?;
        Ok(Compressed::new(grid.dimension(), &self.config, records))
    }
}

// `candidates` must be non-empty.
fn find_best(range: &Block, candidates: &[Block], strategy: FitStrategy) -> Match {
    let mut best = Match {
        index: 0,
        fit: range.fit_affine(&candidates[0], strategy),
        error: f32::INFINITY,
    };
    for (index, domain) in candidates.iter().enumerate() {
        let fit = range.fit_affine(domain, strategy);
        let error = fit::fitted_error(range.samples(), domain.samples(), fit);
        if error < best.error {
            best = Match { index, fit, error };
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PifsError;

    fn checkerboard(dimension: usize, cell: usize) -> SampleGrid {
        SampleGrid::from_fn(dimension, |(x, y)| ((x / cell + y / cell) % 2) as f32)
    }

    #[test]
    fn rejects_invalid_config() {
        let config = PifsConfig { domain_block_size: 12, ..Default::default() };
        assert!(matches!(Encoder::new(config), Err(PifsError::Config(_))));
    }

    #[test]
    fn rejects_grid_not_divisible_by_domain() {
        let encoder = Encoder::new(PifsConfig::default()).unwrap();
        assert!(matches!(encoder.encode(&SampleGrid::new(12)), Err(PifsError::Config(_))));
    }

    #[test]
    fn empty_candidate_list_has_no_match() {
        let encoder = Encoder::new(PifsConfig::default()).unwrap();
        let grid = SampleGrid::filled(8, 0.5);
        let ranges = encoder.range_blocks(&grid).unwrap();
        assert_eq!(encoder.best_match(&ranges[0], &[]), None);
    }

    #[test]
    fn every_range_block_gets_a_record() {
        let encoder = Encoder::new(PifsConfig::default()).unwrap();
        let grid = checkerboard(16, 2);
        let ranges = encoder.range_blocks(&grid).unwrap();
        let records = encoder.encode(&grid).unwrap();
        assert_eq!(records.len(), ranges.len());
    }

    #[test]
    fn six_variants_per_domain_position() {
        let encoder = Encoder::new(PifsConfig::default()).unwrap();
        let candidates = encoder.domain_candidates(&checkerboard(16, 2)).unwrap();
        assert_eq!(candidates.len(), 4 * 6);
        assert!(candidates.iter().all(|c| c.size() == 4));

        let variants: Vec<_> = candidates[..6]
            .iter()
            .map(|c| (c.transform().flip, c.transform().rotation))
            .collect();
        assert_eq!(variants, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        assert!(candidates[..6].iter().all(|c| c.pos() == Position::new(0, 0)));
        assert_eq!(candidates[6].pos(), Position::new(0, 8));
    }

    #[test]
    fn record_count_matches_range_partition() {
        let encoder = Encoder::new(PifsConfig::default()).unwrap();
        for dimension in [8, 16, 24] {
            let records = encoder.encode(&checkerboard(dimension, 3)).unwrap();
            assert_eq!(records.len(), (dimension / 4).pow(2));
        }
    }

    #[test]
    fn uniform_grid_matches_exactly() {
        let encoder = Encoder::new(PifsConfig::default()).unwrap();
        let records = encoder.encode(&SampleGrid::filled(8, 0.5)).unwrap();
        assert_eq!(records.len(), 4);
        for record in records {
            assert_eq!(record.source, Position::new(0, 0));
            assert!(record.contrast.abs() < 1e-6);
            assert!((record.brightness - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn ties_keep_first_candidate() {
        let encoder = Encoder::new(PifsConfig::default()).unwrap();
        let grid = SampleGrid::filled(16, 0.25);
        let candidates = encoder.domain_candidates(&grid).unwrap();
        let ranges = encoder.range_blocks(&grid).unwrap();
        let found = encoder.best_match(&ranges[5], &candidates).unwrap();
        assert_eq!(found.index, 0);
        assert!(found.error < 1e-10);
    }

    #[test]
    fn linear_ramp_is_reproduced_exactly() {
        // Every block of a linear ramp is an affine image of the reduced ramp.
        let encoder = Encoder::new(PifsConfig::default()).unwrap();
        let grid = SampleGrid::from_fn(8, |(x, y)| (x * 8 + y) as f32 / 64.0);
        let candidates = encoder.domain_candidates(&grid).unwrap();
        for range in encoder.range_blocks(&grid).unwrap() {
            let found = encoder.best_match(&range, &candidates).unwrap();
            assert!(found.error < 1e-8, "error {}", found.error);
        }
    }

    #[test]
    fn simple_fit_uses_fixed_contrast() {
        let config = PifsConfig { use_simple_fit: true, ..Default::default() };
        let encoder = Encoder::new(config).unwrap();
        let records = encoder.encode(&checkerboard(16, 8)).unwrap();
        assert!(records.iter().all(|r| r.contrast == fit::SIMPLE_CONTRAST));
    }

    #[test]
    fn encode_is_deterministic() {
        let encoder = Encoder::new(PifsConfig::default()).unwrap();
        let grid = SampleGrid::from_fn(16, |(x, y)| ((x * 7 + y * 3) % 11) as f32 / 10.0);
        assert_eq!(encoder.encode(&grid).unwrap(), encoder.encode(&grid).unwrap());
    }
}
