//! Square blocks cut from a sample grid, with the geometric operations used to
//! build domain variants and to replay them while decoding.

use crate::fit::{self, Fit, FitStrategy};
use crate::grid::{Position, SampleGrid};
use crate::record::TransformRecord;
use crate::Result;
use ndarray::{s, Array2, ArrayView2};
use std::ops::{Add, Mul};

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pos: Position,
    data: Array2<f32>,
    transform: TransformRecord,
    /// Index of the matched candidate in the encoder's domain list.
    link: Option<usize>,
}

impl Block {
    pub fn new(pos: Position, samples: SampleGrid) -> Self {
        Self::from_array(pos, samples.into_array())
    }

    pub(crate) fn from_array(pos: Position, data: Array2<f32>) -> Self {
        debug_assert_eq!(data.nrows(), data.ncols());
        Self { pos, data, transform: TransformRecord::default(), link: None }
    }

    /// Cut a `size`×`size` block out of `grid`.
    pub fn cut(grid: &SampleGrid, pos: Position, size: usize) -> Result<Self> {
        Ok(Self::new(pos, grid.extract(pos, size)?))
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    /// Edge length of the current samples.
    pub fn size(&self) -> usize {
        self.data.nrows()
    }

    pub fn samples(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    pub fn transform(&self) -> &TransformRecord {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: TransformRecord) {
        self.transform = transform;
    }

    pub fn link(&self) -> Option<usize> {
        self.link
    }

    pub fn set_link(&mut self, link: usize) {
        self.link = Some(link);
    }

    pub fn similarity(&self, other: &Block) -> f32 {
        fit::similarity(self.samples(), other.samples())
    }

    /// Coefficients mapping `target` onto this block.
    pub fn fit_affine(&self, target: &Block, strategy: FitStrategy) -> Fit {
        fit::fit(strategy, self.samples(), target.samples())
    }

    pub fn apply_fit(&self, fit: Fit) -> Block {
        self * fit.contrast + fit.brightness
    }

    /// Rotate 90° counter-clockwise `times` times.
    ///
    /// The transform keeps the largest count seen across calls, not the sum;
    /// stored records depend on this.
    pub fn rotate(&mut self, times: u8) {
        self.transform.rotation = self.transform.rotation.max(times);
        for _ in 0..times {
            self.data = self.data.t().slice(s![..;-1, ..]).to_owned();
        }
    }

    /// 1 mirrors top to bottom, 2 left to right; anything else is ignored.
    pub fn flip(&mut self, mode: u8) {
        let flipped = match mode {
            1 => self.data.slice(s![..;-1, ..]).to_owned(),
            2 => self.data.slice(s![.., ..;-1]).to_owned(),
            _ => return,
        };
        self.transform.flip = mode;
        self.data = flipped;
    }

    /// Average each 2×2 cell into one sample. An odd trailing row/column is dropped.
    pub fn downsample(&mut self) {
        let half = self.size() / 2;
        let d = &self.data;
        self.data = Array2::from_shape_fn((half, half), |(i, j)| {
            let (r, c) = (2 * i, 2 * j);
            0.25 * (d[[r, c]] + d[[r + 1, c]] + d[[r, c + 1]] + d[[r + 1, c + 1]])
        });
    }

    /// Nearest-neighbour expansion of each sample into a 2×2 cell.
    pub fn upsample(&mut self) {
        let double = self.size() * 2;
        let d = &self.data;
        self.data = Array2::from_shape_fn((double, double), |(i, j)| d[[i / 2, j / 2]]);
    }

    /// Replace the samples with a domain-sized region and replay this block's
    /// transform on it: flip, rotate, contrast/brightness, then downsample.
    pub fn apply_reconstruction(&mut self, source: Array2<f32>) {
        self.data = source;
        self.flip(self.transform.flip);
        self.rotate(self.transform.rotation);
        let fit = Fit::new(self.transform.contrast, self.transform.brightness);
        self.data.mapv_inplace(|v| fit.apply(v));
        self.downsample();
    }
}

impl Mul<f32> for &Block {
    type Output = Block;

    fn mul(self, factor: f32) -> Block {
        Block {
            pos: self.pos,
            data: &self.data * factor,
            transform: self.transform,
            link: self.link,
        }
    }
}

impl Add<f32> for Block {
    type Output = Block;

    fn add(mut self, offset: f32) -> Block {
        self.data += offset;
        self
    }
}

/// Tile `grid` into non-overlapping `size`×`size` blocks, outer loop over the
/// first axis. Every encode and decode pass enumerates range blocks this way.
pub fn partition(grid: &SampleGrid, size: usize) -> Result<Vec<Block>> {
    let count = grid.dimension() / size;
    let mut blocks = Vec::with_capacity(count * count);
    for i in 0..count {
        for j in 0..count {
            blocks.push(Block::cut(grid, Position::new(i * size, j * size), size)?);
        }
    }
    Ok(blocks)
}
