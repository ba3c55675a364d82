//! Square grids of intensity samples, the working surface of encoder and decoder.

use crate::{PifsError, Result};
use image::{DynamicImage, GrayImage, Luma};
use ndarray::{s, Array2, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Anchor of a block inside a grid. `x` indexes the first axis (rows of the
/// image), `y` the second (columns).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// N×N matrix of samples, nominally in [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct SampleGrid {
    data: Array2<f32>,
}

impl SampleGrid {
    pub fn new(dimension: usize) -> Self {
        Self::filled(dimension, 0.0)
    }

    pub fn filled(dimension: usize, value: f32) -> Self {
        Self { data: Array2::from_elem((dimension, dimension), value) }
    }

    pub fn from_fn(dimension: usize, f: impl FnMut((usize, usize)) -> f32) -> Self {
        Self { data: Array2::from_shape_fn((dimension, dimension), f) }
    }

    /// Uniform samples in [0, 1), the default decoder seed.
    pub fn random(dimension: usize, rng: &mut impl Rng) -> Self {
        Self::from_fn(dimension, |_| rng.random::<f32>())
    }

    pub fn from_array(data: Array2<f32>) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows != cols {
            return Err(PifsError::Config(format!(
                "sample grid must be square, got {}x{}",
                rows, cols
            )));
        }
        Ok(Self { data })
    }

    /// Take one channel (0 = red .. 3 = alpha) of a square image, scaled to [0, 1].
    pub fn from_image(image: &DynamicImage, channel: usize) -> Result<Self> {
        if channel > 3 {
            return Err(PifsError::Config(format!("channel must be 0-3, got {}", channel)));
        }
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width != height {
            return Err(PifsError::Config(format!(
                "image must be square, got {}x{}",
                width, height
            )));
        }
        let data = Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
            rgba.get_pixel(col as u32, row as u32).0[channel] as f32 / 255.0
        });
        Ok(Self { data })
    }

    pub fn to_luma8(&self) -> GrayImage {
        let dim = self.dimension() as u32;
        GrayImage::from_fn(dim, dim, |col, row| {
            let v = self.data[[row as usize, col as usize]].clamp(0.0, 1.0);
            Luma([(v * 255.0).round() as u8])
        })
    }

    pub fn dimension(&self) -> usize {
        self.data.nrows()
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[[x, y]]
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    pub fn into_array(self) -> Array2<f32> {
        self.data
    }

    /// Owned copy of the `size`×`size` region starting at `origin`.
    pub fn extract(&self, origin: Position, size: usize) -> Result<SampleGrid> {
        self.check_bounds(origin, size)?;
        let region = self.data.slice(s![origin.x..origin.x + size, origin.y..origin.y + size]);
        Ok(Self { data: region.to_owned() })
    }

    /// Overwrite the square region at `origin` with `samples`.
    pub fn write(&mut self, origin: Position, samples: ArrayView2<'_, f32>) -> Result<()> {
        let (rows, cols) = samples.dim();
        if rows != cols {
            return Err(PifsError::Config(format!("block must be square, got {}x{}", rows, cols)));
        }
        self.check_bounds(origin, rows)?;
        self.data
            .slice_mut(s![origin.x..origin.x + rows, origin.y..origin.y + rows])
            .assign(&samples);
        Ok(())
    }

    /// Mean squared error against another grid of the same dimension.
    pub fn mse(&self, other: &SampleGrid) -> Result<f32> {
        if self.dimension() != other.dimension() {
            return Err(PifsError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }
        if self.data.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| ((a - b) as f64).powi(2))
            .sum();
        Ok((sum / self.data.len() as f64) as f32)
    }

    fn check_bounds(&self, origin: Position, size: usize) -> Result<()> {
        let dimension = self.dimension();
        let fits = |start: usize| start.checked_add(size).is_some_and(|end| end <= dimension);
        if fits(origin.x) && fits(origin.y) {
            Ok(())
        } else {
            Err(PifsError::OutOfBounds { origin, size, dimension })
        }
    }
}
