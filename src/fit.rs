//! Affine intensity fitting between equally sized blocks.
//!
//! A domain block `d` approximates a range block `r` as `contrast * d + brightness`.
//! The functions here work on views and return values; nothing is written back
//! to the blocks, so candidate scoring can run from many threads at once.

use ndarray::ArrayView2;

/// Contrast used by [`FitStrategy::Simple`].
pub const SIMPLE_CONTRAST: f32 = 0.75;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fit {
    pub contrast: f32,
    pub brightness: f32,
}

impl Fit {
    /// Identity mapping, used when the least-squares solution is not finite.
    pub const NEUTRAL: Fit = Fit { contrast: 1.0, brightness: 0.0 };

    pub fn new(contrast: f32, brightness: f32) -> Self {
        Self { contrast, brightness }
    }

    #[inline]
    pub fn apply(&self, sample: f32) -> f32 {
        self.contrast * sample + self.brightness
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FitStrategy {
    /// Fixed contrast, brightness from the mean residual.
    Simple,
    #[default]
    LeastSquares,
}

pub fn fit(strategy: FitStrategy, range: ArrayView2<'_, f32>, domain: ArrayView2<'_, f32>) -> Fit {
    match strategy {
        FitStrategy::Simple => fit_simple(range, domain),
        FitStrategy::LeastSquares => fit_least_squares(range, domain),
    }
}

pub fn fit_simple(range: ArrayView2<'_, f32>, domain: ArrayView2<'_, f32>) -> Fit {
    debug_assert_eq!(range.dim(), domain.dim());
    let n = range.len();
    if n == 0 {
        return Fit::new(SIMPLE_CONTRAST, 0.0);
    }
    let residual: f32 = range
        .iter()
        .zip(domain.iter())
        .map(|(r, d)| r - SIMPLE_CONTRAST * d)
        .sum();
    Fit::new(SIMPLE_CONTRAST, residual / n as f32)
}

/// Closed-form regression of `range ≈ contrast * domain + brightness`.
///
/// A flat domain has no slope to fit; the exact solution there is contrast 0
/// with the range mean as brightness. Any other non-finite outcome falls back
/// to [`Fit::NEUTRAL`].
pub fn fit_least_squares(range: ArrayView2<'_, f32>, domain: ArrayView2<'_, f32>) -> Fit {
    debug_assert_eq!(range.dim(), domain.dim());
    let n = range.len() as f64;
    let (mut sum_xy, mut sum_x, mut sum_y, mut sum_xx) = (0f64, 0f64, 0f64, 0f64);
    for (&y, &x) in range.iter().zip(domain.iter()) {
        let (x, y) = (x as f64, y as f64);
        sum_xy += x * y;
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() <= f64::EPSILON * n * sum_xx {
        log::trace!("flat domain block, fitting range mean");
        let fit = Fit::new(0.0, (sum_y / n) as f32);
        return if fit.brightness.is_finite() { fit } else { Fit::NEUTRAL };
    }

    let contrast = (n * sum_xy - sum_x * sum_y) / denominator;
    let brightness = (sum_y - contrast * sum_x) / n;
    let fit = Fit::new(contrast as f32, brightness as f32);
    if fit.contrast.is_finite() && fit.brightness.is_finite() {
        fit
    } else {
        log::trace!("degenerate least-squares fit, using neutral transform");
        Fit::NEUTRAL
    }
}

/// Sum of squared differences. Lower is better; identical blocks score 0.
pub fn similarity(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> f32 {
    debug_assert_eq!(a.dim(), b.dim());
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Similarity between `range` and `domain` after applying `fit` to the domain,
/// without materialising the adjusted block.
pub fn fitted_error(range: ArrayView2<'_, f32>, domain: ArrayView2<'_, f32>, fit: Fit) -> f32 {
    debug_assert_eq!(range.dim(), domain.dim());
    range
        .iter()
        .zip(domain.iter())
        .map(|(&r, &d)| {
            let diff = r - fit.apply(d);
            diff * diff
        })
        .sum()
}
