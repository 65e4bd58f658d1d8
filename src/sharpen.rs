//! Contains the unsharp mask applied before quantization.

use crate::{clamp_to_u8, Error, PixelBuffer};
use palette::Srgba;
#[cfg(feature = "threads")]
use rayon::prelude::*;
use std::array;

/// A single pass unsharp mask that adds the difference between each pixel and the
/// average of its four direct neighbors back onto the pixel.
///
/// Neighbors past the image border are clamped to the nearest edge pixel.
/// Only the red, green, and blue channels are affected; alpha is copied as is.
///
/// # Examples
/// ```
/// # use pixiart::{PixelBuffer, Sharpen};
/// # fn main() -> Result<(), pixiart::Error> {
/// let buffer = PixelBuffer::from_raw(3, 1, vec![0, 0, 0, 255, 100, 100, 100, 255, 0, 0, 0, 255])?;
/// let sharpened = Sharpen::from_percent(25)?.apply(&buffer);
/// assert_eq!(sharpened.as_arrays()[1], [150, 150, 150, 255]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpen(f64);

impl Sharpen {
    /// The multiplier applied on top of the amount.
    ///
    /// With it, the `0.0..=1.0` amount range maps to visibly different results.
    pub const GAIN: f64 = 4.0;

    /// The default amount.
    pub const DEFAULT_AMOUNT: f64 = 0.5;

    /// An amount of `0.0`, which leaves images unchanged.
    pub const NONE: Self = Self(0.0);

    /// Creates a new [`Sharpen`] with the default amount.
    #[must_use]
    pub const fn new() -> Self {
        Self(Self::DEFAULT_AMOUNT)
    }

    /// Creates a new [`Sharpen`] with the given amount.
    ///
    /// This will return `None` if `amount` is not in the range `0.0..=1.0`.
    #[must_use]
    pub fn with_amount(amount: f64) -> Option<Self> {
        if (0.0..=1.0).contains(&amount) {
            Some(Self(amount))
        } else {
            None
        }
    }

    /// Creates a new [`Sharpen`] from a detail percentage in `0..=100`.
    ///
    /// # Errors
    /// Returns [`Error::DetailPercent`] if `percent` is above `100`.
    pub fn from_percent(percent: u8) -> Result<Self, Error> {
        if percent <= 100 {
            Ok(Self(f64::from(percent) / 100.0))
        } else {
            Err(Error::DetailPercent(percent))
        }
    }

    /// Gets the amount for this [`Sharpen`].
    #[must_use]
    pub const fn amount(&self) -> f64 {
        self.0
    }

    /// Returns whether this [`Sharpen`] leaves images unchanged.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_none(&self) -> bool {
        self.0 == 0.0
    }

    /// Returns a sharpened copy of `buffer`.
    ///
    /// Every output pixel is computed from the unmodified input,
    /// so the result does not depend on the order pixels are visited in.
    #[must_use]
    pub fn apply(&self, buffer: &PixelBuffer) -> PixelBuffer {
        if self.is_none() {
            return buffer.clone();
        }

        let (width, height) = buffer.dimensions();
        let source = Source::new(buffer);
        let mut pixels = vec![Srgba::new(0, 0, 0, 0); buffer.pixels().len()];

        for (y, row) in pixels.chunks_exact_mut(width as usize).enumerate() {
            source.sharpen_row(self.0, y, row);
        }

        tracing::trace!(width, height, amount = self.0, "sharpened buffer");

        PixelBuffer::new_unchecked(width, height, pixels)
    }

    /// Returns a sharpened copy of `buffer`, computing rows in parallel.
    ///
    /// The output is identical to [`Sharpen::apply`].
    #[cfg(feature = "threads")]
    #[must_use]
    pub fn apply_par(&self, buffer: &PixelBuffer) -> PixelBuffer {
        if self.is_none() {
            return buffer.clone();
        }

        let (width, height) = buffer.dimensions();
        let source = Source::new(buffer);
        let mut pixels = vec![Srgba::new(0, 0, 0, 0); buffer.pixels().len()];

        pixels
            .par_chunks_exact_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| source.sharpen_row(self.0, y, row));

        tracing::trace!(width, height, amount = self.0, "sharpened buffer");

        PixelBuffer::new_unchecked(width, height, pixels)
    }
}

impl Default for Sharpen {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<f64> for Sharpen {
    type Error = Error;

    fn try_from(amount: f64) -> Result<Self, Self::Error> {
        Self::with_amount(amount).ok_or(Error::DetailAmount(amount))
    }
}

/// The read-only input of a sharpen pass.
struct Source<'a> {
    /// The input pixels as arrays.
    pixels: &'a [[u8; 4]],
    /// The width of the input.
    width: usize,
    /// The height of the input.
    height: usize,
}

impl<'a> Source<'a> {
    /// Wraps the pixels of `buffer`.
    fn new(buffer: &'a PixelBuffer) -> Self {
        Self {
            pixels: buffer.as_arrays(),
            width: buffer.width() as usize,
            height: buffer.height() as usize,
        }
    }

    /// Writes the sharpened pixels of row `y` into `output`.
    fn sharpen_row(&self, amount: f64, y: usize, output: &mut [Srgba<u8>]) {
        let Self { pixels, width, height } = *self;

        let row = y * width;
        let up = y.saturating_sub(1) * width;
        let down = (y + 1).min(height - 1) * width;

        for (x, out) in output.iter_mut().enumerate() {
            let left = x.saturating_sub(1);
            let right = (x + 1).min(width - 1);

            let center = pixels[row + x];
            let neighbors = [
                pixels[up + x],
                pixels[down + x],
                pixels[row + left],
                pixels[row + right],
            ];

            let [r, g, b] = array::from_fn(|c| {
                let value = f64::from(center[c]);
                let sum = neighbors.iter().map(|n| f64::from(n[c])).sum::<f64>();
                let diff = value - sum * 0.25;
                clamp_to_u8(value + diff * amount * Sharpen::GAIN)
            });

            *out = Srgba::new(r, g, b, center[3]);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn alphas(buffer: &PixelBuffer) -> Vec<u8> {
        buffer.as_arrays().iter().map(|p| p[3]).collect()
    }

    #[test]
    fn zero_amount_is_identity() {
        let buffer = test_data_mixed_alpha();
        assert_eq!(Sharpen::NONE.apply(&buffer), buffer);
        assert_eq!(Sharpen::from_percent(0).unwrap().apply(&buffer), buffer);

        #[cfg(feature = "threads")]
        assert_eq!(Sharpen::NONE.apply_par(&buffer), buffer);
    }

    #[test]
    fn alpha_and_dimensions_preserved() {
        let buffer = test_data_mixed_alpha();
        for percent in [1, 25, 50, 99, 100] {
            let sharpened = Sharpen::from_percent(percent).unwrap().apply(&buffer);
            assert_eq!(sharpened.dimensions(), buffer.dimensions());
            assert_eq!(alphas(&sharpened), alphas(&buffer));
        }
    }

    #[test]
    fn uniform_row_with_translucent_pixel() {
        let buffer = buffer(
            3,
            1,
            &[[100, 100, 100, 255], [100, 100, 100, 255], [100, 100, 100, 64]],
        );
        let sharpened = Sharpen::with_amount(0.5).unwrap().apply(&buffer);
        assert_eq!(
            sharpened.as_arrays(),
            &[[100, 100, 100, 255], [100, 100, 100, 255], [100, 100, 100, 64]]
        );
    }

    #[test]
    fn edge_clamped_neighbors() {
        let buffer = buffer(3, 1, &[[0, 0, 0, 255], [100, 50, 0, 255], [0, 0, 0, 255]]);
        let sharpened = Sharpen::with_amount(0.25).unwrap().apply(&buffer);

        // center: avg = (100 + 100 + 0 + 0) / 4 = 50, 100 + 50 * 0.25 * 4 = 150
        // edges: avg = (0 + 0 + 0 + 100) / 4 = 25, 0 - 25 = -25 => clamped to 0
        assert_eq!(
            sharpened.as_arrays(),
            &[[0, 0, 0, 255], [150, 75, 0, 255], [0, 0, 0, 255]]
        );
    }

    #[test]
    fn vertical_neighbors() {
        let buffer = buffer(1, 3, &[[10, 10, 10, 255], [20, 20, 20, 255], [30, 30, 30, 255]]);
        let sharpened = Sharpen::with_amount(1.0).unwrap().apply(&buffer);

        // top: avg = (10 + 20 + 10 + 10) / 4 = 12.5, 10 - 2.5 * 4 = 0
        // middle: avg = (10 + 30 + 20 + 20) / 4 = 20, unchanged
        // bottom: avg = (20 + 30 + 30 + 30) / 4 = 27.5, 30 + 2.5 * 4 = 40
        assert_eq!(
            sharpened.as_arrays(),
            &[[0, 0, 0, 255], [20, 20, 20, 255], [40, 40, 40, 255]]
        );
    }

    #[test]
    fn single_pixel_unchanged() {
        let buffer = buffer(1, 1, &[[12, 200, 99, 3]]);
        assert_eq!(Sharpen::with_amount(1.0).unwrap().apply(&buffer), buffer);
    }

    #[test]
    fn rounds_half_to_even() {
        // left: avg = 10.25, 10 - 0.25 * 0.5 * 4 = 9.5 => 10
        // right: avg = 10.75, 11 + 0.25 * 0.5 * 4 = 11.5 => 12
        let buffer = buffer(2, 1, &[[10, 10, 10, 255], [11, 11, 11, 255]]);
        let sharpened = Sharpen::with_amount(0.5).unwrap().apply(&buffer);
        assert_eq!(sharpened.as_arrays(), &[[10, 10, 10, 255], [12, 12, 12, 255]]);
    }

    #[test]
    fn output_saturates() {
        let buffer = buffer(3, 1, &[[255, 0, 0, 255], [0, 255, 0, 255], [255, 0, 0, 255]]);
        let sharpened = Sharpen::with_amount(1.0).unwrap().apply(&buffer);
        assert_eq!(
            sharpened.as_arrays(),
            &[[255, 0, 0, 255], [0, 255, 0, 255], [255, 0, 0, 255]]
        );
    }

    #[test]
    fn amount_validation() {
        assert!(Sharpen::with_amount(-0.1).is_none());
        assert!(Sharpen::with_amount(1.1).is_none());
        assert!(Sharpen::with_amount(f64::NAN).is_none());
        assert!(matches!(Sharpen::try_from(2.0), Err(Error::DetailAmount(_))));
        assert!(matches!(Sharpen::from_percent(101), Err(Error::DetailPercent(101))));
        assert!((Sharpen::from_percent(35).unwrap().amount() - 0.35).abs() < f64::EPSILON);
        assert!(Sharpen::from_percent(0).unwrap().is_none());
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let buffer = test_data_mixed_alpha();
        for percent in [10, 60, 100] {
            let sharpen = Sharpen::from_percent(percent).unwrap();
            assert_eq!(sharpen.apply(&buffer), sharpen.apply_par(&buffer));
        }
    }
}
