//! Runs the sharpen and quantize steps in their fixed order.

use crate::{kmeans, PipelineConfig, PixelBuffer, QuantizeOutput};
use rand::Rng;

/// Turns an already downscaled `buffer` into pixel art.
///
/// The buffer is sharpened first and then quantized, so edges are emphasized
/// before colors are merged. The k-means random source is seeded from [`PipelineConfig::seed`].
#[must_use]
pub fn stylize(buffer: &PixelBuffer, config: &PipelineConfig) -> PixelBuffer {
    stylize_with_rng(buffer, config, &mut config.rng())
}

/// Same as [`stylize`], but draws the k-means randomness from `rng`.
#[must_use]
pub fn stylize_with_rng<R: Rng + ?Sized>(
    buffer: &PixelBuffer,
    config: &PipelineConfig,
    rng: &mut R,
) -> PixelBuffer {
    stylize_with_palette(buffer, config, rng).0
}

/// Same as [`stylize_with_rng`], but also returns the palette that was used.
#[must_use]
pub fn stylize_with_palette<R: Rng + ?Sized>(
    buffer: &PixelBuffer,
    config: &PipelineConfig,
    rng: &mut R,
) -> (PixelBuffer, QuantizeOutput) {
    let (width, height) = buffer.dimensions();
    tracing::debug!(
        width,
        height,
        k = config.palette_size.into_inner(),
        amount = config.sharpen.amount(),
        "stylizing buffer"
    );

    let sharpened = config.sharpen.apply(buffer);
    kmeans::quantize_with_palette(&sharpened, config.palette_size, rng)
}

/// Turns an already downscaled `buffer` into pixel art, in parallel.
///
/// The output is identical to [`stylize`].
#[cfg(feature = "threads")]
#[must_use]
pub fn stylize_par(buffer: &PixelBuffer, config: &PipelineConfig) -> PixelBuffer {
    stylize_with_rng_par(buffer, config, &mut config.rng())
}

/// Same as [`stylize_par`], but draws the k-means randomness from `rng`.
#[cfg(feature = "threads")]
#[must_use]
pub fn stylize_with_rng_par<R: Rng + ?Sized>(
    buffer: &PixelBuffer,
    config: &PipelineConfig,
    rng: &mut R,
) -> PixelBuffer {
    stylize_with_palette_par(buffer, config, rng).0
}

/// Same as [`stylize_with_rng_par`], but also returns the palette that was used.
#[cfg(feature = "threads")]
#[must_use]
pub fn stylize_with_palette_par<R: Rng + ?Sized>(
    buffer: &PixelBuffer,
    config: &PipelineConfig,
    rng: &mut R,
) -> (PixelBuffer, QuantizeOutput) {
    let (width, height) = buffer.dimensions();
    tracing::debug!(
        width,
        height,
        k = config.palette_size.into_inner(),
        amount = config.sharpen.amount(),
        "stylizing buffer"
    );

    let sharpened = config.sharpen.apply_par(buffer);
    kmeans::quantize_with_palette_par(&sharpened, config.palette_size, rng)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{tests::*, PaletteSize, Sharpen};

    #[test]
    fn sharpens_before_quantizing() {
        let buffer = test_data_mixed_alpha();
        let config = PipelineConfig::new()
            .palette_size(PaletteSize::new(5).unwrap())
            .sharpen(Sharpen::from_percent(70).unwrap())
            .seed(13);

        let expected = kmeans::quantize(
            &config.sharpen.apply(&buffer),
            config.palette_size,
            &mut rng(13),
        );
        assert_eq!(stylize(&buffer, &config), expected);

        let swapped = config.sharpen.apply(&kmeans::quantize(
            &buffer,
            config.palette_size,
            &mut rng(13),
        ));
        assert_ne!(stylize(&buffer, &config), swapped);
    }

    #[test]
    fn no_detail_is_plain_quantization() {
        let buffer = test_data_opaque();
        let config = PipelineConfig::new()
            .palette_size(PaletteSize::new(3).unwrap())
            .sharpen(Sharpen::NONE);

        let (stylized, output) = stylize_with_palette(&buffer, &config, &mut rng(2));
        let (quantized, expected) =
            kmeans::quantize_with_palette(&buffer, config.palette_size, &mut rng(2));
        assert_eq!(stylized, quantized);
        assert_eq!(output, expected);
    }

    #[test]
    fn preserves_dimensions_and_translucent_pixels() {
        let buffer = test_data_mixed_alpha();
        let config = PipelineConfig::from_controls(0, 4, 100).unwrap();
        let stylized = stylize(&buffer, &config);

        assert_eq!(stylized.dimensions(), buffer.dimensions());
        for (before, after) in buffer.as_arrays().iter().zip(stylized.as_arrays()) {
            assert_eq!(before[3], after[3]);
        }
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let buffer = test_data_mixed_alpha();
        let config = PipelineConfig::from_controls(2, 9, 35).unwrap().seed(77);
        assert_eq!(stylize(&buffer, &config), stylize_par(&buffer, &config));
    }
}
