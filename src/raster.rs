//! Loading and downscaling of source images through the [`image`] crate.
//!
//! These are the steps before the core transforms: decode an image file, shrink it to the
//! target [`Resolution`], and hand the result over as a [`PixelBuffer`].
//!
//! PNG, JPEG, GIF and WebP inputs can be decoded (see [`INPUT_FORMATS`]).

use crate::{stylize, Error, PipelineConfig, PixelBuffer, Resolution};
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::path::Path;

/// The resampling filter used when downscaling.
///
/// Nearest-neighbor keeps hard pixel edges instead of blending colors together.
pub const DOWNSCALE_FILTER: FilterType = FilterType::Nearest;

/// The image formats [`load`] and [`load_from_memory`] can decode.
pub const INPUT_FORMATS: [ImageFormat; 4] =
    [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif, ImageFormat::WebP];

/// Decodes the image file at `path`.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a supported image.
pub fn load(path: impl AsRef<Path>) -> Result<DynamicImage, Error> {
    let path = path.as_ref();
    let image = image::open(path)?;
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "loaded image"
    );
    Ok(image)
}

/// Decodes an image from encoded bytes, guessing the format from its contents.
///
/// # Errors
/// Returns an error if the bytes are not a supported image.
pub fn load_from_memory(bytes: &[u8]) -> Result<DynamicImage, Error> {
    Ok(image::load_from_memory(bytes)?)
}

/// Downscales `image` to the width of `resolution`, keeping its aspect ratio.
///
/// # Errors
/// Returns [`Error::ZeroDimension`] if the image is empty.
pub fn rasterize(image: &DynamicImage, resolution: Resolution) -> Result<PixelBuffer, Error> {
    let (width, height) = resolution.target_dimensions(image.width(), image.height())?;
    let resized = image::imageops::resize(image, width, height, DOWNSCALE_FILTER);
    tracing::debug!(width, height, "rasterized image");
    PixelBuffer::try_from(resized)
}

/// Downscales `image` and turns it into pixel art according to `config`.
///
/// # Errors
/// Returns [`Error::ZeroDimension`] if the image is empty.
pub fn pixelate(image: &DynamicImage, config: &PipelineConfig) -> Result<PixelBuffer, Error> {
    let buffer = rasterize(image, config.resolution)?;
    Ok(stylize(&buffer, config))
}

/// Downscales `image` and turns it into pixel art according to `config`, in parallel.
///
/// The output is identical to [`pixelate`].
///
/// # Errors
/// Returns [`Error::ZeroDimension`] if the image is empty.
#[cfg(feature = "threads")]
pub fn pixelate_par(image: &DynamicImage, config: &PipelineConfig) -> Result<PixelBuffer, Error> {
    let buffer = rasterize(image, config.resolution)?;
    Ok(crate::stylize_par(&buffer, config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{PaletteSize, Sharpen};
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    #[allow(clippy::cast_possible_truncation)]
    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        }))
    }

    #[test]
    fn rasterize_keeps_aspect_ratio() {
        let buffer = rasterize(&gradient(200, 100), Resolution::new(1).unwrap()).unwrap();
        assert_eq!(buffer.dimensions(), (32, 16));

        let buffer = rasterize(&gradient(30, 90), Resolution::new(0).unwrap()).unwrap();
        assert_eq!(buffer.dimensions(), (16, 48));
    }

    #[test]
    fn rasterize_rejects_empty_images() {
        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert!(matches!(
            rasterize(&empty, Resolution::default()),
            Err(Error::ZeroDimension { .. })
        ));
    }

    #[test]
    fn pixelate_limits_colors() {
        let config = PipelineConfig::new()
            .resolution(Resolution::new(1).unwrap())
            .palette_size(PaletteSize::new(4).unwrap())
            .sharpen(Sharpen::from_percent(20).unwrap());

        let buffer = pixelate(&gradient(64, 64), &config).unwrap();
        assert_eq!(buffer.dimensions(), (32, 32));

        let colors = buffer
            .as_arrays()
            .iter()
            .copied()
            .collect::<std::collections::HashSet<_>>();
        assert!(colors.len() <= 4);

        #[cfg(feature = "threads")]
        assert_eq!(pixelate_par(&gradient(64, 64), &config).unwrap(), buffer);
    }

    #[test]
    fn load_rejects_non_images() {
        assert!(matches!(load_from_memory(b"not an image"), Err(Error::Image(_))));
    }

    #[test]
    fn input_formats_are_enabled() {
        for format in INPUT_FORMATS {
            assert!(format.reading_enabled(), "{format:?}");
        }
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn load_from_encoded_jpeg() {
        let photo = RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 90]));
        let mut jpeg = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(photo).write_to(&mut jpeg, ImageFormat::Jpeg).unwrap();

        let decoded = load_from_memory(jpeg.get_ref()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));

        let buffer = rasterize(&decoded, Resolution::new(0).unwrap()).unwrap();
        assert_eq!(buffer.dimensions(), (16, 12));
        assert_eq!(buffer.opaque_count(), 16 * 12);
    }

    #[test]
    fn load_from_encoded_png() {
        let mut png = Vec::new();
        let buffer = PixelBuffer::try_from(gradient(5, 3).into_rgba8()).unwrap();
        crate::export::write_png(&buffer, 1, &mut png).unwrap();

        let decoded = load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
        assert_eq!(PixelBuffer::try_from(decoded.into_rgba8()).unwrap(), buffer);
    }
}
