//! Upscaling and encoding of finished pixel art.
//!
//! Pixel art is tiny at its working resolution, so it is enlarged by an integer factor
//! with nearest-neighbor resampling before saving. No smoothing is applied,
//! so every source pixel becomes a crisp `factor x factor` block.
//!
//! With the `image` feature the resampling is done by [`image::imageops::resize`],
//! otherwise the blocks are copied directly.

use crate::{Error, PixelBuffer};
#[cfg(feature = "image")]
use {
    image::{
        codecs::png::PngEncoder,
        imageops::{self, FilterType},
        ExtendedColorType, ImageEncoder, RgbaImage,
    },
    std::{fs::File, io::BufWriter, io::Write, path::Path},
};

/// The default upscale factor for exported images.
pub const DEFAULT_SCALE_FACTOR: u32 = 20;

/// Enlarges `buffer` by `factor` in both dimensions using nearest-neighbor replication.
///
/// # Errors
/// Returns [`Error::ScaleFactor`] if `factor` is `0`,
/// or [`Error::AboveMaxPixels`] if the enlarged image would be too large.
///
/// # Examples
/// ```
/// # use pixiart::{export, PixelBuffer};
/// # fn main() -> Result<(), pixiart::Error> {
/// let buffer = PixelBuffer::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255])?;
/// let upscaled = export::upscale(&buffer, 3)?;
/// assert_eq!(upscaled.dimensions(), (6, 3));
/// # Ok(())
/// # }
/// ```
pub fn upscale(buffer: &PixelBuffer, factor: u32) -> Result<PixelBuffer, Error> {
    if factor == 0 {
        return Err(Error::ScaleFactor);
    }
    if factor == 1 {
        return Ok(buffer.clone());
    }

    let (width, height) = buffer.dimensions();
    let overflow = || Error::AboveMaxPixels { width, height };
    let new_width = width.checked_mul(factor).ok_or_else(overflow)?;
    let new_height = height.checked_mul(factor).ok_or_else(overflow)?;
    PixelBuffer::checked_len(new_width, new_height)?;

    #[cfg(feature = "image")]
    let upscaled = {
        let image = RgbaImage::from(buffer.clone());
        PixelBuffer::try_from(imageops::resize(&image, new_width, new_height, FilterType::Nearest))?
    };

    #[cfg(not(feature = "image"))]
    let upscaled = replicate_blocks(buffer, factor);

    tracing::debug!(width = new_width, height = new_height, "upscaled buffer");

    Ok(upscaled)
}

/// Repeats every pixel of `buffer` into a `factor x factor` block.
///
/// The caller has already checked that the enlarged size fits.
#[cfg(any(test, not(feature = "image")))]
fn replicate_blocks(buffer: &PixelBuffer, factor: u32) -> PixelBuffer {
    let (width, height) = buffer.dimensions();
    let (new_width, new_height) = (width * factor, height * factor);

    let factor = factor as usize;
    let row_len = new_width as usize;
    let mut pixels = Vec::with_capacity(row_len * new_height as usize);
    for row in buffer.pixels().chunks_exact(width as usize) {
        let start = pixels.len();
        for &pixel in row {
            pixels.extend(std::iter::repeat(pixel).take(factor));
        }
        for _ in 1..factor {
            pixels.extend_from_within(start..(start + row_len));
        }
    }

    PixelBuffer::new_unchecked(new_width, new_height, pixels)
}

/// Upscales `buffer` by `factor` and writes it as a PNG image.
///
/// # Errors
/// Returns an error if upscaling fails (see [`upscale`]) or if encoding or writing fails.
#[cfg(feature = "image")]
pub fn write_png(buffer: &PixelBuffer, factor: u32, writer: impl Write) -> Result<(), Error> {
    let upscaled = upscale(buffer, factor)?;
    let (width, height) = upscaled.dimensions();
    PngEncoder::new(writer).write_image(
        &upscaled.into_raw(),
        width,
        height,
        ExtendedColorType::Rgba8,
    )?;
    Ok(())
}

/// Upscales `buffer` by `factor` and saves it as a PNG file at `path`.
///
/// # Errors
/// Returns an error if upscaling fails (see [`upscale`]),
/// if the file cannot be created, or if encoding or writing fails.
#[cfg(feature = "image")]
pub fn save_png(buffer: &PixelBuffer, factor: u32, path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_png(buffer, factor, &mut writer)?;
    writer.flush()?;

    tracing::info!(path = %path.display(), "saved pixel art");

    Ok(())
}
