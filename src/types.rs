//! Contains various types needed across the crate.

use crate::{api::MAX_RESOLUTION_INDEX, is_opaque, MAX_COLORS, MAX_PIXELS};
use palette::{
    cast::{AsArrays, IntoComponents},
    Srgb, Srgba,
};
use std::{
    fmt::{self, Display},
    num::NonZeroU8,
};
#[cfg(feature = "image")]
use image::RgbaImage;

/// The error type for fallible operations in this crate.
///
/// Invalid configuration values (e.g., a palette size of `0`) and malformed
/// buffers are rejected up front, so the transforms themselves never fail.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The palette size was `0` or above [`MAX_COLORS`].
    #[error("palette size {0} is outside the supported range 1..={max}", max = MAX_COLORS)]
    PaletteSize(u32),
    /// The sharpen amount was `NAN` or outside `0.0..=1.0`.
    #[error("detail amount {0} is outside the range 0.0..=1.0")]
    DetailAmount(f64),
    /// The detail percentage was above `100`.
    #[error("detail percent {0} is above 100")]
    DetailPercent(u8),
    /// The resolution index was above [`MAX_RESOLUTION_INDEX`].
    #[error("resolution index {0} is above the maximum of {max}", max = MAX_RESOLUTION_INDEX)]
    Resolution(u8),
    /// The export scale factor was `0`.
    #[error("scale factor must be at least 1")]
    ScaleFactor,
    /// One of the image dimensions was `0`.
    #[error("image dimensions {width}x{height} must both be non-zero")]
    ZeroDimension {
        /// The requested width.
        width: u32,
        /// The requested height.
        height: u32,
    },
    /// The image has more than [`MAX_PIXELS`] pixels.
    #[error("image of {width}x{height} is above the maximum of {max} pixels", max = MAX_PIXELS)]
    AboveMaxPixels {
        /// The requested width.
        width: u32,
        /// The requested height.
        height: u32,
    },
    /// The number of pixels or bytes did not match the dimensions.
    #[error("expected {expected} elements for the given dimensions, got {actual}")]
    LengthMismatch {
        /// The length implied by the dimensions.
        expected: usize,
        /// The length that was provided.
        actual: usize,
    },
    /// Writing an exported image failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Decoding or encoding an image failed.
    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// An RGBA image stored as a row-major list of pixels.
///
/// The invariants `width >= 1`, `height >= 1`, `width * height <= MAX_PIXELS`,
/// and `pixels.len() == width * height` are upheld by every constructor.
///
/// The transforms in this crate never mutate a [`PixelBuffer`] they read from,
/// instead they return a new buffer of the same dimensions.
///
/// # Examples
/// From a list of colors:
/// ```
/// # use pixiart::PixelBuffer;
/// # use palette::Srgba;
/// # fn main() -> Result<(), pixiart::Error> {
/// let buffer = PixelBuffer::new(2, 1, vec![Srgba::new(0, 0, 0, 255); 2])?;
/// assert_eq!(buffer.dimensions(), (2, 1));
/// # Ok(())
/// # }
/// ```
///
/// From raw RGBA bytes:
/// ```
/// # use pixiart::PixelBuffer;
/// # fn main() -> Result<(), pixiart::Error> {
/// let buffer = PixelBuffer::from_raw(1, 1, vec![10, 20, 30, 255])?;
/// assert_eq!(buffer.into_raw(), vec![10, 20, 30, 255]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    /// The number of pixels in each row.
    width: u32,
    /// The number of rows.
    height: u32,
    /// The pixels in row-major order.
    pixels: Vec<Srgba<u8>>,
}

impl PixelBuffer {
    /// Returns the number of pixels for the given dimensions if they are valid.
    pub(crate) fn checked_len(width: u32, height: u32) -> Result<usize, Error> {
        if width == 0 || height == 0 {
            return Err(Error::ZeroDimension { width, height });
        }

        u64::from(width)
            .checked_mul(u64::from(height))
            .filter(|&len| len <= u64::from(MAX_PIXELS))
            .and_then(|len| usize::try_from(len).ok())
            .ok_or(Error::AboveMaxPixels { width, height })
    }

    /// Creates a new [`PixelBuffer`] from a row-major list of pixels.
    ///
    /// # Errors
    /// Returns an error if either dimension is `0`, if there are too many pixels,
    /// or if `pixels.len()` is not `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Srgba<u8>>) -> Result<Self, Error> {
        let expected = Self::checked_len(width, height)?;
        if pixels.len() == expected {
            Ok(Self { width, height, pixels })
        } else {
            Err(Error::LengthMismatch { expected, actual: pixels.len() })
        }
    }

    /// Creates a new [`PixelBuffer`] from raw, row-major RGBA bytes.
    ///
    /// # Errors
    /// Returns an error if either dimension is `0`, if there are too many pixels,
    /// or if `raw.len()` is not `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, raw: Vec<u8>) -> Result<Self, Error> {
        let expected = Self::checked_len(width, height)?.saturating_mul(4);
        if raw.len() != expected {
            return Err(Error::LengthMismatch { expected, actual: raw.len() });
        }

        let pixels = raw
            .chunks_exact(4)
            .map(|p| Srgba::new(p[0], p[1], p[2], p[3]))
            .collect();

        Ok(Self { width, height, pixels })
    }

    /// Creates a new [`PixelBuffer`] without checking the pixel count.
    pub(crate) fn new_unchecked(width: u32, height: u32, pixels: Vec<Srgba<u8>>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self { width, height, pixels }
    }

    /// Creates a new [`PixelBuffer`] filled with a single color.
    ///
    /// # Errors
    /// Returns an error if either dimension is `0` or if there are too many pixels.
    pub fn filled(width: u32, height: u32, color: Srgba<u8>) -> Result<Self, Error> {
        let len = Self::checked_len(width, height)?;
        Ok(Self { width, height, pixels: vec![color; len] })
    }

    /// The width of the image in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The height of the image in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The `(width, height)` of the image.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The pixels of the image in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[Srgba<u8>] {
        &self.pixels
    }

    /// The pixels of the image as `[r, g, b, a]` arrays.
    #[must_use]
    pub fn as_arrays(&self) -> &[[u8; 4]] {
        self.pixels.as_arrays()
    }

    /// Returns the pixel at `(x, y)`, or `None` if it is out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Srgba<u8>> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// The number of pixels with an alpha of at least [`OPACITY_THRESHOLD`](crate::OPACITY_THRESHOLD).
    #[must_use]
    pub fn opaque_count(&self) -> usize {
        self.pixels.iter().filter(|p| is_opaque(p.alpha)).count()
    }

    /// Consumes the buffer and returns its pixels.
    #[must_use]
    pub fn into_pixels(self) -> Vec<Srgba<u8>> {
        self.pixels
    }

    /// Consumes the buffer and returns its raw, row-major RGBA bytes.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels.into_components()
    }
}

#[cfg(feature = "image")]
impl TryFrom<RgbaImage> for PixelBuffer {
    type Error = Error;

    fn try_from(image: RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, image.into_raw())
    }
}

#[cfg(feature = "image")]
impl TryFrom<&RgbaImage> for PixelBuffer {
    type Error = Error;

    fn try_from(image: &RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, image.as_raw().clone())
    }
}

#[cfg(feature = "image")]
impl From<PixelBuffer> for RgbaImage {
    fn from(buffer: PixelBuffer) -> Self {
        let (width, height) = buffer.dimensions();

        #[allow(clippy::unwrap_used)]
        {
            // the raw buffer is always width * height * 4 bytes
            RgbaImage::from_raw(width, height, buffer.into_raw()).unwrap()
        }
    }
}

/// This type is used to specify the (maximum) number of colors to include in a palette.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// in the range `1..=MAX_COLORS`.
///
/// # Examples
/// Use `into` to create [`PaletteSize`]s from [`NonZeroU8`]s.
/// For `u16`s, use `try_into` or [`PaletteSize::new`].
/// You can also use the [`PaletteSize::MAX`] constant.
///
/// ```
/// # use pixiart::PaletteSize;
/// # fn main() -> Result<(), pixiart::Error> {
/// let size = PaletteSize::new(16)?;
/// let size: PaletteSize = 128u16.try_into()?;
/// assert!(PaletteSize::new(0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PaletteSize(u16);

impl PaletteSize {
    /// The maximum supported palette size (given by [`MAX_COLORS`]).
    pub const MAX: Self = Self(MAX_COLORS);

    /// The smallest palette size, a single color.
    pub const MIN: Self = Self(1);

    /// The default palette size of `16` colors.
    pub const DEFAULT: Self = Self(16);

    /// Creates a new [`PaletteSize`].
    ///
    /// # Errors
    /// Returns [`Error::PaletteSize`] if `value` is `0` or above [`MAX_COLORS`].
    pub const fn new(value: u16) -> Result<Self, Error> {
        if value >= 1 && value <= MAX_COLORS {
            Ok(Self(value))
        } else {
            Err(Error::PaletteSize(value as u32))
        }
    }

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Gets the inner value as a `usize` for lengths and indexing.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for PaletteSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<PaletteSize> for u16 {
    fn from(val: PaletteSize) -> Self {
        val.into_inner()
    }
}

impl From<NonZeroU8> for PaletteSize {
    fn from(value: NonZeroU8) -> Self {
        Self(value.get().into())
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Display for PaletteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// The output struct returned by the palette functions in [`kmeans`](crate::kmeans).
///
/// It contains the color `palette`, alongside `counts` which has
/// the number of opaque pixels assigned to each palette color during the final iteration.
///
/// Both fields will be empty if the image had no opaque pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuantizeOutput {
    /// The computed color palette, one color per centroid in centroid order.
    ///
    /// The colors in the palette are not guaranteed to be unique.
    pub palette: Vec<Srgb<u8>>,
    /// The number of opaque pixels that were assigned to each color in `palette`.
    ///
    /// Each count is not guaranteed to be non-zero.
    pub counts: Vec<u32>,
}

impl QuantizeOutput {
    /// Returns whether the palette is empty (i.e., the image had no opaque pixels).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            PixelBuffer::new(0, 4, Vec::new()),
            Err(Error::ZeroDimension { width: 0, height: 4 })
        ));
        assert!(matches!(
            PixelBuffer::from_raw(4, 0, Vec::new()),
            Err(Error::ZeroDimension { width: 4, height: 0 })
        ));
    }

    #[test]
    fn rejects_length_mismatch() {
        let pixels = vec![Srgba::new(0, 0, 0, 255); 5];
        assert!(matches!(
            PixelBuffer::new(2, 2, pixels),
            Err(Error::LengthMismatch { expected: 4, actual: 5 })
        ));

        assert!(matches!(
            PixelBuffer::from_raw(2, 1, vec![0; 7]),
            Err(Error::LengthMismatch { expected: 8, actual: 7 })
        ));
    }

    #[test]
    fn rejects_too_many_pixels() {
        assert!(matches!(
            PixelBuffer::filled(u32::MAX, 2, Srgba::new(0, 0, 0, 0)),
            Err(Error::AboveMaxPixels { .. })
        ));
    }

    #[test]
    fn raw_bytes_are_row_major_rgba() {
        let raw = (0..24).collect::<Vec<u8>>();
        let buffer = PixelBuffer::from_raw(3, 2, raw.clone()).unwrap();

        assert_eq!(buffer.get(0, 0), Some(Srgba::new(0, 1, 2, 3)));
        assert_eq!(buffer.get(2, 0), Some(Srgba::new(8, 9, 10, 11)));
        assert_eq!(buffer.get(1, 1), Some(Srgba::new(16, 17, 18, 19)));
        assert_eq!(buffer.get(3, 0), None);
        assert_eq!(buffer.get(0, 2), None);
        assert_eq!(buffer.as_arrays()[5], [20, 21, 22, 23]);
        assert_eq!(buffer.into_raw(), raw);
    }

    #[test]
    fn counts_opaque_pixels() {
        let buffer = crate::tests::buffer(
            4,
            1,
            &[[0, 0, 0, 0], [0, 0, 0, 127], [0, 0, 0, 128], [0, 0, 0, 255]],
        );
        assert_eq!(buffer.opaque_count(), 2);
    }

    #[test]
    fn palette_size_bounds() {
        assert!(matches!(PaletteSize::new(0), Err(Error::PaletteSize(0))));
        assert!(matches!(PaletteSize::new(257), Err(Error::PaletteSize(257))));
        assert_eq!(PaletteSize::new(1).unwrap(), PaletteSize::MIN);
        assert_eq!(PaletteSize::new(256).unwrap(), PaletteSize::MAX);
        assert_eq!(PaletteSize::from(NonZeroU8::new(64).unwrap()).into_inner(), 64);
        assert_eq!(PaletteSize::try_from(32u16).unwrap().as_usize(), 32);
    }

    #[test]
    #[cfg(feature = "image")]
    #[allow(clippy::cast_possible_truncation)]
    fn rgbaimage_conversion() {
        let image = RgbaImage::from_fn(3, 2, |x, y| image::Rgba([x as u8, y as u8, 7, 200]));

        let buffer = PixelBuffer::try_from(&image).unwrap();
        assert_eq!(buffer.dimensions(), (3, 2));
        assert_eq!(buffer.get(2, 1), Some(Srgba::new(2, 1, 7, 200)));

        let back = RgbaImage::from(buffer);
        assert_eq!(back, image);
    }
}
