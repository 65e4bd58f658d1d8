//! Contains the [`PipelineConfig`] builder struct and the [`Resolution`] control.

use crate::{export::DEFAULT_SCALE_FACTOR, Error, PaletteSize, Sharpen};
use rand::SeedableRng;
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::fmt::{self, Display};

/// The largest supported [`Resolution`] index, a width of `4096` pixels.
pub const MAX_RESOLUTION_INDEX: u8 = 8;

/// The target width of the pixel art, restricted to powers of two.
///
/// An index `i` maps to a width of `2^(4 + i)`, so index `0` is `16` pixels
/// and [`MAX_RESOLUTION_INDEX`] is `4096` pixels.
///
/// # Examples
/// ```
/// # use pixiart::Resolution;
/// # fn main() -> Result<(), pixiart::Error> {
/// let resolution = Resolution::new(2)?;
/// assert_eq!(resolution.width(), 64);
/// assert_eq!(resolution.target_dimensions(1920, 1080)?, (64, 36));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Resolution(u8);

impl Resolution {
    /// The default resolution of `64` pixels.
    pub const DEFAULT: Self = Self(2);

    /// Creates a new [`Resolution`] from a control index.
    ///
    /// # Errors
    /// Returns [`Error::Resolution`] if `index` is above [`MAX_RESOLUTION_INDEX`].
    pub const fn new(index: u8) -> Result<Self, Error> {
        if index <= MAX_RESOLUTION_INDEX {
            Ok(Self(index))
        } else {
            Err(Error::Resolution(index))
        }
    }

    /// Gets the control index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// The target width in pixels.
    #[must_use]
    pub const fn width(self) -> u32 {
        1 << (4 + self.0)
    }

    /// Computes the target `(width, height)` for a source image,
    /// keeping the aspect ratio of the source.
    ///
    /// The height is rounded to the nearest pixel (halves round up) and is at least `1`.
    ///
    /// # Errors
    /// Returns [`Error::ZeroDimension`] if either source dimension is `0`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn target_dimensions(self, src_width: u32, src_height: u32) -> Result<(u32, u32), Error> {
        if src_width == 0 || src_height == 0 {
            return Err(Error::ZeroDimension { width: src_width, height: src_height });
        }

        let width = self.width();
        let aspect_ratio = f64::from(src_height) / f64::from(src_width);
        let height = (f64::from(width) * aspect_ratio + 0.5).floor();
        let height = height.clamp(1.0, f64::from(u32::MAX)) as u32;

        Ok((width, height))
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Resolution {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} px", self.width())
    }
}

/// A builder struct holding every parameter of the pixel art pipeline.
///
/// # Examples
/// Using the builder methods:
/// ```
/// # use pixiart::{PaletteSize, PipelineConfig, Resolution, Sharpen};
/// # fn main() -> Result<(), pixiart::Error> {
/// let config = PipelineConfig::new()
///     .resolution(Resolution::new(3)?)
///     .palette_size(PaletteSize::new(8)?)
///     .sharpen(Sharpen::NONE)
///     .seed(42);
/// assert_eq!(config.resolution.width(), 128);
/// # Ok(())
/// # }
/// ```
///
/// From the raw values of the three user controls:
/// ```
/// # use pixiart::PipelineConfig;
/// # fn main() -> Result<(), pixiart::Error> {
/// let config = PipelineConfig::from_controls(1, 12, 40)?;
/// assert_eq!(config.resolution.width(), 32);
/// assert_eq!(config.palette_size.into_inner(), 12);
/// assert!((config.sharpen.amount() - 0.4).abs() < f64::EPSILON);
/// assert!(PipelineConfig::from_controls(1, 0, 40).is_err());
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// The target width of the downscaled image.
    pub resolution: Resolution,
    /// The maximum number of colors in the output.
    pub palette_size: PaletteSize,
    /// The sharpening applied before quantization.
    pub sharpen: Sharpen,
    /// The seed for the k-means random source.
    pub seed: u64,
    /// The nearest-neighbor upscale factor used on export.
    pub scale_factor: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Creates a new [`PipelineConfig`] with default values.
    pub const fn new() -> Self {
        Self {
            resolution: Resolution::DEFAULT,
            palette_size: PaletteSize::DEFAULT,
            sharpen: Sharpen::new(),
            seed: 0,
            scale_factor: DEFAULT_SCALE_FACTOR,
        }
    }

    /// Creates a new [`PipelineConfig`] from the resolution index,
    /// palette size, and detail percentage controls.
    ///
    /// # Errors
    /// Returns an error if any of the values is out of range.
    pub fn from_controls(
        resolution_index: u8,
        palette_size: u16,
        detail_percent: u8,
    ) -> Result<Self, Error> {
        Ok(Self::new()
            .resolution(Resolution::new(resolution_index)?)
            .palette_size(PaletteSize::new(palette_size)?)
            .sharpen(Sharpen::from_percent(detail_percent)?))
    }

    /// Sets the target resolution.
    ///
    /// The default resolution is [`Resolution::DEFAULT`].
    pub const fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the palette size which determines the (maximum) number of colors in the output.
    ///
    /// The default palette size is [`PaletteSize::DEFAULT`].
    pub const fn palette_size(mut self, palette_size: PaletteSize) -> Self {
        self.palette_size = palette_size;
        self
    }

    /// Sets the sharpening applied before quantization.
    ///
    /// The default is [`Sharpen::new`].
    pub const fn sharpen(mut self, sharpen: Sharpen) -> Self {
        self.sharpen = sharpen;
        self
    }

    /// Sets the seed value for the random number generator.
    ///
    /// The default seed is `0`.
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the upscale factor used on export.
    ///
    /// The default is [`DEFAULT_SCALE_FACTOR`].
    pub const fn scale_factor(mut self, scale_factor: u32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Creates the random source for k-means from the seed.
    #[must_use]
    pub fn rng(&self) -> Xoroshiro128PlusPlus {
        Xoroshiro128PlusPlus::seed_from_u64(self.seed)
    }
}
