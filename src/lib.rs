//! A library for turning raster images into stylized, low-color pixel art.
//!
//! The core is a two step transform over an RGBA [`PixelBuffer`]:
//! 1. [`Sharpen`] accentuates local contrast with a single pass unsharp mask,
//!    so edges survive the color reduction that follows.
//! 2. [`kmeans`] reduces the opaque pixels to at most `k` colors using Lloyd's k-means.
//!
//! Resizing the source image to the target resolution happens before these steps,
//! and upscaling/encoding for export happens after. Both are thin adapters over the
//! [`image`] crate (see the `raster` and [`export`] modules).
//!
//! # Features
//! To reduce dependencies and compile times, `pixiart` has several `cargo` features
//! that can be turned off or on:
//! - `threads`: exposes parallel versions of most functions via [`rayon`].
//! - `image`: enables integration with the [`image`] crate (conversions, loading, resizing, PNG export).
//!
//! # High-Level API
//! To get started with the high-level API, see [`PipelineConfig`] and [`stylize`].
//! ```
//! # use pixiart::{PaletteSize, PixelBuffer, PipelineConfig, Sharpen};
//! # use palette::Srgba;
//! # fn main() -> Result<(), pixiart::Error> {
//! let buffer = PixelBuffer::new(2, 1, vec![Srgba::new(0, 0, 0, 255), Srgba::new(255, 255, 255, 255)])?;
//!
//! let config = PipelineConfig::new()
//!     .palette_size(PaletteSize::new(2)?) // set the max number of colors in the palette
//!     .sharpen(Sharpen::from_percent(25)?) // add a bit of edge detail
//!     .seed(42); // seed for the k-means random source
//!
//! let pixel_art = pixiart::stylize(&buffer, &config);
//! assert_eq!(pixel_art.dimensions(), buffer.dimensions());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod sharpen;
mod types;

pub mod export;
pub mod kmeans;

#[cfg(feature = "image")]
pub mod raster;

pub use api::*;
pub use sharpen::Sharpen;
pub use types::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The maximum supported number of palette colors is `256`.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;

/// Pixels with an alpha value at or above this threshold are opaque.
///
/// Only opaque pixels are sampled and recolored by [`kmeans`].
pub const OPACITY_THRESHOLD: u8 = 128;

/// The number of Lloyd iterations run by [`kmeans`].
pub const KMEANS_ITERATIONS: usize = 5;

/// Returns whether the given alpha value belongs to an opaque pixel.
#[inline]
#[must_use]
pub const fn is_opaque(alpha: u8) -> bool {
    alpha >= OPACITY_THRESHOLD
}

/// Clamps `value` to `0.0..=255.0` and rounds half to even,
/// the same conversion a clamped byte array performs on assignment.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn clamp_to_u8(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round_ties_even() as u8
}
