#![allow(dead_code)]

use palette::Srgba;
use pixiart::PixelBuffer;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// The widths of the synthetic buffers, matching the first few resolution steps.
pub const WIDTHS: [u32; 4] = [64, 128, 256, 512];

/// A smooth diagonal gradient with a few hard edges, similar to a downscaled photo.
#[allow(clippy::cast_possible_truncation)]
pub fn gradient(width: u32, height: u32) -> PixelBuffer {
    let pixels = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let r = (x * 255 / width.max(1)) as u8;
                let g = (y * 255 / height.max(1)) as u8;
                let b = if (x / 16 + y / 16) % 2 == 0 { 40 } else { 200 };
                Srgba::new(r, g, b, 255)
            })
        })
        .collect();

    PixelBuffer::new(width, height, pixels).unwrap()
}

/// Uniform random colors where roughly one pixel in eight is transparent.
pub fn noise(width: u32, height: u32, seed: u64) -> PixelBuffer {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let pixels = (0..(width as usize * height as usize))
        .map(|_| {
            let [r, g, b]: [u8; 3] = rng.gen();
            let alpha = if rng.gen_ratio(1, 8) { 0 } else { 255 };
            Srgba::new(r, g, b, alpha)
        })
        .collect();

    PixelBuffer::new(width, height, pixels).unwrap()
}

/// Named gradient and noise buffers at each of the [`WIDTHS`] with a 4:3 aspect ratio.
pub fn test_buffers() -> Vec<(String, PixelBuffer)> {
    WIDTHS
        .iter()
        .flat_map(|&width| {
            let height = width * 3 / 4;
            [
                (format!("gradient_{width}"), gradient(width, height)),
                (format!("noise_{width}"), noise(width, height, u64::from(width))),
            ]
        })
        .collect()
}
