//! Color quantization with Lloyd's k-means in sRGB space.
//!
//! Every opaque pixel (alpha of at least [`OPACITY_THRESHOLD`](crate::OPACITY_THRESHOLD))
//! becomes one sample, duplicates included. The `k` initial centroids are drawn uniformly at random,
//! with replacement, from these samples. Then [`KMEANS_ITERATIONS`] rounds of assignment and update
//! are run. A centroid that receives no samples in a round is replaced by another random sample.
//! Finally, each opaque pixel is recolored with its nearest centroid.
//!
//! Nearest centroid searches use squared euclidean distance, and ties go to the centroid
//! with the lowest index.
//!
//! The random source is always passed in by the caller, so results are reproducible
//! given a seeded generator.
//!
//! # Examples
//! ```
//! # use pixiart::{kmeans, PaletteSize, PixelBuffer};
//! # use rand::SeedableRng;
//! # use rand_xoshiro::Xoroshiro128PlusPlus;
//! # fn main() -> Result<(), pixiart::Error> {
//! let raw = vec![0, 0, 0, 255, 10, 0, 0, 255, 250, 250, 250, 255, 255, 255, 255, 255];
//! let buffer = PixelBuffer::from_raw(4, 1, raw)?;
//!
//! let rng = &mut Xoroshiro128PlusPlus::seed_from_u64(7);
//! let quantized = kmeans::quantize(&buffer, PaletteSize::new(2)?, rng);
//!
//! assert_eq!(quantized.as_arrays()[0], quantized.as_arrays()[1]);
//! assert_eq!(quantized.as_arrays()[2], quantized.as_arrays()[3]);
//! # Ok(())
//! # }
//! ```

use crate::{clamp_to_u8, is_opaque, PaletteSize, PixelBuffer, QuantizeOutput, KMEANS_ITERATIONS};
use palette::Srgb;
use rand::{distributions::Distribution, Rng};
use rand_distr::Uniform;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// The fitted cluster centers, kept at full precision.
///
/// Remapping uses these unrounded values for its distance comparisons
/// and only rounds the chosen centroid when writing it into a pixel.
#[derive(Debug, Clone, PartialEq)]
#[repr(transparent)]
pub struct Centroids(Vec<[f64; 3]>);

impl Centroids {
    /// Gets the inner centroid components.
    #[must_use]
    pub fn into_inner(self) -> Vec<[f64; 3]> {
        self.0
    }

    /// Gets the centroid components as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[[f64; 3]] {
        &self.0
    }

    /// The number of centroids.
    #[must_use]
    pub fn num_colors(&self) -> usize {
        self.0.len()
    }

    /// Returns the centroids rounded to 8-bit colors.
    #[must_use]
    pub fn palette(&self) -> Vec<Srgb<u8>> {
        self.0.iter().map(|&c| rounded(c)).collect()
    }

    /// Returns the index of the centroid nearest to `color`.
    ///
    /// On ties, the lowest index wins.
    #[must_use]
    pub fn nearest(&self, color: [u8; 3]) -> usize {
        nearest(&self.0, color)
    }
}

impl From<Centroids> for Vec<[f64; 3]> {
    fn from(value: Centroids) -> Self {
        value.into_inner()
    }
}

impl From<&[Srgb<u8>]> for Centroids {
    fn from(colors: &[Srgb<u8>]) -> Self {
        Self(
            colors
                .iter()
                .map(|c| [c.red, c.green, c.blue].map(f64::from))
                .collect(),
        )
    }
}

/// Squared euclidean distance between a sample and a centroid.
#[inline]
fn squared_euclidean_distance(color: [u8; 3], centroid: [f64; 3]) -> f64 {
    let mut dist = 0.0;
    for c in 0..3 {
        let d = f64::from(color[c]) - centroid[c];
        dist += d * d;
    }
    dist
}

/// Index of the nearest centroid, preferring the lowest index on ties.
#[inline]
fn nearest(centroids: &[[f64; 3]], color: [u8; 3]) -> usize {
    let mut min_index = 0;
    let mut min_distance = f64::INFINITY;
    for (i, &centroid) in centroids.iter().enumerate() {
        let distance = squared_euclidean_distance(color, centroid);
        if distance < min_distance {
            min_distance = distance;
            min_index = i;
        }
    }
    min_index
}

/// Rounds a centroid to an 8-bit color.
#[inline]
fn rounded(centroid: [f64; 3]) -> Srgb<u8> {
    let [r, g, b] = centroid.map(clamp_to_u8);
    Srgb::new(r, g, b)
}

/// Returns the color of each opaque pixel in scan order.
#[must_use]
pub fn samples(buffer: &PixelBuffer) -> Vec<[u8; 3]> {
    buffer
        .as_arrays()
        .iter()
        .filter(|p| is_opaque(p[3]))
        .map(|&[r, g, b, _]| [r, g, b])
        .collect()
}

/// The running sums for one cluster during a single assignment step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ClusterAccumulator {
    /// The sum of each color component.
    sum: [u64; 3],
    /// The number of samples added.
    count: u32,
}

impl ClusterAccumulator {
    /// Adds a sample to the cluster.
    #[inline]
    fn add(&mut self, color: [u8; 3]) {
        for (s, c) in self.sum.iter_mut().zip(color) {
            *s += u64::from(c);
        }
        self.count += 1;
    }

    /// Merges the sums of another accumulator into this one.
    #[inline]
    fn merge(&mut self, other: &Self) {
        for (s, o) in self.sum.iter_mut().zip(other.sum) {
            *s += o;
        }
        self.count += other.count;
    }

    /// The mean color, or `None` if no samples were added.
    #[allow(clippy::cast_precision_loss)]
    fn mean(&self) -> Option<[f64; 3]> {
        (self.count > 0).then(|| {
            let count = f64::from(self.count);
            self.sum.map(|s| s as f64 / count)
        })
    }
}

/// Assigns each sample to its nearest centroid.
fn assign(samples: &[[u8; 3]], centroids: &[[f64; 3]]) -> Vec<ClusterAccumulator> {
    let mut clusters = vec![ClusterAccumulator::default(); centroids.len()];
    for &color in samples {
        clusters[nearest(centroids, color)].add(color);
    }
    clusters
}

/// Assigns each sample to its nearest centroid in parallel.
///
/// The sums are integers, so the result does not depend on how the work is split.
#[cfg(feature = "threads")]
fn assign_par(samples: &[[u8; 3]], centroids: &[[f64; 3]]) -> Vec<ClusterAccumulator> {
    let k = centroids.len();
    samples
        .par_iter()
        .fold(
            || vec![ClusterAccumulator::default(); k],
            |mut clusters, &color| {
                clusters[nearest(centroids, color)].add(color);
                clusters
            },
        )
        .reduce(
            || vec![ClusterAccumulator::default(); k],
            |mut a, b| {
                for (a, b) in a.iter_mut().zip(&b) {
                    a.merge(b);
                }
                a
            },
        )
}

/// The state of one k-means run.
struct State<'a, R: Rng + ?Sized> {
    /// The opaque pixel colors.
    samples: &'a [[u8; 3]],
    /// Picks a random sample index.
    distribution: Uniform<usize>,
    /// The injected random source.
    rng: &'a mut R,
    /// The current centroids.
    centroids: Vec<[f64; 3]>,
    /// The sample count of each centroid from the latest assignment step.
    counts: Vec<u32>,
}

impl<'a, R: Rng + ?Sized> State<'a, R> {
    /// Draws `k` initial centroids from `samples`, which must not be empty.
    fn new(samples: &'a [[u8; 3]], k: PaletteSize, rng: &'a mut R) -> Self {
        debug_assert!(!samples.is_empty());
        let mut state = Self {
            samples,
            distribution: Uniform::new(0, samples.len()),
            rng,
            centroids: Vec::with_capacity(k.as_usize()),
            counts: vec![0; k.as_usize()],
        };

        for _ in 0..k.as_usize() {
            let centroid = state.random_sample();
            state.centroids.push(centroid);
        }

        state
    }

    /// Returns a uniformly random sample as a centroid.
    fn random_sample(&mut self) -> [f64; 3] {
        let color = self.samples[self.distribution.sample(&mut *self.rng)];
        color.map(f64::from)
    }

    /// Moves each centroid to the mean of its cluster,
    /// reseeding empty clusters in index order.
    fn update(&mut self, clusters: &[ClusterAccumulator]) {
        let mut reseeded = 0;
        for (i, cluster) in clusters.iter().enumerate() {
            self.counts[i] = cluster.count;
            if let Some(mean) = cluster.mean() {
                self.centroids[i] = mean;
            } else {
                self.centroids[i] = self.random_sample();
                reseeded += 1;
                tracing::trace!(centroid = i, "reseeded empty cluster");
            }
        }

        tracing::trace!(reseeded, "updated centroids");
    }

    /// Runs the fixed number of Lloyd iterations.
    fn lloyd(&mut self) {
        for _ in 0..KMEANS_ITERATIONS {
            let clusters = assign(self.samples, &self.centroids);
            self.update(&clusters);
        }
    }

    /// Runs the fixed number of Lloyd iterations with parallel assignment steps.
    #[cfg(feature = "threads")]
    fn lloyd_par(&mut self) {
        for _ in 0..KMEANS_ITERATIONS {
            let clusters = assign_par(self.samples, &self.centroids);
            self.update(&clusters);
        }
    }

    /// Returns the final centroids and their counts.
    fn into_centroids(self) -> (Centroids, Vec<u32>) {
        let Self { centroids, counts, .. } = self;
        (Centroids(centroids), counts)
    }
}

/// Fits `k` centroids to `samples`.
///
/// Returns `None` if `samples` is empty. The returned counts are the number of samples
/// assigned to each centroid in the final iteration.
#[must_use]
pub fn fit<R: Rng + ?Sized>(
    samples: &[[u8; 3]],
    k: PaletteSize,
    rng: &mut R,
) -> Option<(Centroids, Vec<u32>)> {
    if samples.is_empty() {
        return None;
    }

    tracing::debug!(samples = samples.len(), k = k.into_inner(), "fitting k-means");

    let mut state = State::new(samples, k, rng);
    state.lloyd();
    Some(state.into_centroids())
}

/// Fits `k` centroids to `samples`, running assignment steps in parallel.
///
/// Gives the same result as [`fit`] for the same random source.
#[cfg(feature = "threads")]
#[must_use]
pub fn fit_par<R: Rng + ?Sized>(
    samples: &[[u8; 3]],
    k: PaletteSize,
    rng: &mut R,
) -> Option<(Centroids, Vec<u32>)> {
    if samples.is_empty() {
        return None;
    }

    tracing::debug!(samples = samples.len(), k = k.into_inner(), "fitting k-means");

    let mut state = State::new(samples, k, rng);
    state.lloyd_par();
    Some(state.into_centroids())
}

/// Recolors each opaque pixel with its nearest centroid.
///
/// Pixels with an alpha below [`OPACITY_THRESHOLD`](crate::OPACITY_THRESHOLD)
/// and the alpha of every pixel are left unchanged.
#[must_use]
pub fn remap(buffer: &PixelBuffer, centroids: &Centroids) -> PixelBuffer {
    if centroids.0.is_empty() {
        return buffer.clone();
    }

    let palette = centroids.palette();
    let mut pixels = buffer.pixels().to_vec();
    for pixel in &mut pixels {
        if is_opaque(pixel.alpha) {
            pixel.color = palette[centroids.nearest([pixel.red, pixel.green, pixel.blue])];
        }
    }

    let (width, height) = buffer.dimensions();
    PixelBuffer::new_unchecked(width, height, pixels)
}

/// Recolors each opaque pixel with its nearest centroid in parallel.
///
/// The output is identical to [`remap`].
#[cfg(feature = "threads")]
#[must_use]
pub fn remap_par(buffer: &PixelBuffer, centroids: &Centroids) -> PixelBuffer {
    if centroids.0.is_empty() {
        return buffer.clone();
    }

    let palette = centroids.palette();
    let mut pixels = buffer.pixels().to_vec();
    pixels.par_iter_mut().for_each(|pixel| {
        if is_opaque(pixel.alpha) {
            pixel.color = palette[centroids.nearest([pixel.red, pixel.green, pixel.blue])];
        }
    });

    let (width, height) = buffer.dimensions();
    PixelBuffer::new_unchecked(width, height, pixels)
}

/// Computes a palette of (at most) `k` colors for the opaque pixels of `buffer`.
///
/// The output is empty if `buffer` has no opaque pixels.
#[must_use]
pub fn palette<R: Rng + ?Sized>(buffer: &PixelBuffer, k: PaletteSize, rng: &mut R) -> QuantizeOutput {
    fit(&samples(buffer), k, rng)
        .map(|(centroids, counts)| QuantizeOutput { palette: centroids.palette(), counts })
        .unwrap_or_default()
}

/// Computes a palette of (at most) `k` colors for the opaque pixels of `buffer` in parallel.
#[cfg(feature = "threads")]
#[must_use]
pub fn palette_par<R: Rng + ?Sized>(
    buffer: &PixelBuffer,
    k: PaletteSize,
    rng: &mut R,
) -> QuantizeOutput {
    fit_par(&samples(buffer), k, rng)
        .map(|(centroids, counts)| QuantizeOutput { palette: centroids.palette(), counts })
        .unwrap_or_default()
}

/// Reduces the opaque pixels of `buffer` to (at most) `k` colors.
///
/// Returns an unchanged copy if `buffer` has no opaque pixels.
#[must_use]
pub fn quantize<R: Rng + ?Sized>(buffer: &PixelBuffer, k: PaletteSize, rng: &mut R) -> PixelBuffer {
    quantize_with_palette(buffer, k, rng).0
}

/// Reduces the opaque pixels of `buffer` to (at most) `k` colors in parallel.
///
/// Gives the same result as [`quantize`] for the same random source.
#[cfg(feature = "threads")]
#[must_use]
pub fn quantize_par<R: Rng + ?Sized>(
    buffer: &PixelBuffer,
    k: PaletteSize,
    rng: &mut R,
) -> PixelBuffer {
    quantize_with_palette_par(buffer, k, rng).0
}

/// Reduces the opaque pixels of `buffer` to (at most) `k` colors,
/// also returning the palette that was used.
#[must_use]
pub fn quantize_with_palette<R: Rng + ?Sized>(
    buffer: &PixelBuffer,
    k: PaletteSize,
    rng: &mut R,
) -> (PixelBuffer, QuantizeOutput) {
    match fit(&samples(buffer), k, rng) {
        Some((centroids, counts)) => (
            remap(buffer, &centroids),
            QuantizeOutput { palette: centroids.palette(), counts },
        ),
        None => {
            tracing::debug!("no opaque pixels to quantize");
            (buffer.clone(), QuantizeOutput::default())
        }
    }
}

/// Reduces the opaque pixels of `buffer` to (at most) `k` colors in parallel,
/// also returning the palette that was used.
#[cfg(feature = "threads")]
#[must_use]
pub fn quantize_with_palette_par<R: Rng + ?Sized>(
    buffer: &PixelBuffer,
    k: PaletteSize,
    rng: &mut R,
) -> (PixelBuffer, QuantizeOutput) {
    match fit_par(&samples(buffer), k, rng) {
        Some((centroids, counts)) => (
            remap_par(buffer, &centroids),
            QuantizeOutput { palette: centroids.palette(), counts },
        ),
        None => {
            tracing::debug!("no opaque pixels to quantize");
            (buffer.clone(), QuantizeOutput::default())
        }
    }
}
