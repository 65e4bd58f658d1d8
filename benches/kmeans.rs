#[path = "../util/util.rs"]
mod util;

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use pixiart::{kmeans, PaletteSize, PixelBuffer};
use rand::SeedableRng;
use rand_xoshiro::Xoroshiro128PlusPlus;

fn bench(
    c: &mut Criterion,
    group: &str,
    mut f: impl FnMut(&mut Bencher<WallTime>, &(PaletteSize, &PixelBuffer)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    let buffers = util::test_buffers();
    for (k, secs) in [(256, 4), (64, 3), (16, 2), (4, 2)] {
        let k = PaletteSize::new(k).unwrap();
        group.measurement_time(Duration::from_secs(secs));
        for (name, buffer) in &buffers {
            group.bench_with_input(BenchmarkId::new(k.to_string(), name), &(k, buffer), &mut f);
        }
    }
}

fn kmeans_palette_single(c: &mut Criterion) {
    bench(c, "kmeans_palette_single", |b, &(k, buffer)| {
        b.iter(|| kmeans::palette(buffer, k, &mut Xoroshiro128PlusPlus::seed_from_u64(0)));
    });
}

fn kmeans_palette_par(c: &mut Criterion) {
    bench(c, "kmeans_palette_par", |b, &(k, buffer)| {
        b.iter(|| kmeans::palette_par(buffer, k, &mut Xoroshiro128PlusPlus::seed_from_u64(0)));
    });
}

fn kmeans_quantize_single(c: &mut Criterion) {
    bench(c, "kmeans_quantize_single", |b, &(k, buffer)| {
        b.iter(|| kmeans::quantize(buffer, k, &mut Xoroshiro128PlusPlus::seed_from_u64(0)));
    });
}

fn kmeans_quantize_par(c: &mut Criterion) {
    bench(c, "kmeans_quantize_par", |b, &(k, buffer)| {
        b.iter(|| kmeans::quantize_par(buffer, k, &mut Xoroshiro128PlusPlus::seed_from_u64(0)));
    });
}

criterion_group!(
    benches,
    kmeans_palette_single,
    kmeans_palette_par,
    kmeans_quantize_single,
    kmeans_quantize_par,
);
criterion_main!(benches);
