//! Benchmarks for region aggregation and normalization

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;

use neurofuse_core::{normalize, EvokedResponse, NormAxis, RegionAggregator};

/// Synthetic CTF-style evoked response: 272 channels over 17 regions.
fn generate_evoked(n_times: usize) -> EvokedResponse {
    const REGIONS: [&str; 17] = [
        "LC", "LF", "LO", "LP", "LT", "RC", "RF", "RO", "RP", "RT", "ZC", "ZF", "ZO", "ZP", "LA", "RA", "ZA",
    ];
    let n_channels = 272;
    let names = (0..n_channels)
        .map(|i| format!("M{}{:02}", REGIONS[i % REGIONS.len()], i / REGIONS.len()))
        .collect();
    let data = Array2::from_shape_fn((n_channels, n_times), |(c, t)| {
        ((c * 31 + t) as f64 * 0.01).sin() * 1e-13
    });
    EvokedResponse::from_meg(names, data).expect("names match rows")
}

fn bench_lfp_vector(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfp_vector");
    let aggregator = RegionAggregator::default();

    for n_times in [200, 600, 1200].iter() {
        let evoked = generate_evoked(*n_times);
        let order = aggregator.get_regions(&evoked);

        group.bench_with_input(BenchmarkId::from_parameter(n_times), n_times, |b, _| {
            b.iter(|| black_box(aggregator.compute_lfp_vector(&order, black_box(&evoked))));
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    // 40 subjects × a downsampled FA volume
    let matrix = Array2::from_shape_fn((40, 50_000), |(s, v)| ((s * 7 + v) % 101) as f64 / 101.0);

    for axis in [NormAxis::Global, NormAxis::Features, NormAxis::Subjects] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{axis:?}")), &axis, |b, &axis| {
            b.iter(|| black_box(normalize(black_box(&matrix), axis)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lfp_vector, bench_normalize);
criterion_main!(benches);
