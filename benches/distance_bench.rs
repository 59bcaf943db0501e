//! Euclidean distance and distance-cache benchmarks.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use vamana::distance::{euclidean, euclidean_unchecked, CachePolicy, DistanceCache};
use vamana::point::{Point, PointStore};

fn bench_euclidean_by_dimension(c: &mut Criterion) {
    let mut group = c.benchmark_group("euclidean_by_dimension");

    for dims in [8, 16, 64, 128, 768] {
        group.throughput(Throughput::Elements(dims));
        let a: Vec<f32> = (0..dims).map(|i| (i as f32).sin()).collect();
        let b: Vec<f32> = (0..dims).map(|i| (i as f32).cos()).collect();

        group.bench_with_input(BenchmarkId::new("checked", dims), &dims, |bench, _| {
            bench.iter(|| black_box(euclidean(black_box(&a), black_box(&b)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("unchecked", dims), &dims, |bench, _| {
            bench.iter(|| black_box(euclidean_unchecked(black_box(&a), black_box(&b))));
        });
    }

    group.finish();
}

fn bench_distance_cache_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance_cache_build");
    group.sample_size(20);

    for n in [100usize, 500, 1000] {
        let points = PointStore::new(
            (0..n).map(|i| Point::new(i, (0..16).map(|d| ((i + d) as f32).sin()).collect())).collect(),
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::new("matrix", n), &n, |bench, _| {
            bench.iter(|| black_box(DistanceCache::build(&points, CachePolicy::Matrix)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_euclidean_by_dimension, bench_distance_cache_build);
criterion_main!(benches);
