//! GreedySearch benchmarks over random R-regular graphs.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;
use vamana::distance::{CachePolicy, DistanceCache};
use vamana::graph::Graph;
use vamana::point::{Point, PointStore};
use vamana::search::greedy_search;

fn random_graph(n: usize, dim: usize, r: usize, seed: u64) -> (PointStore, Graph, DistanceCache) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let points = PointStore::new(
        (0..n).map(|i| Point::new(i, (0..dim).map(|_| rng.random_range(-1.0..1.0)).collect())).collect(),
    )
    .unwrap();
    let mut graph = Graph::new(n);
    graph.seed_random_regular(r, &mut rng);
    let cache = DistanceCache::build(&points, CachePolicy::Matrix);
    (points, graph, cache)
}

fn bench_greedy_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy_search");

    for n in [1_000usize, 5_000] {
        let (points, graph, cache) = random_graph(n, 16, 16, 7);
        let query = vec![0.0_f32; 16];

        group.bench_with_input(BenchmarkId::new("k10_l32", n), &n, |bench, _| {
            bench.iter(|| black_box(greedy_search(&graph, &cache, &points, 0, &query, 10, 32).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_greedy_search);
criterion_main!(benches);
