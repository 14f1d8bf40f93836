//! Criterion benchmarks for the clustering and tour-search backends.
//!
//! Measures k-means grouping and cheapest-arc sequencing across problem sizes
//! to catch regressions in the CPU-bound stages of planning.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package dispatch-solver
//! ```

#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use dispatch_core::{GroupAssigner, TourSolver};
use dispatch_solver::{CheapestArcSolver, KMeansAssigner};


use bench_support::{BENCHMARK_SEED, generate_matrix, generate_orders};

/// Order counts to cluster.
const ORDER_COUNTS: &[usize] = &[50, 200, 1000];

/// Stop counts for a single truck's tour.
const TOUR_SIZES: &[usize] = &[10, 25, 50];

/// Fleet size used while clustering.
const TRUCKS: usize = 5;

/// Tour time limit; generous so the search converges rather than times out.
const TOUR_LIMIT: Duration = Duration::from_secs(2);

fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans_assign");
    let assigner = KMeansAssigner::default();

    for &count in ORDER_COUNTS {
        let orders = generate_orders(count, BENCHMARK_SEED);
        group.throughput(Throughput::Elements(u64::try_from(count).unwrap_or(u64::MAX)));
        group.bench_with_input(BenchmarkId::new("orders", count), &orders, |b, orders| {
            b.iter(|| black_box(assigner.assign(orders, TRUCKS)));
        });
    }

    group.finish();
}

fn bench_cheapest_arc(c: &mut Criterion) {
    let mut group = c.benchmark_group("cheapest_arc_tour");
    let solver = CheapestArcSolver::default();

    for &size in TOUR_SIZES {
        let matrix = generate_matrix(size, BENCHMARK_SEED);
        group.throughput(Throughput::Elements(u64::try_from(size).unwrap_or(u64::MAX)));
        group.bench_with_input(BenchmarkId::new("stops", size), &matrix, |b, matrix| {
            b.iter(|| black_box(solver.solve(matrix, TOUR_LIMIT)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_kmeans, bench_cheapest_arc);
criterion_main!(benches);
