use centertrack::cost::GATED_COST;
use centertrack::{GreedySolver, HungarianSolver};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use rand::prelude::*;

/// Distance matrix where roughly `gated_fraction` of the pairs are gated out
fn generate_cost_matrix(detections: usize, tracks: usize, gated_fraction: f64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(7);
    Array2::from_shape_fn((detections, tracks), |_| {
        if rng.gen_bool(gated_fraction) {
            GATED_COST
        } else {
            rng.gen_range(0.0..4.0)
        }
    })
}

fn bench_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("assignment");

    for size in [10usize, 50, 100] {
        let cost_matrix = generate_cost_matrix(size, size, 0.8);

        group.bench_with_input(BenchmarkId::new("hungarian", size), &cost_matrix, |b, m| {
            b.iter(|| HungarianSolver::solve(black_box(m.view())))
        });
        group.bench_with_input(BenchmarkId::new("greedy", size), &cost_matrix, |b, m| {
            b.iter(|| GreedySolver::solve(black_box(m.view())))
        });
    }

    group.finish();
}

fn bench_rectangular(c: &mut Criterion) {
    // More detections than tracks, as after a busy frame
    let cost_matrix = generate_cost_matrix(80, 30, 0.7);

    c.bench_function("hungarian_80x30", |b| {
        b.iter(|| HungarianSolver::solve(black_box(cost_matrix.view())))
    });
}

criterion_group!(benches, bench_solvers, bench_rectangular);
criterion_main!(benches);
