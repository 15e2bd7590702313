//! Benchmarks for the CPU simulation step and render feed.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use particle_playground::prelude::*;

const DT: f32 = 1.0 / 60.0;

/// A system on `preset`, stepped until its pool has filled up.
fn warmed_up(preset: Preset, capacity: usize) -> ParticleSystem {
    let scenarios = ScenarioController::new(capacity, Mesh::empty(), Mesh::empty());
    let mut system = ParticleSystem::with_seed(7);
    system.configure(scenarios.config_for(preset));
    for _ in 0..120 {
        system.step(DT);
    }
    system
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for preset in [
        Preset::SphereBurst,
        Preset::FountainBounce,
        Preset::BoxColliders,
        Preset::SphereJet,
        Preset::AttractorSwirl,
        Preset::Cloth,
    ] {
        let mut system = warmed_up(preset, 20_000);
        group.bench_function(preset.label(), |b| b.iter(|| system.step(black_box(DT))));
    }

    group.finish();
}

fn bench_pool_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("fountain_by_capacity");

    for capacity in [1_000, 10_000, 100_000] {
        let mut system = warmed_up(Preset::FountainBounce, capacity);
        group.bench_with_input(BenchmarkId::new("particles", capacity), &capacity, |b, _| {
            b.iter(|| system.step(black_box(DT)))
        });
    }

    group.finish();
}

fn bench_render_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_feed");
    let view_proj = Camera::new().view_proj(16.0 / 9.0);
    let mut feed = RenderFeed::default();

    let mut free = warmed_up(Preset::SphereBurst, 20_000);
    group.bench_function("sorted", |b| {
        b.iter(|| {
            free.prepare_render_feed(black_box(view_proj), &mut feed);
            black_box(feed.len())
        })
    });

    let mut grid = warmed_up(Preset::Cloth, 0);
    group.bench_function("grid", |b| {
        b.iter(|| {
            grid.prepare_render_feed(black_box(view_proj), &mut feed);
            black_box(feed.len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_step, bench_pool_size, bench_render_feed);
criterion_main!(benches);
