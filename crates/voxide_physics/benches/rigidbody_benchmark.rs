//! # Rigidbody Benchmark
//!
//! Bodies falling onto a voxel floor and sliding along it.
//!
//! Run with: `cargo bench --package voxide_physics`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use voxide_core::{Elapsed, Registry};
use voxide_physics::{
    Aabb, Colliders, Gravity, Length, Position, RigidbodySimulation, Vec3, Velocity, VoxelGeometry,
    WorldGeometry,
};

fn floor(size: i32) -> Arc<VoxelGeometry> {
    let geometry = Arc::new(VoxelGeometry::new());
    geometry.fill((-size, -1, -size), (size, -1, size));
    geometry
}

fn bench_voxel_query(c: &mut Criterion) {
    let geometry = floor(64);
    let region = Aabb::from_meters([-0.3, -0.5, -0.3], [0.3, 1.8, 0.3]);
    c.bench_function("voxel_collisions_body_sized", |b| {
        b.iter(|| black_box(geometry.collisions(black_box(&region)).len()));
    });
}

fn bench_simulation_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("rigidbody_tick");

    for count in [100_i32, 1_000] {
        let registry = Registry::new().shared();
        {
            let mut r = registry.borrow_mut();
            for i in 0..count {
                let id = r.create();
                let x = f64::from(i % 32) - 16.0;
                let z = f64::from(i / 32 % 32) - 16.0;
                r.add(id, Position(Vec3::from_si([x, 2.0, z]))).ok();
                r.add(id, Velocity(Vec3::from_si([1.0, 0.0, 0.5]))).ok();
                r.add(id, Gravity::earth()).ok();
                r.add(
                    id,
                    Colliders(vec![Aabb::footprint(Length::meters(0.6), Length::meters(1.8))]),
                )
                .ok();
            }
        }
        let mut simulation = RigidbodySimulation::new(&registry, floor(64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(simulation.tick(Elapsed::from_millis(16.0)).ok()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_voxel_query, bench_simulation_tick);
criterion_main!(benches);
