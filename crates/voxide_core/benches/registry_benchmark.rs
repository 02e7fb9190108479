//! # Registry Benchmark
//!
//! Measures the hot paths of the capability runtime:
//! - multi-type queries over a populated registry
//! - a full system tick resolving two bindings per entity
//!
//! Run with: `cargo bench --package voxide_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use voxide_core::{tags, CapabilityKey, Elapsed, Registry, SharedRegistry, SystemBuilder};

#[derive(Clone, Copy)]
struct Position(f64);

#[derive(Clone, Copy)]
struct Velocity(f64);

fn populated(count: usize) -> SharedRegistry {
    let registry = Registry::new().shared();
    {
        let mut r = registry.borrow_mut();
        for i in 0..count {
            let id = r.create();
            r.add(id, Position(0.0)).ok();
            // Every third entity is static.
            if i % 3 != 0 {
                r.add(id, Velocity(1.0)).ok();
            }
        }
    }
    registry
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_position_velocity");

    for count in [1_000, 10_000, 100_000] {
        let registry = populated(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(registry.borrow().query(&tags![Position, Velocity]).len()));
        });
    }

    group.finish();
}

fn bench_system_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("system_tick");

    for count in [1_000, 10_000] {
        let registry = populated(count);
        let mut builder = SystemBuilder::new(&registry);
        let velocity = builder.read(&CapabilityKey::<Velocity>::identity());
        let position = builder.write(&CapabilityKey::<Position>::identity());
        builder.body(move |_, elapsed| {
            let step = velocity.get()?.0 * elapsed.as_secs_f64();
            position.update(|p| p.0 += step)?;
            Ok(())
        });
        let mut system = builder.build();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(system.tick(Elapsed::from_millis(16.0)).ok()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_query, bench_system_tick);
criterion_main!(benches);
