//! Performance benchmarks for fairway_core using Criterion.rs.

use bevy_ecs::prelude::World;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fairway_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use fairway_core::scenario::{build_scenario, ScenarioParams};
use fairway_core::strategy::StrategyKind;

fn bench_simulation_run(c: &mut Criterion) {
    // (name, order interval minutes, staff)
    let scenarios = vec![
        ("steady", 6.0, 2),
        ("busy", 2.0, 3),
        ("saturated", 0.75, 4),
    ];

    let mut group = c.benchmark_group("simulation_run");
    for (name, interval, staff) in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(interval, staff),
            |b, &(interval, staff)| {
                b.iter(|| {
                    let mut world = World::new();
                    let params = ScenarioParams::default()
                        .with_seed(42)
                        .with_duration_min(240.0)
                        .with_order_interval(interval, interval / 4.0)
                        .with_fleet(2, staff);
                    build_scenario(&mut world, params).expect("scenario builds");
                    initialize_simulation(&mut world);
                    let mut schedule = simulation_schedule();
                    black_box(run_until_empty(&mut world, &mut schedule, 2_000_000));
                });
            },
        );
    }
    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_full_run");
    for strategy in [
        StrategyKind::CartPreference,
        StrategyKind::FastestEta,
        StrategyKind::BatchOrders,
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(strategy.name()),
            &strategy,
            |b, &strategy| {
                b.iter(|| {
                    let mut world = World::new();
                    let params = ScenarioParams::default()
                        .with_seed(7)
                        .with_strategy(strategy)
                        .with_duration_min(180.0)
                        .with_order_interval(2.0, 0.5)
                        .with_fleet(2, 3);
                    build_scenario(&mut world, params).expect("scenario builds");
                    initialize_simulation(&mut world);
                    let mut schedule = simulation_schedule();
                    black_box(run_until_empty(&mut world, &mut schedule, 2_000_000));
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_simulation_run, bench_strategies);
criterion_main!(benches);
