//! Preset runs and the reproducibility guarantee.

use fairway_experiments::{presets, rank_by_avg_delivery, run_single, StrategySweep};
use fairway_core::strategy::StrategyKind;

#[test]
fn rush_hour_with_the_same_seed_is_bit_identical() {
    let points = StrategySweep::new(presets::rush_hour())
        .with_strategies(vec![StrategyKind::CartPreference])
        .with_seeds(vec![42])
        .generate();

    let first = run_single(&points[0]);
    let second = run_single(&points[0]);

    assert_eq!(first.event_log, second.event_log);
    assert_eq!(
        serde_json::to_string(&first.report).unwrap(),
        serde_json::to_string(&second.report).unwrap()
    );
    assert!(first.report.orders_placed > 0);
}

#[test]
fn rush_hour_actually_delivers_and_batches() {
    let points = StrategySweep::new(presets::rush_hour())
        .with_strategies(vec![StrategyKind::BatchOrders])
        .with_seeds(vec![42])
        .generate();
    let run = run_single(&points[0]);

    assert!(run.report.orders_delivered > 0);
    assert!(run.report.batched_pct <= 100.0);
    // Heavy overlapping demand with an aggressive batching policy should
    // consolidate at least some sweeps.
    assert!(run.report.batched_pct > 0.0);
    // Utilization is a percentage per asset type.
    for (_, pct) in &run.report.utilization_by_type_pct {
        assert!((0.0..=100.0).contains(pct));
    }
}

#[test]
fn ranking_orders_runs_by_average_delivery() {
    let base = presets::quiet_morning().with_duration_min(60.0);
    let points = StrategySweep::new(base)
        .with_strategies(vec![StrategyKind::CartPreference, StrategyKind::Random])
        .with_seeds(vec![5])
        .generate();
    let results: Vec<_> = points.iter().map(run_single).collect();
    let order = rank_by_avg_delivery(&results);
    assert_eq!(order.len(), 2);
    let best = &results[order[0]].report;
    let worst = &results[order[1]].report;
    if best.orders_delivered > 0 && worst.orders_delivered > 0 {
        assert!(best.delivery_time_min.avg <= worst.delivery_time_min.avg);
    }
}
