//! KPI extraction from finished (or mid-flight) simulation worlds.

use bevy_ecs::prelude::World;

use fairway_core::clock::ms_to_mins;
use fairway_core::ecs::{Asset, AssetStats};
use fairway_core::kpi::KpiReport;
use fairway_core::scenario::{DeliveryTargets, SimulationEndTimeMs};
use fairway_core::telemetry::{OrderSample, SimTelemetry};

use crate::runner::RunArtifacts;

/// Compute the full KPI report for a simulation world. Read-only with respect
/// to simulation state, so it can be taken mid-run.
pub fn extract_report(world: &mut World) -> KpiReport {
    let duration_min = ms_to_mins(world.resource::<SimulationEndTimeMs>().0);
    let targets = *world.resource::<DeliveryTargets>();
    let assets: Vec<(Asset, AssetStats)> = world
        .query::<(&Asset, &AssetStats)>()
        .iter(world)
        .map(|(asset, stats)| (asset.clone(), *stats))
        .collect();
    let telemetry = world.resource::<SimTelemetry>();
    KpiReport::compute(
        telemetry,
        assets.iter().map(|(asset, stats)| (asset, stats)),
        duration_min,
        &targets,
    )
}

pub fn extract_event_log(world: &World) -> Vec<String> {
    world.resource::<SimTelemetry>().event_log_lines()
}

pub fn extract_order_samples(world: &World) -> Vec<OrderSample> {
    world.resource::<SimTelemetry>().order_samples.clone()
}

/// Indices of `results` ordered best-first by average delivery time; runs
/// with no deliveries sort last.
pub fn rank_by_avg_delivery(results: &[RunArtifacts]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..results.len()).collect();
    order.sort_by(|a, b| {
        let key = |idx: usize| {
            let report = &results[idx].report;
            if report.orders_delivered == 0 {
                f64::INFINITY
            } else {
                report.delivery_time_min.avg
            }
        };
        key(*a)
            .partial_cmp(&key(*b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}
