//! Parallel simulation execution using rayon.

use bevy_ecs::prelude::World;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use fairway_core::kpi::KpiReport;
use fairway_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use fairway_core::scenario::build_scenario;
use fairway_core::telemetry::OrderSample;

use crate::metrics::{extract_event_log, extract_order_samples, extract_report};
use crate::parameters::SweepPoint;

const MAX_STEPS: usize = 2_000_000;

/// Everything one run produces: the KPI report, the raw event log, and the
/// per-order samples.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub label: String,
    pub point: SweepPoint,
    pub report: KpiReport,
    pub event_log: Vec<String>,
    pub order_samples: Vec<OrderSample>,
}

/// Run one sweep point to completion.
pub fn run_single(point: &SweepPoint) -> RunArtifacts {
    let mut world = World::new();
    build_scenario(&mut world, point.params.clone()).expect("sweep point must be a valid scenario");
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    run_until_empty(&mut world, &mut schedule, MAX_STEPS);

    let report = extract_report(&mut world);
    RunArtifacts {
        label: point.label.clone(),
        point: point.clone(),
        report,
        event_log: extract_event_log(&world),
        order_samples: extract_order_samples(&world),
    }
}

/// Run sweep points concurrently across CPU cores. Results keep input order.
pub fn run_parallel(points: Vec<SweepPoint>, num_threads: Option<usize>) -> Vec<RunArtifacts> {
    run_parallel_with_progress(points, num_threads, false)
}

pub fn run_parallel_with_progress(
    points: Vec<SweepPoint>,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Vec<RunArtifacts> {
    let total = points.len();
    let bar = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .expect("static template is valid")
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().expect("thread pool builds");

    let bar_ref = bar.clone();
    let results = pool.install(|| {
        points
            .par_iter()
            .map(|point| {
                let result = run_single(point);
                if let Some(ref bar) = bar_ref {
                    bar.inc(1);
                }
                result
            })
            .collect()
    });

    if let Some(ref bar) = bar {
        bar.finish_with_message("done");
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::StrategySweep;
    use crate::presets;
    use fairway_core::strategy::StrategyKind;

    #[test]
    fn single_run_produces_a_report() {
        let sweep = StrategySweep::new(presets::quiet_morning())
            .with_strategies(vec![StrategyKind::CartPreference])
            .with_seeds(vec![11]);
        let points = sweep.generate();
        let run = run_single(&points[0]);
        assert!(run.report.orders_placed > 0);
        assert!(!run.event_log.is_empty());
    }

    #[test]
    fn parallel_runs_keep_input_order() {
        let sweep = StrategySweep::new(presets::quiet_morning())
            .with_strategies(vec![StrategyKind::FastestEta, StrategyKind::Nearest])
            .with_seeds(vec![1, 2]);
        let points = sweep.generate();
        let labels: Vec<String> = points.iter().map(|p| p.label.clone()).collect();
        let results = run_parallel(points, Some(2));
        assert_eq!(results.len(), 4);
        let result_labels: Vec<String> = results.iter().map(|r| r.label.clone()).collect();
        assert_eq!(labels, result_labels);
    }
}
