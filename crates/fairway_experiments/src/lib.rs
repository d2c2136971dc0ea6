//! Experimentation harness for the fairway dispatch engine.
//!
//! Runs scenario presets and strategy/seed sweeps in parallel, extracts KPI
//! reports, and exports results to CSV, JSON, and Parquet for analysis.
//!
//! # Quick Start
//!
//! ```no_run
//! use fairway_experiments::{presets, run_parallel, StrategySweep};
//!
//! let sweep = StrategySweep::new(presets::rush_hour()).with_seeds(vec![42, 43, 44]);
//! let results = run_parallel(sweep.generate(), None);
//! for run in &results {
//!     println!("{}: avg delivery {:.1} min", run.label, run.report.delivery_time_min.avg);
//! }
//! ```

pub mod export;
pub mod metrics;
pub mod parameters;
pub mod presets;
pub mod runner;

pub use metrics::{extract_report, rank_by_avg_delivery};
pub use parameters::{StrategySweep, SweepPoint};
pub use runner::{run_parallel, run_parallel_with_progress, run_single, RunArtifacts};
