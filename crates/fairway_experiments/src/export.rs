//! Result export: KPI tables to CSV, full reports to JSON, per-order rows to
//! Parquet, and the raw line-oriented event log.

pub mod csv;
pub mod json;
pub mod parquet;

use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::runner::RunArtifacts;

pub use parquet::write_order_samples_parquet;

/// One KPI row per run.
pub fn export_kpi_csv<P: AsRef<Path>>(
    path: P,
    results: &[RunArtifacts],
) -> Result<(), Box<dyn Error>> {
    csv::export_kpi_csv_impl(results, File::create(path)?)
}

/// Full KPI reports (including per-asset rows) as a JSON array.
pub fn export_reports_json<P: AsRef<Path>>(
    path: P,
    results: &[RunArtifacts],
) -> Result<(), Box<dyn Error>> {
    json::export_reports_json_impl(results, File::create(path)?)
}

/// The event log of one run, exactly as the engine recorded it.
pub fn export_event_log<P: AsRef<Path>>(
    path: P,
    run: &RunArtifacts,
) -> Result<(), Box<dyn Error>> {
    let mut file = File::create(path)?;
    writeln!(file, "t_ms,kind,order_id,asset_id,detail")?;
    for line in &run.event_log {
        writeln!(file, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::StrategySweep;
    use crate::presets;
    use crate::runner::run_single;
    use fairway_core::strategy::StrategyKind;

    fn small_run() -> RunArtifacts {
        let base = presets::quiet_morning().with_duration_min(60.0);
        let points = StrategySweep::new(base)
            .with_strategies(vec![StrategyKind::CartPreference])
            .with_seeds(vec![42])
            .generate();
        run_single(&points[0])
    }

    #[test]
    fn exports_round_trip_through_the_filesystem() {
        let run = small_run();
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("kpis.csv");
        export_kpi_csv(&csv_path, std::slice::from_ref(&run)).unwrap();
        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv_text.starts_with("label,strategy,seed"));
        assert_eq!(csv_text.lines().count(), 2);

        let json_path = dir.path().join("reports.json");
        export_reports_json(&json_path, std::slice::from_ref(&run)).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert!(value[0]["report"]["orders_placed"].as_u64().unwrap() > 0);

        let log_path = dir.path().join("events.csv");
        export_event_log(&log_path, &run).unwrap();
        let log_text = std::fs::read_to_string(&log_path).unwrap();
        assert!(log_text.contains("simulation_started"));
        assert!(log_text.contains("simulation_end"));

        let parquet_path = dir.path().join("orders.parquet");
        write_order_samples_parquet(&parquet_path, &run.order_samples).unwrap();
        assert!(std::fs::metadata(&parquet_path).unwrap().len() > 0);
    }
}
