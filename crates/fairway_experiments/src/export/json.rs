use std::error::Error;

use serde::Serialize;

use fairway_core::kpi::KpiReport;

use crate::runner::RunArtifacts;

#[derive(Serialize)]
struct RunSummary<'a> {
    label: &'a str,
    strategy: &'a str,
    seed: u64,
    report: &'a KpiReport,
}

pub(crate) fn export_reports_json_impl(
    results: &[RunArtifacts],
    file: std::fs::File,
) -> Result<(), Box<dyn Error>> {
    let summaries: Vec<RunSummary<'_>> = results
        .iter()
        .map(|run| RunSummary {
            label: &run.label,
            strategy: run.point.strategy.name(),
            seed: run.point.seed,
            report: &run.report,
        })
        .collect();
    serde_json::to_writer_pretty(file, &summaries)?;
    Ok(())
}
