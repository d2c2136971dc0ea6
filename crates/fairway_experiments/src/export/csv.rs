use std::error::Error;

use crate::runner::RunArtifacts;

pub(crate) fn export_kpi_csv_impl(
    results: &[RunArtifacts],
    file: std::fs::File,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "label",
        "strategy",
        "seed",
        "orders_placed",
        "orders_delivered",
        "orders_undelivered",
        "orders_unassignable",
        "avg_delivery_min",
        "median_delivery_min",
        "stdev_delivery_min",
        "avg_wait_min",
        "median_wait_min",
        "orders_per_hour",
        "batched_pct",
        "on_time_delivery_pct",
        "on_time_wait_pct",
    ])?;

    for run in results {
        let report = &run.report;
        wtr.write_record([
            run.label.clone(),
            run.point.strategy.name().to_string(),
            run.point.seed.to_string(),
            report.orders_placed.to_string(),
            report.orders_delivered.to_string(),
            report.orders_undelivered.to_string(),
            report.orders_unassignable.to_string(),
            format!("{:.3}", report.delivery_time_min.avg),
            format!("{:.3}", report.delivery_time_min.median),
            format!("{:.3}", report.delivery_time_min.stdev),
            format!("{:.3}", report.wait_time_min.avg),
            format!("{:.3}", report.wait_time_min.median),
            format!("{:.3}", report.orders_per_hour),
            format!("{:.3}", report.batched_pct),
            format!("{:.3}", report.on_time_delivery_pct),
            format!("{:.3}", report.on_time_wait_pct),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
