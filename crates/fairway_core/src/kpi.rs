//! KPI report: pure aggregation over telemetry samples and asset counters.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ecs::{Asset, AssetStats};
use crate::scenario::DeliveryTargets;
use crate::telemetry::SimTelemetry;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DistributionStats {
    pub avg: f64,
    pub median: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
}

impl DistributionStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let n = sorted.len();
        let avg = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        let variance = sorted.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n as f64;
        Self {
            avg,
            median,
            stdev: variance.sqrt(),
            min: sorted[0],
            max: sorted[n - 1],
        }
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Per-asset KPI row.
#[derive(Debug, Clone, Serialize)]
pub struct AssetKpiRow {
    pub asset_id: u32,
    pub name: String,
    pub kind: &'static str,
    pub deliveries: u32,
    pub batched_deliveries: u32,
    pub active_min: f64,
    pub idle_min: f64,
    pub utilization_pct: f64,
    pub holes_traveled: u32,
    pub offers_received: u32,
    pub offers_accepted: u32,
    pub offers_declined: u32,
}

/// Full KPI map. Numeric fields are minutes, counts, or percentages (0–100).
#[derive(Debug, Clone, Serialize)]
pub struct KpiReport {
    pub duration_min: f64,
    pub orders_placed: u32,
    pub orders_delivered: u32,
    pub orders_undelivered: u32,
    pub orders_unassignable: u32,
    pub delivery_time_min: DistributionStats,
    pub wait_time_min: DistributionStats,
    pub orders_per_hour: f64,
    pub batched_pct: f64,
    pub on_time_delivery_pct: f64,
    pub on_time_wait_pct: f64,
    pub utilization_by_type_pct: BTreeMap<&'static str, f64>,
    pub assets: Vec<AssetKpiRow>,
}

fn pct(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

impl KpiReport {
    pub fn compute<'a>(
        telemetry: &SimTelemetry,
        assets: impl IntoIterator<Item = (&'a Asset, &'a AssetStats)>,
        duration_min: f64,
        targets: &DeliveryTargets,
    ) -> Self {
        let samples = &telemetry.order_samples;
        let delivery_values: Vec<f64> = samples.iter().map(|s| s.total_min()).collect();
        let wait_values: Vec<f64> = samples.iter().map(|s| s.wait_min()).collect();

        let delivered = samples.len();
        let batched = samples.iter().filter(|s| s.batched).count();
        let on_time_delivery = delivery_values
            .iter()
            .filter(|v| **v <= targets.delivery_time_min)
            .count();
        let on_time_wait = wait_values
            .iter()
            .filter(|v| **v <= targets.wait_time_min)
            .count();

        let mut rows: Vec<AssetKpiRow> = Vec::new();
        let mut type_active: BTreeMap<&'static str, (u64, u64)> = BTreeMap::new();
        for (asset, stats) in assets {
            let busy = stats.active_ms + stats.idle_ms;
            let kind = asset.kind.name();
            let entry = type_active.entry(kind).or_insert((0, 0));
            entry.0 += stats.active_ms;
            entry.1 += busy;
            rows.push(AssetKpiRow {
                asset_id: asset.id,
                name: asset.name.clone(),
                kind,
                deliveries: stats.deliveries,
                batched_deliveries: stats.batched_deliveries,
                active_min: crate::clock::ms_to_mins(stats.active_ms),
                idle_min: crate::clock::ms_to_mins(stats.idle_ms),
                utilization_pct: if busy == 0 {
                    0.0
                } else {
                    stats.active_ms as f64 / busy as f64 * 100.0
                },
                holes_traveled: stats.holes_traveled,
                offers_received: stats.offers_received,
                offers_accepted: stats.offers_accepted,
                offers_declined: stats.offers_declined,
            });
        }
        rows.sort_by_key(|row| row.asset_id);

        let utilization_by_type_pct = type_active
            .into_iter()
            .map(|(kind, (active, total))| {
                let value = if total == 0 {
                    0.0
                } else {
                    active as f64 / total as f64 * 100.0
                };
                (kind, value)
            })
            .collect();

        KpiReport {
            duration_min,
            orders_placed: telemetry.orders_placed,
            orders_delivered: delivered as u32,
            orders_undelivered: telemetry.orders_placed.saturating_sub(delivered as u32),
            orders_unassignable: telemetry.orders_unassignable,
            delivery_time_min: DistributionStats::from_values(&delivery_values),
            wait_time_min: DistributionStats::from_values(&wait_values),
            orders_per_hour: if duration_min > 0.0 {
                delivered as f64 / (duration_min / 60.0)
            } else {
                0.0
            },
            batched_pct: pct(batched, delivered),
            on_time_delivery_pct: pct(on_time_delivery, delivered),
            on_time_wait_pct: pct(on_time_wait, delivered),
            utilization_by_type_pct,
            assets: rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::OrderSample;

    fn sample(order_id: u32, placed_min: f64, assigned_min: f64, delivered_min: f64, batched: bool) -> OrderSample {
        OrderSample {
            order_id,
            asset_id: 1,
            placed_ms: crate::clock::mins_to_ms(placed_min),
            assigned_ms: crate::clock::mins_to_ms(assigned_min),
            picked_up_ms: crate::clock::mins_to_ms(assigned_min),
            delivered_ms: crate::clock::mins_to_ms(delivered_min),
            delivered_hole: 5,
            batched,
        }
    }

    #[test]
    fn distribution_stats_match_hand_computation() {
        let stats = DistributionStats::from_values(&[10.0, 20.0, 30.0, 40.0]);
        assert!((stats.avg - 25.0).abs() < 1e-9);
        assert!((stats.median - 25.0).abs() < 1e-9);
        assert!((stats.min - 10.0).abs() < 1e-9);
        assert!((stats.max - 40.0).abs() < 1e-9);
        assert!((stats.range() - 30.0).abs() < 1e-9);
        // Population stdev of {10,20,30,40}.
        assert!((stats.stdev - 125.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn empty_distribution_is_zeroed() {
        let stats = DistributionStats::from_values(&[]);
        assert_eq!(stats.avg, 0.0);
        assert_eq!(stats.median, 0.0);
    }

    #[test]
    fn batched_pct_counts_orders_in_batches() {
        let mut telemetry = SimTelemetry::default();
        telemetry.orders_placed = 4;
        telemetry.record_delivery(sample(1, 0.0, 2.0, 12.0, true));
        telemetry.record_delivery(sample(2, 0.0, 2.0, 14.0, true));
        telemetry.record_delivery(sample(3, 5.0, 6.0, 20.0, false));

        let targets = DeliveryTargets {
            delivery_time_min: 15.0,
            wait_time_min: 3.0,
        };
        let report = KpiReport::compute(&telemetry, std::iter::empty(), 60.0, &targets);

        assert_eq!(report.orders_delivered, 3);
        assert_eq!(report.orders_undelivered, 1);
        assert!((report.batched_pct - 200.0 / 3.0).abs() < 1e-9);
        assert!((report.orders_per_hour - 3.0).abs() < 1e-9);
        // Two of three within the 15-minute delivery target.
        assert!((report.on_time_delivery_pct - 200.0 / 3.0).abs() < 1e-9);
        assert!((report.on_time_wait_pct - 100.0).abs() < 1e-9);
    }
}
