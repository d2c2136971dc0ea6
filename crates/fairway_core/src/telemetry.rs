//! Telemetry: the line-oriented event log and per-order delivery samples.
//!
//! Records are append-only and written by event handlers; KPI computation
//! (see [`crate::kpi`]) is a pure function over the accumulated samples, so a
//! report can be taken mid-simulation without disturbing state.

use bevy_ecs::prelude::Resource;
use serde::Serialize;

/// One event-log line: `(t, kind, order_id?, asset_id?, detail)` with stable
/// field order and stable kind names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLogRecord {
    pub t_ms: u64,
    pub kind: &'static str,
    pub order_id: Option<u32>,
    pub asset_id: Option<u32>,
    pub detail: String,
}

impl EventLogRecord {
    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.t_ms,
            self.kind,
            self.order_id.map(|id| id.to_string()).unwrap_or_default(),
            self.asset_id.map(|id| id.to_string()).unwrap_or_default(),
            self.detail
        )
    }
}

/// One delivered order, recorded when the drop completes.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OrderSample {
    pub order_id: u32,
    pub asset_id: u32,
    pub placed_ms: u64,
    pub assigned_ms: u64,
    pub picked_up_ms: u64,
    pub delivered_ms: u64,
    pub delivered_hole: u8,
    pub batched: bool,
}

impl OrderSample {
    /// Minutes from placement to assignment.
    pub fn wait_min(&self) -> f64 {
        crate::clock::ms_to_mins(self.assigned_ms.saturating_sub(self.placed_ms))
    }

    /// Minutes from placement to the drop.
    pub fn total_min(&self) -> f64 {
        crate::clock::ms_to_mins(self.delivered_ms.saturating_sub(self.placed_ms))
    }
}

#[derive(Debug, Default, Resource)]
pub struct SimTelemetry {
    pub events: Vec<EventLogRecord>,
    pub order_samples: Vec<OrderSample>,
    pub orders_placed: u32,
    pub orders_unassignable: u32,
}

impl SimTelemetry {
    pub fn log(
        &mut self,
        t_ms: u64,
        kind: &'static str,
        order_id: Option<u32>,
        asset_id: Option<u32>,
        detail: impl Into<String>,
    ) {
        self.events.push(EventLogRecord {
            t_ms,
            kind,
            order_id,
            asset_id,
            detail: detail.into(),
        });
    }

    pub fn record_delivery(&mut self, sample: OrderSample) {
        self.order_samples.push(sample);
    }

    pub fn event_log_lines(&self) -> Vec<String> {
        self.events.iter().map(EventLogRecord::to_line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_line_has_stable_field_order() {
        let record = EventLogRecord {
            t_ms: 90_000,
            kind: "delivery_complete",
            order_id: Some(4),
            asset_id: Some(2),
            detail: "hole=5".into(),
        };
        assert_eq!(record.to_line(), "90000,delivery_complete,4,2,hole=5");

        let bare = EventLogRecord {
            t_ms: 0,
            kind: "simulation_started",
            order_id: None,
            asset_id: None,
            detail: String::new(),
        };
        assert_eq!(bare.to_line(), "0,simulation_started,,,");
    }

    #[test]
    fn sample_durations_convert_to_minutes() {
        let sample = OrderSample {
            order_id: 1,
            asset_id: 1,
            placed_ms: 60_000,
            assigned_ms: 120_000,
            picked_up_ms: 180_000,
            delivered_ms: 360_000,
            delivered_hole: 7,
            batched: false,
        };
        assert!((sample.wait_min() - 1.0).abs() < 1e-9);
        assert!((sample.total_min() - 5.0).abs() < 1e-9);
    }
}
