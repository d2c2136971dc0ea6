//! Read-only fleet and order views handed to dispatch strategies.
//!
//! A snapshot is captured at handler entry; strategies and the batching
//! planner never touch live components. Asset and order lists are sorted by
//! id so iteration order is stable across runs.

use bevy_ecs::prelude::Entity;

use crate::course::{Location, TimeOfDay};
use crate::ecs::{AssetKind, AssetStatus, MenuItem};

#[derive(Debug, Clone)]
pub struct AssetView {
    pub entity: Entity,
    pub id: u32,
    pub name: String,
    pub kind: AssetKind,
    pub status: AssetStatus,
    pub location: Location,
    /// Orders on the asset's current run.
    pub active_orders: usize,
    /// Lifetime completed deliveries, used by load-balancing policies.
    pub completed_deliveries: u32,
    /// Minutes until the asset finishes its current run; 0 when available.
    pub available_in_min: f64,
    /// Where the asset will be when it becomes available.
    pub end_location: Location,
}

impl AssetView {
    pub fn is_available_now(&self) -> bool {
        self.status == AssetStatus::Available
    }
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub entity: Entity,
    pub id: u32,
    pub target_hole: u8,
    pub time_of_day: TimeOfDay,
    pub total_value: f64,
    pub placed_at_ms: u64,
    pub items: Vec<MenuItem>,
}

/// Immutable dispatch context: the fleet plus the pending pool the batching
/// planner may draw companions from.
#[derive(Debug, Clone)]
pub struct FleetSnapshot {
    pub now_ms: u64,
    pub assets: Vec<AssetView>,
    /// `Pending` orders other than the one under dispatch, sorted by id.
    pub pending_orders: Vec<OrderView>,
}

impl FleetSnapshot {
    pub fn new(now_ms: u64, mut assets: Vec<AssetView>, mut pending_orders: Vec<OrderView>) -> Self {
        assets.sort_by_key(|a| a.id);
        pending_orders.sort_by_key(|o| o.id);
        Self {
            now_ms,
            assets,
            pending_orders,
        }
    }

    pub fn asset(&self, entity: Entity) -> Option<&AssetView> {
        self.assets.iter().find(|a| a.entity == entity)
    }
}
