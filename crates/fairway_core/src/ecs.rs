//! Components and state enums for orders and delivery assets.
//!
//! Orders and assets are entities in the ECS world; systems query and mutate
//! them in response to events. State enums represent lifecycle stages and are
//! kept monotone by the systems that advance them.

use bevy_ecs::prelude::{Component, Entity, Resource};

use crate::course::{Location, Nine, TimeOfDay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Pending,
    Offered,
    Assigned,
    InDelivery,
    Delivered,
    Unassignable,
}

impl OrderState {
    /// Position in the lifecycle; transitions only move forward, except the
    /// bounded `Offered → Pending` reset on a fully declined cascade.
    pub fn rank(self) -> u8 {
        match self {
            OrderState::Pending => 0,
            OrderState::Offered => 1,
            OrderState::Assigned => 2,
            OrderState::InDelivery => 3,
            OrderState::Delivered => 4,
            OrderState::Unassignable => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::Offered => "offered",
            OrderState::Assigned => "assigned",
            OrderState::InDelivery => "in_delivery",
            OrderState::Delivered => "delivered",
            OrderState::Unassignable => "unassignable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemComplexity {
    Simple,
    Medium,
    Complex,
}

impl ItemComplexity {
    pub fn prep_factor(self) -> f64 {
        match self {
            ItemComplexity::Simple => 0.8,
            ItemComplexity::Medium => 1.0,
            ItemComplexity::Complex => 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub name: String,
    pub quantity: u32,
    pub complexity: ItemComplexity,
    pub unit_price: f64,
}

impl MenuItem {
    pub fn line_value(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

#[derive(Debug, Clone, Component)]
pub struct Order {
    pub id: u32,
    pub state: OrderState,
    /// Hole the golfer ordered from. The planner targets the predicted hole
    /// at arrival time, which may differ.
    pub target_hole: u8,
    pub time_of_day: TimeOfDay,
    pub total_value: f64,
    pub retry_count: u32,
    pub assigned_asset: Option<Entity>,
    /// Size of the committed batch this order belongs to (1 = solo).
    pub batch_size: u32,
    /// Drop hole committed at assignment (the predicted golfer position).
    pub delivery_hole: Option<u8>,
}

#[derive(Debug, Clone, Component, Default)]
pub struct OrderItems(pub Vec<MenuItem>);

impl OrderItems {
    pub fn total_value(&self) -> f64 {
        self.0.iter().map(MenuItem::line_value).sum()
    }
}

/// Lifecycle timestamps, all in simulation ms and non-decreasing.
#[derive(Debug, Clone, Copy, Component, Default)]
pub struct OrderTiming {
    pub placed_at: u64,
    pub first_offered_at: Option<u64>,
    /// Number of individual offers armed for this order across all cascades.
    pub offer_count: u32,
    pub assigned_at: Option<u64>,
    pub picked_up_at: Option<u64>,
    pub delivered_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    BeverageCart(Nine),
    DeliveryStaff,
}

impl AssetKind {
    pub fn is_cart(&self) -> bool {
        matches!(self, AssetKind::BeverageCart(_))
    }

    /// The nine a cart is restricted to; staff roam freely.
    pub fn nine(&self) -> Option<Nine> {
        match self {
            AssetKind::BeverageCart(nine) => Some(*nine),
            AssetKind::DeliveryStaff => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AssetKind::BeverageCart(_) => "beverage_cart",
            AssetKind::DeliveryStaff => "delivery_staff",
        }
    }

    pub fn serves(&self, hole: u8) -> bool {
        match self.nine() {
            Some(nine) => nine.contains(hole),
            None => (1..=crate::course::HOLE_COUNT).contains(&hole),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    Available,
    OfferPending,
    EnRouteToPickup,
    AtStore,
    EnRouteToCustomer,
    Returning,
    Offline,
}

impl AssetStatus {
    /// Whether time in this status accrues as active (vs idle) time.
    pub fn is_active(self) -> bool {
        !matches!(self, AssetStatus::Available | AssetStatus::Offline)
    }

    pub fn name(self) -> &'static str {
        match self {
            AssetStatus::Available => "available",
            AssetStatus::OfferPending => "offer_pending",
            AssetStatus::EnRouteToPickup => "en_route_to_pickup",
            AssetStatus::AtStore => "at_store",
            AssetStatus::EnRouteToCustomer => "en_route_to_customer",
            AssetStatus::Returning => "returning",
            AssetStatus::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, Component)]
pub struct Asset {
    pub id: u32,
    pub name: String,
    pub kind: AssetKind,
    pub status: AssetStatus,
    /// Orders committed to this asset's current delivery run, in drop order.
    pub queue: Vec<Entity>,
}

#[derive(Debug, Clone, Copy, Component)]
pub struct AssetLocation(pub Location);

/// Cumulative per-asset counters feeding the KPI report.
#[derive(Debug, Clone, Copy, Component, Default)]
pub struct AssetStats {
    pub active_ms: u64,
    pub idle_ms: u64,
    pub deliveries: u32,
    pub batched_deliveries: u32,
    pub holes_traveled: u32,
    pub offers_received: u32,
    pub offers_accepted: u32,
    pub offers_declined: u32,
}

/// What a route leg is for. Drop legs carry the order entity they serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegKind {
    ToPickup,
    AtStore,
    ToDrop(Entity),
    Return,
}

#[derive(Debug, Clone)]
pub struct RouteLeg {
    pub kind: LegKind,
    /// Node sequence traversed by this leg (0 = clubhouse). Empty for dwell
    /// legs such as `AtStore`.
    pub path: Vec<u8>,
    pub depart_ms: u64,
    pub arrive_ms: u64,
}

/// Precomputed delivery run for a busy asset. `AssetArrived` events fire at
/// each leg's `arrive_ms`; location ticks interpolate within the current leg.
#[derive(Debug, Clone, Component)]
pub struct ActiveRoute {
    pub legs: Vec<RouteLeg>,
    pub current_leg: usize,
}

impl ActiveRoute {
    pub fn current(&self) -> Option<&RouteLeg> {
        self.legs.get(self.current_leg)
    }

    /// When the whole run (including the return leg) finishes.
    pub fn completes_at(&self) -> u64 {
        self.legs.last().map(|leg| leg.arrive_ms).unwrap_or(0)
    }

    /// Remaining run time from `now_ms`, for soon-available candidate checks.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.completes_at().saturating_sub(now_ms)
    }

    /// Where the asset will stand once the run is over.
    pub fn end_location(&self) -> Option<Location> {
        let last = self.legs.iter().rev().find(|leg| !leg.path.is_empty())?;
        match last.path.last() {
            Some(&crate::course::CLUBHOUSE_NODE) => Some(Location::Clubhouse),
            Some(&hole) => Some(Location::Hole(hole)),
            None => None,
        }
    }
}

/// Monotone id sources for readable order/asset ids in logs and exports.
#[derive(Debug, Default, Resource)]
pub struct IdSequences {
    next_order: u32,
    next_asset: u32,
}

impl IdSequences {
    pub fn next_order_id(&mut self) -> u32 {
        self.next_order += 1;
        self.next_order
    }

    pub fn next_asset_id(&mut self) -> u32 {
        self.next_asset += 1;
        self.next_asset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_state_ranks_are_monotone() {
        let states = [
            OrderState::Pending,
            OrderState::Offered,
            OrderState::Assigned,
            OrderState::InDelivery,
            OrderState::Delivered,
        ];
        for pair in states.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn cart_serves_only_its_nine() {
        let cart = AssetKind::BeverageCart(Nine::Front);
        assert!(cart.serves(5));
        assert!(!cart.serves(14));
        let staff = AssetKind::DeliveryStaff;
        assert!(staff.serves(5));
        assert!(staff.serves(14));
    }

    #[test]
    fn active_statuses_exclude_available_and_offline() {
        assert!(!AssetStatus::Available.is_active());
        assert!(!AssetStatus::Offline.is_active());
        assert!(AssetStatus::EnRouteToCustomer.is_active());
        assert!(AssetStatus::OfferPending.is_active());
    }
}
