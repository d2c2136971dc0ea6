//! Upstream adapter surface: the only mutators the core accepts from outside
//! simulation mode. The HTTP/WebSocket layer drives a long-lived world
//! through these; every change still flows through the event queue so the
//! single-writer discipline is preserved.

use std::cmp::Ordering;

use bevy_ecs::prelude::{Entity, World};

use crate::clock::{ms_to_mins, EventKind, EventSubject, SimulationClock};
use crate::course::{CourseMap, Location, Nine, TimeOfDay};
use crate::ecs::{
    ActiveRoute, Asset, AssetKind, AssetLocation, AssetStats, AssetStatus, IdSequences, MenuItem,
    Order, OrderItems, OrderState, OrderTiming,
};
use crate::error::DispatchError;
use crate::oracle::PredictionOracle;
use crate::scenario::{BatchingConfig, DispatchTuning};
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};
use crate::strategy::{
    eligible_candidates, DispatchStrategyResource, ScoreBreakdown, StrategyContext,
};

#[derive(Debug, Clone)]
pub struct AssetSummary {
    pub entity: Entity,
    pub id: u32,
    pub name: String,
    pub kind: AssetKind,
    pub status: AssetStatus,
    pub location: Location,
    pub queued_orders: usize,
    pub deliveries: u32,
}

/// One candidate's score breakdown for a pending order, best first.
#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub entity: Entity,
    pub asset_id: u32,
    pub name: String,
    pub score: ScoreBreakdown,
}

#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub entity: Entity,
    pub id: u32,
    pub state: OrderState,
    pub target_hole: u8,
    pub total_value: f64,
    pub placed_at_ms: u64,
    pub delivered_at_ms: Option<u64>,
}

fn unknown(kind: &'static str, entity: Entity) -> DispatchError {
    DispatchError::UnknownId {
        kind,
        id: entity.index(),
    }
}

/// Create a pending order and feed it through the normal arrival pipeline.
pub fn create_order(
    world: &mut World,
    target_hole: u8,
    items: Vec<MenuItem>,
) -> Result<Entity, DispatchError> {
    Nine::of_hole(target_hole)?;
    if items.iter().any(|item| item.quantity == 0 || item.unit_price < 0.0) {
        return Err(DispatchError::InvalidInput(
            "order items need positive quantity and non-negative price".into(),
        ));
    }
    let now = world.resource::<SimulationClock>().now();
    let total_value: f64 = items.iter().map(MenuItem::line_value).sum();
    let id = world.resource_mut::<IdSequences>().next_order_id();
    let entity = world
        .spawn((
            Order {
                id,
                state: OrderState::Pending,
                target_hole,
                time_of_day: TimeOfDay::from_sim_ms(now),
                total_value,
                retry_count: 0,
                assigned_asset: None,
                batch_size: 1,
                delivery_hole: None,
            },
            OrderItems(items),
            OrderTiming {
                placed_at: now,
                ..OrderTiming::default()
            },
        ))
        .id();
    world.resource_mut::<SimulationClock>().schedule_in(
        0,
        EventKind::OrderArrival,
        Some(EventSubject::Order(entity)),
    );
    Ok(entity)
}

/// Kick dispatch for a pending order.
pub fn dispatch_order(world: &mut World, order: Entity) -> Result<(), DispatchError> {
    let state = world
        .get::<Order>(order)
        .ok_or_else(|| unknown("order", order))?
        .state;
    if state != OrderState::Pending {
        return Err(DispatchError::InvalidInput(format!(
            "order is {} — only pending orders can be dispatched",
            state.name()
        )));
    }
    world.resource_mut::<SimulationClock>().schedule_in(
        0,
        EventKind::DispatchOrder,
        Some(EventSubject::Order(order)),
    );
    Ok(())
}

/// Force-complete an assigned order (manual override from the service layer).
pub fn complete_order(world: &mut World, order: Entity) -> Result<(), DispatchError> {
    let state = world
        .get::<Order>(order)
        .ok_or_else(|| unknown("order", order))?
        .state;
    if !matches!(state, OrderState::Assigned | OrderState::InDelivery) {
        return Err(DispatchError::InvalidInput(format!(
            "order is {} — only assigned orders can be completed",
            state.name()
        )));
    }
    world.resource_mut::<SimulationClock>().schedule_in(
        0,
        EventKind::DeliveryComplete,
        Some(EventSubject::Order(order)),
    );
    Ok(())
}

/// Live GPS-style location update. Carts are pinned to their nine.
pub fn update_asset_location(
    world: &mut World,
    asset: Entity,
    location: Location,
) -> Result<(), DispatchError> {
    let kind = world
        .get::<Asset>(asset)
        .ok_or_else(|| unknown("asset", asset))?
        .kind;
    if let Some(nine) = kind.nine() {
        if location.nine() != Some(nine) {
            return Err(DispatchError::ZoneViolation(format!(
                "cart is restricted to the {} nine",
                nine.name()
            )));
        }
    }
    world
        .get_mut::<AssetLocation>(asset)
        .ok_or_else(|| unknown("asset", asset))?
        .0 = location;
    Ok(())
}

/// External status override. `OfferPending` is owned by the offer protocol
/// and cannot be set from outside.
pub fn update_asset_status(
    world: &mut World,
    asset: Entity,
    status: AssetStatus,
) -> Result<(), DispatchError> {
    if status == AssetStatus::OfferPending {
        return Err(DispatchError::InvalidInput(
            "offer_pending is managed by the offer protocol".into(),
        ));
    }
    world
        .get_mut::<Asset>(asset)
        .ok_or_else(|| unknown("asset", asset))?
        .status = status;
    Ok(())
}

/// Score every eligible candidate for a pending order through the active
/// strategy, best first. Read-only: the service layer uses this to explain
/// what dispatch would do before (or instead of) kicking it off.
pub fn score_candidates(
    world: &mut World,
    order: Entity,
) -> Result<Vec<CandidateScore>, DispatchError> {
    let now = world.resource::<SimulationClock>().now();

    let mut order_view: Option<OrderView> = None;
    let mut pending: Vec<OrderView> = Vec::new();
    for (entity, o, timing, items) in world
        .query::<(Entity, &Order, &OrderTiming, &OrderItems)>()
        .iter(world)
    {
        let view = OrderView {
            entity,
            id: o.id,
            target_hole: o.target_hole,
            time_of_day: o.time_of_day,
            total_value: o.total_value,
            placed_at_ms: timing.placed_at,
            items: items.0.clone(),
        };
        if entity == order {
            if o.state != OrderState::Pending {
                return Err(DispatchError::InvalidInput(format!(
                    "order is {} — only pending orders can be scored",
                    o.state.name()
                )));
            }
            order_view = Some(view);
        } else if o.state == OrderState::Pending {
            pending.push(view);
        }
    }
    let order_view = order_view.ok_or_else(|| unknown("order", order))?;

    let views: Vec<AssetView> = world
        .query::<(
            Entity,
            &Asset,
            &AssetLocation,
            &AssetStats,
            Option<&ActiveRoute>,
        )>()
        .iter(world)
        .map(|(entity, asset, location, stats, route)| {
            let (available_in_min, end_location) = match route {
                Some(route) => (
                    ms_to_mins(route.remaining_ms(now)),
                    route.end_location().unwrap_or(location.0),
                ),
                None => (0.0, location.0),
            };
            AssetView {
                entity,
                id: asset.id,
                name: asset.name.clone(),
                kind: asset.kind,
                status: asset.status,
                location: location.0,
                active_orders: asset.queue.len(),
                completed_deliveries: stats.deliveries,
                available_in_min,
                end_location,
            }
        })
        .collect();
    let snapshot = FleetSnapshot::new(now, views, pending);

    let course = world.resource::<CourseMap>();
    let oracle = world.resource::<PredictionOracle>();
    let tuning = world.resource::<DispatchTuning>();
    let batching = world.resource::<BatchingConfig>();
    let strategy = world.resource::<DispatchStrategyResource>();
    let ctx = StrategyContext {
        course,
        oracle,
        tuning,
        batching,
    };

    let mut rows = Vec::new();
    for asset in eligible_candidates(&order_view, &snapshot, &ctx) {
        let score = strategy.score(asset, &order_view, &snapshot, &ctx)?;
        if score.is_eligible() {
            rows.push(CandidateScore {
                entity: asset.entity,
                asset_id: asset.id,
                name: asset.name.clone(),
                score,
            });
        }
    }
    rows.sort_by(|a, b| {
        a.score
            .final_score
            .partial_cmp(&b.score.final_score)
            .unwrap_or(Ordering::Equal)
            .then(a.asset_id.cmp(&b.asset_id))
    });
    Ok(rows)
}

pub fn list_assets(world: &mut World) -> Vec<AssetSummary> {
    let mut rows: Vec<AssetSummary> = world
        .query::<(Entity, &Asset, &AssetLocation, &AssetStats)>()
        .iter(world)
        .map(|(entity, asset, location, stats)| AssetSummary {
            entity,
            id: asset.id,
            name: asset.name.clone(),
            kind: asset.kind,
            status: asset.status,
            location: location.0,
            queued_orders: asset.queue.len(),
            deliveries: stats.deliveries,
        })
        .collect();
    rows.sort_by_key(|row| row.id);
    rows
}

pub fn list_orders(world: &mut World) -> Vec<OrderSummary> {
    let mut rows: Vec<OrderSummary> = world
        .query::<(Entity, &Order, &OrderTiming)>()
        .iter(world)
        .map(|(entity, order, timing)| OrderSummary {
            entity,
            id: order.id,
            state: order.state,
            target_hole: order.target_hole,
            total_value: order.total_value,
            placed_at_ms: timing.placed_at,
            delivered_at_ms: timing.delivered_at,
        })
        .collect();
    rows.sort_by_key(|row| row.id);
    rows
}
