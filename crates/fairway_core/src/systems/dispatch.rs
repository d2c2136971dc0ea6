//! Dispatch: snapshot the fleet, ask the strategy, start the offer cascade.

use bevy_ecs::prelude::{Commands, Entity, Query, Res, ResMut};

use crate::clock::{ms_to_mins, CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::course::CourseMap;
use crate::ecs::{
    ActiveRoute, Asset, AssetLocation, AssetStats, AssetStatus, Order, OrderItems, OrderState,
    OrderTiming,
};
use crate::offer::{advance_cascade, retry_or_unassign, ArmOutcome, OfferProcess};
use crate::oracle::PredictionOracle;
use crate::scenario::{BatchingConfig, DispatchTuning, OfferConfig};
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};
use crate::strategy::{Decision, DispatchStrategyResource, StrategyContext};
use crate::telemetry::SimTelemetry;

#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn dispatch_system(
    mut commands: Commands,
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    course: Res<CourseMap>,
    oracle: Res<PredictionOracle>,
    tuning: Res<DispatchTuning>,
    batching_cfg: Res<BatchingConfig>,
    offer_cfg: Res<OfferConfig>,
    strategy: Res<DispatchStrategyResource>,
    mut telemetry: ResMut<SimTelemetry>,
    mut orders: Query<(Entity, &mut Order, &mut OrderTiming, &OrderItems)>,
    processes: Query<&OfferProcess>,
    mut assets: Query<(
        Entity,
        &mut Asset,
        &AssetLocation,
        &mut AssetStats,
        Option<&ActiveRoute>,
    )>,
) {
    if event.0.kind != EventKind::DispatchOrder {
        return;
    }
    let Some(EventSubject::Order(order_entity)) = event.0.subject else {
        return;
    };
    let now = clock.now();

    // An outstanding offer elsewhere may already carry this order as a batch
    // member; let that offer resolve before dispatching it separately.
    for process in processes.iter() {
        if let Some(candidate) = process.current_candidate() {
            if candidate.batch.contains(&order_entity) {
                let resume = (process.armed_at_ms + offer_cfg.window_ms + 1).max(now);
                clock.schedule_at(
                    resume,
                    EventKind::DispatchOrder,
                    Some(EventSubject::Order(order_entity)),
                );
                return;
            }
        }
    }

    // Snapshot at handler entry; the strategy never sees live components.
    let (order_view, snapshot) = {
        let Ok((_, order, timing, items)) = orders.get(order_entity) else {
            return;
        };
        if order.state != OrderState::Pending {
            return;
        }
        let order_view = OrderView {
            entity: order_entity,
            id: order.id,
            target_hole: order.target_hole,
            time_of_day: order.time_of_day,
            total_value: order.total_value,
            placed_at_ms: timing.placed_at,
            items: items.0.clone(),
        };

        let mut views = Vec::new();
        for (entity, asset, location, stats, route) in assets.iter() {
            let (available_in_min, end_location) = match route {
                Some(route) => (
                    ms_to_mins(route.remaining_ms(now)),
                    route.end_location().unwrap_or(location.0),
                ),
                None => (0.0, location.0),
            };
            views.push(AssetView {
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
            });
        }

        let mut pending = Vec::new();
        for (entity, order, timing, items) in orders.iter() {
            if entity != order_entity && order.state == OrderState::Pending {
                pending.push(OrderView {
                    entity,
                    id: order.id,
                    target_hole: order.target_hole,
                    time_of_day: order.time_of_day,
                    total_value: order.total_value,
                    placed_at_ms: timing.placed_at,
                    items: items.0.clone(),
                });
            }
        }
        (order_view, FleetSnapshot::new(now, views, pending))
    };

    let ctx = StrategyContext {
        course: &course,
        oracle: &oracle,
        tuning: &tuning,
        batching: &batching_cfg,
    };

    match strategy.choose(&order_view, &snapshot, &ctx) {
        Decision::NoCandidate => {
            let Ok((_, mut order, _, _)) = orders.get_mut(order_entity) else {
                return;
            };
            telemetry.log(
                now,
                "dispatch_order",
                Some(order.id),
                None,
                "no_candidate".to_string(),
            );
            retry_or_unassign(order_entity, &mut order, &mut clock, &mut telemetry, &offer_cfg);
        }
        Decision::Delay { until_ms } => {
            telemetry.log(
                now,
                "dispatch_order",
                Some(order_view.id),
                None,
                format!("delayed_until={}", until_ms.max(now)),
            );
            clock.schedule_at(
                until_ms.max(now),
                EventKind::DispatchOrder,
                Some(EventSubject::Order(order_entity)),
            );
        }
        Decision::Assign { ranked } => {
            let Ok((_, mut order, mut timing, _)) = orders.get_mut(order_entity) else {
                return;
            };
            telemetry.log(
                now,
                "dispatch_order",
                Some(order.id),
                None,
                format!("candidates={}", ranked.len()),
            );
            let mut process = OfferProcess::new(ranked);
            let outcome = advance_cascade(
                &mut process,
                order_entity,
                order.id,
                &mut timing,
                &mut clock,
                &mut telemetry,
                &oracle,
                &offer_cfg,
                |asset_entity| {
                    let Ok((_, mut asset, _, mut stats, _)) = assets.get_mut(asset_entity) else {
                        return None;
                    };
                    if asset.status != AssetStatus::Available {
                        return None;
                    }
                    asset.status = AssetStatus::OfferPending;
                    stats.offers_received += 1;
                    Some(asset.id)
                },
            );
            match outcome {
                ArmOutcome::Armed => {
                    order.state = OrderState::Offered;
                    commands.entity(order_entity).insert(process);
                }
                ArmOutcome::Exhausted => {
                    retry_or_unassign(
                        order_entity,
                        &mut order,
                        &mut clock,
                        &mut telemetry,
                        &offer_cfg,
                    );
                }
            }
        }
    }
}
