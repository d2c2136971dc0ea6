//! Offer responses: commit an accepted offer or advance past a decline.

use bevy_ecs::prelude::{Commands, Entity, Query, Res, ResMut};

use crate::batching::plan_route;
use crate::clock::{mins_to_ms, CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::course::{CourseMap, Location, CLUBHOUSE_NODE};
use crate::ecs::{
    ActiveRoute, Asset, AssetLocation, AssetStats, AssetStatus, LegKind, Order, OrderItems,
    OrderState, OrderTiming, RouteLeg,
};
use crate::offer::{advance_cascade, retry_or_unassign, ArmOutcome, OfferProcess};
use crate::oracle::PredictionOracle;
use crate::scenario::{BatchingConfig, DispatchTuning, OfferConfig};
use crate::snapshot::{AssetView, OrderView};
use crate::strategy::StrategyContext;
use crate::telemetry::SimTelemetry;

fn staff_node(location: &Location) -> u8 {
    match location {
        Location::Clubhouse => CLUBHOUSE_NODE,
        Location::Hole(h) => *h,
        Location::OnSegment { to, .. } => *to,
    }
}

#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn offer_response_system(
    mut commands: Commands,
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    course: Res<CourseMap>,
    oracle: Res<PredictionOracle>,
    tuning: Res<DispatchTuning>,
    batching_cfg: Res<BatchingConfig>,
    offer_cfg: Res<OfferConfig>,
    mut telemetry: ResMut<SimTelemetry>,
    mut orders: Query<(Entity, &mut Order, &mut OrderTiming, &OrderItems)>,
    mut processes: Query<&mut OfferProcess>,
    mut assets: Query<(Entity, &mut Asset, &AssetLocation, &mut AssetStats)>,
) {
    if event.0.kind != EventKind::OfferResponse {
        return;
    }
    let Some(EventSubject::Offer(order_entity, generation)) = event.0.subject else {
        return;
    };
    let Ok(mut process) = processes.get_mut(order_entity) else {
        return;
    };
    if process.generation != generation {
        return;
    }
    let Some(candidate) = process.current_candidate().cloned() else {
        return;
    };
    let now = clock.now();
    let Ok((_, order_ro, _, _)) = orders.get(order_entity) else {
        return;
    };
    let primary_id = order_ro.id;

    if !process.will_accept {
        // Explicit decline: free the candidate and walk on at this timestamp.
        if let Ok((_, mut asset, _, mut stats)) = assets.get_mut(candidate.asset) {
            if asset.status == AssetStatus::OfferPending {
                asset.status = AssetStatus::Available;
            }
            stats.offers_declined += 1;
            telemetry.log(
                now,
                "offer_declined",
                Some(primary_id),
                Some(asset.id),
                String::new(),
            );
        }
        process.current += 1;
        let Ok((_, mut order, mut timing, _)) = orders.get_mut(order_entity) else {
            return;
        };
        let outcome = advance_cascade(
            &mut process,
            order_entity,
            primary_id,
            &mut timing,
            &mut clock,
            &mut telemetry,
            &oracle,
            &offer_cfg,
            |asset_entity| {
                let Ok((_, mut asset, _, mut stats)) = assets.get_mut(asset_entity) else {
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
        if outcome == ArmOutcome::Exhausted {
            commands.entity(order_entity).remove::<OfferProcess>();
            retry_or_unassign(order_entity, &mut order, &mut clock, &mut telemetry, &offer_cfg);
        }
        return;
    }

    // --- acceptance: commit the assignment ---
    let Ok((asset_entity, mut asset, asset_loc, mut stats)) = assets.get_mut(candidate.asset)
    else {
        return;
    };
    if asset.status != AssetStatus::OfferPending {
        return;
    }
    let is_cart = asset.kind.is_cart();

    // Companions may have been assigned elsewhere while the offer was out.
    let mut member_views: Vec<OrderView> = Vec::new();
    for member in &candidate.batch {
        let Ok((entity, order, timing, items)) = orders.get(*member) else {
            continue;
        };
        let still_open = if entity == order_entity {
            order.state == OrderState::Offered
        } else {
            order.state == OrderState::Pending
        };
        if still_open {
            member_views.push(OrderView {
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
    member_views.sort_by_key(|v| (v.entity != order_entity, v.id));
    if member_views.first().map(|v| v.entity) != Some(order_entity) {
        return;
    }

    let asset_view = AssetView {
        entity: asset_entity,
        id: asset.id,
        name: asset.name.clone(),
        kind: asset.kind,
        status: AssetStatus::Available,
        location: asset_loc.0,
        active_orders: 0,
        completed_deliveries: stats.deliveries,
        available_in_min: 0.0,
        end_location: asset_loc.0,
    };
    let ctx = StrategyContext {
        course: &course,
        oracle: &oracle,
        tuning: &tuning,
        batching: &batching_cfg,
    };
    let member_refs: Vec<&OrderView> = member_views.iter().collect();
    let plan = match plan_route(&ctx, &asset_view, &member_refs, now) {
        Ok(plan) => plan,
        Err(err) => {
            // Planner handed us an unroutable batch; drop the offer rather
            // than corrupt fleet state.
            telemetry.log(
                now,
                "zone_violation",
                Some(primary_id),
                Some(asset.id),
                err.to_string(),
            );
            asset.status = AssetStatus::Available;
            commands.entity(order_entity).remove::<OfferProcess>();
            if let Ok((_, mut order, _, _)) = orders.get_mut(order_entity) {
                retry_or_unassign(order_entity, &mut order, &mut clock, &mut telemetry, &offer_cfg);
            }
            return;
        }
    };

    let k = plan.stops.len();
    let factor = batching_cfg.efficiency_bonus.powi(k as i32 - 1);
    let mut legs: Vec<RouteLeg> = Vec::new();

    if !is_cart {
        let from_node = staff_node(&asset_loc.0);
        let store_path = match course.staff_path(from_node, CLUBHOUSE_NODE) {
            Ok((path, _)) => path,
            Err(_) => vec![from_node, CLUBHOUSE_NODE],
        };
        let store_arrive = now + mins_to_ms(plan.store_travel_min * factor);
        legs.push(RouteLeg {
            kind: LegKind::ToPickup,
            path: store_path,
            depart_ms: now,
            arrive_ms: store_arrive,
        });
        let depart_store = now + mins_to_ms(plan.pickup_offset_min);
        legs.push(RouteLeg {
            kind: LegKind::AtStore,
            path: Vec::new(),
            depart_ms: store_arrive,
            arrive_ms: depart_store.max(store_arrive),
        });
    }

    let mut prev_ms = legs.last().map(|leg| leg.arrive_ms).unwrap_or(now);
    let mut prev_node = if is_cart {
        staff_node(&asset_loc.0)
    } else {
        CLUBHOUSE_NODE
    };
    for stop in &plan.stops {
        let path = if is_cart {
            course.cart_path(prev_node, stop.hole)
        } else {
            course.staff_path(prev_node, stop.hole).map(|(path, _)| path)
        };
        let Ok(path) = path else {
            telemetry.log(
                now,
                "zone_violation",
                Some(stop.order_id),
                Some(asset.id),
                format!("no path {prev_node}->{}", stop.hole),
            );
            return;
        };
        let arrive = (now + mins_to_ms(stop.arrive_offset_min)).max(prev_ms);
        legs.push(RouteLeg {
            kind: LegKind::ToDrop(stop.order),
            path,
            depart_ms: prev_ms,
            arrive_ms: arrive,
        });
        prev_ms = arrive;
        prev_node = stop.hole;
    }
    if !is_cart {
        let return_path = match course.staff_path(prev_node, CLUBHOUSE_NODE) {
            Ok((path, _)) => path,
            Err(_) => vec![prev_node, CLUBHOUSE_NODE],
        };
        legs.push(RouteLeg {
            kind: LegKind::Return,
            path: return_path,
            depart_ms: prev_ms,
            arrive_ms: prev_ms + mins_to_ms(plan.return_min),
        });
    }

    for leg in &legs {
        clock.schedule_at(
            leg.arrive_ms,
            EventKind::AssetArrived,
            Some(EventSubject::Asset(asset_entity)),
        );
        if let LegKind::ToDrop(member) = leg.kind {
            clock.schedule_at(
                leg.arrive_ms,
                EventKind::DeliveryComplete,
                Some(EventSubject::Order(member)),
            );
        }
    }

    let picked_up_ms = if is_cart {
        now
    } else {
        now + mins_to_ms(plan.pickup_offset_min)
    };

    asset.status = if is_cart {
        AssetStatus::EnRouteToCustomer
    } else {
        AssetStatus::EnRouteToPickup
    };
    asset.queue = plan.stops.iter().map(|stop| stop.order).collect();
    stats.offers_accepted += 1;
    let asset_id = asset.id;
    commands.entity(asset_entity).insert(ActiveRoute {
        legs,
        current_leg: 0,
    });

    for stop in &plan.stops {
        let Ok((_, mut order, mut timing, _)) = orders.get_mut(stop.order) else {
            continue;
        };
        order.state = if is_cart {
            OrderState::InDelivery
        } else {
            OrderState::Assigned
        };
        order.assigned_asset = Some(asset_entity);
        order.batch_size = k as u32;
        order.delivery_hole = Some(stop.hole);
        timing.assigned_at = Some(now);
        timing.picked_up_at = Some(picked_up_ms);
        telemetry.log(
            now,
            "assignment",
            Some(order.id),
            Some(asset_id),
            format!("drop_hole={} batch={k}", stop.hole),
        );
    }
    telemetry.log(
        now,
        "offer_accepted",
        Some(primary_id),
        Some(asset_id),
        format!("batch={k} eta={:.1}", candidate.score.eta_min),
    );
    commands.entity(order_entity).remove::<OfferProcess>();
}
