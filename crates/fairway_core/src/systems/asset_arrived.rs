//! Waypoint arrivals: advance an asset along its committed route.

use bevy_ecs::prelude::{Commands, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::course::{Location, CLUBHOUSE_NODE};
use crate::ecs::{
    ActiveRoute, Asset, AssetLocation, AssetStats, AssetStatus, LegKind, Order, OrderState,
};
use crate::telemetry::SimTelemetry;

fn leg_hops(path: &[u8]) -> u32 {
    path.len().saturating_sub(1) as u32
}

fn leg_end_location(path: &[u8]) -> Option<Location> {
    match path.last() {
        Some(&CLUBHOUSE_NODE) => Some(Location::Clubhouse),
        Some(&hole) => Some(Location::Hole(hole)),
        None => None,
    }
}

#[allow(clippy::type_complexity)]
pub fn asset_arrived_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    mut telemetry: ResMut<SimTelemetry>,
    mut orders: Query<&mut Order>,
    mut assets: Query<(
        &mut Asset,
        &mut AssetLocation,
        &mut AssetStats,
        &mut ActiveRoute,
    )>,
) {
    if event.0.kind != EventKind::AssetArrived {
        return;
    }
    let Some(EventSubject::Asset(asset_entity)) = event.0.subject else {
        return;
    };
    let Ok((mut asset, mut location, mut stats, mut route)) = assets.get_mut(asset_entity) else {
        return;
    };
    let now = event.0.timestamp;
    let Some(leg) = route.current().cloned() else {
        return;
    };
    if now < leg.arrive_ms {
        return;
    }

    match leg.kind {
        LegKind::ToPickup => {
            location.0 = Location::Clubhouse;
            stats.holes_traveled += leg_hops(&leg.path);
            asset.status = AssetStatus::AtStore;
            telemetry.log(now, "asset_arrived", None, Some(asset.id), "at_store");
        }
        LegKind::AtStore => {
            // Goods in hand: everything on the queue is now out for delivery.
            asset.status = AssetStatus::EnRouteToCustomer;
            for member in asset.queue.clone() {
                if let Ok(mut order) = orders.get_mut(member) {
                    if order.state == OrderState::Assigned {
                        order.state = OrderState::InDelivery;
                    }
                }
            }
            telemetry.log(now, "asset_arrived", None, Some(asset.id), "departed_store");
        }
        LegKind::ToDrop(_) => {
            if let Some(spot) = leg_end_location(&leg.path) {
                location.0 = spot;
            }
            stats.holes_traveled += leg_hops(&leg.path);
            telemetry.log(
                now,
                "asset_arrived",
                None,
                Some(asset.id),
                format!("drop_hole={}", leg.path.last().copied().unwrap_or_default()),
            );
        }
        LegKind::Return => {
            location.0 = Location::Clubhouse;
            stats.holes_traveled += leg_hops(&leg.path);
        }
    }

    route.current_leg += 1;
    match route.legs.get(route.current_leg) {
        None => {
            asset.status = AssetStatus::Available;
            commands.entity(asset_entity).remove::<ActiveRoute>();
            telemetry.log(now, "asset_arrived", None, Some(asset.id), "run_complete");
        }
        Some(next) if next.kind == LegKind::Return => {
            asset.status = AssetStatus::Returning;
        }
        Some(_) => {}
    }
}
