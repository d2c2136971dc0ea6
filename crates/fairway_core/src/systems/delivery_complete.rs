//! Delivery completion: close out the order and record its sample.
//!
//! These events are scheduled at commit time for every drop, so in-flight
//! deliveries still land during the end-of-simulation drain.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::{Asset, AssetStats, Order, OrderState, OrderTiming};
use crate::telemetry::{OrderSample, SimTelemetry};

pub fn delivery_complete_system(
    event: Res<CurrentEvent>,
    mut telemetry: ResMut<SimTelemetry>,
    mut orders: Query<(&mut Order, &mut OrderTiming)>,
    mut assets: Query<(&mut Asset, &mut AssetStats)>,
) {
    if event.0.kind != EventKind::DeliveryComplete {
        return;
    }
    let Some(EventSubject::Order(order_entity)) = event.0.subject else {
        return;
    };
    let Ok((mut order, mut timing)) = orders.get_mut(order_entity) else {
        return;
    };
    if matches!(order.state, OrderState::Delivered | OrderState::Unassignable) {
        return;
    }
    let Some(asset_entity) = order.assigned_asset else {
        return;
    };
    let now = event.0.timestamp;

    order.state = OrderState::Delivered;
    timing.delivered_at = Some(now);

    let mut asset_id = 0;
    if let Ok((mut asset, mut stats)) = assets.get_mut(asset_entity) {
        asset_id = asset.id;
        stats.deliveries += 1;
        if order.batch_size >= 2 {
            stats.batched_deliveries += 1;
        }
        asset.queue.retain(|member| *member != order_entity);
    }

    let delivered_hole = order.delivery_hole.unwrap_or(order.target_hole);
    telemetry.record_delivery(OrderSample {
        order_id: order.id,
        asset_id,
        placed_ms: timing.placed_at,
        assigned_ms: timing.assigned_at.unwrap_or(timing.placed_at),
        picked_up_ms: timing.picked_up_at.unwrap_or(timing.placed_at),
        delivered_ms: now,
        delivered_hole,
        batched: order.batch_size >= 2,
    });
    telemetry.log(
        now,
        "delivery_complete",
        Some(order.id),
        Some(asset_id),
        format!("hole={delivered_hole}"),
    );
}
