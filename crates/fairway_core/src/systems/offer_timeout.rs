//! Offer timeouts: resolve silent candidates when the window runs out.
//!
//! Timers are never cancelled; a fired event whose generation no longer
//! matches the live cascade was superseded and does nothing.

use bevy_ecs::prelude::{Commands, Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{Asset, AssetLocation, AssetStats, AssetStatus, Order, OrderItems, OrderTiming};
use crate::offer::{advance_cascade, retry_or_unassign, ArmOutcome, OfferProcess};
use crate::oracle::PredictionOracle;
use crate::scenario::OfferConfig;
use crate::telemetry::SimTelemetry;

#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn offer_timeout_system(
    mut commands: Commands,
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    oracle: Res<PredictionOracle>,
    offer_cfg: Res<OfferConfig>,
    mut telemetry: ResMut<SimTelemetry>,
    mut orders: Query<(Entity, &mut Order, &mut OrderTiming, &OrderItems)>,
    mut processes: Query<&mut OfferProcess>,
    mut assets: Query<(Entity, &mut Asset, &AssetLocation, &mut AssetStats)>,
) {
    if event.0.kind != EventKind::OfferTimeout {
        return;
    }
    let Some(EventSubject::Offer(order_entity, generation)) = event.0.subject else {
        return;
    };
    let Ok(mut process) = processes.get_mut(order_entity) else {
        return;
    };
    // Accepted offers resolve strictly inside the window and remove the
    // process; a live process at window end is a silent candidate or an
    // aborted commit, and either way the cascade moves on.
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

    if let Ok((_, mut asset, _, mut stats)) = assets.get_mut(candidate.asset) {
        if asset.status == AssetStatus::OfferPending {
            asset.status = AssetStatus::Available;
        }
        stats.offers_declined += 1;
        telemetry.log(
            now,
            "offer_timeout",
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
}
