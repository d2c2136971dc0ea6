//! Shared multi-factor scoring used by the built-in strategies.
//!
//! ```text
//! final = 1.0·eta + 0.5·distance + 0.3·asset_type + 0.2·predictability
//! ```
//! plus any batch adjustment computed by the planner. Lower is better.

use std::cmp::Ordering;

use crate::clock::{mins_to_ms, ms_to_mins};
use crate::course::{CourseMap, Location};
use crate::ecs::AssetStatus;
use crate::error::DispatchError;
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};

use super::types::{Decision, RankedCandidate, ScoreBreakdown, StrategyContext};

pub(crate) const ETA_WEIGHT: f64 = 1.0;
pub(crate) const DISTANCE_WEIGHT: f64 = 0.5;
pub(crate) const ASSET_TYPE_WEIGHT: f64 = 0.3;
pub(crate) const PREDICTABILITY_WEIGHT: f64 = 0.2;
/// Type-component value for a cart inside the preference window; the 0.3
/// weight turns it into the documented −0.3 bias.
pub(crate) const CART_BONUS: f64 = -1.0;

/// All assets allowed to serve this order right now or soon: available, or
/// busy but finishing within the soon-available window. Assets holding an
/// outstanding offer are never candidates.
pub fn eligible_candidates<'a>(
    order: &OrderView,
    snapshot: &'a FleetSnapshot,
    ctx: &StrategyContext<'_>,
) -> Vec<&'a AssetView> {
    snapshot
        .assets
        .iter()
        .filter(|asset| {
            if !asset.kind.serves(order.target_hole) {
                return false;
            }
            match asset.status {
                AssetStatus::Available => true,
                AssetStatus::Offline | AssetStatus::OfferPending => false,
                _ => asset.available_in_min <= ctx.tuning.soon_available_min,
            }
        })
        .collect()
}

/// Where and when an asset can have the goods in hand for an order.
pub(crate) struct PickupPlan {
    /// Travel origin for the delivery leg: the cart's own position, or the
    /// clubhouse for staff.
    pub origin: Location,
    /// Minutes before the delivery leg can start: remaining busy time, plus
    /// (for staff) the store run overlapped with prep.
    pub lead_min: f64,
    /// Hole-count distance to the pickup, for the acceptance model.
    pub pickup_distance_holes: f64,
}

pub(crate) fn pickup_plan(
    ctx: &StrategyContext<'_>,
    asset: &AssetView,
    order: &OrderView,
) -> Result<PickupPlan, DispatchError> {
    let base_loc = if asset.is_available_now() {
        asset.location
    } else {
        asset.end_location
    };
    let delay = asset.available_in_min;
    if asset.kind.is_cart() {
        // Carts carry stock on board; the "pickup" is reaching the golfer.
        return Ok(PickupPlan {
            origin: base_loc,
            lead_min: delay,
            pickup_distance_holes: ctx.course.approx_hole_distance(&base_loc, order.target_hole),
        });
    }
    let store_travel = ctx
        .course
        .clubhouse_eta_minutes(&base_loc, order.time_of_day)?;
    let prep = ctx.oracle.prep_time_minutes(order.id, &order.items);
    Ok(PickupPlan {
        origin: Location::Clubhouse,
        // Prep runs while the staffer walks in; the slower of the two gates
        // departure.
        lead_min: delay + store_travel.max(prep),
        pickup_distance_holes: ctx.course.approx_distance_to_clubhouse(&base_loc),
    })
}

/// Full multi-factor score for one asset against one order.
pub fn score_single(
    ctx: &StrategyContext<'_>,
    asset: &AssetView,
    order: &OrderView,
    now_ms: u64,
) -> Result<ScoreBreakdown, DispatchError> {
    if !asset.kind.serves(order.target_hole) {
        return Ok(ScoreBreakdown::ineligible());
    }
    let tod = order.time_of_day;
    let plan = pickup_plan(ctx, asset, order)?;

    // First pass against the ordered hole, then re-target where the golfer
    // will actually be by the time we arrive.
    let first_leg = ctx.oracle.travel_time_minutes(
        ctx.course,
        &plan.origin,
        order.target_hole,
        &asset.kind,
        tod,
        order.id,
        asset.id,
    )?;
    if first_leg.is_infinite() {
        return Ok(ScoreBreakdown::ineligible());
    }
    let waited_min = ms_to_mins(now_ms.saturating_sub(order.placed_at_ms));
    let elapsed = waited_min + plan.lead_min + first_leg;
    let predicted_hole =
        ctx.course
            .predicted_hole(order.target_hole, elapsed, ctx.tuning.player_pace_min)?;
    let travel = if predicted_hole == order.target_hole {
        first_leg
    } else {
        ctx.oracle.travel_time_minutes(
            ctx.course,
            &plan.origin,
            predicted_hole,
            &asset.kind,
            tod,
            order.id,
            asset.id,
        )?
    };
    if travel.is_infinite() {
        return Ok(ScoreBreakdown::ineligible());
    }

    let eta_min = plan.lead_min + travel;
    let sigma = CourseMap::prediction_sigma(elapsed, ctx.tuning.player_pace_min);
    let predictability_score = sigma * sigma * ctx.tuning.predictability_weight;
    let distance_score = ctx
        .course
        .clubhouse_eta_minutes(&Location::Hole(predicted_hole), tod)?;
    let asset_type_score =
        if asset.kind.is_cart() && eta_min <= ctx.tuning.cart_preference_window_min {
            CART_BONUS
        } else {
            0.0
        };
    let cart_in_zone = asset.kind.nine().map(|nine| nine.contains(order.target_hole));
    let acceptance_prob = ctx.oracle.acceptance_probability(
        plan.pickup_distance_holes,
        asset.active_orders,
        cart_in_zone,
        order.total_value,
    );

    let final_score = ETA_WEIGHT * eta_min
        + DISTANCE_WEIGHT * distance_score
        + ASSET_TYPE_WEIGHT * asset_type_score
        + PREDICTABILITY_WEIGHT * predictability_score;

    Ok(ScoreBreakdown {
        final_score,
        eta_min,
        predicted_hole,
        acceptance_prob,
        eta_score: eta_min,
        distance_score,
        asset_type_score,
        predictability_score,
        batch_adjustment: 0.0,
    })
}

/// Deterministic ranking: score, then lower rejection risk, then lower id.
pub(crate) fn rank(mut candidates: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    candidates.retain(|c| c.score.is_eligible());
    candidates.sort_by(|a, b| {
        a.score
            .final_score
            .partial_cmp(&b.score.final_score)
            .unwrap_or(Ordering::Equal)
            .then(
                b.score
                    .acceptance_prob
                    .partial_cmp(&a.score.acceptance_prob)
                    .unwrap_or(Ordering::Equal),
            )
            .then(a.asset_id.cmp(&b.asset_id))
    });
    candidates
}

/// Turn a ranked list into a decision. A soon-available winner means the
/// dispatch is re-run once that asset has actually freed up.
pub(crate) fn assign_or_delay(
    ranked: Vec<RankedCandidate>,
    snapshot: &FleetSnapshot,
    now_ms: u64,
) -> Decision {
    let Some(best) = ranked.first() else {
        return Decision::NoCandidate;
    };
    if let Some(view) = snapshot.asset(best.asset) {
        if !view.is_available_now() {
            return Decision::Delay {
                until_ms: now_ms + mins_to_ms(view.available_in_min) + 1,
            };
        }
    }
    Decision::Assign { ranked }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{Nine, TimeOfDay};
    use crate::ecs::{AssetKind, AssetStatus};
    use crate::oracle::PredictionOracle;
    use crate::scenario::{BatchingConfig, DispatchTuning};
    use bevy_ecs::prelude::Entity;

    fn make_ctx<'a>(
        course: &'a CourseMap,
        oracle: &'a PredictionOracle,
        tuning: &'a DispatchTuning,
        batching: &'a BatchingConfig,
    ) -> StrategyContext<'a> {
        StrategyContext {
            course,
            oracle,
            tuning,
            batching,
        }
    }

    fn cart_at(id: u32, hole: u8, nine: Nine) -> AssetView {
        AssetView {
            entity: Entity::from_raw(100 + id),
            id,
            name: format!("cart-{id}"),
            kind: AssetKind::BeverageCart(nine),
            status: AssetStatus::Available,
            location: Location::Hole(hole),
            active_orders: 0,
            completed_deliveries: 0,
            available_in_min: 0.0,
            end_location: Location::Hole(hole),
        }
    }

    fn staff_at_clubhouse(id: u32) -> AssetView {
        AssetView {
            entity: Entity::from_raw(200 + id),
            id,
            name: format!("staff-{id}"),
            kind: AssetKind::DeliveryStaff,
            status: AssetStatus::Available,
            location: Location::Clubhouse,
            active_orders: 0,
            completed_deliveries: 0,
            available_in_min: 0.0,
            end_location: Location::Clubhouse,
        }
    }

    fn order_at(id: u32, hole: u8) -> OrderView {
        OrderView {
            entity: Entity::from_raw(id),
            id,
            target_hole: hole,
            time_of_day: TimeOfDay::Afternoon,
            total_value: 12.0,
            placed_at_ms: 0,
            items: vec![],
        }
    }

    #[test]
    fn near_cart_beats_staff_for_in_zone_order() {
        let course = CourseMap::default();
        let oracle = PredictionOracle::new(1);
        let tuning = DispatchTuning::default();
        let batching = BatchingConfig::default();
        let ctx = make_ctx(&course, &oracle, &tuning, &batching);

        let cart = cart_at(1, 2, Nine::Front);
        let staff = staff_at_clubhouse(2);
        let order = order_at(1, 3);

        let cart_score = score_single(&ctx, &cart, &order, 0).unwrap();
        let staff_score = score_single(&ctx, &staff, &order, 0).unwrap();
        assert!(cart_score.is_eligible() && staff_score.is_eligible());
        assert!(cart_score.final_score < staff_score.final_score);
        assert!(cart_score.asset_type_score < 0.0);
    }

    #[test]
    fn out_of_zone_cart_is_ineligible() {
        let course = CourseMap::default();
        let oracle = PredictionOracle::new(1);
        let tuning = DispatchTuning::default();
        let batching = BatchingConfig::default();
        let ctx = make_ctx(&course, &oracle, &tuning, &batching);

        let cart = cart_at(1, 2, Nine::Front);
        let order = order_at(1, 14);
        let score = score_single(&ctx, &cart, &order, 0).unwrap();
        assert!(!score.is_eligible());
    }

    #[test]
    fn scoring_is_pure_over_the_same_snapshot() {
        let course = CourseMap::default();
        let oracle = PredictionOracle::new(9);
        let tuning = DispatchTuning::default();
        let batching = BatchingConfig::default();
        let ctx = make_ctx(&course, &oracle, &tuning, &batching);

        let staff = staff_at_clubhouse(1);
        let order = order_at(3, 7);
        let a = score_single(&ctx, &staff, &order, 30_000).unwrap();
        let b = score_single(&ctx, &staff, &order, 30_000).unwrap();
        assert_eq!(a.final_score, b.final_score);
        assert_eq!(a.predicted_hole, b.predicted_hole);
        assert_eq!(a.acceptance_prob, b.acceptance_prob);
    }

    #[test]
    fn distant_target_predicts_player_advance() {
        let course = CourseMap::default();
        let oracle = PredictionOracle::new(1);
        let tuning = DispatchTuning {
            player_pace_min: 5.0,
            ..DispatchTuning::default()
        };
        let batching = BatchingConfig::default();
        let ctx = make_ctx(&course, &oracle, &tuning, &batching);

        // Staff needs well over 5 minutes to reach hole 9, so the golfer has
        // moved on by arrival.
        let staff = staff_at_clubhouse(1);
        let order = order_at(1, 5);
        let score = score_single(&ctx, &staff, &order, 0).unwrap();
        assert_ne!(score.predicted_hole, order.target_hole);
    }

    #[test]
    fn ranking_breaks_ties_by_id() {
        let mk = |asset_id: u32, final_score: f64, acceptance: f64| RankedCandidate {
            asset: Entity::from_raw(asset_id),
            asset_id,
            batch: vec![],
            score: ScoreBreakdown {
                final_score,
                acceptance_prob: acceptance,
                ..ScoreBreakdown::default()
            },
        };
        let ranked = rank(vec![mk(3, 5.0, 0.8), mk(1, 5.0, 0.8), mk(2, 4.0, 0.5)]);
        let ids: Vec<u32> = ranked.iter().map(|c| c.asset_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
