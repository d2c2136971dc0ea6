use crate::error::DispatchError;
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};

use super::algorithm::DispatchStrategy;
use super::score::{assign_or_delay, eligible_candidates, rank, score_single};
use super::types::{Decision, RankedCandidate, ScoreBreakdown, StrategyContext};

/// Baseline: closest asset by hole count, ignoring travel-time modeling.
#[derive(Debug, Default)]
pub struct NearestStrategy;

fn distance_scored(
    ctx: &StrategyContext<'_>,
    asset: &AssetView,
    order: &OrderView,
    mut score: ScoreBreakdown,
) -> ScoreBreakdown {
    if !score.is_eligible() {
        return score;
    }
    let location = if asset.is_available_now() {
        asset.location
    } else {
        asset.end_location
    };
    score.final_score = ctx.course.approx_hole_distance(&location, order.target_hole);
    score
}

impl DispatchStrategy for NearestStrategy {
    fn name(&self) -> &'static str {
        "NEAREST"
    }

    fn choose(
        &self,
        order: &OrderView,
        snapshot: &FleetSnapshot,
        ctx: &StrategyContext<'_>,
    ) -> Decision {
        let mut ranked = Vec::new();
        for asset in eligible_candidates(order, snapshot, ctx) {
            if let Ok(score) = score_single(ctx, asset, order, snapshot.now_ms) {
                ranked.push(RankedCandidate {
                    asset: asset.entity,
                    asset_id: asset.id,
                    batch: vec![order.entity],
                    score: distance_scored(ctx, asset, order, score),
                });
            }
        }
        assign_or_delay(rank(ranked), snapshot, snapshot.now_ms)
    }

    fn score(
        &self,
        asset: &AssetView,
        order: &OrderView,
        snapshot: &FleetSnapshot,
        ctx: &StrategyContext<'_>,
    ) -> Result<ScoreBreakdown, DispatchError> {
        score_single(ctx, asset, order, snapshot.now_ms)
            .map(|s| distance_scored(ctx, asset, order, s))
    }
}
