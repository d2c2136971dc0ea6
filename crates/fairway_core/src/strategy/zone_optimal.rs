use crate::error::DispatchError;
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};

use super::algorithm::DispatchStrategy;
use super::score::{assign_or_delay, eligible_candidates, rank, score_single};
use super::types::{Decision, RankedCandidate, ScoreBreakdown, StrategyContext};

/// Keep each nine served by its own cart whenever one can take the order,
/// reserving staff for cross-nine work and overflow.
const IN_ZONE_CART_BONUS: f64 = -5.0;

#[derive(Debug, Default)]
pub struct ZoneOptimalStrategy;

fn zone_biased(asset: &AssetView, order: &OrderView, mut score: ScoreBreakdown) -> ScoreBreakdown {
    if !score.is_eligible() {
        return score;
    }
    let bonus = match asset.kind.nine() {
        Some(nine) if nine.contains(order.target_hole) => IN_ZONE_CART_BONUS,
        _ => 0.0,
    };
    score.asset_type_score = bonus;
    score.final_score = score.eta_min + bonus;
    score
}

impl DispatchStrategy for ZoneOptimalStrategy {
    fn name(&self) -> &'static str {
        "ZONE_OPTIMAL"
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
                    score: zone_biased(asset, order, score),
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
        score_single(ctx, asset, order, snapshot.now_ms).map(|s| zone_biased(asset, order, s))
    }
}
