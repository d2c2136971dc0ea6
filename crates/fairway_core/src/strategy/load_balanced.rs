use crate::error::DispatchError;
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};

use super::algorithm::DispatchStrategy;
use super::score::{assign_or_delay, eligible_candidates, rank, score_single};
use super::types::{Decision, RankedCandidate, ScoreBreakdown, StrategyContext};

/// Baseline: spread work evenly. Current load dominates, lifetime deliveries
/// break near-ties, ETA settles the rest.
#[derive(Debug, Default)]
pub struct LoadBalancedStrategy;

fn load_scored(asset: &AssetView, mut score: ScoreBreakdown) -> ScoreBreakdown {
    if !score.is_eligible() {
        return score;
    }
    score.final_score = asset.active_orders as f64 * 1000.0
        + asset.completed_deliveries as f64 * 10.0
        + score.eta_min;
    score
}

impl DispatchStrategy for LoadBalancedStrategy {
    fn name(&self) -> &'static str {
        "LOAD_BALANCED"
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
                    score: load_scored(asset, score),
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
        score_single(ctx, asset, order, snapshot.now_ms).map(|s| load_scored(asset, s))
    }
}
