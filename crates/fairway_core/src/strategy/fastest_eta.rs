use crate::error::DispatchError;
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};

use super::algorithm::DispatchStrategy;
use super::score::{assign_or_delay, eligible_candidates, rank, score_single};
use super::types::{Decision, RankedCandidate, ScoreBreakdown, StrategyContext};

/// Minimize predicted delivery time, nothing else. No batching.
#[derive(Debug, Default)]
pub struct FastestEtaStrategy;

fn eta_only(mut score: ScoreBreakdown) -> ScoreBreakdown {
    if score.is_eligible() {
        score.final_score = score.eta_min;
    }
    score
}

impl DispatchStrategy for FastestEtaStrategy {
    fn name(&self) -> &'static str {
        "FASTEST_ETA"
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
                    score: eta_only(score),
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
        score_single(ctx, asset, order, snapshot.now_ms).map(eta_only)
    }
}
