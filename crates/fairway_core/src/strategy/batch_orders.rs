use crate::batching;
use crate::error::DispatchError;
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};

use super::algorithm::DispatchStrategy;
use super::score::{assign_or_delay, eligible_candidates, rank, score_single};
use super::types::{Decision, ScoreBreakdown, StrategyContext};

/// Extra pull toward larger batches, applied per additional member.
const AGGRESSIVE_BATCH_BIAS: f64 = -0.75;

/// Consolidation-first policy: same machinery as the default strategy, with
/// an explicit bias that makes the planner take every feasible batch.
#[derive(Debug, Default)]
pub struct BatchOrdersStrategy;

impl DispatchStrategy for BatchOrdersStrategy {
    fn name(&self) -> &'static str {
        "BATCH_ORDERS"
    }

    fn choose(
        &self,
        order: &OrderView,
        snapshot: &FleetSnapshot,
        ctx: &StrategyContext<'_>,
    ) -> Decision {
        let mut ranked = Vec::new();
        for asset in eligible_candidates(order, snapshot, ctx) {
            if let Ok(option) =
                batching::best_option(ctx, asset, order, snapshot, AGGRESSIVE_BATCH_BIAS)
            {
                ranked.push(option);
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
    }
}
