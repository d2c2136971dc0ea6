use crate::batching;
use crate::error::DispatchError;
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};

use super::algorithm::DispatchStrategy;
use super::score::{assign_or_delay, eligible_candidates, rank, score_single};
use super::types::{Decision, ScoreBreakdown, StrategyContext};

/// Default policy: full multi-factor scoring with the cart bias, batching
/// through the planner whenever a shared sweep beats going alone.
#[derive(Debug, Default)]
pub struct CartPreferenceStrategy;

impl DispatchStrategy for CartPreferenceStrategy {
    fn name(&self) -> &'static str {
        "CART_PREFERENCE"
    }

    fn choose(
        &self,
        order: &OrderView,
        snapshot: &FleetSnapshot,
        ctx: &StrategyContext<'_>,
    ) -> Decision {
        let mut ranked = Vec::new();
        for asset in eligible_candidates(order, snapshot, ctx) {
            if let Ok(option) = batching::best_option(ctx, asset, order, snapshot, 0.0) {
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
