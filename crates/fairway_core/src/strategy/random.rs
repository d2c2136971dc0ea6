use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::DispatchError;
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};

use super::algorithm::DispatchStrategy;
use super::score::{eligible_candidates, score_single};
use super::types::{Decision, RankedCandidate, ScoreBreakdown, StrategyContext};

/// Baseline: uniform pick among the currently available candidates, seeded
/// per order so replays are identical.
#[derive(Debug)]
pub struct RandomStrategy {
    pub seed: u64,
}

impl RandomStrategy {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DispatchStrategy for RandomStrategy {
    fn name(&self) -> &'static str {
        "RANDOM"
    }

    fn choose(
        &self,
        order: &OrderView,
        snapshot: &FleetSnapshot,
        ctx: &StrategyContext<'_>,
    ) -> Decision {
        let mut candidates: Vec<RankedCandidate> = Vec::new();
        for asset in eligible_candidates(order, snapshot, ctx) {
            if !asset.is_available_now() {
                continue;
            }
            if let Ok(score) = score_single(ctx, asset, order, snapshot.now_ms) {
                if score.is_eligible() {
                    candidates.push(RankedCandidate {
                        asset: asset.entity,
                        asset_id: asset.id,
                        batch: vec![order.entity],
                        score,
                    });
                }
            }
        }
        if candidates.is_empty() {
            return Decision::NoCandidate;
        }
        candidates.sort_by_key(|c| c.asset_id);
        let mut rng = StdRng::seed_from_u64(self.seed ^ (order.id as u64).rotate_left(17));
        let pick = rng.gen_range(0..candidates.len());
        candidates.swap(0, pick);
        Decision::Assign { ranked: candidates }
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
