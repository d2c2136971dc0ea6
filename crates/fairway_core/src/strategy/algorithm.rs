use crate::error::DispatchError;
use crate::snapshot::{AssetView, FleetSnapshot, OrderView};

use super::types::{Decision, ScoreBreakdown, StrategyContext};

/// Pluggable dispatch policy.
///
/// Implementations must be pure with respect to the snapshot: the same
/// `(order, snapshot, ctx)` always yields the same decision and the same
/// scores. Any randomness is drawn from seeds carried by the strategy value
/// itself, keyed on stable order/asset ids.
pub trait DispatchStrategy: Send + Sync {
    /// Registry name, e.g. `"CART_PREFERENCE"`.
    fn name(&self) -> &'static str;

    /// Pick a ranked candidate list (or delay / give up) for one order.
    fn choose(
        &self,
        order: &OrderView,
        snapshot: &FleetSnapshot,
        ctx: &StrategyContext<'_>,
    ) -> Decision;

    /// Score a single asset against a single order. Ineligible pairings
    /// return an infinite score, not an error; errors are reserved for
    /// malformed input.
    fn score(
        &self,
        asset: &AssetView,
        order: &OrderView,
        snapshot: &FleetSnapshot,
        ctx: &StrategyContext<'_>,
    ) -> Result<ScoreBreakdown, DispatchError>;
}
