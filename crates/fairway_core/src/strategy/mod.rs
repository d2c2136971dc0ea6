//! Dispatch strategies: pluggable policies for pairing orders with assets.
//!
//! Strategies are value types behind a trait object stored as an ECS
//! resource, selectable by registry name. All of them observe an immutable
//! [`crate::snapshot::FleetSnapshot`] and never touch live state; the only
//! mutation channel is the offer protocol acting on their returned ranking.

pub mod algorithm;
pub mod batch_orders;
pub mod cart_preference;
pub mod fastest_eta;
pub mod load_balanced;
pub mod nearest;
pub mod random;
pub mod score;
pub mod types;
pub mod zone_optimal;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

pub use algorithm::DispatchStrategy;
pub use batch_orders::BatchOrdersStrategy;
pub use cart_preference::CartPreferenceStrategy;
pub use fastest_eta::FastestEtaStrategy;
pub use load_balanced::LoadBalancedStrategy;
pub use nearest::NearestStrategy;
pub use random::RandomStrategy;
pub use score::{eligible_candidates, score_single};
pub use types::{Decision, RankedCandidate, ScoreBreakdown, StrategyContext};
pub use zone_optimal::ZoneOptimalStrategy;

/// Resource wrapper for the strategy trait object.
#[derive(Resource)]
pub struct DispatchStrategyResource(pub Box<dyn DispatchStrategy>);

impl DispatchStrategyResource {
    pub fn new(strategy: Box<dyn DispatchStrategy>) -> Self {
        Self(strategy)
    }
}

impl std::ops::Deref for DispatchStrategyResource {
    type Target = dyn DispatchStrategy;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Built-in strategies, addressable by name in scenario configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    FastestEta,
    CartPreference,
    ZoneOptimal,
    BatchOrders,
    Nearest,
    Random,
    LoadBalanced,
}

impl StrategyKind {
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::FastestEta => "FASTEST_ETA",
            StrategyKind::CartPreference => "CART_PREFERENCE",
            StrategyKind::ZoneOptimal => "ZONE_OPTIMAL",
            StrategyKind::BatchOrders => "BATCH_ORDERS",
            StrategyKind::Nearest => "NEAREST",
            StrategyKind::Random => "RANDOM",
            StrategyKind::LoadBalanced => "LOAD_BALANCED",
        }
    }

    pub fn from_name(name: &str) -> Option<StrategyKind> {
        StrategyKind::all().into_iter().find(|k| k.name() == name)
    }

    pub fn all() -> [StrategyKind; 7] {
        [
            StrategyKind::FastestEta,
            StrategyKind::CartPreference,
            StrategyKind::ZoneOptimal,
            StrategyKind::BatchOrders,
            StrategyKind::Nearest,
            StrategyKind::Random,
            StrategyKind::LoadBalanced,
        ]
    }
}

/// Instantiate a strategy by kind. `seed` feeds policies that draw randomness
/// (only `RANDOM` today).
pub fn build_strategy(kind: StrategyKind, seed: u64) -> DispatchStrategyResource {
    let strategy: Box<dyn DispatchStrategy> = match kind {
        StrategyKind::FastestEta => Box::new(FastestEtaStrategy),
        StrategyKind::CartPreference => Box::new(CartPreferenceStrategy),
        StrategyKind::ZoneOptimal => Box::new(ZoneOptimalStrategy),
        StrategyKind::BatchOrders => Box::new(BatchOrdersStrategy),
        StrategyKind::Nearest => Box::new(NearestStrategy),
        StrategyKind::Random => Box::new(RandomStrategy::new(seed)),
        StrategyKind::LoadBalanced => Box::new(LoadBalancedStrategy),
    };
    DispatchStrategyResource::new(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_resolves_by_name() {
        for kind in StrategyKind::all() {
            assert_eq!(StrategyKind::from_name(kind.name()), Some(kind));
            let built = build_strategy(kind, 7);
            assert_eq!(built.name(), kind.name());
        }
        assert_eq!(StrategyKind::from_name("GREEDY"), None);
    }

    #[test]
    fn kind_serializes_as_registry_name() {
        let json = serde_json::to_string(&StrategyKind::CartPreference).unwrap();
        assert_eq!(json, "\"CART_PREFERENCE\"");
    }
}
