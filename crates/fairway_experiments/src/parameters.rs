//! Strategy/seed sweeps over a base scenario.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use fairway_core::scenario::ScenarioParams;
use fairway_core::strategy::StrategyKind;

/// One run of a sweep: a labelled, fully resolved scenario.
#[derive(Debug, Clone, Serialize)]
pub struct SweepPoint {
    pub label: String,
    pub strategy: StrategyKind,
    pub seed: u64,
    pub params: ScenarioParams,
}

/// Cartesian sweep of strategies × seeds over one base scenario.
#[derive(Debug, Clone)]
pub struct StrategySweep {
    base: ScenarioParams,
    strategies: Vec<StrategyKind>,
    seeds: Vec<u64>,
}

impl StrategySweep {
    pub fn new(base: ScenarioParams) -> Self {
        let seed = base.rng_seed;
        Self {
            base,
            strategies: StrategyKind::all().to_vec(),
            seeds: vec![seed],
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<StrategyKind>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Draw `count` seeds from a master seed, for repeatable replications.
    pub fn with_random_seeds(mut self, count: usize, master_seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(master_seed);
        self.seeds = (0..count).map(|_| rng.gen()).collect();
        self
    }

    pub fn generate(&self) -> Vec<SweepPoint> {
        let mut points = Vec::with_capacity(self.strategies.len() * self.seeds.len());
        for strategy in &self.strategies {
            for seed in &self.seeds {
                let params = self
                    .base
                    .clone()
                    .with_strategy(*strategy)
                    .with_seed(*seed);
                points.push(SweepPoint {
                    label: format!("{}/seed{}", strategy.name(), seed),
                    strategy: *strategy,
                    seed: *seed,
                    params,
                });
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    #[test]
    fn sweep_is_the_cartesian_product() {
        let sweep = StrategySweep::new(presets::quiet_morning())
            .with_strategies(vec![StrategyKind::Nearest, StrategyKind::Random])
            .with_seeds(vec![1, 2, 3]);
        let points = sweep.generate();
        assert_eq!(points.len(), 6);
        assert_eq!(points[0].label, "NEAREST/seed1");
        assert_eq!(points[5].label, "RANDOM/seed3");
        assert_eq!(points[5].params.strategy, StrategyKind::Random);
        assert_eq!(points[5].params.rng_seed, 3);
    }

    #[test]
    fn random_seeds_are_repeatable() {
        let a = StrategySweep::new(presets::quiet_morning()).with_random_seeds(4, 99);
        let b = StrategySweep::new(presets::quiet_morning()).with_random_seeds(4, 99);
        assert_eq!(a.seeds, b.seeds);
        assert_eq!(a.seeds.len(), 4);
    }
}
