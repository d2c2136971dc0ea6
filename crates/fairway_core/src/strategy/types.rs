use bevy_ecs::prelude::Entity;

use crate::course::CourseMap;
use crate::oracle::PredictionOracle;
use crate::scenario::{BatchingConfig, DispatchTuning};

/// Borrowed read-only context a strategy evaluates against. Strategies never
/// see the live world, only this plus the [`crate::snapshot::FleetSnapshot`].
pub struct StrategyContext<'a> {
    pub course: &'a CourseMap,
    pub oracle: &'a PredictionOracle,
    pub tuning: &'a DispatchTuning,
    pub batching: &'a BatchingConfig,
}

/// Layered score for one candidate/option pair. Lower is better.
#[derive(Debug, Clone, Default)]
pub struct ScoreBreakdown {
    pub final_score: f64,
    /// Predicted delivery time in minutes for the dispatched order.
    pub eta_min: f64,
    /// Hole the golfer is predicted to occupy at arrival.
    pub predicted_hole: u8,
    pub acceptance_prob: f64,
    pub eta_score: f64,
    pub distance_score: f64,
    pub asset_type_score: f64,
    pub predictability_score: f64,
    /// Net effect of batching (penalty minus efficiency bonus), 0 for singles.
    pub batch_adjustment: f64,
}

impl ScoreBreakdown {
    /// Marker score for zone-ineligible candidates.
    pub fn ineligible() -> Self {
        Self {
            final_score: f64::INFINITY,
            eta_min: f64::INFINITY,
            ..Self::default()
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.final_score.is_finite()
    }
}

/// One entry of the ranked offer list produced by a strategy.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub asset: Entity,
    pub asset_id: u32,
    /// Batch member order entities in drop order; always contains the
    /// dispatched order (length 1 for a solo delivery).
    pub batch: Vec<Entity>,
    pub score: ScoreBreakdown,
}

/// Outcome of a dispatch decision.
#[derive(Debug, Clone)]
pub enum Decision {
    /// Run the offer cascade over `ranked`, best first.
    Assign { ranked: Vec<RankedCandidate> },
    /// Re-dispatch at the given time (a better candidate frees up soon).
    Delay { until_ms: u64 },
    /// Zero feasible assets; the order stays pending and retries on backoff.
    NoCandidate,
}
