use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::course::Segment;
use crate::strategy::StrategyKind;

/// Tuning knobs for candidate selection and scoring.
#[derive(Debug, Clone, Copy, Resource)]
pub struct DispatchTuning {
    /// Golfers advance roughly one hole per this many minutes.
    pub player_pace_min: f64,
    /// Carts get the type bonus when their ETA is inside this window.
    pub cart_preference_window_min: f64,
    /// Busy assets finishing within this window still enter the candidate pool.
    pub soon_available_min: f64,
    /// Multiplier on the hole-prediction variance term.
    pub predictability_weight: f64,
    /// Orders wait this long before first dispatch, so near-simultaneous
    /// arrivals land in the same batching pool.
    pub dispatch_aggregation_min: f64,
}

impl Default for DispatchTuning {
    fn default() -> Self {
        Self {
            player_pace_min: 15.0,
            cart_preference_window_min: 10.0,
            soon_available_min: 3.0,
            predictability_weight: 1.0,
            dispatch_aggregation_min: 0.25,
        }
    }
}

/// Batching planner limits and cost shaping.
#[derive(Debug, Clone, Copy, Resource)]
pub struct BatchingConfig {
    pub max_batch_size: usize,
    /// Max pairwise hole distance between drops in one batch.
    pub adjacent_hole_threshold: u8,
    /// Handoff time added per extra drop, in minutes.
    pub delivery_time_penalty_min: f64,
    /// Route-time multiplier compounded per extra order.
    pub efficiency_bonus: f64,
    /// Options within this much of the best keep the smaller batch.
    pub tie_epsilon: f64,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 3,
            adjacent_hole_threshold: 2,
            delivery_time_penalty_min: 2.0,
            efficiency_bonus: 0.85,
            tie_epsilon: 0.01,
        }
    }
}

/// Offer protocol windows and retry policy.
#[derive(Debug, Clone, Copy, Resource)]
pub struct OfferConfig {
    /// Acceptance window per offer, in ms of simulated time.
    pub window_ms: u64,
    /// Minimum response latency for accepted offers, in ms.
    pub min_response_ms: u64,
    /// Share of non-acceptances that stay silent and run out the window
    /// (the rest decline explicitly and advance the cascade immediately).
    pub silent_decline_share: f64,
    /// Full-cascade failures allowed before an order is unassignable.
    pub max_retries: u32,
    /// Wait before re-dispatching an order whose cascade failed, in ms.
    pub retry_backoff_ms: u64,
}

impl Default for OfferConfig {
    fn default() -> Self {
        Self {
            window_ms: 15_000,
            min_response_ms: 1_000,
            silent_decline_share: 0.5,
            max_retries: 3,
            retry_backoff_ms: 60_000,
        }
    }
}

/// Service-level targets the on-time KPIs are measured against.
#[derive(Debug, Clone, Copy, Resource)]
pub struct DeliveryTargets {
    pub delivery_time_min: f64,
    pub wait_time_min: f64,
}

impl Default for DeliveryTargets {
    fn default() -> Self {
        Self {
            delivery_time_min: 30.0,
            wait_time_min: 10.0,
        }
    }
}

/// When set, location ticks are recorded in the event log as well.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct DetailedLogging(pub bool);

/// Simulation end in ms. Past this point only in-flight delivery completions
/// are processed.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTimeMs(pub u64);

/// Set once the `SimulationEnd` marker has fired.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct Draining(pub bool);

/// Location tick cadence in minutes.
pub const LOCATION_TICK_MIN: f64 = 0.5;

/// The scenario configuration record supplied by the external runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub simulation_duration_min: f64,
    pub order_interval_min: f64,
    pub order_interval_variance_min: f64,
    pub volume_multiplier: f64,
    /// 0–2 carts; the first patrols the front nine, the second the back.
    pub num_beverage_carts: usize,
    pub num_delivery_staff: usize,
    pub strategy: StrategyKind,
    pub target_delivery_time_min: f64,
    pub target_wait_time_min: f64,
    pub rng_seed: u64,
    pub detailed_logging: bool,
    /// Optional course override as a raw segment table plus the clubhouse
    /// transfer times to holes 1 and 10. `None` uses the standard course.
    pub course_segments: Option<Vec<Segment>>,
    pub clubhouse_transfer_minutes: [f64; 2],
    /// Optional per-hole arrival weights (index 0 = hole 1). `None` is uniform.
    pub hole_weights: Option<Vec<f64>>,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            simulation_duration_min: 240.0,
            order_interval_min: 6.0,
            order_interval_variance_min: 2.0,
            volume_multiplier: 1.0,
            num_beverage_carts: 2,
            num_delivery_staff: 2,
            strategy: StrategyKind::CartPreference,
            target_delivery_time_min: 30.0,
            target_wait_time_min: 10.0,
            rng_seed: 0,
            detailed_logging: false,
            course_segments: None,
            clubhouse_transfer_minutes: [1.5, 2.0],
            hole_weights: None,
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_duration_min(mut self, minutes: f64) -> Self {
        self.simulation_duration_min = minutes;
        self
    }

    pub fn with_fleet(mut self, carts: usize, staff: usize) -> Self {
        self.num_beverage_carts = carts;
        self.num_delivery_staff = staff;
        self
    }

    pub fn with_order_interval(mut self, interval_min: f64, variance_min: f64) -> Self {
        self.order_interval_min = interval_min;
        self.order_interval_variance_min = variance_min;
        self
    }

    pub fn with_volume_multiplier(mut self, multiplier: f64) -> Self {
        self.volume_multiplier = multiplier;
        self
    }

    pub fn with_targets(mut self, delivery_min: f64, wait_min: f64) -> Self {
        self.target_delivery_time_min = delivery_min;
        self.target_wait_time_min = wait_min;
        self
    }

    pub fn with_detailed_logging(mut self, enabled: bool) -> Self {
        self.detailed_logging = enabled;
        self
    }

    pub fn with_hole_weights(mut self, weights: Vec<f64>) -> Self {
        self.hole_weights = Some(weights);
        self
    }
}
