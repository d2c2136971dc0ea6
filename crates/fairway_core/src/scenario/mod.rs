//! Scenario configuration and world assembly.

pub mod build;
pub mod params;

pub use build::build_scenario;
pub use params::{
    BatchingConfig, DeliveryTargets, DetailedLogging, DispatchTuning, Draining, OfferConfig,
    ScenarioParams, SimulationEndTimeMs, LOCATION_TICK_MIN,
};
