use bevy_ecs::prelude::World;

use crate::clock::{mins_to_ms, EventKind, SimulationClock};
use crate::course::{CourseMap, Location, Nine};
use crate::distributions::JitteredInterArrival;
use crate::ecs::{Asset, AssetKind, AssetLocation, AssetStats, AssetStatus, IdSequences};
use crate::error::DispatchError;
use crate::oracle::PredictionOracle;
use crate::strategy::build_strategy;
use crate::systems::movement::LastTickMs;
use crate::systems::spawner::OrderSpawner;
use crate::telemetry::SimTelemetry;

use super::params::{
    BatchingConfig, DeliveryTargets, DetailedLogging, DispatchTuning, Draining, OfferConfig,
    ScenarioParams, SimulationEndTimeMs,
};

const MAX_BEVERAGE_CARTS: usize = 2;
const STRATEGY_SEED_MIX: u64 = 0x5eed_cafe;
const ARRIVAL_SEED_MIX: u64 = 0xcafe_babe;

fn validate(params: &ScenarioParams) -> Result<(), DispatchError> {
    if !(params.simulation_duration_min.is_finite() && params.simulation_duration_min > 0.0) {
        return Err(DispatchError::InvalidInput(
            "simulation duration must be positive".into(),
        ));
    }
    if params.order_interval_min < 0.0 || params.order_interval_variance_min < 0.0 {
        return Err(DispatchError::InvalidInput(
            "order interval and variance must be non-negative".into(),
        ));
    }
    if params.volume_multiplier <= 0.0 {
        return Err(DispatchError::InvalidInput(
            "volume multiplier must be positive".into(),
        ));
    }
    if params.num_beverage_carts > MAX_BEVERAGE_CARTS {
        return Err(DispatchError::InvalidInput(format!(
            "at most {MAX_BEVERAGE_CARTS} beverage carts supported"
        )));
    }
    if params.target_delivery_time_min <= 0.0 || params.target_wait_time_min <= 0.0 {
        return Err(DispatchError::InvalidInput(
            "service targets must be positive".into(),
        ));
    }
    Ok(())
}

/// Populate a fresh world from the scenario record: resources, course, fleet.
/// Call [`crate::runner::initialize_simulation`] afterwards to schedule the
/// start event.
pub fn build_scenario(world: &mut World, params: ScenarioParams) -> Result<(), DispatchError> {
    validate(&params)?;

    let course = match params.course_segments.clone() {
        Some(segments) => CourseMap::from_segments(segments, params.clubhouse_transfer_minutes)?,
        None => CourseMap::default(),
    };

    let end_ms = mins_to_ms(params.simulation_duration_min);
    let mut clock = SimulationClock::default();
    clock.schedule_at(end_ms, EventKind::SimulationEnd, None);
    world.insert_resource(clock);
    world.insert_resource(course);

    world.insert_resource(PredictionOracle::new(params.rng_seed));
    world.insert_resource(build_strategy(
        params.strategy,
        params.rng_seed ^ STRATEGY_SEED_MIX,
    ));
    world.insert_resource(SimTelemetry::default());
    world.insert_resource(IdSequences::default());
    world.insert_resource(DispatchTuning::default());
    world.insert_resource(BatchingConfig::default());
    world.insert_resource(OfferConfig::default());
    world.insert_resource(DeliveryTargets {
        delivery_time_min: params.target_delivery_time_min,
        wait_time_min: params.target_wait_time_min,
    });
    world.insert_resource(DetailedLogging(params.detailed_logging));
    world.insert_resource(SimulationEndTimeMs(end_ms));
    world.insert_resource(Draining::default());
    world.insert_resource(LastTickMs::default());
    world.insert_resource(OrderSpawner {
        inter_arrival: Box::new(JitteredInterArrival::new(
            params.order_interval_min,
            params.order_interval_variance_min,
            params.volume_multiplier,
            params.rng_seed.wrapping_add(ARRIVAL_SEED_MIX),
        )),
        seed: params.rng_seed,
        hole_weights: params.hole_weights.clone(),
        spawned: 0,
    });

    // Fleet: first cart patrols the front nine, second the back; staff stage
    // at the clubhouse store.
    for index in 0..params.num_beverage_carts {
        let nine = if index == 0 { Nine::Front } else { Nine::Back };
        let id = world.resource_mut::<IdSequences>().next_asset_id();
        world.spawn((
            Asset {
                id,
                name: format!("cart-{}", index + 1),
                kind: AssetKind::BeverageCart(nine),
                status: AssetStatus::Available,
                queue: Vec::new(),
            },
            AssetLocation(Location::Hole(nine.head())),
            AssetStats::default(),
        ));
    }
    for index in 0..params.num_delivery_staff {
        let id = world.resource_mut::<IdSequences>().next_asset_id();
        world.spawn((
            Asset {
                id,
                name: format!("staff-{}", index + 1),
                kind: AssetKind::DeliveryStaff,
                status: AssetStatus::Available,
                queue: Vec::new(),
            },
            AssetLocation(Location::Clubhouse),
            AssetStats::default(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::World;

    #[test]
    fn default_scenario_builds_fleet_and_resources() {
        let mut world = World::new();
        build_scenario(&mut world, ScenarioParams::default().with_seed(3)).unwrap();

        assert!(world.get_resource::<CourseMap>().is_some());
        assert!(world.get_resource::<OrderSpawner>().is_some());
        let assets: Vec<AssetKind> = world
            .query::<&Asset>()
            .iter(&world)
            .map(|a| a.kind)
            .collect();
        assert_eq!(assets.len(), 4);
        assert!(assets.contains(&AssetKind::BeverageCart(Nine::Front)));
        assert!(assets.contains(&AssetKind::BeverageCart(Nine::Back)));
    }

    #[test]
    fn rejects_invalid_configuration() {
        let mut world = World::new();
        let bad_duration = ScenarioParams {
            simulation_duration_min: 0.0,
            ..ScenarioParams::default()
        };
        assert!(build_scenario(&mut world, bad_duration).is_err());

        let mut world = World::new();
        let too_many_carts = ScenarioParams {
            num_beverage_carts: 3,
            ..ScenarioParams::default()
        };
        assert!(build_scenario(&mut world, too_many_carts).is_err());
    }
}
