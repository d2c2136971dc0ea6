//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Each step pops the next event from [`SimulationClock`], inserts it as
//! [`CurrentEvent`], then runs the schedule. Systems are gated per event kind
//! so only the matching handler does work. Once the `SimulationEnd` marker
//! has fired, only `DeliveryComplete` events (in-flight drops committed
//! before the end) are still handled; everything else drains unprocessed.

use bevy_ecs::prelude::Res;
use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::scenario::Draining;
use crate::systems::{
    asset_arrived::asset_arrived_system, delivery_complete::delivery_complete_system,
    dispatch::dispatch_system, movement::movement_system, offer_response::offer_response_system,
    offer_timeout::offer_timeout_system, order_arrival::order_arrival_system,
    simulation_end::simulation_end_system,
    spawner::simulation_started_system,
};

fn is_simulation_started(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::SimulationStarted)
        .unwrap_or(false)
}

fn is_order_arrival(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::OrderArrival)
        .unwrap_or(false)
}

fn is_dispatch_order(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::DispatchOrder)
        .unwrap_or(false)
}

fn is_offer_response(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::OfferResponse)
        .unwrap_or(false)
}

fn is_offer_timeout(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::OfferTimeout)
        .unwrap_or(false)
}

fn is_asset_arrived(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::AssetArrived)
        .unwrap_or(false)
}

fn is_delivery_complete(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::DeliveryComplete)
        .unwrap_or(false)
}

fn is_location_tick(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::LocationTick)
        .unwrap_or(false)
}

fn is_simulation_end(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::SimulationEnd)
        .unwrap_or(false)
}

/// Runs one simulation step. Returns `false` once the queue is empty.
/// During the end-of-simulation drain, non-delivery events are popped but not
/// handled.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let draining = world
        .get_resource::<Draining>()
        .map(|d| d.0)
        .unwrap_or(false);

    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(event) => event,
        None => return false,
    };
    if draining && event.kind != EventKind::DeliveryComplete {
        return true;
    }
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    true
}

/// Runs simulation steps until the event queue is empty or `max_steps` is
/// reached. Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Builds the default simulation schedule: all event-reacting systems plus
/// [`apply_deferred`] so spawned entities are applied before the next step.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        simulation_started_system.run_if(is_simulation_started),
        order_arrival_system.run_if(is_order_arrival),
        dispatch_system.run_if(is_dispatch_order),
        offer_response_system.run_if(is_offer_response),
        offer_timeout_system.run_if(is_offer_timeout),
        asset_arrived_system.run_if(is_asset_arrived),
        delivery_complete_system.run_if(is_delivery_complete),
        movement_system.run_if(is_location_tick),
        simulation_end_system.run_if(is_simulation_end),
        apply_deferred,
    ));
    schedule
}

/// Schedules the `SimulationStarted` event at time 0. Call after
/// [`crate::scenario::build_scenario`] and before running events.
pub fn initialize_simulation(world: &mut World) {
    let mut clock = world.resource_mut::<SimulationClock>();
    clock.schedule_at(0, EventKind::SimulationStarted, None);
}
