//! Simulation end marker: switch the runner into drain mode.

use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::scenario::Draining;
use crate::telemetry::SimTelemetry;

pub fn simulation_end_system(
    clock: Res<SimulationClock>,
    event: Res<CurrentEvent>,
    mut draining: ResMut<Draining>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    if event.0.kind != EventKind::SimulationEnd {
        return;
    }
    draining.0 = true;
    telemetry.log(clock.now(), "simulation_end", None, None, String::new());
}
