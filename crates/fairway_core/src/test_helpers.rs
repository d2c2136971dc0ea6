//! Shared helpers for unit tests: a quiet world with a standard course and a
//! hand-placed fleet, plus a runner wrapper.

use bevy_ecs::prelude::{Entity, Schedule, World};

use crate::adapters;
use crate::ecs::{ItemComplexity, MenuItem};
use crate::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use crate::scenario::{build_scenario, ScenarioParams};

/// World with a silent arrival generator, so tests inject orders themselves.
pub fn quiet_world(carts: usize, staff: usize, seed: u64) -> (World, Schedule) {
    let mut world = World::new();
    let params = ScenarioParams::default()
        .with_seed(seed)
        .with_fleet(carts, staff)
        .with_order_interval(0.0, 0.0)
        .with_duration_min(240.0);
    build_scenario(&mut world, params).expect("test scenario builds");
    initialize_simulation(&mut world);
    (world, simulation_schedule())
}

pub fn simple_items() -> Vec<MenuItem> {
    vec![MenuItem {
        name: "lemonade".into(),
        quantity: 2,
        complexity: ItemComplexity::Simple,
        unit_price: 6.0,
    }]
}

pub fn inject_order(world: &mut World, hole: u8) -> Entity {
    adapters::create_order(world, hole, simple_items()).expect("order injects")
}

pub fn run_to_completion(world: &mut World, schedule: &mut Schedule) -> usize {
    run_until_empty(world, schedule, 1_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::list_orders;
    use crate::ecs::OrderState;

    #[test]
    fn injected_order_reaches_delivery() {
        let (mut world, mut schedule) = quiet_world(1, 1, 42);
        inject_order(&mut world, 3);
        run_to_completion(&mut world, &mut schedule);

        let orders = list_orders(&mut world);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].state, OrderState::Delivered);
        assert!(orders[0].delivered_at_ms.is_some());
    }

    #[test]
    fn delivered_timestamps_are_ordered() {
        let (mut world, mut schedule) = quiet_world(2, 2, 7);
        for hole in [2, 8, 13, 17] {
            inject_order(&mut world, hole);
        }
        run_to_completion(&mut world, &mut schedule);

        let telemetry = world.resource::<crate::telemetry::SimTelemetry>();
        assert!(!telemetry.order_samples.is_empty());
        for sample in &telemetry.order_samples {
            assert!(sample.placed_ms <= sample.assigned_ms);
            assert!(sample.assigned_ms <= sample.picked_up_ms);
            assert!(sample.picked_up_ms <= sample.delivered_ms);
        }
    }
}
