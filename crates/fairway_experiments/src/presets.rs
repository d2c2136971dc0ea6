//! Named scenario presets used by tests and sweeps.

use fairway_core::scenario::ScenarioParams;

/// Slow start to the day: one cart patrolling the front, one runner.
pub fn quiet_morning() -> ScenarioParams {
    ScenarioParams::default()
        .with_duration_min(120.0)
        .with_order_interval(10.0, 3.0)
        .with_fleet(1, 1)
}

/// Tee sheet full, turn snarled: short intervals, boosted volume, full fleet.
pub fn rush_hour() -> ScenarioParams {
    ScenarioParams::default()
        .with_duration_min(240.0)
        .with_order_interval(2.0, 0.75)
        .with_volume_multiplier(1.5)
        .with_fleet(2, 3)
}

/// Outing on the back nine: demand concentrated on holes 10–18.
pub fn back_nine_crunch() -> ScenarioParams {
    let mut weights = vec![0.5; 18];
    for slot in weights.iter_mut().skip(9) {
        *slot = 2.0;
    }
    ScenarioParams::default()
        .with_duration_min(180.0)
        .with_order_interval(3.0, 1.0)
        .with_fleet(2, 2)
        .with_hole_weights(weights)
}

/// Weekday skeleton crew with weekend demand.
pub fn understaffed() -> ScenarioParams {
    ScenarioParams::default()
        .with_duration_min(240.0)
        .with_order_interval(2.5, 1.0)
        .with_fleet(1, 1)
}

pub fn by_name(name: &str) -> Option<ScenarioParams> {
    match name {
        "quiet_morning" => Some(quiet_morning()),
        "rush_hour" => Some(rush_hour()),
        "back_nine_crunch" => Some(back_nine_crunch()),
        "understaffed" => Some(understaffed()),
        _ => None,
    }
}

pub fn names() -> [&'static str; 4] {
    ["quiet_morning", "rush_hour", "back_nine_crunch", "understaffed"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_resolves_by_name() {
        for name in names() {
            assert!(by_name(name).is_some(), "preset {name} missing");
        }
        assert!(by_name("lunch_rush").is_none());
    }

    #[test]
    fn presets_are_valid_scenarios() {
        use bevy_ecs::prelude::World;
        use fairway_core::scenario::build_scenario;

        for name in names() {
            let mut world = World::new();
            let params = by_name(name).unwrap();
            assert!(
                build_scenario(&mut world, params).is_ok(),
                "preset {name} failed validation"
            );
        }
    }
}
