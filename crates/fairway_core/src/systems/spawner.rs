//! Order arrival generator and simulation bootstrap.

use bevy_ecs::prelude::{Res, ResMut, Resource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::{mins_to_ms, CurrentEvent, EventKind, SimulationClock};
use crate::distributions::InterArrivalDistribution;
use crate::ecs::{ItemComplexity, MenuItem};
use crate::scenario::{SimulationEndTimeMs, LOCATION_TICK_MIN};
use crate::telemetry::SimTelemetry;

/// Clubhouse menu the generator draws from.
const CATALOG: &[(&str, f64, ItemComplexity)] = &[
    ("water", 3.0, ItemComplexity::Simple),
    ("sports drink", 5.0, ItemComplexity::Simple),
    ("lemonade", 6.0, ItemComplexity::Simple),
    ("domestic beer", 7.5, ItemComplexity::Simple),
    ("hot dog", 9.0, ItemComplexity::Medium),
    ("nachos", 11.0, ItemComplexity::Medium),
    ("turkey wrap", 13.0, ItemComplexity::Medium),
    ("quesadilla", 14.0, ItemComplexity::Complex),
    ("club sandwich", 16.0, ItemComplexity::Complex),
];

const SPAWN_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Arrival stream state. Draws are keyed on the arrival index so the stream
/// is fixed for a seed no matter how events interleave.
#[derive(Resource)]
pub struct OrderSpawner {
    pub inter_arrival: Box<dyn InterArrivalDistribution>,
    pub seed: u64,
    /// Per-hole arrival weights (index 0 = hole 1); `None` is uniform.
    pub hole_weights: Option<Vec<f64>>,
    pub spawned: u64,
}

impl OrderSpawner {
    fn rng_for(&self, arrival_index: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ arrival_index.wrapping_mul(SPAWN_MIX))
    }

    pub fn draw_hole(&self, arrival_index: u64) -> u8 {
        let mut rng = self.rng_for(arrival_index);
        match &self.hole_weights {
            None => rng.gen_range(1..=crate::course::HOLE_COUNT),
            Some(weights) => {
                let total: f64 = weights.iter().copied().filter(|w| *w > 0.0).sum();
                if total <= 0.0 {
                    return rng.gen_range(1..=crate::course::HOLE_COUNT);
                }
                let mut roll = rng.gen_range(0.0..total);
                for (idx, weight) in weights.iter().enumerate() {
                    if *weight <= 0.0 {
                        continue;
                    }
                    if roll < *weight {
                        return (idx as u8 + 1).min(crate::course::HOLE_COUNT);
                    }
                    roll -= weight;
                }
                crate::course::HOLE_COUNT
            }
        }
    }

    pub fn draw_items(&self, arrival_index: u64) -> Vec<MenuItem> {
        // Separate stream from the hole draw so adding catalog entries does
        // not shift hole placement.
        let mut rng = StdRng::seed_from_u64(
            self.seed
                .rotate_left(21)
                .wrapping_add(arrival_index.wrapping_mul(SPAWN_MIX)),
        );
        let count = rng.gen_range(1..=3);
        (0..count)
            .map(|_| {
                let (name, unit_price, complexity) = CATALOG[rng.gen_range(0..CATALOG.len())];
                MenuItem {
                    name: name.to_string(),
                    quantity: rng.gen_range(1..=3),
                    complexity,
                    unit_price,
                }
            })
            .collect()
    }

    /// Next arrival timestamp, or `None` once the stream has ended.
    pub fn next_arrival_ms(&self, now_ms: u64, end_ms: u64) -> Option<u64> {
        let gap = self.inter_arrival.sample_minutes(self.spawned);
        if !gap.is_finite() {
            return None;
        }
        let at = now_ms.saturating_add(mins_to_ms(gap));
        (at < end_ms).then_some(at)
    }
}

/// Bootstrap: first order arrival and the location-tick train.
pub fn simulation_started_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    spawner: Res<OrderSpawner>,
    end: Res<SimulationEndTimeMs>,
    mut telemetry: ResMut<SimTelemetry>,
) {
    if event.0.kind != EventKind::SimulationStarted {
        return;
    }
    telemetry.log(clock.now(), "simulation_started", None, None, String::new());

    if let Some(at) = spawner.next_arrival_ms(clock.now(), end.0) {
        clock.schedule_at(at, EventKind::OrderArrival, None);
    }
    let first_tick = clock.now() + mins_to_ms(LOCATION_TICK_MIN);
    if first_tick < end.0 {
        clock.schedule_at(first_tick, EventKind::LocationTick, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::UniformInterArrival;

    fn spawner(weights: Option<Vec<f64>>) -> OrderSpawner {
        OrderSpawner {
            inter_arrival: Box::new(UniformInterArrival { interval_min: 5.0 }),
            seed: 42,
            hole_weights: weights,
            spawned: 0,
        }
    }

    #[test]
    fn holes_stay_in_range_and_replay() {
        let s = spawner(None);
        for i in 0..100 {
            let hole = s.draw_hole(i);
            assert!((1..=18).contains(&hole));
            assert_eq!(hole, s.draw_hole(i));
        }
    }

    #[test]
    fn weighted_draws_respect_zeroed_holes() {
        // All mass on hole 14.
        let mut weights = vec![0.0; 18];
        weights[13] = 1.0;
        let s = spawner(Some(weights));
        for i in 0..50 {
            assert_eq!(s.draw_hole(i), 14);
        }
    }

    #[test]
    fn items_are_non_empty_and_priced() {
        let s = spawner(None);
        for i in 0..50 {
            let items = s.draw_items(i);
            assert!(!items.is_empty() && items.len() <= 3);
            for item in &items {
                assert!(item.unit_price > 0.0);
                assert!((1..=3).contains(&item.quantity));
            }
        }
    }

    #[test]
    fn arrivals_stop_at_simulation_end() {
        let s = spawner(None);
        assert_eq!(s.next_arrival_ms(0, mins_to_ms(240.0)), Some(mins_to_ms(5.0)));
        assert_eq!(s.next_arrival_ms(mins_to_ms(238.0), mins_to_ms(240.0)), None);
    }
}
