//! Location ticks: advance moving assets along their routes and accrue
//! active/idle time for every asset in the fleet.

use bevy_ecs::prelude::{Query, Res, ResMut, Resource};

use crate::clock::{mins_to_ms, CurrentEvent, EventKind, SimulationClock};
use crate::course::{CourseMap, Location, Nine, CLUBHOUSE_NODE};
use crate::ecs::{ActiveRoute, Asset, AssetKind, AssetLocation, AssetStats, AssetStatus};
use crate::scenario::{DetailedLogging, SimulationEndTimeMs, LOCATION_TICK_MIN};
use crate::telemetry::SimTelemetry;

/// Timestamp of the previous tick, for time accrual.
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct LastTickMs(pub u64);

fn edge_minutes(course: &CourseMap, a: u8, b: u8) -> f64 {
    if a == CLUBHOUSE_NODE || b == CLUBHOUSE_NODE {
        let hole = if a == CLUBHOUSE_NODE { b } else { a };
        // Transfer hops only exist at the two head holes.
        let nine = if hole == 10 { Nine::Back } else { Nine::Front };
        return course.clubhouse_transfer(nine);
    }
    if let Ok(seg) = course.segment_from(a) {
        if seg.to_hole == b {
            return course.segment_base_minutes(&seg);
        }
    }
    if let Ok(seg) = course.segment_from(b) {
        if seg.to_hole == a {
            return course.segment_base_minutes(&seg);
        }
    }
    1.0
}

/// Interpolated position a fraction of the way along a path. Carts get a
/// mid-segment position; staff snap to the last node passed (their reverse
/// and clubhouse hops are not course segments).
fn position_along(course: &CourseMap, path: &[u8], fraction: f64, is_cart: bool) -> Option<Location> {
    if path.len() < 2 {
        return None;
    }
    let edge_times: Vec<f64> = path
        .windows(2)
        .map(|pair| edge_minutes(course, pair[0], pair[1]))
        .collect();
    let total: f64 = edge_times.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let mut progress = fraction.clamp(0.0, 1.0) * total;
    for (idx, edge) in edge_times.iter().enumerate() {
        if progress <= *edge {
            let from = path[idx];
            let to = path[idx + 1];
            if is_cart {
                return Some(Location::OnSegment {
                    from,
                    to,
                    fraction: (progress / edge).clamp(0.0, 1.0),
                });
            }
            return Some(if from == CLUBHOUSE_NODE {
                Location::Clubhouse
            } else {
                Location::Hole(from)
            });
        }
        progress -= edge;
    }
    match *path.last()? {
        CLUBHOUSE_NODE => Some(Location::Clubhouse),
        hole => Some(Location::Hole(hole)),
    }
}

fn format_location(location: &Location) -> String {
    match location {
        Location::Clubhouse => "clubhouse".to_string(),
        Location::Hole(h) => format!("hole={h}"),
        Location::OnSegment { from, to, fraction } => {
            format!("segment={from}->{to}@{fraction:.2}")
        }
    }
}

#[allow(clippy::type_complexity)]
pub fn movement_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    course: Res<CourseMap>,
    end: Res<SimulationEndTimeMs>,
    detailed: Res<DetailedLogging>,
    mut last_tick: ResMut<LastTickMs>,
    mut telemetry: ResMut<SimTelemetry>,
    mut assets: Query<(
        &Asset,
        &mut AssetLocation,
        &mut AssetStats,
        Option<&ActiveRoute>,
    )>,
) {
    if event.0.kind != EventKind::LocationTick {
        return;
    }
    let now = clock.now();
    let delta = now.saturating_sub(last_tick.0);
    last_tick.0 = now;

    for (asset, mut location, mut stats, route) in assets.iter_mut() {
        if asset.status.is_active() {
            stats.active_ms += delta;
        } else {
            stats.idle_ms += delta;
        }

        if let Some(route) = route {
            let moving = matches!(
                asset.status,
                AssetStatus::EnRouteToPickup
                    | AssetStatus::EnRouteToCustomer
                    | AssetStatus::Returning
            );
            if moving {
                if let Some(leg) = route.current() {
                    if leg.path.len() >= 2 && now >= leg.depart_ms && now < leg.arrive_ms {
                        let span = (leg.arrive_ms - leg.depart_ms) as f64;
                        let fraction = (now - leg.depart_ms) as f64 / span;
                        if let Some(spot) = position_along(
                            &course,
                            &leg.path,
                            fraction,
                            asset.kind.is_cart(),
                        ) {
                            location.0 = spot;
                        }
                    }
                }
            }
        }

        // A cart off its nine means the planner or mover is broken; that is
        // fatal in simulation.
        if let AssetKind::BeverageCart(nine) = asset.kind {
            let on_nine = match location.0.nine() {
                Some(located) => located == nine,
                None => false,
            };
            assert!(
                on_nine,
                "cart {} strayed off the {} nine to {:?}",
                asset.id,
                nine.name(),
                location.0
            );
        }

        if detailed.0 {
            telemetry.log(
                now,
                "location_tick",
                None,
                Some(asset.id),
                format_location(&location.0),
            );
        }
    }

    let next = now + mins_to_ms(LOCATION_TICK_MIN);
    if next < end.0 {
        clock.schedule_at(next, EventKind::LocationTick, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_interpolates_onto_a_segment() {
        let course = CourseMap::default();
        let path = vec![1, 2, 3];
        // Three quarters through two equal segments lands mid 2→3.
        let spot = position_along(&course, &path, 0.75, true).unwrap();
        match spot {
            Location::OnSegment { from, to, fraction } => {
                assert_eq!((from, to), (2, 3));
                assert!((fraction - 0.5).abs() < 1e-9);
            }
            other => panic!("expected mid-segment, got {other:?}"),
        }
    }

    #[test]
    fn staff_snap_to_last_passed_node() {
        let course = CourseMap::default();
        let path = vec![CLUBHOUSE_NODE, 1, 2];
        let spot = position_along(&course, &path, 0.1, false).unwrap();
        assert_eq!(spot, Location::Clubhouse);
        let spot = position_along(&course, &path, 0.9, false).unwrap();
        assert_eq!(spot, Location::Hole(1));
    }

    #[test]
    fn full_fraction_reaches_path_end() {
        let course = CourseMap::default();
        let path = vec![3, 4, 5];
        let spot = position_along(&course, &path, 1.0, true).unwrap();
        match spot {
            Location::OnSegment { to, .. } => assert_eq!(to, 5),
            Location::Hole(h) => assert_eq!(h, 5),
            other => panic!("unexpected {other:?}"),
        }
    }
}
