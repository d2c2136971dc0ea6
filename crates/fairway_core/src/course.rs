//! Course model: the 18-hole directed loop graph and the layered ETA model.
//!
//! The course is two directed 9-hole cycles (Front: 1→…→9→1, Back:
//! 10→…→18→10) stored as a flat table of segments indexed by `from_hole`.
//! Carts traverse their own nine forward-only; delivery staff may walk either
//! direction and cross between nines through the clubhouse. Staff paths are
//! solved with Dijkstra over the hole graph and memoized in an LRU cache.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use bevy_ecs::prelude::Resource;
use lru::LruCache;
use pathfinding::prelude::dijkstra;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

pub const HOLE_COUNT: u8 = 18;
pub const HOLES_PER_NINE: u8 = 9;

/// Graph node id for the clubhouse in staff paths. Holes keep their own number.
pub const CLUBHOUSE_NODE: u8 = 0;

/// Uphill stretch: segments arriving at holes 10–15 run 15% slow.
const UPHILL_MULTIPLIER: f64 = 1.15;

const STAFF_PATH_CACHE_CAP: usize = 256;

/// One of the two 9-hole loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nine {
    Front,
    Back,
}

impl Nine {
    pub fn of_hole(hole: u8) -> Result<Nine, DispatchError> {
        match hole {
            1..=9 => Ok(Nine::Front),
            10..=18 => Ok(Nine::Back),
            other => Err(DispatchError::InvalidInput(format!("unknown hole {other}"))),
        }
    }

    /// First hole of the nine (adjacent to the clubhouse).
    pub fn head(self) -> u8 {
        match self {
            Nine::Front => 1,
            Nine::Back => 10,
        }
    }

    pub fn contains(self, hole: u8) -> bool {
        match self {
            Nine::Front => (1..=9).contains(&hole),
            Nine::Back => (10..=18).contains(&hole),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Nine::Front => "front",
            Nine::Back => "back",
        }
    }
}

/// Directed edge between consecutive holes on a nine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from_hole: u8,
    pub to_hole: u8,
    pub avg_minutes: f64,
}

/// Where an asset currently is. Carts are always `Hole` or `OnSegment` within
/// their own nine; staff may additionally be at the clubhouse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location {
    Hole(u8),
    OnSegment { from: u8, to: u8, fraction: f64 },
    Clubhouse,
}

impl Location {
    /// The nine this location lies on, if it lies on one.
    pub fn nine(&self) -> Option<Nine> {
        match self {
            Location::Hole(h) => Nine::of_hole(*h).ok(),
            Location::OnSegment { from, .. } => Nine::of_hole(*from).ok(),
            Location::Clubhouse => None,
        }
    }
}

/// Demand buckets used by the oracle's travel multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Noon,
    Afternoon,
}

impl TimeOfDay {
    pub fn travel_multiplier(self) -> f64 {
        match self {
            TimeOfDay::Morning => 0.8,
            TimeOfDay::Noon => 1.2,
            TimeOfDay::Afternoon => 1.0,
        }
    }

    /// Bucket for a simulation timestamp: the first two hours after open are
    /// morning, the next three are the noon push, the rest afternoon.
    pub fn from_sim_ms(ms: u64) -> TimeOfDay {
        let mins = crate::clock::ms_to_mins(ms);
        if mins < 120.0 {
            TimeOfDay::Morning
        } else if mins < 300.0 {
            TimeOfDay::Noon
        } else {
            TimeOfDay::Afternoon
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Noon => "noon",
            TimeOfDay::Afternoon => "afternoon",
        }
    }
}

/// Static course graph plus the staff shortest-path cache.
#[derive(Resource)]
pub struct CourseMap {
    /// Forward segment leaving each hole, indexed by `from_hole` (slot 0 unused).
    forward: [Option<Segment>; 19],
    /// Walk time between the clubhouse and each nine's head hole: `[to hole 1, to hole 10]`.
    clubhouse_transfer_minutes: [f64; 2],
    /// Memoized staff paths keyed by `(from_node, to_node)`, value is the node
    /// sequence and base cost in ms (terrain applied, time-of-day not).
    staff_paths: Mutex<LruCache<(u8, u8), (Vec<u8>, u64)>>,
}

impl CourseMap {
    /// Build and validate a course from a segment table. The table must form
    /// exactly two simple directed cycles covering holes 1–9 and 10–18.
    pub fn from_segments(
        segments: Vec<Segment>,
        clubhouse_transfer_minutes: [f64; 2],
    ) -> Result<Self, DispatchError> {
        let mut forward: [Option<Segment>; 19] = [None; 19];
        for seg in segments {
            if !(1..=HOLE_COUNT).contains(&seg.from_hole) {
                return Err(DispatchError::InvalidInput(format!(
                    "segment leaves unknown hole {}",
                    seg.from_hole
                )));
            }
            if !(1..=HOLE_COUNT).contains(&seg.to_hole) {
                return Err(DispatchError::InvalidInput(format!(
                    "segment enters unknown hole {}",
                    seg.to_hole
                )));
            }
            if !(seg.avg_minutes.is_finite() && seg.avg_minutes > 0.0) {
                return Err(DispatchError::InvalidInput(format!(
                    "segment {}→{} has non-positive duration",
                    seg.from_hole, seg.to_hole
                )));
            }
            if forward[seg.from_hole as usize].is_some() {
                return Err(DispatchError::InvalidInput(format!(
                    "duplicate segment leaving hole {}",
                    seg.from_hole
                )));
            }
            forward[seg.from_hole as usize] = Some(seg);
        }
        for transfer in clubhouse_transfer_minutes {
            if !(transfer.is_finite() && transfer > 0.0) {
                return Err(DispatchError::InvalidInput(
                    "clubhouse transfer time must be positive".into(),
                ));
            }
        }

        let course = Self {
            forward,
            clubhouse_transfer_minutes,
            staff_paths: Mutex::new(LruCache::new(
                NonZeroUsize::new(STAFF_PATH_CACHE_CAP).expect("nonzero cache cap"),
            )),
        };
        course.validate_cycle(Nine::Front)?;
        course.validate_cycle(Nine::Back)?;
        Ok(course)
    }

    fn validate_cycle(&self, nine: Nine) -> Result<(), DispatchError> {
        let head = nine.head();
        let mut seen = [false; 19];
        let mut hole = head;
        for _ in 0..HOLES_PER_NINE {
            if !nine.contains(hole) || seen[hole as usize] {
                return Err(DispatchError::InvalidInput(format!(
                    "{} nine is not a simple cycle",
                    nine.name()
                )));
            }
            seen[hole as usize] = true;
            let seg = self.forward[hole as usize].ok_or_else(|| {
                DispatchError::InvalidInput(format!("no segment leaves hole {hole}"))
            })?;
            hole = seg.to_hole;
        }
        if hole != head {
            return Err(DispatchError::InvalidInput(format!(
                "{} nine does not close back on hole {head}",
                nine.name()
            )));
        }
        Ok(())
    }

    /// Walk time between the clubhouse and a nine's head hole.
    pub fn clubhouse_transfer(&self, nine: Nine) -> f64 {
        match nine {
            Nine::Front => self.clubhouse_transfer_minutes[0],
            Nine::Back => self.clubhouse_transfer_minutes[1],
        }
    }

    /// The forward segment leaving a hole.
    pub fn segment_from(&self, hole: u8) -> Result<Segment, DispatchError> {
        if !(1..=HOLE_COUNT).contains(&hole) {
            return Err(DispatchError::InvalidInput(format!("unknown hole {hole}")));
        }
        self.forward[hole as usize]
            .ok_or_else(|| DispatchError::InvalidInput(format!("no segment leaves hole {hole}")))
    }

    /// Segment time with the static terrain adjustment, before time-of-day and
    /// random perturbation.
    pub fn segment_base_minutes(&self, seg: &Segment) -> f64 {
        if (10..=15).contains(&seg.to_hole) {
            seg.avg_minutes * UPHILL_MULTIPLIER
        } else {
            seg.avg_minutes
        }
    }

    /// Forward step count from one hole to another on the same nine.
    pub fn forward_steps(&self, from_hole: u8, to_hole: u8) -> Result<u8, DispatchError> {
        let nine = Nine::of_hole(from_hole)?;
        if Nine::of_hole(to_hole)? != nine {
            return Err(DispatchError::InvalidInput(format!(
                "holes {from_hole} and {to_hole} are on different nines"
            )));
        }
        let mut hole = from_hole;
        for steps in 0..HOLES_PER_NINE {
            if hole == to_hole {
                return Ok(steps);
            }
            hole = self.segment_from(hole)?.to_hole;
        }
        Err(DispatchError::InvalidInput(format!(
            "hole {to_hole} unreachable from {from_hole}"
        )))
    }

    /// Cart ETA in minutes: forward-only traversal of the cart's nine.
    /// Returns `+∞` when the target is off the cart's nine (ineligible, not an
    /// error). A cart located off its own nine is a zone violation.
    pub fn cart_eta_minutes(
        &self,
        from: &Location,
        to_hole: u8,
        nine: Nine,
        time_of_day: TimeOfDay,
    ) -> Result<f64, DispatchError> {
        Nine::of_hole(to_hole)?;
        if !nine.contains(to_hole) {
            return Ok(f64::INFINITY);
        }

        let (start_hole, residual) = match *from {
            Location::Hole(h) => {
                if !nine.contains(h) {
                    return Err(DispatchError::ZoneViolation(format!(
                        "cart on {} nine located at hole {h}",
                        nine.name()
                    )));
                }
                (h, 0.0)
            }
            Location::OnSegment { from, to, fraction } => {
                if !nine.contains(from) || !nine.contains(to) {
                    return Err(DispatchError::ZoneViolation(format!(
                        "cart on {} nine located on segment {from}→{to}",
                        nine.name()
                    )));
                }
                let seg = self.segment_from(from)?;
                let residual = (1.0 - fraction.clamp(0.0, 1.0)) * self.segment_base_minutes(&seg);
                (to, residual)
            }
            Location::Clubhouse => {
                return Err(DispatchError::ZoneViolation(
                    "cart located at the clubhouse".into(),
                ))
            }
        };

        let mut minutes = residual;
        let mut hole = start_hole;
        for _ in 0..HOLES_PER_NINE {
            if hole == to_hole {
                return Ok(minutes * time_of_day.travel_multiplier());
            }
            let seg = self.segment_from(hole)?;
            minutes += self.segment_base_minutes(&seg);
            hole = seg.to_hole;
        }
        // validate_cycle guarantees the loop closes; reaching here means the
        // target was off-nine, handled above.
        Ok(f64::INFINITY)
    }

    /// Forward hole sequence a cart visits from `start_hole` up to and
    /// including `to_hole`.
    pub fn cart_path(&self, start_hole: u8, to_hole: u8) -> Result<Vec<u8>, DispatchError> {
        let mut path = vec![start_hole];
        let mut hole = start_hole;
        for _ in 0..HOLES_PER_NINE {
            if hole == to_hole {
                return Ok(path);
            }
            hole = self.segment_from(hole)?.to_hole;
            path.push(hole);
        }
        Err(DispatchError::ZoneViolation(format!(
            "cart path {start_hole}→{to_hole} crosses nines"
        )))
    }

    fn staff_edges(&self, node: u8) -> Vec<(u8, u64)> {
        let mut edges = Vec::with_capacity(4);
        if node == CLUBHOUSE_NODE {
            edges.push((1, crate::clock::mins_to_ms(self.clubhouse_transfer_minutes[0])));
            edges.push((10, crate::clock::mins_to_ms(self.clubhouse_transfer_minutes[1])));
            return edges;
        }
        // Forward along the nine.
        if let Some(seg) = self.forward[node as usize] {
            edges.push((
                seg.to_hole,
                crate::clock::mins_to_ms(self.segment_base_minutes(&seg)),
            ));
        }
        // Backward: staff may walk any segment in reverse at the same cost.
        for seg in self.forward.iter().flatten() {
            if seg.to_hole == node {
                edges.push((
                    seg.from_hole,
                    crate::clock::mins_to_ms(self.segment_base_minutes(seg)),
                ));
            }
        }
        // The clubhouse sits by both nines' head holes.
        if node == 1 {
            edges.push((
                CLUBHOUSE_NODE,
                crate::clock::mins_to_ms(self.clubhouse_transfer_minutes[0]),
            ));
        }
        if node == 10 {
            edges.push((
                CLUBHOUSE_NODE,
                crate::clock::mins_to_ms(self.clubhouse_transfer_minutes[1]),
            ));
        }
        edges
    }

    /// Shortest staff path between two graph nodes (0 = clubhouse). Returns
    /// the node sequence and base cost in ms, memoized.
    pub fn staff_path(&self, from_node: u8, to_node: u8) -> Result<(Vec<u8>, u64), DispatchError> {
        if from_node > HOLE_COUNT || to_node > HOLE_COUNT {
            return Err(DispatchError::InvalidInput(format!(
                "unknown course node {} or {}",
                from_node, to_node
            )));
        }
        if let Some(hit) = self
            .staff_paths
            .lock()
            .expect("staff path cache poisoned")
            .get(&(from_node, to_node))
        {
            return Ok(hit.clone());
        }

        let result = dijkstra(
            &from_node,
            |node| self.staff_edges(*node),
            |node| *node == to_node,
        )
        .ok_or_else(|| {
            DispatchError::InvalidInput(format!("no staff path {from_node}→{to_node}"))
        })?;

        self.staff_paths
            .lock()
            .expect("staff path cache poisoned")
            .put((from_node, to_node), result.clone());
        Ok(result)
    }

    /// Staff ETA in minutes from any location to a hole. Min of the two loop
    /// directions, crossing nines through the clubhouse when needed.
    pub fn staff_eta_minutes(
        &self,
        from: &Location,
        to_hole: u8,
        time_of_day: TimeOfDay,
    ) -> Result<f64, DispatchError> {
        Nine::of_hole(to_hole)?;
        let base_ms = match *from {
            Location::Hole(h) => {
                Nine::of_hole(h)?;
                self.staff_path(h, to_hole)?.1
            }
            Location::Clubhouse => self.staff_path(CLUBHOUSE_NODE, to_hole)?.1,
            Location::OnSegment { from, to, fraction } => {
                let seg = self.segment_from(from)?;
                let seg_ms = crate::clock::mins_to_ms(self.segment_base_minutes(&seg));
                let fraction = fraction.clamp(0.0, 1.0);
                let ahead = ((1.0 - fraction) * seg_ms as f64) as u64 + self.staff_path(to, to_hole)?.1;
                let behind = (fraction * seg_ms as f64) as u64 + self.staff_path(from, to_hole)?.1;
                ahead.min(behind)
            }
        };
        Ok(crate::clock::ms_to_mins(base_ms) * time_of_day.travel_multiplier())
    }

    /// Staff ETA in minutes from a location back to the clubhouse.
    pub fn clubhouse_eta_minutes(
        &self,
        from: &Location,
        time_of_day: TimeOfDay,
    ) -> Result<f64, DispatchError> {
        let base_ms = match *from {
            Location::Clubhouse => 0,
            Location::Hole(h) => {
                Nine::of_hole(h)?;
                self.staff_path(h, CLUBHOUSE_NODE)?.1
            }
            Location::OnSegment { from, to, fraction } => {
                let seg = self.segment_from(from)?;
                let seg_ms = crate::clock::mins_to_ms(self.segment_base_minutes(&seg));
                let fraction = fraction.clamp(0.0, 1.0);
                let ahead = ((1.0 - fraction) * seg_ms as f64) as u64
                    + self.staff_path(to, CLUBHOUSE_NODE)?.1;
                let behind = (fraction * seg_ms as f64) as u64
                    + self.staff_path(from, CLUBHOUSE_NODE)?.1;
                ahead.min(behind)
            }
        };
        Ok(crate::clock::ms_to_mins(base_ms) * time_of_day.travel_multiplier())
    }

    /// Hole-count proxy for how far an asset is from the clubhouse store.
    pub fn approx_distance_to_clubhouse(&self, from: &Location) -> f64 {
        match *from {
            Location::Clubhouse => 0.0,
            Location::Hole(h) => match self.staff_path(h, CLUBHOUSE_NODE) {
                Ok((path, _)) => path.len().saturating_sub(1) as f64,
                Err(_) => f64::INFINITY,
            },
            Location::OnSegment { to, .. } => match self.staff_path(to, CLUBHOUSE_NODE) {
                Ok((path, _)) => path.len() as f64,
                Err(_) => f64::INFINITY,
            },
        }
    }

    /// Hole-count proxy for how far an asset is from a hole, used by the
    /// acceptance model. Staff at the clubhouse count the head hop as one.
    pub fn approx_hole_distance(&self, from: &Location, to_hole: u8) -> f64 {
        match *from {
            Location::Hole(h) => match self.staff_path(h, to_hole) {
                Ok((path, _)) => path.len().saturating_sub(1) as f64,
                Err(_) => f64::INFINITY,
            },
            Location::OnSegment { to, .. } => match self.staff_path(to, to_hole) {
                Ok((path, _)) => path.len() as f64,
                Err(_) => f64::INFINITY,
            },
            Location::Clubhouse => match self.staff_path(CLUBHOUSE_NODE, to_hole) {
                Ok((path, _)) => path.len().saturating_sub(1) as f64,
                Err(_) => f64::INFINITY,
            },
        }
    }

    /// Hole the golfer who ordered at `order_hole` is predicted to occupy
    /// after `elapsed_min` minutes, advancing one hole per `pace_min` and
    /// wrapping within their nine.
    pub fn predicted_hole(
        &self,
        order_hole: u8,
        elapsed_min: f64,
        pace_min: f64,
    ) -> Result<u8, DispatchError> {
        Nine::of_hole(order_hole)?;
        if pace_min <= 0.0 {
            return Err(DispatchError::InvalidInput(
                "player pace must be positive".into(),
            ));
        }
        let steps = (elapsed_min.max(0.0) / pace_min).floor() as u32;
        let mut hole = order_hole;
        for _ in 0..(steps % HOLES_PER_NINE as u32) {
            hole = self.segment_from(hole)?.to_hole;
        }
        Ok(hole)
    }

    /// Half-spread (in holes) of the predicted drop-off hole under ±20%
    /// player-pace uncertainty. Feeds the predictability score as σ².
    pub fn prediction_sigma(elapsed_min: f64, pace_min: f64) -> f64 {
        if pace_min <= 0.0 || elapsed_min <= 0.0 {
            return 0.0;
        }
        let fast = elapsed_min / (pace_min * 0.8);
        let slow = elapsed_min / (pace_min * 1.2);
        (fast - slow) / 2.0
    }
}

impl Default for CourseMap {
    /// Standard course: 2-minute hops everywhere, clubhouse by both tee boxes.
    fn default() -> Self {
        let mut segments = Vec::with_capacity(18);
        for nine in [Nine::Front, Nine::Back] {
            let head = nine.head();
            for offset in 0..HOLES_PER_NINE {
                let from_hole = head + offset;
                let to_hole = if offset == HOLES_PER_NINE - 1 {
                    head
                } else {
                    from_hole + 1
                };
                segments.push(Segment {
                    from_hole,
                    to_hole,
                    avg_minutes: 2.0,
                });
            }
        }
        CourseMap::from_segments(segments, [1.5, 2.0]).expect("default course is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_course_validates() {
        let course = CourseMap::default();
        assert_eq!(course.segment_from(9).unwrap().to_hole, 1);
        assert_eq!(course.segment_from(18).unwrap().to_hole, 10);
        assert_eq!(course.forward_steps(1, 5).unwrap(), 4);
        assert_eq!(course.forward_steps(7, 2).unwrap(), 4);
    }

    #[test]
    fn rejects_course_that_is_not_two_cycles() {
        // 9 closes on 2 instead of 1: front is no longer a simple cycle.
        let mut segments = Vec::new();
        for nine in [Nine::Front, Nine::Back] {
            let head = nine.head();
            for offset in 0..HOLES_PER_NINE {
                let from_hole = head + offset;
                let to_hole = if offset == HOLES_PER_NINE - 1 {
                    if nine == Nine::Front {
                        2
                    } else {
                        head
                    }
                } else {
                    from_hole + 1
                };
                segments.push(Segment {
                    from_hole,
                    to_hole,
                    avg_minutes: 2.0,
                });
            }
        }
        assert!(CourseMap::from_segments(segments, [1.5, 2.0]).is_err());
    }

    #[test]
    fn cart_eta_is_forward_only() {
        let course = CourseMap::default();
        // Cart halfway along 4→5, target hole 2: must wrap 5→…→9→1→2,
        // never reverse. Residual 1.0 + six 2-minute segments.
        let from = Location::OnSegment {
            from: 4,
            to: 5,
            fraction: 0.5,
        };
        let eta = course
            .cart_eta_minutes(&from, 2, Nine::Front, TimeOfDay::Afternoon)
            .unwrap();
        assert!((eta - 13.0).abs() < 1e-9, "eta was {eta}");
    }

    #[test]
    fn cart_eta_off_nine_is_infinite() {
        let course = CourseMap::default();
        let eta = course
            .cart_eta_minutes(&Location::Hole(3), 14, Nine::Front, TimeOfDay::Afternoon)
            .unwrap();
        assert!(eta.is_infinite());
    }

    #[test]
    fn cart_off_its_own_nine_is_a_zone_violation() {
        let course = CourseMap::default();
        let err = course
            .cart_eta_minutes(&Location::Hole(12), 3, Nine::Front, TimeOfDay::Afternoon)
            .unwrap_err();
        assert!(matches!(err, DispatchError::ZoneViolation(_)));
    }

    #[test]
    fn staff_cross_nine_goes_through_clubhouse() {
        let course = CourseMap::default();
        // Clubhouse → hole 14: transfer to 10 (2.0) then four uphill
        // segments at 2.3 each.
        let eta = course
            .staff_eta_minutes(&Location::Clubhouse, 14, TimeOfDay::Afternoon)
            .unwrap();
        assert!((eta - 11.2).abs() < 1e-6, "eta was {eta}");

        let (path, _) = course.staff_path(CLUBHOUSE_NODE, 14).unwrap();
        assert_eq!(path, vec![0, 10, 11, 12, 13, 14]);
    }

    #[test]
    fn staff_takes_shorter_loop_direction() {
        let course = CourseMap::default();
        // Hole 3 → hole 2 is one reverse hop (2 min), not eight forward.
        let eta = course
            .staff_eta_minutes(&Location::Hole(3), 2, TimeOfDay::Afternoon)
            .unwrap();
        assert!((eta - 2.0).abs() < 1e-6, "eta was {eta}");
    }

    #[test]
    fn time_of_day_scales_travel() {
        let course = CourseMap::default();
        let noon = course
            .staff_eta_minutes(&Location::Clubhouse, 3, TimeOfDay::Noon)
            .unwrap();
        let morning = course
            .staff_eta_minutes(&Location::Clubhouse, 3, TimeOfDay::Morning)
            .unwrap();
        assert!(noon > morning);
    }

    #[test]
    fn predicted_hole_wraps_within_nine() {
        let course = CourseMap::default();
        assert_eq!(course.predicted_hole(5, 0.0, 15.0).unwrap(), 5);
        assert_eq!(course.predicted_hole(5, 16.0, 15.0).unwrap(), 6);
        assert_eq!(course.predicted_hole(9, 31.0, 15.0).unwrap(), 2);
        assert_eq!(course.predicted_hole(18, 16.0, 15.0).unwrap(), 10);
    }

    #[test]
    fn unknown_hole_is_invalid_input() {
        let course = CourseMap::default();
        assert!(matches!(
            course.cart_eta_minutes(&Location::Hole(1), 19, Nine::Front, TimeOfDay::Noon),
            Err(DispatchError::InvalidInput(_))
        ));
        assert!(matches!(
            course.staff_eta_minutes(&Location::Clubhouse, 0, TimeOfDay::Noon),
            Err(DispatchError::InvalidInput(_))
        ));
    }
}
