//! Simulation time: millisecond-scale timeline driven by a scheduled-event heap.
//!
//! All timestamps and `clock.now()` are in **simulation milliseconds**. The
//! timeline advances by popping the next scheduled event; events at the same
//! millisecond are processed in insertion order, so runs are deterministic for
//! a given `(config, seed)` pair.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};

/// One second in simulation milliseconds.
pub const ONE_SEC_MS: u64 = 1000;
/// One minute in simulation milliseconds.
pub const ONE_MIN_MS: u64 = 60 * ONE_SEC_MS;

/// Convert fractional minutes to simulation milliseconds (saturating, never negative).
pub fn mins_to_ms(mins: f64) -> u64 {
    if mins <= 0.0 {
        return 0;
    }
    (mins * ONE_MIN_MS as f64).round() as u64
}

/// Convert simulation milliseconds to fractional minutes.
pub fn ms_to_mins(ms: u64) -> f64 {
    ms as f64 / ONE_MIN_MS as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    SimulationStarted,
    OrderArrival,
    DispatchOrder,
    OfferResponse,
    OfferTimeout,
    AssetArrived,
    DeliveryComplete,
    LocationTick,
    SimulationEnd,
}

impl EventKind {
    /// Stable name used in the event log output.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SimulationStarted => "simulation_started",
            EventKind::OrderArrival => "order_arrival",
            EventKind::DispatchOrder => "dispatch_order",
            EventKind::OfferResponse => "offer_response",
            EventKind::OfferTimeout => "offer_timeout",
            EventKind::AssetArrived => "asset_arrived",
            EventKind::DeliveryComplete => "delivery_complete",
            EventKind::LocationTick => "location_tick",
            EventKind::SimulationEnd => "simulation_end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    Order(Entity),
    Asset(Entity),
    /// An armed offer: the order it belongs to plus the arming generation.
    /// A stale generation means the timer was superseded and must not fire.
    Offer(Entity, u32),
}

/// Simulation event. `timestamp` is in **milliseconds** (simulation time).
/// `seq` is assigned by the clock at scheduling time and breaks timestamp ties
/// in FIFO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub seq: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by timestamp; same-ms events pop in insertion order.
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

/// Simulation clock: time in **milliseconds**, advances to the next scheduled event.
#[derive(Debug, Clone, Resource, Default)]
pub struct SimulationClock {
    /// Current simulation time in ms (updated when an event is popped).
    now: u64,
    next_seq: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    /// Current simulation time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Current simulation time in fractional minutes.
    pub fn now_mins(&self) -> f64 {
        ms_to_mins(self.now)
    }

    /// Schedule an event at a specific simulation timestamp (ms).
    pub fn schedule_at(&mut self, at_ms: u64, kind: EventKind, subject: Option<EventSubject>) {
        debug_assert!(at_ms >= self.now, "event timestamp must be >= current time");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            timestamp: at_ms,
            seq,
            kind,
            subject,
        });
    }

    /// Schedule an event at `now + delta_ms` (relative, in ms).
    pub fn schedule_in(&mut self, delta_ms: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_at(self.now.saturating_add(delta_ms), kind, subject);
    }

    /// Schedule an event in **delta_mins** fractional minutes from now.
    pub fn schedule_in_mins(&mut self, delta_mins: f64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_in(mins_to_ms(delta_mins), kind, subject);
    }

    /// Pop the next event (earliest timestamp, FIFO on ties). Advances `now`.
    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    /// Timestamp of the next scheduled event without popping it.
    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|event| event.timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events still in the queue (for tests and scenario validation).
    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pops_events_in_time_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(20, EventKind::OrderArrival, None);
        clock.schedule_at(5, EventKind::OrderArrival, None);
        clock.schedule_at(20, EventKind::DispatchOrder, None);
        clock.schedule_at(10, EventKind::OrderArrival, None);

        let first = clock.pop_next().expect("first event");
        assert_eq!(first.timestamp, 5);
        assert_eq!(clock.now(), 5);

        let second = clock.pop_next().expect("second event");
        assert_eq!(second.timestamp, 10);
        assert_eq!(clock.now(), 10);

        // Same timestamp (20): insertion order wins, OrderArrival was scheduled first.
        let third = clock.pop_next().expect("third event");
        assert_eq!(third.timestamp, 20);
        assert_eq!(third.kind, EventKind::OrderArrival);
        let fourth = clock.pop_next().expect("fourth event");
        assert_eq!(fourth.kind, EventKind::DispatchOrder);

        assert!(clock.pop_next().is_none());
        assert!(clock.is_empty());
    }

    #[test]
    fn same_timestamp_fifo_is_stable_across_kinds() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(7, EventKind::SimulationEnd, None);
        clock.schedule_at(7, EventKind::OrderArrival, None);
        clock.schedule_at(7, EventKind::DeliveryComplete, None);

        let kinds: Vec<_> = std::iter::from_fn(|| clock.pop_next())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::SimulationEnd,
                EventKind::OrderArrival,
                EventKind::DeliveryComplete
            ]
        );
    }

    #[test]
    fn minute_conversions_round_trip() {
        assert_eq!(mins_to_ms(1.5), 90_000);
        assert_eq!(mins_to_ms(0.0), 0);
        assert!((ms_to_mins(90_000) - 1.5).abs() < 1e-9);
    }
}
