//! Offer protocol: time-bounded proposals walked down a ranked candidate list.
//!
//! One `OfferProcess` lives on the order entity while a cascade is running.
//! Armed timers are never removed from the heap; each arming bumps the
//! generation and stale timer events no-op. Explicit declines advance the
//! cascade at the same simulated timestamp; silent candidates are resolved by
//! the `OfferTimeout` event at the end of the window. Declines feed the
//! acceptance statistics only and never re-rank the candidate.

use bevy_ecs::prelude::Component;

use crate::oracle::PredictionOracle;
use crate::scenario::OfferConfig;
use crate::strategy::RankedCandidate;

/// How a candidate will respond to an armed offer, resolved at arming time
/// from the seeded acceptance draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferResponsePlan {
    /// Accepts after the given response delay in ms (always inside the window).
    AcceptAfter(u64),
    /// Declines immediately.
    DeclineNow,
    /// Never responds; the armed timeout resolves the offer.
    Silent,
}

pub fn plan_response(
    oracle: &PredictionOracle,
    config: &OfferConfig,
    probability: f64,
    order_id: u32,
    asset_id: u32,
    attempt: u32,
) -> OfferResponsePlan {
    if oracle.acceptance_draw(probability, order_id, asset_id, attempt) {
        let span = config
            .window_ms
            .saturating_sub(config.min_response_ms)
            .max(1);
        let jitter = oracle.offer_behavior_draw(order_id, asset_id, attempt);
        let delay = config.min_response_ms + (jitter * 0.8 * span as f64) as u64;
        OfferResponsePlan::AcceptAfter(delay.min(config.window_ms.saturating_sub(1)))
    } else if oracle.offer_behavior_draw(order_id, asset_id, attempt) < config.silent_decline_share
    {
        OfferResponsePlan::Silent
    } else {
        OfferResponsePlan::DeclineNow
    }
}

/// Live cascade state for one order. Present only while the order is
/// `Offered`; removed on commit or exhaustion.
#[derive(Debug, Clone, Component)]
pub struct OfferProcess {
    /// Strategy ranking, best first. Never reordered by declines.
    pub ranked: Vec<RankedCandidate>,
    /// Index of the candidate currently holding the offer.
    pub current: usize,
    /// Bumped on every arming; timer events carrying an older generation are
    /// superseded and must not fire.
    pub generation: u32,
    /// Resolved response of the current candidate.
    pub will_accept: bool,
    pub armed_at_ms: u64,
}

impl OfferProcess {
    pub fn new(ranked: Vec<RankedCandidate>) -> Self {
        Self {
            ranked,
            current: 0,
            generation: 0,
            will_accept: false,
            armed_at_ms: 0,
        }
    }

    pub fn current_candidate(&self) -> Option<&RankedCandidate> {
        self.ranked.get(self.current)
    }
}

/// Result of walking the cascade forward looking for an armable candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    Armed,
    Exhausted,
}

/// Arm the next candidate in the cascade that can still take the offer.
///
/// `lock_asset` attempts the registry precondition: flip the asset to
/// `OfferPending` iff it is `Available` and record the received offer,
/// returning its id. Candidates that cannot be locked are skipped without
/// consuming an attempt.
#[allow(clippy::too_many_arguments)]
pub fn advance_cascade(
    process: &mut OfferProcess,
    order_entity: bevy_ecs::prelude::Entity,
    order_id: u32,
    timing: &mut crate::ecs::OrderTiming,
    clock: &mut crate::clock::SimulationClock,
    telemetry: &mut crate::telemetry::SimTelemetry,
    oracle: &PredictionOracle,
    config: &OfferConfig,
    mut lock_asset: impl FnMut(bevy_ecs::prelude::Entity) -> Option<u32>,
) -> ArmOutcome {
    use crate::clock::{EventKind, EventSubject};

    while process.current < process.ranked.len() {
        let candidate = process.ranked[process.current].clone();
        let Some(asset_id) = lock_asset(candidate.asset) else {
            process.current += 1;
            continue;
        };
        let attempt = timing.offer_count;
        timing.offer_count += 1;
        if timing.first_offered_at.is_none() {
            timing.first_offered_at = Some(clock.now());
        }
        process.generation += 1;
        process.armed_at_ms = clock.now();
        let generation = process.generation;
        let plan = plan_response(
            oracle,
            config,
            candidate.score.acceptance_prob,
            order_id,
            asset_id,
            attempt,
        );
        match plan {
            OfferResponsePlan::AcceptAfter(delay_ms) => {
                process.will_accept = true;
                clock.schedule_in(
                    delay_ms,
                    EventKind::OfferResponse,
                    Some(EventSubject::Offer(order_entity, generation)),
                );
            }
            OfferResponsePlan::DeclineNow => {
                process.will_accept = false;
                clock.schedule_in(
                    0,
                    EventKind::OfferResponse,
                    Some(EventSubject::Offer(order_entity, generation)),
                );
            }
            OfferResponsePlan::Silent => {
                process.will_accept = false;
            }
        }
        clock.schedule_in(
            config.window_ms,
            EventKind::OfferTimeout,
            Some(EventSubject::Offer(order_entity, generation)),
        );
        telemetry.log(
            clock.now(),
            "offer_armed",
            Some(order_id),
            Some(asset_id),
            format!("p={:.2}", candidate.score.acceptance_prob),
        );
        return ArmOutcome::Armed;
    }
    ArmOutcome::Exhausted
}

/// Shared failure path for an exhausted cascade or a `NoCandidate` dispatch:
/// bump the retry counter and either back off or mark the order unassignable.
pub fn retry_or_unassign(
    order_entity: bevy_ecs::prelude::Entity,
    order: &mut crate::ecs::Order,
    clock: &mut crate::clock::SimulationClock,
    telemetry: &mut crate::telemetry::SimTelemetry,
    config: &OfferConfig,
) {
    use crate::clock::{EventKind, EventSubject};
    use crate::ecs::OrderState;

    order.retry_count += 1;
    if order.retry_count > config.max_retries {
        order.state = OrderState::Unassignable;
        telemetry.orders_unassignable += 1;
        telemetry.log(
            clock.now(),
            "order_unassignable",
            Some(order.id),
            None,
            format!("retries={}", order.retry_count),
        );
    } else {
        order.state = OrderState::Pending;
        clock.schedule_in(
            config.retry_backoff_ms,
            EventKind::DispatchOrder,
            Some(EventSubject::Order(order_entity)),
        );
        telemetry.log(
            clock.now(),
            "dispatch_retry",
            Some(order.id),
            None,
            format!("attempt={}", order.retry_count),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_is_deterministic() {
        let oracle = PredictionOracle::new(11);
        let config = OfferConfig::default();
        let a = plan_response(&oracle, &config, 0.6, 1, 2, 0);
        let b = plan_response(&oracle, &config, 0.6, 1, 2, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn certain_acceptance_responds_inside_the_window() {
        let oracle = PredictionOracle::new(11);
        let config = OfferConfig::default();
        for attempt in 0..16 {
            match plan_response(&oracle, &config, 1.0, 7, 3, attempt) {
                OfferResponsePlan::AcceptAfter(delay) => {
                    assert!(delay < config.window_ms);
                    assert!(delay >= config.min_response_ms);
                }
                other => panic!("expected acceptance, got {other:?}"),
            }
        }
    }

    #[test]
    fn zero_probability_never_accepts() {
        let oracle = PredictionOracle::new(11);
        let config = OfferConfig::default();
        for attempt in 0..16 {
            assert!(!matches!(
                plan_response(&oracle, &config, 0.0, 7, 3, attempt),
                OfferResponsePlan::AcceptAfter(_)
            ));
        }
    }

    #[test]
    fn silent_share_zero_always_declines_explicitly() {
        let oracle = PredictionOracle::new(11);
        let config = OfferConfig {
            silent_decline_share: 0.0,
            ..OfferConfig::default()
        };
        for attempt in 0..16 {
            let plan = plan_response(&oracle, &config, 0.0, 7, 3, attempt);
            assert_eq!(plan, OfferResponsePlan::DeclineNow);
        }
    }
}
