//! Domain errors surfaced at the engine boundary.
//!
//! Policy: recover locally where recovery preserves correctness (oracle
//! fallback, candidate advancement), surface upward where operator input is
//! required (`OfferExhausted`), and treat invariant violations as fatal in
//! simulation (`ZoneViolation` indicates a planner bug).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Unknown hole, negative duration, ill-formed batch or course table.
    /// Rejected at the boundary; no state changes.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Dispatch found zero feasible assets. The order stays `Pending` and is
    /// retried on the backoff cycle.
    #[error("no feasible candidate for order")]
    NoCandidate,

    /// The full ranked list declined within the retry cap. The order is
    /// `Unassignable`; callers may requeue manually.
    #[error("offer list exhausted after retry cap")]
    OfferExhausted,

    /// A cart was asked to serve the other nine. Planner bug in simulation.
    #[error("zone violation: {0}")]
    ZoneViolation(String),

    /// Prediction call failed; callers fall back to deterministic defaults.
    #[error("prediction oracle unavailable")]
    OracleUnavailable,

    /// Unknown entity id passed through the adapter surface.
    #[error("unknown {kind} id {id}")]
    UnknownId { kind: &'static str, id: u32 },
}
