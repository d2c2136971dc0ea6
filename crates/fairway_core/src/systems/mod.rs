//! Event-handling systems, one file per event kind.
//!
//! Each system checks [`crate::clock::CurrentEvent`] (the runner additionally
//! gates them with `run_if` conditions) and performs all of its mutations
//! inside the handler, so state changes are atomic between events.

pub mod asset_arrived;
pub mod delivery_complete;
pub mod dispatch;
pub mod movement;
pub mod offer_response;
pub mod offer_timeout;
pub mod order_arrival;
pub mod simulation_end;
pub mod spawner;
