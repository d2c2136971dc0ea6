//! # Fairway Dispatch Core
//!
//! A discrete-event dispatch and simulation engine for on-course food and
//! beverage delivery on an 18-hole golf course.
//!
//! ## Overview
//!
//! - **Event scheduling**: millisecond-precision discrete event system with
//!   FIFO resolution of same-timestamp events
//! - **Course model**: two directed 9-hole loops with forward-only carts,
//!   free-roaming staff, and a layered ETA model
//! - **Dispatch strategies**: pluggable order/asset pairing policies with a
//!   multi-factor default and a batching planner
//! - **Offer protocol**: time-bounded offers walked down a ranked candidate
//!   list with no-penalty decline cascades
//! - **Telemetry**: a stable line-oriented event log plus per-order samples
//!   feeding an on-demand KPI report
//!
//! Given the same `(config, seed)` pair, a run produces a bit-identical event
//! log and KPI report.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bevy_ecs::prelude::World;
//! use fairway_core::scenario::{build_scenario, ScenarioParams};
//! use fairway_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
//!
//! let mut world = World::new();
//! build_scenario(&mut world, ScenarioParams::default().with_seed(42)).unwrap();
//! initialize_simulation(&mut world);
//!
//! let mut schedule = simulation_schedule();
//! let steps = run_until_empty(&mut world, &mut schedule, 1_000_000);
//! ```

pub mod adapters;
pub mod batching;
pub mod clock;
pub mod course;
pub mod distributions;
pub mod ecs;
pub mod error;
pub mod kpi;
pub mod offer;
pub mod oracle;
pub mod runner;
pub mod scenario;
pub mod snapshot;
pub mod strategy;
pub mod systems;
pub mod telemetry;

#[cfg(test)]
pub mod test_helpers;
