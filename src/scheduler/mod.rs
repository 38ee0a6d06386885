//! Discrete-event scheduling engine.
//!
//! Turns a static [`crate::models::PlanData`] into a conflict-free
//! [`crate::models::Schedule`] under a pluggable dispatch rule, in one of
//! two modes:
//!
//! - **Standard**: processing stations only.
//! - **Extended**: transport legs interleaved — storage to the first
//!   station, between consecutive stations, and back to storage after the
//!   last operation.
//!
//! # Algorithm
//!
//! A single-pass event loop: collect candidates for free resources,
//! dispatch one per station via the production rule, advance the clock to
//! the earliest completion, release resources and workpieces. The run is
//! pure and deterministic; identical inputs produce identical schedules.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Banks et al. (2010), "Discrete-Event System Simulation"

mod engine;

pub use engine::{compute_schedule, Scheduler};
