//! Scheduling domain models.
//!
//! Core data types for the flexible-manufacturing scheduling problem and
//! its solutions:
//!
//! | Type | Role |
//! |------|------|
//! | [`PlanData`] | Immutable input: operation matrices, timing model, buffer capacities |
//! | [`PlanStep`] | One planned operation or transport leg |
//! | [`Schedule`] | Computed, non-overlapping interval timelines per resource |
//! | [`Interval`] | One scheduled occupation of a resource |

mod plan;
mod schedule;

pub use plan::PlanData;
pub use schedule::{Interval, PlanStep, Route, Schedule, ScheduleMode};
