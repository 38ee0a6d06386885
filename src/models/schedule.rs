//! Schedule (timeline) model.
//!
//! A [`Schedule`] is the scheduler's working and output state: the
//! per-workpiece operation plans, one interval timeline per resource
//! (stations first, transport units after), and the resulting cycle time.
//!
//! # Invariants
//!
//! For a given resource, intervals are strictly time-ordered and pairwise
//! non-overlapping. For a given workpiece, scheduled steps occur in plan
//! order with each start no earlier than the previous end.

use serde::{Deserialize, Serialize};

use super::PlanData;
use crate::dispatching::{ProductionRule, TransportRule};

/// Which timeline the scheduler computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScheduleMode {
    /// Processing stations only.
    #[default]
    Standard,
    /// Processing stations with transport legs interleaved.
    Extended,
}

/// A transport leg's endpoints (0 = central storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Pickup point.
    pub from: usize,
    /// Drop-off point.
    pub to: usize,
}

/// One entry in a workpiece's (possibly extended) operation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanStep {
    /// A processing operation at a station.
    Process {
        /// Target station (1-based).
        station: usize,
        /// Step index within the workpiece's plan.
        step: usize,
        /// Processing duration.
        duration: f64,
        /// Human-readable description.
        label: String,
    },
    /// A transport leg between two points.
    Transfer {
        /// Step index of the operation this leg precedes (or follows, for
        /// the final return to storage).
        step: usize,
        /// Pickup point (0 = storage).
        from: usize,
        /// Drop-off point (0 = storage).
        to: usize,
        /// Leg duration, from the plan's travel-time matrix.
        duration: f64,
        /// Human-readable description.
        label: String,
    },
}

impl PlanStep {
    /// The step's duration.
    #[inline]
    pub fn duration(&self) -> f64 {
        match self {
            PlanStep::Process { duration, .. } | PlanStep::Transfer { duration, .. } => *duration,
        }
    }

    /// The step index within the workpiece's plan.
    #[inline]
    pub fn step(&self) -> usize {
        match self {
            PlanStep::Process { step, .. } | PlanStep::Transfer { step, .. } => *step,
        }
    }

    /// The description label.
    pub fn label(&self) -> &str {
        match self {
            PlanStep::Process { label, .. } | PlanStep::Transfer { label, .. } => label,
        }
    }
}

/// A scheduled occupation of one resource by one workpiece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Workpiece index (0-based).
    pub workpiece: usize,
    /// Step index within the workpiece's plan.
    pub step: usize,
    /// Start time.
    pub start: f64,
    /// End time (exclusive).
    pub end: f64,
    /// Human-readable description.
    pub label: String,
    /// Transport endpoints; `None` for processing intervals.
    pub route: Option<Route>,
}

impl Interval {
    /// Interval length.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A computed execution timeline.
///
/// Owns a copy of the [`PlanData`] it was computed from so downstream
/// consumers (the network synthesizer, renderers) need only the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// The input plan this schedule was computed from.
    pub plan: PlanData,
    /// Mode the scheduler ran in.
    pub mode: ScheduleMode,
    /// Production dispatch rule used.
    pub production_rule: ProductionRule,
    /// Transport dispatch rule configured (see `dispatching` for caveats).
    pub transport_rule: TransportRule,
    /// Per-workpiece operation plans (processing steps only).
    pub plans: Vec<Vec<PlanStep>>,
    /// Per-workpiece extended plans with transport legs; empty in Standard mode.
    pub extended_plans: Vec<Vec<PlanStep>>,
    /// One timeline per resource: stations `0..station_count`, then
    /// transport units.
    pub timelines: Vec<Vec<Interval>>,
    /// Final clock value — the makespan.
    pub cycle_time: f64,
    /// Whether a scheduler run has completed on this value.
    pub is_calculated: bool,
}

impl Schedule {
    /// Creates an empty schedule shell for a plan.
    pub fn new(
        plan: PlanData,
        mode: ScheduleMode,
        production_rule: ProductionRule,
        transport_rule: TransportRule,
    ) -> Self {
        let workpieces = plan.workpiece_count;
        let resources = plan.resource_count();
        Self {
            plan,
            mode,
            production_rule,
            transport_rule,
            plans: vec![Vec::new(); workpieces],
            extended_plans: vec![Vec::new(); workpieces],
            timelines: vec![Vec::new(); resources],
            cycle_time: 0.0,
            is_calculated: false,
        }
    }

    /// Resource index of a station (1-based station id).
    #[inline]
    pub fn station_resource(&self, station: usize) -> usize {
        station - 1
    }

    /// Resource index of a transport unit (0-based unit id).
    #[inline]
    pub fn transport_resource(&self, unit: usize) -> usize {
        self.plan.station_count + unit
    }

    /// Number of resources (stations + transport units).
    #[inline]
    pub fn resource_count(&self) -> usize {
        self.timelines.len()
    }

    /// Latest end time across every timeline.
    pub fn makespan(&self) -> f64 {
        self.timelines
            .iter()
            .flatten()
            .map(|iv| iv.end)
            .fold(0.0, f64::max)
    }

    /// All intervals scheduled on one resource, in time order.
    pub fn intervals_for_resource(&self, resource: usize) -> &[Interval] {
        &self.timelines[resource]
    }

    /// All intervals for one workpiece across every resource, in time order.
    pub fn intervals_for_workpiece(&self, workpiece: usize) -> Vec<&Interval> {
        let mut intervals: Vec<&Interval> = self
            .timelines
            .iter()
            .flatten()
            .filter(|iv| iv.workpiece == workpiece)
            .collect();
        intervals.sort_by(|a, b| {
            a.start
                .partial_cmp(&b.start)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        intervals
    }

    /// Accumulated scheduled duration on one resource.
    pub fn resource_load(&self, resource: usize) -> f64 {
        self.timelines[resource].iter().map(Interval::duration).sum()
    }

    /// Total number of scheduled intervals.
    pub fn interval_count(&self) -> usize {
        self.timelines.iter().map(Vec::len).sum()
    }
}
