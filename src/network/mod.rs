//! Place/transition resource network derived from a computed schedule.
//!
//! The synthesizer converts a [`Schedule`](crate::models::Schedule) into a
//! bipartite graph: one transition per scheduled interval, and three
//! classes of positions (places):
//!
//! - **Station-ready**: a cyclic ring of positions per station, one per
//!   interval scheduled there — firing transition *i* consumes ready
//!   position *i* and produces ready position *(i+1) mod N*.
//! - **Transport-ready**: the same ring construction per transport unit.
//! - **Workpiece-location**: one position per buffer state a workpiece
//!   passes through — at storage, entry buffer, exit buffer, back at
//!   storage.
//!
//! Buffer-capacity constraints appear as *exclusion* (inhibitor) arcs:
//! non-consuming, non-producing guards that block a production transition
//! while the previous occupant still holds the referenced buffer position.
//!
//! Positions live in an arena and are referenced by index everywhere, so a
//! position shared between transitions is one value, never a diverging
//! copy.
//!
//! # Reference
//!
//! Murata (1989), "Petri Nets: Properties, Analysis and Applications"

mod synthesis;

pub use synthesis::synthesize_network;

use crate::models::{Route, Schedule};

/// Index of a [`Position`] in the network's arena.
pub type PositionId = usize;

/// Which buffer slot a workpiece-location position occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Entry buffer (before the operation).
    Entry,
    /// Exit buffer (after the operation) — also used for the storage
    /// positions at either end of a workpiece's plan.
    Exit,
}

/// What a position stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionKind {
    /// Ring position `cycle` of a station's readiness cycle.
    StationReady {
        /// Station (1-based).
        station: usize,
        /// Index within the ring.
        cycle: usize,
    },
    /// Ring position `cycle` of a transport unit's readiness cycle.
    TransportReady {
        /// Transport unit (0-based).
        unit: usize,
        /// Index within the ring.
        cycle: usize,
    },
    /// A workpiece buffer state. `station` 0 with `step` 0 is the initial
    /// at-storage position; `station` 0 with `step` = plan length is the
    /// final one.
    Location {
        /// Workpiece (0-based).
        workpiece: usize,
        /// Station (1-based) or 0 for storage.
        station: usize,
        /// Step index.
        step: usize,
        /// Entry or exit slot.
        slot: Slot,
    },
}

/// A place in the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Short identifier, e.g. `S1_2`, `V1_3`, `W2_4`.
    pub name: String,
    /// Human-readable description.
    pub label: String,
    /// Structural identity.
    pub kind: PositionKind,
}

/// A transition: the firing image of one scheduled interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Short identifier, `T1`, `T2`, … in resource-then-time order.
    pub name: String,
    /// The source interval's description.
    pub label: String,
    /// Resource index the interval was scheduled on.
    pub resource: usize,
    /// Workpiece index.
    pub workpiece: usize,
    /// Step index.
    pub step: usize,
    /// Transport endpoints; `None` for production transitions.
    pub route: Option<Route>,
    /// Consumed positions.
    pub inputs: Vec<PositionId>,
    /// Produced positions.
    pub outputs: Vec<PositionId>,
    /// Exclusion (inhibitor) guards: block firing while occupied, without
    /// consuming or producing.
    pub exclusions: Vec<PositionId>,
}

/// The derived place/transition network.
///
/// Read-only after construction; holds a back-reference to the schedule it
/// was synthesized from and never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNetwork<'a> {
    /// The schedule this network was derived from.
    pub schedule: &'a Schedule,
    /// Every position ever created, addressed by [`PositionId`].
    pub arena: Vec<Position>,
    /// One transition per scheduled interval, in resource-then-time order.
    pub transitions: Vec<Transition>,
    /// Transition indices grouped per resource, chronological within each.
    pub resource_transitions: Vec<Vec<usize>>,
    /// Ready-position rings, one per resource.
    pub ready_positions: Vec<Vec<PositionId>>,
    /// Workpiece-location chains, one per workpiece, in plan order.
    pub location_positions: Vec<Vec<PositionId>>,
    /// Positions referenced by at least one arc, in first-seen order over
    /// the transitions' inputs, outputs, and exclusions.
    pub positions: Vec<PositionId>,
}

impl ResourceNetwork<'_> {
    /// Resolves a position id.
    #[inline]
    pub fn position(&self, id: PositionId) -> &Position {
        &self.arena[id]
    }

    /// Number of transitions.
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Number of referenced positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}
