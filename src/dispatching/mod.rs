//! Dispatch rules for production and transport resource assignment.
//!
//! When several workpieces compete for one station, the active
//! [`ProductionRule`] selects exactly one. Selection is deterministic: every
//! rule uses strict comparisons, so ties keep the first candidate in
//! collection order (station index ascending, then workpiece index
//! ascending).
//!
//! The rule sets are closed, so they are modeled as enums with `match`
//! dispatch rather than trait objects.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use serde::{Deserialize, Serialize};

use crate::models::Route;

/// A workpiece's pending operation, queued at one resource for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Workpiece index (0-based).
    pub workpiece: usize,
    /// Step index within the workpiece's plan.
    pub step: usize,
    /// Operation or leg duration.
    pub duration: f64,
    /// Human-readable description.
    pub label: String,
    /// Transport endpoints; `None` for processing candidates.
    pub route: Option<Route>,
}

/// Per-workpiece and per-station state a production rule evaluates against.
///
/// Built by the scheduler immediately before each dispatch round; all
/// slices are indexed the same way as the schedule's own arrays.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    /// Per workpiece: sum of unscheduled operation durations, current
    /// operation included.
    pub remaining_work: &'a [f64],
    /// Per workpiece: station of the operation after the pending one
    /// (1-based), or `None` when the workpiece returns to storage next.
    pub next_station: &'a [Option<usize>],
    /// Per station (0-based): accumulated scheduled duration.
    pub station_load: &'a [f64],
}

/// Rule selecting among candidates competing for one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProductionRule {
    /// Minimum operation duration (SPT).
    #[default]
    ShortestOperation,
    /// Maximum operation duration (LPT).
    LongestOperation,
    /// Minimum remaining work for the candidate's workpiece (LWKR).
    MinRemainingWork,
    /// Maximum remaining work for the candidate's workpiece (MWKR).
    MaxRemainingWork,
    /// Candidate whose next station carries the lowest accumulated load;
    /// candidates heading back to storage are skipped from the comparison.
    BalancedLoad,
}

impl ProductionRule {
    /// Rule name.
    pub fn name(&self) -> &'static str {
        match self {
            ProductionRule::ShortestOperation => "ShortestOperation",
            ProductionRule::LongestOperation => "LongestOperation",
            ProductionRule::MinRemainingWork => "MinRemainingWork",
            ProductionRule::MaxRemainingWork => "MaxRemainingWork",
            ProductionRule::BalancedLoad => "BalancedLoad",
        }
    }

    /// Selects one candidate index from a non-empty queue.
    ///
    /// Ties keep the earliest candidate; an all-skipped `BalancedLoad`
    /// comparison falls back to the first.
    pub fn select(&self, candidates: &[Candidate], context: &DispatchContext<'_>) -> usize {
        debug_assert!(!candidates.is_empty());
        if candidates.len() == 1 {
            return 0;
        }

        match self {
            ProductionRule::ShortestOperation => {
                let mut best = 0;
                for (i, c) in candidates.iter().enumerate().skip(1) {
                    if c.duration < candidates[best].duration {
                        best = i;
                    }
                }
                best
            }
            ProductionRule::LongestOperation => {
                let mut best = 0;
                for (i, c) in candidates.iter().enumerate().skip(1) {
                    if c.duration > candidates[best].duration {
                        best = i;
                    }
                }
                best
            }
            ProductionRule::MinRemainingWork => {
                let mut best = 0;
                let mut best_remaining = f64::MAX;
                for (i, c) in candidates.iter().enumerate() {
                    let remaining = context.remaining_work[c.workpiece];
                    if remaining < best_remaining {
                        best_remaining = remaining;
                        best = i;
                    }
                }
                best
            }
            ProductionRule::MaxRemainingWork => {
                let mut best = 0;
                let mut best_remaining = 0.0;
                for (i, c) in candidates.iter().enumerate() {
                    let remaining = context.remaining_work[c.workpiece];
                    if remaining > best_remaining {
                        best_remaining = remaining;
                        best = i;
                    }
                }
                best
            }
            ProductionRule::BalancedLoad => {
                let mut best = 0;
                let mut best_load = f64::MAX;
                for (i, c) in candidates.iter().enumerate() {
                    if let Some(next) = context.next_station[c.workpiece] {
                        let load = context.station_load[next - 1];
                        if load < best_load {
                            best_load = load;
                            best = i;
                        }
                    }
                }
                best
            }
        }
    }
}

/// Per-unit state a transport rule evaluates against.
#[derive(Debug, Clone, Copy)]
pub struct TransportContext<'a> {
    /// Per unit: whether it is currently free.
    pub free: &'a [bool],
    /// Per unit: accumulated scheduled transport duration.
    pub load: &'a [f64],
    /// Per unit: distance from its last visited point to the candidate's
    /// pickup point.
    pub distance_to_pickup: &'a [f64],
}

/// Rule selecting which transport unit serves a queued candidate.
///
/// Structurally parallel to [`ProductionRule`], but the Extended-mode
/// dispatch step does not consult it: transport assignment always takes the
/// first queued candidate for the first free unit. The selector is kept
/// pluggable for callers that order units themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportRule {
    /// Unit with the highest accumulated transport load.
    #[default]
    MaximizeLoad,
    /// Unit with the lowest accumulated transport load.
    MinimizeLoad,
    /// Unit closest to the candidate's pickup point.
    NearestTransport,
}

impl TransportRule {
    /// Rule name.
    pub fn name(&self) -> &'static str {
        match self {
            TransportRule::MaximizeLoad => "MaximizeLoad",
            TransportRule::MinimizeLoad => "MinimizeLoad",
            TransportRule::NearestTransport => "NearestTransport",
        }
    }

    /// Selects a transport unit index among the free units.
    ///
    /// Falls back to unit 0 when no unit is free; ties keep the
    /// lowest-indexed unit.
    pub fn select_unit(&self, context: &TransportContext<'_>) -> usize {
        match self {
            TransportRule::MinimizeLoad => {
                let mut best = 0;
                let mut best_load = f64::MAX;
                for (u, &free) in context.free.iter().enumerate() {
                    if free && context.load[u] < best_load {
                        best_load = context.load[u];
                        best = u;
                    }
                }
                best
            }
            TransportRule::MaximizeLoad => {
                let mut best = 0;
                let mut best_load = -1.0;
                for (u, &free) in context.free.iter().enumerate() {
                    if free && context.load[u] > best_load {
                        best_load = context.load[u];
                        best = u;
                    }
                }
                best
            }
            TransportRule::NearestTransport => {
                let mut best = 0;
                let mut best_distance = f64::MAX;
                for (u, &free) in context.free.iter().enumerate() {
                    if free && context.distance_to_pickup[u] < best_distance {
                        best_distance = context.distance_to_pickup[u];
                        best = u;
                    }
                }
                best
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(workpiece: usize, duration: f64) -> Candidate {
        Candidate {
            workpiece,
            step: 0,
            duration,
            label: String::new(),
            route: None,
        }
    }

    fn context<'a>(
        remaining: &'a [f64],
        next: &'a [Option<usize>],
        load: &'a [f64],
    ) -> DispatchContext<'a> {
        DispatchContext {
            remaining_work: remaining,
            next_station: next,
            station_load: load,
        }
    }

    #[test]
    fn test_shortest_operation() {
        let queue = vec![candidate(0, 5.0), candidate(1, 3.0), candidate(2, 8.0)];
        let ctx = context(&[], &[], &[]);
        assert_eq!(ProductionRule::ShortestOperation.select(&queue, &ctx), 1);
    }

    #[test]
    fn test_longest_operation() {
        let queue = vec![candidate(0, 5.0), candidate(1, 3.0), candidate(2, 8.0)];
        let ctx = context(&[], &[], &[]);
        assert_eq!(ProductionRule::LongestOperation.select(&queue, &ctx), 2);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let queue = vec![candidate(0, 4.0), candidate(1, 4.0), candidate(2, 4.0)];
        let ctx = context(&[6.0, 6.0, 6.0], &[], &[]);
        assert_eq!(ProductionRule::ShortestOperation.select(&queue, &ctx), 0);
        assert_eq!(ProductionRule::LongestOperation.select(&queue, &ctx), 0);
        assert_eq!(ProductionRule::MinRemainingWork.select(&queue, &ctx), 0);
        assert_eq!(ProductionRule::MaxRemainingWork.select(&queue, &ctx), 0);
    }

    #[test]
    fn test_min_remaining_work() {
        let queue = vec![candidate(0, 4.0), candidate(1, 4.0)];
        let ctx = context(&[10.0, 7.0], &[], &[]);
        assert_eq!(ProductionRule::MinRemainingWork.select(&queue, &ctx), 1);
    }

    #[test]
    fn test_max_remaining_work() {
        let queue = vec![candidate(0, 4.0), candidate(1, 4.0)];
        let ctx = context(&[10.0, 7.0], &[], &[]);
        assert_eq!(ProductionRule::MaxRemainingWork.select(&queue, &ctx), 0);
    }

    #[test]
    fn test_balanced_load_prefers_lighter_next_station() {
        let queue = vec![candidate(0, 4.0), candidate(1, 4.0)];
        // Workpiece 0 heads to station 1 (load 9), workpiece 1 to station 2 (load 2).
        let next = [Some(1), Some(2)];
        let load = [9.0, 2.0];
        let ctx = context(&[], &next, &load);
        assert_eq!(ProductionRule::BalancedLoad.select(&queue, &ctx), 1);
    }

    #[test]
    fn test_balanced_load_skips_storage_bound_candidates() {
        let queue = vec![candidate(0, 4.0), candidate(1, 4.0)];
        // Workpiece 0 has no further operation; workpiece 1 heads to station 1.
        let next = [None, Some(1)];
        let load = [50.0];
        let ctx = context(&[], &next, &load);
        assert_eq!(ProductionRule::BalancedLoad.select(&queue, &ctx), 1);
    }

    #[test]
    fn test_balanced_load_all_skipped_falls_back_to_first() {
        let queue = vec![candidate(0, 4.0), candidate(1, 4.0)];
        let next = [None, None];
        let ctx = context(&[], &next, &[]);
        assert_eq!(ProductionRule::BalancedLoad.select(&queue, &ctx), 0);
    }

    #[test]
    fn test_single_candidate_short_circuits() {
        let queue = vec![candidate(3, 4.0)];
        let ctx = context(&[], &[], &[]);
        assert_eq!(ProductionRule::BalancedLoad.select(&queue, &ctx), 0);
    }

    #[test]
    fn test_transport_minimize_load() {
        let ctx = TransportContext {
            free: &[true, true, false],
            load: &[5.0, 2.0, 0.0],
            distance_to_pickup: &[0.0, 0.0, 0.0],
        };
        assert_eq!(TransportRule::MinimizeLoad.select_unit(&ctx), 1);
    }

    #[test]
    fn test_transport_maximize_load() {
        let ctx = TransportContext {
            free: &[true, true, true],
            load: &[5.0, 9.0, 2.0],
            distance_to_pickup: &[0.0, 0.0, 0.0],
        };
        assert_eq!(TransportRule::MaximizeLoad.select_unit(&ctx), 1);
    }

    #[test]
    fn test_transport_nearest() {
        let ctx = TransportContext {
            free: &[true, false, true],
            load: &[0.0, 0.0, 0.0],
            distance_to_pickup: &[6.0, 1.0, 3.0],
        };
        // Unit 1 is closest but busy.
        assert_eq!(TransportRule::NearestTransport.select_unit(&ctx), 2);
    }

    #[test]
    fn test_transport_no_free_unit_falls_back_to_first() {
        let ctx = TransportContext {
            free: &[false, false],
            load: &[0.0, 0.0],
            distance_to_pickup: &[0.0, 0.0],
        };
        assert_eq!(TransportRule::MaximizeLoad.select_unit(&ctx), 0);
        assert_eq!(TransportRule::MinimizeLoad.select_unit(&ctx), 0);
        assert_eq!(TransportRule::NearestTransport.select_unit(&ctx), 0);
    }
}
