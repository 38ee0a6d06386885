//! Network construction from a computed schedule.
//!
//! A single deterministic pass:
//!
//! 1. One transition per interval, in resource-then-time order.
//! 2. Workpiece-location position chains, cached by
//!    `(workpiece, station, step, slot)` so every later reference reuses
//!    the same arena entry.
//! 3. Ready rings and arc wiring per resource, including exclusion arcs
//!    derived from buffer capacities.
//! 4. The referenced-position set, in first-seen order.
//!
//! Synthesis is best-effort: a missing location key drops that single arc
//! rather than failing the network. Callers validating the result can
//! treat a transition with no consumed workpiece position as the sign of a
//! malformed schedule.

use std::collections::{HashMap, HashSet};

use super::{Position, PositionId, PositionKind, ResourceNetwork, Slot, Transition};
use crate::models::{PlanStep, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LocationKey {
    workpiece: usize,
    station: usize,
    step: usize,
    slot: Slot,
}

/// Position arena plus the location lookup cache.
struct Synthesizer {
    arena: Vec<Position>,
    cache: HashMap<LocationKey, PositionId>,
}

impl Synthesizer {
    fn push(&mut self, position: Position) -> PositionId {
        let id = self.arena.len();
        self.arena.push(position);
        id
    }

    /// Returns the cached position for a key, creating it on first use.
    fn intern_location(&mut self, key: LocationKey, name: String, label: String) -> PositionId {
        if let Some(&id) = self.cache.get(&key) {
            return id;
        }
        let id = self.push(Position {
            name,
            label,
            kind: PositionKind::Location {
                workpiece: key.workpiece,
                station: key.station,
                step: key.step,
                slot: key.slot,
            },
        });
        self.cache.insert(key, id);
        id
    }

    fn location(
        &self,
        workpiece: usize,
        station: usize,
        step: usize,
        slot: Slot,
    ) -> Option<PositionId> {
        self.cache
            .get(&LocationKey {
                workpiece,
                station,
                step,
                slot,
            })
            .copied()
    }
}

fn point_name(point: usize) -> String {
    if point == 0 {
        "storage".to_string()
    } else {
        format!("station {point}")
    }
}

/// Synthesizes the place/transition network for a computed schedule.
///
/// The schedule must have completed a scheduler run (`is_calculated`);
/// synthesizing a partially built schedule yields a correspondingly
/// partial network. The schedule is never mutated, and re-synthesizing
/// the same schedule yields a structurally identical network.
pub fn synthesize_network(schedule: &Schedule) -> ResourceNetwork<'_> {
    let stations = schedule.plan.station_count;
    let resources = schedule.resource_count();
    let mut synth = Synthesizer {
        arena: Vec::new(),
        cache: HashMap::new(),
    };

    // 1. Transitions, in resource-then-time order.
    let mut transitions: Vec<Transition> = Vec::with_capacity(schedule.interval_count());
    let mut resource_transitions: Vec<Vec<usize>> = vec![Vec::new(); resources];
    for (r, timeline) in schedule.timelines.iter().enumerate() {
        for interval in timeline {
            resource_transitions[r].push(transitions.len());
            transitions.push(Transition {
                name: format!("T{}", transitions.len() + 1),
                label: interval.label.clone(),
                resource: r,
                workpiece: interval.workpiece,
                step: interval.step,
                route: interval.route,
                inputs: Vec::new(),
                outputs: Vec::new(),
                exclusions: Vec::new(),
            });
        }
    }

    // 2. Workpiece-location chains.
    let mut location_positions: Vec<Vec<PositionId>> =
        vec![Vec::new(); schedule.plan.workpiece_count];
    for w in 0..schedule.plan.workpiece_count {
        let mut seq = 1;
        let next_name = |seq: &mut usize| {
            let name = format!("W{}_{}", w + 1, *seq);
            *seq += 1;
            name
        };

        let initial = synth.intern_location(
            LocationKey {
                workpiece: w,
                station: 0,
                step: 0,
                slot: Slot::Exit,
            },
            next_name(&mut seq),
            format!("Workpiece {} at storage awaiting processing", w + 1),
        );
        location_positions[w].push(initial);

        for op in &schedule.plans[w] {
            let PlanStep::Process { station, step, .. } = op else {
                continue;
            };
            let shared = schedule.plan.buffer_capacity_of(*station) == 1;
            let entry = synth.intern_location(
                LocationKey {
                    workpiece: w,
                    station: *station,
                    step: *step,
                    slot: Slot::Entry,
                },
                next_name(&mut seq),
                format!(
                    "Workpiece {} in the {} of station {} (before step {})",
                    w + 1,
                    if shared { "buffer" } else { "entry buffer" },
                    station,
                    step + 1
                ),
            );
            location_positions[w].push(entry);

            let exit = synth.intern_location(
                LocationKey {
                    workpiece: w,
                    station: *station,
                    step: *step,
                    slot: Slot::Exit,
                },
                next_name(&mut seq),
                format!(
                    "Workpiece {} in the {} of station {} (after step {})",
                    w + 1,
                    if shared { "buffer" } else { "exit buffer" },
                    station,
                    step + 1
                ),
            );
            location_positions[w].push(exit);
        }

        // For a workpiece without operations this key collides with the
        // initial position and is reused, not recreated.
        let fin = synth.intern_location(
            LocationKey {
                workpiece: w,
                station: 0,
                step: schedule.plans[w].len(),
                slot: Slot::Exit,
            },
            next_name(&mut seq),
            format!("Workpiece {} at storage after processing", w + 1),
        );
        location_positions[w].push(fin);
    }

    // 3a. Station-ready rings and production arc wiring.
    let mut ready_positions: Vec<Vec<PositionId>> = vec![Vec::new(); resources];
    for st in 0..stations {
        let timeline = schedule.intervals_for_resource(st);
        for (i, interval) in timeline.iter().enumerate() {
            let id = synth.push(Position {
                name: format!("S{}_{}", st + 1, i + 1),
                label: format!(
                    "Station {} ready to process workpiece {} (step {})",
                    st + 1,
                    interval.workpiece + 1,
                    interval.step + 1
                ),
                kind: PositionKind::StationReady {
                    station: st + 1,
                    cycle: i,
                },
            });
            ready_positions[st].push(id);
        }

        let station = st + 1;
        let capacity = schedule.plan.buffer_capacity_of(station);
        let ring_len = timeline.len();
        for i in 0..ring_len {
            let t = resource_transitions[st][i];
            let interval = &timeline[i];

            transitions[t].inputs.push(ready_positions[st][i]);

            // Exclusion guards on the previous ring occupant's buffers;
            // the first transition wraps to the last occupant when the
            // station has a single shared slot.
            match capacity {
                2 if i > 0 => {
                    let prev = &timeline[i - 1];
                    if let Some(p) = synth.location(prev.workpiece, station, prev.step, Slot::Exit)
                    {
                        transitions[t].exclusions.push(p);
                    }
                }
                1 if i > 0 => {
                    let prev = &timeline[i - 1];
                    for slot in [Slot::Entry, Slot::Exit] {
                        if let Some(p) = synth.location(prev.workpiece, station, prev.step, slot) {
                            transitions[t].exclusions.push(p);
                        }
                    }
                }
                1 if ring_len > 1 => {
                    let prev = &timeline[ring_len - 1];
                    for slot in [Slot::Entry, Slot::Exit] {
                        if let Some(p) = synth.location(prev.workpiece, station, prev.step, slot) {
                            transitions[t].exclusions.push(p);
                        }
                    }
                }
                _ => {}
            }

            if let Some(p) = synth.location(interval.workpiece, station, interval.step, Slot::Entry)
            {
                transitions[t].inputs.push(p);
            }
            if let Some(p) = synth.location(interval.workpiece, station, interval.step, Slot::Exit)
            {
                transitions[t].outputs.push(p);
            }
            transitions[t]
                .outputs
                .push(ready_positions[st][(i + 1) % ring_len]);
        }
    }

    // 3b. Transport-ready rings and transport arc wiring.
    for u in 0..schedule.plan.transport_count {
        let r = stations + u;
        let timeline = schedule.intervals_for_resource(r);
        for (i, interval) in timeline.iter().enumerate() {
            let (from, to) = interval.route.map(|rt| (rt.from, rt.to)).unwrap_or((0, 0));
            let id = synth.push(Position {
                name: format!("V{}_{}", u + 1, i + 1),
                label: format!(
                    "Transporter {} ready to move workpiece {} from {} to {}",
                    u + 1,
                    interval.workpiece + 1,
                    point_name(from),
                    point_name(to)
                ),
                kind: PositionKind::TransportReady { unit: u, cycle: i },
            });
            ready_positions[r].push(id);
        }

        let ring_len = timeline.len();
        for i in 0..ring_len {
            let t = resource_transitions[r][i];
            let interval = &timeline[i];

            transitions[t].inputs.push(ready_positions[r][i]);

            if let Some(route) = interval.route {
                // Pickup: storage-initial, or the exit buffer left by the
                // workpiece's previous operation.
                let pickup = if route.from == 0 {
                    synth.location(interval.workpiece, 0, 0, Slot::Exit)
                } else {
                    interval.step.checked_sub(1).and_then(|prev_step| {
                        synth.location(interval.workpiece, route.from, prev_step, Slot::Exit)
                    })
                };
                if let Some(p) = pickup {
                    transitions[t].inputs.push(p);
                }

                // Drop-off: destination entry buffer, or storage-final.
                let dropoff = if route.to == 0 {
                    synth.location(
                        interval.workpiece,
                        0,
                        schedule.plans[interval.workpiece].len(),
                        Slot::Exit,
                    )
                } else {
                    synth.location(interval.workpiece, route.to, interval.step, Slot::Entry)
                };
                if let Some(p) = dropoff {
                    transitions[t].outputs.push(p);
                }
            }

            transitions[t]
                .outputs
                .push(ready_positions[r][(i + 1) % ring_len]);
        }
    }

    // 4. Referenced positions, first-seen order.
    let mut seen = HashSet::new();
    let mut positions = Vec::new();
    for transition in &transitions {
        for &p in transition
            .inputs
            .iter()
            .chain(&transition.outputs)
            .chain(&transition.exclusions)
        {
            if seen.insert(p) {
                positions.push(p);
            }
        }
    }

    ResourceNetwork {
        schedule,
        arena: synth.arena,
        transitions,
        resource_transitions,
        ready_positions,
        location_positions,
        positions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::{ProductionRule, TransportRule};
    use crate::models::{Interval, PlanData, Route, ScheduleMode};
    use crate::scheduler::compute_schedule;

    fn two_on_one_station(capacity: u8) -> Schedule {
        let plan = PlanData::new(2, 1, 1, 0)
            .with_buffer_capacity(1, capacity)
            .with_operation(0, 0, 1, 5.0)
            .with_operation(1, 0, 1, 3.0);
        compute_schedule(
            &plan,
            ProductionRule::ShortestOperation,
            TransportRule::default(),
            ScheduleMode::Standard,
        )
    }

    fn extended_single_workpiece(capacity: u8) -> Schedule {
        let plan = PlanData::new(1, 1, 1, 1)
            .with_buffer_capacity(1, capacity)
            .with_operation(0, 0, 1, 10.0)
            .with_distance(0, 1, 2.0)
            .with_distance(1, 0, 3.0);
        compute_schedule(
            &plan,
            ProductionRule::ShortestOperation,
            TransportRule::default(),
            ScheduleMode::Extended,
        )
    }

    #[test]
    fn test_single_interval_has_no_exclusion_arc() {
        // Capacity-1 station, one production interval: no prior occupant,
        // so the production transition carries no exclusion arc.
        let schedule = extended_single_workpiece(1);
        let network = synthesize_network(&schedule);

        let production = network
            .transitions
            .iter()
            .find(|t| t.resource == 0)
            .unwrap();
        assert!(production.exclusions.is_empty());
    }

    #[test]
    fn test_capacity_two_excludes_previous_exit() {
        let schedule = two_on_one_station(2);
        let network = synthesize_network(&schedule);

        // First scheduled (workpiece 1, duration 3) fires unguarded.
        let first = &network.transitions[0];
        assert!(first.exclusions.is_empty());

        // Second is guarded by the previous occupant's exit buffer.
        let second = &network.transitions[1];
        assert_eq!(second.exclusions.len(), 1);
        assert_eq!(
            network.position(second.exclusions[0]).kind,
            PositionKind::Location {
                workpiece: 1,
                station: 1,
                step: 0,
                slot: Slot::Exit,
            }
        );
    }

    #[test]
    fn test_capacity_one_excludes_entry_and_exit_with_wraparound() {
        let schedule = two_on_one_station(1);
        let network = synthesize_network(&schedule);

        // The first transition wraps to the ring's last occupant.
        let first = &network.transitions[0];
        assert_eq!(first.exclusions.len(), 2);
        let kinds: Vec<_> = first
            .exclusions
            .iter()
            .map(|&p| network.position(p).kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                PositionKind::Location {
                    workpiece: 0,
                    station: 1,
                    step: 0,
                    slot: Slot::Entry,
                },
                PositionKind::Location {
                    workpiece: 0,
                    station: 1,
                    step: 0,
                    slot: Slot::Exit,
                },
            ]
        );

        // The second is guarded by both slots of the first occupant.
        let second = &network.transitions[1];
        assert_eq!(second.exclusions.len(), 2);
        assert!(second.exclusions.iter().all(|&p| matches!(
            network.position(p).kind,
            PositionKind::Location { workpiece: 1, .. }
        )));
    }

    #[test]
    fn test_ready_ring_is_cyclic() {
        let schedule = two_on_one_station(2);
        let network = synthesize_network(&schedule);

        let ring = &network.ready_positions[0];
        assert_eq!(ring.len(), 2);
        assert_eq!(network.transitions[0].inputs[0], ring[0]);
        assert!(network.transitions[0].outputs.contains(&ring[1]));
        assert_eq!(network.transitions[1].inputs[0], ring[1]);
        // Last use of the ring produces ready-position 0 again.
        assert!(network.transitions[1].outputs.contains(&ring[0]));
    }

    #[test]
    fn test_single_interval_ring_self_loop() {
        let plan = PlanData::new(1, 1, 1, 0).with_operation(0, 0, 1, 4.0);
        let schedule = compute_schedule(
            &plan,
            ProductionRule::ShortestOperation,
            TransportRule::default(),
            ScheduleMode::Standard,
        );
        let network = synthesize_network(&schedule);

        let ring = &network.ready_positions[0];
        assert_eq!(ring.len(), 1);
        assert_eq!(network.transitions[0].inputs[0], ring[0]);
        assert!(network.transitions[0].outputs.contains(&ring[0]));
    }

    #[test]
    fn test_transport_wiring_shares_buffer_positions() {
        let schedule = extended_single_workpiece(2);
        let network = synthesize_network(&schedule);

        // Resource order: station 0 first, then the unit's two legs.
        let production = &network.transitions[0];
        let leg_in = &network.transitions[1];
        let leg_out = &network.transitions[2];
        assert_eq!(leg_in.route, Some(Route { from: 0, to: 1 }));
        assert_eq!(leg_out.route, Some(Route { from: 1, to: 0 }));

        // Leg in: consumes the storage-initial position, produces the
        // entry buffer the production transition consumes.
        let initial = network.location_positions[0][0];
        assert!(leg_in.inputs.contains(&initial));
        let entry = production.inputs[1];
        assert!(leg_in.outputs.contains(&entry));
        assert_eq!(
            network.position(entry).kind,
            PositionKind::Location {
                workpiece: 0,
                station: 1,
                step: 0,
                slot: Slot::Entry,
            }
        );

        // Leg out: consumes the exit buffer the production transition
        // produced, delivers to the storage-final position.
        let exit = production.outputs[0];
        assert!(leg_out.inputs.contains(&exit));
        let fin = *network.location_positions[0].last().unwrap();
        assert!(leg_out.outputs.contains(&fin));
        assert_eq!(
            network.position(fin).kind,
            PositionKind::Location {
                workpiece: 0,
                station: 0,
                step: 1,
                slot: Slot::Exit,
            }
        );
    }

    #[test]
    fn test_positions_deduplicated_by_key() {
        let schedule = extended_single_workpiece(2);
        let network = synthesize_network(&schedule);

        // initial, entry, exit, final + S1_1 + V1_1, V1_2.
        assert_eq!(network.arena.len(), 7);
        assert_eq!(network.position_count(), 7);

        // No two location positions share a key.
        let mut keys = HashSet::new();
        for p in &network.arena {
            if let PositionKind::Location { .. } = p.kind {
                assert!(keys.insert(p.kind));
            }
        }
    }

    #[test]
    fn test_resynthesis_is_idempotent() {
        let plan = PlanData::new(2, 2, 2, 1)
            .with_operation(0, 0, 1, 4.0)
            .with_operation(0, 1, 2, 3.0)
            .with_operation(1, 0, 1, 2.0)
            .with_distance(0, 1, 2.0)
            .with_distance(1, 2, 1.0)
            .with_distance(1, 0, 2.0)
            .with_distance(2, 0, 5.0);
        let schedule = compute_schedule(
            &plan,
            ProductionRule::ShortestOperation,
            TransportRule::default(),
            ScheduleMode::Extended,
        );

        let a = synthesize_network(&schedule);
        let b = synthesize_network(&schedule);
        assert_eq!(a, b);
    }

    #[test]
    fn test_transition_names_follow_resource_then_time_order() {
        let schedule = two_on_one_station(2);
        let network = synthesize_network(&schedule);

        assert_eq!(network.transition_count(), 2);
        assert_eq!(network.transitions[0].name, "T1");
        assert_eq!(network.transitions[1].name, "T2");
        assert_eq!(network.resource_transitions[0], vec![0, 1]);
        // Chronological within the resource.
        assert_eq!(network.transitions[0].workpiece, 1);
        assert_eq!(network.transitions[1].workpiece, 0);
    }

    #[test]
    fn test_first_seen_position_order() {
        let schedule = two_on_one_station(2);
        let network = synthesize_network(&schedule);

        // The first referenced position is T1's ready input.
        assert_eq!(network.positions[0], network.transitions[0].inputs[0]);
        // Every referenced position appears exactly once.
        let unique: HashSet<_> = network.positions.iter().collect();
        assert_eq!(unique.len(), network.positions.len());
    }

    #[test]
    fn test_lookup_miss_drops_arc_silently() {
        // An interval whose (workpiece, step) has no plan image: the
        // entry/exit arcs vanish, the ring arcs survive, nothing fails.
        let plan = PlanData::new(1, 1, 1, 0);
        let mut schedule = crate::models::Schedule::new(
            plan,
            ScheduleMode::Standard,
            ProductionRule::default(),
            TransportRule::default(),
        );
        schedule.timelines[0].push(Interval {
            workpiece: 0,
            step: 4,
            start: 0.0,
            end: 1.0,
            label: "orphan".into(),
            route: None,
        });
        schedule.cycle_time = 1.0;
        schedule.is_calculated = true;

        let network = synthesize_network(&schedule);
        let t = &network.transitions[0];
        assert_eq!(t.inputs.len(), 1); // ready position only
        assert_eq!(t.outputs.len(), 1);
        assert!(t.exclusions.is_empty());
    }

    #[test]
    fn test_zero_operation_workpiece_collapses_storage_positions() {
        let plan = PlanData::new(1, 1, 1, 0);
        let schedule = compute_schedule(
            &plan,
            ProductionRule::ShortestOperation,
            TransportRule::default(),
            ScheduleMode::Standard,
        );
        let network = synthesize_network(&schedule);

        // Initial and final share the `(w, 0, 0, Exit)` key → one position.
        assert_eq!(network.location_positions[0].len(), 2);
        assert_eq!(
            network.location_positions[0][0],
            network.location_positions[0][1]
        );
        // Nothing references it: no transitions at all.
        assert_eq!(network.transition_count(), 0);
        assert_eq!(network.position_count(), 0);
    }
}
