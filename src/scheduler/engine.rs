//! The discrete-event simulation engine.
//!
//! # Event Loop
//!
//! 1. **Collect**: every free workpiece with a pending operation registers
//!    a candidate at its target resource, provided that resource is free.
//!    Transport candidates are replicated once per free transport unit.
//! 2. **Dispatch**: each station with candidates commits exactly one via
//!    the production rule; transport commits at most one assignment per
//!    event — the first free unit takes its first queued candidate, which
//!    is then purged from every other unit's queue.
//! 3. **Advance**: the clock jumps to the earliest completion among busy
//!    resources; no busy resource means the run is complete.
//! 4. **Release**: resources finishing at the new clock free themselves and
//!    their workpieces; a workpiece whose cursor reached the end of its
//!    plan is left permanently inactive instead.
//!
//! Buffer capacities are deliberately not checked here; they surface as
//! exclusion arcs during network synthesis (see `crate::network`).

use crate::dispatching::{Candidate, DispatchContext, ProductionRule, TransportRule};
use crate::models::{Interval, PlanData, PlanStep, Route, Schedule, ScheduleMode};

/// Two completion times closer than this are the same event.
const TIME_EPSILON: f64 = 1e-9;

/// Scheduler configuration, in builder form.
///
/// # Example
///
/// ```
/// use fms_schedule::models::PlanData;
/// use fms_schedule::scheduler::Scheduler;
///
/// let plan = PlanData::new(1, 1, 1, 0).with_operation(0, 0, 1, 10.0);
/// let schedule = Scheduler::new().schedule(&plan);
/// assert_eq!(schedule.interval_count(), 1);
/// assert!((schedule.cycle_time - 10.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    production_rule: ProductionRule,
    transport_rule: TransportRule,
    mode: ScheduleMode,
}

impl Scheduler {
    /// Creates a Standard-mode scheduler with default rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the production dispatch rule.
    pub fn with_production_rule(mut self, rule: ProductionRule) -> Self {
        self.production_rule = rule;
        self
    }

    /// Sets the transport dispatch rule (recorded on the schedule; see
    /// [`TransportRule`] for why dispatch does not consult it).
    pub fn with_transport_rule(mut self, rule: TransportRule) -> Self {
        self.transport_rule = rule;
        self
    }

    /// Sets the schedule mode.
    pub fn with_mode(mut self, mode: ScheduleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Computes a schedule for the given plan.
    pub fn schedule(&self, plan: &PlanData) -> Schedule {
        compute_schedule(plan, self.production_rule, self.transport_rule, self.mode)
    }
}

/// Computes a schedule for a validated plan.
///
/// The algorithm itself cannot fail: degenerate plans (workpieces without
/// operations, ≤ 0 station sentinels) simply contribute nothing, and a run
/// with no dispatchable work terminates immediately with an empty timeline.
pub fn compute_schedule(
    plan: &PlanData,
    production_rule: ProductionRule,
    transport_rule: TransportRule,
    mode: ScheduleMode,
) -> Schedule {
    let mut schedule = Schedule::new(plan.clone(), mode, production_rule, transport_rule);
    build_plans(&mut schedule);
    if mode == ScheduleMode::Extended {
        build_extended_plans(&mut schedule);
    }

    let mut state = SimulationState::new(&schedule);
    match mode {
        ScheduleMode::Standard => loop {
            collect_standard(&schedule, &mut state);
            dispatch_stations(&mut schedule, &mut state, false);
            if !advance_clock(&schedule, &mut state, false) {
                break;
            }
        },
        ScheduleMode::Extended => loop {
            collect_extended(&schedule, &mut state);
            dispatch_stations(&mut schedule, &mut state, true);
            dispatch_transport(&mut schedule, &mut state);
            if !advance_clock(&schedule, &mut state, true) {
                break;
            }
        },
    }

    schedule.cycle_time = state.clock;
    schedule.is_calculated = true;
    schedule
}

/// All mutable run state, owned by one run and passed by exclusive
/// reference into each step — nothing survives into another run.
#[derive(Debug)]
struct SimulationState {
    clock: f64,
    /// Per resource (stations, then transport units).
    resource_free: Vec<bool>,
    workpiece_free: Vec<bool>,
    /// Next unscheduled index into each workpiece's standard plan.
    cursor: Vec<usize>,
    /// Next unscheduled index into each workpiece's extended plan.
    cursor_ext: Vec<usize>,
    /// Candidate queues, one per resource.
    queues: Vec<Vec<Candidate>>,
}

impl SimulationState {
    fn new(schedule: &Schedule) -> Self {
        Self {
            clock: 0.0,
            resource_free: vec![true; schedule.resource_count()],
            workpiece_free: vec![true; schedule.plan.workpiece_count],
            cursor: vec![0; schedule.plan.workpiece_count],
            cursor_ext: vec![0; schedule.plan.workpiece_count],
            queues: vec![Vec::new(); schedule.resource_count()],
        }
    }
}

/// Builds each workpiece's operation plan, stopping at the first step whose
/// station is ≤ 0.
fn build_plans(schedule: &mut Schedule) {
    for w in 0..schedule.plan.workpiece_count {
        let mut steps = Vec::new();
        for k in 0..schedule.plan.step_count {
            let station = schedule.plan.operation_station[w][k];
            if station <= 0 {
                break;
            }
            let station = station as usize;
            steps.push(PlanStep::Process {
                station,
                step: k,
                duration: schedule.plan.operation_time[w][k],
                label: format!(
                    "Station {} processes workpiece {} (step {})",
                    station,
                    w + 1,
                    k + 1
                ),
            });
        }
        schedule.plans[w] = steps;
    }
}

fn transfer_label(workpiece: usize, from: usize, to: usize) -> String {
    let describe = |p: usize| {
        if p == 0 {
            "storage".to_string()
        } else {
            format!("station {p}")
        }
    };
    format!(
        "Transporter moves workpiece {} from {} to {}",
        workpiece + 1,
        describe(from),
        describe(to)
    )
}

/// Builds extended plans: a transport leg before every operation (the first
/// from storage) and a final leg from the last station back to storage.
fn build_extended_plans(schedule: &mut Schedule) {
    for w in 0..schedule.plan.workpiece_count {
        let base = &schedule.plans[w];
        let mut extended = Vec::with_capacity(base.len() * 2 + 1);

        for (k, op) in base.iter().enumerate() {
            let PlanStep::Process { station, step, .. } = op else {
                continue;
            };
            let from = match k.checked_sub(1).map(|p| &base[p]) {
                Some(PlanStep::Process { station, .. }) => *station,
                _ => 0,
            };
            extended.push(PlanStep::Transfer {
                step: *step,
                from,
                to: *station,
                duration: schedule.plan.travel_time[from][*station],
                label: transfer_label(w, from, *station),
            });
            extended.push(op.clone());
        }

        if let Some(PlanStep::Process { station, step, .. }) = base.last() {
            extended.push(PlanStep::Transfer {
                step: step + 1,
                from: *station,
                to: 0,
                duration: schedule.plan.travel_time[*station][0],
                label: transfer_label(w, *station, 0),
            });
        }

        schedule.extended_plans[w] = extended;
    }
}

/// Registers a candidate at each free station whose next workpiece
/// operation targets it (Standard mode).
fn collect_standard(schedule: &Schedule, state: &mut SimulationState) {
    for queue in &mut state.queues {
        queue.clear();
    }
    for w in 0..schedule.plan.workpiece_count {
        if !state.workpiece_free[w] {
            continue;
        }
        let Some(PlanStep::Process {
            station,
            step,
            duration,
            label,
        }) = schedule.plans[w].get(state.cursor[w])
        else {
            continue;
        };
        let resource = station - 1;
        if state.resource_free[resource] {
            state.queues[resource].push(Candidate {
                workpiece: w,
                step: *step,
                duration: *duration,
                label: label.clone(),
                route: None,
            });
        }
    }
}

/// Registers candidates from the extended plans: production candidates at
/// free stations, transport candidates replicated to every free unit.
fn collect_extended(schedule: &Schedule, state: &mut SimulationState) {
    for queue in &mut state.queues {
        queue.clear();
    }
    let stations = schedule.plan.station_count;
    for w in 0..schedule.plan.workpiece_count {
        if !state.workpiece_free[w] {
            continue;
        }
        match schedule.extended_plans[w].get(state.cursor_ext[w]) {
            Some(PlanStep::Process {
                station,
                step,
                duration,
                label,
            }) => {
                let resource = station - 1;
                if state.resource_free[resource] {
                    state.queues[resource].push(Candidate {
                        workpiece: w,
                        step: *step,
                        duration: *duration,
                        label: label.clone(),
                        route: None,
                    });
                }
            }
            Some(PlanStep::Transfer {
                step,
                from,
                to,
                duration,
                label,
            }) => {
                for u in 0..schedule.plan.transport_count {
                    if state.resource_free[stations + u] {
                        state.queues[stations + u].push(Candidate {
                            workpiece: w,
                            step: *step,
                            duration: *duration,
                            label: label.replacen(
                                "Transporter",
                                &format!("Transporter {}", u + 1),
                                1,
                            ),
                            route: Some(Route {
                                from: *from,
                                to: *to,
                            }),
                        });
                    }
                }
            }
            None => {}
        }
    }
}

/// Snapshot of the per-workpiece and per-station figures the production
/// rules compare. Rebuilt before each station's dispatch so earlier
/// dispatches in the same round are visible.
fn dispatch_data(
    schedule: &Schedule,
    state: &SimulationState,
) -> (Vec<f64>, Vec<Option<usize>>, Vec<f64>) {
    let remaining: Vec<f64> = (0..schedule.plan.workpiece_count)
        .map(|w| {
            schedule.plans[w]
                .iter()
                .skip(state.cursor[w])
                .map(PlanStep::duration)
                .sum()
        })
        .collect();
    let next_station: Vec<Option<usize>> = (0..schedule.plan.workpiece_count)
        .map(|w| {
            schedule.plans[w]
                .iter()
                .skip(state.cursor[w] + 1)
                .find_map(|s| match s {
                    PlanStep::Process { station, .. } => Some(*station),
                    _ => None,
                })
        })
        .collect();
    let loads: Vec<f64> = (0..schedule.plan.station_count)
        .map(|s| schedule.resource_load(s))
        .collect();
    (remaining, next_station, loads)
}

/// Commits one candidate per free station with a non-empty queue.
fn dispatch_stations(schedule: &mut Schedule, state: &mut SimulationState, extended: bool) {
    for st in 0..schedule.plan.station_count {
        if !state.resource_free[st] || state.queues[st].is_empty() {
            continue;
        }
        let chosen = if state.queues[st].len() == 1 {
            0
        } else {
            let (remaining, next_station, loads) = dispatch_data(schedule, state);
            let context = DispatchContext {
                remaining_work: &remaining,
                next_station: &next_station,
                station_load: &loads,
            };
            schedule.production_rule.select(&state.queues[st], &context)
        };
        let candidate = state.queues[st][chosen].clone();

        schedule.timelines[st].push(Interval {
            workpiece: candidate.workpiece,
            step: candidate.step,
            start: state.clock,
            end: state.clock + candidate.duration,
            label: candidate.label,
            route: None,
        });
        state.resource_free[st] = false;
        state.workpiece_free[candidate.workpiece] = false;
        state.cursor[candidate.workpiece] += 1;
        if extended {
            state.cursor_ext[candidate.workpiece] += 1;
        }
    }
}

/// Commits at most one transport assignment: the first free unit takes its
/// first queued candidate, which is then removed from every other unit's
/// queue.
fn dispatch_transport(schedule: &mut Schedule, state: &mut SimulationState) {
    let stations = schedule.plan.station_count;
    for u in 0..schedule.plan.transport_count {
        let resource = stations + u;
        if !state.resource_free[resource] || state.queues[resource].is_empty() {
            continue;
        }
        let candidate = state.queues[resource][0].clone();

        schedule.timelines[resource].push(Interval {
            workpiece: candidate.workpiece,
            step: candidate.step,
            start: state.clock,
            end: state.clock + candidate.duration,
            label: candidate.label.clone(),
            route: candidate.route,
        });
        state.resource_free[resource] = false;
        state.workpiece_free[candidate.workpiece] = false;
        state.cursor_ext[candidate.workpiece] += 1;

        for queue in &mut state.queues[stations..] {
            queue.retain(|other| {
                !(other.workpiece == candidate.workpiece
                    && other.step == candidate.step
                    && other.route == candidate.route)
            });
        }
        return;
    }
}

/// Advances the clock to the earliest completion among busy resources and
/// releases everything finishing there. Returns `false` when nothing is
/// busy — the run is complete.
fn advance_clock(schedule: &Schedule, state: &mut SimulationState, extended: bool) -> bool {
    let mut next = f64::MAX;
    for (r, timeline) in schedule.timelines.iter().enumerate() {
        if state.resource_free[r] {
            continue;
        }
        if let Some(last) = timeline.last() {
            if last.end < next {
                next = last.end;
            }
        }
    }
    if next == f64::MAX {
        return false;
    }

    state.clock = next;
    for (r, timeline) in schedule.timelines.iter().enumerate() {
        if state.resource_free[r] {
            continue;
        }
        let Some(last) = timeline.last() else {
            continue;
        };
        if (last.end - next).abs() < TIME_EPSILON {
            state.resource_free[r] = true;
            let w = last.workpiece;
            state.workpiece_free[w] = true;

            let (cursor, plan_len) = if extended {
                (state.cursor_ext[w], schedule.extended_plans[w].len())
            } else {
                (state.cursor[w], schedule.plans[w].len())
            };
            if cursor >= plan_len {
                // Finished workpieces never re-enter candidate collection.
                state.workpiece_free[w] = false;
            }
        }
    }
    true
}
