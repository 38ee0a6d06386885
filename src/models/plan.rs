//! Process-plan input model.
//!
//! [`PlanData`] is the immutable input to the scheduler: per-workpiece
//! operation matrices, per-station buffer capacities, and the transport
//! timing model. It is produced by a loader (see `codec`) or built directly,
//! and consumed read-only by the scheduler.
//!
//! # Index Conventions
//!
//! Workpieces and steps are 0-based. Stations are 1-based in operation
//! matrices and in the distance/travel-time matrices, where index 0 is the
//! central storage. A station value ≤ 0 in `operation_station` means the
//! workpiece's plan ends at that step.

use serde::{Deserialize, Serialize};

/// Immutable scheduling input for one flexible manufacturing system.
///
/// All matrices are rectangular: `operation_station` and `operation_time`
/// are `workpiece_count × step_count`; `distance` and `travel_time` are
/// `(station_count + 1)²` with row/column 0 standing for central storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanData {
    /// Number of workpieces to schedule.
    pub workpiece_count: usize,
    /// Maximum operations per workpiece.
    pub step_count: usize,
    /// Number of fixed processing stations.
    pub station_count: usize,
    /// Number of mobile transport units.
    pub transport_count: usize,

    /// Time to load a workpiece onto a station.
    pub load_time: f64,
    /// Time to unload a workpiece from a station.
    pub unload_time: f64,
    /// Give/take handover time, applied twice per leg.
    pub give_take_time: f64,
    /// Average transport speed (distance units per time unit).
    pub speed: f64,

    /// Target station per workpiece and step (1-based; ≤ 0 ends the plan).
    pub operation_station: Vec<Vec<i32>>,
    /// Processing duration per workpiece and step.
    pub operation_time: Vec<Vec<f64>>,
    /// Travel distance between points 0..=station_count (0 = storage).
    pub distance: Vec<Vec<f64>>,
    /// Derived travel time between points, see [`PlanData::recalculate_travel_times`].
    pub travel_time: Vec<Vec<f64>>,
    /// Buffer slots per station: 1 = shared entry/exit slot, 2 = separate slots.
    pub buffer_capacity: Vec<u8>,
}

impl PlanData {
    /// Creates a plan with zeroed matrices, unit speed, and two buffer
    /// slots per station.
    pub fn new(
        workpiece_count: usize,
        step_count: usize,
        station_count: usize,
        transport_count: usize,
    ) -> Self {
        let points = station_count + 1;
        let mut plan = Self {
            workpiece_count,
            step_count,
            station_count,
            transport_count,
            load_time: 0.0,
            unload_time: 0.0,
            give_take_time: 0.0,
            speed: 1.0,
            operation_station: vec![vec![0; step_count]; workpiece_count],
            operation_time: vec![vec![0.0; step_count]; workpiece_count],
            distance: vec![vec![0.0; points]; points],
            travel_time: vec![vec![0.0; points]; points],
            buffer_capacity: vec![2; station_count],
        };
        plan.recalculate_travel_times();
        plan
    }

    /// Sets the four transport timing parameters.
    pub fn with_timing(mut self, load: f64, unload: f64, give_take: f64, speed: f64) -> Self {
        self.load_time = load;
        self.unload_time = unload;
        self.give_take_time = give_take;
        self.speed = speed;
        self.recalculate_travel_times();
        self
    }

    /// Sets one operation: target station (1-based) and duration.
    pub fn with_operation(
        mut self,
        workpiece: usize,
        step: usize,
        station: i32,
        duration: f64,
    ) -> Self {
        self.operation_station[workpiece][step] = station;
        self.operation_time[workpiece][step] = duration;
        self
    }

    /// Sets the one-way distance from point `from` to point `to`
    /// (0 = storage, 1..=station_count = stations).
    pub fn with_distance(mut self, from: usize, to: usize, distance: f64) -> Self {
        self.distance[from][to] = distance;
        self.recalculate_travel_times();
        self
    }

    /// Sets the buffer capacity (1 or 2) of a station (1-based).
    pub fn with_buffer_capacity(mut self, station: usize, capacity: u8) -> Self {
        self.buffer_capacity[station - 1] = capacity;
        self
    }

    /// Buffer capacity of a station (1-based).
    #[inline]
    pub fn buffer_capacity_of(&self, station: usize) -> u8 {
        self.buffer_capacity[station - 1]
    }

    /// Recomputes the derived travel-time matrix from distances and timing
    /// parameters:
    ///
    /// `travel_time[i][j] = distance[i][j] / speed + 2·give_take_time`,
    /// plus `unload_time` when departing a station (`i ≠ 0`) and
    /// `load_time` when arriving at one (`j ≠ 0`).
    pub fn recalculate_travel_times(&mut self) {
        for i in 0..=self.station_count {
            for j in 0..=self.station_count {
                let mut t = self.distance[i][j] / self.speed + 2.0 * self.give_take_time;
                if i != 0 {
                    t += self.unload_time;
                }
                if j != 0 {
                    t += self.load_time;
                }
                self.travel_time[i][j] = t;
            }
        }
    }

    /// Total number of schedulable resources (stations + transport units).
    #[inline]
    pub fn resource_count(&self) -> usize {
        self.station_count + self.transport_count
    }
}
