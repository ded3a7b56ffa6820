//! Traffic density snapshots and run statistics
//!
//! Everything here is derived from the read-only world accessors after a
//! tick; nothing feeds back into the simulation.

use serde::Serialize;
use std::collections::BTreeMap;

use super::accident::RoadOccupancy;
use super::observer::TickObserver;
use super::world::{SimWorld, TickReport};

/// Density of a single road at one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadDensity {
    pub name: String,
    /// Vehicles on the road divided by its capacity
    pub density: f64,
    pub accident: bool,
}

/// Density of every road at one tick, keyed by road key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensitySnapshot {
    pub time_step: u64,
    #[serde(flatten)]
    pub roads: BTreeMap<String, RoadDensity>,
}

impl DensitySnapshot {
    pub fn capture(world: &SimWorld, occupancy: &RoadOccupancy, time_step: u64) -> Self {
        let roads = world
            .road_network()
            .roads()
            .iter()
            .map(|road| {
                let vehicles = occupancy.count(road.id);
                let density = RoadDensity {
                    name: road.name.clone(),
                    density: vehicles as f64 / road.capacity.max(1) as f64,
                    accident: road.has_accident(),
                };
                (road.key.clone(), density)
            })
            .collect();

        Self { time_step, roads }
    }

    /// Highest density across all roads
    pub fn peak_density(&self) -> f64 {
        self.roads
            .values()
            .map(|road| road.density)
            .fold(0.0, f64::max)
    }
}

/// Collects density snapshots while a run progresses
#[derive(Debug, Default)]
pub struct DensityRecorder {
    /// Record every `interval`-th tick; 0 and 1 both mean every tick
    interval: u64,
    snapshots: Vec<DensitySnapshot>,
}

impl DensityRecorder {
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            snapshots: Vec::new(),
        }
    }

    pub fn snapshots(&self) -> &[DensitySnapshot] {
        &self.snapshots
    }

    pub fn into_snapshots(self) -> Vec<DensitySnapshot> {
        self.snapshots
    }
}

impl TickObserver for DensityRecorder {
    fn on_tick(&mut self, world: &SimWorld, report: &TickReport) {
        if self.interval > 1 && report.tick % self.interval != 0 {
            return;
        }
        self.snapshots
            .push(DensitySnapshot::capture(world, &report.occupancy, report.tick));
    }
}

/// Running totals for a simulation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub ticks: u64,
    pub total_vehicles: usize,
    pub vehicles_arrived: usize,
    pub accidents_created: usize,
    pub accidents_cleared: usize,
    /// Largest number of vehicles held in one tick
    pub peak_waiting: usize,
}

impl SimulationStats {
    /// Share of vehicles that reached their destination, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total_vehicles == 0 {
            return 0.0;
        }
        self.vehicles_arrived as f64 / self.total_vehicles as f64 * 100.0
    }
}
