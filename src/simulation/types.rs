//! Core types for the traffic simulation
//!
//! Identifiers are indices into the arenas owned by the road network and the
//! world, so every cross reference is a plain `Copy` value.

use std::fmt;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for intersection IDs (index into the intersection arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntersectionId(pub SimId);

/// A wrapper type for road IDs (index into the road arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoadId(pub SimId);

/// A wrapper type for vehicle IDs (index into the vehicle list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub SimId);

impl IntersectionId {
    pub fn index(self) -> usize {
        self.0 .0
    }
}

impl RoadId {
    pub fn index(self) -> usize {
        self.0 .0
    }
}

impl VehicleId {
    pub fn index(self) -> usize {
        self.0 .0
    }
}

/// Integer coordinates of an intersection on the street grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Interpolate between two grid points, returning fractional coordinates
    pub fn lerp(&self, other: &GridPosition, t: f64) -> (f64, f64) {
        let x = self.x as f64 + (other.x - self.x) as f64 * t;
        let y = self.y as f64 + (other.y - self.y) as f64 * t;
        (x, y)
    }
}

/// Motion state of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    /// Held by a signal or an accident (also the initial state)
    Waiting,
    /// Advanced along its current road this tick
    Moving,
    /// Reached the last node of its path; terminal
    Arrived,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VehicleStatus::Waiting => "waiting",
            VehicleStatus::Moving => "moving",
            VehicleStatus::Arrived => "arrived",
        };
        f.write_str(label)
    }
}

/// Raw intersection record handed over by the graph loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionRecord {
    pub key: String,
    pub name: String,
    pub position: GridPosition,
}

/// Raw road record handed over by the graph loader.
/// Endpoints are intersection keys, resolved when the network is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadRecord {
    pub key: String,
    pub from_name: String,
    pub to_name: String,
    pub from_key: String,
    pub to_key: String,
}

/// Progress values within this distance of 1.0 count as a completed segment,
/// so repeated fractional steps (e.g. 100 x 0.01) finish on the expected tick.
pub const PROGRESS_EPSILON: f64 = 1e-9;
