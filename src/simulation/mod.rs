//! Standalone traffic simulation module
//!
//! This module contains the simulation engine: the road graph, shortest-path
//! routing, and the per-tick update of signals, vehicles and accidents. It
//! has no I/O of its own; loading and reporting live alongside it.

mod accident;
mod config;
mod error;
mod intersection;
mod observer;
mod road_network;
mod signal;
mod stats;
mod types;
mod vehicle;
mod vehicle_manager;
mod world;

// Re-export public types for external use
pub use accident::{age_accidents, inject_accidents, Accident, AccidentSettings, RoadOccupancy};
pub use config::{
    SignalTimings, SimConfig, ACCIDENT_CONGESTION_THRESHOLD, ACCIDENT_MAX_DURATION,
    ACCIDENT_MIN_DURATION, ACCIDENT_PROBABILITY, GREEN_DURATION, INITIAL_SIGNAL_MAX_DURATION,
    INITIAL_SIGNAL_MIN_DURATION, INTERSECTION_CAPACITY, NUM_VEHICLES, PROGRESS_STEP, RED_DURATION,
    ROAD_CAPACITY, YELLOW_DURATION,
};
pub use error::{SimError, SimResult};
pub use intersection::SimIntersection;
pub use observer::{NoopObserver, TickObserver};
pub use road_network::{RoadEdge, RoadNetwork, SimRoad};
pub use signal::{SignalState, TrafficSignal};
pub use stats::{DensityRecorder, DensitySnapshot, RoadDensity, SimulationStats};
pub use types::{
    GridPosition, IntersectionId, IntersectionRecord, RoadId, RoadRecord, SimId, VehicleId,
    VehicleStatus, PROGRESS_EPSILON,
};
pub use vehicle::{SimVehicle, VehicleUpdateResult};
pub use vehicle_manager::{spawn_random_vehicles, spawn_vehicle, update_vehicles, VehiclePassSummary};
pub use world::{RunOutcome, SimWorld, TickReport};
