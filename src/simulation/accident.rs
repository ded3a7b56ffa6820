//! Accident detection, lifetime tracking and per-tick road occupancy

use log::debug;
use ordered_float::OrderedFloat;
use rand::Rng;
use sorted_vec::SortedVec;
use std::collections::HashMap;
use std::ops::RangeInclusive;

use super::road_network::RoadNetwork;
use super::types::{RoadId, VehicleId};
use super::vehicle::SimVehicle;

/// A temporary obstruction on a road
#[derive(Debug, Clone, PartialEq)]
pub struct Accident {
    pub road: RoadId,
    /// Location along the road, in `[0, 1)`
    pub position: f64,
    /// Ticks the accident lives for
    pub duration: u32,
    pub elapsed_time: u32,
    /// Tick on which the accident appeared
    pub created_at: u64,
}

impl Accident {
    pub fn new(road: RoadId, position: f64, duration: u32, created_at: u64) -> Self {
        debug_assert!((0.0..1.0).contains(&position));
        Self {
            road,
            position,
            duration,
            elapsed_time: 0,
            created_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed_time >= self.duration
    }
}

/// Vehicles on each road for a single tick, ordered by progress.
///
/// Built from committed vehicle state after the vehicle pass and thrown away
/// once the tick is over.
#[derive(Debug, Default, Clone)]
pub struct RoadOccupancy {
    per_road: HashMap<RoadId, SortedVec<(OrderedFloat<f64>, VehicleId)>>,
}

impl RoadOccupancy {
    /// Collect every non-arrived vehicle onto the road it is traversing
    pub fn compute(vehicles: &[SimVehicle]) -> Self {
        let mut per_road: HashMap<RoadId, SortedVec<(OrderedFloat<f64>, VehicleId)>> =
            HashMap::new();
        for vehicle in vehicles {
            if let Some(road_id) = vehicle.current_road() {
                per_road
                    .entry(road_id)
                    .or_insert_with(SortedVec::new)
                    .insert((OrderedFloat(vehicle.progress), vehicle.id));
            }
        }
        Self { per_road }
    }

    pub fn count(&self, road_id: RoadId) -> usize {
        self.per_road.get(&road_id).map_or(0, |vehicles| vehicles.len())
    }

    /// Vehicles on a road, rearmost first
    pub fn vehicles_on(&self, road_id: RoadId) -> Vec<VehicleId> {
        self.per_road
            .get(&road_id)
            .map(|vehicles| vehicles.iter().map(|(_, id)| *id).collect())
            .unwrap_or_default()
    }

    /// The vehicle furthest along a road
    pub fn lead_vehicle(&self, road_id: RoadId) -> Option<VehicleId> {
        self.per_road
            .get(&road_id)
            .and_then(|vehicles| vehicles.last())
            .map(|(_, id)| *id)
    }

    /// Roads carrying at least one vehicle, with their counts
    pub fn iter(&self) -> impl Iterator<Item = (RoadId, usize)> + '_ {
        self.per_road
            .iter()
            .map(|(road_id, vehicles)| (*road_id, vehicles.len()))
    }

    pub fn total_vehicles(&self) -> usize {
        self.per_road.values().map(|vehicles| vehicles.len()).sum()
    }
}

/// Accident trigger settings, copied out of the run configuration
#[derive(Debug, Clone)]
pub struct AccidentSettings {
    pub probability: f64,
    pub congestion_threshold: usize,
    pub duration_range: RangeInclusive<u32>,
}

/// Give congested roads a chance of an accident.
///
/// Only roads without an active accident and with at least
/// `congestion_threshold` vehicles are considered. Returns the roads that
/// gained an accident.
pub fn inject_accidents<R: Rng>(
    network: &mut RoadNetwork,
    occupancy: &RoadOccupancy,
    settings: &AccidentSettings,
    rng: &mut R,
    tick: u64,
) -> Vec<RoadId> {
    let mut created = Vec::new();
    if settings.probability <= 0.0 {
        return created;
    }

    for road in network.roads_mut() {
        if road.accident.is_some() {
            continue;
        }
        let vehicles = occupancy.count(road.id);
        if vehicles < settings.congestion_threshold {
            continue;
        }
        if !rng.random_bool(settings.probability) {
            continue;
        }

        let position = rng.random::<f64>();
        let duration = rng.random_range(settings.duration_range.clone());
        debug!(
            "Accident on road {} at {:.2} for {} ticks ({} vehicles on road)",
            road.key, position, duration, vehicles
        );
        road.accident = Some(Accident::new(road.id, position, duration, tick));
        created.push(road.id);
    }

    created
}

/// Age every accident by one tick and clear the expired ones.
///
/// Accidents created during `tick` are left untouched so each one lives for
/// exactly `duration` ticks. Returns the roads that were cleared.
pub fn age_accidents(network: &mut RoadNetwork, tick: u64) -> Vec<RoadId> {
    let mut cleared = Vec::new();

    for road in network.roads_mut() {
        let Some(accident) = road.accident.as_mut() else {
            continue;
        };
        if accident.created_at == tick {
            continue;
        }

        accident.elapsed_time += 1;
        if accident.is_expired() {
            debug!(
                "Accident on road {} cleared after {} ticks",
                road.key, accident.elapsed_time
            );
            road.accident = None;
            cleared.push(road.id);
        }
    }

    cleared
}
