//! Vehicle spawning and the per-tick vehicle pass
//!
//! Spawning happens once at setup. The update pass runs every tick against a
//! shared borrow of the road network, so every vehicle sees the signal and
//! accident state as it stood when the pass began.

use log::{debug, warn};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::BTreeMap;

use super::error::SimResult;
use super::road_network::RoadNetwork;
use super::types::{IntersectionId, SimId, VehicleId};
use super::vehicle::{SimVehicle, VehicleUpdateResult};

/// Aggregate outcome of one vehicle pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehiclePassSummary {
    pub moving: usize,
    pub waiting: usize,
    pub arrived_this_tick: usize,
    /// Vehicles held by each intersection's signal this tick
    pub held_at: BTreeMap<IntersectionId, Vec<VehicleId>>,
}

/// Spawn a vehicle travelling between two intersections given by key
pub fn spawn_vehicle(
    vehicle_id: VehicleId,
    label: &str,
    from_key: &str,
    to_key: &str,
    road_network: &mut RoadNetwork,
) -> SimResult<SimVehicle> {
    let path = road_network.find_path(from_key, to_key)?;
    SimVehicle::new(vehicle_id, label, path, road_network)
}

/// Spawn `count` vehicles between random distinct intersections.
///
/// Vehicles whose path request fails are logged and left out, so the result
/// may hold fewer than `count` vehicles. Labels run `V1..=Vcount` regardless.
pub fn spawn_random_vehicles<R: Rng>(
    count: usize,
    road_network: &mut RoadNetwork,
    rng: &mut R,
) -> Vec<SimVehicle> {
    let keys: Vec<String> = road_network
        .intersections()
        .iter()
        .map(|intersection| intersection.key.clone())
        .collect();

    if keys.len() < 2 {
        warn!(
            "Cannot spawn vehicles on a network with {} intersection(s)",
            keys.len()
        );
        return Vec::new();
    }

    let mut vehicles = Vec::with_capacity(count);
    for index in 0..count {
        let Some(start) = keys.choose(rng) else {
            break;
        };
        let mut end = start;
        while end == start {
            end = match keys.choose(rng) {
                Some(key) => key,
                None => break,
            };
        }

        let label = format!("V{}", index + 1);
        let vehicle_id = VehicleId(SimId(vehicles.len()));
        match spawn_vehicle(vehicle_id, &label, start, end, road_network) {
            Ok(vehicle) => vehicles.push(vehicle),
            Err(err) => warn!("Error finding path for vehicle {label}: {err}"),
        }
    }

    debug!("Spawned {} of {} vehicles", vehicles.len(), count);
    vehicles
}

/// Update all vehicles in the simulation
pub fn update_vehicles(
    vehicles: &mut [SimVehicle],
    road_network: &RoadNetwork,
    progress_step: f64,
) -> VehiclePassSummary {
    let mut summary = VehiclePassSummary::default();

    for vehicle in vehicles.iter_mut() {
        match vehicle.update(road_network, progress_step) {
            VehicleUpdateResult::Idle => {}
            VehicleUpdateResult::Moved | VehicleUpdateResult::ReachedNode(_) => {
                summary.moving += 1;
            }
            VehicleUpdateResult::Arrived(destination) => {
                debug!(
                    "Vehicle {} arrived at intersection {}",
                    vehicle.label,
                    destination.index()
                );
                summary.arrived_this_tick += 1;
            }
            VehicleUpdateResult::HeldBySignal(node) => {
                summary.waiting += 1;
                summary.held_at.entry(node).or_default().push(vehicle.id);
            }
            VehicleUpdateResult::BlockedByAccident(_) => {
                summary.waiting += 1;
            }
        }
    }

    summary
}
