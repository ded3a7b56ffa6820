//! Vehicle movement logic for the traffic simulation

use super::error::{SimError, SimResult};
use super::road_network::RoadNetwork;
use super::types::{IntersectionId, RoadId, VehicleId, VehicleStatus, PROGRESS_EPSILON};

/// Result of a vehicle update indicating what happened this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleUpdateResult {
    /// Vehicle had already arrived; nothing to do
    Idle,
    /// Vehicle advanced along its current road
    Moved,
    /// Vehicle finished a road and now stands at the given intersection
    ReachedNode(IntersectionId),
    /// Vehicle finished its last road
    Arrived(IntersectionId),
    /// A red or yellow signal at the given intersection held the vehicle
    HeldBySignal(IntersectionId),
    /// An accident ahead on the current road stopped the vehicle
    BlockedByAccident(RoadId),
}

/// A vehicle following a precomputed path
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: VehicleId,
    /// Display label, e.g. "V17"
    pub label: String,
    /// Intersections from start to destination, inclusive
    path: Vec<IntersectionId>,
    /// `roads[i]` joins `path[i]` to `path[i + 1]`
    roads: Vec<RoadId>,
    /// Index into `path` of the intersection last passed
    pub position: usize,
    /// Fraction of the current road covered, in `[0, 1)`
    pub progress: f64,
    pub status: VehicleStatus,
}

impl SimVehicle {
    /// Create a vehicle on `path`, resolving the road for every hop.
    ///
    /// A single-node path yields a vehicle that has already arrived.
    pub fn new(
        id: VehicleId,
        label: impl Into<String>,
        path: Vec<IntersectionId>,
        network: &RoadNetwork,
    ) -> SimResult<Self> {
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            return Err(SimError::InvalidConfig("vehicle path is empty".to_string()));
        };

        let key_of = |id: IntersectionId| {
            network
                .intersection(id)
                .map(|intersection| intersection.key.clone())
                .unwrap_or_else(|| format!("#{}", id.index()))
        };

        let roads = path
            .windows(2)
            .map(|hop| {
                network
                    .find_road_between(hop[0], hop[1])
                    .ok_or_else(|| SimError::NoPathFound {
                        from: key_of(*first),
                        to: key_of(*last),
                    })
            })
            .collect::<SimResult<Vec<_>>>()?;

        let status = if path.len() == 1 {
            VehicleStatus::Arrived
        } else {
            VehicleStatus::Waiting
        };

        Ok(Self {
            id,
            label: label.into(),
            path,
            roads,
            position: 0,
            progress: 0.0,
            status,
        })
    }

    pub fn path(&self) -> &[IntersectionId] {
        &self.path
    }

    pub fn roads(&self) -> &[RoadId] {
        &self.roads
    }

    pub fn origin(&self) -> IntersectionId {
        self.path[0]
    }

    pub fn destination(&self) -> IntersectionId {
        self.path[self.path.len() - 1]
    }

    /// The intersection the vehicle last passed
    pub fn current_node(&self) -> IntersectionId {
        self.path[self.position]
    }

    /// The road being traversed, `None` once arrived
    pub fn current_road(&self) -> Option<RoadId> {
        if self.status == VehicleStatus::Arrived {
            return None;
        }
        self.roads.get(self.position).copied()
    }

    pub fn has_arrived(&self) -> bool {
        self.status == VehicleStatus::Arrived
    }

    /// Hops left before the destination
    pub fn hops_remaining(&self) -> usize {
        self.path.len() - 1 - self.position
    }

    /// Advance the vehicle by one tick.
    ///
    /// Reads signal and accident state from `network` without modifying it.
    /// An accident on the current road takes precedence over the signal at
    /// the current node.
    pub fn update(&mut self, network: &RoadNetwork, progress_step: f64) -> VehicleUpdateResult {
        if self.has_arrived() {
            return VehicleUpdateResult::Idle;
        }

        let result = match self.blocking_accident(network) {
            Some((road_id, accident_position)) => {
                self.approach_accident(road_id, accident_position, progress_step)
            }
            None => self.follow_signal(network, progress_step),
        };

        debug_assert!(self.position < self.path.len());
        debug_assert!((0.0..1.0).contains(&self.progress));
        debug_assert!(!self.has_arrived() || self.position == self.path.len() - 1);
        result
    }

    fn blocking_accident(&self, network: &RoadNetwork) -> Option<(RoadId, f64)> {
        let road_id = self.current_road()?;
        network
            .road(road_id)
            .and_then(|road| road.accident.as_ref())
            .map(|accident| (road_id, accident.position))
    }

    fn approach_accident(
        &mut self,
        road_id: RoadId,
        accident_position: f64,
        progress_step: f64,
    ) -> VehicleUpdateResult {
        if self.progress >= accident_position {
            self.status = VehicleStatus::Waiting;
            return VehicleUpdateResult::BlockedByAccident(road_id);
        }

        self.progress += progress_step;
        if self.progress >= accident_position {
            // Stop at the obstruction, never past it
            self.progress = accident_position;
            self.status = VehicleStatus::Waiting;
            return VehicleUpdateResult::BlockedByAccident(road_id);
        }

        self.status = VehicleStatus::Moving;
        VehicleUpdateResult::Moved
    }

    fn follow_signal(&mut self, network: &RoadNetwork, progress_step: f64) -> VehicleUpdateResult {
        let node = self.current_node();
        let may_depart = network
            .intersection(node)
            .map_or(true, |intersection| intersection.allows_departure());

        if !may_depart {
            self.status = VehicleStatus::Waiting;
            return VehicleUpdateResult::HeldBySignal(node);
        }

        self.progress += progress_step;
        self.status = VehicleStatus::Moving;

        if self.progress + PROGRESS_EPSILON < 1.0 {
            return VehicleUpdateResult::Moved;
        }

        self.progress = 0.0;
        self.position += 1;
        let reached = self.current_node();
        if self.position == self.path.len() - 1 {
            self.status = VehicleStatus::Arrived;
            VehicleUpdateResult::Arrived(reached)
        } else {
            VehicleUpdateResult::ReachedNode(reached)
        }
    }
}
