//! Intersection state for the traffic simulation

use super::config::SignalTimings;
use super::signal::{SignalState, TrafficSignal};
use super::types::{GridPosition, IntersectionId, VehicleId};

/// An intersection in the traffic simulation
#[derive(Debug, Clone)]
pub struct SimIntersection {
    pub id: IntersectionId,
    /// Stable key from the input data
    pub key: String,
    /// Display name, e.g. "Wells / Madison"
    pub name: String,
    pub position: GridPosition,
    /// Signal gating departures; `None` never gates
    pub signal: Option<TrafficSignal>,
    /// Informational bound on `queue`, not enforced
    pub capacity: usize,
    /// Vehicles held at this intersection's signal during the last tick
    pub queue: Vec<VehicleId>,
}

impl SimIntersection {
    pub fn new(
        id: IntersectionId,
        key: impl Into<String>,
        name: impl Into<String>,
        position: GridPosition,
        capacity: usize,
    ) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            position,
            signal: None,
            capacity,
            queue: Vec::new(),
        }
    }

    /// Check if a vehicle standing at this intersection may move on
    pub fn allows_departure(&self) -> bool {
        self.signal
            .as_ref()
            .map_or(true, TrafficSignal::allows_departure)
    }

    pub fn signal_state(&self) -> Option<SignalState> {
        self.signal.as_ref().map(|signal| signal.state)
    }

    /// Advance the signal, if any.
    /// Returns the new state when the phase changed.
    pub fn update_signal(&mut self, timings: &SignalTimings) -> Option<SignalState> {
        self.signal.as_mut().and_then(|signal| signal.advance(timings))
    }

    pub fn is_over_capacity(&self) -> bool {
        self.queue.len() > self.capacity
    }
}
