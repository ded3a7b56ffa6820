//! Hooks for reading world state between ticks.

use super::world::{SimWorld, TickReport};

/// Callbacks invoked by [`SimWorld::run`] after each tick.
///
/// The world is fully updated when these are called, and the tick's
/// [`TickReport`] (including its road occupancy) is only valid for the
/// duration of the call. Both methods default to no-ops.
pub trait TickObserver {
    /// Called once after every completed tick.
    fn on_tick(&mut self, _world: &SimWorld, _report: &TickReport) {}

    /// Called once when the run stops, whether every vehicle arrived or the
    /// tick limit was hit.
    fn on_complete(&mut self, _world: &SimWorld, _ticks: u64) {}
}

/// A [`TickObserver`] that does nothing.
pub struct NoopObserver;

impl TickObserver for NoopObserver {}

impl<A: TickObserver, B: TickObserver> TickObserver for (A, B) {
    fn on_tick(&mut self, world: &SimWorld, report: &TickReport) {
        self.0.on_tick(world, report);
        self.1.on_tick(world, report);
    }

    fn on_complete(&mut self, world: &SimWorld, ticks: u64) {
        self.0.on_complete(world, ticks);
        self.1.on_complete(world, ticks);
    }
}
