//! Street Grid Traffic Simulation Library
//!
//! A discrete-time traffic simulation over a street grid: signalled
//! intersections, vehicles on shortest paths, and transient accidents.

pub mod loader;
pub mod report;
pub mod simulation;
