//! Tunable parameters for a simulation run
//!
//! Defaults reproduce the baseline street-grid scenario: a thousand vehicles,
//! rare accidents, and a 60/30/60 tick green/yellow/red cycle.

use std::ops::RangeInclusive;

use super::error::{SimError, SimResult};

/// Number of vehicles created at the start of a run
pub const NUM_VEHICLES: usize = 1000;
/// Chance per tick that a congested road without an accident gets one
pub const ACCIDENT_PROBABILITY: f64 = 0.001;
/// Vehicles on a road at or above which an accident may happen
pub const ACCIDENT_CONGESTION_THRESHOLD: usize = 2;
/// Shortest and longest accident lifetime, in ticks
pub const ACCIDENT_MIN_DURATION: u32 = 300;
pub const ACCIDENT_MAX_DURATION: u32 = 600;
/// Informational capacity bounds
pub const ROAD_CAPACITY: usize = 10;
pub const INTERSECTION_CAPACITY: usize = 5;
/// Signal phase lengths, in ticks
pub const GREEN_DURATION: u32 = 60;
pub const YELLOW_DURATION: u32 = 30;
pub const RED_DURATION: u32 = 60;
/// Range for the randomized first phase of each signal
pub const INITIAL_SIGNAL_MIN_DURATION: u32 = 10;
pub const INITIAL_SIGNAL_MAX_DURATION: u32 = 30;
/// Fraction of a road covered per tick of movement
pub const PROGRESS_STEP: f64 = 0.01;

/// Phase lengths applied by every traffic signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalTimings {
    pub green: u32,
    pub yellow: u32,
    pub red: u32,
}

impl Default for SignalTimings {
    fn default() -> Self {
        Self {
            green: GREEN_DURATION,
            yellow: YELLOW_DURATION,
            red: RED_DURATION,
        }
    }
}

impl SignalTimings {
    /// Length of one full red -> green -> yellow -> red cycle
    pub fn cycle_length(&self) -> u32 {
        self.green + self.yellow + self.red
    }
}

/// Configuration for a simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub num_vehicles: usize,
    pub accident_probability: f64,
    pub accident_congestion_threshold: usize,
    pub accident_duration_range: RangeInclusive<u32>,
    pub road_capacity: usize,
    pub intersection_capacity: usize,
    pub signal_timings: SignalTimings,
    pub initial_signal_duration_range: RangeInclusive<u32>,
    pub progress_step: f64,
    /// Give every intersection a traffic signal at setup
    pub install_signals: bool,
    /// Seed for reproducible runs; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_vehicles: NUM_VEHICLES,
            accident_probability: ACCIDENT_PROBABILITY,
            accident_congestion_threshold: ACCIDENT_CONGESTION_THRESHOLD,
            accident_duration_range: ACCIDENT_MIN_DURATION..=ACCIDENT_MAX_DURATION,
            road_capacity: ROAD_CAPACITY,
            intersection_capacity: INTERSECTION_CAPACITY,
            signal_timings: SignalTimings::default(),
            initial_signal_duration_range: INITIAL_SIGNAL_MIN_DURATION
                ..=INITIAL_SIGNAL_MAX_DURATION,
            progress_step: PROGRESS_STEP,
            install_signals: true,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Check that every option is usable by the update loop
    pub fn validate(&self) -> SimResult<()> {
        if !(0.0..=1.0).contains(&self.accident_probability) {
            return Err(SimError::InvalidConfig(format!(
                "accident probability {} is outside [0, 1]",
                self.accident_probability
            )));
        }
        if !(self.progress_step > 0.0 && self.progress_step <= 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "progress step {} must be in (0, 1]",
                self.progress_step
            )));
        }
        let timings = self.signal_timings;
        if timings.green == 0 || timings.yellow == 0 || timings.red == 0 {
            return Err(SimError::InvalidConfig(
                "signal phase durations must be at least one tick".to_string(),
            ));
        }
        check_range("accident duration", &self.accident_duration_range)?;
        check_range("initial signal duration", &self.initial_signal_duration_range)?;
        if self.road_capacity == 0 || self.intersection_capacity == 0 {
            return Err(SimError::InvalidConfig(
                "capacities must be positive".to_string(),
            ));
        }
        if self.accident_congestion_threshold == 0 {
            return Err(SimError::InvalidConfig(
                "accident congestion threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of ticks a vehicle needs to cross one road when never held
    pub fn ticks_per_road(&self) -> u64 {
        (1.0 / self.progress_step - super::types::PROGRESS_EPSILON).ceil() as u64
    }
}

fn check_range(what: &str, range: &RangeInclusive<u32>) -> SimResult<()> {
    if range.is_empty() || *range.start() == 0 {
        return Err(SimError::InvalidConfig(format!(
            "{what} range {}..={} must be non-empty and start above zero",
            range.start(),
            range.end()
        )));
    }
    Ok(())
}
