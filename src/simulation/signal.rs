//! Traffic signal phase state machine

use std::fmt;

use super::config::SignalTimings;

/// Phase shown by a traffic signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalState {
    Red,
    Green,
    Yellow,
}

impl SignalState {
    pub const ALL: [SignalState; 3] = [SignalState::Red, SignalState::Green, SignalState::Yellow];

    /// The phase that follows this one in the red -> green -> yellow cycle
    pub fn next(self) -> SignalState {
        match self {
            SignalState::Red => SignalState::Green,
            SignalState::Green => SignalState::Yellow,
            SignalState::Yellow => SignalState::Red,
        }
    }

    /// Standard length of this phase
    pub fn duration(self, timings: &SignalTimings) -> u32 {
        match self {
            SignalState::Red => timings.red,
            SignalState::Green => timings.green,
            SignalState::Yellow => timings.yellow,
        }
    }

    /// Single-letter code used by the terminal map
    pub fn symbol(self) -> char {
        match self {
            SignalState::Red => 'R',
            SignalState::Green => 'G',
            SignalState::Yellow => 'Y',
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalState::Red => "red",
            SignalState::Green => "green",
            SignalState::Yellow => "yellow",
        };
        f.write_str(label)
    }
}

/// A traffic signal owned by one intersection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficSignal {
    pub state: SignalState,
    /// Ticks the current phase lasts
    pub duration: u32,
    /// Ticks since the last transition; `0 <= elapsed_time < duration` between ticks
    pub elapsed_time: u32,
}

impl TrafficSignal {
    pub fn new(state: SignalState, duration: u32) -> Self {
        Self {
            state,
            duration: duration.max(1),
            elapsed_time: 0,
        }
    }

    /// A signal starting a standard-length phase
    pub fn with_timings(state: SignalState, timings: &SignalTimings) -> Self {
        Self::new(state, state.duration(timings))
    }

    /// Advance the signal by one tick.
    ///
    /// Returns the new state when a transition fired this tick.
    pub fn advance(&mut self, timings: &SignalTimings) -> Option<SignalState> {
        self.elapsed_time += 1;
        if self.elapsed_time < self.duration {
            return None;
        }

        // Also fires when `duration` was lowered below `elapsed_time`
        self.state = self.state.next();
        self.duration = self.state.duration(timings);
        self.elapsed_time = 0;
        Some(self.state)
    }

    /// Whether vehicles may leave the intersection this tick
    pub fn allows_departure(&self) -> bool {
        self.state == SignalState::Green
    }

    /// Ticks left in the current phase
    pub fn remaining(&self) -> u32 {
        self.duration.saturating_sub(self.elapsed_time)
    }
}
