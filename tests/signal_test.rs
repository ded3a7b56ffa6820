//! Traffic signal state machine tests

use street_grid_sim::simulation::{
    SignalState, SignalTimings, SimConfig, SimWorld, TrafficSignal,
};

fn timings() -> SignalTimings {
    SignalTimings {
        green: 6,
        yellow: 3,
        red: 5,
    }
}

#[test]
fn test_cycle_returns_to_start() {
    let timings = timings();
    for state in SignalState::ALL {
        let mut signal = TrafficSignal::with_timings(state, &timings);
        let start = signal.clone();
        for _ in 0..timings.cycle_length() {
            signal.advance(&timings);
        }
        assert_eq!(signal, start, "cycle from {state} did not close");
        assert_eq!(signal.elapsed_time, 0);
    }
}

#[test]
fn test_default_cycle_returns_to_start() {
    let timings = SignalTimings::default();
    assert_eq!(timings.cycle_length(), 150);

    let mut signal = TrafficSignal::with_timings(SignalState::Green, &timings);
    for _ in 0..timings.cycle_length() {
        signal.advance(&timings);
    }
    assert_eq!(signal.state, SignalState::Green);
    assert_eq!(signal.elapsed_time, 0);
}

#[test]
fn test_transition_order_and_durations() {
    let timings = timings();
    let mut signal = TrafficSignal::with_timings(SignalState::Red, &timings);

    let mut transitions = Vec::new();
    for tick in 1..=timings.cycle_length() {
        if let Some(state) = signal.advance(&timings) {
            transitions.push((tick, state, signal.duration));
        }
        assert!(signal.elapsed_time < signal.duration);
    }

    assert_eq!(
        transitions,
        vec![
            (5, SignalState::Green, 6),
            (11, SignalState::Yellow, 3),
            (14, SignalState::Red, 5),
        ]
    );
}

#[test]
fn test_randomized_first_phase_then_standard_cycle() {
    let timings = timings();
    let mut signal = TrafficSignal::new(SignalState::Yellow, 12);
    for _ in 0..11 {
        assert_eq!(signal.advance(&timings), None);
    }
    assert_eq!(signal.advance(&timings), Some(SignalState::Red));
    assert_eq!(signal.duration, timings.red);
    assert_eq!(signal.remaining(), timings.red);
}

#[test]
fn test_shortened_duration_still_transitions() {
    let timings = timings();
    let mut signal = TrafficSignal::with_timings(SignalState::Green, &timings);
    for _ in 0..4 {
        signal.advance(&timings);
    }
    signal.duration = 2;
    assert_eq!(signal.advance(&timings), Some(SignalState::Yellow));
    assert_eq!(signal.elapsed_time, 0);
}

#[test]
fn test_only_green_allows_departure() {
    let timings = timings();
    assert!(TrafficSignal::with_timings(SignalState::Green, &timings).allows_departure());
    assert!(!TrafficSignal::with_timings(SignalState::Yellow, &timings).allows_departure());
    assert!(!TrafficSignal::with_timings(SignalState::Red, &timings).allows_departure());
}

#[test]
fn test_world_installs_random_signals() {
    let config = SimConfig {
        num_vehicles: 0,
        seed: Some(3),
        ..SimConfig::default()
    };
    let range = config.initial_signal_duration_range.clone();
    let world = SimWorld::create_grid_world(config, 3, 3).unwrap();

    for intersection in world.road_network().intersections() {
        let signal = intersection.signal.as_ref().expect("signal installed");
        assert!(range.contains(&signal.duration));
        assert_eq!(signal.elapsed_time, 0);
    }
}

#[test]
fn test_world_advances_every_signal_each_tick() {
    let config = SimConfig {
        num_vehicles: 0,
        install_signals: false,
        signal_timings: timings(),
        seed: Some(3),
        ..SimConfig::default()
    };
    let mut world = SimWorld::create_grid_world(config, 2, 2).unwrap();
    world.force_signals(SignalState::Red);

    for _ in 0..timings().red - 1 {
        let report = world.tick();
        assert_eq!(report.signal_transitions, 0);
    }
    let report = world.tick();
    assert_eq!(report.signal_transitions, 4);
    for intersection in world.road_network().intersections() {
        assert_eq!(world.signal_state(intersection.id), Some(SignalState::Green));
    }
}
