//! Accident injection, lifetime and road occupancy tests

use street_grid_sim::simulation::{NoopObserver, RoadOccupancy, SimConfig, SimWorld};

fn row_world(config: SimConfig, length: usize) -> SimWorld {
    let network = SimWorld::grid_network(length, 1, 5, 10).unwrap();
    SimWorld::new(network, config).unwrap()
}

fn no_accidents() -> SimConfig {
    SimConfig {
        num_vehicles: 0,
        accident_probability: 0.0,
        install_signals: false,
        seed: Some(5),
        ..SimConfig::default()
    }
}

#[test]
fn test_accident_lives_exactly_its_duration() {
    let mut world = row_world(no_accidents(), 2);
    let road = world.road_network().roads()[0].id;
    assert!(world.place_accident(road, 0.5, 3).unwrap());

    for tick in 1..3 {
        let report = world.tick();
        assert!(report.accidents_cleared.is_empty(), "tick {tick}");
        assert_eq!(world.accident_on(road).unwrap().elapsed_time, tick);
    }

    let report = world.tick();
    assert_eq!(report.accidents_cleared, vec![road]);
    assert!(world.accident_on(road).is_none());
    assert_eq!(world.stats().accidents_created, 1);
    assert_eq!(world.stats().accidents_cleared, 1);
}

#[test]
fn test_one_accident_per_road() {
    let mut world = row_world(no_accidents(), 2);
    let road = world.road_network().roads()[0].id;
    assert!(world.place_accident(road, 0.5, 10).unwrap());
    assert!(!world.place_accident(road, 0.1, 20).unwrap());

    let accident = world.accident_on(road).unwrap();
    assert_eq!(accident.position, 0.5);
    assert_eq!(accident.duration, 10);
    assert_eq!(world.road_network().active_accident_count(), 1);
}

#[test]
fn test_invalid_accident_is_rejected() {
    let mut world = row_world(no_accidents(), 2);
    let road = world.road_network().roads()[0].id;
    assert!(world.place_accident(road, 1.0, 10).is_err());
    assert!(world.place_accident(road, 0.5, 0).is_err());
    assert!(world.accident_on(road).is_none());
}

#[test]
fn test_congested_road_gets_accident() {
    let config = SimConfig {
        accident_probability: 1.0,
        accident_duration_range: 5..=5,
        ..no_accidents()
    };
    let mut world = row_world(config, 3);
    let first = world.spawn_vehicle("r0c0", "r0c2").unwrap();
    world.spawn_vehicle("r0c0", "r0c2").unwrap();
    let road = world.vehicle(first).unwrap().current_road().unwrap();

    let report = world.tick();
    assert_eq!(report.occupancy.count(road), 2);
    assert_eq!(report.accidents_created, vec![road]);
    let accident = world.accident_on(road).unwrap();
    assert_eq!(accident.duration, 5);
    assert_eq!(accident.created_at, 1);
    assert_eq!(accident.elapsed_time, 0);
    assert_eq!(world.road_network().active_accident_count(), 1);

    // No second accident while the first is active
    for _ in 2..=5 {
        let report = world.tick();
        assert!(report.accidents_created.is_empty());
        assert!(world.accident_on(road).is_some());
    }

    let report = world.tick();
    assert_eq!(report.accidents_cleared, vec![road]);
    assert!(world.accident_on(road).is_none());
}

#[test]
fn test_single_vehicle_never_causes_accident() {
    let config = SimConfig {
        accident_probability: 1.0,
        ..no_accidents()
    };
    let mut world = row_world(config, 3);
    world.spawn_vehicle("r0c0", "r0c2").unwrap();

    let outcome = world.run(Some(1_000), &mut NoopObserver);
    assert!(outcome.completed);
    assert_eq!(outcome.ticks, 200);
    assert_eq!(world.stats().accidents_created, 0);
}

#[test]
fn test_zero_probability_never_causes_accident() {
    let config = SimConfig {
        num_vehicles: 80,
        seed: Some(17),
        ..no_accidents()
    };
    let mut world = SimWorld::create_grid_world(config, 3, 3).unwrap();

    for _ in 0..300 {
        let report = world.tick();
        assert!(report.accidents_created.is_empty());
    }
    assert_eq!(world.road_network().active_accident_count(), 0);
    assert_eq!(world.stats().accidents_created, 0);
}

#[test]
fn test_occupancy_orders_vehicles_by_progress() {
    let mut world = row_world(no_accidents(), 3);
    let ahead = world.spawn_vehicle("r0c0", "r0c2").unwrap();
    for _ in 0..10 {
        world.tick();
    }
    let behind = world.spawn_vehicle("r0c0", "r0c2").unwrap();
    let report = world.tick();

    let road = world.vehicle(ahead).unwrap().current_road().unwrap();
    assert_eq!(report.occupancy.count(road), 2);
    assert_eq!(report.occupancy.vehicles_on(road), vec![behind, ahead]);
    assert_eq!(report.occupancy.lead_vehicle(road), Some(ahead));
    assert_eq!(report.occupancy.total_vehicles(), 2);

    let recomputed = RoadOccupancy::compute(world.vehicles());
    assert_eq!(recomputed.vehicles_on(road), report.occupancy.vehicles_on(road));
    assert_eq!(recomputed.iter().collect::<Vec<_>>(), vec![(road, 2)]);
}
