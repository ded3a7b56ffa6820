//! Node/link table parsing and run report output

use std::fs;
use std::time::Duration;

use street_grid_sim::loader::{self, StreetGrid};
use street_grid_sim::report::{self, RunStatsRow};
use street_grid_sim::simulation::{
    DensityRecorder, GridPosition, NoopObserver, RoadNetwork, SimConfig, SimError, SimWorld,
};

const NODES: &str = "\
Node ID,Name
n1,Wells / Madison
n2, Clark / Madison
n3,Clark / Washington
";

const LINKS: &str = "\
Link_ID,From_Node_Name,To_Node_Name,From_Node_ID,To_Node_ID
l1,Wells / Madison,Clark / Madison,n1,n2
l2,Clark / Madison,Clark / Washington,n2,n3
l3,Clark / Washington,Wells / Madison,n3,n1
";

#[test]
fn test_parse_nodes_places_streets_on_grid() {
    let nodes = loader::parse_nodes(NODES.as_bytes(), &StreetGrid::default()).unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].key, "n1");
    assert_eq!(nodes[0].name, "Wells / Madison");
    assert_eq!(nodes[0].position, GridPosition::new(2, 3));
    assert_eq!(nodes[1].key, "n2");
    assert_eq!(nodes[1].position, GridPosition::new(4, 3));
    assert_eq!(nodes[2].position, GridPosition::new(4, 4));
}

#[test]
fn test_unknown_street_is_rejected() {
    let streets = StreetGrid::default();
    let csv = "Node ID,Name\nn1,Wells / Nowhere\n";
    assert!(loader::parse_nodes(csv.as_bytes(), &streets).is_err());

    let csv = "Node ID,Name\nn1,Wells and Madison\n";
    assert!(loader::parse_nodes(csv.as_bytes(), &streets).is_err());
}

#[test]
fn test_custom_street_grid() {
    let streets = StreetGrid::new(&["West", "East"], &["South", "North"]);
    assert_eq!(
        streets.locate("East / North").unwrap(),
        GridPosition::new(1, 1)
    );
    assert!(streets.locate("Wells / Madison").is_err());
}

#[test]
fn test_links_build_named_roads() {
    let nodes = loader::parse_nodes(NODES.as_bytes(), &StreetGrid::default()).unwrap();
    let links = loader::parse_links(LINKS.as_bytes()).unwrap();
    assert_eq!(links.len(), 3);
    assert_eq!(links[0].from_key, "n1");
    assert_eq!(links[0].to_key, "n2");

    let mut network = RoadNetwork::from_records(&nodes, &links, 5, 10).unwrap();
    assert_eq!(network.intersection_count(), 3);
    assert_eq!(network.road_count(), 3);
    assert_eq!(network.roads()[0].name, "Wells / Madison to Clark / Madison");

    // One-way loop: n2 reaches n1 only through n3
    let path = network.find_path("n2", "n1").unwrap();
    assert_eq!(path.len(), 3);
}

#[test]
fn test_link_to_missing_node_is_rejected() {
    let nodes = loader::parse_nodes(NODES.as_bytes(), &StreetGrid::default()).unwrap();
    let csv = "\
Link_ID,From_Node_Name,To_Node_Name,From_Node_ID,To_Node_ID
l9,Wells / Madison,Somewhere,n1,n9
";
    let links = loader::parse_links(csv.as_bytes()).unwrap();
    assert_eq!(
        RoadNetwork::from_records(&nodes, &links, 5, 10).err(),
        Some(SimError::UnresolvedReference {
            road: "l9".to_string(),
            endpoint: "n9".to_string(),
        })
    );
}

#[test]
fn test_read_tables_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let nodes_path = dir.path().join("nodes.csv");
    let links_path = dir.path().join("links.csv");
    fs::write(&nodes_path, NODES).unwrap();
    fs::write(&links_path, LINKS).unwrap();

    let nodes = loader::read_nodes(&nodes_path, &StreetGrid::default()).unwrap();
    let links = loader::read_links(&links_path).unwrap();
    let config = SimConfig {
        num_vehicles: 5,
        install_signals: false,
        accident_probability: 0.0,
        seed: Some(4),
        ..SimConfig::default()
    };
    let mut world = SimWorld::from_records(&nodes, &links, config).unwrap();
    assert_eq!(world.vehicles().len(), 5);
    assert!(world.run(Some(1_000), &mut NoopObserver).completed);

    assert!(loader::read_nodes(&dir.path().join("missing.csv"), &StreetGrid::default()).is_err());
}

#[test]
fn test_density_report_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("density.json");

    let config = SimConfig {
        num_vehicles: 0,
        accident_probability: 0.0,
        install_signals: false,
        seed: Some(2),
        ..SimConfig::default()
    };
    let network = SimWorld::grid_network(2, 1, 5, 10).unwrap();
    let mut world = SimWorld::new(network, config).unwrap();
    world.spawn_vehicle("r0c0", "r0c1").unwrap();
    let mut recorder = DensityRecorder::new(50);
    world.run(None, &mut recorder);

    report::write_density_json(&path, world.config(), recorder.snapshots()).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(json["num_vehicles"], 0);
    assert_eq!(json["accident_probability"], 0.0);
    let data = json["traffic_density_data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["time_step"], 50);
    assert_eq!(data[0]["r0c0->r0c1"]["density"], 0.1);
    assert_eq!(data[0]["r0c0->r0c1"]["accident"], false);
    assert_eq!(
        data[0]["r0c1->r0c0"]["name"],
        "Avenue 1 / Street 0 to Avenue 0 / Street 0"
    );
}

#[test]
fn test_run_stats_append() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.csv");

    let config = SimConfig::default();
    let network = SimWorld::grid_network(2, 2, 5, 10).unwrap();
    let world = SimWorld::new(network, config).unwrap();
    let row = RunStatsRow::new(world.config(), world.stats(), Duration::from_millis(1500));
    assert_eq!(row.num_vehicles, 1000);
    assert_eq!(row.execution_time_secs, 1.5);

    report::append_run_stats(&path, &row).unwrap();
    report::append_run_stats(&path, &row).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "NUM_VEHICLES,ACCIDENT_PROBABILITY,ROAD_CAPACITY,INTERSECTION_CAPACITY,\
GREEN_DURATION,YELLOW_DURATION,RED_DURATION,Ticks,Vehicles Arrived,Accidents,Execution Time (s)"
    );
    assert_eq!(lines[1], lines[2]);
    assert!(lines[1].starts_with("1000,0.001,10,5,60,30,60,0,0,0,1.5"));
}
