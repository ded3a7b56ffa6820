//! Main simulation world that ties everything together
//!
//! One call to [`SimWorld::tick`] applies a full update in a fixed order:
//! signals, vehicles, accident injection, accident aging. Between calls the
//! world is consistent and may be read by observers.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand::SeedableRng;
use std::collections::BTreeMap;

use super::accident::{self, Accident, AccidentSettings, RoadOccupancy};
use super::config::SimConfig;
use super::error::{SimError, SimResult};
use super::observer::TickObserver;
use super::road_network::RoadNetwork;
use super::signal::{SignalState, TrafficSignal};
use super::stats::SimulationStats;
use super::types::{
    GridPosition, IntersectionId, IntersectionRecord, RoadId, RoadRecord, SimId, VehicleId,
    VehicleStatus,
};
use super::vehicle::SimVehicle;
use super::vehicle_manager::{self, VehiclePassSummary};

/// What happened during one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    pub signal_transitions: usize,
    pub vehicles: VehiclePassSummary,
    /// Vehicles per road after this tick's vehicle pass
    pub occupancy: RoadOccupancy,
    pub accidents_created: Vec<RoadId>,
    pub accidents_cleared: Vec<RoadId>,
    pub all_arrived: bool,
}

/// How a call to [`SimWorld::run`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Ticks completed by the world, in total
    pub ticks: u64,
    /// Every vehicle arrived (as opposed to the tick limit being hit)
    pub completed: bool,
}

/// The main simulation world
pub struct SimWorld {
    road_network: RoadNetwork,
    vehicles: Vec<SimVehicle>,
    config: SimConfig,
    accident_settings: AccidentSettings,
    /// Completed ticks
    tick: u64,
    rng: StdRng,
    stats: SimulationStats,
}

impl SimWorld {
    /// Create a world over `road_network` with no vehicles.
    ///
    /// Signals are installed with a random state and first-phase duration
    /// when `config.install_signals` is set.
    pub fn new(road_network: RoadNetwork, config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let accident_settings = AccidentSettings {
            probability: config.accident_probability,
            congestion_threshold: config.accident_congestion_threshold,
            duration_range: config.accident_duration_range.clone(),
        };

        let mut world = Self {
            road_network,
            vehicles: Vec::new(),
            config,
            accident_settings,
            tick: 0,
            rng,
            stats: SimulationStats::default(),
        };

        if world.config.install_signals {
            world.randomize_signals();
        }
        Ok(world)
    }

    /// Create a world and populate it with `config.num_vehicles` vehicles
    /// between random distinct intersections
    pub fn with_random_vehicles(road_network: RoadNetwork, config: SimConfig) -> SimResult<Self> {
        let mut world = Self::new(road_network, config)?;
        world.spawn_random_vehicles(world.config.num_vehicles);
        Ok(world)
    }

    /// Build a world from loader records
    pub fn from_records(
        intersections: &[IntersectionRecord],
        roads: &[RoadRecord],
        config: SimConfig,
    ) -> SimResult<Self> {
        let network = RoadNetwork::from_records(
            intersections,
            roads,
            config.intersection_capacity,
            config.road_capacity,
        )?;
        Self::with_random_vehicles(network, config)
    }

    /// Create a `width x height` grid world with random vehicles
    pub fn create_grid_world(config: SimConfig, width: usize, height: usize) -> SimResult<Self> {
        let network = Self::grid_network(
            width,
            height,
            config.intersection_capacity,
            config.road_capacity,
        )?;
        Self::with_random_vehicles(network, config)
    }

    /// Build a grid of intersections keyed `r{row}c{col}`, with a two-way
    /// road between every pair of orthogonal neighbours
    pub fn grid_network(
        width: usize,
        height: usize,
        intersection_capacity: usize,
        road_capacity: usize,
    ) -> SimResult<RoadNetwork> {
        if width == 0 || height == 0 {
            return Err(SimError::InvalidConfig(format!(
                "grid must have at least one row and column, got {width}x{height}"
            )));
        }

        let mut network = RoadNetwork::new();
        let mut grid = vec![vec![IntersectionId(SimId(0)); width]; height];

        for (row, cells) in grid.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                let key = format!("r{row}c{col}");
                let name = format!("Avenue {col} / Street {row}");
                let position = GridPosition::new(col as i32, row as i32);
                *cell = network.add_intersection(&key, &name, position, intersection_capacity)?;
            }
        }

        // Connect grid horizontally
        for cells in &grid {
            for col in 0..width.saturating_sub(1) {
                network.add_two_way_road(cells[col], cells[col + 1], road_capacity)?;
            }
        }

        // Connect grid vertically
        for row in 0..height.saturating_sub(1) {
            for col in 0..width {
                network.add_two_way_road(grid[row][col], grid[row + 1][col], road_capacity)?;
            }
        }

        Ok(network)
    }

    /// Give every intersection a signal in a random phase
    pub fn randomize_signals(&mut self) {
        let range = self.config.initial_signal_duration_range.clone();
        for intersection in self.road_network.intersections_mut() {
            let state = *SignalState::ALL
                .choose(&mut self.rng)
                .unwrap_or(&SignalState::Red);
            let duration = self.rng.random_range(range.clone());
            intersection.signal = Some(TrafficSignal::new(state, duration));
        }
    }

    /// Remove every signal; vehicles then never wait at intersections
    pub fn clear_signals(&mut self) {
        for intersection in self.road_network.intersections_mut() {
            intersection.signal = None;
        }
    }

    /// Put every intersection's signal at the start of a standard `state` phase
    pub fn force_signals(&mut self, state: SignalState) {
        let timings = self.config.signal_timings;
        for intersection in self.road_network.intersections_mut() {
            intersection.signal = Some(TrafficSignal::with_timings(state, &timings));
        }
    }

    /// Replace the signal of a single intersection
    pub fn set_signal(
        &mut self,
        intersection_id: IntersectionId,
        signal: Option<TrafficSignal>,
    ) -> SimResult<()> {
        let intersection = self
            .road_network
            .intersection_mut(intersection_id)
            .ok_or_else(|| SimError::UnknownNode(format!("#{}", intersection_id.index())))?;
        intersection.signal = signal;
        Ok(())
    }

    /// Spawn `count` vehicles between random distinct intersections
    pub fn spawn_random_vehicles(&mut self, count: usize) {
        let mut spawned =
            vehicle_manager::spawn_random_vehicles(count, &mut self.road_network, &mut self.rng);

        let offset = self.vehicles.len();
        for (index, vehicle) in spawned.iter_mut().enumerate() {
            vehicle.id = VehicleId(SimId(offset + index));
        }
        self.stats.total_vehicles += spawned.len();
        self.vehicles.extend(spawned);
    }

    /// Spawn a vehicle routed along a shortest path between two intersections
    pub fn spawn_vehicle(&mut self, from_key: &str, to_key: &str) -> SimResult<VehicleId> {
        let id = VehicleId(SimId(self.vehicles.len()));
        let label = format!("V{}", id.index() + 1);
        let vehicle =
            vehicle_manager::spawn_vehicle(id, &label, from_key, to_key, &mut self.road_network)?;
        self.stats.total_vehicles += 1;
        self.vehicles.push(vehicle);
        Ok(id)
    }

    /// Add a vehicle following an explicit path of connected intersections
    pub fn add_vehicle_on_path(&mut self, path: Vec<IntersectionId>) -> SimResult<VehicleId> {
        let id = VehicleId(SimId(self.vehicles.len()));
        let vehicle = SimVehicle::new(id, format!("V{}", id.index() + 1), path, &self.road_network)?;
        self.stats.total_vehicles += 1;
        self.vehicles.push(vehicle);
        Ok(id)
    }

    /// Place an accident on a road, as the accident pass would.
    ///
    /// Returns `false` and leaves the road alone when it already has one.
    pub fn place_accident(
        &mut self,
        road_id: RoadId,
        position: f64,
        duration: u32,
    ) -> SimResult<bool> {
        let tick = self.tick;
        let road = self
            .road_network
            .road_mut(road_id)
            .ok_or_else(|| SimError::UnknownNode(format!("road #{}", road_id.index())))?;
        if road.accident.is_some() {
            return Ok(false);
        }
        if !(0.0..1.0).contains(&position) || duration == 0 {
            return Err(SimError::InvalidConfig(format!(
                "accident at {position} for {duration} ticks is out of range"
            )));
        }
        road.accident = Some(Accident::new(road_id, position, duration, tick));
        self.stats.accidents_created += 1;
        Ok(true)
    }

    /// Advance the simulation by one tick
    pub fn tick(&mut self) -> TickReport {
        let tick = self.tick + 1;

        // (a) signals
        let timings = self.config.signal_timings;
        let signal_transitions = self
            .road_network
            .intersections_mut()
            .filter_map(|intersection| intersection.update_signal(&timings))
            .count();

        // (b) vehicles, against a shared borrow of the network
        let vehicles = vehicle_manager::update_vehicles(
            &mut self.vehicles,
            &self.road_network,
            self.config.progress_step,
        );

        // (c) occupancy, queues and new accidents
        self.refresh_queues(&vehicles.held_at);
        let occupancy = RoadOccupancy::compute(&self.vehicles);
        let accidents_created = accident::inject_accidents(
            &mut self.road_network,
            &occupancy,
            &self.accident_settings,
            &mut self.rng,
            tick,
        );

        // (d) accident lifetimes
        let accidents_cleared = accident::age_accidents(&mut self.road_network, tick);

        self.tick = tick;
        self.stats.ticks = tick;
        self.stats.vehicles_arrived = self
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.has_arrived())
            .count();
        self.stats.accidents_created += accidents_created.len();
        self.stats.accidents_cleared += accidents_cleared.len();
        self.stats.peak_waiting = self.stats.peak_waiting.max(vehicles.waiting);

        TickReport {
            tick,
            signal_transitions,
            vehicles,
            occupancy,
            accidents_created,
            accidents_cleared,
            all_arrived: self.is_complete(),
        }
    }

    fn refresh_queues(&mut self, held_at: &BTreeMap<IntersectionId, Vec<VehicleId>>) {
        for intersection in self.road_network.intersections_mut() {
            intersection.queue.clear();
            if let Some(held) = held_at.get(&intersection.id) {
                intersection.queue.extend_from_slice(held);
            }
            if intersection.is_over_capacity() {
                debug!(
                    "Intersection {} holds {} vehicles (capacity {})",
                    intersection.key,
                    intersection.queue.len(),
                    intersection.capacity
                );
            }
        }
    }

    /// Whether every vehicle has arrived
    pub fn is_complete(&self) -> bool {
        self.vehicles.iter().all(SimVehicle::has_arrived)
    }

    /// Tick until every vehicle arrives or `max_ticks` more ticks have run
    pub fn run<O: TickObserver>(&mut self, max_ticks: Option<u64>, observer: &mut O) -> RunOutcome {
        let mut ticks_run = 0u64;
        while !self.is_complete() {
            if max_ticks.is_some_and(|max| ticks_run >= max) {
                break;
            }
            let report = self.tick();
            observer.on_tick(self, &report);
            ticks_run += 1;
        }

        let completed = self.is_complete();
        if completed {
            info!("All vehicles have arrived after {} ticks", self.tick);
        } else {
            warn!(
                "Stopped after {} ticks with {} vehicles still travelling",
                self.tick,
                self.vehicles
                    .iter()
                    .filter(|vehicle| !vehicle.has_arrived())
                    .count()
            );
        }
        observer.on_complete(self, self.tick);

        RunOutcome {
            ticks: self.tick,
            completed,
        }
    }

    pub fn road_network(&self) -> &RoadNetwork {
        &self.road_network
    }

    pub fn vehicles(&self) -> &[SimVehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.get(id.index())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Completed ticks
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Signal state of an intersection, `None` when it has no signal
    pub fn signal_state(&self, intersection_id: IntersectionId) -> Option<SignalState> {
        self.road_network
            .intersection(intersection_id)
            .and_then(|intersection| intersection.signal_state())
    }

    /// Accident on a road, if any
    pub fn accident_on(&self, road_id: RoadId) -> Option<&Accident> {
        self.road_network
            .road(road_id)
            .and_then(|road| road.accident.as_ref())
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        let moving = self
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.status == VehicleStatus::Moving)
            .count();
        let waiting = self
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.status == VehicleStatus::Waiting)
            .count();
        let arrived = self.vehicles.len() - moving - waiting;

        println!("=== Traffic Simulation Summary ===");
        println!("Tick: {}", self.tick);
        println!(
            "Intersections: {}, Roads: {}",
            self.road_network.intersection_count(),
            self.road_network.road_count()
        );
        println!(
            "Vehicles: {} (moving {}, waiting {}, arrived {})",
            self.vehicles.len(),
            moving,
            waiting,
            arrived
        );

        let accidents: Vec<_> = self
            .road_network
            .roads()
            .iter()
            .filter_map(|road| road.accident.as_ref().map(|accident| (road, accident)))
            .collect();
        if !accidents.is_empty() {
            println!("--- Accidents ---");
            for (road, accident) in accidents {
                println!(
                    "  {}: at {:.2}, {}/{} ticks",
                    road.name, accident.position, accident.elapsed_time, accident.duration
                );
            }
        }
    }

    /// Render the world as text: intersections show their signal
    /// (`R`/`G`/`Y`, `+` without one), `!` marks an accident and `o` a vehicle
    pub fn render_map(&self) -> String {
        const X_SCALE: i32 = 4;
        const Y_SCALE: i32 = 2;

        let positions: Vec<GridPosition> = self
            .road_network
            .intersections()
            .iter()
            .map(|intersection| intersection.position)
            .collect();
        let (Some(min_x), Some(max_x), Some(min_y), Some(max_y)) = (
            positions.iter().map(|p| p.x).min(),
            positions.iter().map(|p| p.x).max(),
            positions.iter().map(|p| p.y).min(),
            positions.iter().map(|p| p.y).max(),
        ) else {
            return String::new();
        };

        let width = ((max_x - min_x) * X_SCALE + 1) as usize;
        let height = ((max_y - min_y) * Y_SCALE + 1) as usize;
        let mut grid = vec![vec![' '; width]; height];

        // Helper to convert grid coords to character cells
        let to_cell = |x: f64, y: f64| -> (usize, usize) {
            let col = ((x - min_x as f64) * X_SCALE as f64).round() as usize;
            let row = ((y - min_y as f64) * Y_SCALE as f64).round() as usize;
            (row.min(height - 1), col.min(width - 1))
        };
        let point = |id: IntersectionId| {
            self.road_network
                .intersection(id)
                .map(|intersection| intersection.position)
                .unwrap_or_default()
        };

        // Draw roads
        for road in self.road_network.roads() {
            let (start, end) = (point(road.from), point(road.to));
            let steps = ((end.x - start.x).abs() * X_SCALE).max((end.y - start.y).abs() * Y_SCALE);
            let glyph = match (start.x == end.x, start.y == end.y) {
                (true, _) => '|',
                (_, true) => '-',
                _ => '.',
            };
            for step in 0..=steps {
                let (x, y) = start.lerp(&end, step as f64 / steps.max(1) as f64);
                let (row, col) = to_cell(x, y);
                if grid[row][col] == ' ' {
                    grid[row][col] = glyph;
                }
            }
        }

        // Draw vehicles
        for vehicle in self.vehicles.iter().filter(|vehicle| !vehicle.has_arrived()) {
            let from = point(vehicle.current_node());
            let to = point(vehicle.path()[vehicle.position + 1]);
            let (x, y) = from.lerp(&to, vehicle.progress);
            let (row, col) = to_cell(x, y);
            grid[row][col] = 'o';
        }

        // Draw accidents
        for road in self.road_network.roads() {
            if let Some(accident) = &road.accident {
                let (x, y) = point(road.from).lerp(&point(road.to), accident.position);
                let (row, col) = to_cell(x, y);
                grid[row][col] = '!';
            }
        }

        // Draw intersections
        for intersection in self.road_network.intersections() {
            let position = intersection.position;
            let (row, col) = to_cell(position.x as f64, position.y as f64);
            grid[row][col] = intersection
                .signal_state()
                .map_or('+', SignalState::symbol);
        }

        let mut map = String::new();
        for row in &grid {
            let line: String = row.iter().collect();
            map.push_str(line.trim_end());
            map.push('\n');
        }
        map
    }

    /// Draw a visual map of the world in the terminal
    pub fn draw_map(&self) {
        println!("\n=== World Map ===");
        println!("Legend: R/G/Y=Signal, +=Intersection, o=Vehicle, !=Accident");
        println!();
        print!("{}", self.render_map());
        println!();
    }
}
