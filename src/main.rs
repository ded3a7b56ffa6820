use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

use street_grid_sim::loader::{self, StreetGrid};
use street_grid_sim::report::{self, RunStatsRow};
use street_grid_sim::simulation::{
    DensityRecorder, NoopObserver, SignalTimings, SimConfig, SimWorld, TickObserver, TickReport,
    ACCIDENT_PROBABILITY, GREEN_DURATION, INTERSECTION_CAPACITY, NUM_VEHICLES, PROGRESS_STEP,
    RED_DURATION, ROAD_CAPACITY, YELLOW_DURATION,
};

#[derive(Parser)]
#[command(name = "street_grid_sim")]
#[command(about = "Headless street grid traffic simulation")]
struct Cli {
    /// Node table (CSV with "Node ID" and "Name" columns)
    #[arg(long, requires = "links")]
    nodes: Option<PathBuf>,

    /// Link table (CSV with Link_ID, From/To node names and IDs)
    #[arg(long, requires = "nodes")]
    links: Option<PathBuf>,

    /// Grid width used when no node/link tables are given
    #[arg(long, default_value = "9")]
    grid_width: usize,

    /// Grid height used when no node/link tables are given
    #[arg(long, default_value = "8")]
    grid_height: usize,

    /// Number of vehicles to create
    #[arg(long, default_value_t = NUM_VEHICLES)]
    vehicles: usize,

    /// Chance per tick of an accident on a congested road
    #[arg(long, default_value_t = ACCIDENT_PROBABILITY)]
    accident_probability: f64,

    #[arg(long, default_value_t = ROAD_CAPACITY)]
    road_capacity: usize,

    #[arg(long, default_value_t = INTERSECTION_CAPACITY)]
    intersection_capacity: usize,

    /// Green phase length in ticks
    #[arg(long, default_value_t = GREEN_DURATION)]
    green: u32,

    /// Yellow phase length in ticks
    #[arg(long, default_value_t = YELLOW_DURATION)]
    yellow: u32,

    /// Red phase length in ticks
    #[arg(long, default_value_t = RED_DURATION)]
    red: u32,

    /// Fraction of a road a vehicle covers per tick
    #[arg(long, default_value_t = PROGRESS_STEP)]
    progress_step: f64,

    /// Run without traffic signals
    #[arg(long)]
    no_signals: bool,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks even if vehicles are still travelling
    #[arg(long, default_value = "100000")]
    max_ticks: u64,

    /// Print a summary and map every N ticks
    #[arg(long)]
    report_every: Option<u64>,

    /// Write the per-tick density history to this JSON file
    #[arg(long)]
    density_out: Option<PathBuf>,

    /// Record density every N ticks
    #[arg(long, default_value = "1")]
    density_every: u64,

    /// Append run statistics to this CSV file
    #[arg(long)]
    stats_out: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> SimConfig {
        SimConfig {
            num_vehicles: self.vehicles,
            accident_probability: self.accident_probability,
            road_capacity: self.road_capacity,
            intersection_capacity: self.intersection_capacity,
            signal_timings: SignalTimings {
                green: self.green,
                yellow: self.yellow,
                red: self.red,
            },
            progress_step: self.progress_step,
            install_signals: !self.no_signals,
            seed: self.seed,
            ..SimConfig::default()
        }
    }
}

/// Prints the world state at a fixed tick interval
struct ConsoleReporter {
    every: Option<u64>,
}

impl TickObserver for ConsoleReporter {
    fn on_tick(&mut self, world: &SimWorld, report: &TickReport) {
        let Some(every) = self.every.filter(|every| *every > 0) else {
            return;
        };
        if report.tick % every == 0 {
            println!("--- After tick {} ---", report.tick);
            world.print_summary();
            world.draw_map();
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let start_time = Instant::now();
    let config = cli.config();

    let mut world = match (&cli.nodes, &cli.links) {
        (Some(nodes_path), Some(links_path)) => {
            let streets = StreetGrid::default();
            let intersections = loader::read_nodes(nodes_path, &streets)?;
            let roads = loader::read_links(links_path)?;
            SimWorld::from_records(&intersections, &roads, config)
                .context("Failed to build simulation from node and link tables")?
        }
        _ => SimWorld::create_grid_world(config, cli.grid_width, cli.grid_height)
            .context("Failed to build grid simulation")?,
    };

    info!(
        "Running traffic simulation: {} intersections, {} roads, {} vehicles",
        world.road_network().intersection_count(),
        world.road_network().road_count(),
        world.vehicles().len()
    );

    let mut reporter = ConsoleReporter {
        every: cli.report_every,
    };
    let outcome = if cli.density_out.is_some() {
        let mut observers = (DensityRecorder::new(cli.density_every), reporter);
        let outcome = world.run(Some(cli.max_ticks), &mut observers);
        if let Some(path) = &cli.density_out {
            report::write_density_json(path, world.config(), observers.0.snapshots())?;
            info!("Wrote density data to {}", path.display());
        }
        outcome
    } else if cli.report_every.is_some() {
        world.run(Some(cli.max_ticks), &mut reporter)
    } else {
        world.run(Some(cli.max_ticks), &mut NoopObserver)
    };

    let stats = world.stats();
    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks: {}", outcome.ticks);
    info!("Total vehicles: {}", stats.total_vehicles);
    info!("Vehicles arrived: {}", stats.vehicles_arrived);
    info!("Accidents: {}", stats.accidents_created);
    info!("Peak waiting: {}", stats.peak_waiting);
    info!("Success rate: {:.1}%", stats.success_rate());

    if let Some(path) = &cli.stats_out {
        let row = RunStatsRow::new(world.config(), stats, start_time.elapsed());
        report::append_run_stats(path, &row)?;
        info!("Appended run statistics to {}", path.display());
    }

    if cli.report_every.is_some() {
        println!("=== Final State ===");
        world.print_summary();
        world.draw_map();
    }

    Ok(())
}
