//! Run output: density history as JSON and a per-run statistics row as CSV

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::simulation::{DensitySnapshot, SimConfig, SimulationStats};

#[derive(Debug, Serialize)]
struct DensityReport<'a> {
    num_vehicles: usize,
    accident_probability: f64,
    traffic_density_data: &'a [DensitySnapshot],
}

/// One row of the run statistics table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatsRow {
    #[serde(rename = "NUM_VEHICLES")]
    pub num_vehicles: usize,
    #[serde(rename = "ACCIDENT_PROBABILITY")]
    pub accident_probability: f64,
    #[serde(rename = "ROAD_CAPACITY")]
    pub road_capacity: usize,
    #[serde(rename = "INTERSECTION_CAPACITY")]
    pub intersection_capacity: usize,
    #[serde(rename = "GREEN_DURATION")]
    pub green_duration: u32,
    #[serde(rename = "YELLOW_DURATION")]
    pub yellow_duration: u32,
    #[serde(rename = "RED_DURATION")]
    pub red_duration: u32,
    #[serde(rename = "Ticks")]
    pub ticks: u64,
    #[serde(rename = "Vehicles Arrived")]
    pub vehicles_arrived: usize,
    #[serde(rename = "Accidents")]
    pub accidents: usize,
    #[serde(rename = "Execution Time (s)")]
    pub execution_time_secs: f64,
}

impl RunStatsRow {
    pub fn new(config: &SimConfig, stats: &SimulationStats, elapsed: Duration) -> Self {
        Self {
            num_vehicles: config.num_vehicles,
            accident_probability: config.accident_probability,
            road_capacity: config.road_capacity,
            intersection_capacity: config.intersection_capacity,
            green_duration: config.signal_timings.green,
            yellow_duration: config.signal_timings.yellow,
            red_duration: config.signal_timings.red,
            ticks: stats.ticks,
            vehicles_arrived: stats.vehicles_arrived,
            accidents: stats.accidents_created,
            execution_time_secs: elapsed.as_secs_f64(),
        }
    }
}

/// Write the density history of a run as pretty-printed JSON
pub fn write_density_json(
    path: &Path,
    config: &SimConfig,
    snapshots: &[DensitySnapshot],
) -> Result<()> {
    let report = DensityReport {
        num_vehicles: config.num_vehicles,
        accident_probability: config.accident_probability,
        traffic_density_data: snapshots,
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create density file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report)
        .with_context(|| format!("Failed to write density data to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Append a statistics row, writing the header first when the file is new
pub fn append_run_stats(path: &Path, row: &RunStatsRow) -> Result<()> {
    let file_exists = path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open stats file {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    writer
        .serialize(row)
        .with_context(|| format!("Failed to append stats to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}
