//! Graph input from CSV node and link tables
//!
//! Node names have the form `"<x street> / <y street>"`; each street name is
//! looked up in a [`StreetGrid`] to place the intersection on the grid.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::simulation::{GridPosition, IntersectionRecord, RoadRecord};

/// Streets running north-south, west to east
const X_STREETS: [&str; 9] = [
    "N Wacker", "Franklin", "Wells", "Lasalle", "Clark", "Dearborn", "State", "Wabash", "Michigan",
];

/// Streets running east-west, south to north
const Y_STREETS: [&str; 8] = [
    "Jackson",
    "Adams",
    "Monroe",
    "Madison",
    "Washington",
    "Randolph",
    "Lake",
    "W Wacker",
];

/// Maps street names onto grid axes
#[derive(Debug, Clone)]
pub struct StreetGrid {
    x_streets: HashMap<String, i32>,
    y_streets: HashMap<String, i32>,
}

impl Default for StreetGrid {
    fn default() -> Self {
        Self::new(&X_STREETS, &Y_STREETS)
    }
}

impl StreetGrid {
    /// Streets are numbered in the order given, from 0
    pub fn new(x_streets: &[&str], y_streets: &[&str]) -> Self {
        let index = |streets: &[&str]| {
            streets
                .iter()
                .enumerate()
                .map(|(i, street)| (street.to_string(), i as i32))
                .collect()
        };
        Self {
            x_streets: index(x_streets),
            y_streets: index(y_streets),
        }
    }

    /// Place a `"<x street> / <y street>"` name on the grid
    pub fn locate(&self, name: &str) -> Result<GridPosition> {
        let (x_street, y_street) = name
            .split_once(" / ")
            .ok_or_else(|| anyhow!("intersection name {name:?} is not \"<street> / <street>\""))?;

        let x = self.x_streets.get(x_street.trim());
        let y = self.y_streets.get(y_street.trim());
        match (x, y) {
            (Some(x), Some(y)) => Ok(GridPosition::new(*x, *y)),
            _ => bail!("unknown street names in node: {name}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NodeRow {
    #[serde(rename = "Node ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct LinkRow {
    #[serde(rename = "Link_ID")]
    id: String,
    #[serde(rename = "From_Node_Name")]
    from_name: String,
    #[serde(rename = "To_Node_Name")]
    to_name: String,
    #[serde(rename = "From_Node_ID")]
    from_id: String,
    #[serde(rename = "To_Node_ID")]
    to_id: String,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Parse intersection records from a node table
pub fn parse_nodes<R: Read>(reader: R, streets: &StreetGrid) -> Result<Vec<IntersectionRecord>> {
    let mut records = Vec::new();
    for (line, row) in csv_reader(reader).deserialize::<NodeRow>().enumerate() {
        let row = row.with_context(|| format!("malformed node record {}", line + 1))?;
        let position = streets.locate(&row.name)?;
        records.push(IntersectionRecord {
            key: row.id,
            name: row.name,
            position,
        });
    }
    Ok(records)
}

/// Parse road records from a link table
pub fn parse_links<R: Read>(reader: R) -> Result<Vec<RoadRecord>> {
    csv_reader(reader)
        .deserialize::<LinkRow>()
        .enumerate()
        .map(|(line, row)| {
            let row = row.with_context(|| format!("malformed link record {}", line + 1))?;
            Ok(RoadRecord {
                key: row.id,
                from_name: row.from_name,
                to_name: row.to_name,
                from_key: row.from_id,
                to_key: row.to_id,
            })
        })
        .collect()
}

/// Read intersection records from a node CSV file
pub fn read_nodes(path: &Path, streets: &StreetGrid) -> Result<Vec<IntersectionRecord>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open nodes file {}", path.display()))?;
    parse_nodes(file, streets).with_context(|| format!("Failed to read nodes from {}", path.display()))
}

/// Read road records from a link CSV file
pub fn read_links(path: &Path) -> Result<Vec<RoadRecord>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open links file {}", path.display()))?;
    parse_links(file).with_context(|| format!("Failed to read links from {}", path.display()))
}
