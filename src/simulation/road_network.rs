//! Road network graph and shortest-path routing
//!
//! Intersections and roads live in arenas indexed by `IntersectionId` and
//! `RoadId`; the petgraph graph mirrors the topology for routing. Topology is
//! fixed once the network is built, only per-node signal/queue state and
//! per-road accident state change during a run.

use log::debug;
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use super::accident::Accident;
use super::error::{SimError, SimResult};
use super::intersection::SimIntersection;
use super::types::{GridPosition, IntersectionId, IntersectionRecord, RoadId, RoadRecord, SimId};

/// Edge data for the road network graph
#[derive(Debug, Clone, Copy)]
pub struct RoadEdge {
    pub road_id: RoadId,
}

/// A directed road segment connecting two intersections
#[derive(Debug, Clone)]
pub struct SimRoad {
    pub id: RoadId,
    /// Stable key from the input data
    pub key: String,
    pub name: String,
    pub from: IntersectionId,
    pub to: IntersectionId,
    /// Informational capacity, used as the density denominator
    pub capacity: usize,
    /// At most one active accident
    pub accident: Option<Accident>,
}

impl SimRoad {
    pub fn has_accident(&self) -> bool {
        self.accident.is_some()
    }
}

/// Road network: owns every intersection and road of a run
#[derive(Debug, Default)]
pub struct RoadNetwork {
    /// The underlying petgraph directed graph (one edge per road)
    graph: DiGraph<IntersectionId, RoadEdge>,

    /// Maps intersection IDs to their node indices in the graph
    intersection_to_node: HashMap<IntersectionId, NodeIndex>,

    /// Maps node indices back to intersection IDs
    node_to_intersection: HashMap<NodeIndex, IntersectionId>,

    /// Maps input keys to intersection IDs
    key_to_intersection: HashMap<String, IntersectionId>,

    intersections: Vec<SimIntersection>,

    roads: Vec<SimRoad>,

    /// Cached path results
    path_cache: HashMap<IntersectionId, HashMap<IntersectionId, Vec<IntersectionId>>>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a network from loader records.
    ///
    /// All intersections are registered first, then every road's endpoint
    /// keys are resolved against them.
    pub fn from_records(
        intersections: &[IntersectionRecord],
        roads: &[RoadRecord],
        intersection_capacity: usize,
        road_capacity: usize,
    ) -> SimResult<Self> {
        let mut network = Self::new();
        for record in intersections {
            network.add_intersection(
                &record.key,
                &record.name,
                record.position,
                intersection_capacity,
            )?;
        }
        network.resolve_endpoints(roads, road_capacity)?;
        Ok(network)
    }

    /// Adds an intersection to the network graph
    pub fn add_intersection(
        &mut self,
        key: &str,
        name: &str,
        position: GridPosition,
        capacity: usize,
    ) -> SimResult<IntersectionId> {
        if self.key_to_intersection.contains_key(key) {
            return Err(SimError::DuplicateIntersection(key.to_string()));
        }

        let id = IntersectionId(SimId(self.intersections.len()));
        let node_index = self.graph.add_node(id);
        self.intersection_to_node.insert(id, node_index);
        self.node_to_intersection.insert(node_index, id);
        self.key_to_intersection.insert(key.to_string(), id);
        self.intersections
            .push(SimIntersection::new(id, key, name, position, capacity));
        self.path_cache.clear();
        Ok(id)
    }

    /// Attach every road record to its endpoint intersections.
    ///
    /// Fails on the first endpoint key that is not a known intersection.
    pub fn resolve_endpoints(
        &mut self,
        records: &[RoadRecord],
        capacity: usize,
    ) -> SimResult<Vec<RoadId>> {
        let mut added = Vec::with_capacity(records.len());
        for record in records {
            let from = self.resolve_key(&record.key, &record.from_key)?;
            let to = self.resolve_key(&record.key, &record.to_key)?;
            let name = format!("{} to {}", record.from_name, record.to_name);
            added.push(self.add_road(&record.key, &name, from, to, capacity)?);
        }
        debug!(
            "Resolved {} roads across {} intersections",
            added.len(),
            self.intersections.len()
        );
        Ok(added)
    }

    fn resolve_key(&self, road: &str, endpoint: &str) -> SimResult<IntersectionId> {
        self.key_to_intersection
            .get(endpoint)
            .copied()
            .ok_or_else(|| SimError::UnresolvedReference {
                road: road.to_string(),
                endpoint: endpoint.to_string(),
            })
    }

    /// Adds a road to the network and updates the graph adjacency
    pub fn add_road(
        &mut self,
        key: &str,
        name: &str,
        from: IntersectionId,
        to: IntersectionId,
        capacity: usize,
    ) -> SimResult<RoadId> {
        let start_node = self.node_index(from)?;
        let end_node = self.node_index(to)?;

        let id = RoadId(SimId(self.roads.len()));
        self.graph
            .add_edge(start_node, end_node, RoadEdge { road_id: id });
        self.roads.push(SimRoad {
            id,
            key: key.to_string(),
            name: name.to_string(),
            from,
            to,
            capacity,
            accident: None,
        });

        self.path_cache.clear();
        Ok(id)
    }

    /// Add a road in each direction between two intersections
    pub fn add_two_way_road(
        &mut self,
        a: IntersectionId,
        b: IntersectionId,
        capacity: usize,
    ) -> SimResult<(RoadId, RoadId)> {
        let a_key = self.key_of(a)?;
        let b_key = self.key_of(b)?;
        let a_name = self.intersections[a.index()].name.clone();
        let b_name = self.intersections[b.index()].name.clone();

        let forward = self.add_road(
            &format!("{a_key}->{b_key}"),
            &format!("{a_name} to {b_name}"),
            a,
            b,
            capacity,
        )?;
        let backward = self.add_road(
            &format!("{b_key}->{a_key}"),
            &format!("{b_name} to {a_name}"),
            b,
            a,
            capacity,
        )?;
        Ok((forward, backward))
    }

    fn key_of(&self, id: IntersectionId) -> SimResult<String> {
        self.intersection(id)
            .map(|intersection| intersection.key.clone())
            .ok_or_else(|| SimError::UnknownNode(format!("#{}", id.index())))
    }

    fn node_index(&self, id: IntersectionId) -> SimResult<NodeIndex> {
        self.intersection_to_node
            .get(&id)
            .copied()
            .ok_or_else(|| SimError::UnknownNode(format!("#{}", id.index())))
    }

    /// Look up an intersection by its input key
    pub fn intersection_by_key(&self, key: &str) -> Option<IntersectionId> {
        self.key_to_intersection.get(key).copied()
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&SimIntersection> {
        self.intersections.get(id.index())
    }

    pub fn intersection_mut(&mut self, id: IntersectionId) -> Option<&mut SimIntersection> {
        self.intersections.get_mut(id.index())
    }

    pub fn intersections(&self) -> &[SimIntersection] {
        &self.intersections
    }

    pub fn intersections_mut(&mut self) -> impl Iterator<Item = &mut SimIntersection> {
        self.intersections.iter_mut()
    }

    pub fn road(&self, id: RoadId) -> Option<&SimRoad> {
        self.roads.get(id.index())
    }

    pub fn road_mut(&mut self, id: RoadId) -> Option<&mut SimRoad> {
        self.roads.get_mut(id.index())
    }

    pub fn roads(&self) -> &[SimRoad] {
        &self.roads
    }

    pub fn roads_mut(&mut self) -> impl Iterator<Item = &mut SimRoad> {
        self.roads.iter_mut()
    }

    /// Gets all roads leaving a specific intersection, with their far ends
    pub fn neighbors(&self, intersection_id: IntersectionId) -> Vec<(RoadId, IntersectionId)> {
        let Some(node_index) = self.intersection_to_node.get(&intersection_id) else {
            return Vec::new();
        };

        let mut connections: Vec<_> = self
            .graph
            .edges(*node_index)
            .map(|edge| {
                let next_intersection = self.node_to_intersection[&edge.target()];
                (edge.weight().road_id, next_intersection)
            })
            .collect();
        connections.sort();
        connections
    }

    /// Finds the road connecting two intersections.
    /// With parallel roads the earliest added one wins.
    pub fn find_road_between(&self, from: IntersectionId, to: IntersectionId) -> Option<RoadId> {
        let from_node = self.intersection_to_node.get(&from)?;
        let to_node = self.intersection_to_node.get(&to)?;

        self.graph
            .edges(*from_node)
            .filter(|edge| edge.target() == *to_node)
            .map(|edge| edge.weight().road_id)
            .min()
    }

    /// Finds a shortest path between two intersections given by key.
    ///
    /// The returned path starts with `start` and ends with `end`.
    pub fn find_path(&mut self, start: &str, end: &str) -> SimResult<Vec<IntersectionId>> {
        let start_id = self
            .intersection_by_key(start)
            .ok_or_else(|| SimError::UnknownNode(start.to_string()))?;
        let end_id = self
            .intersection_by_key(end)
            .ok_or_else(|| SimError::UnknownNode(end.to_string()))?;
        self.find_path_between(start_id, end_id)
    }

    /// Finds a path between two intersections using A* with unit road costs
    /// and a null heuristic, i.e. Dijkstra over hop counts.
    ///
    /// Equal-length alternatives are decided by petgraph's search order over
    /// the road insertion order, so the answer is stable for a given network.
    pub fn find_path_between(
        &mut self,
        start: IntersectionId,
        end: IntersectionId,
    ) -> SimResult<Vec<IntersectionId>> {
        let start_node = self.node_index(start)?;
        let end_node = self.node_index(end)?;

        if start == end {
            return Ok(vec![start]);
        }

        // Check cache first
        if let Some(path) = self
            .path_cache
            .get(&start)
            .and_then(|cached_paths| cached_paths.get(&end))
        {
            return Ok(path.clone());
        }

        let (_, node_path) = astar(
            &self.graph,
            start_node,
            |node| node == end_node,
            |_| 1u32,
            |_| 0,
        )
        .ok_or_else(|| SimError::NoPathFound {
            from: self.intersections[start.index()].key.clone(),
            to: self.intersections[end.index()].key.clone(),
        })?;

        let path: Vec<IntersectionId> = node_path
            .iter()
            .map(|node_idx| self.node_to_intersection[node_idx])
            .collect();

        // Cache the result
        self.path_cache
            .entry(start)
            .or_default()
            .insert(end, path.clone());

        Ok(path)
    }

    /// Get number of roads
    pub fn road_count(&self) -> usize {
        self.roads.len()
    }

    /// Get number of intersections
    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    /// Number of roads currently blocked by an accident
    pub fn active_accident_count(&self) -> usize {
        self.roads.iter().filter(|road| road.has_accident()).count()
    }
}
