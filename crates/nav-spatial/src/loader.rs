//! CSV road-graph loader.
//!
//! # CSV format
//!
//! Two files.  Nodes carry an arbitrary integer id (e.g. the OSM node id):
//!
//! ```csv
//! id,lat,lon
//! 1001,6.2107,7.0722
//! 1002,6.2150,7.0760
//! ```
//!
//! Edges reference node ids.  `length_m` may be left empty, in which case the
//! haversine distance between the endpoints is used.  `oneway` accepts
//! `yes`/`1`/`true`; motorways are one-way unless `oneway=no`.
//!
//! ```csv
//! from,to,highway,oneway,length_m
//! 1001,1002,primary,no,560.0
//! 1002,1003,residential,,
//! ```
//!
//! Edges whose `highway` is not drivable are skipped; edges referencing an
//! unknown node id are a parse error.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use nav_core::{GeoPoint, NodeId, RoadClass};

use crate::network::{RoadGraph, RoadGraphBuilder};
use crate::SpatialError;

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRecord {
    id:  i64,
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct EdgeRecord {
    from:     i64,
    to:       i64,
    #[serde(default)]
    highway:  String,
    #[serde(default)]
    oneway:   String,
    #[serde(default)]
    length_m: Option<f64>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`RoadGraph`] from a node CSV file and an edge CSV file.
pub fn load_graph_csv(nodes: &Path, edges: &Path) -> Result<RoadGraph, SpatialError> {
    let nodes = std::fs::File::open(nodes)?;
    let edges = std::fs::File::open(edges)?;
    load_graph_readers(nodes, edges)
}

/// Like [`load_graph_csv`] but accepts any `Read` sources.
///
/// Useful for testing (pass a `std::io::Cursor`) or for graphs embedded in a
/// binary.
pub fn load_graph_readers<N: Read, E: Read>(nodes: N, edges: E) -> Result<RoadGraph, SpatialError> {
    // ── Nodes ─────────────────────────────────────────────────────────────
    let mut builder = RoadGraphBuilder::new();
    let mut ids: HashMap<i64, NodeId> = HashMap::new();

    for result in csv::Reader::from_reader(nodes).deserialize::<NodeRecord>() {
        let row = result.map_err(|e| SpatialError::Parse(e.to_string()))?;
        let pos = GeoPoint::try_new(row.lat, row.lon)
            .map_err(|e| SpatialError::Parse(format!("node {}: {e}", row.id)))?;
        if ids.contains_key(&row.id) {
            return Err(SpatialError::Parse(format!("duplicate node id {}", row.id)));
        }
        ids.insert(row.id, builder.add_node(pos));
    }

    // ── Edges ─────────────────────────────────────────────────────────────
    let mut skipped = 0usize;
    for result in csv::Reader::from_reader(edges).deserialize::<EdgeRecord>() {
        let row = result.map_err(|e| SpatialError::Parse(e.to_string()))?;
        let from = lookup(&ids, row.from)?;
        let to   = lookup(&ids, row.to)?;

        let class = if row.highway.trim().is_empty() {
            RoadClass::default()
        } else {
            match RoadClass::from_highway(&row.highway) {
                Some(c) => c,
                None => {
                    skipped += 1;
                    continue;
                }
            }
        };

        let length_m = row
            .length_m
            .unwrap_or_else(|| builder.node_pos(from).distance_m(builder.node_pos(to)));

        builder.add_directed_edge(from, to, length_m, class);
        if !parse_oneway(&row.oneway, class) {
            builder.add_directed_edge(to, from, length_m, class);
        }
    }

    let graph = builder.build();
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        skipped,
        "road graph loaded from CSV"
    );
    Ok(graph)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn lookup(ids: &HashMap<i64, NodeId>, id: i64) -> Result<NodeId, SpatialError> {
    ids.get(&id)
        .copied()
        .ok_or_else(|| SpatialError::Parse(format!("edge references unknown node id {id}")))
}

fn parse_oneway(value: &str, class: RoadClass) -> bool {
    match value.trim() {
        "yes" | "1" | "true" => true,
        "no" | "0" | "false" => false,
        _ => class.implies_oneway(),
    }
}
