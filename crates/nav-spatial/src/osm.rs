//! OSM PBF loader — enabled with the `osm` Cargo feature.
//!
//! # Usage
//!
//! ```ignore
//! use std::path::Path;
//! use nav_core::GeoPoint;
//! use nav_spatial::osm::load_from_pbf;
//!
//! let graph = load_from_pbf(Path::new("nigeria.osm.pbf"), GeoPoint::new(6.2107, 7.0722), 12_000.0)?;
//! ```
//!
//! # What is loaded
//!
//! Only car-drivable `highway=*` ways (see [`RoadClass::from_highway`]) whose
//! nodes lie within `radius_m` of `center`.  A way leaving the circle is cut
//! at the boundary: segments with an endpoint outside are dropped.
//! One-way roads add a single directed edge; two-way roads add both.
//!
//! # Memory note
//!
//! The first pass buffers only nodes inside the circle, so a country-sized
//! extract costs memory proportional to the city, not the country.

use std::path::Path;

use osmpbf::{Element, ElementReader};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use nav_core::{GeoPoint, NodeId, RoadClass};

use crate::network::{RoadGraph, RoadGraphBuilder};
use crate::SpatialError;

// ── Public entry point ────────────────────────────────────────────────────────

/// Load the drivable road graph within `radius_m` of `center` from an OSM PBF
/// extract.
///
/// # Errors
///
/// Returns [`SpatialError::Osm`] when the file cannot be opened or parsed.
pub fn load_from_pbf(path: &Path, center: GeoPoint, radius_m: f64) -> Result<RoadGraph, SpatialError> {
    // ── Phase 1: collect in-range nodes + road ways in one sequential pass ─
    let reader = ElementReader::from_path(path).map_err(|e| SpatialError::Osm(e.to_string()))?;

    let mut near_nodes: FxHashMap<i64, GeoPoint> = FxHashMap::default();
    let mut road_ways: Vec<OsmWay> = Vec::new();

    let mut keep_node = |id: i64, lat: f64, lon: f64| {
        let p = GeoPoint::new(lat, lon);
        if center.distance_m(p) <= radius_m {
            near_nodes.insert(id, p);
        }
    };

    reader
        .for_each(|elem| match elem {
            Element::Node(n) => keep_node(n.id(), n.lat(), n.lon()),
            Element::DenseNode(n) => keep_node(n.id(), n.lat(), n.lon()),
            Element::Way(w) => {
                // Collect tags eagerly so &str lifetimes don't escape the closure.
                let tags: Vec<(&str, &str)> = w.tags().collect();
                let class = tags
                    .iter()
                    .find(|(k, _)| *k == "highway")
                    .and_then(|(_, v)| RoadClass::from_highway(v));

                if let Some(class) = class {
                    let oneway = is_oneway(class, &tags);
                    let refs: Vec<i64> = w.refs().collect();
                    road_ways.push(OsmWay { refs, class, oneway });
                }
            }
            _ => {}
        })
        .map_err(|e| SpatialError::Osm(e.to_string()))?;

    // ── Phase 2: identify road-referenced, in-range node IDs ──────────────
    let road_node_ids: FxHashSet<i64> = road_ways
        .iter()
        .flat_map(|w| w.refs.iter().copied())
        .filter(|id| near_nodes.contains_key(id))
        .collect();

    // ── Phase 3: build graph ──────────────────────────────────────────────
    let mut builder = RoadGraphBuilder::with_capacity(road_node_ids.len(), road_node_ids.len() * 2);

    // Sorted ids keep NodeId assignment reproducible across runs.
    let mut ordered: Vec<i64> = road_node_ids.into_iter().collect();
    ordered.sort_unstable();

    let mut osm_to_nav: FxHashMap<i64, NodeId> =
        FxHashMap::with_capacity_and_hasher(ordered.len(), Default::default());
    for osm_id in ordered {
        if let Some(&pos) = near_nodes.get(&osm_id) {
            osm_to_nav.insert(osm_id, builder.add_node(pos));
        }
    }
    drop(near_nodes);

    for way in &road_ways {
        for window in way.refs.windows(2) {
            if let (Some(&from), Some(&to)) = (osm_to_nav.get(&window[0]), osm_to_nav.get(&window[1])) {
                let len_m = builder.node_pos(from).distance_m(builder.node_pos(to));
                builder.add_directed_edge(from, to, len_m, way.class);
                if !way.oneway {
                    builder.add_directed_edge(to, from, len_m, way.class);
                }
            }
        }
    }

    let graph = builder.build();
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        radius_m,
        "road graph loaded from PBF"
    );
    Ok(graph)
}

// ── Internal types ────────────────────────────────────────────────────────────

struct OsmWay {
    refs:   Vec<i64>,
    class:  RoadClass,
    oneway: bool,
}

/// Determine whether a way should be treated as one-way for car traffic.
///
/// Motorways are implicitly one-way in OSM convention; `oneway=no` overrides.
fn is_oneway(class: RoadClass, tags: &[(&str, &str)]) -> bool {
    match tags.iter().find(|(k, _)| *k == "oneway").map(|(_, v)| *v) {
        Some("yes" | "1" | "true") => true,
        Some("no" | "0" | "false") => false,
        _ => class.implies_oneway(),
    }
}
