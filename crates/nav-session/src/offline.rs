//! Offline providers: an in-memory gazetteer and prebuilt road graphs.
//!
//! # Gazetteer CSV format
//!
//! ```csv
//! name,lat,lon
//! Awka,6.2107,7.0722
//! Eke Awka Market,6.2120,7.0740
//! ```
//!
//! Names match case-insensitively with surrounding and repeated whitespace
//! ignored.  A query that misses is retried with everything after its first
//! comma dropped, so "Eke Awka Market, Awka" finds "Eke Awka Market".  A
//! query of the form `"lat,lon"` resolves to that coordinate directly.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use nav_core::{CoreError, GeoPoint};
use nav_spatial::RoadGraph;

use crate::provider::{GeocodeProvider, GraphProvider, ProviderError};
use crate::SessionResult;

// ── Gazetteer ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PlaceRecord {
    name: String,
    lat:  f64,
    lon:  f64,
}

/// Place-name lookup table.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    places: HashMap<String, GeoPoint>,
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace `name`.
    pub fn insert(&mut self, name: &str, pos: GeoPoint) {
        self.places.insert(normalize(name), pos);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_place(mut self, name: &str, pos: GeoPoint) -> Self {
        self.insert(name, pos);
        self
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn from_csv_path(path: &Path) -> SessionResult<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| CoreError::Config(format!("gazetteer {}: {e}", path.display())))?;
        Self::from_csv_reader(file)
    }

    /// Load `name,lat,lon` rows.  Later rows replace earlier ones.
    pub fn from_csv_reader<R: Read>(reader: R) -> SessionResult<Self> {
        let mut gazetteer = Self::new();
        for row in csv::Reader::from_reader(reader).deserialize::<PlaceRecord>() {
            let row = row.map_err(|e| CoreError::Config(format!("gazetteer: {e}")))?;
            let pos = GeoPoint::try_new(row.lat, row.lon)?;
            gazetteer.insert(&row.name, pos);
        }
        Ok(gazetteer)
    }

    /// Look `query` up without going through the provider interface.
    pub fn lookup(&self, query: &str) -> Option<GeoPoint> {
        if let Some(pos) = parse_lat_lon(query) {
            return Some(pos);
        }
        let key = normalize(query);
        if let Some(&pos) = self.places.get(&key) {
            return Some(pos);
        }
        let head = key.split(',').next().map(str::trim)?;
        self.places.get(head).copied()
    }
}

impl GeocodeProvider for Gazetteer {
    fn resolve(&self, query: &str, _timeout: Duration) -> Result<Option<GeoPoint>, ProviderError> {
        Ok(self.lookup(query))
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn parse_lat_lon(query: &str) -> Option<GeoPoint> {
    let (lat, lon) = query.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    GeoPoint::try_new(lat, lon).ok()
}

// ── Graph providers ───────────────────────────────────────────────────────────

/// Serves cut-outs of one prebuilt graph.
#[derive(Debug, Clone)]
pub struct StaticGraphProvider {
    graph: Arc<RoadGraph>,
}

impl StaticGraphProvider {
    pub fn new(graph: RoadGraph) -> Self {
        Self { graph: Arc::new(graph) }
    }
}

impl GraphProvider for StaticGraphProvider {
    fn fetch_drivable_graph(&self, center: GeoPoint, radius_m: f64) -> Result<RoadGraph, ProviderError> {
        Ok(self.graph.within_radius(center, radius_m))
    }
}

/// Reads drivable roads from an OSM PBF extract on every fetch.
#[cfg(feature = "osm")]
#[derive(Debug, Clone)]
pub struct PbfGraphProvider {
    path: std::path::PathBuf,
}

#[cfg(feature = "osm")]
impl PbfGraphProvider {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(feature = "osm")]
impl GraphProvider for PbfGraphProvider {
    fn fetch_drivable_graph(&self, center: GeoPoint, radius_m: f64) -> Result<RoadGraph, ProviderError> {
        nav_spatial::osm::load_from_pbf(&self.path, center, radius_m)
            .map_err(|e| ProviderError::Transport(e.to_string()))
    }
}
