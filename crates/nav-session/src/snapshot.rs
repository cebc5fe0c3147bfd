//! Read-only view of a session for the presentation layer.

use std::sync::Arc;

use nav_core::{Calibration, GeoPoint, Tick};
use nav_motion::VehicleState;
use nav_spatial::{RoadGraph, Route};

use crate::acquisition::LoadedMap;
use crate::status::SessionStatus;

/// Everything a renderer or HUD needs for one frame.
///
/// Cheap to take: the map and route are shared `Arc`s, the rest is copied.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status:      SessionStatus,
    pub vehicle:     VehicleState,
    pub route:       Option<Arc<Route>>,
    pub map:         Option<Arc<LoadedMap>>,
    pub destination: Option<String>,
    /// Last user-facing message, e.g. "already at destination".
    pub notice:      Option<String>,
    pub eta_secs:    Option<f64>,
    pub progress:    f64,
    pub frame:       Tick,
}

impl SessionSnapshot {
    /// Graph of the published map.
    pub fn road_graph(&self) -> Option<&RoadGraph> {
        self.map.as_deref().map(|m| &*m.graph)
    }

    /// Calibration of the same publication as [`road_graph`](Self::road_graph).
    pub fn calibration(&self) -> Option<Calibration> {
        self.map.as_deref().and_then(LoadedMap::calibration)
    }

    /// Vehicle position on the globe.
    pub fn vehicle_geo(&self) -> Option<GeoPoint> {
        let map = self.map.as_deref()?;
        map.projector.unproject(self.vehicle.position).ok()
    }

    pub fn remaining_km(&self) -> f64 {
        self.vehicle.remaining_m / 1_000.0
    }

    /// Route node positions in order, for drawing the route line.
    pub fn route_polyline(&self) -> Vec<GeoPoint> {
        match (self.route.as_deref(), self.road_graph()) {
            (Some(route), Some(graph)) => route
                .node_sequence
                .iter()
                .filter_map(|&n| graph.position(n).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}
