//! Route planning: snapping points to nodes and turning shortest paths into
//! [`Route`]s.
//!
//! # Distance accounting
//!
//! `Route::total_m` is **not** the sum of edge weights.  It is recomputed
//! from node coordinates with the haversine formula ([`route_length_m`]), so
//! the displayed and simulated distances derive from the same geometry no
//! matter how edge lengths were sourced.

use std::sync::Arc;

use tracing::debug;

use nav_core::{GeoPoint, NodeId};

use crate::network::RoadGraph;
use crate::router::{DijkstraRouter, Router};
use crate::{SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// An ordered node sequence plus its real-world length.
///
/// Immutable once created; a new destination produces a new `Route`.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Nodes to visit in order, source first.  Always at least two entries.
    pub node_sequence: Vec<NodeId>,
    /// Sum of haversine distances between consecutive nodes, metres.
    pub total_m: f64,
}

impl Route {
    /// Number of segments (`node_sequence.len() - 1`).
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.node_sequence.len().saturating_sub(1)
    }

    #[inline]
    pub fn first(&self) -> Option<NodeId> {
        self.node_sequence.first().copied()
    }

    #[inline]
    pub fn last(&self) -> Option<NodeId> {
        self.node_sequence.last().copied()
    }
}

/// Sum of haversine distances between consecutive nodes of `nodes`.
///
/// This is the single distance-accounting function for routes.
pub fn route_length_m(graph: &RoadGraph, nodes: &[NodeId]) -> SpatialResult<f64> {
    let mut total = 0.0;
    for pair in nodes.windows(2) {
        total += graph.position(pair[0])?.distance_m(graph.position(pair[1])?);
    }
    Ok(total)
}

// ── RoutePlanner ──────────────────────────────────────────────────────────────

/// Computes routes over one immutable [`RoadGraph`].
///
/// # Type parameter
///
/// `R` must implement [`Router`] (default [`DijkstraRouter`]).
pub struct RoutePlanner<R: Router = DijkstraRouter> {
    graph:  Arc<RoadGraph>,
    router: R,
}

impl RoutePlanner<DijkstraRouter> {
    pub fn new(graph: Arc<RoadGraph>) -> Self {
        Self { graph, router: DijkstraRouter }
    }
}

impl<R: Router> RoutePlanner<R> {
    pub fn with_router(graph: Arc<RoadGraph>, router: R) -> Self {
        Self { graph, router }
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    /// Node nearest to `pos` by haversine distance (first node wins ties).
    ///
    /// # Errors
    ///
    /// [`SpatialError::GraphEmpty`] if the graph has no nodes.
    pub fn nearest_node(&self, pos: GeoPoint) -> SpatialResult<NodeId> {
        self.graph.nearest_node(pos).ok_or(SpatialError::GraphEmpty)
    }

    /// Shortest route from `start` to `end`.
    ///
    /// # Errors
    ///
    /// - [`SpatialError::SameNode`] when `start == end` (nothing to drive).
    /// - [`SpatialError::NoPathFound`] when the nodes are disconnected.
    /// - [`SpatialError::NodeNotFound`] for ids outside the graph.
    pub fn plan_route(&self, start: NodeId, end: NodeId) -> SpatialResult<Route> {
        if start == end {
            return Err(SpatialError::SameNode(start));
        }
        let node_sequence = self.router.shortest_path(&self.graph, start, end)?;
        let total_m = route_length_m(&self.graph, &node_sequence)?;
        debug!(%start, %end, nodes = node_sequence.len(), total_m, "route planned");
        Ok(Route { node_sequence, total_m })
    }

    /// Snap both points to their nearest nodes and plan between them.
    pub fn plan_between(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Route> {
        let start = self.nearest_node(from)?;
        let end   = self.nearest_node(to)?;
        self.plan_route(start, end)
    }
}
