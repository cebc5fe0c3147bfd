//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! [`RoutePlanner`](crate::RoutePlanner) calls routing via the [`Router`]
//! trait, so applications can swap in A* or contraction hierarchies without
//! touching the session.  Any implementation must return a *globally*
//! shortest path under `edge_length_m`.
//!
//! # Cost units
//!
//! Costs are metres (`f64`).  The heap orders costs with `f64::total_cmp`,
//! so no rounding to integer units is needed.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use nav_core::{EdgeId, NodeId};

use crate::network::RoadGraph;
use crate::SpatialError;

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-path engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so they can be shared with the
/// background route-planning task.
pub trait Router: Send + Sync {
    /// Node sequence of a shortest path from `from` to `to`, both included.
    ///
    /// `from == to` yields `[from]`.  A disconnected pair yields
    /// [`SpatialError::NoPathFound`].
    fn shortest_path(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
    ) -> Result<Vec<NodeId>, SpatialError>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra's algorithm over the CSR road graph, weighted by
/// `edge_length_m`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn shortest_path(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
    ) -> Result<Vec<NodeId>, SpatialError> {
        dijkstra(graph, from, to)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

/// Total-ordered path cost for the binary heap.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn dijkstra(graph: &RoadGraph, from: NodeId, to: NodeId) -> Result<Vec<NodeId>, SpatialError> {
    for node in [from, to] {
        if !graph.contains(node) {
            return Err(SpatialError::NodeNotFound(node));
        }
    }
    if from == to {
        return Ok(vec![from]);
    }

    let n = graph.node_count();
    // dist[v] = best known length (m) to reach v.
    let mut dist      = vec![f64::INFINITY; n];
    // prev_edge[v] = EdgeId that reached v; EdgeId::INVALID for unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[from.index()] = 0.0;

    // Min-heap: (cost, node). Reverse makes BinaryHeap (max) behave as min-heap.
    // Secondary key NodeId ensures deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(Cost, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(0.0), from)));

    while let Some(Reverse((Cost(cost), node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(graph, &prev_edge, from, to));
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for edge in graph.out_edges(node) {
            let neighbor = graph.edge_to[edge.index()];
            let new_cost = cost + graph.edge_length_m[edge.index()].max(0.0);

            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((Cost(new_cost), neighbor)));
            }
        }
    }

    Err(SpatialError::NoPathFound { from, to })
}

fn reconstruct(graph: &RoadGraph, prev_edge: &[EdgeId], from: NodeId, to: NodeId) -> Vec<NodeId> {
    let mut nodes = vec![to];
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        cur = graph.edge_from[e.index()];
        nodes.push(cur);
    }
    nodes.reverse();
    nodes
}
