//! Road graph representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length_m`, `edge_class`)
//! are sorted by source node and indexed by `EdgeId`.  Iteration over a
//! node's outgoing edges is therefore a contiguous memory scan — ideal for
//! Dijkstra's inner loop.
//!
//! # Immutability
//!
//! A `RoadGraph` is never mutated after [`RoadGraphBuilder::build`].  The
//! session shares it behind an `Arc` between the tick loop and background
//! route planning without locking.

use nav_core::{EdgeId, GeoBounds, GeoPoint, NodeId, RoadClass};

use crate::{SpatialError, SpatialResult};

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Directed road graph in CSR format.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`RoadGraphBuilder`].
#[derive(Debug, Clone)]
pub struct RoadGraph {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Outgoing edges of node `n` are at EdgeIds
    /// `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    /// Source node of each edge.  Redundant with CSR but required for
    /// route reconstruction (trace `prev_edge` back to source).
    pub edge_from: Vec<NodeId>,

    /// Destination node of each edge.
    pub edge_to: Vec<NodeId>,

    /// Length of each edge in metres.  This is the routing weight.
    pub edge_length_m: Vec<f64>,

    /// Functional class of each edge.
    pub edge_class: Vec<RoadClass>,
}

impl RoadGraph {
    /// Construct an empty graph with no nodes or edges.
    pub fn empty() -> Self {
        RoadGraphBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    /// Position of `node`, or [`SpatialError::NodeNotFound`].
    #[inline]
    pub fn position(&self, node: NodeId) -> SpatialResult<GeoPoint> {
        self.node_pos
            .get(node.index())
            .copied()
            .ok_or(SpatialError::NodeNotFound(node))
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_pos.len()
    }

    /// Bounding box of all nodes; `None` for an empty graph.
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(self.node_pos.iter().copied())
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    ///
    /// A contiguous index range; no heap allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Out-degree of `node` (number of outgoing edges).
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Every edge as `(from, to, class)` in `EdgeId` order, for drawing.
    pub fn segments(&self) -> impl Iterator<Item = (GeoPoint, GeoPoint, RoadClass)> + '_ {
        (0..self.edge_count()).map(|i| {
            (
                self.node_pos[self.edge_from[i].index()],
                self.node_pos[self.edge_to[i].index()],
                self.edge_class[i],
            )
        })
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Return the node with the smallest haversine distance to `pos`.
    ///
    /// Scans every node in `NodeId` order; on equal distances the lowest id
    /// wins.  Returns `None` only if the graph has no nodes.
    pub fn nearest_node(&self, pos: GeoPoint) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for (i, &p) in self.node_pos.iter().enumerate() {
            let d = pos.distance_m(p);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((NodeId(i as u32), d)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Extract the sub-graph of nodes within `radius_m` of `center`.
    ///
    /// Node ids are reassigned densely in their original order; edges are
    /// kept only when both endpoints survive.
    pub fn within_radius(&self, center: GeoPoint, radius_m: f64) -> RoadGraph {
        let mut remap = vec![NodeId::INVALID; self.node_count()];
        let mut b = RoadGraphBuilder::new();
        for (i, &p) in self.node_pos.iter().enumerate() {
            if center.distance_m(p) <= radius_m {
                remap[i] = b.add_node(p);
            }
        }
        for e in 0..self.edge_count() {
            let from = remap[self.edge_from[e].index()];
            let to   = remap[self.edge_to[e].index()];
            if from != NodeId::INVALID && to != NodeId::INVALID {
                b.add_directed_edge(from, to, self.edge_length_m[e], self.edge_class[e]);
            }
        }
        b.build()
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// The builder accepts nodes and directed edges in any order.  `build()`
/// sorts edges by source node and constructs the CSR arrays.
///
/// # Example
///
/// ```
/// use nav_core::{GeoPoint, RoadClass};
/// use nav_spatial::RoadGraphBuilder;
///
/// let mut b = RoadGraphBuilder::new();
/// let a = b.add_node(GeoPoint::new(6.21, 7.07));
/// let c = b.add_node(GeoPoint::new(6.22, 7.08));
/// b.add_road(a, c, 1_560.0, RoadClass::Primary);
/// let graph = b.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2); // bidirectional
/// ```
pub struct RoadGraphBuilder {
    nodes:     Vec<GeoPoint>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:     NodeId,
    to:       NodeId,
    length_m: f64,
    class:    RoadClass,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a road node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a **directed** edge from `from` to `to`.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f64, class: RoadClass) {
        self.raw_edges.push(RawEdge { from, to, length_m, class });
    }

    /// Convenience: add edges in **both directions** for an undirected road
    /// segment.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f64, class: RoadClass) {
        self.add_directed_edge(a, b, length_m, class);
        self.add_directed_edge(b, a, length_m, class);
    }

    /// Add a two-way road whose length is the haversine distance between its
    /// endpoints.
    pub fn add_road_geodesic(&mut self, a: NodeId, b: NodeId, class: RoadClass) {
        let len = self.node_pos(a).distance_m(self.node_pos(b));
        self.add_road(a, b, len, class);
    }

    /// Look up the position of a node added earlier.
    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadGraph`].
    ///
    /// Edges referencing unknown nodes are dropped.  Time complexity:
    /// O(E log E) for the edge sort.
    pub fn build(self) -> RoadGraph {
        let node_count = self.nodes.len();

        // Stable sort keeps insertion order among a node's edges.
        let mut raw: Vec<RawEdge> = self
            .raw_edges
            .into_iter()
            .filter(|e| e.from.index() < node_count && e.to.index() < node_count)
            .collect();
        raw.sort_by_key(|e| e.from.0);
        let edge_count = raw.len();

        let edge_from:     Vec<NodeId>    = raw.iter().map(|e| e.from).collect();
        let edge_to:       Vec<NodeId>    = raw.iter().map(|e| e.to).collect();
        let edge_length_m: Vec<f64>       = raw.iter().map(|e| e.length_m).collect();
        let edge_class:    Vec<RoadClass> = raw.iter().map(|e| e.class).collect();

        // Build CSR row pointer (node_out_start).
        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        RoadGraph {
            node_pos: self.nodes,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_class,
        }
    }
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
