//! Spatial-subsystem error type.

use thiserror::Error;

use nav_core::NodeId;

/// Errors produced by `nav-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("road graph has no nodes")]
    GraphEmpty,

    #[error("no road path from {from} to {to}")]
    NoPathFound { from: NodeId, to: NodeId },

    #[error("start and destination both snap to {0}")]
    SameNode(NodeId),

    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),

    #[error("graph parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "osm")]
    #[error("OSM parse error: {0}")]
    Osm(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
