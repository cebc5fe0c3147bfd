//! `nav-spatial` — road graph, loading, routing and route planning.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`network`] | `RoadGraph` (CSR), `RoadGraphBuilder`, radius sub-graph      |
//! | [`router`]  | `Router` trait, `DijkstraRouter`                             |
//! | [`planner`] | `RoutePlanner`, `Route`, `route_length_m`                    |
//! | [`loader`]  | CSV node/edge loader                                         |
//! | [`osm`]     | `load_from_pbf` (feature = `"osm"` only)                     |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `osm`   | Enables OSM PBF loading via the `osmpbf` crate.              |

pub mod error;
pub mod loader;
pub mod network;
pub mod planner;
pub mod router;

#[cfg(feature = "osm")]
pub mod osm;


pub use error::{SpatialError, SpatialResult};
pub use loader::{load_graph_csv, load_graph_readers};
pub use network::{RoadGraph, RoadGraphBuilder};
pub use planner::{Route, RoutePlanner, route_length_m};
pub use router::{DijkstraRouter, Router};
