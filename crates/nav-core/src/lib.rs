//! `nav-core` — foundational types for the navigation simulator.
//!
//! This crate is a dependency of every other `nav-*` crate.  It has no
//! `nav-*` dependencies and a single required external one (`thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module           | Contents                                              |
//! |------------------|-------------------------------------------------------|
//! | [`ids`]          | `NodeId`, `EdgeId`                                    |
//! | [`geo`]          | `GeoPoint`, `GeoBounds`, haversine distance           |
//! | [`projection`]   | `Projector`, `Calibration`, `PlanarPoint`             |
//! | [`road_class`]   | `RoadClass` enum (OSM `highway` classification)       |
//! | [`config`]       | `NavConfig` — every tunable knob with its default     |
//! | [`time`]         | `Tick`, `FrameClock` (dt clamp, frame budget)         |
//! | [`error`]        | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod projection;
pub mod road_class;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::NavConfig;
pub use error::{CoreError, CoreResult};
pub use geo::{GeoBounds, GeoPoint};
pub use ids::{EdgeId, NodeId};
pub use projection::{Calibration, PlanarPoint, Projector};
pub use road_class::RoadClass;
pub use time::{FrameClock, Tick};
