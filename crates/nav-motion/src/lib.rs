//! `nav-motion` — vehicle state and frame-by-frame motion along a route.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`state`]     | `VehicleState`, `heading_deg`                                   |
//! | [`plan`]      | `MotionPlan` — route projected into plane waypoints             |
//! | [`simulator`] | `MotionSimulator`, `MotionEvent`                                |
//! | [`error`]     | `MotionError`, `MotionResult<T>`                                |
//!
//! # Movement model (node-to-node interpolation)
//!
//! 1. `MotionPlan::new` projects every route node into the plane, measures
//!    each segment with the haversine formula and converts the cruise speed
//!    to plane units per second.
//! 2. `MotionSimulator::begin` starts from the vehicle's *current* position
//!    with `remaining_m = route.total_m`.
//! 3. Each `tick(dt)` moves the vehicle `plane_speed · dt` towards the next
//!    node.  Reaching it snaps the vehicle onto the node and subtracts that
//!    segment's length from `remaining_m`; at most one node is reached per
//!    tick.
//! 4. Reaching the last node stops the vehicle with `remaining_m = 0`.
//!
//! `remaining_m` therefore changes only at nodes.  Between nodes the
//! displayed distance stays at the value of the last node reached.

pub mod error;
pub mod plan;
pub mod simulator;
pub mod state;


pub use error::{MotionError, MotionResult};
pub use plan::MotionPlan;
pub use simulator::{MotionEvent, MotionSimulator};
pub use state::{VehicleState, heading_deg};
