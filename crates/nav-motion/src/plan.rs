//! Route geometry prepared for motion.

use std::sync::Arc;

use nav_core::{CoreError, PlanarPoint, Projector};
use nav_spatial::{RoadGraph, Route};

use crate::{MotionError, MotionResult};

/// A [`Route`] projected into the plane, ready for [`MotionSimulator::begin`].
///
/// `waypoints[i]` is the plane position of `route.node_sequence[i]` and
/// `segment_lengths_m[i]` the haversine length from node `i` to node `i + 1`.
///
/// [`MotionSimulator::begin`]: crate::MotionSimulator::begin
#[derive(Debug, Clone)]
pub struct MotionPlan {
    pub route:             Arc<Route>,
    pub waypoints:         Vec<PlanarPoint>,
    pub segment_lengths_m: Vec<f64>,
    /// Cruise speed in plane units per second.
    pub plane_speed:       f64,
}

impl MotionPlan {
    /// Project `route` through `projector` and convert `speed_mps` using the
    /// session's `reference_lat`.
    ///
    /// # Errors
    ///
    /// - [`MotionError::RouteTooShort`] for routes with fewer than two nodes.
    /// - [`MotionError::Spatial`] if a route node is missing from `graph`.
    /// - [`MotionError::Projection`] if `projector` is uncalibrated.
    pub fn new(
        route:         Arc<Route>,
        graph:         &RoadGraph,
        projector:     &Projector,
        reference_lat: f64,
        speed_mps:     f64,
    ) -> MotionResult<Self> {
        let len = route.node_sequence.len();
        if len < 2 {
            return Err(MotionError::RouteTooShort(len));
        }
        let calibration = projector.calibration().ok_or(CoreError::UncalibratedProjection)?;

        let mut positions = Vec::with_capacity(len);
        for &node in &route.node_sequence {
            positions.push(graph.position(node)?);
        }

        let waypoints = positions
            .iter()
            .map(|&p| projector.project(p))
            .collect::<Result<Vec<_>, _>>()?;

        let segment_lengths_m = positions
            .windows(2)
            .map(|pair| pair[0].distance_m(pair[1]))
            .collect();

        Ok(Self {
            plane_speed: calibration.plane_speed(speed_mps, reference_lat),
            route,
            waypoints,
            segment_lengths_m,
        })
    }

    /// Index of the final node.
    #[inline]
    pub fn last_index(&self) -> usize {
        self.waypoints.len() - 1
    }
}
