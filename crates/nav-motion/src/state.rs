//! Vehicle state.

use nav_core::PlanarPoint;

/// The simulated vehicle.
///
/// Owned and mutated only by [`MotionSimulator`](crate::MotionSimulator);
/// everyone else sees copies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    /// Current plane position.
    pub position: PlanarPoint,

    /// Heading in degrees, see [`heading_deg`].  Retains its last value while
    /// stationary.
    pub heading_deg: f64,

    /// Index of the route node the vehicle last reached.  The vehicle is
    /// travelling towards node `segment_index + 1`.
    pub segment_index: usize,

    /// Metres left to drive, updated only when a node is reached.
    pub remaining_m: f64,

    /// Seconds spent moving on the current route.
    pub elapsed_secs: f64,

    /// `true` while a route is being followed.
    pub moving: bool,
}

impl VehicleState {
    /// A stationary vehicle at `position`, facing north.
    pub fn parked(position: PlanarPoint) -> Self {
        Self {
            position,
            heading_deg:   0.0,
            segment_index: 0,
            remaining_m:   0.0,
            elapsed_secs:  0.0,
            moving:        false,
        }
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        Self::parked(PlanarPoint::default())
    }
}

/// Heading from `from` towards `to`, in degrees counter-clockwise from plane
/// "up" (north), normalised to `[0, 360)`.
///
/// | Direction | Heading |
/// |-----------|---------|
/// | north     | 0°      |
/// | west      | 90°     |
/// | south     | 180°    |
/// | east      | 270°    |
///
/// Plane `y` grows southwards, so a renderer that rotates sprites
/// counter-clockwise can use the value directly.
pub fn heading_deg(from: PlanarPoint, to: PlanarPoint) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    ((-dy).atan2(dx).to_degrees() - 90.0).rem_euclid(360.0)
}
