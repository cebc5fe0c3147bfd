//! Geographic ↔ local-plane projection.
//!
//! # Model
//!
//! An equirectangular approximation anchored at the north-west corner of the
//! loaded map's bounding box:
//!
//! ```text
//! x = (lon - origin_lon) * scale
//! y = (origin_lat - lat) * scale      // y grows southwards, like screen rows
//! ```
//!
//! `scale` is chosen so the longer side of the bounding box spans
//! `reference_span` plane units.  One [`Calibration`] is derived per loaded
//! map and never changes while that map is in use.

use crate::geo::{GeoBounds, GeoPoint};
use crate::{CoreError, CoreResult};

/// Metres per degree of longitude at the equator, as used for converting a
/// real-world speed into degrees per second.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

// ── PlanarPoint ───────────────────────────────────────────────────────────────

/// A point in the local plane.  Only meaningful relative to the
/// [`Calibration`] that produced it.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(self, other: PlanarPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Move `step` plane units from `self` towards `target`.  Does not
    /// overshoot: returns `target` when `step` covers the whole distance.
    pub fn step_towards(self, target: PlanarPoint, step: f64) -> PlanarPoint {
        let dist = self.distance(target);
        if dist <= step || dist == 0.0 {
            return target;
        }
        let k = step / dist;
        PlanarPoint {
            x: self.x + (target.x - self.x) * k,
            y: self.y + (target.y - self.y) * k,
        }
    }
}

// ── Calibration ───────────────────────────────────────────────────────────────

/// The (origin, scale) pair fixing the geographic-to-plane mapping for one
/// loaded map.  Invariant: `scale > 0`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Calibration {
    pub origin_lon: f64,
    pub origin_lat: f64,
    pub scale: f64,
}

impl Calibration {
    /// Derive a calibration from the bounding box of a map's nodes.
    ///
    /// # Errors
    ///
    /// [`CoreError::DegenerateBoundingBox`] when both spans are zero (a single
    /// point, or all nodes stacked) or not finite.
    pub fn from_bounds(bounds: &GeoBounds, reference_span: f64) -> CoreResult<Self> {
        let span = bounds.max_span();
        if !(span > 0.0) || !span.is_finite() {
            return Err(CoreError::DegenerateBoundingBox { span });
        }
        if !(reference_span > 0.0) {
            return Err(CoreError::Config(format!(
                "plane span must be positive, got {reference_span}"
            )));
        }
        Ok(Self {
            origin_lon: bounds.min_lon,
            origin_lat: bounds.max_lat,
            scale:      reference_span / span,
        })
    }

    /// Convert a real-world speed to plane units per second.
    ///
    /// The conversion uses the longitude-degree length at `reference_lat`
    /// for the whole session rather than at the vehicle's current latitude.
    pub fn plane_speed(&self, speed_mps: f64, reference_lat: f64) -> f64 {
        let deg_per_sec = speed_mps / (METERS_PER_DEGREE * reference_lat.to_radians().cos());
        deg_per_sec * self.scale
    }
}

// ── Projector ─────────────────────────────────────────────────────────────────

/// Converts between [`GeoPoint`] and [`PlanarPoint`].
///
/// A `Projector` starts uncalibrated; both directions fail with
/// [`CoreError::UncalibratedProjection`] until a map has been loaded.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Projector {
    calibration: Option<Calibration>,
}

impl Projector {
    pub fn uncalibrated() -> Self {
        Self { calibration: None }
    }

    pub fn calibrated(calibration: Calibration) -> Self {
        Self { calibration: Some(calibration) }
    }

    #[inline]
    pub fn calibration(&self) -> Option<Calibration> {
        self.calibration
    }

    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    fn require(&self) -> CoreResult<&Calibration> {
        self.calibration.as_ref().ok_or(CoreError::UncalibratedProjection)
    }

    pub fn project(&self, p: GeoPoint) -> CoreResult<PlanarPoint> {
        let c = self.require()?;
        Ok(PlanarPoint {
            x: (p.lon - c.origin_lon) * c.scale,
            y: (c.origin_lat - p.lat) * c.scale,
        })
    }

    pub fn unproject(&self, p: PlanarPoint) -> CoreResult<GeoPoint> {
        let c = self.require()?;
        Ok(GeoPoint {
            lat: c.origin_lat - p.y / c.scale,
            lon: p.x / c.scale + c.origin_lon,
        })
    }
}
