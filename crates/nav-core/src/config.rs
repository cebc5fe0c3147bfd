//! Session configuration.
//!
//! Typically loaded from a JSON file by the host application (with the
//! `serde` feature) and handed to the navigation controller.  Every field has
//! a default, so a partial file only overrides what it names.

use std::time::Duration;

use crate::{CoreError, CoreResult};

/// km/h → m/s.
const KMH_TO_MPS: f64 = 1.0 / 3.6;

/// Every tunable knob of a navigation session.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NavConfig {
    /// Human-readable place geocoded to centre the map.
    pub base_place: String,

    /// Constant vehicle speed.  Default: 50 km/h.
    pub cruise_speed_kmh: f64,

    /// Radius of the road graph fetched around the base place.  Default: 12 km.
    pub map_radius_m: f64,

    /// Latitude used to convert the cruising speed into plane units.
    /// `None` uses the geocoded centre of the base place.
    pub reference_lat: Option<f64>,

    /// Plane units spanned by the longer side of the map's bounding box.
    pub plane_span: f64,

    /// Timeout for geocoding `base_place`.  Default: 15 s.
    pub base_geocode_timeout_ms: u64,

    /// Timeout for the graph provider.  Default: 15 s.
    pub graph_fetch_timeout_ms: u64,

    /// Timeout for geocoding a destination.  Default: 10 s.
    pub destination_timeout_ms: u64,

    /// How long a destination request issued before the map is ready may
    /// wait for it.  Default: 60 s.
    pub map_ready_timeout_ms: u64,

    /// Target frame rate of the host loop.  Default: 60 Hz.
    pub tick_rate_hz: u32,

    /// Upper bound on a single tick's `dt`.  Default: 0.1 s.
    pub max_dt_secs: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            base_place:              "Awka, Nigeria".to_owned(),
            cruise_speed_kmh:        50.0,
            map_radius_m:            12_000.0,
            reference_lat:           None,
            plane_span:              3_000.0,
            base_geocode_timeout_ms: 15_000,
            graph_fetch_timeout_ms:  15_000,
            destination_timeout_ms:  10_000,
            map_ready_timeout_ms:    60_000,
            tick_rate_hz:            60,
            max_dt_secs:             0.1,
        }
    }
}

impl NavConfig {
    /// Reject values that would make the simulation meaningless.
    pub fn validate(&self) -> CoreResult<()> {
        fn positive(name: &str, v: f64) -> CoreResult<()> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(CoreError::Config(format!("{name} must be positive, got {v}")))
            }
        }

        positive("cruise_speed_kmh", self.cruise_speed_kmh)?;
        positive("map_radius_m", self.map_radius_m)?;
        positive("plane_span", self.plane_span)?;
        positive("max_dt_secs", self.max_dt_secs)?;

        if self.tick_rate_hz == 0 {
            return Err(CoreError::Config("tick_rate_hz must be at least 1".into()));
        }
        if let Some(lat) = self.reference_lat {
            if !(lat.abs() < 90.0) {
                return Err(CoreError::Config(format!(
                    "reference_lat must be strictly inside (-90, 90), got {lat}"
                )));
            }
        }
        if self.base_place.trim().is_empty() {
            return Err(CoreError::Config("base_place is empty".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn cruise_speed_mps(&self) -> f64 {
        self.cruise_speed_kmh * KMH_TO_MPS
    }

    pub fn base_geocode_timeout(&self) -> Duration {
        Duration::from_millis(self.base_geocode_timeout_ms)
    }

    pub fn graph_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.graph_fetch_timeout_ms)
    }

    pub fn destination_timeout(&self) -> Duration {
        Duration::from_millis(self.destination_timeout_ms)
    }

    pub fn map_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.map_ready_timeout_ms)
    }
}
