//! Messages posted by background tasks to the tick thread.

use std::fmt;

use nav_core::GeoPoint;
use nav_spatial::{Route, SpatialError};

use crate::geocoder::GeocodeError;

/// Monotonic request counter.  Results tagged with anything but the current
/// generation are stale and get discarded.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    #[inline]
    pub fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}", self.0)
    }
}

/// Outcome of one background task.
#[derive(Debug)]
pub enum TaskResult {
    Geocoded {
        generation: Generation,
        query:      String,
        result:     Result<GeoPoint, GeocodeError>,
    },
    Routed {
        generation: Generation,
        result:     Result<Route, SpatialError>,
    },
}

impl TaskResult {
    pub fn generation(&self) -> Generation {
        match self {
            TaskResult::Geocoded { generation, .. } | TaskResult::Routed { generation, .. } => *generation,
        }
    }
}
