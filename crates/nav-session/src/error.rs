use nav_core::CoreError;
use nav_motion::MotionError;
use nav_spatial::SpatialError;
use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::geocoder::GeocodeError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("map not ready; please wait and try again")]
    MapNotReady,

    #[error("geocoding failed: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("map acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("routing failed: {0}")]
    Spatial(#[from] SpatialError),

    #[error("motion error: {0}")]
    Motion(#[from] MotionError),

    #[error("{0}")]
    Core(#[from] CoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;
