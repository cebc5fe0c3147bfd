use nav_core::CoreError;
use nav_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("route has {0} node(s); at least 2 are needed to move")]
    RouteTooShort(usize),

    #[error("route geometry: {0}")]
    Spatial(#[from] SpatialError),

    #[error("projection: {0}")]
    Projection(#[from] CoreError),
}

pub type MotionResult<T> = Result<T, MotionError>;
