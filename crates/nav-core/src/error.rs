//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`, so projection failures propagate with `?`.

use thiserror::Error;

/// Errors produced by `nav-core`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("projection used before a map calibrated it")]
    UncalibratedProjection,

    #[error("degenerate bounding box: span {span} deg")]
    DegenerateBoundingBox { span: f64 },

    #[error("coordinate out of range: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `nav-core`.
pub type CoreResult<T> = Result<T, CoreError>;
