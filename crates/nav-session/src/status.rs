//! Session status shown to the user.

use std::fmt;

/// Exactly one of these describes the session at any frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Starting,
    LoadingMap,
    /// Terminal until the map is reloaded.
    MapLoadFailed(String),
    Idle,
    Geocoding(String),
    /// Shown for one frame, then `Idle`.
    GeocodeFailed(String),
    Routing,
    /// Shown for one frame, then `Idle`.
    RouteNotFound,
    Moving(String),
    Arrived(String),
}

impl SessionStatus {
    /// Statuses that revert to `Idle` on the following frame.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionStatus::GeocodeFailed(_) | SessionStatus::RouteNotFound)
    }

    /// `true` while the first map is still on its way.
    #[inline]
    pub fn awaiting_map(&self) -> bool {
        matches!(self, SessionStatus::Starting | SessionStatus::LoadingMap)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Starting         => f.write_str("Starting up…"),
            SessionStatus::LoadingMap       => f.write_str("Loading road network…"),
            SessionStatus::MapLoadFailed(r) => write!(f, "Map load failed: {r}"),
            SessionStatus::Idle             => f.write_str("Ready. Enter a destination."),
            SessionStatus::Geocoding(q)     => write!(f, "Looking up '{q}'…"),
            SessionStatus::GeocodeFailed(q) => write!(f, "Cannot find '{q}'."),
            SessionStatus::Routing          => f.write_str("Computing route…"),
            SessionStatus::RouteNotFound    => f.write_str("No road path found to that place."),
            SessionStatus::Moving(d)        => write!(f, "Navigating to {d}"),
            SessionStatus::Arrived(d)       => write!(f, "Arrived at {d}!"),
        }
    }
}
