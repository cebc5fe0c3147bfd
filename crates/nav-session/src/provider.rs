//! Collaborator traits for geocoding and road-graph retrieval, plus the
//! timeout wrapper every provider call goes through.
//!
//! Providers are plain blocking calls.  They are only ever invoked from
//! background threads, never from the tick thread.

use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use thiserror::Error;

use nav_core::GeoPoint;
use nav_spatial::RoadGraph;

/// Failure talking to an external provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("provider transport error: {0}")]
    Transport(String),
}

/// Resolves free-form place text to a coordinate.
pub trait GeocodeProvider: Send + Sync + 'static {
    /// `Ok(None)` when the provider answered but knows no such place.
    ///
    /// `timeout` is advisory; the caller enforces it regardless.
    fn resolve(&self, query: &str, timeout: Duration) -> Result<Option<GeoPoint>, ProviderError>;
}

/// Supplies the drivable road graph around a point.
pub trait GraphProvider: Send + Sync + 'static {
    fn fetch_drivable_graph(&self, center: GeoPoint, radius_m: f64) -> Result<RoadGraph, ProviderError>;
}

/// Run `call` on a worker thread and wait at most `timeout` for its result.
///
/// On overrun the worker is detached and its late result dropped.  A worker
/// that panics surfaces as [`ProviderError::Transport`].
pub fn call_with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, ProviderError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProviderError> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::Builder::new()
        .name("nav-provider".into())
        .spawn(move || {
            // The receiver is gone after a timeout; nothing to do then.
            let _ = tx.send(call());
        })
        .map_err(|e| ProviderError::Transport(format!("cannot spawn provider thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ProviderError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(ProviderError::Transport("provider call aborted without a result".into()))
        }
    }
}
