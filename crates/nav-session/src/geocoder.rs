//! Destination geocoding with a bounded timeout.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use thiserror::Error;
use tracing::debug;

use nav_core::GeoPoint;

use crate::provider::{GeocodeProvider, ProviderError, call_with_timeout};
use crate::task::{Generation, TaskResult};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    #[error("empty destination")]
    EmptyQuery,

    #[error("cannot find '{0}'")]
    NotFound(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Wraps a [`GeocodeProvider`] with a timeout and a background entry point.
#[derive(Clone)]
pub struct Geocoder {
    provider: Arc<dyn GeocodeProvider>,
    timeout:  Duration,
}

impl Geocoder {
    pub fn new(provider: Arc<dyn GeocodeProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve `text`, blocking the caller for at most the configured timeout.
    pub fn resolve(&self, text: &str) -> Result<GeoPoint, GeocodeError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }
        let provider = Arc::clone(&self.provider);
        let timeout  = self.timeout;
        let owned    = query.to_owned();
        call_with_timeout(timeout, move || provider.resolve(&owned, timeout))?
            .ok_or_else(|| GeocodeError::NotFound(query.to_owned()))
    }

    /// Resolve `text` on a background thread and post the outcome to `sink`
    /// as [`TaskResult::Geocoded`].
    ///
    /// Blank text is rejected here, before any thread is spawned.
    pub fn spawn(&self, generation: Generation, text: &str, sink: Sender<TaskResult>) -> Result<(), GeocodeError> {
        let query = text.trim().to_owned();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }
        let geocoder = self.clone();
        thread::Builder::new()
            .name("nav-geocode".into())
            .spawn(move || {
                let result = geocoder.resolve(&query);
                debug!(%generation, %query, ok = result.is_ok(), "geocode finished");
                // The controller may have been dropped; the result is then moot.
                let _ = sink.send(TaskResult::Geocoded { generation, query, result });
            })
            .map_err(|e| ProviderError::Transport(format!("cannot spawn geocode thread: {e}")))?;
        Ok(())
    }
}
