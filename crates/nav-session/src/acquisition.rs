//! Background map acquisition.
//!
//! # State machine
//!
//! ```text
//! NotStarted ──start()──▶ Loading ──▶ Ready
//!                            │
//!                            └──────▶ Failed
//! ```
//!
//! `start()` spawns one thread that geocodes the base place, fetches the
//! drivable graph around it, validates it and derives the calibration.  The
//! finished [`LoadedMap`] is posted over a crossbeam channel; the tick thread
//! picks it up with the non-blocking [`poll`](MapAcquisitionService::poll).
//!
//! Graph and calibration are published together as one `Arc<LoadedMap>`, so
//! no reader ever sees one without the other.  A failed load leaves an
//! earlier publication in place.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use thiserror::Error;
use tracing::{debug, info, warn};

use nav_core::{Calibration, CoreError, GeoPoint, NavConfig, Projector};
use nav_spatial::RoadGraph;

use crate::provider::{GeocodeProvider, GraphProvider, ProviderError, call_with_timeout};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AcquisitionError {
    #[error("base place '{0}' not found")]
    PlaceNotFound(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("road graph around the base place is empty")]
    GraphEmpty,

    #[error("road graph bounding box is degenerate (span {span})")]
    DegenerateBoundingBox { span: f64 },

    #[error("map not ready after {0:?}")]
    Timeout(Duration),

    #[error("map loader exited without reporting")]
    Disconnected,

    #[error("invalid map settings: {0}")]
    Settings(String),
}

impl From<CoreError> for AcquisitionError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::DegenerateBoundingBox { span } => AcquisitionError::DegenerateBoundingBox { span },
            other => AcquisitionError::Settings(other.to_string()),
        }
    }
}

// ── LoadedMap ─────────────────────────────────────────────────────────────────

/// One immutable map publication: road graph plus the projection derived
/// from it.
#[derive(Debug)]
pub struct LoadedMap {
    pub graph:         Arc<RoadGraph>,
    /// Always calibrated.
    pub projector:     Projector,
    /// Geocoded position of the base place.
    pub center:        GeoPoint,
    /// Latitude used for plane-speed conversion.
    pub reference_lat: f64,
    /// The base place text that was geocoded.
    pub place:         String,
}

impl LoadedMap {
    /// Validate `graph` and derive its calibration.
    ///
    /// # Errors
    ///
    /// [`AcquisitionError::GraphEmpty`] for a graph without nodes and
    /// [`AcquisitionError::DegenerateBoundingBox`] when all nodes coincide.
    pub fn build(
        place:         impl Into<String>,
        center:        GeoPoint,
        graph:         RoadGraph,
        plane_span:    f64,
        reference_lat: Option<f64>,
    ) -> Result<Self, AcquisitionError> {
        let bounds = graph.bounds().ok_or(AcquisitionError::GraphEmpty)?;
        let calibration = Calibration::from_bounds(&bounds, plane_span)?;
        Ok(Self {
            graph:         Arc::new(graph),
            projector:     Projector::calibrated(calibration),
            center,
            reference_lat: reference_lat.unwrap_or(center.lat),
            place:         place.into(),
        })
    }

    pub fn calibration(&self) -> Option<Calibration> {
        self.projector.calibration()
    }
}

// ── State & events ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionState {
    NotStarted,
    Loading,
    Ready,
    Failed(AcquisitionError),
}

/// Reported by [`MapAcquisitionService::poll`] when a load finishes.
#[derive(Debug, Clone)]
pub enum AcquisitionEvent {
    Ready(Arc<LoadedMap>),
    Failed(AcquisitionError),
}

/// Everything the loader thread needs, copied out of [`NavConfig`].
#[derive(Debug, Clone)]
pub struct AcquisitionSettings {
    pub place:           String,
    pub radius_m:        f64,
    pub plane_span:      f64,
    pub reference_lat:   Option<f64>,
    pub geocode_timeout: Duration,
    pub fetch_timeout:   Duration,
}

impl From<&NavConfig> for AcquisitionSettings {
    fn from(config: &NavConfig) -> Self {
        Self {
            place:           config.base_place.clone(),
            radius_m:        config.map_radius_m,
            plane_span:      config.plane_span,
            reference_lat:   config.reference_lat,
            geocode_timeout: config.base_geocode_timeout(),
            fetch_timeout:   config.graph_fetch_timeout(),
        }
    }
}

type LoadOutcome = (u64, Result<LoadedMap, AcquisitionError>);

// ── Service ───────────────────────────────────────────────────────────────────

/// Loads the map for the base place off the tick thread.
pub struct MapAcquisitionService {
    settings: AcquisitionSettings,
    geocoder: Arc<dyn GeocodeProvider>,
    graphs:   Arc<dyn GraphProvider>,
    state:    AcquisitionState,
    loaded:   Option<Arc<LoadedMap>>,
    /// Incremented by every `start`; outcomes of older loads are ignored.
    load_seq: u64,
    tx:       Sender<LoadOutcome>,
    rx:       Receiver<LoadOutcome>,
}

impl MapAcquisitionService {
    pub fn new(
        settings: AcquisitionSettings,
        geocoder: Arc<dyn GeocodeProvider>,
        graphs:   Arc<dyn GraphProvider>,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            settings,
            geocoder,
            graphs,
            state: AcquisitionState::NotStarted,
            loaded: None,
            load_seq: 0,
            tx,
            rx,
        }
    }

    #[inline]
    pub fn state(&self) -> &AcquisitionState {
        &self.state
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.state == AcquisitionState::Loading
    }

    /// The most recent successful publication, if any.
    pub fn loaded(&self) -> Option<Arc<LoadedMap>> {
        self.loaded.clone()
    }

    /// Begin loading in the background.
    ///
    /// Returns `false` (and does nothing) while a load is already running.
    pub fn start(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        self.load_seq += 1;
        self.state = AcquisitionState::Loading;
        info!(place = %self.settings.place, radius_m = self.settings.radius_m, "map load started");

        let seq      = self.load_seq;
        let settings = self.settings.clone();
        let geocoder = Arc::clone(&self.geocoder);
        let graphs   = Arc::clone(&self.graphs);
        let tx       = self.tx.clone();

        let spawned = thread::Builder::new()
            .name("nav-map-load".into())
            .spawn(move || {
                let outcome = acquire(&settings, geocoder, graphs);
                let _ = tx.send((seq, outcome));
            });

        if let Err(e) = spawned {
            let err = ProviderError::Transport(format!("cannot spawn map loader: {e}"));
            let _ = self.tx.send((seq, Err(err.into())));
        }
        true
    }

    /// Apply a finished load, if one is waiting.  Never blocks.
    pub fn poll(&mut self) -> Option<AcquisitionEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(outcome) => {
                    if let Some(event) = self.apply(outcome) {
                        return Some(event);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Block until the current load finishes or `timeout` elapses.
    ///
    /// Starts a load if none has been started.  Meant for host start-up and
    /// tests, never for the tick thread.
    pub fn wait_ready(&mut self, timeout: Duration) -> Result<Arc<LoadedMap>, AcquisitionError> {
        if self.state == AcquisitionState::NotStarted {
            self.start();
        }
        let deadline = Instant::now() + timeout;
        loop {
            match &self.state {
                AcquisitionState::Ready => {
                    return self.loaded.clone().ok_or(AcquisitionError::Disconnected);
                }
                AcquisitionState::Failed(e) => return Err(e.clone()),
                AcquisitionState::NotStarted | AcquisitionState::Loading => {}
            }
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(outcome) => {
                    self.apply(outcome);
                }
                Err(RecvTimeoutError::Timeout) => return Err(AcquisitionError::Timeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => return Err(AcquisitionError::Disconnected),
            }
        }
    }

    fn apply(&mut self, (seq, outcome): LoadOutcome) -> Option<AcquisitionEvent> {
        if seq != self.load_seq {
            debug!(seq, current = self.load_seq, "stale map load discarded");
            return None;
        }
        match outcome {
            Ok(map) => {
                let map = Arc::new(map);
                info!(
                    place = %map.place,
                    nodes = map.graph.node_count(),
                    edges = map.graph.edge_count(),
                    "map ready"
                );
                self.loaded = Some(Arc::clone(&map));
                self.state = AcquisitionState::Ready;
                Some(AcquisitionEvent::Ready(map))
            }
            Err(e) => {
                warn!(error = %e, "map load failed");
                self.state = AcquisitionState::Failed(e.clone());
                Some(AcquisitionEvent::Failed(e))
            }
        }
    }
}

/// The loader thread body.
fn acquire(
    settings: &AcquisitionSettings,
    geocoder: Arc<dyn GeocodeProvider>,
    graphs:   Arc<dyn GraphProvider>,
) -> Result<LoadedMap, AcquisitionError> {
    let place   = settings.place.clone();
    let timeout = settings.geocode_timeout;
    let center = call_with_timeout(timeout, move || geocoder.resolve(&place, timeout))?
        .ok_or_else(|| AcquisitionError::PlaceNotFound(settings.place.clone()))?;
    debug!(%center, "base place geocoded");

    let radius_m = settings.radius_m;
    let graph = call_with_timeout(settings.fetch_timeout, move || {
        graphs.fetch_drivable_graph(center, radius_m)
    })?;
    if graph.is_empty() {
        return Err(AcquisitionError::GraphEmpty);
    }

    LoadedMap::build(settings.place.clone(), center, graph, settings.plane_span, settings.reference_lat)
}
