//! The navigation session state machine.
//!
//! # Frame loop
//!
//! ```text
//! tick(dt):
//!   ① Transient  — GeocodeFailed / RouteNotFound from the previous frame → Idle
//!   ② Map        — apply a finished map load (place vehicle, dispatch a
//!                  deferred request)
//!   ③ Deadline   — drop a deferred request whose map wait ran out
//!   ④ Results    — drain geocode / route results; stale generations dropped
//!   ⑤ Motion     — advance the vehicle; arrival → Arrived
//!   ⑥ Report     — status transitions to the observer
//! ```
//!
//! Nothing in `tick` blocks: background work is only ever collected with
//! `try_recv`.

use std::mem;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use nav_core::{FrameClock, GeoPoint, NavConfig, Tick};
use nav_motion::{MotionEvent, MotionPlan, MotionSimulator, VehicleState};
use nav_spatial::{DijkstraRouter, Route, RoutePlanner, Router, SpatialError};

use crate::acquisition::{AcquisitionError, AcquisitionEvent, LoadedMap, MapAcquisitionService};
use crate::geocoder::{GeocodeError, Geocoder};
use crate::observer::{NoopObserver, SessionObserver};
use crate::snapshot::SessionSnapshot;
use crate::status::SessionStatus;
use crate::task::{Generation, TaskResult};
use crate::{SessionError, SessionResult};

/// Notice shown when the destination snaps to the vehicle's own node.
pub const ALREADY_AT_DESTINATION: &str = "already at destination";

/// What became of a destination request.
#[derive(Debug)]
pub enum RequestOutcome {
    /// Geocoding started under this generation.
    Dispatched(Generation),
    /// Held until the map is ready (or the wait times out).
    Deferred(Generation),
    Rejected(SessionError),
}

struct PendingRequest {
    query:      String,
    generation: Generation,
    deadline:   Instant,
}

/// Owns the session: map, vehicle, route and status.
///
/// All fields are touched only from the thread calling [`tick`](Self::tick)
/// and [`request_destination`](Self::request_destination).  Background tasks
/// communicate exclusively through the task channel.
///
/// Build one with [`ControllerBuilder`](crate::ControllerBuilder).
pub struct NavigationController<R: Router = DijkstraRouter> {
    config:          NavConfig,
    clock:           FrameClock,
    acquisition:     MapAcquisitionService,
    geocoder:        Geocoder,
    router:          R,
    status:          SessionStatus,
    transient_since: Option<Tick>,
    transitions:     Vec<(SessionStatus, SessionStatus)>,
    map:             Option<Arc<LoadedMap>>,
    motion:          MotionSimulator,
    route:           Option<Arc<Route>>,
    destination:     Option<String>,
    notice:          Option<String>,
    generation:      Generation,
    pending:         Option<PendingRequest>,
    tasks_tx:        Sender<TaskResult>,
    tasks_rx:        Receiver<TaskResult>,
}

impl<R: Router + Clone + 'static> NavigationController<R> {
    pub(crate) fn from_parts(
        config:      NavConfig,
        acquisition: MapAcquisitionService,
        geocoder:    Geocoder,
        router:      R,
    ) -> Self {
        let (tasks_tx, tasks_rx) = crossbeam_channel::unbounded();
        Self {
            clock: FrameClock::new(config.tick_rate_hz, config.max_dt_secs),
            motion: MotionSimulator::new(config.cruise_speed_mps(), config.max_dt_secs),
            config,
            acquisition,
            geocoder,
            router,
            status: SessionStatus::Starting,
            transient_since: None,
            transitions: Vec::new(),
            map: None,
            route: None,
            destination: None,
            notice: None,
            generation: Generation::default(),
            pending: None,
            tasks_tx,
            tasks_rx,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[inline]
    pub fn vehicle(&self) -> &VehicleState {
        self.motion.state()
    }

    #[inline]
    pub fn map(&self) -> Option<&Arc<LoadedMap>> {
        self.map.as_ref()
    }

    #[inline]
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    #[inline]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[inline]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    #[inline]
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Frame number of the next tick.
    #[inline]
    pub fn frame(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status:      self.status.clone(),
            vehicle:     *self.motion.state(),
            route:       self.route.clone(),
            map:         self.map.clone(),
            destination: self.destination.clone(),
            notice:      self.notice.clone(),
            eta_secs:    self.motion.eta_secs(),
            progress:    self.motion.progress(),
            frame:       self.clock.current_tick,
        }
    }

    // ── Map lifecycle ─────────────────────────────────────────────────────

    /// Start loading the map.  Returns `false` while a load is running.
    pub fn start(&mut self) -> bool {
        if !self.acquisition.start() {
            return false;
        }
        if self.map.is_none() {
            self.set_status(SessionStatus::LoadingMap);
        }
        true
    }

    /// Load the map again for the configured base place.
    ///
    /// A session with a map keeps driving on it until the new one arrives; a
    /// failed reload leaves it in place.
    pub fn reload_map(&mut self) -> bool {
        self.start()
    }

    /// Block until the map is published or `timeout` elapses.
    ///
    /// For host start-up and tests only; `tick` never waits.  Observers do not
    /// get `on_map_ready` for a map applied here, but the status transitions
    /// are reported on the next tick.
    pub fn wait_for_map(&mut self, timeout: Duration) -> SessionResult<Arc<LoadedMap>> {
        if let Some(map) = &self.map {
            if !self.acquisition.is_loading() {
                return Ok(Arc::clone(map));
            }
        }
        if self.status == SessionStatus::Starting {
            self.start();
        }
        match self.acquisition.wait_ready(timeout) {
            Ok(map) => {
                let fresh = !self.map.as_ref().is_some_and(|m| Arc::ptr_eq(m, &map));
                if fresh {
                    self.apply_acquisition(AcquisitionEvent::Ready(Arc::clone(&map)), &mut NoopObserver);
                }
                Ok(map)
            }
            Err(AcquisitionError::Timeout(t)) => Err(AcquisitionError::Timeout(t).into()),
            Err(e) => {
                if self.map.is_some() || self.status == SessionStatus::LoadingMap {
                    self.apply_acquisition(AcquisitionEvent::Failed(e.clone()), &mut NoopObserver);
                }
                Err(e.into())
            }
        }
    }

    // ── Requests ──────────────────────────────────────────────────────────

    /// Ask to drive to `text`.  Never blocks.
    ///
    /// Supersedes any request in flight and halts the vehicle where it is.
    pub fn request_destination(&mut self, text: &str) -> RequestOutcome {
        let query = text.trim();
        if query.is_empty() {
            return RequestOutcome::Rejected(GeocodeError::EmptyQuery.into());
        }

        if matches!(self.status, SessionStatus::MapLoadFailed(_)) || (self.map.is_none() && !self.status.awaiting_map()) {
            warn!(query, "destination rejected: map not ready");
            self.notice = Some(SessionError::MapNotReady.to_string());
            return RequestOutcome::Rejected(SessionError::MapNotReady);
        }

        self.generation = self.generation.next();
        let generation = self.generation;

        if self.map.is_none() {
            info!(query, %generation, "destination deferred until the map is ready");
            self.pending = Some(PendingRequest {
                query: query.to_owned(),
                generation,
                deadline: Instant::now() + self.config.map_ready_timeout(),
            });
            return RequestOutcome::Deferred(generation);
        }

        match self.dispatch(generation, query) {
            Ok(()) => RequestOutcome::Dispatched(generation),
            Err(e) => RequestOutcome::Rejected(e),
        }
    }

    fn dispatch(&mut self, generation: Generation, query: &str) -> SessionResult<()> {
        self.motion.halt();
        self.route = None;
        self.pending = None;
        self.destination = Some(query.to_owned());
        self.notice = None;
        self.set_status(SessionStatus::Geocoding(query.to_owned()));
        info!(query, %generation, "destination requested");

        if let Err(e) = self.geocoder.spawn(generation, query, self.tasks_tx.clone()) {
            warn!(error = %e, "cannot start geocoding");
            self.notice = Some(e.to_string());
            self.set_status(SessionStatus::GeocodeFailed(query.to_owned()));
            return Err(e.into());
        }
        Ok(())
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance one frame by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        self.tick_observed(dt, &mut NoopObserver);
    }

    /// Advance one frame, reporting to `observer`.
    pub fn tick_observed<O: SessionObserver>(&mut self, dt: f64, observer: &mut O) {
        let frame = self.clock.current_tick;
        observer.on_tick_start(frame);

        // ① Transient statuses last one frame.
        if self.status.is_transient() && self.transient_since.is_some_and(|t| t < frame) {
            self.set_status(SessionStatus::Idle);
        }

        // ② Map publication.
        if let Some(event) = self.acquisition.poll() {
            self.apply_acquisition(event, observer);
        }

        // ③ Deferred request deadline.
        self.expire_pending();

        // ④ Background results.
        while let Ok(result) = self.tasks_rx.try_recv() {
            self.apply_task(result);
        }

        // ⑤ Motion.
        let mut arrived = None;
        if self.motion.tick(self.clock.clamp_dt(dt)) == MotionEvent::Arrived {
            let destination = self.destination.clone().unwrap_or_default();
            info!(%destination, elapsed_secs = self.motion.state().elapsed_secs, "arrived");
            self.notice = None;
            self.set_status(SessionStatus::Arrived(destination.clone()));
            arrived = Some(destination);
        }

        // ⑥ Report.
        for (from, to) in mem::take(&mut self.transitions) {
            observer.on_status_change(frame, &from, &to);
        }
        if let Some(destination) = arrived {
            observer.on_arrival(frame, &destination);
        }
        observer.on_tick_end(frame, self.motion.state());
        self.clock.advance();
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn set_status(&mut self, next: SessionStatus) {
        if next == self.status {
            return;
        }
        info!(from = %self.status, to = %next, "status changed");
        let prev = mem::replace(&mut self.status, next);
        if self.status.is_transient() {
            self.transient_since = Some(self.clock.current_tick);
        }
        self.transitions.push((prev, self.status.clone()));
    }

    fn apply_acquisition<O: SessionObserver>(&mut self, event: AcquisitionEvent, observer: &mut O) {
        match event {
            AcquisitionEvent::Ready(map) => {
                let replacing = self.map.is_some();
                if replacing {
                    // In-flight results refer to the old graph.
                    self.motion.halt();
                    self.route = None;
                    self.generation = self.generation.next();
                    self.notice = Some("map reloaded".to_owned());
                }
                // A reload keeps the vehicle where it stands on the globe.
                let here = self
                    .map
                    .as_ref()
                    .and_then(|old| old.projector.unproject(self.motion.state().position).ok())
                    .unwrap_or(map.center);
                match map.projector.project(here) {
                    Ok(start) => self.motion.place(start),
                    Err(e) => warn!(error = %e, "cannot place vehicle on new map"),
                }
                self.map = Some(Arc::clone(&map));
                observer.on_map_ready(self.clock.current_tick, &map);
                self.set_status(SessionStatus::Idle);

                if let Some(pending) = self.pending.take() {
                    if Instant::now() <= pending.deadline && pending.generation == self.generation {
                        let _ = self.dispatch(pending.generation, &pending.query);
                    } else {
                        self.drop_pending(pending);
                    }
                }
            }
            AcquisitionEvent::Failed(e) => {
                if let Some(pending) = self.pending.take() {
                    self.drop_pending(pending);
                }
                if self.map.is_some() {
                    self.notice = Some(format!("map reload failed: {e}"));
                } else {
                    self.set_status(SessionStatus::MapLoadFailed(e.to_string()));
                }
            }
        }
    }

    fn expire_pending(&mut self) {
        if self.pending.as_ref().is_some_and(|p| Instant::now() > p.deadline) {
            if let Some(pending) = self.pending.take() {
                self.drop_pending(pending);
            }
        }
    }

    fn drop_pending(&mut self, pending: PendingRequest) {
        warn!(query = %pending.query, generation = %pending.generation, "deferred destination dropped: map not ready");
        self.notice = Some(SessionError::MapNotReady.to_string());
    }

    fn apply_task(&mut self, result: TaskResult) {
        if result.generation() != self.generation {
            debug!(stale = %result.generation(), current = %self.generation, "stale result discarded");
            return;
        }
        match result {
            TaskResult::Geocoded { query, result, .. } => {
                if !matches!(self.status, SessionStatus::Geocoding(_)) {
                    return;
                }
                match result {
                    Ok(target) => {
                        debug!(%query, %target, "destination geocoded");
                        self.set_status(SessionStatus::Routing);
                        self.spawn_route(target);
                    }
                    Err(e) => {
                        warn!(%query, error = %e, "geocoding failed");
                        self.notice = Some(e.to_string());
                        self.set_status(SessionStatus::GeocodeFailed(query));
                    }
                }
            }
            TaskResult::Routed { result, .. } => {
                if self.status != SessionStatus::Routing {
                    return;
                }
                match result {
                    Ok(route) => self.start_motion(route),
                    Err(SpatialError::SameNode(node)) => {
                        info!(%node, "destination is the current node");
                        self.notice = Some(ALREADY_AT_DESTINATION.to_owned());
                        self.set_status(SessionStatus::Idle);
                    }
                    Err(e) => self.route_failed(e.to_string()),
                }
            }
        }
    }

    fn spawn_route(&mut self, target: GeoPoint) {
        let Some(map) = self.map.clone() else {
            self.route_failed(SessionError::MapNotReady.to_string());
            return;
        };
        let from = match map.projector.unproject(self.motion.state().position) {
            Ok(p) => p,
            Err(e) => {
                self.route_failed(e.to_string());
                return;
            }
        };

        let generation = self.generation;
        let router     = self.router.clone();
        let sink       = self.tasks_tx.clone();
        let spawned = thread::Builder::new()
            .name("nav-route".into())
            .spawn(move || {
                let planner = RoutePlanner::with_router(Arc::clone(&map.graph), router);
                let result  = planner.plan_between(from, target);
                let _ = sink.send(TaskResult::Routed { generation, result });
            });
        if let Err(e) = spawned {
            self.route_failed(format!("cannot start route planning: {e}"));
        }
    }

    fn start_motion(&mut self, route: Route) {
        let Some(map) = self.map.clone() else {
            self.route_failed(SessionError::MapNotReady.to_string());
            return;
        };
        let route = Arc::new(route);
        let speed = self.config.cruise_speed_mps();
        let begun = MotionPlan::new(Arc::clone(&route), &map.graph, &map.projector, map.reference_lat, speed)
            .and_then(|plan| self.motion.begin(plan));

        match begun {
            Ok(()) => {
                let destination = self.destination.clone().unwrap_or_default();
                let km = route.total_m / 1_000.0;
                info!(%destination, nodes = route.node_sequence.len(), km, "route started");
                self.notice = Some(format!("Navigating to {destination} ({km:.2} km)"));
                self.route = Some(route);
                self.set_status(SessionStatus::Moving(destination));
            }
            Err(e) => self.route_failed(e.to_string()),
        }
    }

    fn route_failed(&mut self, reason: String) {
        warn!(%reason, "no route");
        self.notice = Some(reason);
        self.set_status(SessionStatus::RouteNotFound);
    }
}
