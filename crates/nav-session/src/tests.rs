//! Tests for nav-session.
//!
//! Providers are in-memory; "slow" providers sleep on their own worker
//! thread, so every test runs in well under a second of wall time unless it
//! is deliberately waiting on a timeout.

use std::thread;
use std::time::{Duration, Instant};

use nav_core::{GeoPoint, NavConfig, RoadClass};
use nav_spatial::{RoadGraph, RoadGraphBuilder};

use crate::{
    ControllerBuilder, Gazetteer, GeocodeProvider, GraphProvider, NavigationController, NoopObserver,
    ProviderError, SessionObserver, StaticGraphProvider,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// One kilometre of latitude, in degrees (R = 6 371 km).
const LAT_1KM: f64 = 1_000.0 / 111_194.926_644_558_74;

const A: GeoPoint = GeoPoint { lat: 0.0, lon: 0.0 };
const B: GeoPoint = GeoPoint { lat: LAT_1KM, lon: 0.0 };
const C: GeoPoint = GeoPoint { lat: LAT_1KM, lon: LAT_1KM };

/// A ── B ── C: north 1 km, then east 1 km.
fn scenario_graph() -> RoadGraph {
    let mut b = RoadGraphBuilder::new();
    let a  = b.add_node(A);
    let bb = b.add_node(B);
    let c  = b.add_node(C);
    b.add_road_geodesic(a, bb, RoadClass::Residential);
    b.add_road_geodesic(bb, c, RoadClass::Residential);
    b.build()
}

fn gazetteer() -> Gazetteer {
    Gazetteer::new()
        .with_place("Base", A)
        .with_place("A", A)
        .with_place("B", B)
        .with_place("C", C)
        .with_place("Slow", C)
}

fn test_config() -> NavConfig {
    NavConfig {
        base_place:              "Base".into(),
        base_geocode_timeout_ms: 2_000,
        graph_fetch_timeout_ms:  2_000,
        destination_timeout_ms:  2_000,
        map_ready_timeout_ms:    5_000,
        ..NavConfig::default()
    }
}

/// Gazetteer that sleeps before answering one particular query.
struct DelayedGazetteer {
    inner: Gazetteer,
    slow:  &'static str,
    delay: Duration,
}

impl DelayedGazetteer {
    fn new(slow: &'static str, delay: Duration) -> Self {
        Self { inner: gazetteer(), slow, delay }
    }
}

impl GeocodeProvider for DelayedGazetteer {
    fn resolve(&self, query: &str, timeout: Duration) -> Result<Option<GeoPoint>, ProviderError> {
        if query.eq_ignore_ascii_case(self.slow) {
            thread::sleep(self.delay);
        }
        self.inner.resolve(query, timeout)
    }
}

/// Graph provider that sleeps before every fetch.
struct SlowGraph {
    inner: StaticGraphProvider,
    delay: Duration,
}

impl GraphProvider for SlowGraph {
    fn fetch_drivable_graph(&self, center: GeoPoint, radius_m: f64) -> Result<RoadGraph, ProviderError> {
        thread::sleep(self.delay);
        self.inner.fetch_drivable_graph(center, radius_m)
    }
}

struct EmptyGraph;

impl GraphProvider for EmptyGraph {
    fn fetch_drivable_graph(&self, _center: GeoPoint, _radius_m: f64) -> Result<RoadGraph, ProviderError> {
        Ok(RoadGraph::empty())
    }
}

fn controller_with(geocoder: impl GeocodeProvider, graphs: impl GraphProvider, config: NavConfig) -> NavigationController {
    ControllerBuilder::new(config, geocoder, graphs).build().unwrap()
}

/// Controller over the A-B-C graph with the map already loaded.
fn ready_controller() -> NavigationController {
    let mut nav = controller_with(gazetteer(), StaticGraphProvider::new(scenario_graph()), test_config());
    nav.wait_for_map(Duration::from_secs(5)).unwrap();
    nav
}

/// Tick at 60 Hz until `done` holds, sleeping briefly between ticks so
/// background threads get to run.  Gives up after `limit` of wall time.
fn tick_until_observed<O: SessionObserver>(
    nav:   &mut NavigationController,
    obs:   &mut O,
    limit: Duration,
    done:  impl Fn(&NavigationController) -> bool,
) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        nav.tick_observed(1.0 / 60.0, obs);
        if done(nav) {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

fn tick_until(nav: &mut NavigationController, done: impl Fn(&NavigationController) -> bool) -> bool {
    tick_until_observed(nav, &mut NoopObserver, Duration::from_secs(5), done)
}

// ── Providers & timeout helper ────────────────────────────────────────────────

#[cfg(test)]
mod provider {
    use super::*;
    use crate::call_with_timeout;

    #[test]
    fn returns_result_within_timeout() {
        let v = call_with_timeout(Duration::from_secs(1), || Ok::<_, ProviderError>(42)).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn overrun_is_timeout() {
        let started = Instant::now();
        let result = call_with_timeout(Duration::from_millis(20), || {
            thread::sleep(Duration::from_millis(500));
            Ok::<_, ProviderError>(())
        });
        assert_eq!(result, Err(ProviderError::Timeout(Duration::from_millis(20))));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn provider_error_passes_through() {
        let result: Result<(), _> =
            call_with_timeout(Duration::from_secs(1), || Err(ProviderError::Transport("down".into())));
        assert_eq!(result, Err(ProviderError::Transport("down".into())));
    }

    #[test]
    fn panicking_provider_is_transport_error() {
        let result: Result<(), _> = call_with_timeout(Duration::from_secs(1), || panic!("provider blew up"));
        assert!(matches!(result, Err(ProviderError::Transport(_))));
    }
}

// ── Gazetteer ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod gazetteer {
    use std::io::Cursor;

    use super::*;
    use crate::SessionError;

    #[test]
    fn names_match_loosely() {
        let g = Gazetteer::new().with_place("Eke Awka  Market", GeoPoint::new(6.21, 7.07));
        assert_eq!(g.lookup("eke awka market"), Some(GeoPoint::new(6.21, 7.07)));
        assert_eq!(g.lookup("  EKE   Awka Market "), Some(GeoPoint::new(6.21, 7.07)));
        assert_eq!(g.lookup("Eke Awka Market, Awka"), Some(GeoPoint::new(6.21, 7.07)));
        assert_eq!(g.lookup("zzz_nonexistent_place"), None);
    }

    #[test]
    fn literal_coordinates() {
        let g = Gazetteer::new();
        assert_eq!(g.lookup("6.25, 7.1"), Some(GeoPoint::new(6.25, 7.1)));
        assert_eq!(g.lookup("95.0, 7.1"), None);
    }

    #[test]
    fn loads_csv() {
        let csv = "name,lat,lon\nAwka,6.2107,7.0722\nNnewi,6.0177,6.9170\n";
        let g = Gazetteer::from_csv_reader(Cursor::new(csv)).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.lookup("nnewi"), Some(GeoPoint::new(6.0177, 6.9170)));
    }

    #[test]
    fn bad_row_is_config_error() {
        let csv = "name,lat,lon\nAwka,north,7.0\n";
        assert!(matches!(Gazetteer::from_csv_reader(Cursor::new(csv)), Err(SessionError::Core(_))));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.csv");
        std::fs::write(&path, "name,lat,lon\nAwka,6.2107,7.0722\n").unwrap();
        let g = Gazetteer::from_csv_path(&path).unwrap();
        assert_eq!(g.lookup("awka"), Some(GeoPoint::new(6.2107, 7.0722)));
    }

    #[test]
    fn static_provider_clips_to_radius() {
        let provider = StaticGraphProvider::new(scenario_graph());
        let near = provider.fetch_drivable_graph(A, 500.0).unwrap();
        assert_eq!(near.node_count(), 1);
        let all = provider.fetch_drivable_graph(A, 12_000.0).unwrap();
        assert_eq!(all.node_count(), 3);
    }
}

// ── Geocoder ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod geocoder {
    use std::sync::Arc;

    use super::*;
    use crate::{GeocodeError, Geocoder, Generation, TaskResult};

    fn geocoder(timeout: Duration) -> Geocoder {
        Geocoder::new(Arc::new(DelayedGazetteer::new("Slow", Duration::from_millis(500))), timeout)
    }

    #[test]
    fn resolves_known_place() {
        assert_eq!(geocoder(Duration::from_secs(1)).resolve("C").unwrap(), C);
    }

    #[test]
    fn unknown_place_is_not_found() {
        let err = geocoder(Duration::from_secs(1)).resolve("zzz_nonexistent_place").unwrap_err();
        assert_eq!(err, GeocodeError::NotFound("zzz_nonexistent_place".into()));
    }

    #[test]
    fn blank_query_rejected() {
        let g = geocoder(Duration::from_secs(1));
        assert_eq!(g.resolve("   "), Err(GeocodeError::EmptyQuery));
        let (tx, _rx) = crossbeam_channel::unbounded();
        assert_eq!(g.spawn(Generation(1), "", tx), Err(GeocodeError::EmptyQuery));
    }

    #[test]
    fn slow_provider_times_out() {
        let err = geocoder(Duration::from_millis(30)).resolve("Slow").unwrap_err();
        assert_eq!(err, GeocodeError::Provider(ProviderError::Timeout(Duration::from_millis(30))));
    }

    #[test]
    fn spawn_posts_tagged_result() {
        let (tx, rx) = crossbeam_channel::unbounded();
        geocoder(Duration::from_secs(1)).spawn(Generation(7), " B ", tx).unwrap();
        match rx.recv_timeout(Duration::from_secs(2)).unwrap() {
            TaskResult::Geocoded { generation, query, result } => {
                assert_eq!(generation, Generation(7));
                assert_eq!(query, "B");
                assert_eq!(result, Ok(B));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

// ── Map acquisition ───────────────────────────────────────────────────────────

#[cfg(test)]
mod acquisition {
    use std::sync::Arc;

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{AcquisitionError, AcquisitionState, MapAcquisitionService};

    /// Knows the base place only on the first lookup.
    struct Forgetful(AtomicUsize);

    impl GeocodeProvider for Forgetful {
        fn resolve(&self, _query: &str, _timeout: Duration) -> Result<Option<GeoPoint>, ProviderError> {
            Ok((self.0.fetch_add(1, Ordering::SeqCst) == 0).then_some(A))
        }
    }

    fn service(geocoder: impl GeocodeProvider, graphs: impl GraphProvider, config: &NavConfig) -> MapAcquisitionService {
        MapAcquisitionService::new(config.into(), Arc::new(geocoder), Arc::new(graphs))
    }

    #[test]
    fn loads_graph_and_calibration_together() {
        let mut svc = service(gazetteer(), StaticGraphProvider::new(scenario_graph()), &test_config());
        assert_eq!(svc.state(), &AcquisitionState::NotStarted);
        let map = svc.wait_ready(Duration::from_secs(5)).unwrap();
        assert_eq!(svc.state(), &AcquisitionState::Ready);
        assert_eq!(map.graph.node_count(), 3);
        assert_eq!(map.center, A);
        assert_eq!(map.reference_lat, A.lat);
        assert_eq!(map.place, "Base");

        let cal = map.calibration().unwrap();
        assert_eq!(cal.origin_lon, 0.0);
        assert_eq!(cal.origin_lat, LAT_1KM);
        assert!((cal.scale - 3_000.0 / LAT_1KM).abs() < 1e-6);
    }

    #[test]
    fn configured_reference_latitude_wins() {
        let config = NavConfig { reference_lat: Some(6.2), ..test_config() };
        let mut svc = service(gazetteer(), StaticGraphProvider::new(scenario_graph()), &config);
        assert_eq!(svc.wait_ready(Duration::from_secs(5)).unwrap().reference_lat, 6.2);
    }

    #[test]
    fn unknown_base_place() {
        let config = NavConfig { base_place: "Atlantis".into(), ..test_config() };
        let mut svc = service(gazetteer(), StaticGraphProvider::new(scenario_graph()), &config);
        let err = svc.wait_ready(Duration::from_secs(5)).unwrap_err();
        assert_eq!(err, AcquisitionError::PlaceNotFound("Atlantis".into()));
        assert!(matches!(svc.state(), AcquisitionState::Failed(_)));
    }

    #[test]
    fn empty_graph_fails() {
        let mut svc = service(gazetteer(), EmptyGraph, &test_config());
        assert_eq!(svc.wait_ready(Duration::from_secs(5)).unwrap_err(), AcquisitionError::GraphEmpty);
    }

    #[test]
    fn single_node_graph_is_degenerate() {
        let mut b = RoadGraphBuilder::new();
        b.add_node(A);
        let mut svc = service(gazetteer(), StaticGraphProvider::new(b.build()), &test_config());
        assert!(matches!(
            svc.wait_ready(Duration::from_secs(5)),
            Err(AcquisitionError::DegenerateBoundingBox { .. })
        ));
    }

    #[test]
    fn slow_fetch_times_out() {
        let config = NavConfig { graph_fetch_timeout_ms: 30, ..test_config() };
        let slow = SlowGraph { inner: StaticGraphProvider::new(scenario_graph()), delay: Duration::from_millis(500) };
        let mut svc = service(gazetteer(), slow, &config);
        assert_eq!(
            svc.wait_ready(Duration::from_secs(5)).unwrap_err(),
            AcquisitionError::Provider(ProviderError::Timeout(Duration::from_millis(30)))
        );
    }

    #[test]
    fn poll_does_not_block_and_start_is_idempotent_while_loading() {
        let slow = SlowGraph { inner: StaticGraphProvider::new(scenario_graph()), delay: Duration::from_millis(200) };
        let mut svc = service(gazetteer(), slow, &test_config());
        assert!(svc.start());
        assert!(!svc.start());

        let started = Instant::now();
        assert!(svc.poll().is_none());
        assert!(started.elapsed() < Duration::from_millis(50));

        let map = svc.wait_ready(Duration::from_secs(5)).unwrap();
        assert!(Arc::ptr_eq(&map, &svc.loaded().unwrap()));
        assert!(svc.poll().is_none());
    }

    #[test]
    fn wait_ready_times_out() {
        let slow = SlowGraph { inner: StaticGraphProvider::new(scenario_graph()), delay: Duration::from_millis(500) };
        let mut svc = service(gazetteer(), slow, &test_config());
        assert_eq!(
            svc.wait_ready(Duration::from_millis(20)).unwrap_err(),
            AcquisitionError::Timeout(Duration::from_millis(20))
        );
        assert!(svc.is_loading());
    }

    #[test]
    fn failed_reload_keeps_previous_map() {
        let geocoder = Forgetful(AtomicUsize::new(0));
        let mut svc = service(geocoder, StaticGraphProvider::new(scenario_graph()), &test_config());
        let first = svc.wait_ready(Duration::from_secs(5)).unwrap();

        assert!(svc.start());
        assert_eq!(
            svc.wait_ready(Duration::from_secs(5)).unwrap_err(),
            AcquisitionError::PlaceNotFound("Base".into())
        );
        assert!(Arc::ptr_eq(&first, &svc.loaded().unwrap()));
    }
}

// ── Status ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod status {
    use crate::SessionStatus;

    #[test]
    fn display_lines() {
        assert_eq!(SessionStatus::Moving("Eke Awka".into()).to_string(), "Navigating to Eke Awka");
        assert_eq!(SessionStatus::Arrived("Eke Awka".into()).to_string(), "Arrived at Eke Awka!");
        assert_eq!(SessionStatus::GeocodeFailed("zzz".into()).to_string(), "Cannot find 'zzz'.");
        assert!(SessionStatus::MapLoadFailed("boom".into()).to_string().contains("boom"));
    }

    #[test]
    fn transient_statuses() {
        assert!(SessionStatus::GeocodeFailed("x".into()).is_transient());
        assert!(SessionStatus::RouteNotFound.is_transient());
        assert!(!SessionStatus::Idle.is_transient());
        assert!(!SessionStatus::MapLoadFailed("x".into()).is_transient());
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod controller {
    use super::*;
    use crate::{
        ALREADY_AT_DESTINATION, Generation, LoadedMap, RequestOutcome, SessionError, SessionStatus, StatusLog,
    };

    fn close(a: GeoPoint, b: GeoPoint) -> bool {
        (a.lat - b.lat).abs() < 1e-6 && (a.lon - b.lon).abs() < 1e-6
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let config = NavConfig { cruise_speed_kmh: 0.0, ..test_config() };
        let result = ControllerBuilder::new(config, gazetteer(), EmptyGraph).build();
        assert!(matches!(result, Err(SessionError::Core(_))));
    }

    #[test]
    fn map_load_places_vehicle_at_base() {
        let mut nav = controller_with(gazetteer(), StaticGraphProvider::new(scenario_graph()), test_config());
        assert_eq!(nav.status(), &SessionStatus::LoadingMap);

        struct MapWatch(usize);
        impl SessionObserver for MapWatch {
            fn on_map_ready(&mut self, _frame: nav_core::Tick, map: &LoadedMap) {
                assert_eq!(map.graph.node_count(), 3);
                self.0 += 1;
            }
        }
        let mut watch = MapWatch(0);
        assert!(tick_until_observed(&mut nav, &mut watch, Duration::from_secs(5), |n| {
            n.status() == &SessionStatus::Idle
        }));
        assert_eq!(watch.0, 1);

        let snap = nav.snapshot();
        assert!(snap.road_graph().is_some());
        assert!(snap.calibration().is_some());
        assert!(close(snap.vehicle_geo().unwrap(), A));
        assert!(!snap.vehicle.moving);
    }

    #[test]
    fn transitions_are_reported_in_order() {
        let mut nav = controller_with(gazetteer(), StaticGraphProvider::new(scenario_graph()), test_config());
        let mut log = StatusLog::new();
        assert!(tick_until_observed(&mut nav, &mut log, Duration::from_secs(5), |n| {
            n.status() == &SessionStatus::Idle
        }));
        let entered: Vec<_> = log.entered().cloned().collect();
        assert_eq!(entered, vec![SessionStatus::LoadingMap, SessionStatus::Idle]);
    }

    #[test]
    fn scenario_a_two_segment_route() {
        let mut nav = ready_controller();
        assert!(matches!(nav.request_destination("C"), RequestOutcome::Dispatched(_)));
        assert_eq!(nav.status(), &SessionStatus::Geocoding("C".into()));

        assert!(tick_until(&mut nav, |n| matches!(n.status(), SessionStatus::Moving(_))));
        let snap = nav.snapshot();
        let route = snap.route.clone().unwrap();
        assert_eq!(route.segment_count(), 2);
        assert!((route.total_m - 2_000.0).abs() <= 20.0, "total {}", route.total_m);
        assert_eq!(snap.destination.as_deref(), Some("C"));
        assert_eq!(snap.route_polyline(), vec![A, B, C]);
        assert!(snap.eta_secs.unwrap() > 0.0);
    }

    #[test]
    fn drives_to_arrival() {
        let mut nav = ready_controller();
        nav.request_destination("C");
        assert!(tick_until(&mut nav, |n| matches!(n.status(), SessionStatus::Moving(_))));
        let total = nav.route().unwrap().total_m;

        let mut log = StatusLog::new();
        let mut ticks = 0;
        while nav.status() != &SessionStatus::Arrived("C".into()) && ticks < 10_000 {
            nav.tick_observed(0.1, &mut log);
            ticks += 1;
        }
        let snap = nav.snapshot();
        assert_eq!(snap.status, SessionStatus::Arrived("C".into()));
        assert_eq!(snap.vehicle.remaining_m, 0.0);
        assert_eq!(snap.vehicle.segment_index, 2);
        assert_eq!(snap.progress, 1.0);
        assert!(close(snap.vehicle_geo().unwrap(), C));
        assert_eq!(log.arrivals.len(), 1);
        assert_eq!(log.arrivals[0].1, "C");

        // ~2 km at 50 km/h is ~144 s.
        let expected = total / nav.config().cruise_speed_mps();
        assert!((snap.vehicle.elapsed_secs - expected).abs() < 2.0);
    }

    #[test]
    fn scenario_b_already_at_destination() {
        let mut nav = ready_controller();
        nav.request_destination("Base");
        assert!(tick_until(&mut nav, |n| n.notice().is_some()));
        assert_eq!(nav.notice(), Some(ALREADY_AT_DESTINATION));
        assert_eq!(nav.status(), &SessionStatus::Idle);
        assert!(nav.route().is_none());
        assert!(!nav.vehicle().moving);
    }

    #[test]
    fn scenario_c_unknown_destination() {
        let mut nav = ready_controller();
        let before = *nav.vehicle();
        nav.request_destination("zzz_nonexistent_place");

        let mut log = StatusLog::new();
        let failed = SessionStatus::GeocodeFailed("zzz_nonexistent_place".into());
        assert!(tick_until_observed(&mut nav, &mut log, Duration::from_secs(5), |n| n.status() == &failed));
        assert!(nav.notice().unwrap().contains("zzz_nonexistent_place"));

        // Visible for exactly one tick.
        nav.tick_observed(1.0 / 60.0, &mut log);
        assert_eq!(nav.status(), &SessionStatus::Idle);
        let failed_at = log.transitions.iter().find(|(_, _, to)| to == &failed).unwrap().0;
        let idle_at = log.transitions.iter().rev().find(|(_, _, to)| to == &SessionStatus::Idle).unwrap().0;
        assert_eq!(idle_at.0, failed_at.0 + 1);
        assert_eq!(*nav.vehicle(), before);
    }

    #[test]
    fn scenario_d_empty_map() {
        let mut nav = controller_with(gazetteer(), EmptyGraph, test_config());
        assert!(tick_until(&mut nav, |n| matches!(n.status(), SessionStatus::MapLoadFailed(_))));
        assert!(matches!(
            nav.request_destination("C"),
            RequestOutcome::Rejected(SessionError::MapNotReady)
        ));
        assert!(matches!(nav.status(), SessionStatus::MapLoadFailed(_)));
        assert!(nav.snapshot().road_graph().is_none());
    }

    #[test]
    fn wait_for_map_reports_load_failure() {
        let mut nav = controller_with(gazetteer(), EmptyGraph, test_config());
        assert!(nav.wait_for_map(Duration::from_secs(5)).is_err());
        assert!(matches!(nav.status(), SessionStatus::MapLoadFailed(_)));
    }

    #[test]
    fn blank_request_rejected() {
        let mut nav = ready_controller();
        assert!(matches!(nav.request_destination("  "), RequestOutcome::Rejected(SessionError::Geocode(_))));
        assert_eq!(nav.generation(), Generation(0));
    }

    #[test]
    fn ticks_never_wait_on_providers() {
        let slow = DelayedGazetteer::new("C", Duration::from_secs(30));
        let mut nav = controller_with(slow, StaticGraphProvider::new(scenario_graph()), test_config());
        nav.wait_for_map(Duration::from_secs(5)).unwrap();
        nav.request_destination("C");

        let started = Instant::now();
        for _ in 0..1_000 {
            nav.tick(1.0 / 60.0);
        }
        assert!(started.elapsed() < Duration::from_secs(2), "1000 ticks took {:?}", started.elapsed());
        assert_eq!(nav.status(), &SessionStatus::Geocoding("C".into()));
    }

    #[test]
    fn destination_geocode_timeout() {
        let config = NavConfig { destination_timeout_ms: 30, ..test_config() };
        let slow = DelayedGazetteer::new("C", Duration::from_millis(500));
        let mut nav = controller_with(slow, StaticGraphProvider::new(scenario_graph()), config);
        nav.wait_for_map(Duration::from_secs(5)).unwrap();
        nav.request_destination("C");

        let mut log = StatusLog::new();
        assert!(tick_until_observed(&mut nav, &mut log, Duration::from_secs(5), |n| n.notice().is_some()));
        assert!(log.saw(&SessionStatus::GeocodeFailed("C".into())));
        assert!(nav.notice().unwrap().contains("did not answer"));
    }

    #[test]
    fn stale_results_are_discarded() {
        let slow = DelayedGazetteer::new("Slow", Duration::from_millis(150));
        let mut nav = controller_with(slow, StaticGraphProvider::new(scenario_graph()), test_config());
        nav.wait_for_map(Duration::from_secs(5)).unwrap();

        nav.request_destination("Slow");
        nav.request_destination("B");
        assert_eq!(nav.generation(), Generation(2));

        assert!(tick_until(&mut nav, |n| matches!(n.status(), SessionStatus::Moving(_))));
        assert_eq!(nav.status(), &SessionStatus::Moving("B".into()));

        // Let the slow answer for the superseded request come in.
        thread::sleep(Duration::from_millis(300));
        for _ in 0..10 {
            nav.tick(1.0 / 60.0);
        }
        assert_eq!(nav.status(), &SessionStatus::Moving("B".into()));
        assert_eq!(nav.route().unwrap().segment_count(), 1);
    }

    #[test]
    fn new_request_while_moving_halts_in_place() {
        let mut nav = ready_controller();
        nav.request_destination("C");
        assert!(tick_until(&mut nav, |n| matches!(n.status(), SessionStatus::Moving(_))));
        for _ in 0..30 {
            nav.tick(0.1);
        }
        let here = nav.vehicle().position;
        let before = nav.generation();

        assert!(matches!(nav.request_destination("B"), RequestOutcome::Dispatched(_)));
        assert_eq!(nav.generation(), before.next());
        assert!(!nav.vehicle().moving);
        assert_eq!(nav.vehicle().position, here);
        assert!(nav.route().is_none());
        assert_eq!(nav.status(), &SessionStatus::Geocoding("B".into()));

        assert!(tick_until(&mut nav, |n| matches!(n.status(), SessionStatus::Moving(_))));
        assert_eq!(nav.status(), &SessionStatus::Moving("B".into()));
    }

    #[test]
    fn request_before_map_is_deferred_then_dispatched() {
        let slow = SlowGraph { inner: StaticGraphProvider::new(scenario_graph()), delay: Duration::from_millis(150) };
        let mut nav = controller_with(gazetteer(), slow, test_config());
        assert!(matches!(nav.request_destination("C"), RequestOutcome::Deferred(Generation(1))));
        assert_eq!(nav.status(), &SessionStatus::LoadingMap);

        assert!(tick_until(&mut nav, |n| matches!(n.status(), SessionStatus::Moving(_))));
        assert_eq!(nav.status(), &SessionStatus::Moving("C".into()));
        assert_eq!(nav.generation(), Generation(1));
    }

    #[test]
    fn deferred_request_expires() {
        let config = NavConfig { map_ready_timeout_ms: 30, ..test_config() };
        let slow = SlowGraph { inner: StaticGraphProvider::new(scenario_graph()), delay: Duration::from_millis(400) };
        let mut nav = controller_with(gazetteer(), slow, config);
        assert!(matches!(nav.request_destination("C"), RequestOutcome::Deferred(_)));

        assert!(tick_until(&mut nav, |n| n.notice().is_some()));
        assert_eq!(nav.notice(), Some(SessionError::MapNotReady.to_string().as_str()));
        assert_eq!(nav.status(), &SessionStatus::LoadingMap);

        assert!(tick_until(&mut nav, |n| n.status() == &SessionStatus::Idle));
        for _ in 0..10 {
            nav.tick(1.0 / 60.0);
        }
        assert_eq!(nav.status(), &SessionStatus::Idle);
        assert!(nav.route().is_none());
    }

    #[test]
    fn manual_start() {
        let mut nav = ControllerBuilder::new(test_config(), gazetteer(), StaticGraphProvider::new(scenario_graph()))
            .autostart(false)
            .build()
            .unwrap();
        assert_eq!(nav.status(), &SessionStatus::Starting);
        for _ in 0..5 {
            nav.tick(1.0 / 60.0);
        }
        assert_eq!(nav.status(), &SessionStatus::Starting);
        assert!(matches!(nav.request_destination("C"), RequestOutcome::Deferred(_)));

        assert!(nav.start());
        assert_eq!(nav.status(), &SessionStatus::LoadingMap);
        assert!(tick_until(&mut nav, |n| matches!(n.status(), SessionStatus::Moving(_))));
    }

    #[test]
    fn reload_publishes_new_map() {
        let mut nav = ready_controller();
        nav.request_destination("C");
        assert!(tick_until(&mut nav, |n| n.vehicle().moving));
        for _ in 0..300 {
            nav.tick(0.1);
        }
        let before = nav.snapshot().vehicle_geo().unwrap();
        assert!(!close(before, A));

        let first = nav.map().cloned().unwrap();
        assert!(nav.reload_map());
        let second = nav.wait_for_map(Duration::from_secs(5)).unwrap();
        assert!(!std::sync::Arc::ptr_eq(&first, &second));
        assert!(std::sync::Arc::ptr_eq(nav.map().unwrap(), &second));
        assert_eq!(nav.status(), &SessionStatus::Idle);
        assert_eq!(nav.notice(), Some("map reloaded"));

        // Halted in place, not sent back to the base.
        let after = nav.snapshot().vehicle_geo().unwrap();
        assert!(close(before, after), "moved from {before} to {after}");
        assert!(!nav.vehicle().moving);
    }

    /// Knows the base place only once; other places come from the gazetteer.
    struct BaseOnce {
        inner: Gazetteer,
        base_lookups: std::sync::atomic::AtomicUsize,
    }

    impl GeocodeProvider for BaseOnce {
        fn resolve(&self, query: &str, timeout: Duration) -> Result<Option<GeoPoint>, ProviderError> {
            use std::sync::atomic::Ordering;
            if query == "Base" && self.base_lookups.fetch_add(1, Ordering::SeqCst) > 0 {
                return Ok(None);
            }
            self.inner.resolve(query, timeout)
        }
    }

    #[test]
    fn failed_reload_keeps_map_and_says_so() {
        let geocoder = BaseOnce { inner: gazetteer(), base_lookups: Default::default() };
        let mut nav = controller_with(geocoder, StaticGraphProvider::new(scenario_graph()), test_config());
        let first = nav.wait_for_map(Duration::from_secs(5)).unwrap();

        assert!(nav.reload_map());
        assert!(matches!(nav.wait_for_map(Duration::from_secs(5)), Err(SessionError::Acquisition(_))));

        assert!(std::sync::Arc::ptr_eq(nav.map().unwrap(), &first));
        assert_eq!(nav.status(), &SessionStatus::Idle);
        assert!(nav.notice().unwrap().starts_with("map reload failed"));
        assert!(matches!(nav.request_destination("B"), RequestOutcome::Dispatched(_)));
    }

    #[test]
    fn frame_counter_advances() {
        let mut nav = ready_controller();
        let start = nav.frame();
        nav.tick(1.0 / 60.0);
        nav.tick(1.0 / 60.0);
        assert_eq!(nav.frame().since(start), 2);
    }
}
