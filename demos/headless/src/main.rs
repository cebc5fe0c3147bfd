//! headless — drives the navigation session without a window.
//!
//! Loads the embedded Awka road network, then drives to each destination
//! named on the command line in turn, printing a HUD line every few
//! simulated seconds.
//!
//! ```text
//! headless [config.json] [extract.osm.pbf] [--realtime] [destination ...]
//! ```
//!
//! A `.pbf` argument (requires the `osm` feature) replaces the embedded
//! network with the roads of that extract.
//!
//! Without `--realtime` the loop runs as fast as it can with a fixed
//! 1/tick_rate dt.  Set `RUST_LOG=debug` to see the session's tracing output.

mod awka;

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nav_core::{NavConfig, Tick};
use nav_session::{
    ControllerBuilder, GraphProvider, NavigationController, RequestOutcome, SessionObserver, SessionSnapshot,
    SessionStatus, StaticGraphProvider,
};

// ── Constants ─────────────────────────────────────────────────────────────────

const DEFAULT_DESTINATIONS: [&str; 3] = ["Eke Awka Market", "Nnamdi Azikiwe University", "Aroma Junction"];
const HUD_EVERY_SECS:       u64   = 10;
const MAX_TRIP_SECS:        u64   = 30 * 60;

// ── HUD ───────────────────────────────────────────────────────────────────────

struct HudPrinter;

impl SessionObserver for HudPrinter {
    fn on_status_change(&mut self, frame: Tick, _from: &SessionStatus, to: &SessionStatus) {
        println!("[{frame}] {to}");
    }

    fn on_arrival(&mut self, frame: Tick, destination: &str) {
        println!("[{frame}] *** arrived at {destination} ***");
    }
}

/// One HUD line from the session's own figures.
fn print_hud(snap: &SessionSnapshot) {
    let Some(eta) = snap.eta_secs else {
        return;
    };
    let elapsed = snap.vehicle.elapsed_secs as u64;
    println!(
        "  {:>5.2} km left | ETA {}m {:02}s | elapsed {:02}:{:02} | heading {:>5.1}°",
        snap.remaining_km(),
        (eta / 60.0) as u64,
        (eta % 60.0) as u64,
        elapsed / 60,
        elapsed % 60,
        snap.vehicle.heading_deg,
    );
}

// ── Command line ──────────────────────────────────────────────────────────────

struct Args {
    config:       Option<String>,
    pbf:          Option<String>,
    realtime:     bool,
    destinations: Vec<String>,
}

fn parse_args() -> Args {
    let mut args = Args { config: None, pbf: None, realtime: false, destinations: Vec::new() };
    for arg in std::env::args().skip(1) {
        if arg == "--realtime" {
            args.realtime = true;
        } else if arg.ends_with(".json") && args.config.is_none() {
            args.config = Some(arg);
        } else if arg.ends_with(".pbf") && args.pbf.is_none() {
            args.pbf = Some(arg);
        } else {
            args.destinations.push(arg);
        }
    }
    if args.destinations.is_empty() {
        args.destinations = DEFAULT_DESTINATIONS.iter().map(|s| s.to_string()).collect();
    }
    args
}

fn load_config(path: Option<&str>) -> Result<NavConfig> {
    let Some(path) = path else {
        return Ok(NavConfig::default());
    };
    let file = File::open(Path::new(path)).with_context(|| format!("opening config {path}"))?;
    let config: NavConfig = serde_json::from_reader(file).with_context(|| format!("parsing config {path}"))?;
    config.validate()?;
    Ok(config)
}

fn graph_provider(pbf: Option<&str>) -> Result<Arc<dyn GraphProvider>> {
    if let Some(path) = pbf {
        #[cfg(feature = "osm")]
        {
            println!("Road network: OSM extract {path}");
            return Ok(Arc::new(nav_session::PbfGraphProvider::new(path)));
        }
        #[cfg(not(feature = "osm"))]
        bail!("{path}: rebuild with `--features osm` to read PBF extracts");
    }
    let graph = awka::road_graph()?;
    println!("Road network: {} nodes, {} edges (embedded)", graph.node_count(), graph.edge_count());
    Ok(Arc::new(StaticGraphProvider::new(graph)))
}

// ── Drive loop ────────────────────────────────────────────────────────────────

/// Tick until the trip ends one way or another.
fn drive(nav: &mut NavigationController, hud: &mut HudPrinter, realtime: bool) {
    let dt = 1.0 / nav.config().tick_rate_hz as f64;
    let budget = nav.clock().frame_budget();
    let max_frames = MAX_TRIP_SECS * nav.config().tick_rate_hz as u64;
    let hud_every = HUD_EVERY_SECS * nav.config().tick_rate_hz as u64;

    for _ in 0..max_frames {
        let started = Instant::now();
        nav.tick_observed(dt, hud);
        let snap = nav.snapshot();
        if snap.frame.0 % hud_every == 0 {
            print_hud(&snap);
        }
        match nav.status() {
            SessionStatus::Arrived(_) | SessionStatus::Idle | SessionStatus::MapLoadFailed(_) => break,
            _ => {}
        }
        if realtime {
            if let Some(rest) = budget.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            } else {
                // Still yield so background threads make progress.
                thread::yield_now();
            }
        } else {
            thread::yield_now();
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = parse_args();
    let config = load_config(args.config.as_deref())?;

    println!("=== headless navigation ===");
    println!(
        "Base: {}  |  Speed: {} km/h  |  Radius: {} m",
        config.base_place, config.cruise_speed_kmh, config.map_radius_m
    );

    let graphs = graph_provider(args.pbf.as_deref())?;
    let mut hud = HudPrinter;
    let mut nav = ControllerBuilder::from_shared(config.clone(), Arc::new(awka::places()?), graphs).build()?;

    let map = nav.wait_for_map(config.map_ready_timeout())?;
    info!(place = %map.place, center = %map.center, "map loaded");
    println!("Map ready around {} ({})", map.place, map.center);

    for destination in &args.destinations {
        println!();
        println!("→ {destination}");
        match nav.request_destination(destination) {
            RequestOutcome::Rejected(e) => {
                println!("  request rejected: {e}");
                continue;
            }
            RequestOutcome::Dispatched(_) | RequestOutcome::Deferred(_) => {}
        }

        drive(&mut nav, &mut hud, args.realtime);

        let snap = nav.snapshot();
        if let Some(notice) = &snap.notice {
            println!("  {notice}");
        }
        if let SessionStatus::MapLoadFailed(reason) = &snap.status {
            bail!("map lost: {reason}");
        }
    }

    Ok(())
}
