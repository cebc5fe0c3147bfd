//! Session observer trait for status reporting and recording.

use nav_core::Tick;
use nav_motion::VehicleState;

use crate::acquisition::LoadedMap;
use crate::status::SessionStatus;

/// Callbacks invoked by
/// [`NavigationController::tick_observed`][crate::NavigationController::tick_observed].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — status printer
///
/// ```rust,ignore
/// struct StatusPrinter;
///
/// impl SessionObserver for StatusPrinter {
///     fn on_status_change(&mut self, frame: Tick, _from: &SessionStatus, to: &SessionStatus) {
///         println!("{frame}: {to}");
///     }
/// }
/// ```
pub trait SessionObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _frame: Tick) {}

    /// Called once per status transition, in order.  Transitions caused by
    /// `request_destination` between ticks are reported on the next tick.
    fn on_status_change(&mut self, _frame: Tick, _from: &SessionStatus, _to: &SessionStatus) {}

    /// Called when a new map has been published.
    fn on_map_ready(&mut self, _frame: Tick, _map: &LoadedMap) {}

    /// Called when the vehicle reaches its destination.
    fn on_arrival(&mut self, _frame: Tick, _destination: &str) {}

    /// Called at the end of each tick with the updated vehicle.
    fn on_tick_end(&mut self, _frame: Tick, _vehicle: &VehicleState) {}
}

/// A [`SessionObserver`] that does nothing.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Records every transition and arrival.
#[derive(Debug, Default)]
pub struct StatusLog {
    pub transitions: Vec<(Tick, SessionStatus, SessionStatus)>,
    pub arrivals:    Vec<(Tick, String)>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses entered, in order.
    pub fn entered(&self) -> impl Iterator<Item = &SessionStatus> + '_ {
        self.transitions.iter().map(|(_, _, to)| to)
    }

    pub fn saw(&self, status: &SessionStatus) -> bool {
        self.entered().any(|s| s == status)
    }
}

impl SessionObserver for StatusLog {
    fn on_status_change(&mut self, frame: Tick, from: &SessionStatus, to: &SessionStatus) {
        self.transitions.push((frame, from.clone(), to.clone()));
    }

    fn on_arrival(&mut self, frame: Tick, destination: &str) {
        self.arrivals.push((frame, destination.to_owned()));
    }
}
