//! `nav-session` — the navigation session: background map acquisition,
//! geocoding and routing feeding a per-frame state machine.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                        |
//! |-----------------|-----------------------------------------------------------------|
//! | [`provider`]    | `GeocodeProvider`, `GraphProvider`, `call_with_timeout`         |
//! | [`acquisition`] | `MapAcquisitionService`, `LoadedMap`                            |
//! | [`geocoder`]    | `Geocoder` — timeout-bounded destination lookup                 |
//! | [`task`]        | `Generation`, `TaskResult` — background → tick-thread messages  |
//! | [`controller`]  | `NavigationController` — the session state machine              |
//! | [`builder`]     | `ControllerBuilder`                                             |
//! | [`status`]      | `SessionStatus`                                                 |
//! | [`snapshot`]    | `SessionSnapshot` — per-frame read-only view                    |
//! | [`observer`]    | `SessionObserver`, `NoopObserver`, `StatusLog`                  |
//! | [`offline`]     | `Gazetteer`, `StaticGraphProvider`, `PbfGraphProvider` (`osm`)  |
//! | [`error`]       | `SessionError`, `SessionResult<T>`                              |
//!
//! # Threads
//!
//! The host calls `tick(dt)` at its frame rate from one thread.  Map loading,
//! geocoding and route planning each run on their own short-lived thread and
//! post results over crossbeam channels; `tick` drains them without
//! blocking.  Every request carries a [`Generation`]; a result from an older
//! generation is discarded.
//!
//! # Cargo features
//!
//! | Feature | Effect                                                 |
//! |---------|--------------------------------------------------------|
//! | `osm`   | Enables `PbfGraphProvider` (OSM PBF extracts).         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use nav_core::NavConfig;
//! use nav_session::{ControllerBuilder, Gazetteer, StaticGraphProvider};
//!
//! let mut nav = ControllerBuilder::new(NavConfig::default(), gazetteer, StaticGraphProvider::new(graph))
//!     .build()?;
//! nav.request_destination("Eke Awka Market");
//! loop {
//!     nav.tick(1.0 / 60.0);
//!     draw(&nav.snapshot());
//! }
//! ```

pub mod acquisition;
pub mod builder;
pub mod controller;
pub mod error;
pub mod geocoder;
pub mod observer;
pub mod offline;
pub mod provider;
pub mod snapshot;
pub mod status;
pub mod task;

#[cfg(test)]
mod tests;

pub use acquisition::{AcquisitionError, AcquisitionEvent, AcquisitionState, LoadedMap, MapAcquisitionService};
pub use builder::ControllerBuilder;
pub use controller::{ALREADY_AT_DESTINATION, NavigationController, RequestOutcome};
pub use error::{SessionError, SessionResult};
pub use geocoder::{GeocodeError, Geocoder};
pub use observer::{NoopObserver, SessionObserver, StatusLog};
pub use offline::{Gazetteer, StaticGraphProvider};
#[cfg(feature = "osm")]
pub use offline::PbfGraphProvider;
pub use provider::{GeocodeProvider, GraphProvider, ProviderError, call_with_timeout};
pub use snapshot::SessionSnapshot;
pub use status::SessionStatus;
pub use task::{Generation, TaskResult};
