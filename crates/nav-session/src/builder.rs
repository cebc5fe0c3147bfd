//! Fluent builder for constructing a [`NavigationController`].

use std::sync::Arc;

use nav_core::NavConfig;
use nav_spatial::{DijkstraRouter, Router};

use crate::acquisition::{AcquisitionSettings, MapAcquisitionService};
use crate::geocoder::Geocoder;
use crate::provider::{GeocodeProvider, GraphProvider};
use crate::{NavigationController, SessionResult};

/// Fluent builder for [`NavigationController<R>`].
///
/// # Required inputs
///
/// - [`NavConfig`] — base place, speed, radius, timeouts, …
/// - a [`GeocodeProvider`] — used for both the base place and destinations
/// - a [`GraphProvider`] — supplies the road graph around the base place
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default                     |
/// |-------------------|-----------------------------|
/// | `.router(r)`      | [`DijkstraRouter`]          |
/// | `.autostart(b)`   | `true` (map load begins in `build`) |
///
/// # Example
///
/// ```rust,ignore
/// let mut nav = ControllerBuilder::new(config, gazetteer, StaticGraphProvider::new(graph))
///     .build()?;
/// nav.wait_for_map(Duration::from_secs(30))?;
/// nav.request_destination("Eke Awka Market");
/// loop { nav.tick(1.0 / 60.0); }
/// ```
pub struct ControllerBuilder<R: Router = DijkstraRouter> {
    config:    NavConfig,
    geocoder:  Arc<dyn GeocodeProvider>,
    graphs:    Arc<dyn GraphProvider>,
    router:    R,
    autostart: bool,
}

impl ControllerBuilder<DijkstraRouter> {
    /// Create a builder with all required inputs.
    pub fn new(
        config:   NavConfig,
        geocoder: impl GeocodeProvider,
        graphs:   impl GraphProvider,
    ) -> Self {
        Self::from_shared(config, Arc::new(geocoder), Arc::new(graphs))
    }

    /// Like [`new`](Self::new) for providers that are already shared.
    pub fn from_shared(
        config:   NavConfig,
        geocoder: Arc<dyn GeocodeProvider>,
        graphs:   Arc<dyn GraphProvider>,
    ) -> Self {
        Self {
            config,
            geocoder,
            graphs,
            router: DijkstraRouter,
            autostart: true,
        }
    }
}

impl<R: Router + Clone + 'static> ControllerBuilder<R> {
    /// Swap the routing algorithm.
    pub fn router<R2: Router + Clone + 'static>(self, router: R2) -> ControllerBuilder<R2> {
        ControllerBuilder {
            config:    self.config,
            geocoder:  self.geocoder,
            graphs:    self.graphs,
            router,
            autostart: self.autostart,
        }
    }

    /// With `false`, the controller stays `Starting` until
    /// [`NavigationController::start`] is called.
    pub fn autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    /// Validate the configuration and return a controller.
    pub fn build(self) -> SessionResult<NavigationController<R>> {
        self.config.validate()?;

        let acquisition = MapAcquisitionService::new(
            AcquisitionSettings::from(&self.config),
            Arc::clone(&self.geocoder),
            self.graphs,
        );
        let geocoder = Geocoder::new(self.geocoder, self.config.destination_timeout());

        let mut controller = NavigationController::from_parts(self.config, acquisition, geocoder, self.router);
        if self.autostart {
            controller.start();
        }
        Ok(controller)
    }
}
