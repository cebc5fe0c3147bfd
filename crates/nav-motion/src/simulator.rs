//! Frame-by-frame motion along a [`MotionPlan`].

use tracing::debug;

use nav_core::PlanarPoint;

use crate::{MotionError, MotionPlan, MotionResult, VehicleState, heading_deg};

/// What a call to [`MotionSimulator::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    /// Not moving; nothing changed.
    Idle,
    /// Moved towards the next node without reaching it.
    Advanced,
    /// Reached an intermediate node; `index` is the new `segment_index`.
    SegmentCompleted { index: usize },
    /// Reached the final node and stopped.
    Arrived,
}

/// Owns the [`VehicleState`] and advances it along the active plan.
#[derive(Debug, Clone)]
pub struct MotionSimulator {
    speed_mps: f64,
    max_dt:    f64,
    state:     VehicleState,
    plan:      Option<MotionPlan>,
}

impl MotionSimulator {
    /// Create a parked simulator at the plane origin.
    pub fn new(speed_mps: f64, max_dt: f64) -> Self {
        Self {
            speed_mps,
            max_dt: max_dt.max(0.0),
            state: VehicleState::default(),
            plan: None,
        }
    }

    #[inline]
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    #[inline]
    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    #[inline]
    pub fn plan(&self) -> Option<&MotionPlan> {
        self.plan.as_ref()
    }

    /// Park the vehicle at `position`, dropping any active plan.
    pub fn place(&mut self, position: PlanarPoint) {
        self.plan = None;
        self.state = VehicleState {
            heading_deg: self.state.heading_deg,
            ..VehicleState::parked(position)
        };
    }

    /// Start following `plan` from the current position.
    ///
    /// # Errors
    ///
    /// [`MotionError::RouteTooShort`] if the plan has fewer than two
    /// waypoints.
    pub fn begin(&mut self, plan: MotionPlan) -> MotionResult<()> {
        if plan.waypoints.len() < 2 {
            return Err(MotionError::RouteTooShort(plan.waypoints.len()));
        }
        self.state.segment_index = 0;
        self.state.remaining_m   = plan.route.total_m;
        self.state.elapsed_secs  = 0.0;
        self.state.moving        = true;
        debug!(
            nodes = plan.waypoints.len(),
            total_m = plan.route.total_m,
            plane_speed = plan.plane_speed,
            "motion started"
        );
        self.plan = Some(plan);
        Ok(())
    }

    /// Stop where the vehicle stands and drop the plan.
    pub fn halt(&mut self) {
        if self.state.moving {
            debug!(segment = self.state.segment_index, "motion halted");
        }
        self.state.moving = false;
        self.plan = None;
    }

    /// `dt` clamped to `[0, max_dt]`; NaN counts as zero.
    pub fn clamp_dt(&self, dt: f64) -> f64 {
        if dt.is_nan() { 0.0 } else { dt.clamp(0.0, self.max_dt) }
    }

    /// Advance the vehicle by `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> MotionEvent {
        if !self.state.moving {
            return MotionEvent::Idle;
        }
        let dt = self.clamp_dt(dt);
        let Some(plan) = self.plan.as_ref() else {
            self.state.moving = false;
            return MotionEvent::Idle;
        };

        let last = plan.last_index();
        if self.state.segment_index >= last {
            self.state.moving = false;
            self.state.remaining_m = 0.0;
            return MotionEvent::Arrived;
        }

        self.state.elapsed_secs += dt;

        let target = plan.waypoints[self.state.segment_index + 1];
        let dist = self.state.position.distance(target);
        if dist > 0.0 {
            self.state.heading_deg = heading_deg(self.state.position, target);
        }

        let step = plan.plane_speed * dt;
        if step < dist {
            self.state.position = self.state.position.step_towards(target, step);
            return MotionEvent::Advanced;
        }

        self.state.position = target;
        let segment_m = plan.segment_lengths_m[self.state.segment_index];
        self.state.remaining_m = (self.state.remaining_m - segment_m).max(0.0);
        self.state.segment_index += 1;

        if self.state.segment_index == last {
            self.state.moving = false;
            self.state.remaining_m = 0.0;
            MotionEvent::Arrived
        } else {
            MotionEvent::SegmentCompleted { index: self.state.segment_index }
        }
    }

    /// Seconds to arrival at cruise speed, while moving.
    pub fn eta_secs(&self) -> Option<f64> {
        (self.state.moving && self.speed_mps > 0.0).then(|| self.state.remaining_m / self.speed_mps)
    }

    /// Fraction of the active route driven, in `[0, 1]`.
    ///
    /// Returns `0.0` without a plan.  Moves in node-sized steps, like
    /// `remaining_m`.
    pub fn progress(&self) -> f64 {
        match &self.plan {
            Some(plan) if plan.route.total_m > 0.0 => {
                (1.0 - self.state.remaining_m / plan.route.total_m).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}
