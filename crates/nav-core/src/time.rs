//! Frame-time model.
//!
//! # Design
//!
//! The host loop advances the simulation once per rendered frame.  Each
//! frame carries a wall-clock `dt`; a stall (window drag, debugger pause)
//! must not teleport the vehicle, so `dt` is clamped to `max_dt_secs`
//! before the simulation sees it.
//!
//! Frames are counted with a monotonically increasing [`Tick`] so observers
//! and logs can refer to "frame N" without floating-point time.

use std::fmt;
use std::time::{Duration, Instant};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute frame counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` frames after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Frames elapsed from `earlier` to `self` (saturating).
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

// ── FrameClock ────────────────────────────────────────────────────────────────

/// Counts frames and turns wall-clock instants into clamped `dt` values.
#[derive(Clone, Debug)]
pub struct FrameClock {
    /// Largest `dt` handed to the simulation, in seconds.
    pub max_dt_secs: f64,
    /// Target frames per second of the host loop.
    pub tick_rate_hz: u32,
    /// The current frame, advanced by [`advance`](Self::advance).
    pub current_tick: Tick,
    last_instant: Option<Instant>,
}

impl FrameClock {
    pub fn new(tick_rate_hz: u32, max_dt_secs: f64) -> Self {
        Self {
            max_dt_secs,
            tick_rate_hz: tick_rate_hz.max(1),
            current_tick: Tick::ZERO,
            last_instant: None,
        }
    }

    /// Advance the frame counter by one.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Clamp a raw `dt` into `[0, max_dt_secs]`.  NaN becomes 0.
    #[inline]
    pub fn clamp_dt(&self, dt_secs: f64) -> f64 {
        if dt_secs.is_nan() {
            return 0.0;
        }
        dt_secs.clamp(0.0, self.max_dt_secs)
    }

    /// Clamped seconds since the previous call.  The first call returns 0.
    pub fn next_dt(&mut self, now: Instant) -> f64 {
        let dt = match self.last_instant {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f64(),
            None => 0.0,
        };
        self.last_instant = Some(now);
        self.clamp_dt(dt)
    }

    /// Wall-clock length of one frame at the target rate.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64)
    }
}

impl fmt::Display for FrameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} Hz", self.current_tick, self.tick_rate_hz)
    }
}
