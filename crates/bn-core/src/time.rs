//! Simulation time model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter.  One
//! tick stands for `tick_duration_secs` simulated seconds, which is what
//! motion commands are integrated over:
//!
//!   position(t + 1) = position(t) + speed · dt · (cos θ, sin θ)
//!
//! Using an integer tick as the canonical time unit keeps the history index
//! exact and lets a display loop address any computed frame by tick number.

use std::fmt;

use crate::{CoreError, CoreResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The compute loop's tick counter plus the tick → simulated-seconds mapping.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// How many simulated seconds one tick represents.
    pub tick_duration_secs: f64,
    /// The current tick, advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(tick_duration_secs: f64) -> Self {
        Self { tick_duration_secs, current_tick: Tick::ZERO }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Rewind to tick 0 (used when a run is stopped).
    #[inline]
    pub fn reset(&mut self) {
        self.current_tick = Tick::ZERO;
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.current_tick.0 as f64 * self.tick_duration_secs
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} s)", self.current_tick, self.elapsed_secs())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a JSON file by the application crate (see
/// [`SimConfig::from_json_reader`], feature `serde`) and passed to the
/// simulation builder or scheduler.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Simulated seconds per tick.  Must be finite and positive.
    pub tick_duration_secs: f64,

    /// Upper bound on ticks computed by one run.
    pub max_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Worker thread count passed to Rayon (feature `parallel`).  `None` uses
    /// all logical cores.
    pub num_threads: Option<usize>,

    /// Emit output snapshots every N ticks.  1 = every tick; 0 disables
    /// snapshots entirely.
    pub output_interval_ticks: u64,

    /// Number of simultaneous lateral-inhibition passes the mutual-inhibition
    /// mechanism performs per tick.  1 is the plain single-pass update.
    pub settle_iterations: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_duration_secs:    1.0,
            max_ticks:             1_000,
            seed:                  0,
            num_threads:           None,
            output_interval_ticks: 1,
            settle_iterations:     1,
        }
    }
}

impl SimConfig {
    /// Tick at which a run started at tick 0 stops.
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.max_ticks)
    }

    /// Build a fresh [`SimClock`] for this configuration.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_duration_secs)
    }

    /// Reject configurations the tick loop cannot run.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.tick_duration_secs.is_finite() || self.tick_duration_secs <= 0.0 {
            return Err(CoreError::Config(format!(
                "tick_duration_secs must be finite and > 0, got {}",
                self.tick_duration_secs
            )));
        }
        if self.settle_iterations == 0 {
            return Err(CoreError::Config("settle_iterations must be at least 1".into()));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be at least 1 when set".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.  Missing fields take their
    /// [`Default`] values.
    #[cfg(feature = "serde")]
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> CoreResult<Self> {
        let cfg: SimConfig =
            serde_json::from_reader(reader).map_err(|e| CoreError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
