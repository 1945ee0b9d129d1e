//! Simulation observer trait for progress reporting and data collection.

use bn_core::{AgentId, Tick};

use crate::Frame;

/// Callbacks invoked by the tick loop at key points.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — error log
///
/// ```rust,ignore
/// struct ErrorLog(Vec<String>);
///
/// impl SimObserver for ErrorLog {
///     fn on_dynamics_error(&mut self, tick: Tick, agent: AgentId, message: &str) {
///         self.0.push(format!("{tick} {agent}: {message}"));
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any agent is stepped.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once the tick's results have been applied and published
    /// ("tick advanced").
    ///
    /// `acted` is the number of agents whose step succeeded and produced an
    /// action this tick; agents with no dynamics are not counted.
    fn on_tick_end(&mut self, _tick: Tick, _acted: usize) {}

    /// Called at snapshot intervals (every `config.output_interval_ticks`
    /// published frames) with the frame just appended to the history.
    fn on_snapshot(&mut self, _frame: &Frame) {}

    /// User code failed for `agent` during `tick`.  Override failures are
    /// reported once per failure streak; step failures every time they occur.
    fn on_dynamics_error(&mut self, _tick: Tick, _agent: AgentId, _message: &str) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
