//! `SimOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use bn_core::{AgentId, SimConfig, Tick};
use bn_sim::{Frame, SimObserver};

use crate::OutputError;
use crate::row::{AgentFrameRow, TickSummaryRow};
use crate::writer::OutputWriter;

/// A [`SimObserver`] that writes agent frames and tick summaries to any
/// [`OutputWriter`] backend (CSV, SQLite, …).
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After the run returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:             W,
    tick_duration_secs: f64,
    errors_this_tick:   u64,
    last_error:         Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    /// Create an observer backed by `writer`, using `config` for simulated
    /// time conversion.
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self {
            writer,
            tick_duration_secs: config.tick_duration_secs,
            errors_this_tick:   0,
            last_error:         None,
        }
    }

    /// Take the stored write error (if any) after the run returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: crate::OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_start(&mut self, _tick: Tick) {
        self.errors_this_tick = 0;
    }

    fn on_dynamics_error(&mut self, _tick: Tick, _agent: AgentId, _message: &str) {
        self.errors_this_tick += 1;
    }

    fn on_tick_end(&mut self, tick: Tick, acted: usize) {
        let row = TickSummaryRow {
            tick:            tick.0,
            elapsed_secs:    tick.0 as f64 * self.tick_duration_secs,
            acted_agents:    acted as u64,
            dynamics_errors: self.errors_this_tick,
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, frame: &Frame) {
        let rows = AgentFrameRow::from_frame(frame);
        if !rows.is_empty() {
            let result = self.writer.write_frames(&rows);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
