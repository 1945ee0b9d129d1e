//! Frame and summary tables as comma-separated text.
//!
//! A winner-less frame row leaves the `winner` column empty; `failed` is
//! written as `0`/`1` so the files load cleanly into numeric tools.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::error::require_dir;
use crate::writer::OutputWriter;
use crate::{AgentFrameRow, OutputResult, TickSummaryRow};

/// One row per agent per published frame.
pub const FRAMES_FILE: &str = "agent_frames.csv";
/// One row per computed tick.
pub const SUMMARIES_FILE: &str = "tick_summaries.csv";

const FRAME_COLUMNS: [&str; 8] = ["agent_id", "tick", "x", "y", "heading", "speed", "winner", "failed"];
const SUMMARY_COLUMNS: [&str; 4] = ["tick", "elapsed_secs", "acted_agents", "dynamics_errors"];

pub struct CsvWriter {
    frames:    Writer<File>,
    summaries: Writer<File>,
    closed:    bool,
}

impl CsvWriter {
    /// Truncate or create [`FRAMES_FILE`] and [`SUMMARIES_FILE`] under `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        require_dir(dir)?;
        let frames = table(&dir.join(FRAMES_FILE), &FRAME_COLUMNS)?;
        let summaries = table(&dir.join(SUMMARIES_FILE), &SUMMARY_COLUMNS)?;
        Ok(Self { frames, summaries, closed: false })
    }
}

fn table(path: &Path, columns: &[&str]) -> OutputResult<Writer<File>> {
    let mut w = Writer::from_path(path)?;
    w.write_record(columns)?;
    Ok(w)
}

fn frame_record(row: &AgentFrameRow) -> [String; 8] {
    [
        row.agent_id.to_string(),
        row.tick.to_string(),
        row.x.to_string(),
        row.y.to_string(),
        row.heading.to_string(),
        row.speed.to_string(),
        row.winner.map_or_else(String::new, |w| w.to_string()),
        u8::from(row.failed).to_string(),
    ]
}

impl OutputWriter for CsvWriter {
    fn write_frames(&mut self, rows: &[AgentFrameRow]) -> OutputResult<()> {
        rows.iter()
            .try_for_each(|row| self.frames.write_record(frame_record(row)))
            .map_err(Into::into)
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record([
            row.tick.to_string(),
            row.elapsed_secs.to_string(),
            row.acted_agents.to_string(),
            row.dynamics_errors.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if !self.closed {
            self.closed = true;
            self.frames.flush()?;
            self.summaries.flush()?;
        }
        Ok(())
    }
}
