//! Frame and summary tables in one SQLite file (feature `sqlite`).
//!
//! The database runs in WAL mode while the simulation writes; [`finish`]
//! folds the log back so a single [`DATABASE_FILE`] is left behind.
//!
//! [`finish`]: OutputWriter::finish

use std::path::Path;

use rusqlite::{Connection, params};

use crate::error::require_dir;
use crate::writer::OutputWriter;
use crate::{AgentFrameRow, OutputResult, TickSummaryRow};

pub const DATABASE_FILE: &str = "output.db";

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous  = NORMAL;
    CREATE TABLE IF NOT EXISTS agent_frames (
        agent_id INTEGER NOT NULL,
        tick     INTEGER NOT NULL,
        x        REAL    NOT NULL,
        y        REAL    NOT NULL,
        heading  REAL    NOT NULL,
        speed    REAL    NOT NULL,
        winner   INTEGER,
        failed   INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS agent_frames_by_tick ON agent_frames (tick, agent_id);
    CREATE TABLE IF NOT EXISTS tick_summaries (
        tick            INTEGER PRIMARY KEY,
        elapsed_secs    REAL    NOT NULL,
        acted_agents    INTEGER NOT NULL,
        dynamics_errors INTEGER NOT NULL
    );";

const INSERT_FRAME: &str = "INSERT INTO agent_frames (agent_id, tick, x, y, heading, speed, winner, failed) \
                            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const INSERT_SUMMARY: &str = "INSERT INTO tick_summaries (tick, elapsed_secs, acted_agents, dynamics_errors) \
                              VALUES (?1, ?2, ?3, ?4)";

pub struct SqliteWriter {
    conn:   Connection,
    closed: bool,
}

impl SqliteWriter {
    /// Open [`DATABASE_FILE`] under `dir`, creating its tables if needed.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        require_dir(dir)?;
        let conn = Connection::open(dir.join(DATABASE_FILE))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, closed: false })
    }
}

impl OutputWriter for SqliteWriter {
    /// One transaction per batch.
    fn write_frames(&mut self, rows: &[AgentFrameRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut insert = tx.prepare_cached(INSERT_FRAME)?;
            for r in rows {
                insert.execute(params![r.agent_id, r.tick, r.x, r.y, r.heading, r.speed, r.winner, r.failed])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.prepare_cached(INSERT_SUMMARY)?.execute(params![
            row.tick,
            row.elapsed_secs,
            row.acted_agents,
            row.dynamics_errors
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if !self.closed {
            self.closed = true;
            self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        }
        Ok(())
    }
}
