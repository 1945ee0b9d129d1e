//! Persisting what a run published.
//!
//! Every frame becomes one [`AgentFrameRow`] per agent and every computed
//! tick one [`TickSummaryRow`].  Where they end up depends on the
//! [`OutputWriter`]:
//!
//! - [`CsvWriter`] writes [`csv::FRAMES_FILE`] and [`csv::SUMMARIES_FILE`];
//! - `SqliteWriter` (feature `sqlite`) writes both tables into one database.
//!
//! Feed a writer during the run through [`SimOutputObserver`], or replay a
//! finished [`bn_sim::History`] into it with [`export_history`]:
//!
//! ```rust,ignore
//! let mut writer = CsvWriter::new(Path::new("./output"))?;
//! let rows = export_history(&sim.history(), &mut writer)?;
//! ```

pub mod csv;
pub mod error;
pub mod export;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use export::export_history;
pub use observer::SimOutputObserver;
pub use row::{AgentFrameRow, TickSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
