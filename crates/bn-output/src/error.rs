//! Failures while persisting a run.

use std::path::PathBuf;

use thiserror::Error;

/// Why a frame or tick summary could not be persisted.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The directory handed to a writer does not exist or is a file.
    #[error("output directory {} is missing or not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("writing run output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "sqlite")]
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type OutputResult<T> = Result<T, OutputError>;

/// Refuse to create output files anywhere but an existing directory.
pub(crate) fn require_dir(dir: &std::path::Path) -> OutputResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(OutputError::NotADirectory(dir.to_path_buf()))
    }
}
