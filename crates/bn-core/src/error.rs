//! Core error type.
//!
//! Higher crates define their own error enums (`NetworkError`, `EngineError`,
//! `SimError`, …) and wrap `CoreError` where configuration problems can
//! surface through them.

use thiserror::Error;

/// Errors raised while building or validating core configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `bn-core`.
pub type CoreResult<T> = Result<T, CoreError>;
