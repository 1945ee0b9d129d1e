use bn_network::{CallableError, DynamicEvaluationError, NetworkError};
use thiserror::Error;

use crate::MechanismKind;

/// Everything that can go wrong while configuring or stepping an agent.
///
/// None of these is fatal to a run: the simulation loop reports the error and
/// moves on to the next agent.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// A structural edit was rejected; the network is unchanged.
    #[error(transparent)]
    Structural(#[from] NetworkError),

    #[error("cannot switch from {from} to {to} while the network holds {behaviors} behavior(s); clear it first")]
    IncompatibleMechanism {
        from:      MechanismKind,
        to:        MechanismKind,
        behaviors: usize,
    },

    /// User code panicked, returned an error, or returned malformed data.
    #[error("dynamics evaluation failed: {0}")]
    DynamicsEvaluation(String),

    /// The network is empty; the agent does nothing this tick.
    #[error("no active behavior")]
    NoActiveBehavior,
}

impl From<CallableError> for EngineError {
    fn from(e: CallableError) -> Self {
        EngineError::DynamicsEvaluation(e.to_string())
    }
}

impl From<DynamicEvaluationError> for EngineError {
    fn from(e: DynamicEvaluationError) -> Self {
        EngineError::DynamicsEvaluation(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
