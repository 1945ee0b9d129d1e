use bn_core::{AgentId, CoreError};
use bn_mechanism::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("agent at index {index} has id {id}; agent ids must equal their position")]
    AgentIdMismatch { index: usize, id: AgentId },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("a run is in progress or its results have not been collected")]
    Busy,

    #[error("no run to collect")]
    NotRunning,

    #[error("compute thread failed: {0}")]
    Thread(String),
}

pub type SimResult<T> = Result<T, SimError>;
