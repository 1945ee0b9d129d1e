//! Error types for bn-network.

use bn_core::BehaviorId;
use thiserror::Error;

use crate::ParameterKind;

/// Structural errors: a mutating call referenced something that does not
/// exist, or would break a network invariant.  The network is left unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NetworkError {
    #[error("behavior {0} not found")]
    BehaviorNotFound(BehaviorId),

    #[error("a behavior named {0:?} already exists")]
    DuplicateName(String),

    #[error("behavior id {0} is used more than once")]
    DuplicateId(BehaviorId),

    #[error("behavior {0} cannot have an edge to itself")]
    SelfEdge(BehaviorId),

    #[error("more than one edge describes the pair {0} / {1}")]
    DuplicateEdge(BehaviorId, BehaviorId),

    #[error("weight {weight} for behavior {id} is outside [0, 1]")]
    WeightOutOfRange { id: BehaviorId, weight: f64 },

    #[error("inhibition coefficient {0} is outside [-1, 1]")]
    CoefficientOutOfRange(f64),

    #[error("layout index {index} is out of range for {len} behaviors")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no {kind} callable registered under {key:?}")]
    UnknownCallable { kind: &'static str, key: String },

    #[error("network description error: {0}")]
    Description(String),
}

/// Shorthand result type for structural operations.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// A dynamic weight/coefficient expression failed for one tick.
///
/// Distinct from [`NetworkError`]: the network structure is fine, the user's
/// expression is not.  The tick proceeds with the previous tick's values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DynamicEvaluationError {
    #[error("dynamic expression failed: {0}")]
    Failed(String),

    #[error("dynamic expression panicked: {0}")]
    Panicked(String),

    #[error("dynamic expression produced {got}, expected {expected} for {behaviors} behaviors")]
    Malformed {
        expected:  ParameterKind,
        got:       String,
        behaviors: usize,
    },
}

/// A behavior's excitation or action callable panicked.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{stage} callable of behavior {behavior} ({name:?}) panicked: {message}")]
pub struct CallableError {
    pub behavior: BehaviorId,
    pub name:     String,
    pub stage:    &'static str,
    pub message:  String,
}
