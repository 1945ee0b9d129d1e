//! Dynamic (code-computed, per-tick) override of weights or coefficients.
//!
//! A network may carry a [`DynamicExpression`].  While one is set, the static
//! per-behavior weights and per-edge coefficients are ignored: each tick, just
//! before arbitration, the expression is evaluated against the world snapshot
//! and its result is used for that tick only.
//!
//! # Failure handling
//!
//! An expression that returns `Err`, panics, or produces the wrong shape
//! yields a [`DynamicEvaluationError`].  The tick then reuses the last values
//! that evaluated successfully (the static values if none ever did), and the
//! error is reported only on the first tick of a failure streak.  The streak
//! ends at the next successful evaluation.

use std::fmt;
use std::sync::Arc;

use bn_core::{BehaviorId, SimContext};

use crate::DynamicEvaluationError;
use crate::callable::guarded;

// ── Parameters ────────────────────────────────────────────────────────────────

/// Which parameter set a mechanism consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// One weight per behavior (cooperative mode).
    Weights,
    /// An N×N inhibition matrix (mutual-inhibition mode).
    Coefficients,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::Weights      => f.write_str("a weight vector"),
            ParameterKind::Coefficients => f.write_str("a coefficient matrix"),
        }
    }
}

/// Arbitration parameters for one tick, indexed by layout position.
///
/// For `Coefficients(m)`, `m[i][j]` is how strongly behavior `i` inhibits
/// behavior `j`.  The diagonal is ignored.
#[derive(Clone, Debug, PartialEq)]
pub enum Parameters {
    Weights(Vec<f64>),
    Coefficients(Vec<Vec<f64>>),
}

impl Parameters {
    pub fn kind(&self) -> ParameterKind {
        match self {
            Parameters::Weights(_)      => ParameterKind::Weights,
            Parameters::Coefficients(_) => ParameterKind::Coefficients,
        }
    }

    /// Check that `self` is a `kind` parameter set sized for `n` behaviors
    /// with only finite entries.  Returns a short description of the actual
    /// shape on mismatch.
    fn check_shape(&self, kind: ParameterKind, n: usize) -> Result<(), String> {
        match self {
            Parameters::Weights(w) => {
                if kind != ParameterKind::Weights || w.len() != n {
                    return Err(format!("a weight vector of length {}", w.len()));
                }
                if w.iter().any(|v| !v.is_finite()) {
                    return Err("a weight vector with non-finite entries".into());
                }
            }
            Parameters::Coefficients(m) => {
                if kind != ParameterKind::Coefficients || m.len() != n {
                    return Err(format!("a coefficient matrix with {} rows", m.len()));
                }
                if let Some(row) = m.iter().find(|row| row.len() != n) {
                    return Err(format!("a coefficient matrix row of length {}", row.len()));
                }
                if m.iter().flatten().any(|v| !v.is_finite()) {
                    return Err("a coefficient matrix with non-finite entries".into());
                }
            }
        }
        Ok(())
    }
}

// ── DynamicExpression ─────────────────────────────────────────────────────────

/// The compiled form of a dynamic expression.
///
/// Receives the world snapshot and the network's behavior ids in layout
/// order; must return a full parameter set of the kind the bound mechanism
/// consumes.
pub type DynamicFn =
    Arc<dyn Fn(&SimContext<'_>, &[BehaviorId]) -> Result<Parameters, String> + Send + Sync>;

/// A dynamic override: the compiled callable plus, optionally, the source text
/// it was compiled from (kept for persistence and display only).
#[derive(Clone)]
pub struct DynamicExpression {
    pub source: Option<String>,
    pub func:   DynamicFn,
}

impl DynamicExpression {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SimContext<'_>, &[BehaviorId]) -> Result<Parameters, String> + Send + Sync + 'static,
    {
        Self { source: None, func: Arc::new(f) }
    }

    /// Wrap an already-compiled callable.
    pub fn from_fn(func: DynamicFn) -> Self {
        Self { source: None, func }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Evaluate once, isolating panics and validating the result's shape.
    pub fn evaluate(
        &self,
        ctx:  &SimContext<'_>,
        ids:  &[BehaviorId],
        kind: ParameterKind,
    ) -> Result<Parameters, DynamicEvaluationError> {
        let f = &self.func;
        let params = guarded(|| f(ctx, ids))
            .map_err(DynamicEvaluationError::Panicked)?
            .map_err(DynamicEvaluationError::Failed)?;
        params
            .check_shape(kind, ids.len())
            .map_err(|got| DynamicEvaluationError::Malformed {
                expected:  kind,
                got,
                behaviors: ids.len(),
            })?;
        Ok(params)
    }
}

impl fmt::Debug for DynamicExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicExpression")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// The parameters a mechanism should use this tick, and how they were found.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub parameters: Parameters,

    /// `true` if a dynamic expression is set (whether or not it succeeded).
    pub dynamic: bool,

    /// `true` if the expression failed and earlier values were reused.
    pub reused_previous: bool,

    /// The failure, present only on the first tick of a failure streak.
    pub error: Option<DynamicEvaluationError>,
}

impl Resolved {
    pub(crate) fn fixed(parameters: Parameters) -> Self {
        Self { parameters, dynamic: false, reused_previous: false, error: None }
    }
}

/// Last-known-good dynamic values and the failure-streak flag.
#[derive(Clone, Debug, Default)]
pub(crate) struct OverrideMemory {
    pub(crate) weights:      Option<Vec<f64>>,
    pub(crate) coefficients: Option<Vec<Vec<f64>>>,
    pub(crate) failing:      bool,
}

impl OverrideMemory {
    pub(crate) fn remember(&mut self, params: &Parameters) {
        match params {
            Parameters::Weights(w)      => self.weights = Some(w.clone()),
            Parameters::Coefficients(m) => self.coefficients = Some(m.clone()),
        }
        self.failing = false;
    }

    /// Last good values of `kind`, if they still fit `n` behaviors.
    pub(crate) fn recall(&self, kind: ParameterKind, n: usize) -> Option<Parameters> {
        match kind {
            ParameterKind::Weights => self
                .weights
                .as_ref()
                .filter(|w| w.len() == n)
                .map(|w| Parameters::Weights(w.clone())),
            ParameterKind::Coefficients => self
                .coefficients
                .as_ref()
                .filter(|m| m.len() == n && m.iter().all(|row| row.len() == n))
                .map(|m| Parameters::Coefficients(m.clone())),
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
