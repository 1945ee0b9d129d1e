//! Winner-take-all arbitration with lateral inhibition.
//!
//! Each tick:
//!
//! 1. every behavior's raw excitation is recomputed from the snapshot;
//! 2. every behavior inhibits every other one by `m[i][j] * e_i`, all reads
//!    taken from the same pre-inhibition snapshot (repeated
//!    `settle_iterations` times, each pass reading the previous pass);
//! 3. the highest result wins, ties going to the lowest [`BehaviorId`];
//! 4. the winner's task queue yields one task.
//!
//! Losing queues are not touched and keep their position across ticks.  A
//! step whose excitation or action callable fails leaves every queue and
//! cached excitation as it found them.

use bn_core::{AgentRng, BehaviorId, SimContext};
use bn_network::{BehaviorNetwork, ParameterKind, Parameters};
use tracing::debug;

use crate::{ActionResult, ActionSelection, EngineError, EngineResult, MechanismKind, Outcome};

/// Mutual-inhibition mechanism.
#[derive(Clone, Debug, PartialEq)]
pub struct MutualInhibition {
    /// Number of simultaneous inhibition passes per tick (at least 1).
    pub settle_iterations: u32,

    last_winner: Option<BehaviorId>,
}

impl Default for MutualInhibition {
    fn default() -> Self {
        Self::new(1)
    }
}

impl MutualInhibition {
    pub fn new(settle_iterations: u32) -> Self {
        Self { settle_iterations: settle_iterations.max(1), last_winner: None }
    }

    /// Winner of the most recent successful step.
    pub fn last_winner(&self) -> Option<BehaviorId> {
        self.last_winner
    }
}

impl ActionSelection for MutualInhibition {
    fn kind(&self) -> MechanismKind {
        MechanismKind::MutualInhibition
    }

    fn step(
        &mut self,
        network: &mut BehaviorNetwork,
        ctx:     &SimContext<'_>,
        rng:     &mut AgentRng,
    ) -> EngineResult<Outcome> {
        if network.is_empty() {
            return Err(EngineError::NoActiveBehavior);
        }

        let settle = self.settle_iterations;
        let (outcome, winner, index) =
            network.atomically(|network| -> EngineResult<(Outcome, BehaviorId, usize)> {
                let raw = network.evaluate_all(ctx)?;
                let resolved = network.resolve(ParameterKind::Coefficients, ctx);
                let excitations = match &resolved.parameters {
                    Parameters::Coefficients(m) => lateral_inhibition(&raw, m, settle),
                    Parameters::Weights(_) => raw,
                };

                let ids = network.ids();
                let index = select_winner(&ids, &excitations).ok_or(EngineError::NoActiveBehavior)?;
                let winner = ids[index];

                let (command, held) = match network.next_task_at(index, ctx, rng)? {
                    Some(task) => (task, false),
                    None => (ctx.state.command(), true),
                };
                let outcome = Outcome {
                    result: ActionResult::Winner { winner, command, held },
                    excitations,
                    reported: resolved.error,
                };
                Ok((outcome, winner, index))
            })?;

        if self.last_winner != Some(winner) {
            debug!(tick = %ctx.tick, agent = %ctx.agent, %winner, excitation = outcome.excitations[index], "winner changed");
            self.last_winner = Some(winner);
        }
        Ok(outcome)
    }
}

/// Apply simultaneous lateral inhibition.
///
/// `m[i][j]` is how strongly behavior `i` inhibits behavior `j`; the
/// diagonal is ignored.  Each pass computes `e'_j = e_j - Σ_i m[i][j]·e_i`
/// from one frozen copy of `e`, so the result does not depend on edge order.
/// Missing matrix entries count as zero.
pub fn lateral_inhibition(raw: &[f64], m: &[Vec<f64>], iterations: u32) -> Vec<f64> {
    let n = raw.len();
    let mut current = raw.to_vec();
    for _ in 0..iterations.max(1) {
        let snapshot = current.clone();
        for (j, out) in current.iter_mut().enumerate() {
            let inhibition: f64 = (0..n)
                .filter(|&i| i != j)
                .map(|i| m.get(i).and_then(|row| row.get(j)).copied().unwrap_or(0.0) * snapshot[i])
                .sum();
            *out = snapshot[j] - inhibition;
        }
    }
    current
}

/// Index of the winning behavior: highest value, ties to the lowest id.
///
/// NaN never beats a number.  If every value is NaN the lowest id wins.
/// Returns `None` only for empty input.
pub fn select_winner(ids: &[BehaviorId], values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, (&id, &v)) in ids.iter().zip(values).enumerate() {
        best = match best {
            None => Some(i),
            Some(b) => {
                let (bid, bv) = (ids[b], values[b]);
                let better = if v.is_nan() {
                    bv.is_nan() && id < bid
                } else if bv.is_nan() {
                    true
                } else {
                    v > bv || (v == bv && id < bid)
                };
                if better { Some(i) } else { Some(b) }
            }
        };
    }
    best
}
