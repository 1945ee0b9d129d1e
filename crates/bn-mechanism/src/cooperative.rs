//! Weighted vector-sum blending of every behavior's command.

use bn_core::{AgentRng, Command, SimContext, Vec2};
use bn_network::{BehaviorNetwork, ParameterKind, Parameters};

use crate::{ActionResult, ActionSelection, EngineError, EngineResult, MechanismKind, Outcome};

/// Cooperative mechanism.
///
/// Every behavior contributes `excitation × weight` times its current task,
/// read as a 2-D vector.  Weights are used as given, never normalized, and
/// edges are ignored.  Each behavior's queue advances one task per tick under
/// the usual refill rules; an exhausted behavior keeps contributing its last
/// task, and one that never produced a task contributes nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cooperative;

impl ActionSelection for Cooperative {
    fn kind(&self) -> MechanismKind {
        MechanismKind::Cooperative
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
        // Every queue advances, or none does.
        network.atomically(|network| blend(network, ctx, rng))
    }
}

fn blend(
    network: &mut BehaviorNetwork,
    ctx:     &SimContext<'_>,
    rng:     &mut AgentRng,
) -> EngineResult<Outcome> {
    let raw = network.evaluate_all(ctx)?;
    let resolved = network.resolve(ParameterKind::Weights, ctx);
    let weights = match resolved.parameters {
        Parameters::Weights(w) => w,
        Parameters::Coefficients(_) => vec![1.0; raw.len()],
    };

    let mut sum = Vec2::ZERO;
    let mut excitations = Vec::with_capacity(raw.len());
    for (i, (&e, &w)) in raw.iter().zip(&weights).enumerate() {
        let factor = e * w;
        excitations.push(factor);
        let task = match network.next_task_at(i, ctx, rng)? {
            Some(task) => Some(task),
            None => network.behaviors()[i].current_command(),
        };
        if let Some(task) = task {
            sum += task.to_vector() * factor;
        }
    }

    Ok(Outcome {
        result: ActionResult::Blended { command: Command::from_vector(sum) },
        excitations,
        reported: resolved.error,
    })
}
