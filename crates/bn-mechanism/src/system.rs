//! System dynamics: user code computes the next agent state directly.

use std::fmt;
use std::sync::Arc;

use bn_core::{AgentRng, AgentState, SimContext};
use bn_network::BehaviorNetwork;
use bn_network::callable::guarded;

use crate::{ActionResult, ActionSelection, EngineError, EngineResult, MechanismKind, Outcome};

/// The compiled per-tick update of a system-dynamics agent.
pub type SystemFn = Arc<dyn Fn(&SimContext<'_>) -> Result<AgentState, String> + Send + Sync>;

/// System-dynamics mechanism.  Ignores the network and its task queues.
///
/// A failing update (error or panic) is reported as
/// [`EngineError::DynamicsEvaluation`]; the agent keeps its state and the
/// update is not retried within the tick.
#[derive(Clone)]
pub struct SystemDynamics {
    pub func: SystemFn,
}

impl SystemDynamics {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SimContext<'_>) -> Result<AgentState, String> + Send + Sync + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl fmt::Debug for SystemDynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemDynamics").finish_non_exhaustive()
    }
}

impl ActionSelection for SystemDynamics {
    fn kind(&self) -> MechanismKind {
        MechanismKind::SystemDynamics
    }

    fn step(
        &mut self,
        _network: &mut BehaviorNetwork,
        ctx:      &SimContext<'_>,
        _rng:     &mut AgentRng,
    ) -> EngineResult<Outcome> {
        let f = &self.func;
        let next = guarded(|| f(ctx))
            .map_err(|m| EngineError::DynamicsEvaluation(format!("system dynamics panicked: {m}")))?
            .map_err(|m| EngineError::DynamicsEvaluation(format!("system dynamics failed: {m}")))?;
        Ok(Outcome::new(ActionResult::State(next)))
    }
}
