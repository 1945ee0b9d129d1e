//! The `ActionSelection` trait and what a step produces.

use bn_core::{AgentRng, AgentState, BehaviorId, Command, SimContext};
use bn_network::{BehaviorNetwork, DynamicEvaluationError};

use crate::{EngineResult, MechanismKind};

/// Pluggable per-tick arbitration strategy.
///
/// One value is bound per agent and stepped once per tick with that agent's
/// network.  Implementations may keep per-agent bookkeeping in `self` (the
/// previous winner, for instance) because every agent owns its own
/// mechanism.
///
/// # Contract
///
/// - Read the world only through `ctx`.
/// - Never mutate the agent state; describe the change in the returned
///   [`ActionResult`].
/// - On `Err`, the caller leaves the agent unchanged for this tick.
pub trait ActionSelection: Send + 'static {
    fn kind(&self) -> MechanismKind;

    fn step(
        &mut self,
        network: &mut BehaviorNetwork,
        ctx:     &SimContext<'_>,
        rng:     &mut AgentRng,
    ) -> EngineResult<Outcome>;
}

/// What the agent should do after one arbitration step.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionResult {
    /// Nothing to do (no-dynamics mechanism).
    Idle,

    /// Mutual inhibition picked `winner`.  `held` is `true` when the
    /// winner's queue was exhausted and could not be refilled, in which case
    /// `command` is the agent's previous command.
    Winner { winner: BehaviorId, command: Command, held: bool },

    /// Cooperative blending produced `command`.
    Blended { command: Command },

    /// System dynamics computed the next state directly.
    State(AgentState),
}

impl ActionResult {
    /// The winning behavior, for winner-take-all results.
    pub fn winner(&self) -> Option<BehaviorId> {
        match self {
            ActionResult::Winner { winner, .. } => Some(*winner),
            _ => None,
        }
    }

    /// The motion command to execute, if the result is command-based.
    pub fn command(&self) -> Option<Command> {
        match self {
            ActionResult::Winner { command, .. } | ActionResult::Blended { command } => Some(*command),
            _ => None,
        }
    }

    /// Write the result into `state`, advancing `secs` seconds of motion.
    pub fn apply_to(self, state: &mut AgentState, secs: f64) {
        match self {
            ActionResult::Idle => {}
            ActionResult::Winner { command, .. } | ActionResult::Blended { command } => {
                state.apply(command, secs);
            }
            ActionResult::State(next) => *state = next,
        }
    }
}

/// A successful step.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub result: ActionResult,

    /// Per-behavior excitation after arbitration, in layout order: the
    /// post-inhibition value for mutual inhibition, excitation × weight for
    /// cooperative blending, empty otherwise.
    pub excitations: Vec<f64>,

    /// Dynamic override failure, present only on the first tick of a failure
    /// streak.  The step itself still succeeded with reused parameters.
    pub reported: Option<DynamicEvaluationError>,
}

impl Outcome {
    pub fn new(result: ActionResult) -> Self {
        Self { result, excitations: Vec::new(), reported: None }
    }
}
