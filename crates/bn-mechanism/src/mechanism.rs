//! The `Mechanism` tagged union and the rules for switching between variants.

use std::fmt;

use bn_core::{AgentRng, SimContext};
use bn_network::BehaviorNetwork;

use crate::{
    ActionResult, ActionSelection, Cooperative, EngineError, EngineResult, MutualInhibition, Outcome,
    SystemDynamics,
};

/// Discriminant of [`Mechanism`], used in errors and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MechanismKind {
    NoDynamics,
    SystemDynamics,
    MutualInhibition,
    Cooperative,
}

impl MechanismKind {
    /// Kinds that consume behaviors through task queues and therefore care
    /// about how the network was built.
    pub fn uses_network(self) -> bool {
        matches!(self, MechanismKind::MutualInhibition | MechanismKind::Cooperative)
    }
}

impl fmt::Display for MechanismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MechanismKind::NoDynamics       => f.write_str("no dynamics"),
            MechanismKind::SystemDynamics   => f.write_str("system dynamics"),
            MechanismKind::MutualInhibition => f.write_str("mutual inhibition"),
            MechanismKind::Cooperative      => f.write_str("cooperative"),
        }
    }
}

/// The action-selection mechanism bound to one agent.
#[derive(Clone, Debug, Default)]
pub enum Mechanism {
    /// The agent never acts.
    #[default]
    NoDynamics,
    SystemDynamics(SystemDynamics),
    MutualInhibition(MutualInhibition),
    Cooperative(Cooperative),
}

impl Mechanism {
    /// Mutual inhibition with a single settling pass.
    pub fn mutual() -> Self {
        Mechanism::MutualInhibition(MutualInhibition::default())
    }

    pub fn cooperative() -> Self {
        Mechanism::Cooperative(Cooperative)
    }
}

impl ActionSelection for Mechanism {
    fn kind(&self) -> MechanismKind {
        match self {
            Mechanism::NoDynamics          => MechanismKind::NoDynamics,
            Mechanism::SystemDynamics(m)   => m.kind(),
            Mechanism::MutualInhibition(m) => m.kind(),
            Mechanism::Cooperative(m)      => m.kind(),
        }
    }

    fn step(
        &mut self,
        network: &mut BehaviorNetwork,
        ctx:     &SimContext<'_>,
        rng:     &mut AgentRng,
    ) -> EngineResult<Outcome> {
        match self {
            Mechanism::NoDynamics          => Ok(Outcome::new(ActionResult::Idle)),
            Mechanism::SystemDynamics(m)   => m.step(network, ctx, rng),
            Mechanism::MutualInhibition(m) => m.step(network, ctx, rng),
            Mechanism::Cooperative(m)      => m.step(network, ctx, rng),
        }
    }
}

/// Check whether an agent may switch from `from` to `to` given its network.
///
/// Mutual inhibition and cooperative blending read the same behaviors with
/// different parameter sets (coefficients vs. weights), so switching between
/// them is only allowed once the network is empty.  Every other transition
/// keeps the network as it is.
pub fn check_transition(
    from:    MechanismKind,
    to:      MechanismKind,
    network: &BehaviorNetwork,
) -> EngineResult<()> {
    if from != to && from.uses_network() && to.uses_network() && !network.is_empty() {
        return Err(EngineError::IncompatibleMechanism { from, to, behaviors: network.len() });
    }
    Ok(())
}
