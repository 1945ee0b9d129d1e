//! `Agent` — one simulated entity: state, behavior network, and mechanism.

use bn_core::{AgentId, AgentRng, AgentState, SimContext, Tick};
use bn_mechanism::{ActionSelection, EngineResult, Mechanism, MechanismKind, Outcome, check_transition};
use bn_network::{BehaviorNetwork, NetworkCheckpoint};

/// Everything [`Agent::step`] may change, saved so a discarded tick can be
/// undone.
pub(crate) struct AgentCheckpoint {
    network:   NetworkCheckpoint,
    mechanism: Mechanism,
    rng:       AgentRng,
}

/// A behavior-based agent.
///
/// The agent owns its network outright; nothing is shared between agents
/// except the read-only world snapshot handed to [`step`](Self::step).
#[derive(Debug)]
pub struct Agent {
    pub id:      AgentId,
    pub name:    String,
    pub state:   AgentState,
    pub network: BehaviorNetwork,

    mechanism: Mechanism,
    rng:       AgentRng,

    /// Last network-consuming kind bound; the network's parameters were set
    /// up for it even while a non-network mechanism is bound.
    network_kind: Option<MechanismKind>,
}

impl Agent {
    /// A motionless agent at the origin with an empty network and no
    /// dynamics.  Its RNG is seeded from seed 0 until the builder reseeds it
    /// from the run configuration.
    pub fn new(id: AgentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name:         name.into(),
            state:        AgentState::default(),
            network:      BehaviorNetwork::new(),
            mechanism:    Mechanism::NoDynamics,
            rng:          AgentRng::new(0, id),
            network_kind: None,
        }
    }

    pub fn with_state(mut self, state: AgentState) -> Self {
        self.state = state;
        self
    }

    pub fn with_network(mut self, network: BehaviorNetwork) -> Self {
        self.network = network;
        self
    }

    pub fn mechanism(&self) -> &Mechanism {
        &self.mechanism
    }

    pub fn mechanism_mut(&mut self) -> &mut Mechanism {
        &mut self.mechanism
    }

    /// Bind `mechanism`, replacing the current one.
    ///
    /// Switching between mutual inhibition and cooperative blending is
    /// refused while the network has behaviors, including when the switch
    /// goes through no dynamics or system dynamics on the way.  On error
    /// nothing changes.
    pub fn bind_mechanism(&mut self, mechanism: Mechanism) -> EngineResult<()> {
        let to = mechanism.kind();
        let from = self.network_kind.unwrap_or(self.mechanism.kind());
        check_transition(from, to, &self.network)?;
        if to.uses_network() {
            self.network_kind = Some(to);
        }
        self.mechanism = mechanism;
        Ok(())
    }

    /// Re-seed the agent's RNG from a run's master seed.
    pub fn reseed(&mut self, global_seed: u64) {
        self.rng = AgentRng::new(global_seed, self.id);
    }

    pub(crate) fn checkpoint(&self) -> AgentCheckpoint {
        AgentCheckpoint {
            network:   self.network.checkpoint(),
            mechanism: self.mechanism.clone(),
            rng:       self.rng.clone(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: AgentCheckpoint) {
        self.network.restore(checkpoint.network);
        self.mechanism = checkpoint.mechanism;
        self.rng = checkpoint.rng;
    }

    /// Run one arbitration step against the frozen `world`.
    ///
    /// Only the network (task queues, cached excitations) and mechanism
    /// bookkeeping change here; the caller applies the returned result to
    /// [`state`](Self::state).
    pub fn step(
        &mut self,
        world:              &[AgentState],
        tick:               Tick,
        tick_duration_secs: f64,
    ) -> EngineResult<Outcome> {
        let state = world.get(self.id.index()).unwrap_or(&self.state);
        let ctx = SimContext::new(tick, tick_duration_secs, self.id, state, world);
        self.mechanism.step(&mut self.network, &ctx, &mut self.rng)
    }
}
