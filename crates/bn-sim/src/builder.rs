//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use bn_core::{AgentId, AgentState, SimConfig};
use bn_mechanism::Mechanism;

use crate::sim::initial_frame;
use crate::{Agent, History, Sim, SimError, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`] — max ticks, seed, tick duration, …
/// - the agents, with `agents[i].id == AgentId(i)`
///
/// # Optional inputs
///
/// | Method                | Default                                  |
/// |-----------------------|------------------------------------------|
/// | `.mechanisms(v)`      | Each agent keeps the mechanism it has    |
/// | `.initial_states(v)`  | Each agent keeps the state it has        |
///
/// Building validates the configuration, re-seeds every agent's RNG from
/// `config.seed`, applies `config.settle_iterations` to mutual-inhibition
/// mechanisms, and publishes frame 0 (the initial state) to a new history.
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, agents)
///     .mechanisms(vec![Mechanism::mutual(), Mechanism::cooperative()])
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:     SimConfig,
    agents:     Vec<Agent>,
    mechanisms: Option<Vec<Mechanism>>,
    states:     Option<Vec<AgentState>>,
}

impl SimBuilder {
    pub fn new(config: SimConfig, agents: Vec<Agent>) -> Self {
        Self { config, agents, mechanisms: None, states: None }
    }

    /// Bind one mechanism per agent (must be length `agent_count`).
    pub fn mechanisms(mut self, mechanisms: Vec<Mechanism>) -> Self {
        self.mechanisms = Some(mechanisms);
        self
    }

    /// Replace every agent's starting state (must be length `agent_count`).
    pub fn initial_states(mut self, states: Vec<AgentState>) -> Self {
        self.states = Some(states);
        self
    }

    /// Validate inputs and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        self.config.validate()?;
        let mut agents = self.agents;
        let agent_count = agents.len();

        for (index, agent) in agents.iter().enumerate() {
            if agent.id.index() != index {
                return Err(SimError::AgentIdMismatch { index, id: agent.id });
            }
        }

        // ── Validate and resolve optional inputs ──────────────────────────
        if let Some(states) = self.states {
            if states.len() != agent_count {
                return Err(SimError::AgentCountMismatch {
                    expected: agent_count,
                    got:      states.len(),
                    what:     "initial states",
                });
            }
            for (agent, state) in agents.iter_mut().zip(states) {
                agent.state = state;
            }
        }

        if let Some(mechanisms) = self.mechanisms {
            if mechanisms.len() != agent_count {
                return Err(SimError::AgentCountMismatch {
                    expected: agent_count,
                    got:      mechanisms.len(),
                    what:     "mechanisms",
                });
            }
            for (agent, mechanism) in agents.iter_mut().zip(mechanisms) {
                agent.bind_mechanism(mechanism)?;
            }
        }

        for agent in &mut agents {
            agent.reseed(self.config.seed);
            if let Mechanism::MutualInhibition(m) = agent.mechanism_mut() {
                m.settle_iterations = self.config.settle_iterations;
            }
        }

        let clock = self.config.make_clock();
        let history = Arc::new(History::new());
        history.push(initial_frame(clock.current_tick, &agents));

        Ok(Sim {
            #[cfg(feature = "parallel")]
            pool: build_pool(self.config.num_threads)?,
            config: self.config,
            clock,
            agents,
            history,
        })
    }
}

#[cfg(feature = "parallel")]
fn build_pool(num_threads: Option<usize>) -> SimResult<Option<rayon::ThreadPool>> {
    num_threads
        .map(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| SimError::Config(e.to_string()))
        })
        .transpose()
}

/// Agents `0..n` named `agent-{i}`, ready for [`SimBuilder::new`].
pub fn numbered_agents(n: usize) -> Vec<Agent> {
    (0..n).map(|i| Agent::new(AgentId(i as u32), format!("agent-{i}"))).collect()
}
