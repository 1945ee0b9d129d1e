//! Read-only simulation state passed to every user callable.

use crate::{AgentId, AgentState, Tick};

/// A read-only snapshot of the world, as seen by one agent, for one tick.
///
/// The tick loop copies every agent's state into a single `Vec<AgentState>`
/// before any agent is stepped and hands each agent a `SimContext` borrowing
/// that snapshot.  Excitation, action, dynamics and override callables are
/// therefore pure functions of a frozen world: evaluation order between
/// behaviors, or between agents, cannot change the outcome.
///
/// # Lifetimes
///
/// All borrows live for the duration of one agent's step.
#[derive(Clone, Copy)]
pub struct SimContext<'a> {
    /// Current simulation tick.
    pub tick: Tick,

    /// How many simulated seconds one tick represents.
    pub tick_duration_secs: f64,

    /// The agent being stepped.
    pub agent: AgentId,

    /// That agent's own state (same as `world[agent.index()]` when the agent
    /// is part of the world snapshot).
    pub state: &'a AgentState,

    /// Every agent's state at the start of the tick, indexed by `AgentId`.
    pub world: &'a [AgentState],
}

impl<'a> SimContext<'a> {
    /// Build a context for a single agent step.
    #[inline]
    pub fn new(
        tick:               Tick,
        tick_duration_secs: f64,
        agent:              AgentId,
        state:              &'a AgentState,
        world:              &'a [AgentState],
    ) -> Self {
        Self { tick, tick_duration_secs, agent, state, world }
    }

    /// Context for an agent evaluated on its own, outside a world snapshot
    /// (unit tests, editor previews).
    #[inline]
    pub fn solo(tick: Tick, tick_duration_secs: f64, state: &'a AgentState) -> Self {
        Self {
            tick,
            tick_duration_secs,
            agent: AgentId(0),
            state,
            world: std::slice::from_ref(state),
        }
    }

    /// Every other agent in the snapshot, paired with its id.
    pub fn others(&self) -> impl Iterator<Item = (AgentId, &'a AgentState)> + '_ {
        let me = self.agent;
        self.world
            .iter()
            .enumerate()
            .map(|(i, s)| (AgentId(i as u32), s))
            .filter(move |(id, _)| *id != me)
    }
}
