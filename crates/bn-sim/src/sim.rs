//! The `Sim` struct and its tick loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bn_core::{AgentState, SimClock, SimConfig, Tick};
use bn_mechanism::{ActionResult, EngineError, EngineResult, Outcome};
use tracing::trace;

use crate::agent::AgentCheckpoint;
use crate::{Agent, AgentSnapshot, Frame, History, SimObserver, SimResult};

/// The main simulation runner.
///
/// `Sim` owns every agent and drives the snapshot → step → apply → publish
/// tick loop.  It is single-threaded by itself; the
/// [`Scheduler`][crate::Scheduler] moves it onto a compute thread.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    /// Global configuration (tick duration, seed, output interval, …).
    pub config: SimConfig,

    /// Simulation clock; tracks the current tick.
    pub clock: SimClock,

    /// Agents, indexed by `AgentId`.
    pub agents: Vec<Agent>,

    pub(crate) history: Arc<History>,

    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// The history this sim publishes into.
    pub fn history(&self) -> Arc<History> {
        Arc::clone(&self.history)
    }

    /// Run from the current tick to `config.end_tick()`.
    ///
    /// Calls observer hooks at every tick boundary.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.current_tick < self.config.end_tick() {
            self.advance(observer, None);
        }
        observer.on_sim_end(self.clock.current_tick);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.advance(observer, None);
        }
        Ok(())
    }

    /// Hand the agents back, consuming the sim.
    pub fn into_agents(self) -> Vec<Agent> {
        self.agents
    }

    // ── Core tick processing ──────────────────────────────────────────────

    /// Compute, apply and publish one tick.
    ///
    /// If `cancel` is set by the time every agent has been stepped, the tick
    /// is discarded: every agent's queues, mechanism and RNG are put back, no
    /// state is written, no frame is published, the clock does not advance,
    /// and `false` is returned.
    pub(crate) fn advance<O: SimObserver>(
        &mut self,
        observer: &mut O,
        cancel:   Option<&AtomicBool>,
    ) -> bool {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);

        // ── Phase 1: frozen world snapshot ────────────────────────────────
        let world: Vec<AgentState> = self.agents.iter().map(|a| a.state.clone()).collect();

        // ── Phase 2: step every agent against the snapshot ────────────────
        let saved: Option<Vec<AgentCheckpoint>> =
            cancel.map(|_| self.agents.iter().map(Agent::checkpoint).collect());
        let outcomes = self.compute_outcomes(&world, now);

        if cancel.is_some_and(|c| c.load(Ordering::Acquire)) {
            for (agent, checkpoint) in self.agents.iter_mut().zip(saved.into_iter().flatten()) {
                agent.restore(checkpoint);
            }
            trace!(tick = %now, "tick discarded");
            return false;
        }

        // ── Phase 3: apply in ascending AgentId order ─────────────────────
        let secs = self.config.tick_duration_secs;
        let mut acted = 0;
        let mut snapshots = Vec::with_capacity(self.agents.len());
        for (agent, outcome) in self.agents.iter_mut().zip(outcomes) {
            let mut snap = AgentSnapshot::initial(agent.id, AgentState::default());
            match outcome {
                Ok(Outcome { result, excitations, reported }) => {
                    if let Some(err) = reported {
                        observer.on_dynamics_error(now, agent.id, &err.to_string());
                    }
                    snap.winner = result.winner();
                    snap.command = result.command();
                    snap.excitations = excitations;
                    if !matches!(result, ActionResult::Idle) {
                        acted += 1;
                    }
                    result.apply_to(&mut agent.state, secs);
                }
                Err(EngineError::NoActiveBehavior) => {
                    trace!(tick = %now, agent = %agent.id, "no active behavior");
                }
                Err(err) => {
                    let message = err.to_string();
                    observer.on_dynamics_error(now, agent.id, &message);
                    snap.error = Some(message);
                }
            }
            snap.state = agent.state.clone();
            snapshots.push(snap);
        }

        // ── Phase 4: publish ──────────────────────────────────────────────
        self.clock.advance();
        let frame = Frame { tick: self.clock.current_tick, agents: snapshots };
        observer.on_tick_end(now, acted);
        let interval = self.config.output_interval_ticks;
        if interval > 0 && frame.tick.0.is_multiple_of(interval) {
            observer.on_snapshot(&frame);
        }
        self.history.push(frame);
        true
    }

    /// Step every agent.  With the `parallel` Cargo feature, agents are
    /// stepped on Rayon's thread pool; results come back in agent order
    /// either way.
    fn compute_outcomes(&mut self, world: &[AgentState], now: Tick) -> Vec<EngineResult<Outcome>> {
        let secs = self.config.tick_duration_secs;

        #[cfg(not(feature = "parallel"))]
        {
            self.agents.iter_mut().map(|a| a.step(world, now, secs)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let agents = &mut self.agents;
            let mut step_all = || -> Vec<EngineResult<Outcome>> {
                agents.par_iter_mut().map(|a| a.step(world, now, secs)).collect()
            };
            match &self.pool {
                Some(pool) => pool.install(step_all),
                None => step_all(),
            }
        }
    }
}

/// The frame describing `agents` before any tick has run.
pub(crate) fn initial_frame(tick: Tick, agents: &[Agent]) -> Frame {
    Frame {
        tick,
        agents: agents.iter().map(|a| AgentSnapshot::initial(a.id, a.state.clone())).collect(),
    }
}
