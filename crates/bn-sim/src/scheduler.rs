//! Threaded run control: `Stopped → Running ⇄ Paused → Stopped`.
//!
//! [`Scheduler::run`] moves the agents onto a dedicated compute thread that
//! advances the tick counter as fast as it can, up to the requested maximum.
//! `pause`, `resume` and `stop` only flip shared flags; the compute thread
//! checks them once per tick.  [`Playback`] cursors created by the scheduler
//! honor the same pause state.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use bn_core::{SimConfig, Tick};
use bn_network::callable::panic_message;
use tracing::{info, warn};

use crate::{Agent, History, NoopObserver, Playback, Sim, SimBuilder, SimError, SimObserver, SimResult};

// ── Run state ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Stopped => f.write_str("stopped"),
            RunState::Running => f.write_str("running"),
            RunState::Paused  => f.write_str("paused"),
        }
    }
}

/// Flags shared between the scheduler, its compute thread and playback
/// cursors.
#[derive(Debug)]
pub(crate) struct Control {
    state:  Mutex<RunState>,
    change: Condvar,
    stop:   AtomicBool,
    tick:   AtomicU64,
}

impl Control {
    fn new() -> Self {
        Self {
            state:  Mutex::new(RunState::Stopped),
            change: Condvar::new(),
            stop:   AtomicBool::new(false),
            tick:   AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> RunState {
        *self.lock()
    }

    fn set_state(&self, state: RunState) {
        *self.lock() = state;
        self.change.notify_all();
    }

    /// Block while paused.  Returns `false` if a stop was requested.
    pub(crate) fn wait_while_paused(&self) -> bool {
        let state = self.lock();
        let _state = self
            .change
            .wait_while(state, |s| *s == RunState::Paused && !self.stop.load(Ordering::Acquire))
            .unwrap_or_else(PoisonError::into_inner);
        !self.stop.load(Ordering::Acquire)
    }
}

// ── Run report ────────────────────────────────────────────────────────────────

/// What a finished or stopped run hands back.
pub struct RunReport<O = NoopObserver> {
    /// The agents in their final state.
    pub agents: Vec<Agent>,

    /// Every frame the run published, starting with the initial state.
    pub history: Arc<History>,

    /// Ticks computed before the run ended.
    pub ticks: u64,

    /// `true` if the run reached its maximum tick, `false` if stopped.
    pub completed: bool,

    /// The observer the run was started with.
    pub observer: O,
}

impl<O> fmt::Debug for RunReport<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunReport")
            .field("agents", &self.agents.len())
            .field("ticks", &self.ticks)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Owns the compute thread of one run at a time.
pub struct Scheduler<O: SimObserver + Send + 'static = NoopObserver> {
    config:  SimConfig,
    control: Arc<Control>,
    history: Arc<History>,
    handle:  Option<JoinHandle<RunReport<O>>>,
}

impl<O: SimObserver + Send + 'static> Scheduler<O> {
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            control: Arc::new(Control::new()),
            history: Arc::new(History::new()),
            handle:  None,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.control.state()
    }

    /// Ticks computed by the current run (0 after `stop`).
    pub fn tick(&self) -> Tick {
        Tick(self.control.tick.load(Ordering::Acquire))
    }

    /// The history of the current (or most recent) run.
    pub fn history(&self) -> Arc<History> {
        Arc::clone(&self.history)
    }

    /// A display cursor over the current run's history that blocks while the
    /// run is paused.
    pub fn playback(&self) -> Playback {
        Playback::with_control(self.history(), Arc::clone(&self.control))
    }

    /// Start a run with a default observer.  See [`run_with`](Self::run_with).
    pub fn run(&mut self, agents: Vec<Agent>, max_ticks: u64) -> SimResult<()>
    where
        O: Default,
    {
        self.run_with(agents, max_ticks, O::default())
    }

    /// Move `agents` onto a compute thread and run up to `max_ticks` ticks.
    ///
    /// Fails with [`SimError::Busy`] if a previous run has not been collected
    /// with [`stop`](Self::stop) or [`wait`](Self::wait).
    pub fn run_with(&mut self, agents: Vec<Agent>, max_ticks: u64, observer: O) -> SimResult<()> {
        if self.handle.is_some() {
            return Err(SimError::Busy);
        }
        let mut config = self.config.clone();
        config.max_ticks = max_ticks;
        let sim = SimBuilder::new(config, agents).build()?;
        self.history = sim.history();

        self.control.stop.store(false, Ordering::Release);
        self.control.tick.store(0, Ordering::Release);
        self.control.set_state(RunState::Running);
        info!(agents = sim.agents.len(), max_ticks, "run started");

        let control = Arc::clone(&self.control);
        let handle = thread::Builder::new()
            .name("bn-compute".into())
            .spawn(move || compute_loop(sim, control, observer))
            .map_err(|e| {
                self.control.set_state(RunState::Stopped);
                SimError::Thread(e.to_string())
            })?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Freeze the compute loop (and scheduler-created playback cursors)
    /// without resetting the tick counter.
    pub fn pause(&self) {
        let mut state = self.control.lock();
        if *state == RunState::Running {
            *state = RunState::Paused;
            info!(tick = %self.tick(), "run paused");
        }
    }

    pub fn resume(&self) {
        let mut state = self.control.lock();
        if *state == RunState::Paused {
            *state = RunState::Running;
            drop(state);
            self.control.change.notify_all();
            info!(tick = %self.tick(), "run resumed");
        }
    }

    /// Stop the run.
    ///
    /// The tick being computed is discarded, the tick counter resets to 0,
    /// and the agents plus everything computed so far are handed back.  A
    /// fresh empty history is installed for the next run.
    pub fn stop(&mut self) -> SimResult<RunReport<O>> {
        self.control.stop.store(true, Ordering::Release);
        self.control.change.notify_all();
        let report = self.join()?;
        self.control.tick.store(0, Ordering::Release);
        self.history = Arc::new(History::new());
        info!(ticks = report.ticks, "run stopped");
        Ok(report)
    }

    /// Block until the run reaches its maximum tick and collect it.  The tick
    /// counter and history are kept.
    pub fn wait(&mut self) -> SimResult<RunReport<O>> {
        self.join()
    }

    /// `true` once the compute thread has exited (or no run was started).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    fn join(&mut self) -> SimResult<RunReport<O>> {
        let handle = self.handle.take().ok_or(SimError::NotRunning)?;
        let result = handle.join();
        self.control.set_state(RunState::Stopped);
        result.map_err(|payload| SimError::Thread(panic_message(payload)))
    }
}

impl<O: SimObserver + Send + 'static> Drop for Scheduler<O> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.control.stop.store(true, Ordering::Release);
            self.control.change.notify_all();
            if let Err(e) = self.join() {
                warn!(error = %e, "compute thread failed during shutdown");
            }
        }
    }
}

// ── Compute thread ────────────────────────────────────────────────────────────

fn compute_loop<O: SimObserver>(mut sim: Sim, control: Arc<Control>, mut observer: O) -> RunReport<O> {
    let end = sim.config.end_tick();
    let mut completed = true;
    while sim.clock.current_tick < end {
        if !control.wait_while_paused() || !sim.advance(&mut observer, Some(&control.stop)) {
            completed = false;
            break;
        }
        control.tick.store(sim.clock.current_tick.0, Ordering::Release);
    }
    let ticks = sim.clock.current_tick.0;
    observer.on_sim_end(sim.clock.current_tick);
    sim.history.close();
    control.set_state(RunState::Stopped);
    if completed {
        info!(ticks, "run completed");
    }

    RunReport { history: sim.history(), agents: sim.into_agents(), ticks, completed, observer }
}
