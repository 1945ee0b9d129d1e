//! Append-only, tick-indexed record of a run.
//!
//! # Concurrency
//!
//! One writer (the compute thread) appends frames; any number of readers
//! sample them.  The number of published frames is mirrored in an atomic
//! counter so readers can check progress without taking the lock, and a
//! condition variable wakes readers waiting for a frame that has not been
//! computed yet.  Frames are immutable once published and handed out as
//! `Arc<Frame>`, so repeated reads of the same index return identical data.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use bn_core::{AgentId, AgentState, BehaviorId, Command, Tick};

// ── Frame ─────────────────────────────────────────────────────────────────────

/// One agent's entry in a [`Frame`].
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    pub agent: AgentId,
    pub state: AgentState,

    /// Winning behavior of the step that produced this state (mutual
    /// inhibition only).
    pub winner: Option<BehaviorId>,

    /// Command executed by that step, if it was command-based.
    pub command: Option<Command>,

    /// Post-arbitration excitations in layout order, for display.
    pub excitations: Vec<f64>,

    /// Human-readable failure of that step, if it failed.
    pub error: Option<String>,
}

impl AgentSnapshot {
    /// Snapshot of an agent that has not been stepped yet.
    pub fn initial(agent: AgentId, state: AgentState) -> Self {
        Self { agent, state, winner: None, command: None, excitations: Vec::new(), error: None }
    }
}

/// World state after `tick` ticks.  Frame 0 is the initial state.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub tick:   Tick,
    pub agents: Vec<AgentSnapshot>,
}

// ── History ───────────────────────────────────────────────────────────────────

/// Append-only frame store shared between the compute thread and readers.
///
/// Frame `k` is stored at index `k`.
#[derive(Debug, Default)]
pub struct History {
    frames:   Mutex<Vec<Arc<Frame>>>,
    ready:    Condvar,
    computed: AtomicU64,
    closed:   AtomicBool,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Frame>>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the next frame and wake waiting readers.
    ///
    /// Must only be called by the single writer; `frame.tick` is expected to
    /// equal the current [`len`](Self::len).
    pub fn push(&self, frame: Frame) {
        let mut frames = self.lock();
        frames.push(Arc::new(frame));
        self.computed.store(frames.len() as u64, Ordering::Release);
        drop(frames);
        self.ready.notify_all();
    }

    /// Mark the history complete: no more frames will be appended.  Wakes
    /// every waiting reader.
    pub fn close(&self) {
        let _frames = self.lock();
        self.closed.store(true, Ordering::Release);
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of published frames.
    #[inline]
    pub fn len(&self) -> u64 {
        self.computed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tick of the newest published frame.
    pub fn latest_tick(&self) -> Option<Tick> {
        self.len().checked_sub(1).map(Tick)
    }

    /// Frame `k`, if it has been published.
    pub fn get(&self, k: u64) -> Option<Arc<Frame>> {
        if k >= self.len() {
            return None;
        }
        self.lock().get(k as usize).cloned()
    }

    /// Frame `k`, or the newest frame if `k` has not been computed yet.
    /// Never blocks on computation.  `None` only while the history is empty.
    pub fn frame_at(&self, k: u64) -> Option<Arc<Frame>> {
        let frames = self.lock();
        let last = frames.len().checked_sub(1)?;
        frames.get((k as usize).min(last)).cloned()
    }

    /// Block until frame `k` is published and return it.  Returns `None` if
    /// the history is closed before frame `k` exists.
    pub fn wait_for(&self, k: u64) -> Option<Arc<Frame>> {
        let frames = self.lock();
        let frames = self
            .ready
            .wait_while(frames, |f| (f.len() as u64) <= k && !self.is_closed())
            .unwrap_or_else(PoisonError::into_inner);
        frames.get(k as usize).cloned()
    }

    /// Every published frame, in tick order.
    pub fn frames(&self) -> Vec<Arc<Frame>> {
        self.lock().clone()
    }
}
