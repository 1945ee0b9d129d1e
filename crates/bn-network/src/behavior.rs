//! Behaviors and their task queues.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use bn_core::{AgentRng, BehaviorId, Command, SimContext, Task};

use crate::CallableError;
use crate::callable::guarded;

// ── Callable types ────────────────────────────────────────────────────────────

/// Computes a behavior's raw excitation from the frozen world snapshot.
pub type ExcitationFn = Arc<dyn Fn(&SimContext<'_>) -> f64 + Send + Sync>;

/// Produces the tasks a behavior wants executed, in order.
///
/// Invoked to fill (or, for resumable behaviors, refill) the task queue.  The
/// agent's private RNG is supplied so stochastic actions stay deterministic.
pub type ActionFn = Arc<dyn Fn(&SimContext<'_>, &mut AgentRng) -> Vec<Task> + Send + Sync>;

/// Wrap a closure as an [`ExcitationFn`].
///
/// Going through this helper (rather than `Arc::new`) lets the compiler infer
/// the closure's higher-ranked signature from the bound.
pub fn excitation<F>(f: F) -> ExcitationFn
where
    F: Fn(&SimContext<'_>) -> f64 + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as an [`ActionFn`].
pub fn action<F>(f: F) -> ActionFn
where
    F: Fn(&SimContext<'_>, &mut AgentRng) -> Vec<Task> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An excitation function that always returns `value`.
pub fn constant_excitation(value: f64) -> ExcitationFn {
    excitation(move |_| value)
}

/// An action function that always yields a copy of `tasks`.
pub fn fixed_tasks(tasks: Vec<Task>) -> ActionFn {
    action(move |_, _| tasks.clone())
}

// ── TaskQueue ─────────────────────────────────────────────────────────────────

/// Pending primitive actions of one behavior.
///
/// A queue starts *unprimed*: the first time its behavior is asked for a task
/// the action function runs regardless of the resumable flag.  After that an
/// empty queue is only refilled for resumable behaviors.  Queues are never
/// reset by arbitration; a behavior that loses control and later regains it
/// continues where it stopped.
#[derive(Clone, Debug, Default)]
pub struct TaskQueue {
    tasks:  VecDeque<Task>,
    primed: bool,
    last:   Option<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// `true` once the action function has filled the queue at least once.
    #[inline]
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// The next task, without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<&Task> {
        self.tasks.front()
    }

    /// The most recently dequeued task.
    #[inline]
    pub fn last(&self) -> Option<Task> {
        self.last
    }

    /// Append `tasks` and mark the queue primed.
    pub fn refill(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks.extend(tasks);
        self.primed = true;
    }

    /// Dequeue one task, remembering it as [`last`](Self::last).
    pub fn pop(&mut self) -> Option<Task> {
        let task = self.tasks.pop_front()?;
        self.last = Some(task);
        Some(task)
    }

    /// Back to the freshly created, unprimed state.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.primed = false;
        self.last = None;
    }
}

// ── BehaviorSpec ──────────────────────────────────────────────────────────────

/// Everything needed to create a [`Behavior`] except its id.
///
/// # Example
///
/// ```rust
/// use bn_core::Command;
/// use bn_network::{BehaviorNetwork, BehaviorSpec, constant_excitation, fixed_tasks};
///
/// let mut net = BehaviorNetwork::new();
/// let id = net.insert(
///     BehaviorSpec::new(
///         "wander",
///         constant_excitation(0.3),
///         fixed_tasks(vec![Command::new(1.0, 0.0)]),
///     )
///     .resumable(true)
///     .weight(0.5),
/// ).unwrap();
/// assert_eq!(net.behavior(id).unwrap().weight, 0.5);
/// ```
#[derive(Clone)]
pub struct BehaviorSpec {
    pub name:           String,
    pub excitation_fn:  ExcitationFn,
    pub action_fn:      ActionFn,
    pub resumable:      bool,
    pub weight:         f64,
    pub excitation_key: Option<String>,
    pub action_key:     Option<String>,
}

impl BehaviorSpec {
    /// A non-resumable spec with weight 1.
    pub fn new(name: impl Into<String>, excitation_fn: ExcitationFn, action_fn: ActionFn) -> Self {
        Self {
            name: name.into(),
            excitation_fn,
            action_fn,
            resumable: false,
            weight: 1.0,
            excitation_key: None,
            action_key: None,
        }
    }

    pub fn resumable(mut self, resumable: bool) -> Self {
        self.resumable = resumable;
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Record the registry keys the callables were resolved from, so the
    /// behavior survives a description round-trip.
    pub fn keys(mut self, excitation: impl Into<String>, action: impl Into<String>) -> Self {
        self.excitation_key = Some(excitation.into());
        self.action_key = Some(action.into());
        self
    }
}

// ── Behavior ──────────────────────────────────────────────────────────────────

/// One behavior of an agent's network.
#[derive(Clone)]
pub struct Behavior {
    pub id:   BehaviorId,
    pub name: String,

    pub excitation_fn: ExcitationFn,
    pub action_fn:     ActionFn,

    /// Contribution factor in cooperative mode, `[0, 1]`.  Never normalized.
    pub weight: f64,

    /// Refill the task queue from the action function whenever it runs dry.
    pub resumable: bool,

    pub queue: TaskQueue,

    /// Raw excitation from the most recent evaluation.
    pub excitation: f64,

    pub excitation_key: Option<String>,
    pub action_key:     Option<String>,
}

impl Behavior {
    pub(crate) fn from_spec(id: BehaviorId, spec: BehaviorSpec) -> Self {
        Self {
            id,
            name:           spec.name,
            excitation_fn:  spec.excitation_fn,
            action_fn:      spec.action_fn,
            weight:         spec.weight,
            resumable:      spec.resumable,
            queue:          TaskQueue::new(),
            excitation:     0.0,
            excitation_key: spec.excitation_key,
            action_key:     spec.action_key,
        }
    }

    /// The spec this behavior was created from (queue and excitation dropped).
    pub fn to_spec(&self) -> BehaviorSpec {
        BehaviorSpec {
            name:           self.name.clone(),
            excitation_fn:  Arc::clone(&self.excitation_fn),
            action_fn:      Arc::clone(&self.action_fn),
            resumable:      self.resumable,
            weight:         self.weight,
            excitation_key: self.excitation_key.clone(),
            action_key:     self.action_key.clone(),
        }
    }

    /// Recompute and store the raw excitation.
    pub fn evaluate(&mut self, ctx: &SimContext<'_>) -> Result<f64, CallableError> {
        let f = &self.excitation_fn;
        let value = guarded(|| f(ctx)).map_err(|message| self.callable_error("excitation", message))?;
        self.excitation = value;
        Ok(value)
    }

    /// Consume the next task, filling the queue first when the rules allow.
    ///
    /// Returns `Ok(None)` when the queue is exhausted and may not be refilled
    /// (non-resumable, already primed).  The caller decides what "holding"
    /// means in that case.
    pub fn next_task(
        &mut self,
        ctx: &SimContext<'_>,
        rng: &mut AgentRng,
    ) -> Result<Option<Task>, CallableError> {
        if self.queue.is_empty() && (self.resumable || !self.queue.is_primed()) {
            let f = &self.action_fn;
            let tasks = guarded(|| f(ctx, rng)).map_err(|message| self.callable_error("action", message))?;
            self.queue.refill(tasks);
        }
        Ok(self.queue.pop())
    }

    /// What this behavior is currently asking for: the task it just consumed.
    #[inline]
    pub fn current_command(&self) -> Option<Command> {
        self.queue.last()
    }

    fn callable_error(&self, stage: &'static str, message: String) -> CallableError {
        CallableError { behavior: self.id, name: self.name.clone(), stage, message }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("resumable", &self.resumable)
            .field("queue", &self.queue)
            .field("excitation", &self.excitation)
            .finish_non_exhaustive()
    }
}
