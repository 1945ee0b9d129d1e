//! `BehaviorNetwork` — the behaviors and edges of one agent.

use std::collections::BTreeMap;
use std::fmt;

use bn_core::{AgentRng, BehaviorId, SimContext, Task};
use tracing::warn;

use crate::dynamic::OverrideMemory;
use crate::{
    ActionFn, Behavior, BehaviorSpec, CallableError, DynamicExpression, Edge, ExcitationFn,
    NetworkError, NetworkObserver, NetworkResult, ParameterKind, Parameters, Resolved, TaskQueue,
};

/// A copied behavior, ready to be pasted into this or another network.
#[derive(Clone)]
pub struct BehaviorClipboard {
    spec: BehaviorSpec,
}

impl BehaviorClipboard {
    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

/// Run-time state of a network (task queues, cached excitations, dynamic
/// override memory) captured by [`BehaviorNetwork::checkpoint`].  Structure
/// is not part of it.
#[derive(Clone, Debug)]
pub struct NetworkCheckpoint {
    behaviors: Vec<(BehaviorId, TaskQueue, f64)>,
    memory:    OverrideMemory,
}

/// The behaviors of one agent plus the complete edge set over them.
///
/// # Ordering
///
/// `behaviors` keeps insertion (layout) order.  It is what editors lay out in
/// a grid and what dynamic expressions index into; it has no influence on
/// which behavior wins (ties go to the lowest id, not the first position).
///
/// # Edges
///
/// Keyed by the unordered pair (lower id first).  Adding a behavior creates a
/// zero-coefficient edge to every behavior already present; removing one drops
/// every edge it touches.  No public API can create or delete an edge on its
/// own.
pub struct BehaviorNetwork {
    behaviors: Vec<Behavior>,
    edges:     BTreeMap<(BehaviorId, BehaviorId), Edge>,
    next_id:   BehaviorId,
    dynamic:   Option<DynamicExpression>,
    memory:    OverrideMemory,
    observers: Vec<Box<dyn NetworkObserver>>,
}

impl Default for BehaviorNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorNetwork {
    pub fn new() -> Self {
        Self {
            behaviors: Vec::new(),
            edges:     BTreeMap::new(),
            next_id:   BehaviorId(0),
            dynamic:   None,
            memory:    OverrideMemory::default(),
            observers: Vec::new(),
        }
    }

    /// Register a structural-change observer.
    pub fn subscribe(&mut self, observer: Box<dyn NetworkObserver>) {
        self.observers.push(observer);
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Behaviors in layout order.
    #[inline]
    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    /// Mutable access for mechanisms (queues, cached excitation).  Structural
    /// fields must not be changed through this slice.
    #[inline]
    pub fn behaviors_mut(&mut self) -> &mut [Behavior] {
        &mut self.behaviors
    }

    /// Behavior ids in layout order.
    pub fn ids(&self) -> Vec<BehaviorId> {
        self.behaviors.iter().map(|b| b.id).collect()
    }

    pub fn contains(&self, id: BehaviorId) -> bool {
        self.position(id).is_some()
    }

    /// Layout index of `id`.
    pub fn position(&self, id: BehaviorId) -> Option<usize> {
        self.behaviors.iter().position(|b| b.id == id)
    }

    pub fn behavior(&self, id: BehaviorId) -> Option<&Behavior> {
        self.behaviors.iter().find(|b| b.id == id)
    }

    pub fn behavior_mut(&mut self, id: BehaviorId) -> Option<&mut Behavior> {
        self.behaviors.iter_mut().find(|b| b.id == id)
    }

    /// First behavior named `name` (names are not unique).
    pub fn find_by_name(&self, name: &str) -> Option<&Behavior> {
        self.behaviors.iter().find(|b| b.name == name)
    }

    /// Every edge, in ascending pair order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The edge between `a` and `b`, in either orientation.
    pub fn edge(&self, a: BehaviorId, b: BehaviorId) -> Option<&Edge> {
        self.edges.get(&Edge::key(a, b))
    }

    /// Edges touching `id`.  Meant for incremental editor redraws; arbitration
    /// always works from the full edge set.
    pub fn get_edges_for(&self, id: BehaviorId) -> Vec<&Edge> {
        self.edges.values().filter(|e| e.touches(id)).collect()
    }

    /// How strongly `src` inhibits `dst` under the static coefficients.
    pub fn inhibition(&self, src: BehaviorId, dst: BehaviorId) -> f64 {
        self.edge(src, dst).map_or(0.0, |e| e.inhibition(src, dst))
    }

    // ── Structural edits ──────────────────────────────────────────────────

    /// Add a non-keyed behavior.  Duplicate names are allowed; behaviors are
    /// told apart by id.
    pub fn add_behavior(
        &mut self,
        name:          impl Into<String>,
        excitation_fn: ExcitationFn,
        action_fn:     ActionFn,
        resumable:     bool,
    ) -> BehaviorId {
        self.push_spec(BehaviorSpec::new(name, excitation_fn, action_fn).resumable(resumable))
    }

    /// Like [`insert`](Self::insert) but refuses a name that is already taken.
    pub fn add_behavior_unique(&mut self, spec: BehaviorSpec) -> NetworkResult<BehaviorId> {
        if self.find_by_name(&spec.name).is_some() {
            return Err(NetworkError::DuplicateName(spec.name));
        }
        self.insert(spec)
    }

    /// Add a behavior built from `spec` and connect it to every existing one.
    ///
    /// Fails with [`NetworkError::WeightOutOfRange`] (network unchanged) if
    /// the spec's weight is outside `[0, 1]`.
    pub fn insert(&mut self, spec: BehaviorSpec) -> NetworkResult<BehaviorId> {
        check_weight(self.next_id, spec.weight)?;
        Ok(self.push_spec(spec))
    }

    fn push_spec(&mut self, spec: BehaviorSpec) -> BehaviorId {
        let id = self.next_id;
        self.next_id = id.next();
        self.attach(Behavior::from_spec(id, spec));
        id
    }

    /// Remove `id` and every edge touching it.
    pub fn remove_behavior(&mut self, id: BehaviorId) -> NetworkResult<Behavior> {
        let index = self.position(id).ok_or(NetworkError::BehaviorNotFound(id))?;
        let removed = self.behaviors.remove(index);
        self.edges.retain(|_, e| !e.touches(id));
        // Layout-indexed dynamic values no longer line up.
        self.memory.clear();
        for obs in &mut self.observers {
            obs.on_behavior_removed(id);
        }
        Ok(removed)
    }

    /// Remove every behavior (and therefore every edge).
    ///
    /// Required before switching an agent between mutual inhibition and
    /// cooperative blending.  Id allocation is not rewound.
    pub fn clear(&mut self) {
        let removed: Vec<BehaviorId> = self.behaviors.drain(..).map(|b| b.id).collect();
        self.edges.clear();
        self.memory.clear();
        for id in removed {
            for obs in &mut self.observers {
                obs.on_behavior_removed(id);
            }
        }
    }

    /// Move `id` to layout position `index` (other behaviors shift).
    pub fn move_behavior(&mut self, id: BehaviorId, index: usize) -> NetworkResult<()> {
        let from = self.position(id).ok_or(NetworkError::BehaviorNotFound(id))?;
        let len = self.behaviors.len();
        if index >= len {
            return Err(NetworkError::IndexOutOfRange { index, len });
        }
        let b = self.behaviors.remove(from);
        self.behaviors.insert(index, b);
        // Layout-indexed dynamic values no longer line up.
        self.memory.clear();
        for obs in &mut self.observers {
            obs.on_behavior_moved(id, index);
        }
        Ok(())
    }

    /// Copy `id`'s definition (callables, weight, resumable flag, keys).
    pub fn copy_behavior(&self, id: BehaviorId) -> NetworkResult<BehaviorClipboard> {
        let b = self.behavior(id).ok_or(NetworkError::BehaviorNotFound(id))?;
        Ok(BehaviorClipboard { spec: b.to_spec() })
    }

    /// Paste a copied behavior as a brand-new behavior: fresh id, empty task
    /// queue, zero-coefficient edges.  The copied weight was validated when
    /// its source behavior was created.
    pub fn paste(&mut self, clipboard: &BehaviorClipboard) -> BehaviorId {
        self.push_spec(clipboard.spec.clone())
    }

    /// Rename a behavior.
    pub fn rename(&mut self, id: BehaviorId, name: impl Into<String>) -> NetworkResult<()> {
        let b = self.behavior_mut(id).ok_or(NetworkError::BehaviorNotFound(id))?;
        b.name = name.into();
        Ok(())
    }

    /// Replace a behavior's excitation function (an edited equation).
    pub fn set_excitation_fn(&mut self, id: BehaviorId, f: ExcitationFn) -> NetworkResult<()> {
        let b = self.behavior_mut(id).ok_or(NetworkError::BehaviorNotFound(id))?;
        b.excitation_fn = f;
        b.excitation_key = None;
        Ok(())
    }

    /// Replace a behavior's action function.  The pending queue is discarded
    /// because it was produced by the old action.
    pub fn set_action_fn(&mut self, id: BehaviorId, f: ActionFn) -> NetworkResult<()> {
        let b = self.behavior_mut(id).ok_or(NetworkError::BehaviorNotFound(id))?;
        b.action_fn = f;
        b.action_key = None;
        b.queue.reset();
        Ok(())
    }

    pub fn set_resumable(&mut self, id: BehaviorId, resumable: bool) -> NetworkResult<()> {
        let b = self.behavior_mut(id).ok_or(NetworkError::BehaviorNotFound(id))?;
        b.resumable = resumable;
        Ok(())
    }

    // ── Weights and coefficients ──────────────────────────────────────────

    /// Set both inhibition coefficients of the pair `{from, to}`: `ft` is how
    /// much `from` inhibits `to`, `tf` the reverse.  Either orientation of the
    /// pair may be named.
    pub fn set_edge_coefficients(
        &mut self,
        from: BehaviorId,
        to:   BehaviorId,
        ft:   f64,
        tf:   f64,
    ) -> NetworkResult<()> {
        if from == to {
            return Err(NetworkError::SelfEdge(from));
        }
        for id in [from, to] {
            if !self.contains(id) {
                return Err(NetworkError::BehaviorNotFound(id));
            }
        }
        for c in [ft, tf] {
            check_coefficient(c)?;
        }
        let edge = self
            .edges
            .get_mut(&Edge::key(from, to))
            .ok_or(NetworkError::BehaviorNotFound(to))?;
        edge.set_from(from, ft, tf);
        Ok(())
    }

    /// Show or hide the pair's edge in editors.
    pub fn set_edge_visible(&mut self, a: BehaviorId, b: BehaviorId, visible: bool) -> NetworkResult<()> {
        if a == b {
            return Err(NetworkError::SelfEdge(a));
        }
        for id in [a, b] {
            if !self.contains(id) {
                return Err(NetworkError::BehaviorNotFound(id));
            }
        }
        let edge = self
            .edges
            .get_mut(&Edge::key(a, b))
            .ok_or(NetworkError::BehaviorNotFound(b))?;
        edge.visible = visible;
        Ok(())
    }

    pub fn set_weight(&mut self, id: BehaviorId, weight: f64) -> NetworkResult<()> {
        check_weight(id, weight)?;
        let b = self.behavior_mut(id).ok_or(NetworkError::BehaviorNotFound(id))?;
        b.weight = weight;
        Ok(())
    }

    /// Set several weights at once.  All entries are validated first; if any
    /// is rejected, no weight changes.
    pub fn set_weights<I>(&mut self, weights: I) -> NetworkResult<()>
    where
        I: IntoIterator<Item = (BehaviorId, f64)>,
    {
        let weights: Vec<(BehaviorId, f64)> = weights.into_iter().collect();
        for &(id, w) in &weights {
            if !self.contains(id) {
                return Err(NetworkError::BehaviorNotFound(id));
            }
            check_weight(id, w)?;
        }
        for (id, w) in weights {
            if let Some(b) = self.behavior_mut(id) {
                b.weight = w;
            }
        }
        Ok(())
    }

    // ── Dynamic override ──────────────────────────────────────────────────

    /// Install (`Some`) or remove (`None`) the dynamic override.  Either way
    /// the last-known-good memory and failure streak start over.
    pub fn set_dynamic_expression(&mut self, expr: Option<DynamicExpression>) {
        self.dynamic = expr;
        self.memory.clear();
    }

    pub fn dynamic_expression(&self) -> Option<&DynamicExpression> {
        self.dynamic.as_ref()
    }

    /// Display snapshot: weights from the last successful dynamic evaluation.
    pub fn last_dynamic_weights(&self) -> Option<&[f64]> {
        self.memory.weights.as_deref()
    }

    /// Display snapshot: coefficients from the last successful dynamic
    /// evaluation, indexed by layout position.
    pub fn last_dynamic_coefficients(&self) -> Option<&[Vec<f64>]> {
        self.memory.coefficients.as_deref()
    }

    /// The static (editor-configured) parameters of `kind`.
    pub fn static_parameters(&self, kind: ParameterKind) -> Parameters {
        match kind {
            ParameterKind::Weights => Parameters::Weights(self.behaviors.iter().map(|b| b.weight).collect()),
            ParameterKind::Coefficients => {
                let ids = self.ids();
                let m: Vec<Vec<f64>> = ids
                    .iter()
                    .map(|&src| {
                        ids.iter()
                            .map(|&dst| if src == dst { 0.0 } else { self.inhibition(src, dst) })
                            .collect::<Vec<f64>>()
                    })
                    .collect();
                Parameters::Coefficients(m)
            }
        }
    }

    /// The parameters of `kind` to arbitrate with this tick.
    ///
    /// Without a dynamic expression these are the static values.  With one,
    /// the expression is evaluated against `ctx`; on failure the last good
    /// values (or the static ones) are reused and the error is attached to the
    /// result only on the first failing tick of a streak.
    pub fn resolve(&mut self, kind: ParameterKind, ctx: &SimContext<'_>) -> Resolved {
        let Some(expr) = &self.dynamic else {
            return Resolved::fixed(self.static_parameters(kind));
        };
        let ids = self.ids();
        match expr.evaluate(ctx, &ids, kind) {
            Ok(parameters) => {
                self.memory.remember(&parameters);
                Resolved { parameters, dynamic: true, reused_previous: false, error: None }
            }
            Err(err) => {
                let parameters = self
                    .memory
                    .recall(kind, ids.len())
                    .unwrap_or_else(|| self.static_parameters(kind));
                let first = !self.memory.failing;
                self.memory.failing = true;
                if first {
                    warn!(tick = %ctx.tick, agent = %ctx.agent, error = %err, "dynamic expression failed; reusing previous values");
                }
                Resolved {
                    parameters,
                    dynamic: true,
                    reused_previous: true,
                    error: first.then_some(err),
                }
            }
        }
    }

    // ── Evaluation helpers used by mechanisms ─────────────────────────────

    /// Recompute every behavior's raw excitation against the same snapshot.
    /// Returned in layout order.
    pub fn evaluate_all(&mut self, ctx: &SimContext<'_>) -> Result<Vec<f64>, CallableError> {
        self.behaviors.iter_mut().map(|b| b.evaluate(ctx)).collect()
    }

    /// Consume the next task of the behavior at layout index `index`.
    pub fn next_task_at(
        &mut self,
        index: usize,
        ctx:   &SimContext<'_>,
        rng:   &mut AgentRng,
    ) -> Result<Option<Task>, CallableError> {
        self.behaviors[index].next_task(ctx, rng)
    }

    /// Save every queue, cached excitation and the override memory.
    pub fn checkpoint(&self) -> NetworkCheckpoint {
        NetworkCheckpoint {
            behaviors: self.behaviors.iter().map(|b| (b.id, b.queue.clone(), b.excitation)).collect(),
            memory:    self.memory.clone(),
        }
    }

    /// Put back what [`checkpoint`](Self::checkpoint) saved.  Behaviors added
    /// since are left alone; removed ones are skipped.
    pub fn restore(&mut self, checkpoint: NetworkCheckpoint) {
        for (id, queue, excitation) in checkpoint.behaviors {
            if let Some(b) = self.behavior_mut(id) {
                b.queue = queue;
                b.excitation = excitation;
            }
        }
        self.memory = checkpoint.memory;
    }

    /// Run `f` as one unit: if it fails, queues, cached excitations and
    /// override memory are rolled back to what they were before.
    pub fn atomically<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let saved = self.checkpoint();
        let result = f(self);
        if result.is_err() {
            self.restore(saved);
        }
        result
    }

    /// Empty every task queue (used when a run is restarted from scratch).
    pub fn reset_queues(&mut self) {
        for b in &mut self.behaviors {
            b.queue.reset();
            b.excitation = 0.0;
        }
        self.memory.clear();
    }

    // ── Crate-internal construction ───────────────────────────────────────

    /// Append a fully built behavior, creating its edges.  Used by `insert`
    /// and by description loading (which supplies its own ids).
    pub(crate) fn attach(&mut self, behavior: Behavior) {
        let id = behavior.id;
        for other in &self.behaviors {
            let (lo, hi) = Edge::key(other.id, id);
            self.edges.insert((lo, hi), Edge::new(lo, hi));
        }
        if id >= self.next_id {
            self.next_id = id.next();
        }
        let name = behavior.name.clone();
        self.behaviors.push(behavior);
        for obs in &mut self.observers {
            obs.on_behavior_added(id, &name);
        }
    }

    pub(crate) fn edge_mut(&mut self, a: BehaviorId, b: BehaviorId) -> Option<&mut Edge> {
        self.edges.get_mut(&Edge::key(a, b))
    }
}

impl fmt::Debug for BehaviorNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorNetwork")
            .field("behaviors", &self.behaviors)
            .field("edges", &self.edges.values().collect::<Vec<_>>())
            .field("next_id", &self.next_id)
            .field("dynamic", &self.dynamic)
            .finish_non_exhaustive()
    }
}

// ── Validation helpers ────────────────────────────────────────────────────────

fn check_weight(id: BehaviorId, weight: f64) -> NetworkResult<()> {
    if (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(NetworkError::WeightOutOfRange { id, weight })
    }
}

pub(crate) fn check_coefficient(c: f64) -> NetworkResult<()> {
    if (-1.0..=1.0).contains(&c) {
        Ok(())
    } else {
        Err(NetworkError::CoefficientOutOfRange(c))
    }
}
