//! Persisted network description and the callable registry used to load it.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "behaviors": [
//!     { "id": 0, "name": "flee",   "resumable": false, "weight": 1.0,
//!       "excitation": "threat", "action": "run_away" },
//!     { "id": 1, "name": "forage", "resumable": true,  "weight": 0.5,
//!       "excitation": "hunger", "action": "wander" }
//!   ],
//!   "edges": [
//!     { "from": 0, "to": 1, "ft": 0.8, "tf": 0.0, "visible": true }
//!   ],
//!   "dynamic_expression": null
//! }
//! ```
//!
//! Callables cannot be serialized.  Behaviors instead carry optional keys
//! (`excitation`, `action`) and the network an optional dynamic-expression
//! source string; a [`CallableRegistry`] supplied by the expression subsystem
//! maps those strings back to compiled callables at load time.  Missing keys
//! load as a zero excitation and an empty action.
//!
//! Pairs absent from `edges` load as zero-coefficient edges, so the complete
//! graph invariant holds for any valid description.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};

use bn_core::BehaviorId;
use serde::{Deserialize, Serialize};

use crate::network::check_coefficient;
use crate::{
    ActionFn, Behavior, BehaviorNetwork, BehaviorSpec, DynamicExpression, DynamicFn, Edge,
    ExcitationFn, NetworkError, NetworkResult, constant_excitation, fixed_tasks,
};

// ── Serialized records ────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NetworkDescription {
    #[serde(default)]
    pub behaviors: Vec<BehaviorDescription>,

    #[serde(default)]
    pub edges: Vec<EdgeDescription>,

    #[serde(default)]
    pub dynamic_expression: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BehaviorDescription {
    pub id:   BehaviorId,
    pub name: String,

    #[serde(default)]
    pub resumable: bool,

    #[serde(default = "default_weight")]
    pub weight: f64,

    #[serde(default)]
    pub excitation: Option<String>,

    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EdgeDescription {
    pub from: BehaviorId,
    pub to:   BehaviorId,

    #[serde(default)]
    pub ft: f64,

    #[serde(default)]
    pub tf: f64,

    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_weight() -> f64 {
    1.0
}

fn default_visible() -> bool {
    true
}

impl NetworkDescription {
    pub fn from_json_reader<R: Read>(reader: R) -> NetworkResult<Self> {
        serde_json::from_reader(reader).map_err(|e| NetworkError::Description(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> NetworkResult<Self> {
        serde_json::from_str(s).map_err(|e| NetworkError::Description(e.to_string()))
    }

    pub fn to_json_writer<W: Write>(&self, writer: W) -> NetworkResult<()> {
        serde_json::to_writer_pretty(writer, self).map_err(|e| NetworkError::Description(e.to_string()))
    }

    pub fn to_json_string(&self) -> NetworkResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| NetworkError::Description(e.to_string()))
    }
}

// ── CallableRegistry ──────────────────────────────────────────────────────────

/// Name → compiled callable lookup, filled by the expression subsystem.
#[derive(Clone, Default)]
pub struct CallableRegistry {
    excitations: HashMap<String, ExcitationFn>,
    actions:     HashMap<String, ActionFn>,
    dynamics:    HashMap<String, DynamicFn>,
}

impl CallableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_excitation(&mut self, key: impl Into<String>, f: ExcitationFn) -> &mut Self {
        self.excitations.insert(key.into(), f);
        self
    }

    pub fn register_action(&mut self, key: impl Into<String>, f: ActionFn) -> &mut Self {
        self.actions.insert(key.into(), f);
        self
    }

    /// Register the compiled form of a dynamic-expression source string.
    pub fn register_dynamic(&mut self, source: impl Into<String>, f: DynamicFn) -> &mut Self {
        self.dynamics.insert(source.into(), f);
        self
    }

    fn excitation(&self, key: Option<&str>) -> NetworkResult<ExcitationFn> {
        match key {
            None => Ok(constant_excitation(0.0)),
            Some(k) => self.excitations.get(k).cloned().ok_or_else(|| NetworkError::UnknownCallable {
                kind: "excitation",
                key:  k.to_owned(),
            }),
        }
    }

    fn action(&self, key: Option<&str>) -> NetworkResult<ActionFn> {
        match key {
            None => Ok(fixed_tasks(Vec::new())),
            Some(k) => self.actions.get(k).cloned().ok_or_else(|| NetworkError::UnknownCallable {
                kind: "action",
                key:  k.to_owned(),
            }),
        }
    }

    fn dynamic(&self, source: &str) -> NetworkResult<DynamicExpression> {
        let f = self.dynamics.get(source).cloned().ok_or_else(|| NetworkError::UnknownCallable {
            kind: "dynamic expression",
            key:  source.to_owned(),
        })?;
        Ok(DynamicExpression::from_fn(f).with_source(source))
    }
}

// ── Network <-> description ───────────────────────────────────────────────────

impl BehaviorNetwork {
    /// Build a network from a description, resolving callables via `registry`.
    ///
    /// Everything is validated before the network is assembled: duplicate
    /// ids, out-of-range weights or coefficients, edges naming unknown
    /// behaviors, self-edges, duplicate pairs, and unknown callable keys are
    /// all rejected.
    pub fn from_description(
        desc:     &NetworkDescription,
        registry: &CallableRegistry,
    ) -> NetworkResult<Self> {
        // ── Behaviors ─────────────────────────────────────────────────────
        let mut seen = HashSet::with_capacity(desc.behaviors.len());
        let mut behaviors = Vec::with_capacity(desc.behaviors.len());
        for b in &desc.behaviors {
            if b.id == BehaviorId::INVALID || !seen.insert(b.id) {
                return Err(NetworkError::DuplicateId(b.id));
            }
            if !(0.0..=1.0).contains(&b.weight) {
                return Err(NetworkError::WeightOutOfRange { id: b.id, weight: b.weight });
            }
            let mut spec = BehaviorSpec::new(
                b.name.clone(),
                registry.excitation(b.excitation.as_deref())?,
                registry.action(b.action.as_deref())?,
            )
            .resumable(b.resumable)
            .weight(b.weight);
            spec.excitation_key = b.excitation.clone();
            spec.action_key = b.action.clone();
            behaviors.push(Behavior::from_spec(b.id, spec));
        }

        // ── Edges ─────────────────────────────────────────────────────────
        let mut pairs = HashSet::with_capacity(desc.edges.len());
        for e in &desc.edges {
            if e.from == e.to {
                return Err(NetworkError::SelfEdge(e.from));
            }
            for id in [e.from, e.to] {
                if !seen.contains(&id) {
                    return Err(NetworkError::BehaviorNotFound(id));
                }
            }
            if !pairs.insert(Edge::key(e.from, e.to)) {
                return Err(NetworkError::DuplicateEdge(e.from, e.to));
            }
            check_coefficient(e.ft)?;
            check_coefficient(e.tf)?;
        }

        let dynamic = desc
            .dynamic_expression
            .as_deref()
            .map(|src| registry.dynamic(src))
            .transpose()?;

        // ── Assemble (infallible from here on) ────────────────────────────
        let mut net = BehaviorNetwork::new();
        for b in behaviors {
            net.attach(b);
        }
        for e in &desc.edges {
            if let Some(edge) = net.edge_mut(e.from, e.to) {
                edge.set_from(e.from, e.ft, e.tf);
                edge.visible = e.visible;
            }
        }
        net.set_dynamic_expression(dynamic);
        Ok(net)
    }

    /// Snapshot the persistable parts of the network.
    pub fn to_description(&self) -> NetworkDescription {
        NetworkDescription {
            behaviors: self
                .behaviors()
                .iter()
                .map(|b| BehaviorDescription {
                    id:         b.id,
                    name:       b.name.clone(),
                    resumable:  b.resumable,
                    weight:     b.weight,
                    excitation: b.excitation_key.clone(),
                    action:     b.action_key.clone(),
                })
                .collect(),
            edges: self
                .edges()
                .map(|e| EdgeDescription {
                    from:    e.from,
                    to:      e.to,
                    ft:      e.inhibition_ft,
                    tf:      e.inhibition_tf,
                    visible: e.visible,
                })
                .collect(),
            dynamic_expression: self.dynamic_expression().and_then(|d| d.source.clone()),
        }
    }
}
