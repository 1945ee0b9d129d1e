//! `bn-network` — the behavior-network data model.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                        |
//! |-----------------|-----------------------------------------------------------------|
//! | [`behavior`]    | `Behavior`, `BehaviorSpec`, `TaskQueue`, callable type aliases  |
//! | [`edge`]        | `Edge` — pairwise inhibition coefficients                       |
//! | [`network`]     | `BehaviorNetwork` — edits, weights, coefficients, checkpoints   |
//! | [`dynamic`]     | `DynamicExpression`, `Parameters`, `Resolved`                   |
//! | [`description`] | `NetworkDescription` (serde), `CallableRegistry`                |
//! | [`observer`]    | `NetworkObserver` — behavior added/removed notifications        |
//! | [`callable`]    | panic isolation for user-supplied callables                     |
//! | [`error`]       | `NetworkError`, `DynamicEvaluationError`, `CallableError`       |
//!
//! # Invariants
//!
//! - The edge set is always the complete graph over the behaviors currently
//!   present.  Edges are created with zero coefficients when a behavior is
//!   added and removed together with either endpoint.
//! - Every mutating call validates before it mutates: a rejected call leaves
//!   the network exactly as it was.
//! - A dynamic expression never writes back into static weights or edge
//!   coefficients; it only replaces them for the tick being evaluated.

pub mod behavior;
pub mod callable;
pub mod description;
pub mod dynamic;
pub mod edge;
pub mod error;
pub mod network;
pub mod observer;


pub use behavior::{
    ActionFn, Behavior, BehaviorSpec, ExcitationFn, TaskQueue, action, constant_excitation, excitation,
    fixed_tasks,
};
pub use description::{BehaviorDescription, CallableRegistry, EdgeDescription, NetworkDescription};
pub use dynamic::{DynamicExpression, DynamicFn, ParameterKind, Parameters, Resolved};
pub use edge::Edge;
pub use error::{CallableError, DynamicEvaluationError, NetworkError, NetworkResult};
pub use network::{BehaviorClipboard, BehaviorNetwork, NetworkCheckpoint};
pub use observer::NetworkObserver;
