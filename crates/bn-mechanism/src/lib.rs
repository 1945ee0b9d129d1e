//! `bn-mechanism` — per-tick action selection over a behavior network.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                          |
//! |-----------------|-------------------------------------------------------------------|
//! | [`selection`]   | `ActionSelection` trait, `Outcome`, `ActionResult`                |
//! | [`mutual`]      | `MutualInhibition` — winner-take-all after lateral inhibition     |
//! | [`cooperative`] | `Cooperative` — weighted vector-sum of every behavior's command   |
//! | [`system`]      | `SystemDynamics` — user code returns the next state directly      |
//! | [`mechanism`]   | `Mechanism` tagged union, `MechanismKind`, transition rules       |
//! | [`error`]       | `EngineError`, `EngineResult<T>`                                  |
//!
//! # Design notes
//!
//! A mechanism step never touches the agent's state.  It reads the frozen
//! [`SimContext`](bn_core::SimContext), updates the network's task queues and
//! cached excitations, and returns an [`ActionResult`].  The simulation loop
//! applies results after every agent has been stepped, so all agents see the
//! same snapshot.
//!
//! A failing step (`Err`) leaves the agent exactly where it was.  Dynamic
//! override failures are not step failures: the step succeeds with the
//! previous tick's parameters and carries the error in
//! [`Outcome::reported`] on the first tick of a streak.

pub mod cooperative;
pub mod error;
pub mod mechanism;
pub mod mutual;
pub mod selection;
pub mod system;


pub use cooperative::Cooperative;
pub use error::{EngineError, EngineResult};
pub use mechanism::{Mechanism, MechanismKind, check_transition};
pub use mutual::{MutualInhibition, lateral_inhibition, select_winner};
pub use selection::{ActionResult, ActionSelection, Outcome};
pub use system::{SystemDynamics, SystemFn};
