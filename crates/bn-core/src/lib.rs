//! `bn-core` — foundational types for the `rust_bn` behavior-network engine.
//!
//! This crate is a dependency of every other `bn-*` crate.  It intentionally
//! has no `bn-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`ids`]       | `AgentId`, `BehaviorId`                                 |
//! | [`motion`]    | `Vec2`, `Command` (speed, direction), `Task`            |
//! | [`state`]     | `AgentState` — position, heading, speed, named vars     |
//! | [`context`]   | `SimContext<'a>` — read-only tick snapshot for callables|
//! | [`time`]      | `Tick`, `SimClock`, `SimConfig`                         |
//! | [`rng`]       | `AgentRng` (per-agent deterministic RNG)                |
//! | [`error`]     | `CoreError`, `CoreResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types and     |
//! |         | enables `SimConfig::from_json_reader`.                     |

pub mod context;
pub mod error;
pub mod ids;
pub mod motion;
pub mod rng;
pub mod state;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use context::SimContext;
pub use error::{CoreError, CoreResult};
pub use ids::{AgentId, BehaviorId};
pub use motion::{Command, Task, Vec2};
pub use rng::AgentRng;
pub use state::AgentState;
pub use time::{SimClock, SimConfig, Tick};
