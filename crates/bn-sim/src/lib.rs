//! `bn-sim` — tick loop, history, and scheduler for the rust_bn engine.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..max_ticks:
//!   ① Snapshot  — copy every agent's state into one frozen world.
//!   ② Step      — for each agent, its mechanism arbitrates over its
//!                 network against the snapshot (parallel with `parallel`).
//!   ③ Apply     — results are written back in ascending AgentId order;
//!                 failed steps leave the agent unchanged.
//!   ④ Publish   — a Frame is appended to the History.
//! ```
//!
//! The [`Scheduler`] runs that loop on a dedicated compute thread with a
//! `Stopped → Running ⇄ Paused → Stopped` state machine.  Display code reads
//! the [`History`] through a [`Playback`] cursor at its own cadence.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Steps agents on Rayon's thread pool.                      |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use bn_core::SimConfig;
//! use bn_mechanism::Mechanism;
//! use bn_sim::{Agent, Scheduler};
//!
//! let mut forager = Agent::new(AgentId(0), "forager");
//! forager.network = network;
//! forager.bind_mechanism(Mechanism::mutual())?;
//!
//! let mut scheduler: Scheduler = Scheduler::new(config)?;
//! scheduler.run(vec![forager], 500)?;
//! let report = scheduler.wait()?;
//! ```

pub mod agent;
pub mod builder;
pub mod error;
pub mod history;
pub mod observer;
pub mod playback;
pub mod scheduler;
pub mod sim;

#[cfg(test)]
mod tests;

pub use agent::Agent;
pub use builder::{SimBuilder, numbered_agents};
pub use error::{SimError, SimResult};
pub use history::{AgentSnapshot, Frame, History};
pub use observer::{NoopObserver, SimObserver};
pub use playback::Playback;
pub use scheduler::{RunReport, RunState, Scheduler};
pub use sim::Sim;
