//! Per-agent simulation state.

use std::collections::BTreeMap;

use crate::{Command, Vec2};

/// Everything the engine knows about one agent's physical and scripted state.
///
/// Behaviors read it (through [`SimContext`][crate::SimContext]) to compute
/// their excitation; the mechanism writes it once per tick after arbitration.
/// `vars` holds named scalar state for system-dynamics models (stocks, levels,
/// counters, …) and any application data excitation functions need.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentState {
    /// Current position in world units.
    pub position: Vec2,

    /// Heading of the last applied command, radians.
    pub heading: f64,

    /// Speed of the last applied command, world units per second.
    pub speed: f64,

    /// Named scalar variables.  `BTreeMap` keeps iteration (and therefore
    /// output) order deterministic.
    pub vars: BTreeMap<String, f64>,
}

impl AgentState {
    /// A motionless agent at `position`.
    pub fn at(position: Vec2) -> Self {
        Self { position, ..Self::default() }
    }

    /// Builder-style helper for seeding a named variable.
    pub fn with_var(mut self, name: impl Into<String>, value: f64) -> Self {
        self.vars.insert(name.into(), value);
        self
    }

    /// Value of variable `name`, or `0.0` when unset.
    #[inline]
    pub fn var(&self, name: &str) -> f64 {
        self.vars.get(name).copied().unwrap_or(0.0)
    }

    /// The command the agent is currently executing.
    #[inline]
    pub fn command(&self) -> Command {
        Command::new(self.speed, self.heading)
    }

    /// Execute `cmd` for `secs` seconds: record it as the current command and
    /// advance `position` along it.
    pub fn apply(&mut self, cmd: Command, secs: f64) {
        self.speed = cmd.speed;
        self.heading = cmd.direction;
        self.position += cmd.displacement(secs);
    }
}
