//! Plain data row types written by output backends.

use bn_core::Tick;
use bn_sim::{AgentSnapshot, Frame};

/// One agent's state in one published frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentFrameRow {
    pub agent_id: u32,
    pub tick:     u64,
    pub x:        f64,
    pub y:        f64,
    pub heading:  f64,
    pub speed:    f64,
    /// Winning behavior id of the step that produced this frame.
    pub winner:   Option<u32>,
    /// Whether that step failed.
    pub failed:   bool,
}

impl AgentFrameRow {
    pub fn from_snapshot(tick: Tick, snap: &AgentSnapshot) -> Self {
        Self {
            agent_id: snap.agent.0,
            tick:     tick.0,
            x:        snap.state.position.x,
            y:        snap.state.position.y,
            heading:  snap.state.heading,
            speed:    snap.state.speed,
            winner:   snap.winner.map(|w| w.0),
            failed:   snap.error.is_some(),
        }
    }

    /// Every agent row of `frame`, in agent order.
    pub fn from_frame(frame: &Frame) -> Vec<Self> {
        frame.agents.iter().map(|s| Self::from_snapshot(frame.tick, s)).collect()
    }
}

/// Summary statistics for one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub tick:            u64,
    pub elapsed_secs:    f64,
    pub acted_agents:    u64,
    pub dynamics_errors: u64,
}
