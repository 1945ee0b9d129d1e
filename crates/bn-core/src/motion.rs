//! Planar motion primitives.
//!
//! Behaviors drive an agent with primitive `(speed, direction)` commands.
//! `direction` is an absolute heading in radians measured counter-clockwise
//! from the +x axis.  The cooperative mechanism blends commands by treating
//! each one as a 2-D vector, so conversions in both directions live here.

use std::fmt;
use std::ops::{Add, AddAssign, Mul};

// ── Vec2 ─────────────────────────────────────────────────────────────────────

/// A 2-D vector / point in world units.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Distance to `other`.
    #[inline]
    pub fn distance(self, other: Vec2) -> f64 {
        Vec2::new(other.x - self.x, other.y - self.y).length()
    }

    /// Heading of the vector in radians, `atan2(y, x)`.
    #[inline]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// ── Command ──────────────────────────────────────────────────────────────────

/// A primitive motion command: move at `speed` world units per second along
/// heading `direction` (radians).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Command {
    pub speed:     f64,
    pub direction: f64,
}

/// One entry of a behavior's task queue.
pub type Task = Command;

impl Command {
    /// The "stand still" command.
    pub const STOP: Command = Command { speed: 0.0, direction: 0.0 };

    #[inline]
    pub fn new(speed: f64, direction: f64) -> Self {
        Self { speed, direction }
    }

    /// Velocity vector `speed · (cos θ, sin θ)`.
    #[inline]
    pub fn to_vector(self) -> Vec2 {
        let (sin, cos) = self.direction.sin_cos();
        Vec2::new(self.speed * cos, self.speed * sin)
    }

    /// Inverse of [`to_vector`](Self::to_vector).
    ///
    /// The zero vector maps to [`Command::STOP`] (direction 0) rather than to
    /// whatever `atan2(0, 0)` happens to return for signed zeros.
    pub fn from_vector(v: Vec2) -> Self {
        let speed = v.length();
        if speed == 0.0 {
            return Command::STOP;
        }
        Command { speed, direction: v.angle() }
    }

    /// Displacement produced by holding this command for `secs` seconds.
    #[inline]
    pub fn displacement(self, secs: f64) -> Vec2 {
        self.to_vector() * secs
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "speed {:.3} @ {:.3} rad", self.speed, self.direction)
    }
}
