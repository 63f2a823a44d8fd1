//! Daily step goal and progress arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Step goal used when none is stored or the stored one is non-positive.
pub const DEFAULT_STEP_GOAL: u32 = 10_000;

/// A positive daily step target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal(u32);

impl Goal {
    /// A goal of `steps`, or `None` for zero.
    pub fn new(steps: u32) -> Option<Self> {
        (steps > 0).then_some(Goal(steps))
    }

    /// Normalise a raw stored value: absent, zero or negative become the default.
    pub fn from_raw(raw: Option<i64>) -> Self {
        Self::from_raw_or(raw, Goal::default())
    }

    /// Like [`Goal::from_raw`] with a caller-chosen fallback.
    pub fn from_raw_or(raw: Option<i64>, fallback: Goal) -> Self {
        match raw {
            Some(v) if v > 0 => Goal(u32::try_from(v).unwrap_or(u32::MAX)),
            _ => fallback,
        }
    }

    pub fn steps(self) -> u32 {
        self.0
    }
}

impl Default for Goal {
    fn default() -> Self {
        Goal(DEFAULT_STEP_GOAL)
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} steps", self.0)
    }
}

/// Fraction of the goal reached. Not clamped: 12 000 of 10 000 is 1.2.
pub fn progress_fraction(steps: u64, goal: u32) -> f64 {
    steps as f64 / f64::from(goal.max(1))
}

/// Clamp a progress fraction into `[0, 1]` for display.
pub fn clamp_progress(fraction: f64) -> f64 {
    if fraction.is_nan() {
        return 0.0;
    }
    fraction.clamp(0.0, 1.0)
}
