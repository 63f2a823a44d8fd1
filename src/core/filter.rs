//! Gravity estimation by exponential low-pass filtering.
//!
//! Each axis tracks `g = α·g + (1-α)·a`. The slow component is gravity (and
//! device tilt); the residual `a - g` is the linear acceleration used for
//! step detection. No orientation compensation is applied: the filter works
//! on raw device axes.

use serde::{Deserialize, Serialize};

/// Default smoothing factor. Higher values adapt more slowly.
pub const DEFAULT_ALPHA: f64 = 0.8;

/// Running gravity estimate, one component per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub gravity: [f64; 3],
}

impl FilterState {
    /// Zero-initialised estimate, as at the start of every session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one reading into the estimate and return the linear acceleration.
    ///
    /// Callers must only pass finite readings; the estimate stays finite as
    /// long as its inputs are.
    pub fn update(&mut self, alpha: f64, axes: [f64; 3]) -> [f64; 3] {
        let mut linear = [0.0; 3];
        for i in 0..3 {
            self.gravity[i] = alpha * self.gravity[i] + (1.0 - alpha) * axes[i];
            linear[i] = axes[i] - self.gravity[i];
        }
        linear
    }

    pub fn is_finite(&self) -> bool {
        self.gravity.iter().all(|g| g.is_finite())
    }
}

/// Euclidean norm of a 3-vector.
pub fn magnitude(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
