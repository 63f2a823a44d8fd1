//! Core functionality for the step agent.
//!
//! This module contains:
//! - Gravity filtering and threshold step detection
//! - Goal normalisation and progress arithmetic
//! - Session bootstrap and persistence hand-off
//! - BMI and weight history helpers for the profile commands
//! - Workout catalog browsing

pub mod bmi;
pub mod detector;
pub mod filter;
pub mod input;
pub mod progress;
pub mod session;
pub mod weight;
pub mod workout;

// Re-export commonly used types
pub use bmi::{calculate_bmi, BmiCategory, BmiError, BmiReading};
pub use detector::{
    on_sample, DetectorConfig, DetectorConfigError, StepCounterState, StepDetector, StepOutcome,
};
pub use filter::FilterState;
pub use input::{parse_positive_f64, parse_step_goal, InputError};
pub use progress::{clamp_progress, progress_fraction, Goal, DEFAULT_STEP_GOAL};
pub use session::{RunEnd, SessionDeps, SessionSummary, StepSession};
pub use weight::{GoalComparison, WeightEntry};
pub use workout::{load_workouts_or_empty, Advance, Workout, WorkoutBrowser};
