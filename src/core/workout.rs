//! Workout catalog entries and in-order browsing.
//!
//! Catalog documents are loosely typed: a missing or mistyped `name` or
//! `url` reads as an empty string and a missing or non-numeric `reps` as 0.

use crate::store::WorkoutCatalog;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// One exercise in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workout {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_reps")]
    pub reps: u32,
    /// Demonstration image or animation
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

impl Workout {
    pub fn new(name: impl Into<String>, reps: u32, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reps,
            url: url.into(),
        }
    }
}

impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - Reps: {}", self.name, self.reps)
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

// Fractions truncate; negative and non-numeric values read as 0.
fn lenient_reps<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().map(|reps| reps as u32).unwrap_or(0))
}

/// Load the catalog; an unreadable catalog is shown as an empty one.
pub fn load_workouts_or_empty(catalog: &dyn WorkoutCatalog) -> Vec<Workout> {
    match catalog.load_workouts() {
        Ok(workouts) => workouts,
        Err(e) => {
            tracing::error!("Could not load workouts: {e}");
            Vec::new()
        }
    }
}

/// Result of moving forward in a [`WorkoutBrowser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the next workout
    Moved,
    /// The last workout was done
    Finished,
}

/// Steps through a non-empty catalog one workout at a time.
#[derive(Debug, Clone)]
pub struct WorkoutBrowser {
    workouts: Vec<Workout>,
    index: usize,
}

impl WorkoutBrowser {
    /// Browser positioned on the first workout, or `None` for an empty catalog.
    pub fn new(workouts: Vec<Workout>) -> Option<Self> {
        if workouts.is_empty() {
            return None;
        }
        Some(Self { workouts, index: 0 })
    }

    pub fn current(&self) -> &Workout {
        &self.workouts[self.index]
    }

    /// 1-based position and catalog size.
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.workouts.len())
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.workouts.len()
    }

    /// Step back; false when already on the first workout.
    pub fn previous(&mut self) -> bool {
        if self.has_previous() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self) -> Advance {
        if self.is_last() {
            Advance::Finished
        } else {
            self.index += 1;
            Advance::Moved
        }
    }

    /// Label for the forward action at the current position.
    pub fn advance_label(&self) -> &'static str {
        if self.is_last() {
            "Finish"
        } else {
            "Next"
        }
    }
}
