//! Weight history tracked against a goal weight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded body weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub weight_kg: f64,
    pub recorded_at: DateTime<Utc>,
}

impl WeightEntry {
    pub fn new(weight_kg: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            weight_kg,
            recorded_at,
        }
    }

    /// Day label in `dd/mm/YYYY` form.
    pub fn date_label(&self) -> String {
        self.recorded_at.format("%d/%m/%Y").to_string()
    }

    pub fn compare_to_goal(&self, goal_weight_kg: f64) -> GoalComparison {
        if self.weight_kg > goal_weight_kg {
            GoalComparison::AboveGoal
        } else {
            GoalComparison::AtOrBelowGoal
        }
    }
}

/// Where an entry sits relative to the goal weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalComparison {
    AboveGoal,
    AtOrBelowGoal,
}

impl GoalComparison {
    pub fn arrow(self) -> &'static str {
        match self {
            GoalComparison::AboveGoal => "↑",
            GoalComparison::AtOrBelowGoal => "↓",
        }
    }
}

/// Entries newest first.
pub fn newest_first(entries: &[WeightEntry]) -> Vec<WeightEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    sorted
}

/// Change between the oldest and newest entry, negative when weight was lost.
pub fn net_change_kg(entries: &[WeightEntry]) -> Option<f64> {
    let oldest = entries.iter().min_by_key(|e| e.recorded_at)?;
    let newest = entries.iter().max_by_key(|e| e.recorded_at)?;
    Some(newest.weight_kg - oldest.weight_kg)
}
