//! Persistence collaborators for the step agent.
//!
//! The engine never reaches for global storage. A session is handed a
//! [`CountStore`] for the cumulative step count and a [`ProfileStore`] for
//! the per-user profile document (goals, body measurements, weight history).
//! The workout catalog is shared by all users and only read.
//!
//! ```text
//!   StepSession ──▶ PersistWorker ──▶ CountStore (file / memory)
//!        │
//!        └──────────────────────────▶ ProfileStore (file / memory)
//! ```

pub mod file;
pub mod memory;
pub mod worker;

use crate::core::weight::WeightEntry;
use crate::core::workout::Workout;
use serde::{Deserialize, Serialize};

pub use file::{FileCountStore, FileProfileStore, FileWorkoutCatalog};
pub use memory::{MemoryCountStore, MemoryProfileStore, MemoryWorkoutCatalog};
pub use worker::PersistWorker;

/// Storage failures. None of them is fatal to step counting.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored data could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid user id {0:?}: use letters, digits, '-' or '_'")]
    InvalidUserId(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key-value storage for the cumulative step count.
pub trait CountStore: Send {
    /// Stored count, or `None` when nothing has been saved yet.
    fn load_count(&self) -> Result<Option<u64>, StoreError>;

    fn save_count(&mut self, steps: u64) -> Result<(), StoreError>;
}

/// Goal targets kept in a user's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Goals {
    /// Target body weight in kilograms, 0 when unset
    pub goal_weight_kg: f64,
    /// Daily step target as stored; non-positive means unset
    pub daily_steps: i64,
}

/// Last measurements entered for BMI calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    pub weight_kg: f64,
    pub height_cm: f64,
}

/// Everything stored for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub goals: Goals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyMeasurements>,
    #[serde(default)]
    pub weight_history: Vec<WeightEntry>,
}

/// Document storage keyed by user identity.
pub trait ProfileStore {
    fn load_profile(&self, user_id: &str) -> Result<Option<ProfileDocument>, StoreError>;

    fn save_profile(&mut self, user_id: &str, profile: &ProfileDocument)
        -> Result<(), StoreError>;

    /// Raw daily step goal, `None` when the user has no profile.
    fn get_goal(&self, user_id: &str) -> Result<Option<i64>, StoreError> {
        Ok(self
            .load_profile(user_id)?
            .map(|profile| profile.goals.daily_steps))
    }

    /// Load the profile, creating and saving an empty one if absent.
    fn load_or_create(&mut self, user_id: &str) -> Result<ProfileDocument, StoreError> {
        if let Some(profile) = self.load_profile(user_id)? {
            return Ok(profile);
        }
        let profile = ProfileDocument::default();
        self.save_profile(user_id, &profile)?;
        tracing::debug!(user_id, "Created new profile document");
        Ok(profile)
    }
}

/// Read-only list of workouts, in presentation order.
pub trait WorkoutCatalog {
    fn load_workouts(&self) -> Result<Vec<Workout>, StoreError>;
}

/// User ids become file names, so only a safe alphabet is accepted.
pub fn validate_user_id(user_id: &str) -> Result<(), StoreError> {
    let valid = !user_id.is_empty()
        && user_id.len() <= 128
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidUserId(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("user_42-a").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("../etc/passwd").is_err());
        assert!(validate_user_id("a b").is_err());
    }

    #[test]
    fn test_profile_document_defaults_on_missing_fields() {
        let profile: ProfileDocument =
            serde_json::from_str(r#"{"goals":{"goal_weight_kg":0.0,"daily_steps":0}}"#).unwrap();
        assert!(profile.body.is_none());
        assert!(profile.weight_history.is_empty());
    }

    #[test]
    fn test_get_goal_and_load_or_create() {
        let mut store = MemoryProfileStore::new();
        assert_eq!(store.get_goal("alice").unwrap(), None);

        let created = store.load_or_create("alice").unwrap();
        assert_eq!(created, ProfileDocument::default());
        assert_eq!(store.get_goal("alice").unwrap(), Some(0));
    }
}
