//! JSON file stores.
//!
//! Writes go to a temporary sibling file first and are renamed into place,
//! so a crash mid-write leaves the previous value intact.

use crate::core::workout::Workout;
use crate::store::{
    validate_user_id, CountStore, ProfileDocument, ProfileStore, StoreError, WorkoutCatalog,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the data path that namespaces the step count.
pub const COUNT_NAMESPACE: &str = "step_counter";

/// File holding the step count inside the namespace directory.
pub const COUNT_FILE: &str = "steps.json";

/// Directory under the data path that holds one document per user.
pub const PROFILES_DIR: &str = "profiles";

/// Workout catalog file under the data path: a JSON array of workouts.
pub const WORKOUTS_FILE: &str = "workouts.json";

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCount {
    steps: u64,
    updated_at: DateTime<Utc>,
}

/// Step count kept in `<data>/step_counter/steps.json`.
#[derive(Debug, Clone)]
pub struct FileCountStore {
    path: PathBuf,
}

impl FileCountStore {
    pub fn new(data_path: &Path) -> Self {
        Self {
            path: data_path.join(COUNT_NAMESPACE).join(COUNT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CountStore for FileCountStore {
    fn load_count(&self) -> Result<Option<u64>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let persisted: PersistedCount = serde_json::from_str(&content)?;
        Ok(Some(persisted.steps))
    }

    fn save_count(&mut self, steps: u64) -> Result<(), StoreError> {
        let persisted = PersistedCount {
            steps,
            updated_at: Utc::now(),
        };
        write_json_atomic(&self.path, &persisted)
    }
}

/// Profiles kept as `<data>/profiles/<user_id>.json`.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    dir: PathBuf,
}

impl FileProfileStore {
    pub fn new(data_path: &Path) -> Self {
        Self {
            dir: data_path.join(PROFILES_DIR),
        }
    }

    fn profile_path(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        validate_user_id(user_id)?;
        Ok(self.dir.join(format!("{user_id}.json")))
    }
}

impl ProfileStore for FileProfileStore {
    fn load_profile(&self, user_id: &str) -> Result<Option<ProfileDocument>, StoreError> {
        let path = self.profile_path(user_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save_profile(
        &mut self,
        user_id: &str,
        profile: &ProfileDocument,
    ) -> Result<(), StoreError> {
        let path = self.profile_path(user_id)?;
        write_json_atomic(&path, profile)
    }
}

/// Workout catalog kept in `<data>/workouts.json`.
#[derive(Debug, Clone)]
pub struct FileWorkoutCatalog {
    path: PathBuf,
}

impl FileWorkoutCatalog {
    pub fn new(data_path: &Path) -> Self {
        Self {
            path: data_path.join(WORKOUTS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkoutCatalog for FileWorkoutCatalog {
    /// An absent file is an empty catalog.
    fn load_workouts(&self) -> Result<Vec<Workout>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
