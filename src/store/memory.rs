//! In-memory stores, used by tests and demos.

use crate::core::workout::Workout;
use crate::store::{CountStore, ProfileDocument, ProfileStore, StoreError, WorkoutCatalog};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Count store whose clones share one value.
#[derive(Debug, Clone, Default)]
pub struct MemoryCountStore {
    value: Arc<Mutex<Option<u64>>>,
    saves: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl MemoryCountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(steps: u64) -> Self {
        let store = Self::new();
        *store.lock() = Some(steps);
        store
    }

    /// Make every load and save fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Current stored value.
    pub fn stored(&self) -> Option<u64> {
        *self.lock()
    }

    /// Number of successful saves.
    pub fn save_count_calls(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<u64>> {
        // A poisoned lock still holds a plain integer.
        self.value.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CountStore for MemoryCountStore {
    fn load_count(&self) -> Result<Option<u64>, StoreError> {
        self.check_available()?;
        Ok(self.stored())
    }

    fn save_count(&mut self, steps: u64) -> Result<(), StoreError> {
        self.check_available()?;
        *self.lock() = Some(steps);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Profile store backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    profiles: HashMap<String, ProfileDocument>,
    unavailable: bool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose every call fails, as when the backend is unreachable.
    pub fn unavailable() -> Self {
        Self {
            profiles: HashMap::new(),
            unavailable: true,
        }
    }

    /// Seed a user's daily step goal.
    pub fn with_step_goal(mut self, user_id: &str, daily_steps: i64) -> Self {
        let profile = self.profiles.entry(user_id.to_string()).or_default();
        profile.goals.daily_steps = daily_steps;
        self
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Unavailable("profile backend unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load_profile(&self, user_id: &str) -> Result<Option<ProfileDocument>, StoreError> {
        self.check_available()?;
        Ok(self.profiles.get(user_id).cloned())
    }

    fn save_profile(
        &mut self,
        user_id: &str,
        profile: &ProfileDocument,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        self.profiles.insert(user_id.to_string(), profile.clone());
        Ok(())
    }
}

/// Fixed workout catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkoutCatalog {
    workouts: Vec<Workout>,
    unavailable: bool,
}

impl MemoryWorkoutCatalog {
    pub fn new(workouts: Vec<Workout>) -> Self {
        Self {
            workouts,
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            workouts: Vec::new(),
            unavailable: true,
        }
    }
}

impl WorkoutCatalog for MemoryWorkoutCatalog {
    fn load_workouts(&self) -> Result<Vec<Workout>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("workout catalog unreachable".to_string()));
        }
        Ok(self.workouts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_store_clones_share_state() {
        let store = MemoryCountStore::new();
        let mut handle = store.clone();
        handle.save_count(12).unwrap();

        assert_eq!(store.load_count().unwrap(), Some(12));
        assert_eq!(store.save_count_calls(), 1);
    }

    #[test]
    fn test_failing_count_store() {
        let mut store = MemoryCountStore::with_count(5);
        store.set_failing(true);
        assert!(store.load_count().is_err());
        assert!(store.save_count(6).is_err());
        store.set_failing(false);
        assert_eq!(store.load_count().unwrap(), Some(5));
    }

    #[test]
    fn test_workout_catalog() {
        let catalog = MemoryWorkoutCatalog::new(vec![Workout::new("Lunges", 10, "")]);
        assert_eq!(catalog.load_workouts().unwrap().len(), 1);
        assert!(MemoryWorkoutCatalog::default().load_workouts().unwrap().is_empty());
        assert!(matches!(
            MemoryWorkoutCatalog::unavailable().load_workouts(),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_unavailable_profile_store() {
        let store = MemoryProfileStore::unavailable();
        assert!(matches!(
            store.get_goal("alice"),
            Err(StoreError::Unavailable(_))
        ));
    }
}
