//! Activity counters for step tracking sessions.
//!
//! Counts what the agent did (samples seen, steps registered, storage
//! writes) so a user can audit a session. No sample values are kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Activity counters for the current process.
#[derive(Debug)]
pub struct ActivityLog {
    /// Samples fed through the detector
    samples_processed: AtomicU64,
    /// Samples skipped for holding non-finite values
    samples_rejected: AtomicU64,
    /// Steps registered
    steps_detected: AtomicU64,
    /// Step count writes that reached storage
    count_writes: AtomicU64,
    /// Step count writes that failed
    count_write_failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            samples_processed: AtomicU64::new(0),
            samples_rejected: AtomicU64::new(0),
            steps_detected: AtomicU64::new(0),
            count_writes: AtomicU64::new(0),
            count_write_failures: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that accumulates onto the totals stored at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous activity stats: {e}");
        }

        log
    }

    pub fn record_sample(&self) {
        self.samples_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_sample(&self) {
        self.samples_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_step(&self) {
        self.steps_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_count_write(&self) {
        self.count_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_count_write_failure(&self) {
        self.count_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            samples_processed: self.samples_processed.load(Ordering::Relaxed),
            samples_rejected: self.samples_rejected.load(Ordering::Relaxed),
            steps_detected: self.steps_detected.load(Ordering::Relaxed),
            count_writes: self.count_writes.load(Ordering::Relaxed),
            count_write_failures: self.count_write_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Activity Statistics:\n\
             - Samples processed: {}\n\
             - Samples rejected (non-finite): {}\n\
             - Steps detected: {}\n\
             - Step count writes: {} ({} failed)\n\
             - Session duration: {} seconds",
            stats.samples_processed,
            stats.samples_rejected,
            stats.steps_detected,
            stats.count_writes,
            stats.count_write_failures,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                samples_processed: stats.samples_processed,
                samples_rejected: stats.samples_rejected,
                steps_detected: stats.steps_detected,
                count_writes: stats.count_writes,
                count_write_failures: stats.count_write_failures,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.samples_processed
                    .store(persisted.samples_processed, Ordering::Relaxed);
                self.samples_rejected
                    .store(persisted.samples_rejected, Ordering::Relaxed);
                self.steps_detected
                    .store(persisted.steps_detected, Ordering::Relaxed);
                self.count_writes
                    .store(persisted.count_writes, Ordering::Relaxed);
                self.count_write_failures
                    .store(persisted.count_write_failures, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub samples_processed: u64,
    pub samples_rejected: u64,
    pub steps_detected: u64,
    pub count_writes: u64,
    pub count_write_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    samples_processed: u64,
    samples_rejected: u64,
    steps_detected: u64,
    count_writes: u64,
    count_write_failures: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedActivityLog {
    Arc::new(ActivityLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_counting() {
        let log = ActivityLog::new();

        log.record_sample();
        log.record_sample();
        log.record_rejected_sample();
        log.record_step();

        let stats = log.stats();
        assert_eq!(stats.samples_processed, 2);
        assert_eq!(stats.samples_rejected, 1);
        assert_eq!(stats.steps_detected, 1);
    }

    #[test]
    fn test_persisted_totals_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.json");

        let first = ActivityLog::with_persistence(path.clone());
        first.record_step();
        first.record_step();
        first.save().unwrap();

        let second = ActivityLog::with_persistence(path);
        second.record_step();
        assert_eq!(second.stats().steps_detected, 3);
    }

    #[test]
    fn test_summary_format() {
        let summary = ActivityLog::new().summary();
        assert!(summary.contains("Samples processed"));
        assert!(summary.contains("Steps detected"));
    }
}
