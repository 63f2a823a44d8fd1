//! Step tracking sessions.
//!
//! A session owns one detector, the goal it compares against, and the
//! persistence worker for its count. Collaborators are passed in at start;
//! nothing is looked up globally.
//!
//! Bootstrap order:
//! 1. Seed the count from the count store (0 if absent or unreadable).
//! 2. Seed the goal from the profile store (default if absent, non-positive,
//!    no user, or the store failed).
//! 3. Start the filter and last-step time at zero. The first sample after a
//!    restart is compared against timestamp 0, so it is never locked out.
//!
//! Samples are processed synchronously. Counts are handed to the writer
//! thread only when a step occurs, plus a blocking flush on stop.

use crate::collector::types::Sample;
use crate::core::detector::{DetectorConfig, StepDetector, StepOutcome};
use crate::core::progress::{clamp_progress, progress_fraction, Goal};
use crate::stats::SharedActivityLog;
use crate::store::worker::{PersistWorker, DEFAULT_QUEUE_CAPACITY};
use crate::store::{CountStore, ProfileStore, StoreError};
use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// How often a blocked `run` loop re-checks its stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Collaborators and settings for a new session.
pub struct SessionDeps<'a> {
    pub detector: DetectorConfig,
    pub count_store: Box<dyn CountStore>,
    pub profile_store: &'a dyn ProfileStore,
    pub user_id: Option<&'a str>,
    /// Goal used when the profile store has none
    pub default_goal: Goal,
    pub log: SharedActivityLog,
    pub queue_capacity: usize,
}

impl<'a> SessionDeps<'a> {
    pub fn new(
        count_store: Box<dyn CountStore>,
        profile_store: &'a dyn ProfileStore,
        log: SharedActivityLog,
    ) -> Self {
        Self {
            detector: DetectorConfig::default(),
            count_store,
            profile_store,
            user_id: None,
            default_goal: Goal::default(),
            log,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_user(mut self, user_id: Option<&'a str>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_default_goal(mut self, goal: Goal) -> Self {
        self.default_goal = goal;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// Why [`StepSession::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The stop flag was cleared
    Stopped,
    /// The sample source finished or went away
    SourceDisconnected,
}

/// An active step tracking session.
pub struct StepSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    detector: StepDetector,
    goal: Goal,
    steps_at_start: u64,
    worker: PersistWorker,
    log: SharedActivityLog,
}

impl StepSession {
    pub fn start(deps: SessionDeps<'_>) -> Self {
        let steps_at_start = load_initial_count(deps.count_store.as_ref());
        let goal = load_goal(deps.profile_store, deps.user_id, deps.default_goal);
        let worker = PersistWorker::spawn(deps.count_store, deps.queue_capacity, deps.log.clone());

        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            detector: StepDetector::new(deps.detector, steps_at_start),
            goal,
            steps_at_start,
            worker,
            log: deps.log,
        };

        tracing::info!(
            session_id = %session.id,
            steps = steps_at_start,
            goal = goal.steps(),
            "Step session started"
        );
        session
    }

    /// Feed one sample. Never blocks on storage.
    pub fn on_sample(&mut self, sample: &Sample) -> StepOutcome {
        let outcome = self.detector.on_sample(sample);
        match outcome {
            StepOutcome::Rejected => {
                self.log.record_rejected_sample();
                tracing::trace!(timestamp_ns = sample.timestamp_ns, "Skipped non-finite sample");
            }
            StepOutcome::NoStep => self.log.record_sample(),
            StepOutcome::Stepped => {
                self.log.record_sample();
                self.log.record_step();
                let steps = self.detector.steps();
                tracing::trace!(steps, timestamp_ns = sample.timestamp_ns, "Step detected");
                self.worker.request_save(steps);
            }
        }
        outcome
    }

    /// Drain `receiver` until the source disconnects or `running` clears.
    pub fn run(&mut self, receiver: &Receiver<Sample>, running: &AtomicBool) -> RunEnd {
        while running.load(Ordering::SeqCst) {
            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(sample) => {
                    self.on_sample(&sample);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return RunEnd::SourceDisconnected,
            }
        }
        RunEnd::Stopped
    }

    /// Block until the current count has been written.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.worker.flush(self.detector.steps())
    }

    /// Stop accepting samples, persist the final count and report.
    pub fn stop(mut self) -> SessionSummary {
        if let Err(e) = self.flush() {
            tracing::warn!("Final step count was not persisted: {e}");
        }
        self.worker.shutdown();

        let summary = self.summary();
        tracing::info!(
            session_id = %summary.session_id,
            steps = summary.steps_total,
            session_steps = summary.steps_this_session,
            "Step session stopped"
        );
        summary
    }

    pub fn summary(&self) -> SessionSummary {
        let steps = self.detector.steps();
        SessionSummary {
            session_id: self.id,
            started_at: self.started_at,
            ended_at: Utc::now(),
            steps_at_start: self.steps_at_start,
            steps_total: steps,
            steps_this_session: steps.saturating_sub(self.steps_at_start),
            goal: self.goal.steps(),
            progress: self.progress(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn steps(&self) -> u64 {
        self.detector.steps()
    }

    pub fn goal(&self) -> Goal {
        self.goal
    }

    /// Unclamped fraction of the goal reached.
    pub fn progress(&self) -> f64 {
        progress_fraction(self.detector.steps(), self.goal.steps())
    }

    pub fn detector(&self) -> &StepDetector {
        &self.detector
    }
}

/// Read the persisted count, falling back to 0.
pub fn load_initial_count(store: &dyn CountStore) -> u64 {
    match store.load_count() {
        Ok(Some(steps)) => steps,
        Ok(None) => 0,
        Err(e) => {
            tracing::warn!("Could not load step count, starting from 0: {e}");
            0
        }
    }
}

/// Read the user's goal, falling back to `fallback`.
pub fn load_goal(store: &dyn ProfileStore, user_id: Option<&str>, fallback: Goal) -> Goal {
    let Some(user_id) = user_id else {
        tracing::debug!("No user configured; using default step goal");
        return fallback;
    };

    match store.get_goal(user_id) {
        Ok(raw) => Goal::from_raw_or(raw, fallback),
        Err(e) => {
            tracing::warn!(user_id, "Could not fetch step goal, using default: {e}");
            fallback
        }
    }
}

/// End-of-session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub steps_at_start: u64,
    pub steps_total: u64,
    pub steps_this_session: u64,
    pub goal: u32,
    /// Unclamped fraction of the goal
    pub progress: f64,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session {}", self.session_id)?;
        writeln!(f, "  Steps this session: {}", self.steps_this_session)?;
        writeln!(f, "  Step count: {} / {} steps", self.steps_total, self.goal)?;
        write!(
            f,
            "  Progress: {:.1}%",
            clamp_progress(self.progress) * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::create_shared_log;
    use crate::store::{MemoryCountStore, MemoryProfileStore};

    const MS: u64 = 1_000_000;

    #[test]
    fn test_bootstrap_from_stores() {
        let counts = MemoryCountStore::with_count(42);
        let profiles = MemoryProfileStore::new().with_step_goal("alice", 8_000);

        let session = StepSession::start(
            SessionDeps::new(Box::new(counts), &profiles, create_shared_log())
                .with_user(Some("alice")),
        );

        assert_eq!(session.steps(), 42);
        assert_eq!(session.goal().steps(), 8_000);
        assert_eq!(session.detector().counter().last_step_ns, 0);
        assert_eq!(session.detector().filter().gravity, [0.0; 3]);
    }

    #[test]
    fn test_goal_fallbacks() {
        let profiles = MemoryProfileStore::new().with_step_goal("zero", 0);
        let fallback = Goal::default();
        assert_eq!(load_goal(&profiles, None, fallback).steps(), 10_000);
        assert_eq!(load_goal(&profiles, Some("nobody"), fallback).steps(), 10_000);
        assert_eq!(load_goal(&profiles, Some("zero"), fallback).steps(), 10_000);
        assert_eq!(
            load_goal(&MemoryProfileStore::unavailable(), Some("alice"), fallback).steps(),
            10_000
        );

        let custom = Goal::new(6_500).unwrap();
        assert_eq!(load_goal(&profiles, Some("zero"), custom).steps(), 6_500);
    }

    #[test]
    fn test_unreadable_count_starts_at_zero() {
        let counts = MemoryCountStore::with_count(7);
        counts.set_failing(true);
        assert_eq!(load_initial_count(&counts), 0);
    }

    #[test]
    fn test_persists_only_on_steps() {
        let counts = MemoryCountStore::new();
        let profiles = MemoryProfileStore::new();
        let log = create_shared_log();
        let mut session = StepSession::start(SessionDeps::new(
            Box::new(counts.clone()),
            &profiles,
            log.clone(),
        ));

        let mut ts = 1_000 * MS;
        for _ in 0..50 {
            session.on_sample(&Sample::new(ts, 0.0, 0.0, 9.81));
            ts += 20 * MS;
        }
        session.flush().unwrap();
        // The flush writes once; resting samples wrote nothing.
        assert_eq!(counts.save_count_calls(), 1);

        assert!(session
            .on_sample(&Sample::new(ts, 0.0, 0.0, 40.0))
            .stepped());
        let summary = session.stop();

        assert_eq!(summary.steps_total, 1);
        assert_eq!(summary.steps_this_session, 1);
        assert_eq!(counts.stored(), Some(1));
        assert_eq!(log.stats().samples_processed, 51);
        assert_eq!(log.stats().steps_detected, 1);
    }

    #[test]
    fn test_storage_failure_does_not_stop_counting() {
        let counts = MemoryCountStore::new();
        counts.set_failing(true);
        let profiles = MemoryProfileStore::new();
        let mut session = StepSession::start(SessionDeps::new(
            Box::new(counts.clone()),
            &profiles,
            create_shared_log(),
        ));

        assert!(session
            .on_sample(&Sample::new(1_000 * MS, 0.0, 0.0, 40.0))
            .stepped());
        assert!(session.flush().is_err());

        let summary = session.stop();
        assert_eq!(summary.steps_total, 1);
        assert_eq!(counts.stored(), None);
    }

    #[test]
    fn test_run_ends_on_disconnect() {
        let profiles = MemoryProfileStore::new();
        let mut session = StepSession::start(SessionDeps::new(
            Box::new(MemoryCountStore::new()),
            &profiles,
            create_shared_log(),
        ));

        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(Sample::new(1_000 * MS, 0.0, 0.0, 40.0)).unwrap();
        tx.send(Sample::new(1_100 * MS, 0.0, 0.0, 9.81)).unwrap();
        drop(tx);

        let running = AtomicBool::new(true);
        assert_eq!(session.run(&rx, &running), RunEnd::SourceDisconnected);
        assert_eq!(session.steps(), 1);
    }

    #[test]
    fn test_run_honours_stop_flag() {
        let profiles = MemoryProfileStore::new();
        let mut session = StepSession::start(SessionDeps::new(
            Box::new(MemoryCountStore::new()),
            &profiles,
            create_shared_log(),
        ));
        let (_tx, rx) = crossbeam_channel::unbounded::<Sample>();
        let running = AtomicBool::new(false);
        assert_eq!(session.run(&rx, &running), RunEnd::Stopped);
    }

    #[test]
    fn test_summary_display() {
        let profiles = MemoryProfileStore::new().with_step_goal("alice", 8_000);
        let session = StepSession::start(
            SessionDeps::new(
                Box::new(MemoryCountStore::with_count(4_000)),
                &profiles,
                create_shared_log(),
            )
            .with_user(Some("alice")),
        );
        assert_eq!(session.progress(), 0.5);
        let text = session.stop().to_string();
        assert!(text.contains("4000 / 8000 steps"));
        assert!(text.contains("50.0%"));
    }
}
