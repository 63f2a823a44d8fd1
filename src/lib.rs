//! Fitness Step Agent - accelerometer step counting with daily goals.
//!
//! This library turns a stream of 3-axis accelerometer samples into a
//! cumulative step count, persists it, and tracks it against a daily step
//! goal held in a per-user profile. The profile also carries goal weight,
//! BMI measurements and a weight history. A shared workout catalog can be
//! listed or stepped through.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Fitness Step Agent                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Collector  │──▶│   Gravity   │──▶│  Threshold  │         │
//! │  │  (replay)   │   │   filter    │   │  detector   │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                                             │ on step        │
//! │                                             ▼                │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Activity   │   │  Profile    │   │  Persist    │         │
//! │  │    log      │   │  store      │   │  worker     │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use fitness_step_agent::collector::Sample;
//! use fitness_step_agent::core::{SessionDeps, StepSession};
//! use fitness_step_agent::stats::create_shared_log;
//! use fitness_step_agent::store::{MemoryCountStore, MemoryProfileStore};
//!
//! let profiles = MemoryProfileStore::new().with_step_goal("alice", 8_000);
//! let deps = SessionDeps::new(
//!     Box::new(MemoryCountStore::with_count(42)),
//!     &profiles,
//!     create_shared_log(),
//! )
//! .with_user(Some("alice"));
//!
//! let mut session = StepSession::start(deps);
//! session.on_sample(&Sample::new(1_000_000_000, 0.0, 0.0, 25.0));
//! println!("{}", session.stop());
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod logging;
pub mod stats;
pub mod store;

// Re-export key types at crate root for convenience
pub use collector::{CollectorError, NoopCollector, ReplayCollector, Sample, SampleSource};
pub use config::{Config, ConfigError};
pub use crate::core::{
    progress_fraction, DetectorConfig, Goal, SessionDeps, SessionSummary, StepDetector,
    StepOutcome, StepSession,
};
pub use stats::{ActivityLog, SharedActivityLog};
pub use store::{CountStore, ProfileDocument, ProfileStore, StoreError, WorkoutCatalog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
