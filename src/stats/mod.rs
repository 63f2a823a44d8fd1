//! Activity statistics for the step agent.
//!
//! Tracks what the agent processed and wrote, for auditing and for the
//! end-of-session report.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, ActivityLog, ActivityStats,
    SharedActivityLog,
};
