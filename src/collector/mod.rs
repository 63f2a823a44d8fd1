//! Sample collection module for the step agent.
//!
//! A sample source delivers accelerometer readings over a channel. The
//! engine never talks to a source directly: the session owner registers
//! interest by starting a source and drains its receiver.

pub mod noop;
pub mod replay;
pub mod types;

use crossbeam_channel::Receiver;

// Re-export commonly used types
pub use noop::NoopCollector;
pub use replay::{ReplayCollector, ReplayConfig};
pub use types::{Sample, SampleParseError};

/// Capacity of the sample channel between a source and its consumer.
pub const SAMPLE_CHANNEL_CAPACITY: usize = 10_000;

/// A source of accelerometer samples.
pub trait SampleSource {
    /// Begin delivering samples.
    fn start(&mut self) -> Result<(), CollectorError>;

    /// Stop delivering samples. Samples already queued stay readable.
    fn stop(&mut self);

    /// Check if the source is currently delivering.
    fn is_running(&self) -> bool;

    /// Receiver side of the sample channel.
    fn receiver(&self) -> &Receiver<Sample>;
}

/// Errors that can occur while starting a sample source.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Collector is already running")]
    AlreadyRunning,
    #[error("Could not open sample input {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
