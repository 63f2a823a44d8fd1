//! Noop sample source.
//!
//! Stands in for a device without an accelerometer: it starts and stops
//! like any other source but never emits a sample, so the step count of a
//! session bound to it stays where it was loaded.

use crate::collector::types::Sample;
use crate::collector::{CollectorError, SampleSource, SAMPLE_CHANNEL_CAPACITY};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A source that never emits samples.
pub struct NoopCollector {
    _sender: Sender<Sample>,
    receiver: Receiver<Sample>,
    running: Arc<AtomicBool>,
}

impl NoopCollector {
    /// Create a new noop collector.
    pub fn new() -> Self {
        let (sender, receiver) = bounded(SAMPLE_CHANNEL_CAPACITY);
        Self {
            _sender: sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for NoopCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for NoopCollector {
    fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        tracing::warn!("No accelerometer source configured; step count will not change");
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn receiver(&self) -> &Receiver<Sample> {
        &self.receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_never_emits() {
        let mut collector = NoopCollector::new();
        collector.start().unwrap();
        assert!(collector.is_running());
        assert!(collector.receiver().try_recv().is_err());
        assert!(matches!(
            collector.start(),
            Err(CollectorError::AlreadyRunning)
        ));
        collector.stop();
        assert!(!collector.is_running());
    }
}
