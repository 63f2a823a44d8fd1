//! Background writer for the step count.
//!
//! The sample path hands counts to this worker and returns immediately.
//! Queued saves are coalesced: only the newest count is written once the
//! queue drains. A failed write keeps the count pending, so the next flush
//! retries it.

use crate::stats::SharedActivityLog;
use crate::store::{CountStore, StoreError};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};

/// Default capacity of the save queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

enum PersistCommand {
    Save(u64),
    Flush(Sender<Result<(), String>>),
    Shutdown,
}

/// Owns a [`CountStore`] on a dedicated thread.
pub struct PersistWorker {
    sender: Sender<PersistCommand>,
    handle: Option<JoinHandle<()>>,
}

impl PersistWorker {
    /// Move `store` onto a writer thread.
    pub fn spawn(
        store: Box<dyn CountStore>,
        queue_capacity: usize,
        log: SharedActivityLog,
    ) -> Self {
        let (sender, receiver) = bounded(queue_capacity.max(1));

        let handle = thread::Builder::new()
            .name("step-persist".to_string())
            .spawn(move || run_writer(store, receiver, log))
            .ok();

        if handle.is_none() {
            tracing::error!("Could not spawn persistence thread; step count will not be saved");
        }

        Self { sender, handle }
    }

    /// Queue a save without blocking.
    ///
    /// Returns false when the request was dropped because the queue is full
    /// or the writer is gone. A dropped save is superseded by the next save
    /// or flush, since only the newest count matters.
    pub fn request_save(&self, steps: u64) -> bool {
        match self.sender.try_send(PersistCommand::Save(steps)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(steps, "Persistence queue full; save deferred");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Save `steps` and wait until the write has completed or failed.
    pub fn flush(&self, steps: u64) -> Result<(), StoreError> {
        let (ack_tx, ack_rx) = bounded(1);
        self.sender
            .send(PersistCommand::Save(steps))
            .and_then(|_| self.sender.send(PersistCommand::Flush(ack_tx)))
            .map_err(|_| StoreError::Unavailable("persistence worker stopped".to_string()))?;

        match ack_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(StoreError::Unavailable(message)),
            Err(_) => Err(StoreError::Unavailable(
                "persistence worker stopped".to_string(),
            )),
        }
    }

    /// Write anything pending and stop the writer thread.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.sender.send(PersistCommand::Shutdown);
            if handle.join().is_err() {
                tracing::error!("Persistence thread panicked");
            }
        }
    }
}

impl Drop for PersistWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_writer(
    mut store: Box<dyn CountStore>,
    receiver: Receiver<PersistCommand>,
    log: SharedActivityLog,
) {
    let mut pending: Option<u64> = None;

    loop {
        match receiver.recv() {
            Ok(PersistCommand::Save(steps)) => {
                pending = Some(steps);
                if receiver.is_empty() {
                    let _ = write_pending(store.as_mut(), &mut pending, &log);
                }
            }
            Ok(PersistCommand::Flush(ack)) => {
                let result = write_pending(store.as_mut(), &mut pending, &log);
                let _ = ack.send(result);
            }
            Ok(PersistCommand::Shutdown) | Err(_) => {
                let _ = write_pending(store.as_mut(), &mut pending, &log);
                break;
            }
        }
    }
}

fn write_pending(
    store: &mut dyn CountStore,
    pending: &mut Option<u64>,
    log: &SharedActivityLog,
) -> Result<(), String> {
    let Some(steps) = pending.take() else {
        return Ok(());
    };

    match store.save_count(steps) {
        Ok(()) => {
            log.record_count_write();
            Ok(())
        }
        Err(e) => {
            tracing::warn!(steps, "Failed to persist step count: {e}");
            log.record_count_write_failure();
            *pending = Some(steps);
            Err(e.to_string())
        }
    }
}
