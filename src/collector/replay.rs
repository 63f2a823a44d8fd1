//! Replay sample source.
//!
//! Reads recorded accelerometer samples (`timestamp_ns,x,y,z` per line) from
//! a file or stdin and delivers them on a background thread. A header line
//! and `#` comments are skipped; malformed lines are logged and skipped.
//! When the input is exhausted the channel disconnects, which ends the
//! consuming session loop.

use crate::collector::types::Sample;
use crate::collector::{CollectorError, SampleSource, SAMPLE_CHANNEL_CAPACITY};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Longest pause inserted between two samples when pacing in real time.
const MAX_PACING_GAP: Duration = Duration::from_secs(1);

/// How long a blocked send waits before re-checking the running flag.
const SEND_RETRY: Duration = Duration::from_millis(100);

/// Configuration for a replay source.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Input path, `-` for stdin
    pub path: PathBuf,
    /// Sleep between samples according to their timestamp deltas
    pub realtime: bool,
}

impl ReplayConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            realtime: false,
        }
    }

    fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }
}

/// A source that replays recorded samples.
pub struct ReplayCollector {
    config: ReplayConfig,
    sender: Option<Sender<Sample>>,
    receiver: Receiver<Sample>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ReplayCollector {
    /// Create a new replay collector. The input is opened on `start`.
    pub fn new(config: ReplayConfig) -> Self {
        let (sender, receiver) = bounded(SAMPLE_CHANNEL_CAPACITY);

        Self {
            config,
            sender: Some(sender),
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    fn open_input(&self) -> Result<Box<dyn BufRead + Send>, CollectorError> {
        if self.config.is_stdin() {
            return Ok(Box::new(BufReader::new(std::io::stdin())));
        }

        let file = File::open(&self.config.path).map_err(|source| CollectorError::Input {
            path: self.config.path.display().to_string(),
            source,
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

impl ReplayCollector {
    /// Start the replay thread over an already opened input.
    fn start_with_input(&mut self, input: Box<dyn BufRead + Send>) -> Result<(), CollectorError> {
        let Some(sender) = self.sender.take() else {
            return Err(CollectorError::AlreadyRunning);
        };
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let realtime = self.config.realtime;
        let source = self.config.path.display().to_string();

        let handle = thread::spawn(move || {
            let delivered = replay_lines(input, &sender, &running, realtime);
            tracing::info!(source = %source, delivered, "Replay finished");
            running.store(false, Ordering::SeqCst);
            // Dropping the sender disconnects the channel.
        });

        self.thread_handle = Some(handle);
        Ok(())
    }
}

impl SampleSource for ReplayCollector {
    fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) || self.thread_handle.is_some() {
            return Err(CollectorError::AlreadyRunning);
        }
        if self.sender.is_none() {
            return Err(CollectorError::AlreadyRunning);
        }

        let input = self.open_input()?;
        self.start_with_input(input)
    }

    /// Never waits on the input. A thread blocked on a quiet pipe or stdin
    /// is detached; it exits at its next line because `running` is cleared.
    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if handle.is_finished() {
                if handle.join().is_err() {
                    tracing::error!("Replay thread panicked");
                }
            } else {
                tracing::debug!("Replay thread still waiting on input; detaching");
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn receiver(&self) -> &Receiver<Sample> {
        &self.receiver
    }
}

impl Drop for ReplayCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Feed every parsable line into the channel. Returns the delivered count.
fn replay_lines(
    input: Box<dyn BufRead + Send>,
    sender: &Sender<Sample>,
    running: &AtomicBool,
    realtime: bool,
) -> u64 {
    let mut delivered = 0u64;
    let mut previous_ts: Option<u64> = None;

    for (index, line) in input.lines().enumerate() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(line = index + 1, "Stopping replay on read error: {e}");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || is_header(trimmed) {
            continue;
        }

        let sample = match Sample::from_csv_line(trimmed) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(line = index + 1, "Skipping malformed sample: {e}");
                continue;
            }
        };

        if realtime {
            if let Some(prev) = previous_ts {
                let gap = Duration::from_nanos(sample.timestamp_ns.saturating_sub(prev));
                thread::sleep(gap.min(MAX_PACING_GAP));
            }
            previous_ts = Some(sample.timestamp_ns);
        }

        if !send_while_running(sender, sample, running) {
            break;
        }
        delivered += 1;
    }

    delivered
}

fn is_header(line: &str) -> bool {
    line.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Send, retrying while the channel is full. False once stopped or disconnected.
fn send_while_running(sender: &Sender<Sample>, mut sample: Sample, running: &AtomicBool) -> bool {
    loop {
        match sender.send_timeout(sample, SEND_RETRY) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(returned)) => {
                if !running.load(Ordering::SeqCst) {
                    return false;
                }
                sample = returned;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}
