//! Threshold step detection with a refractory window.
//!
//! A step is registered when the linear acceleration magnitude exceeds the
//! threshold and more than the refractory period has elapsed since the last
//! registered step. The refractory period caps the rate at roughly four
//! steps per second and absorbs the bounce of a single footfall.
//!
//! Processing is synchronous and allocation-free; the detector has no
//! failure path. Non-finite samples are skipped entirely so they cannot
//! poison the gravity estimate.

use crate::collector::types::Sample;
use crate::core::filter::{magnitude, FilterState, DEFAULT_ALPHA};
use serde::{Deserialize, Serialize};

/// Default magnitude threshold (same units as the input, m/s²).
pub const DEFAULT_THRESHOLD: f64 = 10.0;

/// Default refractory period: 250 ms.
pub const DEFAULT_REFRACTORY_NS: u64 = 250_000_000;

/// Tunable detector parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Low-pass smoothing factor, in (0, 1)
    pub alpha: f64,
    /// Linear acceleration magnitude a step must exceed
    pub threshold: f64,
    /// Minimum spacing between steps, exclusive, in nanoseconds
    pub refractory_period_ns: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            threshold: DEFAULT_THRESHOLD,
            refractory_period_ns: DEFAULT_REFRACTORY_NS,
        }
    }
}

impl DetectorConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), DetectorConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(DetectorConfigError::Alpha(self.alpha));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(DetectorConfigError::Threshold(self.threshold));
        }
        Ok(())
    }
}

/// Invalid detector parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectorConfigError {
    #[error("alpha must be strictly between 0 and 1, got {0}")]
    Alpha(f64),
    #[error("threshold must be a finite non-negative number, got {0}")]
    Threshold(f64),
}

/// Cumulative count and the time of the last accepted step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCounterState {
    pub steps: u64,
    /// Timestamp of the last step in nanoseconds; 0 means none yet
    pub last_step_ns: u64,
}

impl StepCounterState {
    /// Counter seeded with a persisted count and no step history.
    pub fn with_steps(steps: u64) -> Self {
        Self {
            steps,
            last_step_ns: 0,
        }
    }
}

/// Process one sample against the filter and counter state.
///
/// Returns true when a step was registered by this sample.
pub fn on_sample(
    sample: &Sample,
    filter: &mut FilterState,
    counter: &mut StepCounterState,
    config: &DetectorConfig,
) -> bool {
    if !sample.is_finite() {
        return false;
    }

    let linear = filter.update(config.alpha, sample.axes());
    let magnitude = magnitude(linear);

    // Out-of-order timestamps saturate to zero and cannot trigger a step.
    let since_last = sample.timestamp_ns.saturating_sub(counter.last_step_ns);

    if magnitude > config.threshold && since_last > config.refractory_period_ns {
        counter.steps += 1;
        counter.last_step_ns = sample.timestamp_ns;
        true
    } else {
        false
    }
}

/// Result of feeding one sample to a [`StepDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A step was registered
    Stepped,
    /// The sample was processed and no step occurred
    NoStep,
    /// The sample held a non-finite axis and was ignored
    Rejected,
}

impl StepOutcome {
    pub fn stepped(self) -> bool {
        self == StepOutcome::Stepped
    }
}

/// Owns the filter and counter state for one session.
#[derive(Debug, Clone)]
pub struct StepDetector {
    config: DetectorConfig,
    filter: FilterState,
    counter: StepCounterState,
}

impl StepDetector {
    /// Fresh detector whose count starts at `initial_steps`.
    pub fn new(config: DetectorConfig, initial_steps: u64) -> Self {
        Self {
            config,
            filter: FilterState::new(),
            counter: StepCounterState::with_steps(initial_steps),
        }
    }

    pub fn on_sample(&mut self, sample: &Sample) -> StepOutcome {
        if !sample.is_finite() {
            return StepOutcome::Rejected;
        }
        if on_sample(sample, &mut self.filter, &mut self.counter, &self.config) {
            StepOutcome::Stepped
        } else {
            StepOutcome::NoStep
        }
    }

    pub fn steps(&self) -> u64 {
        self.counter.steps
    }

    pub fn counter(&self) -> &StepCounterState {
        &self.counter
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    fn at_rest(ts: u64) -> Sample {
        Sample::new(ts, 0.0, 0.0, 9.81)
    }

    /// Feed 100 resting samples at 20 ms spacing so the filter settles.
    fn settled_detector() -> (StepDetector, u64) {
        let mut detector = StepDetector::new(DetectorConfig::default(), 0);
        let mut ts = 1_000 * MS;
        for _ in 0..100 {
            assert_eq!(detector.on_sample(&at_rest(ts)), StepOutcome::NoStep);
            ts += 20 * MS;
        }
        (detector, ts)
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DetectorConfig::default();
        assert_eq!(config.alpha, 0.8);
        assert_eq!(config.threshold, 10.0);
        assert_eq!(config.refractory_period_ns, 250_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DetectorConfig::default();
        config.alpha = 1.0;
        assert_eq!(config.validate(), Err(DetectorConfigError::Alpha(1.0)));

        config.alpha = 0.5;
        config.threshold = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(DetectorConfigError::Threshold(_))
        ));
    }

    #[test]
    fn test_single_impulse_counts_once() {
        let (mut detector, mut ts) = settled_detector();

        assert_eq!(
            detector.on_sample(&Sample::new(ts, 0.0, 0.0, 40.0)),
            StepOutcome::Stepped
        );
        ts += 20 * MS;

        for i in 0..50 {
            let jitter = if i % 2 == 0 { 0.3 } else { -0.3 };
            detector.on_sample(&Sample::new(ts, jitter, -jitter, 9.81 + jitter));
            ts += 20 * MS;
        }

        assert_eq!(detector.steps(), 1);
    }

    #[test]
    fn test_refractory_period_suppresses_second_spike() {
        let (mut detector, ts) = settled_detector();

        assert!(detector
            .on_sample(&Sample::new(ts, 0.0, 0.0, 40.0))
            .stepped());
        // Drop back to rest, then spike again 100 ms later.
        detector.on_sample(&at_rest(ts + 50 * MS));
        assert!(!detector
            .on_sample(&Sample::new(ts + 100 * MS, 0.0, 0.0, 60.0))
            .stepped());
        assert_eq!(detector.steps(), 1);
        assert_eq!(detector.counter().last_step_ns, ts);
    }

    #[test]
    fn test_exact_refractory_boundary_is_exclusive() {
        let config = DetectorConfig::default();
        let mut filter = FilterState::new();
        let mut counter = StepCounterState {
            steps: 3,
            last_step_ns: 1_000 * MS,
        };

        let spike = Sample::new(1_000 * MS + DEFAULT_REFRACTORY_NS, 0.0, 0.0, 50.0);
        assert!(!on_sample(&spike, &mut filter, &mut counter, &config));
        assert_eq!(counter.steps, 3);

        let later = Sample::new(1_000 * MS + DEFAULT_REFRACTORY_NS + 1, 0.0, 0.0, 50.0);
        assert!(on_sample(&later, &mut filter, &mut counter, &config));
        assert_eq!(counter.steps, 4);
    }

    #[test]
    fn test_non_finite_sample_is_a_noop() {
        let (mut detector, ts) = settled_detector();
        let before = *detector.filter();

        assert_eq!(
            detector.on_sample(&Sample::new(ts, f64::NAN, 0.0, 9.81)),
            StepOutcome::Rejected
        );
        assert_eq!(
            detector.on_sample(&Sample::new(ts, 0.0, f64::INFINITY, 9.81)),
            StepOutcome::Rejected
        );
        assert_eq!(*detector.filter(), before);
        assert!(detector.filter().is_finite());
        assert_eq!(detector.steps(), 0);
    }

    #[test]
    fn test_resting_device_never_steps() {
        let (detector, _) = settled_detector();
        assert_eq!(detector.steps(), 0);
    }

    #[test]
    fn test_restart_first_sample_can_step() {
        // Persisted count of 42, fresh filter and timing state.
        let mut detector = StepDetector::new(DetectorConfig::default(), 42);
        assert_eq!(detector.counter().last_step_ns, 0);

        // First filter update keeps 80% of the reading as linear acceleration.
        let outcome = detector.on_sample(&Sample::new(5_000 * MS, 0.0, 0.0, 20.0));
        assert_eq!(outcome, StepOutcome::Stepped);
        assert_eq!(detector.steps(), 43);
    }

    #[test]
    fn test_restart_small_first_sample_does_not_step() {
        let mut detector = StepDetector::new(DetectorConfig::default(), 42);
        assert_eq!(
            detector.on_sample(&Sample::new(5_000 * MS, 0.0, 0.0, 9.81)),
            StepOutcome::NoStep
        );
        assert_eq!(detector.steps(), 42);
    }

    #[test]
    fn test_out_of_order_timestamp_cannot_step() {
        let (mut detector, ts) = settled_detector();
        assert!(detector
            .on_sample(&Sample::new(ts, 0.0, 0.0, 40.0))
            .stepped());
        detector.on_sample(&at_rest(ts + 20 * MS));
        assert!(!detector
            .on_sample(&Sample::new(ts - 500 * MS, 0.0, 0.0, 60.0))
            .stepped());
        assert_eq!(detector.steps(), 1);
    }
}
