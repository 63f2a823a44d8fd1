//! Property tests for the step detector and progress arithmetic.

use fitness_step_agent::collector::Sample;
use fitness_step_agent::core::detector::DEFAULT_REFRACTORY_NS;
use fitness_step_agent::core::{
    clamp_progress, progress_fraction, DetectorConfig, StepDetector, StepOutcome,
};
use proptest::prelude::*;

const MS: u64 = 1_000_000;

fn axis() -> impl Strategy<Value = f64> {
    -50.0f64..50.0
}

/// Samples with strictly increasing timestamps, 1 ms to 400 ms apart.
fn sample_stream(max_len: usize) -> impl Strategy<Value = Vec<Sample>> {
    proptest::collection::vec((1..=400u64, axis(), axis(), axis()), 1..max_len).prop_map(
        |steps| {
            let mut ts = 1_000 * MS;
            steps
                .into_iter()
                .map(|(dt_ms, x, y, z)| {
                    ts += dt_ms * MS;
                    Sample::new(ts, x, y, z)
                })
                .collect()
        },
    )
}

fn settled_detector(initial_steps: u64) -> (StepDetector, u64) {
    let mut detector = StepDetector::new(DetectorConfig::default(), initial_steps);
    let mut ts = 1_000 * MS;
    for _ in 0..100 {
        detector.on_sample(&Sample::new(ts, 0.0, 0.0, 9.81));
        ts += 20 * MS;
    }
    (detector, ts)
}

proptest! {
    /// The count never decreases and detected steps are more than the
    /// refractory period apart.
    #[test]
    fn steps_are_monotonic_and_spaced(samples in sample_stream(400)) {
        let mut detector = StepDetector::new(DetectorConfig::default(), 0);
        let mut previous_count = 0;
        let mut step_times = Vec::new();

        for sample in &samples {
            let outcome = detector.on_sample(sample);
            prop_assert!(detector.steps() >= previous_count);
            if outcome == StepOutcome::Stepped {
                prop_assert_eq!(detector.steps(), previous_count + 1);
                step_times.push(sample.timestamp_ns);
            } else {
                prop_assert_eq!(detector.steps(), previous_count);
            }
            previous_count = detector.steps();
        }

        for pair in step_times.windows(2) {
            prop_assert!(pair[1] - pair[0] > DEFAULT_REFRACTORY_NS);
        }
    }

    /// A constant reading stops producing steps once the filter converges.
    #[test]
    fn constant_input_converges_to_no_steps(
        x in -40.0f64..40.0,
        y in -40.0f64..40.0,
        z in -40.0f64..40.0,
        dt_ms in 1..=1_000u64,
    ) {
        let mut detector = StepDetector::new(DetectorConfig::default(), 0);
        let mut ts = 1_000 * MS;
        for _ in 0..60 {
            detector.on_sample(&Sample::new(ts, x, y, z));
            ts += dt_ms * MS;
        }

        let settled = detector.steps();
        for _ in 0..200 {
            prop_assert_ne!(
                detector.on_sample(&Sample::new(ts, x, y, z)),
                StepOutcome::Stepped
            );
            ts += dt_ms * MS;
        }
        prop_assert_eq!(detector.steps(), settled);
    }

    /// One sharp impulse followed by low-magnitude noise is one step.
    #[test]
    fn impulse_then_noise_is_one_step(
        spike in 25.0f64..60.0,
        noise in proptest::collection::vec((-0.5f64..0.5, -0.5f64..0.5, -0.5f64..0.5, 5..=500u64), 1..200),
    ) {
        let (mut detector, mut ts) = settled_detector(0);

        prop_assert_eq!(
            detector.on_sample(&Sample::new(ts, 0.0, 0.0, spike)),
            StepOutcome::Stepped
        );

        for (nx, ny, nz, dt_ms) in noise {
            ts += dt_ms * MS;
            detector.on_sample(&Sample::new(ts, nx, ny, 9.81 + nz));
        }

        prop_assert_eq!(detector.steps(), 1);
    }

    /// After a restart the first sample is never locked out.
    #[test]
    fn first_sample_after_restart_can_step(
        persisted in 0..1_000_000u64,
        z in 13.0f64..100.0,
        first_ts_ms in 251..10_000_000u64,
    ) {
        let mut detector = StepDetector::new(DetectorConfig::default(), persisted);
        let outcome = detector.on_sample(&Sample::new(first_ts_ms * MS, 0.0, 0.0, z));

        prop_assert_eq!(outcome, StepOutcome::Stepped);
        prop_assert_eq!(detector.steps(), persisted + 1);
    }

    /// Non-finite samples never change the count or the filter.
    #[test]
    fn non_finite_samples_are_ignored(samples in sample_stream(50), poison in 0..3usize) {
        let mut detector = StepDetector::new(DetectorConfig::default(), 0);
        for sample in &samples {
            let mut bad = *sample;
            match poison {
                0 => bad.x = f64::NAN,
                1 => bad.y = f64::INFINITY,
                _ => bad.z = f64::NEG_INFINITY,
            }
            let before = (*detector.filter(), *detector.counter());
            prop_assert_eq!(detector.on_sample(&bad), StepOutcome::Rejected);
            prop_assert_eq!((*detector.filter(), *detector.counter()), before);

            detector.on_sample(sample);
            prop_assert!(detector.filter().is_finite());
        }
    }

    #[test]
    fn progress_is_proportional_and_clampable(steps in 0..1_000_000u64, goal in 1..100_000u32) {
        let fraction = progress_fraction(steps, goal);
        prop_assert!((fraction * f64::from(goal) - steps as f64).abs() < 1e-6);

        let clamped = clamp_progress(fraction);
        prop_assert!((0.0..=1.0).contains(&clamped));
        if steps >= u64::from(goal) {
            prop_assert_eq!(clamped, 1.0);
        }
    }
}

#[test]
fn progress_examples() {
    assert_eq!(progress_fraction(5_000, 10_000), 0.5);
    let over = progress_fraction(12_000, 10_000);
    assert!((over - 1.2).abs() < 1e-12);
    assert_eq!(clamp_progress(over), 1.0);
}
