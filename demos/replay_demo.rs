//! Demonstration of the step agent on a synthetic walk.
//!
//! This example shows how to:
//! 1. Wire a session to in-memory stores
//! 2. Feed it samples from a background producer
//! 3. Read the count, goal progress and activity statistics
//!
//! Run with: cargo run --example replay_demo

use std::sync::atomic::AtomicBool;
use std::thread;

use fitness_step_agent::{
    collector::Sample,
    core::{SessionDeps, StepSession},
    logging,
    stats::create_shared_log,
    store::{MemoryCountStore, MemoryProfileStore},
};

/// Sample spacing: 50 Hz.
const PERIOD_NS: u64 = 20_000_000;

/// Synthesize `seconds` of walking at two steps per second.
///
/// The device rests at 1 g on the z axis with a short heel-strike spike
/// every 500 ms.
fn synthetic_walk(seconds: u64) -> Vec<Sample> {
    let samples_per_step = 25;
    (0..seconds * 50)
        .map(|i| {
            let ts = 1_000_000_000 + i * PERIOD_NS;
            let z = if i % samples_per_step == 0 { 35.0 } else { 9.81 };
            let sway = ((i as f64) * 0.3).sin() * 0.4;
            Sample::new(ts, sway, -sway, z)
        })
        .collect()
}

fn main() {
    logging::init_logging("info");

    println!("Fitness Step Agent - Replay Demo");
    println!("================================");
    println!();

    let counts = MemoryCountStore::with_count(120);
    let profiles = MemoryProfileStore::new().with_step_goal("demo", 200);
    let log = create_shared_log();

    let mut session = StepSession::start(
        SessionDeps::new(Box::new(counts.clone()), &profiles, log.clone()).with_user(Some("demo")),
    );
    println!("Starting at {} / {}", session.steps(), session.goal());

    let (sender, receiver) = crossbeam_channel::bounded(1_000);
    let producer = thread::spawn(move || {
        for sample in synthetic_walk(30) {
            if sender.send(sample).is_err() {
                break;
            }
        }
    });

    let running = AtomicBool::new(true);
    session.run(&receiver, &running);
    let _ = producer.join();

    let summary = session.stop();
    println!();
    println!("{summary}");
    println!("Persisted count: {:?}", counts.stored());
    println!();
    println!("{}", log.summary());
}
