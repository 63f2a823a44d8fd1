//! Fitness Step Agent CLI
//!
//! Counts steps from accelerometer samples and tracks daily goals.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fitness_step_agent::{
    collector::{NoopCollector, ReplayCollector, ReplayConfig, SampleSource},
    config::Config,
    core::{
        clamp_progress, parse_positive_f64, parse_step_goal, progress_fraction,
        session::{load_goal, load_initial_count},
        weight::{net_change_kg, newest_first},
        load_workouts_or_empty, Advance, BmiReading, Goal, RunEnd, SessionDeps, StepSession,
        WeightEntry, Workout, WorkoutBrowser,
    },
    logging,
    stats::create_shared_log_with_persistence,
    store::{
        BodyMeasurements, CountStore, FileCountStore, FileProfileStore, FileWorkoutCatalog,
        ProfileStore,
    },
    VERSION,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fitstep")]
#[command(version = VERSION)]
#[command(about = "Accelerometer step counter with daily goals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start counting steps
    Start {
        /// Replay samples from a `timestamp_ns,x,y,z` file (`-` for stdin)
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Pace the replay by sample timestamps
        #[arg(long)]
        realtime: bool,

        /// User whose goal to track (defaults to the configured user)
        #[arg(long)]
        user: Option<String>,
    },

    /// Show step count and goal progress
    Status {
        #[arg(long)]
        user: Option<String>,
    },

    /// Reset the step count to zero
    Reset,

    /// Show or change goals
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// Calculate BMI
    Bmi {
        /// Weight in kilograms
        #[arg(long)]
        weight: Option<String>,

        /// Height in centimetres
        #[arg(long)]
        height: Option<String>,

        /// Save the measurements to this user's profile
        #[arg(long)]
        user: Option<String>,
    },

    /// Record or list body weight
    Weight {
        #[command(subcommand)]
        action: WeightAction,
    },

    /// List the workout catalog in order
    Workouts {
        /// Step through the workouts one at a time
        #[arg(long)]
        browse: bool,
    },

    /// Show configuration
    Config {
        /// Write the current settings to the config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
enum GoalAction {
    /// Show current goals
    Show {
        #[arg(long)]
        user: Option<String>,
    },
    /// Set goals
    Set {
        /// Daily step goal
        #[arg(long)]
        steps: Option<String>,

        /// Goal weight in kilograms
        #[arg(long)]
        weight: Option<String>,

        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
enum WeightAction {
    /// Add a weight entry (kilograms)
    Add {
        kg: String,

        #[arg(long)]
        user: Option<String>,
    },
    /// List weight entries, newest first
    List {
        #[arg(long)]
        user: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    logging::init_logging(&config.log_level);
    if let Some(e) = config_error {
        tracing::warn!("Could not load configuration, using defaults: {e}");
    }

    let result = match cli.command {
        Commands::Start {
            replay,
            realtime,
            user,
        } => cmd_start(&config, replay, realtime, user),
        Commands::Status { user } => cmd_status(&config, user),
        Commands::Reset => cmd_reset(&config),
        Commands::Goal { action } => match action {
            GoalAction::Show { user } => cmd_goal_show(&config, user),
            GoalAction::Set {
                steps,
                weight,
                user,
            } => cmd_goal_set(&config, user, steps, weight),
        },
        Commands::Bmi {
            weight,
            height,
            user,
        } => cmd_bmi(&config, weight, height, user),
        Commands::Weight { action } => match action {
            WeightAction::Add { kg, user } => cmd_weight_add(&config, user, &kg),
            WeightAction::List { user } => cmd_weight_list(&config, user),
        },
        Commands::Workouts { browse } => cmd_workouts(&config, browse),
        Commands::Config { init } => cmd_config(&config, init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_start(
    config: &Config,
    replay: Option<PathBuf>,
    realtime: bool,
    user: Option<String>,
) -> Result<()> {
    println!("Fitness Step Agent v{VERSION}");
    println!();

    if let Err(e) = config.ensure_directories() {
        tracing::warn!("Could not create data directory: {e}");
    }

    let user = resolve_user(user, config);
    let activity_log = create_shared_log_with_persistence(config.activity_path());
    let profiles = FileProfileStore::new(&config.data_path);
    let default_goal = Goal::new(config.default_step_goal).unwrap_or_default();

    let mut source: Box<dyn SampleSource> = match replay {
        Some(path) => {
            println!("  Source: replay of {}", path.display());
            Box::new(ReplayCollector::new(ReplayConfig { path, realtime }))
        }
        None => {
            println!("  Source: none (no accelerometer attached)");
            Box::new(NoopCollector::new())
        }
    };
    source.start().context("Could not start sample source")?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Could not install Ctrl+C handler")?;

    let deps = SessionDeps::new(
        Box::new(FileCountStore::new(&config.data_path)),
        &profiles,
        activity_log.clone(),
    )
    .with_user(user.as_deref())
    .with_detector(config.detector)
    .with_default_goal(default_goal)
    .with_queue_capacity(config.persist_queue_capacity);

    let mut session = StepSession::start(deps);
    println!("  Session: {}", session.id());
    println!("  Starting count: {} / {}", session.steps(), session.goal());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let receiver = source.receiver().clone();
    match session.run(&receiver, &running) {
        RunEnd::Stopped => println!("Stopping..."),
        RunEnd::SourceDisconnected => println!("Sample source finished."),
    }
    source.stop();

    let summary = session.stop();
    if let Err(e) = activity_log.save() {
        tracing::warn!("Could not save activity stats: {e}");
    }

    println!();
    println!("{summary}");
    println!();
    println!("{}", activity_log.summary());
    Ok(())
}

fn cmd_status(config: &Config, user: Option<String>) -> Result<()> {
    let user = resolve_user(user, config);
    let steps = load_initial_count(&FileCountStore::new(&config.data_path));
    let profiles = FileProfileStore::new(&config.data_path);
    let default_goal = Goal::new(config.default_step_goal).unwrap_or_default();
    let goal = load_goal(&profiles, user.as_deref(), default_goal);
    let progress = progress_fraction(steps, goal.steps());

    println!("Fitness Step Agent Status");
    println!("=========================");
    println!();
    println!("User: {}", user.as_deref().unwrap_or("(none)"));
    println!("Step Count: {steps}");
    println!("Goal: {steps} / {} steps", goal.steps());
    println!("Progress: {:.1}%", clamp_progress(progress) * 100.0);
    println!();

    let stats_path = config.activity_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(samples) = stats.get("samples_processed") {
                    println!("  Samples processed: {samples}");
                }
                if let Some(steps) = stats.get("steps_detected") {
                    println!("  Steps detected: {steps}");
                }
                if let Some(failures) = stats.get("count_write_failures") {
                    println!("  Failed count writes: {failures}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
    Ok(())
}

fn cmd_reset(config: &Config) -> Result<()> {
    let mut store = FileCountStore::new(&config.data_path);
    store
        .save_count(0)
        .context("Could not reset step count")?;
    println!("Step count reset to 0.");
    Ok(())
}

fn cmd_goal_show(config: &Config, user: Option<String>) -> Result<()> {
    let user = require_user(user, config)?;
    let mut profiles = FileProfileStore::new(&config.data_path);
    let profile = profiles
        .load_or_create(&user)
        .context("Could not load profile")?;
    let default_goal = Goal::new(config.default_step_goal).unwrap_or_default();
    let steps_goal = Goal::from_raw_or(Some(profile.goals.daily_steps), default_goal);

    println!("Goals for {user}");
    println!("  Daily steps: {}", steps_goal.steps());
    if profile.goals.goal_weight_kg > 0.0 {
        println!("  Goal weight: {} kg", profile.goals.goal_weight_kg);
    } else {
        println!("  Goal weight: not set");
    }
    Ok(())
}

fn cmd_goal_set(
    config: &Config,
    user: Option<String>,
    steps: Option<String>,
    weight: Option<String>,
) -> Result<()> {
    if steps.is_none() && weight.is_none() {
        bail!("Nothing to set: pass --steps and/or --weight");
    }

    let user = require_user(user, config)?;
    let daily_steps = steps.as_deref().map(parse_step_goal).transpose()?;
    let goal_weight = weight
        .as_deref()
        .map(|w| parse_positive_f64("goal weight", w))
        .transpose()?;

    let mut profiles = FileProfileStore::new(&config.data_path);
    let mut profile = profiles
        .load_or_create(&user)
        .context("Could not load profile")?;

    if let Some(daily_steps) = daily_steps {
        profile.goals.daily_steps = i64::from(daily_steps);
        println!("Daily steps goal set to {daily_steps}");
    }
    if let Some(goal_weight) = goal_weight {
        profile.goals.goal_weight_kg = goal_weight;
        println!("Goal weight set to {goal_weight} kg");
    }

    profiles
        .save_profile(&user, &profile)
        .context("Could not save goals")?;
    tracing::debug!(user = %user, "Goals updated");
    Ok(())
}

fn cmd_bmi(
    config: &Config,
    weight: Option<String>,
    height: Option<String>,
    user: Option<String>,
) -> Result<()> {
    let user = resolve_user(user, config);
    let mut profiles = FileProfileStore::new(&config.data_path);

    let measurements = match (weight, height) {
        (Some(weight), Some(height)) => BodyMeasurements {
            weight_kg: parse_positive_f64("weight", &weight)?,
            height_cm: parse_positive_f64("height", &height)?,
        },
        (None, None) => {
            let Some(user) = user.as_deref() else {
                bail!("Pass --weight and --height, or configure a user with stored measurements");
            };
            match profiles.load_profile(user)?.and_then(|p| p.body) {
                Some(body) => body,
                None => bail!("No stored measurements for {user}; pass --weight and --height"),
            }
        }
        _ => bail!("--weight and --height must be given together"),
    };

    let reading = BmiReading::compute(measurements.weight_kg, measurements.height_cm)?;
    println!("Your BMI is: {reading}");

    if let Some(user) = user.as_deref() {
        let mut profile = profiles
            .load_or_create(user)
            .context("Could not load profile")?;
        if profile.body != Some(measurements) {
            profile.body = Some(measurements);
            profiles
                .save_profile(user, &profile)
                .context("Could not save measurements")?;
        }
    }
    Ok(())
}

fn cmd_weight_add(config: &Config, user: Option<String>, kg: &str) -> Result<()> {
    let user = require_user(user, config)?;
    let weight_kg = parse_positive_f64("weight", kg)?;

    let mut profiles = FileProfileStore::new(&config.data_path);
    let mut profile = profiles
        .load_or_create(&user)
        .context("Could not load profile")?;
    let entry = WeightEntry::new(weight_kg, chrono::Utc::now());
    println!("Added {} - {} kg", entry.date_label(), entry.weight_kg);
    profile.weight_history.push(entry);

    profiles
        .save_profile(&user, &profile)
        .context("Could not save weight entry")?;
    Ok(())
}

fn cmd_weight_list(config: &Config, user: Option<String>) -> Result<()> {
    let user = require_user(user, config)?;
    let profiles = FileProfileStore::new(&config.data_path);
    let profile = profiles
        .load_profile(&user)
        .context("Could not load profile")?
        .unwrap_or_default();

    let goal_weight = profile.goals.goal_weight_kg;
    if goal_weight > 0.0 {
        println!("Goal: {goal_weight} kg");
    }

    if profile.weight_history.is_empty() {
        println!("No weight entries yet.");
        return Ok(());
    }

    for entry in newest_first(&profile.weight_history) {
        if goal_weight > 0.0 {
            let comparison = entry.compare_to_goal(goal_weight);
            println!(
                "{} {} - {} kg",
                comparison.arrow(),
                entry.date_label(),
                entry.weight_kg
            );
        } else {
            println!("  {} - {} kg", entry.date_label(), entry.weight_kg);
        }
    }

    if let Some(change) = net_change_kg(&profile.weight_history) {
        println!();
        println!("Net change: {change:+.1} kg");
    }
    Ok(())
}

fn cmd_workouts(config: &Config, browse: bool) -> Result<()> {
    let catalog = FileWorkoutCatalog::new(&config.data_path);
    let workouts = load_workouts_or_empty(&catalog);

    if browse {
        return browse_workouts(workouts);
    }

    if workouts.is_empty() {
        println!("No workouts available");
        println!("Catalog file: {}", catalog.path().display());
        return Ok(());
    }

    for (i, workout) in workouts.iter().enumerate() {
        println!("{:>3}. {workout}", i + 1);
        if !workout.url.is_empty() {
            println!("     {}", workout.url);
        }
    }
    Ok(())
}

fn browse_workouts(workouts: Vec<Workout>) -> Result<()> {
    let Some(mut browser) = WorkoutBrowser::new(workouts) else {
        println!("No workouts available");
        return Ok(());
    };

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let (position, total) = browser.position();
        let workout = browser.current();
        println!();
        println!("[{position}/{total}] {}", workout.name);
        println!("Reps: {}", workout.reps);
        if !workout.url.is_empty() {
            println!("{}", workout.url);
        }

        let previous = if browser.has_previous() { "[p] Previous  " } else { "" };
        println!("{previous}[n] {}  [q] Quit", browser.advance_label());

        let Some(line) = lines.next() else {
            return Ok(());
        };
        match line.context("Could not read choice")?.trim() {
            "p" => {
                browser.previous();
            }
            "n" | "" => {
                if browser.advance() == Advance::Finished {
                    println!("Workout finished.");
                    return Ok(());
                }
            }
            "q" => return Ok(()),
            other => println!("Unknown choice {other:?}"),
        }
    }
}

fn cmd_config(config: &Config, init: bool) -> Result<()> {
    let path = Config::config_path();
    if init {
        if path.exists() {
            println!("Config file already exists: {}", path.display());
        } else {
            config
                .save_to(&path)
                .context("Could not write configuration")?;
            println!("Wrote {}", path.display());
        }
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).context("Could not serialize configuration")?
    );
    Ok(())
}

fn resolve_user(flag: Option<String>, config: &Config) -> Option<String> {
    flag.or_else(|| config.user_id.clone())
}

fn require_user(flag: Option<String>, config: &Config) -> Result<String> {
    match resolve_user(flag, config) {
        Some(user) => Ok(user),
        None => bail!("No user given: pass --user or set user_id in the configuration"),
    }
}
