//! Headless tank battle runner.
//!
//! This binary runs a scenario without graphics and prints JSON to stdout.
//! Designed for CI testing and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario to completion
//! cargo run -p tanks_headless -- run scenarios/arena.ron
//!
//! # Override the seed and tick limit
//! cargo run -p tanks_headless -- run scenarios/arena.ron --seed 7 --ticks 600
//!
//! # Verify determinism across runs
//! cargo run -p tanks_headless -- verify scenarios/arena.ron --runs 5
//!
//! # Measure tick throughput
//! cargo run --release -p tanks_headless -- benchmark scenarios/arena.ron --ticks 10000
//! ```

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tanks_headless::{run_scenario, verify_determinism, Scenario, ScenarioRunner};

#[derive(Parser)]
#[command(name = "tanks_headless")]
#[command(about = "Headless tank battle runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print the summary
    Run {
        /// Scenario file (RON)
        scenario: PathBuf,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the tick limit
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Verify determinism by replaying a scenario
    Verify {
        /// Scenario file (RON)
        scenario: PathBuf,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Number of runs to compare
        #[arg(long, default_value = "3")]
        runs: u32,
    },

    /// Measure simulation throughput
    Benchmark {
        /// Scenario file (RON)
        scenario: PathBuf,

        /// Ticks to simulate
        #[arg(long, default_value = "10000")]
        ticks: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr, stdout is for JSON
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            seed,
            ticks,
        } => cmd_run(scenario, seed, ticks),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(scenario, seed, runs),
        Commands::Benchmark { scenario, ticks } => cmd_benchmark(scenario, ticks),
    }
}

fn load_or_exit(path: &Path, seed: Option<u64>) -> Scenario {
    match Scenario::load(path) {
        Ok(mut scenario) => {
            if let Some(seed) = seed {
                scenario.reseed(seed);
            }
            scenario
        }
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Failed to load scenario");
            eprintln!("FATAL: {e}");
            process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("FATAL: Failed to encode result: {e}");
            process::exit(1);
        }
    }
}

/// Run a single scenario
fn cmd_run(path: PathBuf, seed: Option<u64>, ticks: Option<u64>) {
    let mut scenario = load_or_exit(&path, seed);
    if let Some(ticks) = ticks {
        scenario.max_ticks = ticks;
    }

    match run_scenario(scenario) {
        Ok(summary) => print_json(&summary),
        Err(e) => {
            eprintln!("FATAL: {e}");
            process::exit(1);
        }
    }
}

/// Verify determinism
fn cmd_verify(path: PathBuf, seed: Option<u64>, runs: u32) {
    let scenario = load_or_exit(&path, seed);
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        scenario.seed,
        runs
    );

    let report = match verify_determinism(&scenario, runs) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("FATAL: {e}");
            process::exit(1);
        }
    };
    print_json(&report);

    if report.deterministic {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!(
            "FAIL: Non-determinism detected at tick {}",
            report.first_divergence.unwrap_or_default()
        );
        process::exit(1);
    }
}

/// Run performance benchmark
fn cmd_benchmark(path: PathBuf, ticks: u64) {
    use std::time::Instant;

    let mut scenario = load_or_exit(&path, None);
    scenario.max_ticks = ticks;

    let mut runner = match ScenarioRunner::new(scenario) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("FATAL: {e}");
            process::exit(1);
        }
    };

    let start = Instant::now();
    while !runner.is_finished() {
        runner.step();
    }
    let elapsed = start.elapsed();

    let simulated = runner.simulation().get_tick();
    let ticks_per_sec = simulated as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    eprintln!("Benchmark Results:");
    eprintln!("  Ticks: {simulated}");
    eprintln!("  Time: {:.3}s", elapsed.as_secs_f64());
    eprintln!("  Ticks/sec: {ticks_per_sec:.0}");
    eprintln!("  Status: {:?}", runner.simulation().status());
}
