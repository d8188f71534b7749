//! Headless Scorch runner.
//!
//! This binary plays duels without graphics, for CI testing, balance runs
//! and replay verification.
//!
//! # Usage
//!
//! ```bash
//! # Play one match and print its report as JSON
//! cargo run -p scorch_headless -- play --scenario duel --seed 7
//!
//! # Run a batch of matches
//! cargo run -p scorch_headless -- batch --scenario free_for_all --count 500 --output results/
//!
//! # Same seed, several runs, identical outcome?
//! cargo run -p scorch_headless -- verify --scenario duel --seed 12345 --runs 5
//!
//! # Re-derive a recorded match
//! cargo run -p scorch_headless -- replay --file duel.replay --verify
//!
//! # Look at the battlefield after ten turns
//! cargo run -p scorch_headless -- render --scenario wide --turns 10
//! ```
//!
//! # Output
//!
//! Reports (stdout): JSON
//! Logs (stderr): tracing output and summaries

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scorch_core::prelude::{Replay, ReplayPlayer};
use scorch_headless::{
    ascii_visualizer::{render_ascii, AsciiConfig},
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{MatchRunner, Pacing},
    scenario::{Scenario, BUILTIN_SCENARIOS},
};

#[derive(Parser)]
#[command(name = "scorch_headless")]
#[command(about = "Headless Scorch duel runner for CI and balance testing")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match and print its report
    Play {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Terrain seed (defaults to the scenario's)
        #[arg(long)]
        seed: Option<u64>,

        /// Seed for spawn placement and CPU aim
        #[arg(long, default_value = "0")]
        rng_seed: u64,

        /// Skip flight pacing and dwell
        #[arg(long)]
        instant: bool,

        /// Save a replay of the match
        #[arg(long)]
        record: Option<PathBuf>,

        /// Print the final battlefield to stderr
        #[arg(long)]
        render: bool,
    },

    /// Run a batch of matches for balance testing
    Batch {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Drive every match through the frame loop instead of whole turns
        #[arg(long)]
        paced: bool,
    },

    /// Verify determinism by running same seed multiple times
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Drive the runs through the frame loop
        #[arg(long)]
        paced: bool,
    },

    /// Replay a recorded match
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify replay produces identical hash
        #[arg(long)]
        verify: bool,
    },

    /// Play some turns and draw the battlefield as ASCII
    Render {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Terrain seed (defaults to the scenario's)
        #[arg(long)]
        seed: Option<u64>,

        /// Seed for spawn placement and CPU aim
        #[arg(long, default_value = "0")]
        rng_seed: u64,

        /// Turns to play before drawing
        #[arg(short, long, default_value = "0")]
        turns: u32,

        /// Width of ASCII output
        #[arg(long, default_value = "100")]
        width: usize,

        /// Height of ASCII output
        #[arg(long, default_value = "30")]
        height: usize,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List the built-in scenarios
    Scenarios,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for reports)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Play {
            scenario,
            seed,
            rng_seed,
            instant,
            record,
            render,
        }) => {
            cmd_play(&scenario, seed, rng_seed, instant, record, render);
        }
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            paced,
        }) => {
            cmd_batch(scenario, count, parallel, output, seed, paced);
        }
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
            paced,
        }) => {
            cmd_verify(&scenario, seed, runs, paced);
        }
        Some(Commands::Replay { file, verify }) => {
            cmd_replay(file, verify);
        }
        Some(Commands::Render {
            scenario,
            seed,
            rng_seed,
            turns,
            width,
            height,
            no_color,
        }) => {
            let config = AsciiConfig {
                width,
                height,
                use_color: !no_color,
                ..AsciiConfig::default()
            };
            cmd_render(&scenario, seed, rng_seed, turns, &config);
        }
        Some(Commands::Scenarios) => cmd_scenarios(),
        None => {
            // Default: one paced match of the built-in duel
            cmd_play("duel", None, 0, false, None, false);
        }
    }
}

/// Load a scenario or exit.
fn load_scenario(name: &str, seed: Option<u64>) -> Scenario {
    match Scenario::resolve(name) {
        Ok(scenario) => match seed {
            Some(seed) => scenario.with_seed(seed),
            None => scenario,
        },
        Err(e) => {
            eprintln!("Failed to load scenario: {e}");
            std::process::exit(1);
        }
    }
}

fn start_runner(scenario: &Scenario, rng_seed: u64) -> MatchRunner {
    match MatchRunner::new(scenario, rng_seed) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to start match: {e}");
            std::process::exit(1);
        }
    }
}

/// Play one match
fn cmd_play(
    scenario: &str,
    seed: Option<u64>,
    rng_seed: u64,
    instant: bool,
    record: Option<PathBuf>,
    render: bool,
) {
    let scenario = load_scenario(scenario, seed);
    tracing::info!(
        scenario = %scenario.name,
        seed = scenario.seed,
        rng_seed,
        instant,
        "Starting match"
    );

    let mut runner = start_runner(&scenario, rng_seed);
    runner.run(if instant {
        Pacing::Instant
    } else {
        Pacing::default()
    });
    let (report, duel) = runner.finish();

    if let Some(path) = record {
        match Replay::from_duel(&duel).save(&path) {
            Ok(()) => eprintln!("Replay saved to: {}", path.display()),
            Err(e) => {
                eprintln!("Failed to save replay: {e}");
                std::process::exit(1);
            }
        }
    }

    if render {
        eprintln!("{}", render_ascii(&duel, &AsciiConfig::default()));
    }

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to encode report: {e}");
            std::process::exit(1);
        }
    }
}

/// Run batch of matches
fn cmd_batch(scenario: String, count: u32, parallel: u32, output: PathBuf, seed: u64, paced: bool) {
    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);

    tracing::info!(
        scenario = %scenario,
        count,
        parallel,
        seed,
        paced,
        output = %output.display(),
        cpus_available = num_cpus,
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to create output directory");
        eprintln!(
            "FATAL: Cannot create output directory '{}': {}",
            output.display(),
            e
        );
        std::process::exit(1);
    }

    let config = BatchConfig {
        scenario,
        game_count: count,
        parallel_games: parallel,
        seed_start: seed,
        instant: !paced,
        output_dir: output.clone(),
    };

    let results = run_batch(config);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        tracing::error!(error = %e, path = %results_path.display(), "Failed to save results");
        eprintln!("FATAL: Failed to save results: {e}");
        std::process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Matches FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Throughput: {:.1} matches/sec",
        results.games.len() as f64 / results.duration_seconds.max(0.001)
    );
    eprintln!(
        "Victories: {}  Draws: {}  Unfinished: {}",
        summary.victories, summary.draws, summary.unfinished
    );
    eprintln!(
        "Avg turns: {:.1}  Avg shots: {:.1}  Hit rate: {:.1}%",
        summary.avg_turns,
        summary.avg_shots,
        summary.hit_rate * 100.0
    );
    eprintln!("\nWin Rates:");
    for (name, rate) in &summary.win_rates {
        eprintln!("  {}: {:.1}%", name, rate * 100.0);
    }

    if !results.errors.is_empty() {
        eprintln!("\nFAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!(
                "  Match {} (seed {}): {}",
                error.game_index, error.seed, error.message
            );
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Verify determinism
fn cmd_verify(scenario: &str, seed: u64, runs: u32, paced: bool) {
    let scenario = load_scenario(scenario, None);
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        seed,
        runs
    );

    let pacing = if paced {
        Pacing::default()
    } else {
        Pacing::Instant
    };
    if verify_determinism(&scenario, seed, runs, pacing) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}

/// Replay a recorded match
fn cmd_replay(file: PathBuf, verify: bool) {
    if verify {
        tracing::info!("Verifying replay: {}", file.display());
    } else {
        tracing::info!("Playing replay: {}", file.display());
    }

    let replay = match Replay::load(&file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load replay: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("Loaded replay:");
    eprintln!("  Seed: {}", replay.seed);
    eprintln!("  Field: {}x{}", replay.width(), replay.height());
    eprintln!("  Participants: {}", replay.participants.len());
    eprintln!("  Commands: {} ({} shots)", replay.command_count(), replay.shot_count());

    let mut player = match ReplayPlayer::new(replay) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to create replay player: {e}");
            std::process::exit(1);
        }
    };

    if verify {
        eprintln!("Verifying replay...");
        match player.verify() {
            Ok(hash) => {
                eprintln!("PASS: Replay verification successful");
                eprintln!("  Final hash: {hash:016x}");
            }
            Err(e) => {
                eprintln!("FAIL: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let mut last_percent = 0;
    loop {
        match player.advance() {
            Ok(Some(events)) => {
                for event in &events {
                    tracing::debug!(?event, "Replayed");
                }
                let percent = player.progress_percent() as u32;
                if percent >= last_percent + 10 {
                    eprintln!("Progress: {percent}%");
                    last_percent = percent - percent % 10;
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("Replay failed at command {}: {e}", player.cursor());
                std::process::exit(1);
            }
        }
    }

    let duel = player.duel();
    eprintln!("Replay complete after {} commands", player.cursor());
    eprintln!("Final state hash: {:016x}", duel.state_hash());
    eprintln!("{}", render_ascii(duel, &AsciiConfig::default()));
}

/// Render the battlefield after some turns
fn cmd_render(scenario: &str, seed: Option<u64>, rng_seed: u64, turns: u32, config: &AsciiConfig) {
    let scenario = load_scenario(scenario, seed);
    let mut runner = start_runner(&scenario, rng_seed);
    for _ in 0..turns {
        if runner.duel().is_over() {
            break;
        }
        runner.step_turn();
    }
    println!("{}", render_ascii(runner.duel(), config));
}

/// List built-in scenarios
fn cmd_scenarios() {
    for name in BUILTIN_SCENARIOS {
        if let Some(scenario) = Scenario::builtin(name) {
            println!(
                "{:<14} {:>2} players  {}x{}  {}",
                name,
                scenario.participants.len(),
                scenario.config.field.width,
                scenario.config.field.height,
                scenario.description
            );
        }
    }
}
