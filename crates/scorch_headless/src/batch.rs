//! Batch match runner.
//!
//! Runs many independent duels in parallel using rayon. Every worker owns
//! its duel outright; nothing is shared between matches.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, MatchReport};
use crate::runner::{run_match, Pacing};
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario name or RON path
    pub scenario: String,
    /// Number of matches to run
    pub game_count: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_games: u32,
    /// First seed; match `i` uses `seed_start + i` for terrain and RNG
    pub seed_start: u64,
    /// Skip flight pacing and dwell
    pub instant: bool,
    /// Output directory for results
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "duel".to_string(),
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            instant: true,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: &str, game_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set output directory
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    fn pacing(&self) -> Pacing {
        if self.instant {
            Pacing::Instant
        } else {
            Pacing::default()
        }
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match reports, in seed order
    pub games: Vec<MatchReport>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Matches that could not be run
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

fn run_single_game(scenario: &Scenario, seed: u64, pacing: Pacing) -> Result<MatchReport, String> {
    let scenario = scenario.clone().with_seed(seed);
    run_match(&scenario, seed, pacing)
        .map(|(report, _)| report)
        .map_err(|e| e.to_string())
}

/// Run a batch of matches
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();

    let scenario = match Scenario::resolve(&config.scenario) {
        Ok(scenario) => scenario,
        Err(e) => {
            warn!(scenario = %config.scenario, error = %e, "Scenario unavailable");
            let errors = (0..config.game_count)
                .map(|i| BatchError {
                    game_index: i,
                    seed: config.seed_start.wrapping_add(u64::from(i)),
                    message: e.to_string(),
                })
                .collect();
            return BatchResults {
                config,
                games: Vec::new(),
                summary: BatchSummary::default(),
                duration_seconds: start.elapsed().as_secs_f64(),
                errors,
            };
        }
    };

    info!(
        "Starting batch run: {} matches of '{}'",
        config.game_count, scenario.name
    );

    // Configure thread pool if specified
    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let completed = AtomicU32::new(0);
    let pacing = config.pacing();

    let results: Vec<Result<MatchReport, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            match run_single_game(&scenario, seed, pacing) {
                Ok(report) => {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % 10 == 0 {
                        debug!("Progress: {}/{}", done, config.game_count);
                    }
                    Ok(report)
                }
                Err(message) => {
                    warn!("Match {} failed: {}", i, message);
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message,
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<MatchReport> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(0.001)
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Run the same seed `runs` times and check every run ends identically.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32, pacing: Pacing) -> bool {
    let results: Vec<Result<MatchReport, String>> = (0..runs)
        .into_par_iter()
        .map(|_| run_single_game(scenario, seed, pacing))
        .collect();

    let Some(Ok(first)) = results.first() else {
        return false;
    };
    results.iter().all(|r| match r {
        Ok(r) => {
            r.final_state_hash == first.final_state_hash
                && r.winner == first.winner
                && r.turns == first.turns
                && r.eliminations == first.eliminations
        }
        Err(_) => false,
    })
}
