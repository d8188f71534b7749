//! Headless hosting shell for Scorch duels.
//!
//! Runs matches without graphics, for CI and balance work:
//!
//! - **Match runner**: drives a duel through its frame loop (or turn by
//!   turn) with the tactician playing every seat
//! - **Batch runs**: many seeds in parallel, summarized as JSON
//! - **Verification**: same-seed determinism and replay hash checks
//! - **ASCII rendering**: the battlefield in a terminal
//!
//! # Output
//!
//! - **stdout**: JSON reports
//! - **stderr**: logs and human-readable summaries
//!
//! # Example
//!
//! ```bash
//! # Play the built-in duel and record it
//! cargo run -p scorch_headless -- play --scenario duel --record duel.replay
//!
//! # Check the recording
//! cargo run -p scorch_headless -- replay duel.replay --verify
//!
//! # 200 four-way matches
//! cargo run -p scorch_headless -- batch --scenario free_for_all --count 200
//! ```

pub mod ascii_visualizer;
pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use ascii_visualizer::{render_ascii, AsciiConfig};
pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, MatchOutcome, MatchReport, MetricsCollector};
pub use runner::{run_match, MatchRunner, Pacing};
pub use scenario::{Scenario, ScenarioError, BUILTIN_SCENARIOS};
