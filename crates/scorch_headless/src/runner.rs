//! Headless match runner.
//!
//! Drives a [`Duel`] the way a graphical host would: one `tick` per frame,
//! with flight pacing, impact dwell and CPU think time all counted down by
//! the frame duration. Human seats have nobody at the keyboard, so the
//! tactician plays them as soon as their turn opens.

use std::time::Duration;

use scorch_core::prelude::*;
use std::result::Result;

use crate::metrics::{MatchReport, MetricsCollector};
use crate::scenario::{Scenario, ScenarioError};

/// How the runner advances time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Drive `Duel::tick` with a fixed frame duration.
    Frames {
        /// Simulated duration of one host frame.
        frame: Duration,
        /// Hard stop, in frames.
        max_frames: u64,
    },
    /// Play whole turns with no flight pacing or dwell.
    Instant,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::Frames {
            frame: Duration::from_millis(16),
            max_frames: 2_000_000,
        }
    }
}

/// Runs one scenario to completion.
#[derive(Debug)]
pub struct MatchRunner {
    scenario: String,
    rng_seed: u64,
    max_turns: u32,
    duel: Duel,
    collector: MetricsCollector,
}

impl MatchRunner {
    /// Start the scenario's duel with a seeded variance RNG.
    pub fn new(scenario: &Scenario, rng_seed: u64) -> Result<Self, ScenarioError> {
        let (duel, opening) = scenario.start(rng_seed)?;
        let mut collector = MetricsCollector::new();
        collector.record(&opening);
        Ok(Self {
            scenario: scenario.name.clone(),
            rng_seed,
            max_turns: scenario.max_turns,
            duel,
            collector,
        })
    }

    /// The duel being run.
    #[must_use]
    pub fn duel(&self) -> &Duel {
        &self.duel
    }

    /// Advance one host frame.
    pub fn step_frame(&mut self, frame: Duration) -> Vec<MatchEvent> {
        let events = if self.awaiting_human() {
            self.autopilot()
        } else {
            self.duel.tick(frame)
        };
        self.collector.record_frame();
        self.collector.record(&events);
        events
    }

    /// Play the active combatant's whole turn.
    pub fn step_turn(&mut self) -> Vec<MatchEvent> {
        let events = self.autopilot();
        self.collector.record(&events);
        events
    }

    fn awaiting_human(&self) -> bool {
        self.duel.phase() == Phase::Playing
            && self
                .duel
                .active()
                .and_then(|id| self.duel.combatant(id))
                .is_some_and(|c| !c.is_cpu())
    }

    fn autopilot(&mut self) -> Vec<MatchEvent> {
        self.duel.run_cpu_turn().unwrap_or_else(|rejection| {
            tracing::warn!(%rejection, "Autopilot turn rejected");
            Vec::new()
        })
    }

    fn turn_limit_reached(&self) -> bool {
        self.duel.turn().turn > self.max_turns
    }

    /// Run until the match ends or a limit is hit.
    pub fn run(&mut self, pacing: Pacing) {
        match pacing {
            Pacing::Frames { frame, max_frames } => {
                for _ in 0..max_frames {
                    if self.duel.is_over() || self.turn_limit_reached() {
                        break;
                    }
                    self.step_frame(frame);
                }
            }
            Pacing::Instant => {
                while !self.duel.is_over() && !self.turn_limit_reached() {
                    if self.step_turn().is_empty() {
                        break;
                    }
                }
            }
        }

        // A shell still in the air would leave the shot history ahead of
        // the board.
        if self.duel.phase() == Phase::Firing {
            let events = self.duel.finish_flight();
            self.collector.record(&events);
        }
    }

    /// Finish and build the report, handing back the duel.
    #[must_use]
    pub fn finish(self) -> (MatchReport, Duel) {
        let report = self.collector.finish(&self.scenario, self.rng_seed, &self.duel);
        tracing::info!(
            scenario = %report.scenario,
            seed = report.seed,
            outcome = ?report.outcome,
            winner = ?report.winner_name,
            turns = report.turns,
            shots = report.shots(),
            "Match finished"
        );
        (report, self.duel)
    }
}

/// Run a scenario to completion and report on it.
pub fn run_match(
    scenario: &Scenario,
    rng_seed: u64,
    pacing: Pacing,
) -> Result<(MatchReport, Duel), ScenarioError> {
    let mut runner = MatchRunner::new(scenario, rng_seed)?;
    runner.run(pacing);
    Ok(runner.finish())
}
