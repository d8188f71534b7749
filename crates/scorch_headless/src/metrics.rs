//! Match metrics collection.
//!
//! [`MetricsCollector`] folds the events of one match into a
//! [`MatchReport`]; [`BatchSummary`] aggregates reports across a batch.

use std::collections::BTreeMap;

use scorch_core::prelude::*;
use serde::{Deserialize, Serialize};

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// One combatant survived.
    Victory,
    /// The last shell took out every remaining combatant.
    Draw,
    /// The turn or frame limit was hit first.
    Unfinished,
}

/// One elimination, in match order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EliminationRecord {
    /// Turn on which the shell landed.
    pub turn: u32,
    /// Eliminated combatant.
    pub target: u32,
    /// Owner of the shell.
    pub shooter: u32,
}

/// Per-combatant tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantMetrics {
    /// Combatant id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Shells fired.
    pub shots: u32,
    /// Shells that struck a combatant.
    pub hits: u32,
    /// Opponents eliminated.
    pub kills: u32,
    /// Whether the combatant was alive at the end.
    pub survived: bool,
}

/// Complete metrics for a single match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Scenario name.
    pub scenario: String,
    /// Terrain seed.
    pub seed: u64,
    /// Variance RNG seed.
    pub rng_seed: u64,
    /// How the match ended.
    pub outcome: MatchOutcome,
    /// Surviving combatant id, if any.
    pub winner: Option<u32>,
    /// Surviving combatant name, if any.
    pub winner_name: Option<String>,
    /// Turn counter at the end.
    pub turns: u32,
    /// Host frames driven (0 for unpaced runs).
    pub frames: u64,
    /// Shells that hit terrain.
    pub terrain_impacts: u32,
    /// Shells that left the field or timed out.
    pub misses: u32,
    /// Total solid pixels removed.
    pub pixels_cleared: u64,
    /// Eliminations in order.
    pub eliminations: Vec<EliminationRecord>,
    /// Per-combatant tallies in turn order.
    pub combatants: Vec<CombatantMetrics>,
    /// Final engine state hash.
    pub final_state_hash: u64,
}

impl MatchReport {
    /// Total shells fired.
    #[must_use]
    pub fn shots(&self) -> u32 {
        self.combatants.iter().map(|c| c.shots).sum()
    }

    /// Fraction of shells that struck a combatant.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let hits: u32 = self.combatants.iter().map(|c| c.hits).sum();
        f64::from(hits) / f64::from(self.shots().max(1))
    }
}

/// Accumulates events while a match runs.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    turn: u32,
    frames: u64,
    terrain_impacts: u32,
    misses: u32,
    pixels_cleared: u64,
    eliminations: Vec<EliminationRecord>,
    per_combatant: BTreeMap<u32, (u32, u32)>,
}

impl MetricsCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one host frame.
    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    /// Fold a batch of engine events.
    pub fn record(&mut self, events: &[MatchEvent]) {
        for event in events {
            match *event {
                MatchEvent::TurnChanged { turn, .. } => self.turn = turn,
                MatchEvent::ShotFired { shooter, .. } => {
                    self.per_combatant.entry(shooter.0).or_default().0 += 1;
                }
                MatchEvent::Impact(impact) => match impact.kind {
                    ImpactKind::Combatant(_) => {
                        self.per_combatant.entry(impact.shooter.0).or_default().1 += 1;
                    }
                    ImpactKind::Terrain => self.terrain_impacts += 1,
                    ImpactKind::Miss(_) => self.misses += 1,
                },
                MatchEvent::CombatantEliminated { target, shooter } => {
                    self.eliminations.push(EliminationRecord {
                        turn: self.turn,
                        target: target.0,
                        shooter: shooter.0,
                    });
                }
                MatchEvent::TerrainEroded { cleared, .. } => {
                    self.pixels_cleared += u64::from(cleared);
                }
                MatchEvent::MatchEnded { .. } => {}
            }
        }
    }

    /// Build the report from the final state of `duel`.
    #[must_use]
    pub fn finish(self, scenario: &str, rng_seed: u64, duel: &Duel) -> MatchReport {
        let winner = duel.survivor();
        let outcome = match (duel.is_over(), winner) {
            (true, Some(_)) => MatchOutcome::Victory,
            (true, None) => MatchOutcome::Draw,
            (false, _) => MatchOutcome::Unfinished,
        };
        let combatants = duel
            .combatants()
            .iter()
            .map(|c| {
                let (shots, hits) = self.per_combatant.get(&c.id.0).copied().unwrap_or_default();
                CombatantMetrics {
                    id: c.id.0,
                    name: c.name.clone(),
                    shots,
                    hits,
                    kills: c.kills,
                    survived: c.alive,
                }
            })
            .collect();

        MatchReport {
            scenario: scenario.to_string(),
            seed: duel.seed(),
            rng_seed,
            outcome,
            winner: winner.map(|id| id.0),
            winner_name: winner.and_then(|id| duel.combatant(id)).map(|c| c.name.clone()),
            turns: duel.turn().turn,
            frames: self.frames,
            terrain_impacts: self.terrain_impacts,
            misses: self.misses,
            pixels_cleared: self.pixels_cleared,
            eliminations: self.eliminations,
            combatants,
            final_state_hash: duel.state_hash(),
        }
    }
}

/// Aggregate statistics across a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches summarized.
    pub total_games: u32,
    /// Matches with a single survivor.
    pub victories: u32,
    /// Matches with no survivor.
    pub draws: u32,
    /// Matches stopped by a limit.
    pub unfinished: u32,
    /// Win rate per combatant name.
    pub win_rates: BTreeMap<String, f64>,
    /// Mean turns per match.
    pub avg_turns: f64,
    /// Mean shells per match.
    pub avg_shots: f64,
    /// Fraction of all shells that struck a combatant.
    pub hit_rate: f64,
}

impl BatchSummary {
    /// Summarize a set of match reports.
    #[must_use]
    pub fn from_games(games: &[MatchReport]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let total = games.len() as f64;
        let count = |outcome: MatchOutcome| {
            games.iter().filter(|g| g.outcome == outcome).count() as u32
        };

        let mut wins: BTreeMap<String, u32> = BTreeMap::new();
        for game in games {
            for c in &game.combatants {
                wins.entry(c.name.clone()).or_default();
            }
            if let Some(name) = &game.winner_name {
                *wins.entry(name.clone()).or_default() += 1;
            }
        }

        let shots: u64 = games.iter().map(|g| u64::from(g.shots())).sum();
        let hits: u64 = games
            .iter()
            .flat_map(|g| &g.combatants)
            .map(|c| u64::from(c.hits))
            .sum();

        Self {
            total_games: games.len() as u32,
            victories: count(MatchOutcome::Victory),
            draws: count(MatchOutcome::Draw),
            unfinished: count(MatchOutcome::Unfinished),
            win_rates: wins
                .into_iter()
                .map(|(name, w)| (name, f64::from(w) / total))
                .collect(),
            avg_turns: games.iter().map(|g| f64::from(g.turns)).sum::<f64>() / total,
            avg_shots: shots as f64 / total,
            hit_rate: hits as f64 / shots.max(1) as f64,
        }
    }
}
