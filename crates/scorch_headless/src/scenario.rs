//! Scenario loading and configuration.
//!
//! A scenario names the roster, terrain seed and engine tuning of a
//! headless match. Scenarios are RON files; a few are built in:
//!
//! ```ron
//! (
//!     name: "Ridge",
//!     seed: 7,
//!     config: (field: (width: 1024, height: 512)),
//!     participants: [
//!         (id: 1, name: "Left", controller: Cpu),
//!         (id: 2, name: "Right", controller: Cpu),
//!     ],
//! )
//! ```

use std::path::Path;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use scorch_core::prelude::*;
use std::result::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Neither a built-in name nor an existing file.
    #[error("Scenario not found: {0}")]
    NotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The engine refused the scenario's setup.
    #[error("Invalid scenario: {0}")]
    Engine(#[from] GameError),
}

/// Names accepted by [`Scenario::builtin`].
pub const BUILTIN_SCENARIOS: [&str; 3] = ["duel", "free_for_all", "wide"];

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Terrain seed for single runs. Batch runs derive their own.
    #[serde(default)]
    pub seed: u64,
    /// Engine tuning; missing fields keep the shipped defaults.
    #[serde(default)]
    pub config: EngineConfig,
    /// Roster in turn order.
    pub participants: Vec<Participant>,
    /// Turns after which a match is called without a winner.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

fn default_max_turns() -> u32 {
    400
}

impl Default for Scenario {
    fn default() -> Self {
        Self::duel()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::NotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "duel" => Some(Self::duel()),
            "free_for_all" | "ffa" => Some(Self::free_for_all()),
            "wide" => Some(Self::wide()),
            _ => None,
        }
    }

    /// Resolve a built-in name first, then a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match Self::builtin(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name_or_path),
        }
    }

    /// Two CPU tanks on the default 800x400 field.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "duel".to_string(),
            description: "Two CPU tanks on the standard field".to_string(),
            seed: 42,
            config: EngineConfig::default(),
            participants: vec![Participant::cpu(1, "Alpha"), Participant::cpu(2, "Bravo")],
            max_turns: default_max_turns(),
        }
    }

    /// Four CPU tanks, every one for themselves.
    #[must_use]
    pub fn free_for_all() -> Self {
        Self {
            name: "free_for_all".to_string(),
            description: "Four CPU tanks on the standard field".to_string(),
            seed: 1337,
            config: EngineConfig::default(),
            participants: vec![
                Participant::cpu(1, "Alpha"),
                Participant::cpu(2, "Bravo"),
                Participant::cpu(3, "Charlie"),
                Participant::cpu(4, "Delta"),
            ],
            max_turns: default_max_turns(),
        }
    }

    /// Two CPU tanks on a wide field with a bigger blast.
    #[must_use]
    pub fn wide() -> Self {
        Self {
            name: "wide".to_string(),
            description: "Long-range duel on a 1600x600 field".to_string(),
            seed: 9,
            config: EngineConfig {
                explosion_radius: 45.0,
                ..EngineConfig::default().with_field(1600, 600)
            },
            participants: vec![Participant::cpu(1, "West"), Participant::cpu(2, "East")],
            max_turns: default_max_turns(),
        }
    }

    /// Override the terrain seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Start a duel from this scenario with a seeded variance RNG.
    pub fn start(&self, rng_seed: u64) -> Result<(Duel, Vec<MatchEvent>), ScenarioError> {
        let (duel, events) = Duel::with_rng(
            self.config.clone(),
            &self.participants,
            self.seed,
            Pcg32::seed_from_u64(rng_seed),
        )?;
        Ok((duel, events))
    }
}
