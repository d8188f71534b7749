//! Engine configuration.
//!
//! [`EngineConfig`] gathers the tuning of every component. `Default` carries
//! the shipped balance; hosts can override any subset from a RON file:
//!
//! ```ron
//! (
//!     field: (width: 1024, height: 512),
//!     explosion_radius: 40.0,
//!     ballistics: (allow_self_hit: true),
//! )
//! ```
//!
//! Every participant of a networked match must run with the same config,
//! just like the same seed; the state hash covers the field size but not
//! the tuning values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ballistics::BallisticsConfig;
use crate::combatants::RosterConfig;
use crate::error::{GameError, Result};
use crate::schedule::ScheduleConfig;
use crate::tactician::TacticianConfig;

/// Field dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSize {
    /// Width in pixels (columns).
    pub width: u32,
    /// Height in pixels (rows).
    pub height: u32,
}

impl Default for FieldSize {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
        }
    }
}

impl FieldSize {
    /// Create a new field size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Reject sizes that cannot hold terrain.
    pub fn validate(self) -> Result<Self> {
        if self.width == 0 || self.height == 0 {
            return Err(GameError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

/// Complete engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Field dimensions used when a match is initialized.
    pub field: FieldSize,
    /// Participant limits, spawn placement and aim bounds.
    pub roster: RosterConfig,
    /// Projectile integration and collision tuning.
    pub ballistics: BallisticsConfig,
    /// Radius of terrain removed around a terrain or combatant impact.
    pub explosion_radius: f64,
    /// CPU opponent imprecision.
    pub tactician: TacticianConfig,
    /// Dwell durations between phases.
    pub schedule: ScheduleConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            field: FieldSize::default(),
            roster: RosterConfig::default(),
            ballistics: BallisticsConfig::default(),
            explosion_radius: 35.0,
            tactician: TacticianConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from a RON string. Missing fields keep their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| GameError::ConfigParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| GameError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Self = ron::from_str(&contents).map_err(|e| GameError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value a match depends on.
    pub fn validate(&self) -> Result<()> {
        self.field.validate()?;
        self.ballistics.validate()?;
        if !(self.explosion_radius.is_finite() && self.explosion_radius >= 0.0) {
            return Err(GameError::InvalidConfig {
                name: "explosion_radius",
                value: self.explosion_radius,
                reason: "must be finite and not negative",
            });
        }
        Ok(())
    }

    /// Use a different field size.
    #[must_use]
    pub const fn with_field(mut self, width: u32, height: u32) -> Self {
        self.field = FieldSize::new(width, height);
        self
    }
}
