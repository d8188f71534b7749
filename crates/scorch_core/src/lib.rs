//! # Scorch Core
//!
//! Deterministic engine for turn-based artillery duels on destructible
//! terrain.
//!
//! This crate contains **only** match logic:
//! - No rendering
//! - No transport
//! - No global randomness (every RNG is owned or injected)
//!
//! This separation enables:
//! - Peer matches where every participant re-derives the same terrain
//! - Headless CPU-vs-CPU batch runs
//! - Replay verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`terrain`] - Seeded terrain generation and erosion
//! - [`combatants`] - Combatant registry and spawn placement
//! - [`turn`] - Turn sequencing
//! - [`ballistics`] - Projectile flight and collision
//! - [`impact`] - Impact resolution
//! - [`tactician`] - CPU opponent
//! - [`duel`] - Match orchestration
//! - [`replay`] - Recording and re-deriving matches

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ballistics;
pub mod combatants;
pub mod config;
pub mod duel;
pub mod error;
pub mod events;
pub mod impact;
pub mod math;
pub mod replay;
pub mod schedule;
pub mod tactician;
pub mod terrain;
pub mod turn;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ballistics::{
        BallisticsConfig, ImpactEvent, ImpactKind, MissReason, Projectile, ShotOutcome,
    };
    pub use crate::combatants::{
        Combatant, CombatantId, Controller, Participant, Registry, RosterConfig,
    };
    pub use crate::config::{EngineConfig, FieldSize};
    pub use crate::duel::{Duel, RecordedCommand, ShotRecord};
    pub use crate::error::{CommandRejected, GameError, Result};
    pub use crate::events::MatchEvent;
    pub use crate::math::{Fixed, Point};
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::terrain::TerrainField;
    pub use crate::turn::{Phase, TurnState};
}
