//! Notifications returned by engine transitions.
//!
//! Every call that changes match state returns the events it produced, in
//! the order they happened. Hosts render from them; nothing is stored.

use serde::{Deserialize, Serialize};

use crate::ballistics::ImpactEvent;
use crate::combatants::CombatantId;
use crate::math::Point;

/// Something that happened in the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchEvent {
    /// A new turn started.
    TurnChanged {
        /// Newly active combatant.
        active: CombatantId,
        /// Turn number, starting at 1.
        turn: u32,
    },
    /// The active combatant fired.
    ShotFired {
        /// Who fired.
        shooter: CombatantId,
        /// Clamped angle in degrees.
        angle: f64,
        /// Clamped power.
        power: f64,
    },
    /// A flight ended.
    Impact(ImpactEvent),
    /// A combatant was hit and is out of the match.
    CombatantEliminated {
        /// Who was hit.
        target: CombatantId,
        /// Who fired the shell.
        shooter: CombatantId,
    },
    /// An explosion removed terrain.
    TerrainEroded {
        /// Explosion center.
        center: Point,
        /// Explosion radius.
        radius: f64,
        /// Cells that were solid before the explosion.
        cleared: u32,
    },
    /// The match is over.
    MatchEnded {
        /// Sole survivor; `None` when nobody is left.
        survivor: Option<CombatantId>,
    },
}

impl MatchEvent {
    /// Whether this event ends the match.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::MatchEnded { .. })
    }
}
