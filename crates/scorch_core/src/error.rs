//! Error types for the duel engine.
//!
//! Two families live here. [`GameError`] covers faults in setting up or
//! persisting a match (bad participant lists, unreadable replay files).
//! [`CommandRejected`] is the ignorable usage error returned when a command
//! arrives from the wrong combatant or at the wrong time; it never mutates
//! state and callers are free to drop it.

use thiserror::Error;

use crate::combatants::CombatantId;
use crate::turn::Phase;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for engine setup and persistence faults.
#[derive(Debug, Error)]
pub enum GameError {
    /// Participant list is outside the supported range.
    #[error("Invalid participant count: {count} (expected {min}..={max})")]
    InvalidParticipantCount {
        /// Number of participants supplied.
        count: usize,
        /// Minimum supported participants.
        min: usize,
        /// Maximum supported participants.
        max: usize,
    },

    /// The same combatant id was registered twice.
    #[error("Duplicate combatant ID: {0}")]
    DuplicateCombatant(CombatantId),

    /// Invalid combatant reference.
    #[error("Combatant not found: {0}")]
    CombatantNotFound(CombatantId),

    /// Field dimensions cannot hold a match.
    #[error("Invalid field dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Spawn layout does not match the participant list.
    #[error("Spawn layout has {spawns} positions for {participants} participants")]
    LayoutMismatch {
        /// Number of spawn positions supplied.
        spawns: usize,
        /// Number of participants registered.
        participants: usize,
    },

    /// Config file parsing error.
    #[error("Failed to parse config '{path}': {message}")]
    ConfigParseError {
        /// Path (or source label) of the config that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// A tuning value is out of range.
    #[error("Invalid config value {name} = {value}: {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        name: &'static str,
        /// Value that was supplied.
        value: f64,
        /// What the value must satisfy.
        reason: &'static str,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Replay re-derivation produced a different final state.
    #[error("Replay diverged after {shots} shots: expected hash {expected}, got {actual}")]
    ReplayDiverged {
        /// Shots applied before the comparison.
        shots: usize,
        /// Hash recorded in the replay.
        expected: u64,
        /// Hash produced by re-derivation.
        actual: u64,
    },
}

/// A command that was ignored because it is not legal right now.
///
/// Rejections are usage errors, not faults: the engine state is untouched
/// and the hosting shell may safely discard the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandRejected {
    /// Commands are only accepted while the match is in [`Phase::Playing`].
    #[error("Commands are not accepted during {0:?}")]
    NotPlaying(Phase),

    /// The command came from a combatant other than the active one.
    #[error("It is not {requested}'s turn (active: {active})")]
    NotYourTurn {
        /// Combatant that issued the command.
        requested: CombatantId,
        /// Combatant whose turn it is.
        active: CombatantId,
    },

    /// The issuing combatant has already been eliminated.
    #[error("Combatant {0} has been eliminated")]
    Eliminated(CombatantId),

    /// The issuing combatant is not registered in this match.
    #[error("Unknown combatant: {0}")]
    UnknownCombatant(CombatantId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages_name_the_combatants() {
        let err = CommandRejected::NotYourTurn {
            requested: CombatantId(2),
            active: CombatantId(1),
        };
        assert_eq!(err.to_string(), "It is not #2's turn (active: #1)");
    }

    #[test]
    fn test_participant_count_message() {
        let err = GameError::InvalidParticipantCount {
            count: 5,
            min: 2,
            max: 4,
        };
        assert!(err.to_string().contains("5"));
        assert!(err.to_string().contains("2..=4"));
    }
}
