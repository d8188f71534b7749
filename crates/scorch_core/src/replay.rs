//! Replay system for recording and re-deriving matches.
//!
//! A replay stores what cannot be re-derived (seed, config, participants,
//! spawn layout) plus the stream of accepted commands. Playing the commands
//! back through a fresh [`Duel`] must reproduce the recorded final hash.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::combatants::Participant;
use crate::config::EngineConfig;
use crate::duel::{Duel, RecordedCommand};
use crate::error::{GameError, Result};
use crate::events::MatchEvent;
use crate::math::Point;

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Terrain seed.
    pub seed: u64,
    /// Engine tuning, including the starting field size.
    pub config: EngineConfig,
    /// Participants in registration order.
    pub participants: Vec<Participant>,
    /// Starting positions in registration order.
    pub spawns: Vec<Point>,
    /// Commands in the order they were applied.
    pub commands: Vec<RecordedCommand>,
    /// State hash when the replay was captured.
    pub final_hash: u64,
}

impl Replay {
    /// Capture a duel's setup, history and current hash.
    #[must_use]
    pub fn from_duel(duel: &Duel) -> Self {
        Self {
            version: REPLAY_VERSION,
            seed: duel.seed(),
            config: duel.config().clone(),
            participants: duel.participants().to_vec(),
            spawns: duel.spawns().to_vec(),
            commands: duel.history().to_vec(),
            final_hash: duel.state_hash(),
        }
    }

    /// Starting field width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.config.field.width
    }

    /// Starting field height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.config.field.height
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Number of recorded shots.
    #[must_use]
    pub fn shot_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Fire(_)))
            .count()
    }

    /// Build the duel in its starting state.
    pub fn restore_initial_state(&self) -> Result<Duel> {
        let (duel, _) = Duel::from_layout(
            self.config.clone(),
            &self.participants,
            self.seed,
            &self.spawns,
        )?;
        Ok(duel)
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {}", e)))
    }

    /// Deserialize from bytes, rejecting other format versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {}", e)))?;

        // Version check
        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {}, got {}",
                REPLAY_VERSION, replay.version
            )));
        }

        Ok(replay)
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write replay file: {}", e)))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading, deserialization or the version
    /// check fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read replay file: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

/// Replay playback controller.
///
/// Commands are applied one at a time with no flight pacing or dwell.
#[derive(Debug)]
pub struct ReplayPlayer {
    /// The replay being played.
    replay: Replay,
    /// Current duel state.
    duel: Duel,
    /// Index of the next command to apply.
    cursor: usize,
}

impl ReplayPlayer {
    /// Create a new replay player positioned before the first command.
    ///
    /// # Errors
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay) -> Result<Self> {
        let duel = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            duel,
            cursor: 0,
        })
    }

    /// Apply the next command.
    ///
    /// Returns the events it produced, or `None` once every command has been
    /// applied.
    ///
    /// # Errors
    /// Returns an error when the engine rejects a recorded command, which
    /// means the replay does not belong to this engine build.
    pub fn advance(&mut self) -> Result<Option<Vec<MatchEvent>>> {
        let Some(&command) = self.replay.commands.get(self.cursor) else {
            return Ok(None);
        };

        let events = match command {
            RecordedCommand::Fire(shot) => self
                .duel
                .fire_and_resolve(shot.shooter, shot.angle, shot.power)
                .map_err(|rejection| {
                    GameError::InvalidState(format!(
                        "Replay command {} rejected: {rejection}",
                        self.cursor
                    ))
                })?,
            RecordedCommand::Resize { width, height } => {
                self.duel.resize(width, height)?;
                Vec::new()
            }
        };

        self.cursor += 1;
        Ok(Some(events))
    }

    /// Position the player after `target` commands.
    ///
    /// # Errors
    /// Returns an error if state restoration or a command fails.
    pub fn seek(&mut self, target: usize) -> Result<()> {
        if target < self.cursor {
            self.duel = self.replay.restore_initial_state()?;
            self.cursor = 0;
        }
        while self.cursor < target.min(self.replay.commands.len()) {
            self.advance()?;
        }
        Ok(())
    }

    /// Commands applied so far.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get a reference to the current duel state.
    #[must_use]
    pub const fn duel(&self) -> &Duel {
        &self.duel
    }

    /// Get the replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Check if the replay has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.replay.commands.len()
    }

    /// Play to the end and compare against the recorded final hash.
    ///
    /// # Errors
    /// Returns [`GameError::ReplayDiverged`] on a hash mismatch, or any
    /// error raised while re-applying commands.
    pub fn verify(&mut self) -> Result<u64> {
        self.seek(self.replay.commands.len())?;
        let actual = self.duel.state_hash();
        if actual != self.replay.final_hash {
            return Err(GameError::ReplayDiverged {
                shots: self.cursor,
                expected: self.replay.final_hash,
                actual,
            });
        }
        Ok(actual)
    }

    /// Get progress as a percentage (0-100).
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.replay.commands.is_empty() {
            100.0
        } else {
            (self.cursor as f64 / self.replay.commands.len() as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatants::CombatantId;

    fn played_duel() -> Duel {
        let participants = [Participant::human(1, "Ada"), Participant::cpu(2, "CPU 1")];
        let (mut duel, _) = Duel::initialize(EngineConfig::default(), &participants, 77).unwrap();
        duel.fire_and_resolve(CombatantId(1), 120.0, 85.0).unwrap();
        if !duel.is_over() {
            duel.run_cpu_turn().unwrap();
        }
        if !duel.is_over() {
            duel.fire_and_resolve(CombatantId(1), 115.0, 95.0).unwrap();
        }
        duel
    }

    #[test]
    fn test_replay_capture() {
        let duel = played_duel();
        let replay = Replay::from_duel(&duel);
        assert_eq!(replay.version, REPLAY_VERSION);
        assert_eq!(replay.seed, 77);
        assert_eq!(replay.width(), 800);
        assert_eq!(replay.command_count(), duel.history().len());
        assert_eq!(replay.shot_count(), duel.shots().count());
    }

    #[test]
    fn test_replay_verifies() {
        let duel = played_duel();
        let mut player = ReplayPlayer::new(Replay::from_duel(&duel)).unwrap();
        assert_eq!(player.verify().unwrap(), duel.state_hash());
        assert!(player.is_finished());
        assert!((player.progress_percent() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tampered_replay_diverges() {
        let duel = played_duel();
        let mut replay = Replay::from_duel(&duel);
        replay.final_hash ^= 1;
        let mut player = ReplayPlayer::new(replay).unwrap();
        assert!(matches!(
            player.verify(),
            Err(GameError::ReplayDiverged { .. })
        ));
    }

    #[test]
    fn test_seek_backwards_rebuilds() {
        let duel = played_duel();
        let mut player = ReplayPlayer::new(Replay::from_duel(&duel)).unwrap();
        let start = player.duel().state_hash();
        player.seek(1).unwrap();
        assert_eq!(player.cursor(), 1);
        player.seek(0).unwrap();
        assert_eq!(player.duel().state_hash(), start);
    }

    #[test]
    fn test_advance_stops_at_end() {
        let duel = played_duel();
        let mut player = ReplayPlayer::new(Replay::from_duel(&duel)).unwrap();
        let mut applied = 0;
        while player.advance().unwrap().is_some() {
            applied += 1;
        }
        assert_eq!(applied, duel.history().len());
    }

    #[test]
    fn test_replay_save_load() {
        let duel = played_duel();
        let replay = Replay::from_duel(&duel);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.replay");
        replay.save(&path).unwrap();

        let loaded = Replay::load(&path).unwrap();
        assert_eq!(loaded.seed, replay.seed);
        assert_eq!(loaded.commands, replay.commands);
        assert_eq!(loaded.final_hash, replay.final_hash);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut replay = Replay::from_duel(&played_duel());
        replay.version = REPLAY_VERSION + 1;
        let bytes = bincode::serialize(&replay).unwrap();
        assert!(Replay::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_replay_with_resize() {
        let participants = [Participant::human(1, "Ada"), Participant::human(2, "Brian")];
        let (mut duel, _) = Duel::initialize(EngineConfig::default(), &participants, 5).unwrap();
        duel.fire_and_resolve(CombatantId(1), 120.0, 85.0).unwrap();
        duel.resize(640, 320).unwrap();
        if !duel.is_over() {
            duel.fire_and_resolve(CombatantId(2), 60.0, 85.0).unwrap();
        }
        let mut player = ReplayPlayer::new(Replay::from_duel(&duel)).unwrap();
        assert!(player.verify().is_ok());
    }
}
