//! Turn sequencing.
//!
//! A match moves through `Idle -> Playing -> Firing -> (Playing | GameOver)`.
//! Exactly one alive combatant is active while `Playing`, and only that
//! combatant's commands are accepted.

use serde::{Deserialize, Serialize};

use crate::combatants::{CombatantId, Registry};
use crate::error::CommandRejected;

/// Match phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Phase {
    /// Registered but not started.
    #[default]
    Idle,
    /// Waiting for the active combatant to fire.
    Playing,
    /// A projectile is in flight or awaiting resolution.
    Firing,
    /// At most one combatant remains.
    GameOver,
}

/// Turn bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TurnState {
    /// Registration index of the active combatant.
    pub active_index: usize,
    /// Current phase.
    pub phase: Phase,
    /// Turns started so far (1 for the opening turn).
    pub turn: u32,
}

/// Result of concluding a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Play continues with the given combatant.
    Next {
        /// Newly active combatant.
        active: CombatantId,
        /// Turn number.
        turn: u32,
    },
    /// The match is over; `None` when nobody survived.
    GameOver {
        /// Sole survivor, if any.
        survivor: Option<CombatantId>,
    },
}

/// Drives [`TurnState`] against a [`Registry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TurnSequencer {
    state: TurnState,
}

impl TurnSequencer {
    /// A sequencer in [`Phase::Idle`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current turn state.
    #[must_use]
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Active combatant, if any.
    #[must_use]
    pub fn active(&self, registry: &Registry) -> Option<CombatantId> {
        match self.state.phase {
            Phase::Playing | Phase::Firing => registry.at(self.state.active_index).map(|c| c.id),
            Phase::Idle | Phase::GameOver => None,
        }
    }

    /// Leave `Idle` with the first alive combatant active.
    ///
    /// Calling it on a started match has no effect.
    pub fn start(&mut self, registry: &Registry) -> TurnOutcome {
        if self.state.phase != Phase::Idle {
            return self.current_outcome(registry);
        }
        if registry.alive_count() <= 1 {
            return self.game_over(registry);
        }

        match registry.iter().position(|c| c.alive) {
            Some(index) => {
                self.state = TurnState {
                    active_index: index,
                    phase: Phase::Playing,
                    turn: 1,
                };
                self.current_outcome(registry)
            }
            None => self.game_over(registry),
        }
    }

    /// Check that `id` may issue a command right now.
    pub fn authorize(&self, registry: &Registry, id: CombatantId) -> Result<(), CommandRejected> {
        let Some(requester) = registry.get(id) else {
            return Err(CommandRejected::UnknownCombatant(id));
        };
        if self.state.phase != Phase::Playing {
            return Err(CommandRejected::NotPlaying(self.state.phase));
        }
        if !requester.alive {
            return Err(CommandRejected::Eliminated(id));
        }
        let active = registry
            .at(self.state.active_index)
            .map(|c| c.id)
            .ok_or(CommandRejected::NotPlaying(self.state.phase))?;
        if active != id {
            return Err(CommandRejected::NotYourTurn {
                requested: id,
                active,
            });
        }
        Ok(())
    }

    /// `Playing -> Firing`.
    pub fn begin_firing(&mut self) -> Result<(), CommandRejected> {
        if self.state.phase != Phase::Playing {
            return Err(CommandRejected::NotPlaying(self.state.phase));
        }
        self.state.phase = Phase::Firing;
        Ok(())
    }

    /// Finish the current shot and pick who plays next.
    ///
    /// The alive count decides first: with one or zero combatants left the
    /// match ends without searching for a successor. Otherwise the next
    /// alive combatant after the current one, wrapping around, becomes
    /// active.
    pub fn conclude(&mut self, registry: &Registry) -> TurnOutcome {
        if registry.alive_count() <= 1 {
            return self.game_over(registry);
        }

        let n = registry.len();
        let next = (1..=n)
            .map(|step| (self.state.active_index + step) % n)
            .find(|&i| registry.at(i).is_some_and(|c| c.alive));

        match next {
            Some(index) => {
                self.state.active_index = index;
                self.state.phase = Phase::Playing;
                self.state.turn += 1;
                self.current_outcome(registry)
            }
            None => self.game_over(registry),
        }
    }

    /// Restore a previously captured state.
    pub fn restore(&mut self, state: TurnState) {
        self.state = state;
    }

    fn game_over(&mut self, registry: &Registry) -> TurnOutcome {
        self.state.phase = Phase::GameOver;
        let survivors = registry.survivors();
        TurnOutcome::GameOver {
            survivor: match survivors.as_slice() {
                [only] => Some(*only),
                _ => None,
            },
        }
    }

    fn current_outcome(&self, registry: &Registry) -> TurnOutcome {
        match (self.state.phase, registry.at(self.state.active_index)) {
            (Phase::Playing | Phase::Firing, Some(active)) => TurnOutcome::Next {
                active: active.id,
                turn: self.state.turn,
            },
            _ => {
                let survivors = registry.survivors();
                TurnOutcome::GameOver {
                    survivor: match survivors.as_slice() {
                        [only] => Some(*only),
                        _ => None,
                    },
                }
            }
        }
    }
}
