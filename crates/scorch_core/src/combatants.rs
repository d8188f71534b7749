//! Combatant registry and spawn placement.
//!
//! The registry owns every participant of a match in registration order.
//! That order is the turn order, decides colors, and must be identical on
//! every participant's machine.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{clamp_input, Point};
use crate::terrain::TerrainField;

/// Host-assigned combatant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who supplies a combatant's aim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Controller {
    /// Aim comes from the hosting shell (local or remote player).
    #[default]
    Human,
    /// Aim comes from the CPU tactician.
    Cpu,
}

/// Index into the fixed [`PALETTE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorSlot(pub u8);

impl ColorSlot {
    /// Palette entry for this slot.
    #[must_use]
    pub fn color(self) -> &'static TeamColor {
        &PALETTE[self.0 as usize % PALETTE.len()]
    }
}

/// A display color from the fixed palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamColor {
    /// Human-readable name.
    pub name: &'static str,
    /// CSS hex string.
    pub hex: &'static str,
    /// RGB components.
    pub rgb: [u8; 3],
}

/// Team colors, assigned in registration order.
pub const PALETTE: [TeamColor; 4] = [
    TeamColor {
        name: "Blue",
        hex: "#4a9eff",
        rgb: [74, 158, 255],
    },
    TeamColor {
        name: "Red",
        hex: "#ff4757",
        rgb: [255, 71, 87],
    },
    TeamColor {
        name: "Green",
        hex: "#2ed573",
        rgb: [46, 213, 115],
    },
    TeamColor {
        name: "Yellow",
        hex: "#ffd93d",
        rgb: [255, 217, 61],
    },
];

/// Participant limits, spawn placement and aim bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Fewest participants a match can start with.
    pub min_players: usize,
    /// Most participants a match can hold (at most the palette size).
    pub max_players: usize,
    /// Distance kept from each spawn section's edges.
    pub spawn_inset: f64,
    /// Aim every combatant starts with.
    pub default_angle: f64,
    /// Power every combatant starts with.
    pub default_power: f64,
    /// Inclusive angle bounds in degrees.
    pub angle_range: (f64, f64),
    /// Inclusive power bounds.
    pub power_range: (f64, f64),
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: PALETTE.len(),
            spawn_inset: 30.0,
            default_angle: 90.0,
            default_power: 80.0,
            angle_range: (0.0, 180.0),
            power_range: (20.0, 150.0),
        }
    }
}

impl RosterConfig {
    /// Clamp an aim command into the configured bounds.
    #[must_use]
    pub fn clamp_aim(&self, angle: f64, power: f64) -> (f64, f64) {
        (
            clamp_input(angle, self.angle_range.0, self.angle_range.1),
            clamp_input(power, self.power_range.0, self.power_range.1),
        )
    }
}

/// A participant as handed over by the hosting shell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Identifier shared by every participant's machine.
    pub id: CombatantId,
    /// Display name.
    pub name: String,
    /// Aim source.
    #[serde(default)]
    pub controller: Controller,
}

impl Participant {
    /// A human-controlled participant.
    #[must_use]
    pub fn human(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: CombatantId(id),
            name: name.into(),
            controller: Controller::Human,
        }
    }

    /// A CPU-controlled participant.
    #[must_use]
    pub fn cpu(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: CombatantId(id),
            name: name.into(),
            controller: Controller::Cpu,
        }
    }
}

/// A tank on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Identifier.
    pub id: CombatantId,
    /// Display name.
    pub name: String,
    /// Palette slot, unique within the match.
    pub color: ColorSlot,
    /// Aim source.
    pub controller: Controller,
    /// Position; y sits on the terrain surface at spawn time.
    pub position: Point,
    /// Barrel angle in degrees, 90 is straight up.
    pub angle: f64,
    /// Launch power.
    pub power: f64,
    /// Whether the combatant is still in the match.
    pub alive: bool,
    /// Opponents eliminated by this combatant's shells.
    pub kills: u32,
}

impl Combatant {
    /// Whether the CPU tactician aims for this combatant.
    #[must_use]
    pub fn is_cpu(&self) -> bool {
        self.controller == Controller::Cpu
    }
}

/// Ordered list of the match's combatants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    combatants: Vec<Combatant>,
}

impl Registry {
    /// Register participants in turn order.
    ///
    /// Positions stay at the origin until [`spawn`](Self::spawn) or
    /// [`place`](Self::place) runs.
    pub fn new(participants: &[Participant], config: &RosterConfig) -> Result<Self> {
        let max = config.max_players.min(PALETTE.len());
        if participants.len() < config.min_players || participants.len() > max {
            return Err(GameError::InvalidParticipantCount {
                count: participants.len(),
                min: config.min_players,
                max,
            });
        }

        let mut combatants: Vec<Combatant> = Vec::with_capacity(participants.len());
        for (slot, participant) in participants.iter().enumerate() {
            if combatants.iter().any(|c| c.id == participant.id) {
                return Err(GameError::DuplicateCombatant(participant.id));
            }
            combatants.push(Combatant {
                id: participant.id,
                name: participant.name.clone(),
                color: ColorSlot(slot as u8),
                controller: participant.controller,
                position: Point::ZERO,
                angle: config.default_angle,
                power: config.default_power,
                alive: true,
                kills: 0,
            });
        }

        Ok(Self { combatants })
    }

    /// Place every combatant on the terrain surface.
    ///
    /// The field is split into one equal-width section per combatant and
    /// each gets a uniform x inside its section, `inset` away from the
    /// edges. The x draw comes from `rng`, so placement varies per match
    /// even for a fixed terrain seed.
    pub fn spawn<R: Rng + ?Sized>(&mut self, field: &TerrainField, inset: f64, rng: &mut R) {
        let section = f64::from(field.width()) / self.combatants.len() as f64;

        for (i, combatant) in self.combatants.iter_mut().enumerate() {
            let min_x = section * i as f64 + inset;
            let max_x = section * (i + 1) as f64 - inset;
            let x = if max_x > min_x {
                rng.random_range(min_x..max_x)
            } else {
                (section * i as f64) + section / 2.0
            };
            combatant.position = Point::new(x, f64::from(field.surface_y(x.floor() as i64)));
        }

        tracing::debug!(
            positions = ?self.combatants.iter().map(|c| c.position).collect::<Vec<_>>(),
            "Spawned combatants"
        );
    }

    /// Move a combatant to an explicit position (replays, scenarios, resize).
    pub fn place(&mut self, id: CombatantId, position: Point) -> Result<()> {
        let combatant = self.get_mut(id).ok_or(GameError::CombatantNotFound(id))?;
        combatant.position = position;
        Ok(())
    }

    /// Look up a combatant by id.
    #[must_use]
    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    /// Look up a combatant mutably by id.
    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    /// Registration index of a combatant.
    #[must_use]
    pub fn index_of(&self, id: CombatantId) -> Option<usize> {
        self.combatants.iter().position(|c| c.id == id)
    }

    /// Combatant at a registration index.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Combatant> {
        self.combatants.get(index)
    }

    /// All combatants in registration order.
    #[must_use]
    pub fn as_slice(&self) -> &[Combatant] {
        &self.combatants
    }

    /// Iterate in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    /// Iterate mutably in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.iter_mut()
    }

    /// Number of registered combatants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    /// Whether no combatants are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Number of combatants still alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.combatants.iter().filter(|c| c.alive).count()
    }

    /// Ids of combatants still alive, in registration order.
    #[must_use]
    pub fn survivors(&self) -> Vec<CombatantId> {
        self.combatants
            .iter()
            .filter(|c| c.alive)
            .map(|c| c.id)
            .collect()
    }

    /// Mark a combatant as eliminated. Returns whether it was alive.
    pub fn eliminate(&mut self, id: CombatantId) -> bool {
        match self.get_mut(id) {
            Some(combatant) if combatant.alive => {
                combatant.alive = false;
                true
            }
            _ => false,
        }
    }

    /// Credit a kill to the shooter.
    pub fn credit_kill(&mut self, shooter: CombatantId) {
        if let Some(combatant) = self.get_mut(shooter) {
            combatant.kills += 1;
        }
    }

    /// Set a combatant's aim, clamped into the configured bounds.
    ///
    /// Turn ownership is checked by the caller.
    pub fn set_aim(
        &mut self,
        id: CombatantId,
        angle: f64,
        power: f64,
        config: &RosterConfig,
    ) -> Result<(f64, f64)> {
        let (angle, power) = config.clamp_aim(angle, power);
        let combatant = self.get_mut(id).ok_or(GameError::CombatantNotFound(id))?;
        combatant.angle = angle;
        combatant.power = power;
        Ok((angle, power))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn roster(n: u32) -> Vec<Participant> {
        (1..=n)
            .map(|i| Participant::human(i, format!("Player {i}")))
            .collect()
    }

    #[test]
    fn test_colors_follow_registration_order() {
        let registry = Registry::new(&roster(4), &RosterConfig::default()).unwrap();
        let names: Vec<_> = registry.iter().map(|c| c.color.color().name).collect();
        assert_eq!(names, ["Blue", "Red", "Green", "Yellow"]);
    }

    #[test]
    fn test_participant_count_bounds() {
        let config = RosterConfig::default();
        assert!(matches!(
            Registry::new(&roster(1), &config),
            Err(GameError::InvalidParticipantCount { count: 1, .. })
        ));
        assert!(matches!(
            Registry::new(&roster(5), &config),
            Err(GameError::InvalidParticipantCount { count: 5, .. })
        ));
        assert!(Registry::new(&roster(2), &config).is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let participants = vec![Participant::human(1, "A"), Participant::cpu(1, "B")];
        assert!(matches!(
            Registry::new(&participants, &RosterConfig::default()),
            Err(GameError::DuplicateCombatant(CombatantId(1)))
        ));
    }

    #[test]
    fn test_defaults_applied() {
        let registry = Registry::new(&roster(2), &RosterConfig::default()).unwrap();
        for c in registry.iter() {
            assert!((c.angle - 90.0).abs() < f64::EPSILON);
            assert!((c.power - 80.0).abs() < f64::EPSILON);
            assert!(c.alive);
        }
    }

    #[test]
    fn test_spawn_keeps_each_combatant_in_its_section() {
        let field = TerrainField::generate(42, 800, 400);
        let mut rng = Pcg32::seed_from_u64(1);
        for n in 2..=4 {
            let mut registry = Registry::new(&roster(n), &RosterConfig::default()).unwrap();
            registry.spawn(&field, 30.0, &mut rng);
            let section = 800.0 / f64::from(n);
            for (i, c) in registry.iter().enumerate() {
                let start = section * i as f64;
                assert!(c.position.x >= start + 30.0 && c.position.x < start + section - 30.0);
                let expected = f64::from(field.surface_y(c.position.x.floor() as i64));
                assert!((c.position.y - expected).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn test_spawn_varies_with_rng_not_seed() {
        let field = TerrainField::generate(42, 800, 400);
        let mut a = Registry::new(&roster(2), &RosterConfig::default()).unwrap();
        let mut b = a.clone();
        a.spawn(&field, 30.0, &mut Pcg32::seed_from_u64(1));
        b.spawn(&field, 30.0, &mut Pcg32::seed_from_u64(2));
        assert_ne!(a.at(0).unwrap().position, b.at(0).unwrap().position);
    }

    #[test]
    fn test_eliminate_reports_transition_once() {
        let mut registry = Registry::new(&roster(3), &RosterConfig::default()).unwrap();
        assert!(registry.eliminate(CombatantId(2)));
        assert!(!registry.eliminate(CombatantId(2)));
        assert!(!registry.eliminate(CombatantId(9)));
        assert_eq!(registry.alive_count(), 2);
        assert_eq!(registry.survivors(), vec![CombatantId(1), CombatantId(3)]);
    }

    #[test]
    fn test_set_aim_clamps() {
        let config = RosterConfig::default();
        let mut registry = Registry::new(&roster(2), &config).unwrap();
        let (angle, power) = registry
            .set_aim(CombatantId(1), 190.0, 5.0, &config)
            .unwrap();
        assert!((angle - 180.0).abs() < f64::EPSILON);
        assert!((power - 20.0).abs() < f64::EPSILON);
        assert!(registry
            .set_aim(CombatantId(7), 45.0, 50.0, &config)
            .is_err());
    }
}
