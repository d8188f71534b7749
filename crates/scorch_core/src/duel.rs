//! Match orchestration.
//!
//! [`Duel`] owns one match: terrain, combatants, turn state, the shell in
//! flight and its trail, dwell timers and the command history. Hosts drive
//! it from their frame loop with [`Duel::tick`] and feed player input through
//! [`Duel::fire`]; every transition returns the [`MatchEvent`]s it produced.
//!
//! # Determinism
//!
//! Two duels built from the same config, participants, seed and spawn
//! layout, given the same commands, reach the same [`Duel::state_hash`]. The
//! variance RNG only feeds spawn x and CPU aim, both of which are captured
//! (as the spawn layout and as recorded shots) before they affect state.
//!
//! # Example
//!
//! ```
//! use scorch_core::prelude::*;
//!
//! let participants = [Participant::human(1, "Ada"), Participant::human(2, "Brian")];
//! let (mut duel, events) = Duel::initialize(EngineConfig::default(), &participants, 42).unwrap();
//! assert_eq!(events, vec![MatchEvent::TurnChanged { active: CombatantId(1), turn: 1 }]);
//!
//! // Out-of-turn commands are ignored
//! assert!(duel.fire(CombatantId(2), 45.0, 80.0).is_err());
//!
//! let events = duel.fire_and_resolve(CombatantId(1), 60.0, 90.0).unwrap();
//! assert!(matches!(events[0], MatchEvent::ShotFired { .. }));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::ballistics::{simulate, FlightStep, ImpactEvent, Projectile};
use crate::combatants::{Combatant, CombatantId, Participant, Registry};
use crate::config::{EngineConfig, FieldSize};
use crate::error::{CommandRejected, GameError, Result};
use crate::events::MatchEvent;
use crate::impact::resolve_impact;
use crate::math::Point;
use crate::schedule::PhaseTimer;
use crate::tactician::{plan_shot, ShotPlan};
use crate::terrain::TerrainField;
use crate::turn::{Phase, TurnOutcome, TurnSequencer, TurnState};

/// A shot as accepted by the engine (after clamping).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    /// Who fired.
    pub shooter: CombatantId,
    /// Clamped angle in degrees.
    pub angle: f64,
    /// Clamped power.
    pub power: f64,
}

/// A state-changing command, in the order it was applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RecordedCommand {
    /// An accepted shot.
    Fire(ShotRecord),
    /// The field was resized.
    Resize {
        /// New width.
        width: u32,
        /// New height.
        height: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Flight {
    Flying(Projectile),
    Landed { impact: ImpactEvent, dwell: PhaseTimer },
}

fn entropy_rng() -> Pcg32 {
    Pcg32::from_rng(&mut rand::rng())
}

/// One artillery match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duel {
    config: EngineConfig,
    seed: u64,
    participants: Vec<Participant>,
    spawns: Vec<Point>,
    field: TerrainField,
    registry: Registry,
    turns: TurnSequencer,
    flight: Option<Flight>,
    trail: Vec<Point>,
    cpu_timer: Option<PhaseTimer>,
    pending_resize: Option<FieldSize>,
    history: Vec<RecordedCommand>,
    #[serde(skip, default = "entropy_rng")]
    rng: Pcg32,
}

impl Duel {
    /// Start a match with random spawn positions.
    ///
    /// Generates the terrain from `seed` at `config.field`, places every
    /// participant on it and hands the first turn to the first participant.
    /// Returns the duel and the opening [`MatchEvent::TurnChanged`].
    pub fn initialize(
        config: EngineConfig,
        participants: &[Participant],
        seed: u64,
    ) -> Result<(Self, Vec<MatchEvent>)> {
        Self::with_rng(config, participants, seed, entropy_rng())
    }

    /// Like [`initialize`](Self::initialize) with an explicit variance RNG,
    /// which makes spawn x and CPU aim reproducible too.
    pub fn with_rng(
        config: EngineConfig,
        participants: &[Participant],
        seed: u64,
        rng: Pcg32,
    ) -> Result<(Self, Vec<MatchEvent>)> {
        Self::build(config, participants, seed, rng, None)
    }

    /// Start a match with explicit spawn positions, one per participant in
    /// registration order. Replays and scripted scenarios use this.
    pub fn from_layout(
        config: EngineConfig,
        participants: &[Participant],
        seed: u64,
        spawns: &[Point],
    ) -> Result<(Self, Vec<MatchEvent>)> {
        Self::build(config, participants, seed, entropy_rng(), Some(spawns))
    }

    /// One human against `cpu_count` CPU opponents.
    pub fn solo(
        config: EngineConfig,
        name: &str,
        cpu_count: u32,
        seed: u64,
    ) -> Result<(Self, Vec<MatchEvent>)> {
        let mut participants = vec![Participant::human(1, name)];
        participants.extend((1..=cpu_count).map(|i| Participant::cpu(i + 1, format!("CPU {i}"))));
        Self::initialize(config, &participants, seed)
    }

    fn build(
        config: EngineConfig,
        participants: &[Participant],
        seed: u64,
        mut rng: Pcg32,
        layout: Option<&[Point]>,
    ) -> Result<(Self, Vec<MatchEvent>)> {
        config.validate()?;
        let size = config.field;
        let field = TerrainField::generate(seed, size.width, size.height);
        let mut registry = Registry::new(participants, &config.roster)?;

        match layout {
            Some(spawns) => {
                if spawns.len() != participants.len() {
                    return Err(GameError::LayoutMismatch {
                        spawns: spawns.len(),
                        participants: participants.len(),
                    });
                }
                for (participant, &spawn) in participants.iter().zip(spawns) {
                    registry.place(participant.id, spawn)?;
                }
            }
            None => registry.spawn(&field, config.roster.spawn_inset, &mut rng),
        }

        let spawns = registry.iter().map(|c| c.position).collect();
        let mut duel = Self {
            config,
            seed,
            participants: participants.to_vec(),
            spawns,
            field,
            registry,
            turns: TurnSequencer::new(),
            flight: None,
            trail: Vec::new(),
            cpu_timer: None,
            pending_resize: None,
            history: Vec::new(),
            rng,
        };

        tracing::info!(
            seed,
            width = size.width,
            height = size.height,
            participants = participants.len(),
            "Match started"
        );

        let events = match duel.turns.start(&duel.registry) {
            TurnOutcome::Next { active, turn } => vec![MatchEvent::TurnChanged { active, turn }],
            TurnOutcome::GameOver { survivor } => vec![MatchEvent::MatchEnded { survivor }],
        };
        duel.prepare_turn();
        Ok((duel, events))
    }

    /// Aim without firing. Only the active combatant may aim; values are
    /// clamped.
    pub fn set_aim(
        &mut self,
        id: CombatantId,
        angle: f64,
        power: f64,
    ) -> std::result::Result<(f64, f64), CommandRejected> {
        self.authorize(id)?;
        self.registry
            .set_aim(id, angle, power, &self.config.roster)
            .map_err(|_| CommandRejected::UnknownCombatant(id))
    }

    /// Fire the active combatant's gun.
    ///
    /// Angle and power are clamped into the roster bounds. The shell is
    /// launched but not advanced; [`tick`](Self::tick) flies it.
    pub fn fire(
        &mut self,
        id: CombatantId,
        angle: f64,
        power: f64,
    ) -> std::result::Result<Vec<MatchEvent>, CommandRejected> {
        self.authorize(id)?;
        let (angle, power) = self.config.roster.clamp_aim(angle, power);
        let origin = match self.registry.get_mut(id) {
            Some(shooter) => {
                shooter.angle = angle;
                shooter.power = power;
                shooter.position
            }
            None => return Err(CommandRejected::UnknownCombatant(id)),
        };
        self.turns.begin_firing()?;

        self.cpu_timer = None;
        self.trail.clear();
        self.trail.push(origin);
        self.flight = Some(Flight::Flying(Projectile::launch(
            id,
            origin,
            angle,
            power,
            &self.config.ballistics,
        )));
        self.history.push(RecordedCommand::Fire(ShotRecord {
            shooter: id,
            angle,
            power,
        }));

        tracing::debug!(shooter = %id, angle, power, "Shot fired");
        Ok(vec![MatchEvent::ShotFired {
            shooter: id,
            angle,
            power,
        }])
    }

    /// Advance the match by one host frame.
    ///
    /// While a shell flies, each call is one flight step regardless of `dt`.
    /// Once it lands, `dt` counts down the dwell (longer after a hit than
    /// after a miss) and the impact is resolved when the dwell expires.
    /// While a CPU combatant is active, `dt` counts down its think time and
    /// the tactician then fires.
    pub fn tick(&mut self, dt: Duration) -> Vec<MatchEvent> {
        match self.turns.phase() {
            Phase::Firing => self.tick_flight(dt),
            Phase::Playing => self.tick_cpu(dt),
            Phase::Idle | Phase::GameOver => Vec::new(),
        }
    }

    fn tick_flight(&mut self, dt: Duration) -> Vec<MatchEvent> {
        match self.flight.take() {
            Some(Flight::Flying(mut projectile)) => {
                match projectile.advance(
                    &self.config.ballistics,
                    &self.field,
                    self.registry.as_slice(),
                ) {
                    FlightStep::InFlight(point) => {
                        self.trail.push(point);
                        self.flight = Some(Flight::Flying(projectile));
                    }
                    FlightStep::Impact(impact) => {
                        self.trail.push(impact.position);
                        let dwell = self.config.schedule.dwell(impact.kind.is_hit());
                        tracing::debug!(
                            kind = ?impact.kind,
                            steps = projectile.steps(),
                            dwell_ms = dwell.as_millis() as u64,
                            "Shell landed"
                        );
                        self.flight = Some(Flight::Landed {
                            impact,
                            dwell: PhaseTimer::new(dwell),
                        });
                    }
                }
                Vec::new()
            }
            Some(Flight::Landed { impact, mut dwell }) => {
                if dwell.tick(dt) {
                    self.resolve(impact)
                } else {
                    self.flight = Some(Flight::Landed { impact, dwell });
                    Vec::new()
                }
            }
            None => Vec::new(),
        }
    }

    fn tick_cpu(&mut self, dt: Duration) -> Vec<MatchEvent> {
        let Some(timer) = self.cpu_timer.as_mut() else {
            return Vec::new();
        };
        if !timer.tick(dt) {
            return Vec::new();
        }
        self.cpu_timer = None;

        let Some(active) = self.active() else {
            return Vec::new();
        };
        let Some(plan) = self.plan_for(active) else {
            return Vec::new();
        };
        self.fire(active, plan.angle, plan.power)
            .unwrap_or_else(|rejection| {
                tracing::warn!(%rejection, "CPU shot rejected");
                Vec::new()
            })
    }

    /// Fire and resolve immediately, skipping flight pacing and dwell.
    pub fn fire_and_resolve(
        &mut self,
        id: CombatantId,
        angle: f64,
        power: f64,
    ) -> std::result::Result<Vec<MatchEvent>, CommandRejected> {
        let mut events = self.fire(id, angle, power)?;
        events.extend(self.finish_flight());
        Ok(events)
    }

    /// Let the tactician play the active combatant's turn to completion.
    pub fn run_cpu_turn(&mut self) -> std::result::Result<Vec<MatchEvent>, CommandRejected> {
        let phase = self.turns.phase();
        if phase != Phase::Playing {
            return Err(CommandRejected::NotPlaying(phase));
        }
        let active = self.active().ok_or(CommandRejected::NotPlaying(phase))?;
        let plan = self
            .plan_for(active)
            .ok_or(CommandRejected::NotPlaying(phase))?;
        self.fire_and_resolve(active, plan.angle, plan.power)
    }

    /// Finish the current flight (if any) without pacing and resolve it.
    pub fn finish_flight(&mut self) -> Vec<MatchEvent> {
        let impact = match self.flight.take() {
            Some(Flight::Flying(projectile)) => {
                let outcome = simulate(
                    projectile,
                    &self.config.ballistics,
                    &self.field,
                    self.registry.as_slice(),
                );
                self.trail.extend(outcome.samples);
                outcome.impact
            }
            Some(Flight::Landed { impact, .. }) => impact,
            None => return Vec::new(),
        };
        self.resolve(impact)
    }

    fn resolve(&mut self, impact: ImpactEvent) -> Vec<MatchEvent> {
        #[cfg(feature = "debug-validation")]
        let before = self.field.clone();

        let events = resolve_impact(
            impact,
            &mut self.field,
            &mut self.registry,
            &mut self.turns,
            self.config.explosion_radius,
        );

        #[cfg(feature = "debug-validation")]
        debug_assert!(self.field.is_subset_of(&before), "terrain gained mass");

        if let Some(size) = self.pending_resize.take() {
            self.apply_resize(size);
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(shots = self.history.len(), state_hash = hash, "Duel state hash");
        }

        self.prepare_turn();
        events
    }

    fn prepare_turn(&mut self) {
        self.cpu_timer = None;
        if self.turns.phase() != Phase::Playing {
            return;
        }
        let cpu_active = self
            .active()
            .and_then(|id| self.registry.get(id))
            .is_some_and(Combatant::is_cpu);
        if cpu_active {
            self.cpu_timer = Some(PhaseTimer::new(self.config.schedule.cpu_think()));
        }
    }

    fn plan_for(&mut self, id: CombatantId) -> Option<ShotPlan> {
        let shooter = self.registry.get(id)?;
        plan_shot(
            shooter,
            self.registry.as_slice(),
            self.config.ballistics.gravity,
            &self.config.tactician,
            &mut self.rng,
        )
    }

    fn authorize(&self, id: CombatantId) -> std::result::Result<(), CommandRejected> {
        self.turns.authorize(&self.registry, id).map_err(|rejection| {
            tracing::debug!(combatant = %id, %rejection, "Command rejected");
            rejection
        })
    }

    /// Regenerate the terrain at a new size.
    ///
    /// Erosion is lost; the field is rebuilt from the seed. Combatants keep
    /// their relative x and drop onto the new surface. While a shot is in
    /// flight or dwelling the resize is held until the shot resolves, and a
    /// later request replaces an earlier held one.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let size = FieldSize::new(width, height).validate()?;
        if self.turns.phase() == Phase::Firing {
            tracing::debug!(width, height, "Resize held until the shot resolves");
            self.pending_resize = Some(size);
        } else {
            self.apply_resize(size);
        }
        Ok(())
    }

    fn apply_resize(&mut self, size: FieldSize) {
        let old_width = f64::from(self.field.width());
        self.field = TerrainField::generate(self.seed, size.width, size.height);

        for combatant in self.registry.iter_mut() {
            let x = combatant.position.x * f64::from(size.width) / old_width;
            combatant.position = Point::new(x, f64::from(self.field.surface_y(x.floor() as i64)));
        }

        self.history.push(RecordedCommand::Resize {
            width: size.width,
            height: size.height,
        });
        tracing::info!(width = size.width, height = size.height, "Field resized");
    }

    /// Resize waiting for the current shot to resolve.
    #[must_use]
    pub const fn pending_resize(&self) -> Option<FieldSize> {
        self.pending_resize
    }

    /// Current terrain.
    #[must_use]
    pub fn terrain(&self) -> &TerrainField {
        &self.field
    }

    /// All combatants in registration order.
    #[must_use]
    pub fn combatants(&self) -> &[Combatant] {
        self.registry.as_slice()
    }

    /// Look up a combatant.
    #[must_use]
    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.registry.get(id)
    }

    /// Turn bookkeeping.
    #[must_use]
    pub fn turn(&self) -> TurnState {
        self.turns.state()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.turns.phase()
    }

    /// Active combatant while playing or firing.
    #[must_use]
    pub fn active(&self) -> Option<CombatantId> {
        self.turns.active(&self.registry)
    }

    /// Sole survivor once the match is over.
    #[must_use]
    pub fn survivor(&self) -> Option<CombatantId> {
        if self.turns.phase() != Phase::GameOver {
            return None;
        }
        match self.registry.survivors().as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Positions of the current (or last) shell, starting at the muzzle.
    #[must_use]
    pub fn trail(&self) -> &[Point] {
        &self.trail
    }

    /// Impact waiting out its dwell, if any.
    #[must_use]
    pub fn pending_impact(&self) -> Option<&ImpactEvent> {
        match &self.flight {
            Some(Flight::Landed { impact, .. }) => Some(impact),
            _ => None,
        }
    }

    /// Commands applied so far.
    #[must_use]
    pub fn history(&self) -> &[RecordedCommand] {
        &self.history
    }

    /// Accepted shots so far.
    pub fn shots(&self) -> impl Iterator<Item = &ShotRecord> {
        self.history.iter().filter_map(|command| match command {
            RecordedCommand::Fire(shot) => Some(shot),
            RecordedCommand::Resize { .. } => None,
        })
    }

    /// Engine tuning.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Terrain seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Participants as registered.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Positions combatants started the match at.
    #[must_use]
    pub fn spawns(&self) -> &[Point] {
        &self.spawns
    }

    /// Whether the match is over.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.turns.phase() == Phase::GameOver
    }

    /// Hash of the authoritative state for desync detection.
    ///
    /// Covers the terrain, every combatant's position, liveness and kills,
    /// the turn state and the number of applied commands. Aim, trail and
    /// timers are presentation state and are left out.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.field.hash(&mut hasher);

        self.registry.len().hash(&mut hasher);
        for combatant in self.registry.iter() {
            combatant.id.hash(&mut hasher);
            combatant.alive.hash(&mut hasher);
            combatant.kills.hash(&mut hasher);
            combatant.position.to_bits().hash(&mut hasher);
        }

        self.turns.state().hash(&mut hasher);
        self.history.len().hash(&mut hasher);

        hasher.finish()
    }

    /// Serialize the duel to bytes.
    ///
    /// The variance RNG is not included; a restored duel draws fresh CPU
    /// jitter.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize duel: {e}")))
    }

    /// Restore a duel from [`serialize`](Self::serialize) output.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize duel: {e}")))
    }
}
