//! Projectile flight.
//!
//! Positions follow a closed form in elapsed time rather than integrated
//! velocity, so step `k` always lands on the same point regardless of how
//! the host paces frames:
//!
//! ```text
//! vx = power * cos(angle)        vy = power * sin(angle)
//! x(t) = x0 - vx * t / 2
//! y(t) = y0 - vy * t + gravity * t^2 / 2      (y grows downward)
//! ```
//!
//! with `t = k * time_step`. The flight is a resumable sequence: each call to
//! [`Projectile::advance`] (or each item of a [`Trajectory`]) is one step.

use serde::{Deserialize, Serialize};

use crate::combatants::{Combatant, CombatantId};
use crate::error::{GameError, Result};
use crate::math::Point;
use crate::terrain::TerrainField;

/// Flight and collision tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallisticsConfig {
    /// Downward acceleration.
    pub gravity: f64,
    /// Elapsed time per step.
    pub time_step: f64,
    /// No collisions are checked until elapsed time exceeds this.
    pub grace_period: f64,
    /// Flights reaching this elapsed time become misses.
    pub max_flight_time: f64,
    /// Distance past the left, right and bottom edges before a shell is lost.
    pub bounds_margin: f64,
    /// Tank body radius.
    pub tank_radius: f64,
    /// Extra distance added to the tank radius for hit tests.
    pub hit_margin: f64,
    /// Whether a shell can hit the combatant that fired it.
    pub allow_self_hit: bool,
}

impl Default for BallisticsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            time_step: 0.02,
            grace_period: 0.3,
            max_flight_time: 100.0,
            bounds_margin: 50.0,
            tank_radius: 12.0,
            hit_margin: 5.0,
            allow_self_hit: false,
        }
    }
}

impl BallisticsConfig {
    /// Distance under which a shell hits a combatant.
    #[must_use]
    pub fn hit_radius(&self) -> f64 {
        self.tank_radius + self.hit_margin
    }

    /// Reject tuning under which a flight could never end.
    ///
    /// Elapsed time must grow every step and reach a finite cap; the other
    /// distances must be finite.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("ballistics.time_step", self.time_step),
            ("ballistics.max_flight_time", self.max_flight_time),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GameError::InvalidConfig {
                    name,
                    value,
                    reason: "must be finite and greater than zero",
                });
            }
        }

        let finite = [
            ("ballistics.gravity", self.gravity),
            ("ballistics.grace_period", self.grace_period),
            ("ballistics.bounds_margin", self.bounds_margin),
            ("ballistics.tank_radius", self.tank_radius),
            ("ballistics.hit_margin", self.hit_margin),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(GameError::InvalidConfig {
                    name,
                    value,
                    reason: "must be finite",
                });
            }
        }
        Ok(())
    }
}

/// Why a shell was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissReason {
    /// Left the field past the margin.
    OutOfBounds,
    /// Reached the flight time cap.
    Expired,
}

/// What a shell ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactKind {
    /// Solid terrain.
    Terrain,
    /// A combatant's hit radius.
    Combatant(CombatantId),
    /// Nothing.
    Miss(MissReason),
}

impl ImpactKind {
    /// Whether the shell exploded (terrain or combatant).
    #[must_use]
    pub fn is_hit(self) -> bool {
        !matches!(self, Self::Miss(_))
    }
}

/// End of a flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactEvent {
    /// Where the flight ended.
    pub position: Point,
    /// What it ended on.
    pub kind: ImpactKind,
    /// Who fired.
    pub shooter: CombatantId,
}

/// Result of one flight step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightStep {
    /// Still flying at this point.
    InFlight(Point),
    /// The flight ended.
    Impact(ImpactEvent),
}

/// A shell in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    shooter: CombatantId,
    origin: Point,
    vx: f64,
    vy: f64,
    gravity: f64,
    step: u32,
}

impl Projectile {
    /// Launch from `origin` at `angle` degrees (90 is straight up) with
    /// `power`.
    #[must_use]
    pub fn launch(
        shooter: CombatantId,
        origin: Point,
        angle: f64,
        power: f64,
        config: &BallisticsConfig,
    ) -> Self {
        let radians = angle.to_radians();
        Self {
            shooter,
            origin,
            vx: power * radians.cos(),
            vy: power * radians.sin(),
            gravity: config.gravity,
            step: 0,
        }
    }

    /// Who fired.
    #[must_use]
    pub fn shooter(&self) -> CombatantId {
        self.shooter
    }

    /// Steps taken so far.
    #[must_use]
    pub fn steps(&self) -> u32 {
        self.step
    }

    /// Position after `t` elapsed time.
    #[must_use]
    pub fn position_at(&self, t: f64) -> Point {
        Point::new(
            self.origin.x - self.vx * t / 2.0,
            self.origin.y - self.vy * t + self.gravity * t * t / 2.0,
        )
    }

    /// Take one step and check what the shell ran into.
    ///
    /// Checks run in order: combatants (registration order), terrain,
    /// bounds, flight time. Collisions are skipped during the grace period
    /// so a shell does not detonate in its own barrel.
    pub fn advance(
        &mut self,
        config: &BallisticsConfig,
        field: &TerrainField,
        combatants: &[Combatant],
    ) -> FlightStep {
        self.step += 1;
        let t = f64::from(self.step) * config.time_step;
        let position = self.position_at(t);

        if t > config.grace_period {
            if let Some(kind) = self.collide(position, config, field, combatants) {
                return self.impact(position, kind);
            }
        }

        let margin = config.bounds_margin;
        if position.x < -margin
            || position.x > f64::from(field.width()) + margin
            || position.y > f64::from(field.height()) + margin
        {
            return self.impact(position, ImpactKind::Miss(MissReason::OutOfBounds));
        }

        if t >= config.max_flight_time {
            return self.impact(position, ImpactKind::Miss(MissReason::Expired));
        }

        FlightStep::InFlight(position)
    }

    fn collide(
        &self,
        position: Point,
        config: &BallisticsConfig,
        field: &TerrainField,
        combatants: &[Combatant],
    ) -> Option<ImpactKind> {
        let radius_sq = config.hit_radius() * config.hit_radius();
        let struck = combatants.iter().find(|c| {
            c.alive
                && (config.allow_self_hit || c.id != self.shooter)
                && c.position.distance_squared(position) < radius_sq
        });
        if let Some(target) = struck {
            return Some(ImpactKind::Combatant(target.id));
        }
        field.is_solid_at(position).then_some(ImpactKind::Terrain)
    }

    fn impact(&self, position: Point, kind: ImpactKind) -> FlightStep {
        FlightStep::Impact(ImpactEvent {
            position,
            kind,
            shooter: self.shooter,
        })
    }
}

/// Step-by-step view of a flight. Yields every step, ending with the
/// [`FlightStep::Impact`].
pub struct Trajectory<'a> {
    projectile: Projectile,
    config: &'a BallisticsConfig,
    field: &'a TerrainField,
    combatants: &'a [Combatant],
    finished: bool,
}

impl<'a> Trajectory<'a> {
    /// Wrap a freshly launched projectile.
    #[must_use]
    pub fn new(
        projectile: Projectile,
        config: &'a BallisticsConfig,
        field: &'a TerrainField,
        combatants: &'a [Combatant],
    ) -> Self {
        Self {
            projectile,
            config,
            field,
            combatants,
            finished: false,
        }
    }
}

impl Iterator for Trajectory<'_> {
    type Item = FlightStep;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let step = self
            .projectile
            .advance(self.config, self.field, self.combatants);
        self.finished = matches!(step, FlightStep::Impact(_));
        Some(step)
    }
}

/// A completed flight.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotOutcome {
    /// Every sampled position, including the final one.
    pub samples: Vec<Point>,
    /// How the flight ended.
    pub impact: ImpactEvent,
}

/// Run a flight to completion.
#[must_use]
pub fn simulate(
    projectile: Projectile,
    config: &BallisticsConfig,
    field: &TerrainField,
    combatants: &[Combatant],
) -> ShotOutcome {
    let mut samples = Vec::new();
    let mut projectile = projectile;
    loop {
        match projectile.advance(config, field, combatants) {
            FlightStep::InFlight(point) => samples.push(point),
            FlightStep::Impact(impact) => {
                samples.push(impact.position);
                return ShotOutcome { samples, impact };
            }
        }
    }
}
