//! CPU opponent.
//!
//! A heuristic aimer: pick the nearest opponent, guess an angle on the side
//! the shell will actually travel, scale power with distance, then add
//! uniform jitter so the CPU is beatable.
//!
//! Horizontal speed is halved by the flight model, so a shell at 45 or 135
//! degrees covers `power^2 / (2 * gravity)` over flat ground. The power guess
//! inverts that.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combatants::Combatant;
use crate::math::clamp_input;

/// CPU imprecision and aim limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticianConfig {
    /// Maximum angle jitter in degrees, either way.
    pub aim_variance: f64,
    /// Maximum power jitter, either way.
    pub power_variance: f64,
    /// Spread of the baseline angle guess, either way.
    pub baseline_spread: f64,
    /// Angle bounds for CPU shots.
    pub angle_range: (f64, f64),
    /// Power bounds for CPU shots.
    pub power_range: (f64, f64),
}

impl Default for TacticianConfig {
    fn default() -> Self {
        Self {
            aim_variance: 8.0,
            power_variance: 10.0,
            baseline_spread: 10.0,
            angle_range: (10.0, 170.0),
            power_range: (20.0, 150.0),
        }
    }
}

/// An aim decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotPlan {
    /// Angle in degrees.
    pub angle: f64,
    /// Launch power.
    pub power: f64,
}

/// Closest alive opponent by horizontal distance. Ties go to the earlier
/// registration.
#[must_use]
pub fn choose_target<'a>(shooter: &Combatant, roster: &'a [Combatant]) -> Option<&'a Combatant> {
    roster
        .iter()
        .filter(|c| c.alive && c.id != shooter.id)
        .fold(None, |best: Option<&Combatant>, candidate| {
            let d = (candidate.position.x - shooter.position.x).abs();
            match best {
                Some(b) if (b.position.x - shooter.position.x).abs() <= d => Some(b),
                _ => Some(candidate),
            }
        })
}

/// Baseline shot at `target`, before jitter.
///
/// Shells travel toward negative x for angles under 90 degrees, so a target
/// to the right gets 135 and one to the left gets 45. Power inverts the
/// level-ground range `v^2 / (2g)` over the horizontal gap only; height
/// difference is handled by the adjustment below.
pub fn estimate_shot<R: Rng + ?Sized>(
    shooter: &Combatant,
    target: &Combatant,
    gravity: f64,
    config: &TacticianConfig,
    rng: &mut R,
) -> ShotPlan {
    let dx = target.position.x - shooter.position.x;
    let dy = target.position.y - shooter.position.y;

    let baseline = if dx >= 0.0 { 135.0 } else { 45.0 };
    let mut angle = baseline + symmetric(rng, config.baseline_spread);
    let mut power = (2.0 * gravity.max(0.0) * dx.abs()).sqrt().clamp(40.0, 150.0);

    if dy < -30.0 {
        angle += if angle < 90.0 { 10.0 } else { -10.0 };
        power += 10.0;
    } else if dy > 30.0 {
        power -= 5.0;
    }

    ShotPlan { angle, power }
}

/// Full CPU decision: target, estimate, jitter, clamp.
///
/// Returns `None` when no opponent is alive.
pub fn plan_shot<R: Rng + ?Sized>(
    shooter: &Combatant,
    roster: &[Combatant],
    gravity: f64,
    config: &TacticianConfig,
    rng: &mut R,
) -> Option<ShotPlan> {
    let target = choose_target(shooter, roster)?;
    let estimate = estimate_shot(shooter, target, gravity, config, rng);

    let angle = estimate.angle + symmetric(rng, config.aim_variance);
    let power = estimate.power + symmetric(rng, config.power_variance);

    let plan = ShotPlan {
        angle: clamp_input(angle, config.angle_range.0, config.angle_range.1),
        power: clamp_input(power, config.power_range.0, config.power_range.1),
    };
    tracing::debug!(
        shooter = %shooter.id,
        target = %target.id,
        angle = plan.angle,
        power = plan.power,
        "CPU planned shot"
    );
    Some(plan)
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, spread: f64) -> f64 {
    if spread > 0.0 {
        rng.random_range(-spread..=spread)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatants::{ColorSlot, CombatantId, Controller};
    use crate::math::Point;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const G: f64 = 9.8;

    fn at(id: u32, x: f64, y: f64) -> Combatant {
        Combatant {
            id: CombatantId(id),
            name: String::new(),
            color: ColorSlot(0),
            controller: Controller::Cpu,
            position: Point::new(x, y),
            angle: 90.0,
            power: 80.0,
            alive: true,
            kills: 0,
        }
    }

    fn steady() -> TacticianConfig {
        TacticianConfig {
            aim_variance: 0.0,
            power_variance: 0.0,
            baseline_spread: 0.0,
            ..TacticianConfig::default()
        }
    }

    #[test]
    fn test_choose_closest_alive_opponent() {
        let roster = vec![
            at(1, 100.0, 200.0),
            at(2, 150.0, 200.0),
            at(3, 400.0, 200.0),
            at(4, 60.0, 200.0),
        ];
        assert_eq!(choose_target(&roster[0], &roster).unwrap().id, CombatantId(4));

        let mut roster = roster;
        roster[3].alive = false;
        assert_eq!(choose_target(&roster[0], &roster).unwrap().id, CombatantId(2));
    }

    #[test]
    fn test_no_target_when_alone() {
        let roster = vec![at(1, 100.0, 200.0)];
        assert!(choose_target(&roster[0], &roster).is_none());
        let mut rng = Pcg32::seed_from_u64(0);
        assert!(plan_shot(&roster[0], &roster, G, &steady(), &mut rng).is_none());
    }

    #[test]
    fn test_baseline_faces_the_target() {
        let mut rng = Pcg32::seed_from_u64(0);
        let shooter = at(1, 100.0, 200.0);
        let right = estimate_shot(&shooter, &at(2, 500.0, 200.0), G, &steady(), &mut rng);
        let left = estimate_shot(&shooter, &at(2, 0.0, 200.0), G, &steady(), &mut rng);
        assert!((right.angle - 135.0).abs() < f64::EPSILON);
        assert!((left.angle - 45.0).abs() < f64::EPSILON);
        assert!((right.power - (2.0 * G * 400.0_f64).sqrt()).abs() < 1e-9);
        assert!((left.power - (2.0 * G * 100.0_f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_power_clamped_for_near_and_far_targets() {
        let mut rng = Pcg32::seed_from_u64(0);
        let shooter = at(1, 100.0, 200.0);
        let near = estimate_shot(&shooter, &at(2, 110.0, 200.0), G, &steady(), &mut rng);
        let far = estimate_shot(&shooter, &at(2, 2100.0, 200.0), G, &steady(), &mut rng);
        assert!((near.power - 40.0).abs() < f64::EPSILON);
        assert!((far.power - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flat_ground_estimate_lands_on_target() {
        use crate::ballistics::{BallisticsConfig, Projectile};

        let config = BallisticsConfig::default();
        let shooter = at(1, 100.0, 300.0);
        let target = at(2, 400.0, 300.0);
        let mut rng = Pcg32::seed_from_u64(0);
        let plan = estimate_shot(&shooter, &target, config.gravity, &steady(), &mut rng);

        let shell = Projectile::launch(
            shooter.id,
            shooter.position,
            plan.angle,
            plan.power,
            &config,
        );
        let radians = plan.angle.to_radians();
        let flight_time = 2.0 * plan.power * radians.sin() / config.gravity;
        let landing = shell.position_at(flight_time);
        assert!((landing.x - target.position.x).abs() < 1.0);
    }

    #[test]
    fn test_height_adjustments() {
        let mut rng = Pcg32::seed_from_u64(0);
        let shooter = at(1, 100.0, 200.0);
        let base = (2.0 * G * 100.0_f64).sqrt();

        let higher = estimate_shot(&shooter, &at(2, 200.0, 100.0), G, &steady(), &mut rng);
        assert!((higher.angle - 125.0).abs() < f64::EPSILON);
        assert!((higher.power - (base + 10.0)).abs() < 1e-9);

        let lower = estimate_shot(&shooter, &at(2, 200.0, 300.0), G, &steady(), &mut rng);
        assert!((lower.angle - 135.0).abs() < f64::EPSILON);
        assert!((lower.power - (base - 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_plan_stays_within_limits() {
        let config = TacticianConfig::default();
        let mut rng = Pcg32::seed_from_u64(99);
        let roster = vec![at(1, 10.0, 300.0), at(2, 790.0, 50.0)];
        for _ in 0..500 {
            let plan = plan_shot(&roster[0], &roster, G, &config, &mut rng).unwrap();
            assert!((10.0..=170.0).contains(&plan.angle));
            assert!((20.0..=150.0).contains(&plan.power));
        }
    }

    #[test]
    fn test_plan_is_reproducible_for_a_seeded_rng() {
        let config = TacticianConfig::default();
        let roster = vec![at(1, 100.0, 200.0), at(2, 600.0, 220.0)];
        let a = plan_shot(&roster[0], &roster, G, &config, &mut Pcg32::seed_from_u64(5));
        let b = plan_shot(&roster[0], &roster, G, &config, &mut Pcg32::seed_from_u64(5));
        assert_eq!(a, b);
    }
}
