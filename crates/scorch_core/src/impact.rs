//! Impact resolution.
//!
//! Applies a finished flight to the match: elimination first, then
//! erosion, then the turn decision. Each step reads the state left by the
//! previous one, so the order is fixed.

use crate::ballistics::{ImpactEvent, ImpactKind};
use crate::combatants::Registry;
use crate::events::MatchEvent;
use crate::terrain::TerrainField;
use crate::turn::{TurnOutcome, TurnSequencer};

/// Resolve `impact` and conclude the turn.
///
/// Returns the events produced, starting with the [`MatchEvent::Impact`]
/// itself and ending with either [`MatchEvent::TurnChanged`] or
/// [`MatchEvent::MatchEnded`].
pub fn resolve_impact(
    impact: ImpactEvent,
    field: &mut TerrainField,
    registry: &mut Registry,
    turns: &mut TurnSequencer,
    explosion_radius: f64,
) -> Vec<MatchEvent> {
    let mut events = vec![MatchEvent::Impact(impact)];

    if let ImpactKind::Combatant(target) = impact.kind {
        if registry.eliminate(target) {
            if target != impact.shooter {
                registry.credit_kill(impact.shooter);
            }
            tracing::debug!(%target, shooter = %impact.shooter, "Combatant eliminated");
            events.push(MatchEvent::CombatantEliminated {
                target,
                shooter: impact.shooter,
            });
        }
    }

    if impact.kind.is_hit() {
        let cleared = field.erode(impact.position, explosion_radius);
        events.push(MatchEvent::TerrainEroded {
            center: impact.position,
            radius: explosion_radius,
            cleared,
        });
    }

    match turns.conclude(registry) {
        TurnOutcome::Next { active, turn } => {
            events.push(MatchEvent::TurnChanged { active, turn });
        }
        TurnOutcome::GameOver { survivor } => {
            tracing::info!(?survivor, "Match ended");
            events.push(MatchEvent::MatchEnded { survivor });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballistics::MissReason;
    use crate::combatants::{CombatantId, Participant, RosterConfig};
    use crate::math::Point;

    fn setup(n: u32) -> (TerrainField, Registry, TurnSequencer) {
        let participants: Vec<_> = (1..=n).map(|i| Participant::human(i, "p")).collect();
        let registry = Registry::new(&participants, &RosterConfig::default()).unwrap();
        let mut turns = TurnSequencer::new();
        turns.start(&registry);
        turns.begin_firing().unwrap();
        (TerrainField::from_surface(200, 200, |_| 100), registry, turns)
    }

    #[test]
    fn test_combatant_hit_order() {
        let (mut field, mut registry, mut turns) = setup(2);
        let impact = ImpactEvent {
            position: Point::new(50.0, 100.0),
            kind: ImpactKind::Combatant(CombatantId(2)),
            shooter: CombatantId(1),
        };
        let events = resolve_impact(impact, &mut field, &mut registry, &mut turns, 35.0);

        assert!(matches!(events[0], MatchEvent::Impact(_)));
        assert_eq!(
            events[1],
            MatchEvent::CombatantEliminated {
                target: CombatantId(2),
                shooter: CombatantId(1)
            }
        );
        assert!(matches!(events[2], MatchEvent::TerrainEroded { cleared, .. } if cleared > 0));
        assert_eq!(
            events[3],
            MatchEvent::MatchEnded {
                survivor: Some(CombatantId(1))
            }
        );
        assert_eq!(registry.get(CombatantId(1)).unwrap().kills, 1);
    }

    #[test]
    fn test_miss_leaves_terrain_alone() {
        let (mut field, mut registry, mut turns) = setup(2);
        let before = field.clone();
        let impact = ImpactEvent {
            position: Point::new(50.0, 260.0),
            kind: ImpactKind::Miss(MissReason::OutOfBounds),
            shooter: CombatantId(1),
        };
        let events = resolve_impact(impact, &mut field, &mut registry, &mut turns, 35.0);
        assert_eq!(field, before);
        assert_eq!(
            events,
            vec![
                MatchEvent::Impact(impact),
                MatchEvent::TurnChanged {
                    active: CombatantId(2),
                    turn: 2
                }
            ]
        );
    }

    #[test]
    fn test_terrain_hit_erodes_and_advances() {
        let (mut field, mut registry, mut turns) = setup(3);
        let mass = field.solid_count();
        let impact = ImpactEvent {
            position: Point::new(100.0, 100.0),
            kind: ImpactKind::Terrain,
            shooter: CombatantId(1),
        };
        let events = resolve_impact(impact, &mut field, &mut registry, &mut turns, 35.0);
        assert!(field.solid_count() < mass);
        assert_eq!(
            events.last(),
            Some(&MatchEvent::TurnChanged {
                active: CombatantId(2),
                turn: 2
            })
        );
    }

    #[test]
    fn test_self_hit_ends_with_opponent_surviving() {
        let (mut field, mut registry, mut turns) = setup(2);
        let impact = ImpactEvent {
            position: Point::new(50.0, 100.0),
            kind: ImpactKind::Combatant(CombatantId(1)),
            shooter: CombatantId(1),
        };
        let events = resolve_impact(impact, &mut field, &mut registry, &mut turns, 35.0);
        assert_eq!(
            events.last(),
            Some(&MatchEvent::MatchEnded {
                survivor: Some(CombatantId(2))
            })
        );
        assert_eq!(registry.get(CombatantId(1)).unwrap().kills, 0);
    }
}
