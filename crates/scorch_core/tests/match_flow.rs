//! End-to-end match flow through the public engine surface.

use std::time::Duration;

use scorch_core::ballistics::{simulate, BallisticsConfig, Projectile};
use scorch_core::combatants::Registry;
use scorch_core::prelude::*;
use scorch_core::turn::{TurnOutcome, TurnSequencer};
use scorch_test_utils::fixtures::{cpu_duel, humans, stacked_layout};

#[test]
fn test_stacked_shot_eliminates_lower_combatant() {
    let config = EngineConfig::default();
    let spawns = stacked_layout(42, &config, 600.5, 60.0);
    let (mut duel, opening) = Duel::from_layout(config, &humans(2), 42, &spawns).unwrap();
    assert_eq!(
        opening,
        vec![MatchEvent::TurnChanged {
            active: CombatantId(1),
            turn: 1
        }]
    );

    let events = duel.fire_and_resolve(CombatantId(1), 90.0, 120.0).unwrap();

    let impact = events
        .iter()
        .find_map(|e| match e {
            MatchEvent::Impact(impact) => Some(*impact),
            _ => None,
        })
        .unwrap();
    assert_eq!(impact.kind, ImpactKind::Combatant(CombatantId(2)));
    assert!(events.contains(&MatchEvent::CombatantEliminated {
        target: CombatantId(2),
        shooter: CombatantId(1)
    }));
    assert_eq!(
        events.last(),
        Some(&MatchEvent::MatchEnded {
            survivor: Some(CombatantId(1))
        })
    );
    assert_eq!(duel.phase(), Phase::GameOver);
    assert_eq!(duel.survivor(), Some(CombatantId(1)));
    assert_eq!(duel.combatant(CombatantId(1)).unwrap().kills, 1);
}

#[test]
fn test_stacked_shot_through_frame_loop() {
    let config = EngineConfig::default();
    let spawns = stacked_layout(42, &config, 600.5, 60.0);
    let (mut duel, _) = Duel::from_layout(config, &humans(2), 42, &spawns).unwrap();
    duel.fire(CombatantId(1), 90.0, 120.0).unwrap();

    let mut events = Vec::new();
    for _ in 0..10_000 {
        events.extend(duel.tick(Duration::from_millis(16)));
        if duel.is_over() {
            break;
        }
    }
    assert!(events.iter().any(|e| matches!(
        e,
        MatchEvent::Impact(ImpactEvent {
            kind: ImpactKind::Combatant(CombatantId(2)),
            ..
        })
    )));
    assert_eq!(duel.survivor(), Some(CombatantId(1)));
    assert!(duel.fire(CombatantId(1), 45.0, 50.0).is_err());
}

#[test]
fn test_trajectory_closed_form() {
    let config = BallisticsConfig::default();
    let p = Projectile::launch(CombatantId(1), Point::ZERO, 90.0, 100.0, &config);
    for k in 1..200 {
        let t = f64::from(k) * config.time_step;
        let pos = p.position_at(t);
        assert!(pos.x.abs() < 1e-9);
        assert!((pos.y - (-100.0 * t + config.gravity * t * t / 2.0)).abs() < 1e-9);
    }
}

#[test]
fn test_self_hit_suppressed_by_default() {
    let field = TerrainField::from_surface(400, 300, |_| 250);
    let mut registry = Registry::new(&humans(2), &RosterConfig::default()).unwrap();
    registry.place(CombatantId(1), Point::new(200.0, 250.0)).unwrap();
    registry.place(CombatantId(2), Point::new(50.0, 250.0)).unwrap();

    let config = BallisticsConfig::default();
    let shot = Projectile::launch(CombatantId(1), Point::new(200.0, 250.0), 90.0, 50.0, &config);
    let outcome = simulate(shot.clone(), &config, &field, registry.as_slice());
    assert_eq!(outcome.impact.kind, ImpactKind::Terrain);

    let permissive = BallisticsConfig {
        allow_self_hit: true,
        ..config
    };
    let outcome = simulate(shot, &permissive, &field, registry.as_slice());
    assert_eq!(outcome.impact.kind, ImpactKind::Combatant(CombatantId(1)));
}

#[test]
fn test_alive_skip() {
    let mut registry = Registry::new(&humans(3), &RosterConfig::default()).unwrap();
    let mut turns = TurnSequencer::new();
    turns.start(&registry);
    registry.eliminate(CombatantId(2));
    turns.begin_firing().unwrap();
    assert_eq!(
        turns.conclude(&registry),
        TurnOutcome::Next {
            active: CombatantId(3),
            turn: 2
        }
    );
}

#[test]
fn test_game_over_with_no_survivors() {
    let mut registry = Registry::new(&humans(2), &RosterConfig::default()).unwrap();
    let mut turns = TurnSequencer::new();
    turns.start(&registry);
    registry.eliminate(CombatantId(1));
    registry.eliminate(CombatantId(2));
    assert_eq!(
        turns.conclude(&registry),
        TurnOutcome::GameOver { survivor: None }
    );
}

#[test]
fn test_cpu_match_reaches_game_over() {
    let mut duel = cpu_duel(3, 2024, 17);
    let mut turns = 0;
    while !duel.is_over() && turns < 500 {
        duel.run_cpu_turn().unwrap();
        turns += 1;
        if let Some(active) = duel.active() {
            assert!(duel.combatant(active).unwrap().alive);
        }
    }
    assert!(duel.is_over(), "CPU match did not finish in {turns} turns");
    assert!(duel.combatants().iter().filter(|c| c.alive).count() <= 1);
}

#[test]
fn test_rejected_commands_do_not_change_hash() {
    let mut duel = cpu_duel(2, 8, 8);
    let hash = duel.state_hash();
    assert!(duel.fire(CombatantId(2), 80.0, 80.0).is_err());
    assert!(duel.fire(CombatantId(9), 80.0, 80.0).is_err());
    assert!(duel.set_aim(CombatantId(2), 10.0, 10.0).is_err());
    assert_eq!(duel.state_hash(), hash);
}

#[test]
fn test_serialization_round_trip_mid_flight() {
    let mut duel = cpu_duel(2, 8, 8);
    duel.fire(CombatantId(1), 120.0, 90.0).unwrap();
    for _ in 0..40 {
        duel.tick(Duration::from_millis(16));
    }
    let restored = Duel::deserialize(&duel.serialize().unwrap()).unwrap();
    assert_eq!(restored.state_hash(), duel.state_hash());
    assert_eq!(restored.phase(), duel.phase());

    let mut original = duel;
    let mut restored = restored;
    let a = original.finish_flight();
    let b = restored.finish_flight();
    assert_eq!(a, b);
    assert_eq!(original.state_hash(), restored.state_hash());
}
