//! Property tests for the engine's invariants.

use proptest::prelude::*;
use scorch_core::combatants::Registry;
use scorch_core::prelude::*;
use scorch_core::turn::{TurnOutcome, TurnSequencer};
use scorch_test_utils::determinism::strategies::{
    arb_aims, arb_alive_mask, arb_erosions, arb_field_size, arb_seed,
};
use scorch_test_utils::fixtures::{humans, seeded_duel};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_terrain_is_a_pure_function_of_seed_and_size(
        seed in arb_seed(),
        (width, height) in arb_field_size(),
    ) {
        let a = TerrainField::generate(seed, width, height);
        let b = TerrainField::generate(seed, width, height);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.column_heights(), b.column_heights());
    }

    #[test]
    fn prop_surface_is_topmost_solid_row(
        seed in arb_seed(),
        (width, height) in arb_field_size(),
    ) {
        let field = TerrainField::generate(seed, width, height);
        for (x, top) in field.column_heights().into_iter().enumerate() {
            let x = x as i64;
            for y in 0..top {
                prop_assert!(!field.is_solid(x, i64::from(y)));
            }
            if top < height {
                prop_assert!(field.is_solid(x, i64::from(height) - 1));
            }
        }
    }

    #[test]
    fn prop_erosion_never_adds_mass(
        seed in arb_seed(),
        erosions in arb_erosions(240, 160, 12),
    ) {
        let original = TerrainField::generate(seed, 240, 160);
        let mut field = original.clone();
        let mut mass = field.solid_count();
        for (center, radius) in erosions {
            let before = field.clone();
            let cleared = field.erode(center, radius);
            prop_assert!(field.is_subset_of(&before));
            prop_assert_eq!(field.solid_count(), mass - u64::from(cleared));
            mass = field.solid_count();
        }
        prop_assert!(field.is_subset_of(&original));
    }

    #[test]
    fn prop_next_turn_goes_to_next_alive(
        alive in arb_alive_mask(),
        start in 0usize..4,
    ) {
        let n = alive.len();
        let mut registry = Registry::new(&humans(n as u32), &RosterConfig::default()).unwrap();
        let mut turns = TurnSequencer::new();
        turns.start(&registry);

        let start = start % n;
        turns.restore(TurnState { active_index: start, phase: Phase::Firing, turn: 1 });
        for (i, &is_alive) in alive.iter().enumerate() {
            if !is_alive {
                registry.eliminate(CombatantId(i as u32 + 1));
            }
        }

        let living: Vec<usize> = (0..n).filter(|&i| alive[i]).collect();
        match turns.conclude(&registry) {
            TurnOutcome::Next { active, .. } => {
                prop_assert!(living.len() >= 2);
                let expected = (1..=n).map(|s| (start + s) % n).find(|&i| alive[i]).unwrap();
                prop_assert_eq!(active, CombatantId(expected as u32 + 1));
                prop_assert_eq!(turns.phase(), Phase::Playing);
                prop_assert!(registry.get(active).unwrap().alive);
            }
            TurnOutcome::GameOver { survivor } => {
                prop_assert!(living.len() <= 1);
                prop_assert_eq!(survivor, living.first().map(|&i| CombatantId(i as u32 + 1)));
            }
        }
    }

    #[test]
    fn prop_played_duels_keep_their_invariants(
        seed in arb_seed(),
        rng_seed in any::<u64>(),
        players in 2u32..=4,
        aims in arb_aims(12),
    ) {
        let mut duel = seeded_duel(&humans(players), seed, rng_seed);
        let original = duel.terrain().clone();

        for (angle, power) in aims {
            if duel.is_over() {
                break;
            }
            let shooter = duel.active().unwrap();
            let alive_before = duel.combatants().iter().filter(|c| c.alive).count();
            let events = duel.fire_and_resolve(shooter, angle, power).unwrap();

            match &events[0] {
                MatchEvent::ShotFired { angle, power, .. } => {
                    prop_assert!((0.0..=180.0).contains(angle));
                    prop_assert!((20.0..=150.0).contains(power));
                }
                other => prop_assert!(false, "unexpected first event {:?}", other),
            }

            let alive_after = duel.combatants().iter().filter(|c| c.alive).count();
            prop_assert!(alive_before - alive_after <= 1);
            prop_assert!(duel.terrain().is_subset_of(&original));

            if let Some(active) = duel.active() {
                prop_assert_eq!(duel.phase(), Phase::Playing);
                prop_assert!(duel.combatant(active).unwrap().alive);
            } else {
                prop_assert_eq!(duel.phase(), Phase::GameOver);
                prop_assert!(alive_after <= 1);
            }
        }
    }
}
