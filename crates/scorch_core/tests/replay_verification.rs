//! Replays recorded from live duels re-derive the same final state.

use std::time::Duration;

use scorch_core::prelude::*;
use scorch_test_utils::determinism::play_turn;
use scorch_test_utils::fixtures::cpu_duel;

#[test]
fn test_cpu_match_replay_reproduces_final_hash() {
    let mut duel = cpu_duel(4, 4242, 1);
    for _ in 0..40 {
        play_turn(&mut duel);
    }

    let replay = Replay::from_duel(&duel);
    let mut player = ReplayPlayer::new(replay).unwrap();
    assert_eq!(player.verify().unwrap(), duel.state_hash());
}

#[test]
fn test_frame_driven_match_replays_without_pacing() {
    let mut duel = cpu_duel(2, 99, 5);
    for _ in 0..200_000 {
        duel.tick(Duration::from_millis(16));
        if duel.is_over() || duel.shots().count() >= 6 {
            break;
        }
    }
    // Settle any shell still in flight so the hash reflects every shot.
    duel.finish_flight();

    let mut player = ReplayPlayer::new(Replay::from_duel(&duel)).unwrap();
    assert_eq!(player.verify().unwrap(), duel.state_hash());
    assert_eq!(player.duel().turn(), duel.turn());
}

#[test]
fn test_resize_mid_flight_still_verifies() {
    let mut duel = cpu_duel(2, 99, 5);
    for _ in 0..1_000 {
        duel.tick(Duration::from_millis(16));
        if duel.phase() == Phase::Firing {
            break;
        }
    }
    assert_eq!(duel.phase(), Phase::Firing);
    for _ in 0..20 {
        duel.tick(Duration::from_millis(16));
    }

    duel.resize(640, 320).unwrap();
    assert_eq!(duel.terrain().width(), 800);
    duel.finish_flight();
    assert_eq!(duel.terrain().width(), 640);
    assert!(matches!(
        duel.history(),
        [RecordedCommand::Fire(_), RecordedCommand::Resize { width: 640, height: 320 }]
    ));

    let mut player = ReplayPlayer::new(Replay::from_duel(&duel)).unwrap();
    assert_eq!(player.verify().unwrap(), duel.state_hash());
}

#[test]
fn test_replay_file_round_trip_still_verifies() {
    let mut duel = cpu_duel(3, 12, 12);
    for _ in 0..10 {
        play_turn(&mut duel);
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duel.replay");
    Replay::from_duel(&duel).save(&path).unwrap();

    let mut player = ReplayPlayer::new(Replay::load(&path).unwrap()).unwrap();
    assert!(player.verify().is_ok());
}

#[test]
fn test_replay_of_other_seed_diverges() {
    let mut duel = cpu_duel(2, 1, 1);
    for _ in 0..4 {
        play_turn(&mut duel);
    }
    let mut replay = Replay::from_duel(&duel);
    replay.seed = 2;

    let result = ReplayPlayer::new(replay).and_then(|mut player| player.verify());
    assert!(result.is_err());
}
