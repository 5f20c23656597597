//! Session flow: transitions, confirmations, syncs and the renderer snapshot.

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

mod common;

use common::{collecting_session, play_turn, scripted_session, SPAWN_A};
use lockstep_duel::telemetry::ViolationKind;
use lockstep_duel::{
    assert_no_violations, DesyncDetection, MoveKind, PlayerMove, ScriptedPeer, SessionBuilder,
    Side, Turn, TurnState, Vector2,
};

#[test]
fn test_prompt_to_sync_requires_an_aiming_state() {
    let mut session = scripted_session(vec![]);
    assert!(!session.request_transition(TurnState::Sync));
    assert_eq!(session.state(), TurnState::Prompt);

    assert!(session.request_transition(TurnState::Accelerate));
    assert!(session.request_transition(TurnState::Sync));
    assert_eq!(session.state(), TurnState::Sync);
}

#[test]
fn test_manual_sync_via_update() {
    let mut session = scripted_session(vec![PlayerMove::accelerate(0.0, 0.0)]);
    session.request_transition(TurnState::Shoot);
    session.request_transition(TurnState::Sync);

    let report = session.update(PlayerMove::shoot(1.0, 1.0)).unwrap();
    assert_eq!(report.turn, Turn::new(1));
    assert_eq!(session.state(), TurnState::Prompt);
    assert!(session.update(PlayerMove::shoot(1.0, 1.0)).is_none());
}

#[test]
fn test_manual_sync_rejects_kind_other_than_aimed() {
    let mut session = scripted_session(vec![PlayerMove::accelerate(0.0, 0.0)]);
    session.request_transition(TurnState::Shoot);
    session.request_transition(TurnState::Sync);

    assert!(session.update(PlayerMove::accelerate(1.0, 0.0)).is_none());
    assert_eq!(session.state(), TurnState::Sync);
    assert_eq!(session.turn(), Turn::ZERO);
    assert_eq!(session.log(Side::A).len(), 1);
    assert_eq!(session.log(Side::B).len(), 1);

    session.update(PlayerMove::shoot(1.0, 1.0)).unwrap();
    assert_eq!(
        session.log(Side::A).last().map(|mv| mv.kind()),
        Some(MoveKind::Shoot)
    );

    // The aimed kind is per sync: the next round accepts only Accelerate
    session.request_transition(TurnState::Accelerate);
    session.request_transition(TurnState::Sync);
    assert!(session.update(PlayerMove::shoot(1.0, 1.0)).is_none());
    assert!(session.update(PlayerMove::accelerate(1.0, 0.0)).is_some());
    assert_eq!(session.turn(), Turn::new(2));
}

#[test]
fn test_analyze_then_shoot() {
    let mut session = scripted_session(vec![]);
    assert!(session.request_transition(TurnState::Analyze));
    assert!(session
        .confirm(PlayerMove::shoot(100.0, 100.0))
        .is_none());
    assert!(session.request_transition(TurnState::Shoot));
    assert!(session.confirm(PlayerMove::shoot(100.0, 100.0)).is_some());
}

#[test]
fn test_switch_between_aiming_states() {
    let mut session = scripted_session(vec![]);
    session.request_transition(TurnState::Accelerate);
    assert!(session.request_transition(TurnState::Shoot));
    assert!(session
        .confirm(PlayerMove::accelerate(1.0, 1.0))
        .is_none());
    assert!(session.request_transition(TurnState::Accelerate));
    let report = session.confirm(PlayerMove::accelerate(1.0, 1.0)).unwrap();
    assert_eq!(report.local_move.kind(), MoveKind::Accelerate);
}

#[test]
fn test_accelerate_moves_local_body() {
    let mut session = scripted_session(vec![]);
    play_turn(&mut session, PlayerMove::accelerate(1.0, 0.0)).unwrap();

    // Thrust is always max_acceleration: pos += vel + 0.5 * (25, 0)
    let body = session.body(Side::A);
    assert_eq!(body.position, Vector2::new(231.5, 259.0));
    assert_eq!(body.velocity, Vector2::new(50.0, 35.0));
}

#[test]
fn test_aim_from_pointer_round_trip() {
    let mut session = scripted_session(vec![]);
    let pointer = SPAWN_A + Vector2::new(0.0, -5.0);
    let mv = session.aim_from_pointer(pointer);
    assert_eq!(mv, PlayerMove::accelerate(0.0, -5.0));

    play_turn(&mut session, mv).unwrap();
    // Straight up at full thrust: vy = 35 - 25
    assert_eq!(session.body(Side::A).velocity, Vector2::new(25.0, 10.0));
}

#[test]
fn test_gameover_is_absorbing() {
    let mut session = scripted_session(vec![]);
    session.request_transition(TurnState::Shoot);
    assert!(session.request_transition(TurnState::GameOver));
    for state in [
        TurnState::Prompt,
        TurnState::Accelerate,
        TurnState::Shoot,
        TurnState::Analyze,
        TurnState::Sync,
        TurnState::GameOver,
    ] {
        assert!(!session.request_transition(state));
    }
    assert!(session.confirm(PlayerMove::shoot(0.0, 0.0)).is_none());
    assert!(session.update(PlayerMove::shoot(0.0, 0.0)).is_none());
    assert_eq!(session.turn(), Turn::ZERO);
}

#[test]
fn test_turn_counts_non_init_entries() {
    let mut session = scripted_session(vec![]);
    for i in 1..=5u32 {
        let report = play_turn(&mut session, PlayerMove::accelerate(0.0, 1.0)).unwrap();
        assert_eq!(report.turn.as_u32(), i);
        assert_eq!(session.log(Side::A).turns(), i as usize);
        assert_eq!(session.log(Side::B).turns(), i as usize);
    }
}

#[test]
fn test_shots_are_index_aligned_with_log() {
    let mut session = scripted_session(vec![
        PlayerMove::shoot(0.0, 0.0),
        PlayerMove::accelerate(1.0, 0.0),
        PlayerMove::shoot(0.0, 0.0),
    ]);
    play_turn(&mut session, PlayerMove::accelerate(0.0, 1.0)).unwrap();
    play_turn(&mut session, PlayerMove::shoot(799.0, 1.0)).unwrap();
    play_turn(&mut session, PlayerMove::accelerate(0.0, 1.0)).unwrap();

    let indices: Vec<usize> = session.shots(Side::B).iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![1, 3]);
    let own: Vec<usize> = session.shots(Side::A).iter().map(|s| s.index).collect();
    assert_eq!(own, vec![2]);
}

#[test]
fn test_local_side_b_is_fed_by_peer_as_a() {
    let mut session = SessionBuilder::new()
        .with_seeds(1, 2)
        .with_local_side(Side::B)
        .with_peer(Box::new(ScriptedPeer::new(vec![PlayerMove::shoot(
            5.0, 5.0,
        )])))
        .start_session()
        .unwrap();
    let report = play_turn(&mut session, PlayerMove::accelerate(1.0, 1.0)).unwrap();

    assert_eq!(report.peer_move, PlayerMove::shoot(5.0, 5.0));
    assert_eq!(session.log(Side::A).last().unwrap().kind(), MoveKind::Shoot);
    assert_eq!(
        session.log(Side::B).last().unwrap().kind(),
        MoveKind::Accelerate
    );
}

#[test]
fn test_clean_match_reports_no_violations() {
    let (mut session, observer) = collecting_session(vec![
        PlayerMove::accelerate(-1.0, 0.0),
        PlayerMove::shoot(10.0, 10.0),
    ]);
    play_turn(&mut session, PlayerMove::shoot(790.0, 590.0)).unwrap();
    play_turn(&mut session, PlayerMove::accelerate(1.0, 1.0)).unwrap();
    assert_no_violations!(observer);
}

#[test]
fn test_remote_checksum_mismatch_is_reported() {
    let (mut session, observer) = collecting_session(vec![]);
    let report = play_turn(&mut session, PlayerMove::accelerate(1.0, 0.0)).unwrap();

    let mut remote = report.checksums;
    remote.a = remote.a.wrapping_add(1);
    assert!(session.verify_remote_checksums(report.turn, remote).is_err());
    lockstep_duel::assert_violation!(observer, ViolationKind::Determinism);
}

#[test]
fn test_desync_detection_off_still_syncs() {
    let mut session = SessionBuilder::new()
        .with_seeds(1, 2)
        .with_peer(Box::new(ScriptedPeer::default()))
        .with_desync_detection(DesyncDetection::Off)
        .start_session()
        .unwrap();
    let report = play_turn(&mut session, PlayerMove::accelerate(0.0, 1.0)).unwrap();
    assert_eq!(session.checksums(report.turn), Some(report.checksums));
}

#[test]
fn test_snapshot_is_detached_from_session() {
    let mut session = scripted_session(vec![]);
    let before = session.snapshot();
    play_turn(&mut session, PlayerMove::shoot(1.0, 1.0)).unwrap();
    let after = session.snapshot();

    assert_eq!(before.turn, Turn::ZERO);
    assert_eq!(after.turn, Turn::new(1));
    assert!(before.shots(Side::A).is_empty());
    assert_eq!(after.shots(Side::A).len(), 1);
}
