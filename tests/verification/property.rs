//! Property-based tests for the generator, the integrator, replay and the turn machine.
//!
//! # Properties Tested
//!
//! ## Generator
//! - Same seed, same stream
//! - `next_int(min, max)` lies in `[min, max)` for a non-empty range
//!
//! ## Body
//! - A body never leaves `[radius, dimension - radius]` on either axis
//! - Normalizing yields a unit vector or zero
//! - Thrust magnitude is independent of the input magnitude
//!
//! ## Replay
//! - Replays are pure functions of `(seeds, logs)`
//! - A shot is a hit exactly when its impact radius is within the threshold
//! - Trajectories are index-aligned with their logs
//!
//! ## Turn machine
//! - `GameOver` is reachable from every state and never left
//! - Disallowed requests never change the state
//!
//! ## Decoding
//! - Arbitrary bytes never panic the decoder

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use lockstep_duel::replay::reconstruct_trajectory;
use lockstep_duel::telemetry::InvariantChecker;
use lockstep_duel::{
    compute_shots, replay_both, ArenaConfig, Body, MoveLog, PlayerMove, SeededRandom, Side,
    TurnState, TurnStateMachine, Vector2,
};
use proptest::prelude::*;

// ============================================================================
// Property Test Strategies
// ============================================================================

fn finite_coordinate() -> impl Strategy<Value = f64> {
    -2_000.0f64..2_000.0
}

fn player_move_strategy() -> impl Strategy<Value = PlayerMove> {
    prop_oneof![
        (finite_coordinate(), finite_coordinate())
            .prop_map(|(dx, dy)| PlayerMove::accelerate(dx, dy)),
        (0.0f64..800.0, 0.0f64..600.0).prop_map(|(x, y)| PlayerMove::shoot(x, y)),
    ]
}

fn log_strategy(max_len: usize) -> impl Strategy<Value = MoveLog> {
    (
        any::<u32>(),
        prop::collection::vec(player_move_strategy(), 0..max_len),
    )
        .prop_map(|(seed, moves)| {
            let mut log = MoveLog::new(seed);
            for mv in moves {
                log.push(mv).expect("strategy only yields finite moves");
            }
            log
        })
}

fn equal_length_logs(max_len: usize) -> impl Strategy<Value = (MoveLog, MoveLog)> {
    (0..max_len).prop_flat_map(|len| {
        let side = move || {
            (
                any::<u32>(),
                prop::collection::vec(player_move_strategy(), len),
            )
                .prop_map(|(seed, moves)| {
                    let mut log = MoveLog::new(seed);
                    for mv in moves {
                        log.push(mv).expect("finite");
                    }
                    log
                })
        };
        (side(), side())
    })
}

fn turn_state_strategy() -> impl Strategy<Value = TurnState> {
    prop::sample::select(TurnState::ALL.to_vec())
}

// ============================================================================
// Generator
// ============================================================================

proptest! {
    #[test]
    fn prop_same_seed_same_stream(seed in any::<u32>(), draws in 1usize..500) {
        let mut a = SeededRandom::new(seed);
        let mut b = SeededRandom::new(seed);
        for _ in 0..draws {
            prop_assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
        prop_assert_eq!(a.state(), b.state());
    }

    #[test]
    fn prop_next_int_in_range(seed in any::<u32>(), min in -10_000i64..10_000, span in 1i64..10_000) {
        let mut rng = SeededRandom::new(seed);
        for _ in 0..32 {
            let value = rng.next_int(min, min + span);
            prop_assert!(value >= min && value < min + span, "{} not in [{}, {})", value, min, min + span);
        }
    }

    #[test]
    fn prop_next_f64_in_unit_interval(seed in any::<u32>()) {
        let mut rng = SeededRandom::new(seed);
        let value = rng.next_f64();
        prop_assert!((0.0..1.0).contains(&value));
    }
}

// ============================================================================
// Body
// ============================================================================

proptest! {
    #[test]
    fn prop_body_never_leaves_arena(
        seed in any::<u32>(),
        thrusts in prop::collection::vec((finite_coordinate(), finite_coordinate()), 1..200),
    ) {
        let arena = ArenaConfig::default();
        let mut body = Body::from_seed(seed, Side::A, &arena);
        prop_assert!(body.is_within(&arena));
        for (dx, dy) in thrusts {
            body.update(Vector2::new(dx, dy), &arena);
            let check = body.in_arena(&arena).check_invariants();
            prop_assert!(check.is_ok(), "{:?}", check.err());
        }
    }

    #[test]
    fn prop_normalize_is_unit_or_zero(x in finite_coordinate(), y in finite_coordinate()) {
        let v = Vector2::new(x, y).normalize();
        if x == 0.0 && y == 0.0 {
            prop_assert_eq!(v, Vector2::ZERO);
        } else {
            prop_assert!((v.length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn prop_thrust_magnitude_is_fixed(
        seed in any::<u32>(),
        dx in finite_coordinate(),
        dy in finite_coordinate(),
    ) {
        prop_assume!(dx != 0.0 || dy != 0.0);
        // A large arena keeps the step away from every wall
        let arena = ArenaConfig { width: 100_000, height: 100_000, ..ArenaConfig::default() };
        let mut body = Body::from_seed(seed, Side::B, &arena);
        let before = body.velocity;
        body.update(Vector2::new(dx, dy), &arena);
        let gained = (body.velocity - before).length();
        prop_assert!((gained - arena.max_acceleration).abs() < 1e-9, "gained {}", gained);
    }
}

// ============================================================================
// Replay
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_replay_is_pure((a, b) in equal_length_logs(60)) {
        let arena = ArenaConfig::default();
        let first = replay_both(&a, &b, &arena).unwrap();
        let second = replay_both(&a, &b, &arena).unwrap();
        prop_assert_eq!(first.checksums, second.checksums);
        prop_assert_eq!(first.winner, second.winner);
        prop_assert_eq!(first.a, second.a);
        prop_assert_eq!(first.b, second.b);
    }

    #[test]
    fn prop_hit_iff_within_threshold((a, b) in equal_length_logs(60)) {
        let arena = ArenaConfig::default();
        let outcome = compute_shots(&a, &b, Side::A, &arena);
        let first = outcome.shots.iter().position(|s| s.impact_radius <= arena.hit_threshold);
        prop_assert_eq!(outcome.first_hit, first);
        prop_assert!(outcome.unmatched_shots.is_empty());
    }

    #[test]
    fn prop_trajectory_index_aligned(log in log_strategy(80)) {
        let arena = ArenaConfig::default();
        let (positions, body) = reconstruct_trajectory(&log, Side::A, &arena);
        prop_assert_eq!(positions.len(), log.len());
        prop_assert_eq!(positions.last().copied(), Some(body.position));
        prop_assert_eq!(positions[0], Body::from_seed(log.seed(), Side::A, &arena).position);
    }

    #[test]
    fn prop_winner_prefers_side_a((a, b) in equal_length_logs(40)) {
        let verdict = replay_both(&a, &b, &ArenaConfig::default()).unwrap();
        let expected = if verdict.a.is_hit() {
            Some(Side::A)
        } else if verdict.b.is_hit() {
            Some(Side::B)
        } else {
            None
        };
        prop_assert_eq!(verdict.winner, expected);
    }
}

// ============================================================================
// Turn machine
// ============================================================================

proptest! {
    #[test]
    fn prop_gameover_closure(requests in prop::collection::vec(turn_state_strategy(), 0..50)) {
        let mut machine = TurnStateMachine::new();
        for request in requests {
            machine.transition(request);
        }
        let before_over = machine.state();
        prop_assert!(machine.transition(TurnState::GameOver) || before_over == TurnState::GameOver);
        for next in TurnState::ALL {
            prop_assert!(!machine.transition(next));
            prop_assert_eq!(machine.state(), TurnState::GameOver);
        }
    }

    #[test]
    fn prop_disallowed_requests_are_no_ops(requests in prop::collection::vec(turn_state_strategy(), 0..100)) {
        let mut machine = TurnStateMachine::new();
        for request in requests {
            let from = machine.state();
            let allowed = from.can_transition_to(request);
            prop_assert_eq!(machine.transition(request), allowed);
            let expected = if allowed { request } else { from };
            prop_assert_eq!(machine.state(), expected);
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

proptest! {
    #[test]
    fn prop_decode_arbitrary_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(log) = MoveLog::decode(&bytes) {
            // Anything accepted must be a valid log
            prop_assert!(!log.is_empty());
            prop_assert!(log.iter().all(|mv| mv.is_finite()));
        }
    }
}
