//! Metamorphic testing for replay.
//!
//! These tests check relationships between two replays rather than exact positions.
//!
//! # Test Categories
//!
//! 1. **Prefix stability**: appending moves never changes earlier positions
//! 2. **Magnitude invariance**: scaling a thrust by a power of two leaves the trajectory
//!    bit-identical
//! 3. **Coasting equivalence**: a `Shoot` moves a body exactly like a zero `Accelerate`
//! 4. **Perspective symmetry**: the trajectory seen by the opponent is the owner's own

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use lockstep_duel::replay::reconstruct_trajectory;
use lockstep_duel::{compute_shots, ArenaConfig, MoveLog, PlayerMove, Side, Vector2};
use proptest::prelude::*;

fn thrust_strategy() -> impl Strategy<Value = (f64, f64)> {
    (-500.0f64..500.0, -500.0f64..500.0)
}

fn log_from(seed: u32, moves: &[PlayerMove]) -> MoveLog {
    let mut log = MoveLog::new(seed);
    for &mv in moves {
        log.push(mv).unwrap();
    }
    log
}

fn bits(path: &[Vector2]) -> Vec<(u64, u64)> {
    path.iter().map(|p| (p.x.to_bits(), p.y.to_bits())).collect()
}

proptest! {
    #[test]
    fn meta_appending_keeps_prefix(
        seed in any::<u32>(),
        prefix in prop::collection::vec(thrust_strategy(), 0..40),
        suffix in prop::collection::vec(thrust_strategy(), 1..40),
    ) {
        let arena = ArenaConfig::default();
        let short: Vec<PlayerMove> = prefix.iter().map(|&(x, y)| PlayerMove::accelerate(x, y)).collect();
        let mut long = short.clone();
        long.extend(suffix.iter().map(|&(x, y)| PlayerMove::accelerate(x, y)));

        let (short_path, _) = reconstruct_trajectory(&log_from(seed, &short), Side::A, &arena);
        let (long_path, _) = reconstruct_trajectory(&log_from(seed, &long), Side::A, &arena);
        prop_assert_eq!(bits(&short_path), bits(&long_path[..short_path.len()]));
    }

    #[test]
    fn meta_power_of_two_scaling_is_invisible(
        seed in any::<u32>(),
        thrusts in prop::collection::vec(thrust_strategy(), 1..40),
        exponent in -8i32..8,
    ) {
        let arena = ArenaConfig::default();
        let factor = 2f64.powi(exponent);
        let plain: Vec<PlayerMove> = thrusts.iter().map(|&(x, y)| PlayerMove::accelerate(x, y)).collect();
        let scaled: Vec<PlayerMove> = thrusts
            .iter()
            .map(|&(x, y)| PlayerMove::accelerate(x * factor, y * factor))
            .collect();

        let (a, _) = reconstruct_trajectory(&log_from(seed, &plain), Side::B, &arena);
        let (b, _) = reconstruct_trajectory(&log_from(seed, &scaled), Side::B, &arena);
        prop_assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn meta_shoot_coasts_like_zero_thrust(
        seed in any::<u32>(),
        pattern in prop::collection::vec(any::<bool>(), 1..60),
    ) {
        let arena = ArenaConfig::default();
        let with_shots: Vec<PlayerMove> = pattern
            .iter()
            .map(|&shoot| if shoot { PlayerMove::shoot(400.0, 300.0) } else { PlayerMove::accelerate(0.0, 0.0) })
            .collect();
        let coasting = vec![PlayerMove::accelerate(0.0, 0.0); pattern.len()];

        let (a, _) = reconstruct_trajectory(&log_from(seed, &with_shots), Side::A, &arena);
        let (b, _) = reconstruct_trajectory(&log_from(seed, &coasting), Side::A, &arena);
        prop_assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn meta_opponent_sees_owner_trajectory(
        seeds in (any::<u32>(), any::<u32>()),
        thrusts in prop::collection::vec(thrust_strategy(), 0..40),
    ) {
        let arena = ArenaConfig::default();
        let moves: Vec<PlayerMove> = thrusts.iter().map(|&(x, y)| PlayerMove::accelerate(x, y)).collect();
        let owner = log_from(seeds.0, &moves);
        let observer = log_from(seeds.1, &vec![PlayerMove::shoot(0.0, 0.0); moves.len()]);

        let (own_path, own_body) = reconstruct_trajectory(&owner, Side::A, &arena);
        let outcome = compute_shots(&observer, &owner, Side::B, &arena);
        prop_assert_eq!(bits(&own_path), bits(&outcome.opponent_positions));
        prop_assert_eq!(own_body, outcome.opponent_body);
    }
}
