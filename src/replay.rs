//! Trajectory reconstruction and shot resolution.
//!
//! No peer ever sends its body's state. Instead each side rebuilds the opponent's whole
//! trajectory from `(seed, move log)` on every sync and measures its own shots against the
//! positions the opponent had at the index each shot was fired:
//!
//! ```text
//! opponent log:  Init(s)    Accelerate  Shoot   Accelerate
//! positions:     p0         p1          p2      p3
//! own log:       Init(t)    Shoot ──────────────────────▶ |target - p1|
//! ```
//!
//! Every function here is a pure function of its arguments. Two peers holding the same two
//! logs and the same [`ArenaConfig`] compute bit-identical results, which is what lets them
//! agree on hits without exchanging state.

use crate::body::Body;
use crate::checksum::{trajectory_checksum, ChecksumError, SyncChecksums};
use crate::move_log::{Move, MoveLog};
use crate::rng::SeededRandom;
use crate::vector::Vector2;
use crate::{ArenaConfig, DuelResult, MoveLogErrorKind, Side};

/// A resolved shot: where it was aimed and how far it landed from the opponent.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shot {
    /// The fired-at point.
    pub center: Vector2,
    /// Distance from `center` to the opponent's reconstructed position at the same index.
    pub impact_radius: f64,
    /// Index of the `Shoot` entry in the shooter's log.
    pub index: usize,
}

impl Shot {
    /// A shot is a hit when `impact_radius <= threshold`; the boundary itself counts.
    #[inline]
    #[must_use]
    pub fn is_hit(&self, threshold: f64) -> bool {
        self.impact_radius <= threshold
    }

    /// A uniformly chosen angle on the circle of radius `impact_radius` around `center`.
    ///
    /// Consumes one value from `rng`.
    pub fn random_point(&self, rng: &mut SeededRandom) -> Vector2 {
        let angle = rng.next_f64() * std::f64::consts::TAU;
        Vector2::new(
            self.center.x + angle.cos() * self.impact_radius,
            self.center.y + angle.sin() * self.impact_radius,
        )
    }

    /// [`Shot::random_point`] clamped to `[0, width] x [0, height]`.
    pub fn random_point_in_bounds(&self, rng: &mut SeededRandom, arena: &ArenaConfig) -> Vector2 {
        let point = self.random_point(rng);
        Vector2::new(
            point.x.clamp(0.0, arena.width_f64()),
            point.y.clamp(0.0, arena.height_f64()),
        )
    }
}

/// Result of replaying one perspective.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    /// The side whose shots were resolved.
    pub perspective: Side,
    /// Resolved shots in log order.
    pub shots: Vec<Shot>,
    /// Opponent position after each opponent log entry, index-aligned with that log.
    pub opponent_positions: Vec<Vector2>,
    /// The opponent's body after its final entry.
    pub opponent_body: Body,
    /// Own `Shoot` indices the opponent log does not reach. Always empty when both logs have
    /// the same length.
    pub unmatched_shots: Vec<usize>,
    /// Index into `shots` of the first hit, if any.
    pub first_hit: Option<usize>,
}

impl ReplayOutcome {
    /// True when any shot hit.
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        self.first_hit.is_some()
    }

    /// The first hitting shot.
    #[must_use]
    pub fn hitting_shot(&self) -> Option<&Shot> {
        self.first_hit.and_then(|i| self.shots.get(i))
    }

    /// Checksum of the reconstructed opponent trajectory.
    pub fn trajectory_checksum(&self) -> Result<u128, ChecksumError> {
        trajectory_checksum(&self.opponent_positions)
    }
}

/// Rebuilds `side`'s trajectory from its log alone.
///
/// Returns the position after every entry (index 0 is the spawn position) and the final body.
pub fn reconstruct_trajectory(
    log: &MoveLog,
    side: Side,
    arena: &ArenaConfig,
) -> (Vec<Vector2>, Body) {
    let mut rng = SeededRandom::new(log.seed());
    let mut body = Body::spawn(&mut rng, side, arena);
    let mut positions = Vec::with_capacity(log.len());

    for mv in log {
        match mv {
            // Index 0; the body was spawned from this seed above
            Move::Init { .. } => {},
            Move::Accelerate { .. } | Move::Shoot { .. } => body.update(mv.thrust(), arena),
        }
        positions.push(body.position);
    }

    (positions, body)
}

/// Resolves every `Shoot` in `own` against the opponent trajectory rebuilt from `opponent`.
///
/// `perspective` is the side that owns `own`. The result is recomputed from scratch on each
/// call; nothing is carried over from previous syncs.
pub fn compute_shots(
    own: &MoveLog,
    opponent: &MoveLog,
    perspective: Side,
    arena: &ArenaConfig,
) -> ReplayOutcome {
    let (opponent_positions, opponent_body) =
        reconstruct_trajectory(opponent, perspective.opponent(), arena);

    let mut shots = Vec::new();
    let mut unmatched_shots = Vec::new();
    let mut first_hit = None;

    for (index, mv) in own.iter().enumerate() {
        let Some(center) = mv.target() else {
            continue;
        };
        let Some(&position) = opponent_positions.get(index) else {
            unmatched_shots.push(index);
            continue;
        };
        let shot = Shot {
            center,
            impact_radius: center.distance(position),
            index,
        };
        if first_hit.is_none() && shot.is_hit(arena.hit_threshold) {
            first_hit = Some(shots.len());
        }
        shots.push(shot);
    }

    ReplayOutcome {
        perspective,
        shots,
        opponent_positions,
        opponent_body,
        unmatched_shots,
        first_hit,
    }
}

/// Both perspectives of one match state, replayed A first.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchVerdict {
    /// Side A's shots judged against B's trajectory.
    pub a: ReplayOutcome,
    /// Side B's shots judged against A's trajectory.
    pub b: ReplayOutcome,
    /// First side with a hit in replay order, so A wins a simultaneous hit.
    pub winner: Option<Side>,
    /// Checksums of both reconstructed trajectories.
    pub checksums: SyncChecksums,
}

impl MatchVerdict {
    /// Outcome for `side`'s perspective.
    #[must_use]
    pub const fn outcome(&self, side: Side) -> &ReplayOutcome {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    /// `side`'s final body as reconstructed by the opponent's perspective.
    #[must_use]
    pub const fn body(&self, side: Side) -> &Body {
        &self.outcome(side.opponent()).opponent_body
    }
}

/// Replays both perspectives in fixed order and decides the winner.
pub fn replay_both(
    log_a: &MoveLog,
    log_b: &MoveLog,
    arena: &ArenaConfig,
) -> Result<MatchVerdict, ChecksumError> {
    let a = compute_shots(log_a, log_b, Side::A, arena);
    let b = compute_shots(log_b, log_a, Side::B, arena);

    let winner = if a.is_hit() {
        Some(Side::A)
    } else if b.is_hit() {
        Some(Side::B)
    } else {
        None
    };

    // A's perspective rebuilt B's trajectory and vice versa
    let checksums = SyncChecksums {
        a: b.trajectory_checksum()?,
        b: a.trajectory_checksum()?,
    };

    Ok(MatchVerdict {
        a,
        b,
        winner,
        checksums,
    })
}

/// Audits a whole match from its two logs, without trusting either side's claims.
///
/// # Errors
///
/// [`MoveLogErrorKind::LengthMismatch`] when the logs differ in length: in lockstep every
/// sync appends exactly one entry to each side, so unequal logs cannot come from one match.
pub fn verify_match(
    log_a: &MoveLog,
    log_b: &MoveLog,
    arena: &ArenaConfig,
) -> DuelResult<MatchVerdict> {
    if log_a.len() != log_b.len() {
        return Err(MoveLogErrorKind::LengthMismatch {
            a: log_a.len(),
            b: log_b.len(),
        }
        .into());
    }
    arena.validate()?;
    Ok(replay_both(log_a, log_b, arena)?)
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::{DuelError, PlayerMove};

    fn arena() -> ArenaConfig {
        ArenaConfig::default()
    }

    // Seed 1 spawns at (194, 224) with velocity (25, 35)
    const SEED_ONE_SPAWN: Vector2 = Vector2::new(194.0, 224.0);

    #[test]
    fn empty_logs_give_spawn_positions_and_no_shots() {
        let a = MoveLog::new(1);
        let b = MoveLog::new(2);
        let outcome = compute_shots(&b, &a, Side::B, &arena());
        assert!(outcome.shots.is_empty());
        assert_eq!(outcome.opponent_positions, vec![SEED_ONE_SPAWN]);
        assert_eq!(outcome.opponent_body, Body::from_seed(1, Side::A, &arena()));
        assert!(!outcome.is_hit());
    }

    #[test]
    fn trajectory_is_index_aligned() {
        let mut log = MoveLog::new(1);
        log.push(PlayerMove::shoot(0.0, 0.0)).unwrap();
        log.push(PlayerMove::accelerate(0.0, 0.0)).unwrap();
        let (positions, body) = reconstruct_trajectory(&log, Side::A, &arena());
        assert_eq!(positions.len(), log.len());
        assert_eq!(positions[0], SEED_ONE_SPAWN);
        assert_eq!(positions[1], Vector2::new(219.0, 259.0));
        assert_eq!(positions[2], Vector2::new(244.0, 294.0));
        assert_eq!(body.position, positions[2]);
        assert_eq!(body.side, Side::A);
    }

    #[test]
    fn exact_hit_and_first_hit_index() {
        // B coasts one step from (194, 224) to (219, 259)
        let mut b = MoveLog::new(1);
        b.push(PlayerMove::accelerate(0.0, 0.0)).unwrap();
        b.push(PlayerMove::accelerate(0.0, 0.0)).unwrap();
        let mut a = MoveLog::new(2);
        a.push(PlayerMove::shoot(219.0, 259.0)).unwrap();
        a.push(PlayerMove::shoot(244.0, 294.0)).unwrap();

        let outcome = compute_shots(&a, &b, Side::A, &arena());
        assert_eq!(outcome.shots.len(), 2);
        assert_eq!(outcome.shots[0].impact_radius, 0.0);
        assert_eq!(outcome.shots[0].index, 1);
        assert_eq!(outcome.first_hit, Some(0));
        assert_eq!(outcome.hitting_shot().map(|s| s.index), Some(1));
    }

    #[test]
    fn hit_threshold_is_inclusive() {
        let shot = Shot {
            center: Vector2::ZERO,
            impact_radius: 10.0,
            index: 1,
        };
        assert!(shot.is_hit(10.0));
        let miss = Shot {
            impact_radius: 10.0001,
            ..shot
        };
        assert!(!miss.is_hit(10.0));
    }

    #[test]
    fn unmatched_shots_are_skipped() {
        let b = MoveLog::new(1);
        let mut a = MoveLog::new(2);
        a.push(PlayerMove::shoot(SEED_ONE_SPAWN.x, SEED_ONE_SPAWN.y))
            .unwrap();
        let outcome = compute_shots(&a, &b, Side::A, &arena());
        assert!(outcome.shots.is_empty());
        assert_eq!(outcome.unmatched_shots, vec![1]);
        assert!(!outcome.is_hit());
    }

    #[test]
    fn random_point_lies_on_circle() {
        let shot = Shot {
            center: Vector2::new(400.0, 300.0),
            impact_radius: 50.0,
            index: 1,
        };
        let mut rng = SeededRandom::new(3);
        for _ in 0..100 {
            let p = shot.random_point(&mut rng);
            assert!((p.distance(shot.center) - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn random_point_in_bounds_is_clamped() {
        let shot = Shot {
            center: Vector2::new(5.0, 595.0),
            impact_radius: 500.0,
            index: 1,
        };
        let arena = arena();
        let mut rng = SeededRandom::new(11);
        for _ in 0..200 {
            let p = shot.random_point_in_bounds(&mut rng, &arena);
            assert!((0.0..=800.0).contains(&p.x));
            assert!((0.0..=600.0).contains(&p.y));
        }
    }

    #[test]
    fn replay_both_prefers_side_a_on_simultaneous_hit() {
        let a_spawn = Body::from_seed(1, Side::A, &arena());
        let b_spawn = Body::from_seed(2, Side::B, &arena());
        let a_next = a_spawn.position + a_spawn.velocity;
        let b_next = b_spawn.position + b_spawn.velocity;

        let mut a = MoveLog::new(1);
        a.push(PlayerMove::shoot(b_next.x, b_next.y)).unwrap();
        let mut b = MoveLog::new(2);
        b.push(PlayerMove::shoot(a_next.x, a_next.y)).unwrap();

        let verdict = replay_both(&a, &b, &arena()).unwrap();
        assert!(verdict.a.is_hit());
        assert!(verdict.b.is_hit());
        assert_eq!(verdict.winner, Some(Side::A));
        assert_eq!(verdict.body(Side::A).position, a_next);
        assert_eq!(verdict.body(Side::B).position, b_next);
    }

    #[test]
    fn verify_match_rejects_unequal_logs() {
        let a = MoveLog::new(1);
        let mut b = MoveLog::new(2);
        b.push(PlayerMove::accelerate(1.0, 1.0)).unwrap();
        let err = verify_match(&a, &b, &arena()).unwrap_err();
        assert_eq!(
            err,
            DuelError::InvalidMoveLog {
                kind: MoveLogErrorKind::LengthMismatch { a: 1, b: 2 }
            }
        );
    }

    #[test]
    fn verify_match_rejects_invalid_arena() {
        let bad = ArenaConfig {
            width: 0,
            ..ArenaConfig::default()
        };
        let err = verify_match(&MoveLog::new(1), &MoveLog::new(2), &bad).unwrap_err();
        assert!(matches!(err, DuelError::InvalidConfig { field: "width", .. }));
    }

    #[test]
    fn checksums_track_the_right_side() {
        let a = MoveLog::new(1);
        let b = MoveLog::new(2);
        let verdict = verify_match(&a, &b, &arena()).unwrap();
        let (a_path, _) = reconstruct_trajectory(&a, Side::A, &arena());
        assert_eq!(verdict.checksums.a, trajectory_checksum(&a_path).unwrap());
        assert_eq!(verdict.checksums.get(Side::A), verdict.checksums.a);
    }
}
