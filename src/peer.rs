//! Sources for the remote side's moves.
//!
//! A [`GameSession`](crate::GameSession) asks its [`PeerMoveSource`] for exactly one move per
//! sync. The core never looks at where the move came from: a network client, a recorded log
//! played back by [`ScriptedPeer`], or the built-in pseudo-opponent [`RandomPeer`] all plug in
//! the same way.
//!
//! ```
//! use lockstep_duel::{ArenaConfig, MoveLog, PeerMoveSource, PeerView, RandomPeer, Side};
//!
//! let arena = ArenaConfig::default();
//! let own = MoveLog::new(2);
//! let opponent = MoveLog::new(1);
//! let view = PeerView {
//!     side: Side::B,
//!     own_log: &own,
//!     opponent_log: &opponent,
//!     last_shot: None,
//!     arena: &arena,
//! };
//!
//! let mut a = RandomPeer::new(99);
//! let mut b = RandomPeer::new(99);
//! assert_eq!(a.produce_next_move(&view), b.produce_next_move(&view));
//! ```

use std::collections::VecDeque;

use tracing::trace;

use crate::move_log::{MoveLog, PlayerMove};
use crate::replay::Shot;
use crate::rng::{random_seed, SeededRandom};
use crate::{ArenaConfig, Side};

/// Read-only match state handed to a [`PeerMoveSource`].
#[derive(Debug, Clone, Copy)]
pub struct PeerView<'a> {
    /// The side the source plays.
    pub side: Side,
    /// That side's log so far.
    pub own_log: &'a MoveLog,
    /// The other side's log as of the last sync; the move being synced is not in it.
    pub opponent_log: &'a MoveLog,
    /// The source's most recent resolved shot, if it has fired.
    pub last_shot: Option<Shot>,
    /// Arena the match is played in.
    pub arena: &'a ArenaConfig,
}

/// Produces the remote side's next move.
///
/// Called once per sync, after the local move has been appended. Implementations must return
/// moves in the order the remote side actually made them; the session appends whatever comes
/// back.
///
/// # Thread Safety
///
/// With the `sync-send` feature sources must be `Send`, so a session can move between threads.
#[cfg(feature = "sync-send")]
pub trait PeerMoveSource: Send {
    /// The remote side's next move.
    fn produce_next_move(&mut self, view: &PeerView<'_>) -> PlayerMove;
}

#[cfg(not(feature = "sync-send"))]
/// Produces the remote side's next move.
///
/// Called once per sync, after the local move has been appended.
pub trait PeerMoveSource {
    /// The remote side's next move.
    fn produce_next_move(&mut self, view: &PeerView<'_>) -> PlayerMove;
}

/// Pseudo-opponent that flips a coin between a random thrust and a shot.
///
/// A shot lands on a random point of the circle through its previous miss, so the peer walks
/// its aim around where it last fired. Before its first shot it aims anywhere in the arena.
#[derive(Debug, Clone)]
pub struct RandomPeer {
    rng: SeededRandom,
}

impl RandomPeer {
    /// A peer whose decisions are a pure function of `seed` and the views it is shown.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self {
            rng: SeededRandom::new(seed),
        }
    }

    /// A peer seeded from [`random_seed`].
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(random_seed())
    }
}

impl Default for RandomPeer {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl PeerMoveSource for RandomPeer {
    fn produce_next_move(&mut self, view: &PeerView<'_>) -> PlayerMove {
        let width = i64::from(view.arena.width);
        let height = i64::from(view.arena.height);

        let mv = if self.rng.next_int(0, 2) != 0 {
            PlayerMove::accelerate(
                self.rng.next_int(-width, width) as f64,
                self.rng.next_int(-height, height) as f64,
            )
        } else {
            match view.last_shot {
                Some(shot) => {
                    let target = shot.random_point_in_bounds(&mut self.rng, view.arena);
                    PlayerMove::shoot(target.x, target.y)
                },
                None => PlayerMove::shoot(
                    self.rng.next_int(0, width) as f64,
                    self.rng.next_int(0, height) as f64,
                ),
            }
        };

        trace!(side = %view.side, kind = %mv.kind(), "random peer move");
        mv
    }
}

/// Plays back a fixed queue of moves.
///
/// Once the queue is empty every further move is a zero-thrust `Accelerate`, which only lets
/// the body coast.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPeer {
    moves: VecDeque<PlayerMove>,
}

impl ScriptedPeer {
    /// Queues `moves` in order.
    #[must_use]
    pub fn new(moves: Vec<PlayerMove>) -> Self {
        Self {
            moves: moves.into(),
        }
    }

    /// Replays the moves of a recorded log, skipping its `Init`.
    #[must_use]
    pub fn from_log(log: &MoveLog) -> Self {
        Self {
            moves: log.player_moves().collect(),
        }
    }

    /// Moves still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.moves.len()
    }
}

impl PeerMoveSource for ScriptedPeer {
    fn produce_next_move(&mut self, _view: &PeerView<'_>) -> PlayerMove {
        self.moves
            .pop_front()
            .unwrap_or(PlayerMove::accelerate(0.0, 0.0))
    }
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
    use crate::vector::Vector2;

    struct Fixture {
        arena: ArenaConfig,
        own: MoveLog,
        opponent: MoveLog,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                arena: ArenaConfig::default(),
                own: MoveLog::new(2),
                opponent: MoveLog::new(1),
            }
        }

        fn view(&self, last_shot: Option<Shot>) -> PeerView<'_> {
            PeerView {
                side: Side::B,
                own_log: &self.own,
                opponent_log: &self.opponent,
                last_shot,
                arena: &self.arena,
            }
        }
    }

    #[test]
    fn random_peer_is_reproducible() {
        let fixture = Fixture::new();
        let mut a = RandomPeer::new(1234);
        let mut b = RandomPeer::new(1234);
        for _ in 0..50 {
            let view = fixture.view(None);
            assert_eq!(a.produce_next_move(&view), b.produce_next_move(&view));
        }
    }

    #[test]
    fn random_peer_moves_stay_in_range() {
        let fixture = Fixture::new();
        let mut peer = RandomPeer::new(7);
        let mut kinds = [0usize; 2];
        for _ in 0..500 {
            match peer.produce_next_move(&fixture.view(None)) {
                PlayerMove::Accelerate { dx, dy } => {
                    kinds[0] += 1;
                    assert!((-800.0..800.0).contains(&dx));
                    assert!((-600.0..600.0).contains(&dy));
                    assert_eq!(dx.fract(), 0.0);
                },
                PlayerMove::Shoot { x, y } => {
                    kinds[1] += 1;
                    assert!((0.0..800.0).contains(&x));
                    assert!((0.0..600.0).contains(&y));
                },
            }
        }
        assert!(kinds[0] > 0 && kinds[1] > 0, "both branches taken: {kinds:?}");
    }

    #[test]
    fn random_peer_aims_around_last_shot() {
        let fixture = Fixture::new();
        let last = Shot {
            center: Vector2::new(400.0, 300.0),
            impact_radius: 40.0,
            index: 1,
        };
        let mut peer = RandomPeer::new(21);
        let mut shots = 0;
        for _ in 0..200 {
            if let PlayerMove::Shoot { x, y } = peer.produce_next_move(&fixture.view(Some(last))) {
                shots += 1;
                let distance = Vector2::new(x, y).distance(last.center);
                assert!((distance - 40.0).abs() < 1e-9, "distance {distance}");
            }
        }
        assert!(shots > 0);
    }

    #[test]
    fn scripted_peer_plays_back_then_coasts() {
        let fixture = Fixture::new();
        let mut peer = ScriptedPeer::new(vec![
            PlayerMove::shoot(1.0, 2.0),
            PlayerMove::accelerate(3.0, 4.0),
        ]);
        assert_eq!(peer.remaining(), 2);
        let view = fixture.view(None);
        assert_eq!(peer.produce_next_move(&view), PlayerMove::shoot(1.0, 2.0));
        assert_eq!(peer.produce_next_move(&view), PlayerMove::accelerate(3.0, 4.0));
        assert_eq!(peer.produce_next_move(&view), PlayerMove::accelerate(0.0, 0.0));
        assert_eq!(peer.remaining(), 0);
    }

    #[test]
    fn scripted_peer_from_log_skips_init() {
        let mut log = MoveLog::new(3);
        log.push(PlayerMove::accelerate(1.0, 0.0)).unwrap();
        log.push(PlayerMove::shoot(5.0, 5.0)).unwrap();
        let peer = ScriptedPeer::from_log(&log);
        assert_eq!(peer.remaining(), 2);
    }
}
