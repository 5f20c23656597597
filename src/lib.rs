//! # Lockstep Duel
//!
//! A deterministic lockstep replay engine for a two-player, turn-based artillery duel.
//!
//! Each side alternately accelerates a circular body or fires a shot at a point in the arena.
//! A shot hits if it lands within a fixed radius of the opponent's body *at the moment it was
//! fired*. No live state is ever exchanged between the peers: only two 32-bit seeds and two
//! append-only move logs. On every synchronization both sides rebuild the opponent's whole
//! trajectory from `(seed, log)` and must arrive at bit-identical positions to agree on hits.
//!
//! The crate is request driven. A renderer reads [`SessionSnapshot`]s, an input controller
//! calls [`GameSession::request_transition`] and [`GameSession::confirm`], and the remote
//! side's moves come from a [`PeerMoveSource`] (a network client, a recorded log, or the
//! built-in [`RandomPeer`]).
//!
//! ```
//! use lockstep_duel::{PlayerMove, ScriptedPeer, SessionBuilder, TurnState};
//!
//! let mut session = SessionBuilder::new()
//!     .with_seeds(1, 2)
//!     .with_peer(Box::new(ScriptedPeer::new(vec![PlayerMove::accelerate(0.0, 0.0)])))
//!     .start_session()?;
//!
//! assert!(session.request_transition(TurnState::Accelerate));
//! let report = session.confirm(PlayerMove::accelerate(1.0, 0.0)).expect("move accepted");
//! assert_eq!(report.turn.as_u32(), 1);
//! assert_eq!(session.state(), TurnState::Prompt);
//! # Ok::<(), lockstep_duel::DuelError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use body::Body;
pub use checksum::SyncChecksums;
pub use error::{DuelError, DuelResult, MoveLogErrorKind};
pub use move_log::{Move, MoveKind, MoveLog, PlayerMove};
pub use peer::{PeerMoveSource, PeerView, RandomPeer, ScriptedPeer};
pub use replay::{compute_shots, replay_both, verify_match, MatchVerdict, ReplayOutcome, Shot};
pub use rng::SeededRandom;
pub use sessions::builder::SessionBuilder;
pub use sessions::config::ArenaConfig;
pub use sessions::game_session::{GameSession, SessionSnapshot, SyncReport};
pub use turn::{TurnState, TurnStateMachine};
pub use vector::Vector2;

pub mod body;
pub mod checksum;
/// Binary codec for move logs and checksums.
///
/// Wraps bincode with a single fixed-int configuration so every encoding in the crate is
/// byte-for-byte reproducible.
pub mod codec;
#[doc(hidden)]
pub mod error;
pub mod move_log;
pub mod peer;
pub mod prelude;
pub mod replay;
/// Seeded linear-congruential generator.
///
/// Every value that shapes a body's trajectory comes from this generator.
pub mod rng;
pub mod telemetry;
pub mod turn;
pub mod vector;
#[doc(hidden)]
pub mod sessions {
    #[doc(hidden)]
    pub mod builder;
    pub mod config;
    #[doc(hidden)]
    pub mod game_session;
}

/// One of the two duelling sides.
///
/// Side A is always replayed first during a sync, which also decides a simultaneous hit in
/// A's favour.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Side {
    /// The first side.
    A,
    /// The second side.
    B,
}

impl Side {
    /// Both sides in replay order.
    pub const BOTH: [Self; 2] = [Self::A, Self::B];

    /// The other side.
    #[inline]
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// `0` for A, `1` for B. Used to index per-side pairs.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Number of synchronizations completed in a session.
///
/// Turn 0 is the freshly created session; every completed sync increments it. The turn
/// number equals the number of non-`Init` entries in each side's move log.
///
/// # Examples
///
/// ```
/// use lockstep_duel::Turn;
///
/// let turn = Turn::ZERO;
/// assert_eq!(turn.next().as_u32(), 1);
/// assert!(turn.next() > turn);
/// ```
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Turn(u32);

impl Turn {
    /// The turn before any sync has happened.
    pub const ZERO: Self = Self(0);

    /// Creates a `Turn` from a raw count.
    #[inline]
    #[must_use]
    pub const fn new(turn: u32) -> Self {
        Self(turn)
    }

    /// Returns the underlying count.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// The following turn. Saturates at `u32::MAX`.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Turn {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl PartialEq<u32> for Turn {
    #[inline]
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

/// Desync detection by local re-simulation.
///
/// With `On`, every sync runs both replays twice and compares the trajectory checksums of
/// the two runs. Any difference means the replay is not a pure function of its inputs (for
/// example a peer source that mutates shared state), which would eventually desync two real
/// peers. The cost is one extra replay pass per sync.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum DesyncDetection {
    /// Re-run and compare on every sync.
    #[default]
    On,
    /// Trust the first run.
    Off,
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

    #[test]
    fn opponent_is_an_involution() {
        for side in Side::BOTH {
            assert_ne!(side.opponent(), side);
            assert_eq!(side.opponent().opponent(), side);
        }
    }

    #[test]
    fn side_index_matches_replay_order() {
        assert_eq!(Side::A.index(), 0);
        assert_eq!(Side::B.index(), 1);
        assert_eq!(Side::BOTH, [Side::A, Side::B]);
        assert!(Side::A < Side::B);
    }

    #[test]
    fn side_display() {
        assert_eq!(Side::A.to_string(), "A");
        assert_eq!(Side::B.to_string(), "B");
    }

    #[test]
    fn turn_arithmetic() {
        let turn = Turn::new(41);
        assert_eq!(turn.next(), 42);
        assert_eq!(Turn::from(7).as_u32(), 7);
        assert_eq!(Turn::new(u32::MAX).next(), u32::MAX);
        assert_eq!(Turn::default(), Turn::ZERO);
        assert_eq!(turn.to_string(), "41");
    }

    #[test]
    fn desync_detection_defaults_on() {
        assert_eq!(DesyncDetection::default(), DesyncDetection::On);
    }
}
