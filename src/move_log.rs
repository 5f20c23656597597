//! Moves and the append-only per-side move log.
//!
//! A [`MoveLog`] always starts with exactly one [`Move::Init`] carrying the side's seed.
//! Every later entry is a [`PlayerMove`], appended once and never changed. Log index order is
//! replay order.
//!
//! The minimal unit a transport or a save file needs is `{seed, moves}` per side; that is
//! exactly what [`MoveLog::encode`] produces.
//!
//! ```
//! use lockstep_duel::{MoveLog, PlayerMove};
//!
//! let mut log = MoveLog::new(7);
//! log.push(PlayerMove::accelerate(1.0, 0.0))?;
//! log.push(PlayerMove::shoot(400.0, 300.0))?;
//!
//! let bytes = log.encode()?;
//! assert_eq!(MoveLog::decode(&bytes)?, log);
//! # Ok::<(), lockstep_duel::DuelError>(())
//! ```

use std::fmt;

use crate::codec::{decode_exact, encode_for, CodecOperation};
use crate::telemetry::{InvariantChecker, InvariantViolation};
use crate::vector::Vector2;
use crate::{DuelError, DuelResult, MoveLogErrorKind};

/// Discriminant of a [`Move`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MoveKind {
    /// Seeds the side's body.
    Init,
    /// Thrust in a direction.
    Accelerate,
    /// Fire at a point.
    Shoot,
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Accelerate => write!(f, "accelerate"),
            Self::Shoot => write!(f, "shoot"),
        }
    }
}

/// One entry of a move log.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Move {
    /// First entry of every log.
    Init {
        /// Seed the body is spawned from.
        seed: u32,
    },
    /// Thrust toward `(dx, dy)`; only the direction matters.
    Accelerate {
        /// Horizontal component.
        dx: f64,
        /// Vertical component.
        dy: f64,
    },
    /// Fire at the absolute arena point `(x, y)`.
    Shoot {
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
}

impl Move {
    /// This move's kind.
    #[must_use]
    pub const fn kind(&self) -> MoveKind {
        match self {
            Self::Init { .. } => MoveKind::Init,
            Self::Accelerate { .. } => MoveKind::Accelerate,
            Self::Shoot { .. } => MoveKind::Shoot,
        }
    }

    /// Acceleration this move feeds the integrator. `Shoot` coasts with zero thrust.
    #[must_use]
    pub const fn thrust(&self) -> Vector2 {
        match *self {
            Self::Accelerate { dx, dy } => Vector2::new(dx, dy),
            Self::Init { .. } | Self::Shoot { .. } => Vector2::ZERO,
        }
    }

    /// Target point of a `Shoot`, `None` for every other kind.
    #[must_use]
    pub const fn target(&self) -> Option<Vector2> {
        match *self {
            Self::Shoot { x, y } => Some(Vector2::new(x, y)),
            _ => None,
        }
    }

    /// True when the payload holds no NaN or infinite coordinate.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Init { .. } => true,
            Self::Accelerate { dx: a, dy: b } | Self::Shoot { x: a, y: b } => {
                a.is_finite() && b.is_finite()
            },
        }
    }
}

/// A move a player can submit. `Init` is deliberately not representable.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PlayerMove {
    /// See [`Move::Accelerate`].
    Accelerate {
        /// Horizontal component.
        dx: f64,
        /// Vertical component.
        dy: f64,
    },
    /// See [`Move::Shoot`].
    Shoot {
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
}

impl PlayerMove {
    /// Shorthand for [`PlayerMove::Accelerate`].
    #[must_use]
    pub const fn accelerate(dx: f64, dy: f64) -> Self {
        Self::Accelerate { dx, dy }
    }

    /// Shorthand for [`PlayerMove::Shoot`].
    #[must_use]
    pub const fn shoot(x: f64, y: f64) -> Self {
        Self::Shoot { x, y }
    }

    /// This move's kind.
    #[must_use]
    pub const fn kind(&self) -> MoveKind {
        match self {
            Self::Accelerate { .. } => MoveKind::Accelerate,
            Self::Shoot { .. } => MoveKind::Shoot,
        }
    }

    /// True when the payload holds no NaN or infinite coordinate.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        Move::from(*self).is_finite()
    }
}

impl From<PlayerMove> for Move {
    fn from(mv: PlayerMove) -> Self {
        match mv {
            PlayerMove::Accelerate { dx, dy } => Self::Accelerate { dx, dy },
            PlayerMove::Shoot { x, y } => Self::Shoot { x, y },
        }
    }
}

impl TryFrom<Move> for PlayerMove {
    type Error = MoveKind;

    fn try_from(mv: Move) -> Result<Self, MoveKind> {
        match mv {
            Move::Accelerate { dx, dy } => Ok(Self::Accelerate { dx, dy }),
            Move::Shoot { x, y } => Ok(Self::Shoot { x, y }),
            Move::Init { .. } => Err(MoveKind::Init),
        }
    }
}

/// Ordered, append-only record of one side's moves, starting with its `Init`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "MoveLogWire", into = "MoveLogWire")]
pub struct MoveLog {
    entries: Vec<Move>,
}

/// Serialized form: the seed and every entry after `Init`.
#[derive(serde::Serialize, serde::Deserialize)]
struct MoveLogWire {
    seed: u32,
    moves: Vec<PlayerMove>,
}

impl TryFrom<MoveLogWire> for MoveLog {
    type Error = DuelError;

    fn try_from(wire: MoveLogWire) -> DuelResult<Self> {
        let mut log = Self::new(wire.seed);
        log.entries.reserve(wire.moves.len());
        for mv in wire.moves {
            log.push(mv)?;
        }
        Ok(log)
    }
}

impl From<MoveLog> for MoveLogWire {
    fn from(log: MoveLog) -> Self {
        Self {
            seed: log.seed(),
            moves: log.player_moves().collect(),
        }
    }
}

impl MoveLog {
    /// Creates a log holding only `Init { seed }`.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            entries: vec![Move::Init { seed }],
        }
    }

    /// Validates an externally supplied sequence of moves.
    ///
    /// # Errors
    ///
    /// [`DuelError::InvalidMoveLog`] if the list is empty, does not start with `Init`, holds a
    /// second `Init`, or carries a non-finite payload.
    pub fn from_moves(moves: Vec<Move>) -> DuelResult<Self> {
        match moves.first() {
            None => return Err(MoveLogErrorKind::Empty.into()),
            Some(Move::Init { .. }) => {},
            Some(_) => return Err(MoveLogErrorKind::MissingInit.into()),
        }
        for (index, mv) in moves.iter().enumerate().skip(1) {
            if mv.kind() == MoveKind::Init {
                return Err(MoveLogErrorKind::DuplicateInit { index }.into());
            }
            if !mv.is_finite() {
                return Err(MoveLogErrorKind::NonFinitePayload { index }.into());
            }
        }
        Ok(Self { entries: moves })
    }

    /// Appends a move.
    ///
    /// # Errors
    ///
    /// [`MoveLogErrorKind::NonFinitePayload`] if a coordinate is NaN or infinite; the log is
    /// left unchanged.
    pub fn push(&mut self, mv: PlayerMove) -> DuelResult<()> {
        if !mv.is_finite() {
            return Err(MoveLogErrorKind::NonFinitePayload {
                index: self.entries.len(),
            }
            .into());
        }
        self.entries.push(mv.into());
        Ok(())
    }

    /// Seed carried by the `Init` entry.
    #[must_use]
    pub fn seed(&self) -> u32 {
        match self.entries.first() {
            Some(Move::Init { seed }) => *seed,
            // Construction guarantees an Init at index 0
            _ => 0,
        }
    }

    /// Number of entries including `Init`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: a log holds at least its `Init`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries after `Init`.
    #[must_use]
    pub fn turns(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Move> {
        self.entries.get(index)
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&Move> {
        self.entries.last()
    }

    /// All entries in replay order.
    #[must_use]
    pub fn as_slice(&self) -> &[Move] {
        &self.entries
    }

    /// Iterates entries in replay order.
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.entries.iter()
    }

    /// Iterates the entries after `Init` as player moves.
    pub fn player_moves(&self) -> impl Iterator<Item = PlayerMove> + '_ {
        self.entries
            .iter()
            .skip(1)
            .filter_map(|mv| PlayerMove::try_from(*mv).ok())
    }

    /// Encodes the log as `{seed, moves}`.
    pub fn encode(&self) -> DuelResult<Vec<u8>> {
        Ok(encode_for(self, CodecOperation::EncodeMoveLog)?)
    }

    /// Decodes and validates a log produced by [`MoveLog::encode`].
    ///
    /// # Errors
    ///
    /// [`DuelError::SerializationError`] for malformed or trailing bytes, including a payload
    /// with a non-finite coordinate.
    pub fn decode(bytes: &[u8]) -> DuelResult<Self> {
        Ok(decode_exact(bytes, CodecOperation::DecodeMoveLog)?)
    }
}

impl InvariantChecker for MoveLog {
    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if !matches!(self.entries.first(), Some(Move::Init { .. })) {
            return Err(InvariantViolation::new("MoveLog", "first entry is not Init"));
        }
        for (index, mv) in self.entries.iter().enumerate().skip(1) {
            if mv.kind() == MoveKind::Init {
                return Err(InvariantViolation::new("MoveLog", "Init after index 0")
                    .with_details(format!("index={index}")));
            }
            if !mv.is_finite() {
                return Err(InvariantViolation::new("MoveLog", "non-finite payload")
                    .with_details(format!("index={index}, move={mv:?}")));
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a MoveLog {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
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

    fn invalid_kind(result: DuelResult<MoveLog>) -> MoveLogErrorKind {
        match result {
            Err(DuelError::InvalidMoveLog { kind }) => kind,
            other => panic!("expected InvalidMoveLog, got {other:?}"),
        }
    }

    #[test]
    fn constructed_logs_hold_invariants() {
        let mut log = MoveLog::new(9);
        assert!(log.check_invariants().is_ok());
        log.push(PlayerMove::shoot(1.0, 2.0)).unwrap();
        log.push(PlayerMove::accelerate(-3.0, 0.5)).unwrap();
        assert!(log.check_invariants().is_ok());

        let broken = MoveLog {
            entries: vec![Move::Init { seed: 1 }, Move::Init { seed: 2 }],
        };
        let err = broken.check_invariants().unwrap_err();
        assert_eq!(err.details.as_deref(), Some("index=1"));
    }

    #[test]
    fn new_log_holds_only_init() {
        let log = MoveLog::new(42);
        assert_eq!(log.len(), 1);
        assert_eq!(log.turns(), 0);
        assert!(!log.is_empty());
        assert_eq!(log.seed(), 42);
        assert_eq!(log.as_slice(), &[Move::Init { seed: 42 }]);
    }

    #[test]
    fn push_appends_in_order() {
        let mut log = MoveLog::new(1);
        log.push(PlayerMove::accelerate(1.0, 2.0)).unwrap();
        log.push(PlayerMove::shoot(3.0, 4.0)).unwrap();

        let kinds: Vec<MoveKind> = log.iter().map(Move::kind).collect();
        assert_eq!(
            kinds,
            vec![MoveKind::Init, MoveKind::Accelerate, MoveKind::Shoot]
        );
        assert_eq!(log.last(), Some(&Move::Shoot { x: 3.0, y: 4.0 }));
        assert_eq!(log.turns(), 2);
    }

    #[test]
    fn push_rejects_non_finite_and_leaves_log_untouched() {
        let mut log = MoveLog::new(1);
        let err = log.push(PlayerMove::shoot(f64::NAN, 0.0)).unwrap_err();
        assert_eq!(
            err,
            DuelError::InvalidMoveLog {
                kind: MoveLogErrorKind::NonFinitePayload { index: 1 }
            }
        );
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn from_moves_validation() {
        assert_eq!(invalid_kind(MoveLog::from_moves(vec![])), MoveLogErrorKind::Empty);
        assert_eq!(
            invalid_kind(MoveLog::from_moves(vec![Move::Shoot { x: 0.0, y: 0.0 }])),
            MoveLogErrorKind::MissingInit
        );
        assert_eq!(
            invalid_kind(MoveLog::from_moves(vec![
                Move::Init { seed: 1 },
                Move::Accelerate { dx: 0.0, dy: 0.0 },
                Move::Init { seed: 2 },
            ])),
            MoveLogErrorKind::DuplicateInit { index: 2 }
        );
        assert_eq!(
            invalid_kind(MoveLog::from_moves(vec![
                Move::Init { seed: 1 },
                Move::Accelerate {
                    dx: f64::INFINITY,
                    dy: 0.0
                },
            ])),
            MoveLogErrorKind::NonFinitePayload { index: 1 }
        );

        let log = MoveLog::from_moves(vec![
            Move::Init { seed: 9 },
            Move::Shoot { x: 1.0, y: 1.0 },
        ])
        .unwrap();
        assert_eq!(log.seed(), 9);
        assert_eq!(log.turns(), 1);
    }

    #[test]
    fn move_accessors() {
        let shoot = Move::Shoot { x: 5.0, y: 6.0 };
        assert_eq!(shoot.target(), Some(Vector2::new(5.0, 6.0)));
        assert_eq!(shoot.thrust(), Vector2::ZERO);

        let accel = Move::Accelerate { dx: -1.0, dy: 2.0 };
        assert_eq!(accel.target(), None);
        assert_eq!(accel.thrust(), Vector2::new(-1.0, 2.0));

        assert_eq!(Move::Init { seed: 0 }.thrust(), Vector2::ZERO);
        assert_eq!(MoveKind::Shoot.to_string(), "shoot");
    }

    #[test]
    fn player_move_conversions() {
        let mv = PlayerMove::shoot(1.0, 2.0);
        assert_eq!(Move::from(mv), Move::Shoot { x: 1.0, y: 2.0 });
        assert_eq!(PlayerMove::try_from(Move::from(mv)), Ok(mv));
        assert_eq!(
            PlayerMove::try_from(Move::Init { seed: 3 }),
            Err(MoveKind::Init)
        );
        assert_eq!(mv.kind(), MoveKind::Shoot);
        assert!(!PlayerMove::accelerate(f64::NAN, 0.0).is_finite());
    }

    #[test]
    fn wire_format_is_seed_then_moves() {
        let mut log = MoveLog::new(0x0102_0304);
        log.push(PlayerMove::shoot(1.0, 2.0)).unwrap();
        let bytes = log.encode().unwrap();

        // u32 seed, u64 length, u32 variant tag, two f64
        assert_eq!(bytes.len(), 4 + 8 + 4 + 16);
        assert_eq!(&bytes[..4], &0x0102_0304u32.to_le_bytes());
        assert_eq!(&bytes[4..12], &1u64.to_le_bytes());
        assert_eq!(MoveLog::decode(&bytes).unwrap(), log);
    }

    #[test]
    fn decode_rejects_non_finite_payload() {
        #[derive(serde::Serialize)]
        struct RawWire {
            seed: u32,
            moves: Vec<PlayerMove>,
        }
        let bytes = crate::codec::encode(&RawWire {
            seed: 1,
            moves: vec![PlayerMove::accelerate(f64::NAN, 1.0)],
        })
        .unwrap();
        let err = MoveLog::decode(&bytes).unwrap_err();
        assert!(matches!(err, DuelError::SerializationError { .. }));
    }

    #[test]
    fn decode_rejects_garbage_and_trailing_bytes() {
        assert!(MoveLog::decode(&[1, 2, 3]).is_err());

        let mut bytes = MoveLog::new(5).encode().unwrap();
        bytes.push(0xff);
        assert!(matches!(
            MoveLog::decode(&bytes),
            Err(DuelError::SerializationError { .. })
        ));
    }
}
