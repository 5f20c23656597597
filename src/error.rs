use std::error::Error;
use std::fmt;
use std::fmt::Display;

use crate::codec::CodecError;
use crate::{Side, Turn};

/// This enum contains all error messages this library can return. Most API functions will generally return a [`DuelResult<T>`].
///
/// Protocol violations (a move submitted in the wrong state, a disallowed transition) are never
/// reported through this type. They are silent no-ops on the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DuelError {
    /// A configuration value was rejected by the [`SessionBuilder`] or [`ArenaConfig::validate`].
    ///
    /// [`SessionBuilder`]: crate::SessionBuilder
    /// [`ArenaConfig::validate`]: crate::ArenaConfig::validate
    InvalidConfig {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// An externally supplied or decoded move log breaks the move log invariants.
    InvalidMoveLog {
        /// What exactly is wrong with the log.
        kind: MoveLogErrorKind,
    },
    /// A peer reported a trajectory checksum that differs from the locally computed one.
    MismatchedChecksum {
        /// The sync turn the checksums belong to.
        turn: Turn,
        /// Whose reconstructed trajectory diverged.
        side: Side,
        /// The locally computed checksum.
        local: u128,
        /// The checksum supplied by the peer.
        remote: u128,
    },
    /// Serialization or deserialization of data failed.
    SerializationError {
        /// A description of what failed to serialize/deserialize.
        context: String,
    },
}

/// The specific way a move log failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MoveLogErrorKind {
    /// The log has no entries at all.
    Empty,
    /// The first entry is not an `Init` move.
    MissingInit,
    /// An `Init` move appears after index 0.
    DuplicateInit {
        /// Index of the offending entry.
        index: usize,
    },
    /// The two logs of a match have a different number of entries.
    LengthMismatch {
        /// Length of side A's log.
        a: usize,
        /// Length of side B's log.
        b: usize,
    },
    /// A move payload holds a NaN or infinite coordinate.
    NonFinitePayload {
        /// Index of the offending entry.
        index: usize,
    },
}

impl Display for MoveLogErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "log is empty"),
            Self::MissingInit => write!(f, "first entry is not an init move"),
            Self::DuplicateInit { index } => {
                write!(f, "unexpected init move at index {}", index)
            },
            Self::LengthMismatch { a, b } => {
                write!(f, "log lengths differ (side A: {}, side B: {})", a, b)
            },
            Self::NonFinitePayload { index } => {
                write!(f, "non-finite payload at index {}", index)
            },
        }
    }
}

impl From<MoveLogErrorKind> for DuelError {
    fn from(kind: MoveLogErrorKind) -> Self {
        Self::InvalidMoveLog { kind }
    }
}

impl From<CodecError> for DuelError {
    fn from(err: CodecError) -> Self {
        Self::SerializationError {
            context: err.to_string(),
        }
    }
}

impl Display for DuelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { field, reason } => {
                write!(f, "Invalid configuration for `{}`: {}", field, reason)
            },
            Self::InvalidMoveLog { kind } => {
                write!(f, "Invalid move log: {}", kind)
            },
            Self::MismatchedChecksum {
                turn,
                side,
                local,
                remote,
            } => {
                write!(
                    f,
                    "Trajectory checksum mismatch for side {} on turn {}: local {:#x}, remote {:#x}",
                    side, turn, local, remote
                )
            },
            Self::SerializationError { context } => {
                write!(f, "Serialization error: {}", context)
            },
        }
    }
}

impl Error for DuelError {}

/// Shorthand for results produced by this crate.
pub type DuelResult<T> = Result<T, DuelError>;

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::codec::CodecOperation;

    #[test]
    fn invalid_config_display_names_field() {
        let err = DuelError::InvalidConfig {
            field: "width",
            reason: "must be positive".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("width"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn move_log_kind_converts_into_error() {
        let err: DuelError = MoveLogErrorKind::DuplicateInit { index: 3 }.into();
        assert_eq!(
            err,
            DuelError::InvalidMoveLog {
                kind: MoveLogErrorKind::DuplicateInit { index: 3 }
            }
        );
        assert!(err.to_string().contains("index 3"));
    }

    #[test]
    fn mismatched_checksum_display_is_hex() {
        let err = DuelError::MismatchedChecksum {
            turn: Turn::new(4),
            side: Side::B,
            local: 0xff,
            remote: 0x10,
        };
        let msg = err.to_string();
        assert!(msg.contains("0xff"));
        assert!(msg.contains("0x10"));
        assert!(msg.contains("turn 4"));
    }

    #[test]
    fn codec_error_becomes_serialization_error() {
        let err: DuelError = CodecError::decode("truncated", CodecOperation::Decode).into();
        match err {
            DuelError::SerializationError { context } => assert!(context.contains("truncated")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn error_trait_is_implemented() {
        fn assert_error<E: Error>() {}
        assert_error::<DuelError>();
    }
}
