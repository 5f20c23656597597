//! Binary codec shared by the move-log wire format and trajectory checksums.
//!
//! The bincode configuration is defined once here. Two peers that hash or exchange the same
//! value must produce the same bytes, so nothing else in the crate calls bincode directly.
//!
//! # Examples
//!
//! ```
//! use lockstep_duel::codec::{decode, encode};
//!
//! let data: u32 = 42;
//! let bytes = encode(&data).expect("encoding should succeed");
//! let (decoded, read): (u32, _) = decode(&bytes).expect("decoding should succeed");
//! assert_eq!(data, decoded);
//! assert_eq!(read, bytes.len());
//! ```

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

// Fixed-size little-endian integers: a value's encoding never depends on its magnitude, and
// f64 is always written as its raw 8 bytes.
fn config() -> impl bincode::config::Config {
    bincode::config::standard().with_fixed_int_encoding()
}

/// What the codec was doing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecOperation {
    /// Encoding a move log for transport.
    EncodeMoveLog,
    /// Decoding a move log received from a peer.
    DecodeMoveLog,
    /// Encoding a value for a checksum.
    Checksum,
    /// Generic encode.
    Encode,
    /// Generic decode.
    Decode,
}

impl fmt::Display for CodecOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncodeMoveLog => write!(f, "encoding move log"),
            Self::DecodeMoveLog => write!(f, "decoding move log"),
            Self::Checksum => write!(f, "encoding for checksum"),
            Self::Encode => write!(f, "encoding"),
            Self::Decode => write!(f, "decoding"),
        }
    }
}

/// Errors produced by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecError {
    /// Serialization failed.
    EncodeError {
        /// The underlying bincode message.
        message: String,
        /// What was being encoded.
        operation: CodecOperation,
    },
    /// Deserialization failed.
    DecodeError {
        /// The underlying bincode message.
        message: String,
        /// What was being decoded.
        operation: CodecOperation,
    },
    /// Bytes were left over after decoding a complete value.
    TrailingBytes {
        /// Bytes consumed by the value.
        consumed: usize,
        /// Total bytes supplied.
        provided: usize,
    },
}

impl CodecError {
    /// Creates an encode error.
    pub fn encode(message: impl Into<String>, operation: CodecOperation) -> Self {
        Self::EncodeError {
            message: message.into(),
            operation,
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>, operation: CodecOperation) -> Self {
        Self::DecodeError {
            message: message.into(),
            operation,
        }
    }

    fn with_operation(self, op: CodecOperation) -> Self {
        match self {
            Self::EncodeError { message, .. } => Self::encode(message, op),
            Self::DecodeError { message, .. } => Self::decode(message, op),
            other => other,
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncodeError { message, operation } => {
                write!(f, "encoding failed while {operation}: {message}")
            },
            Self::DecodeError { message, operation } => {
                write!(f, "decoding failed while {operation}: {message}")
            },
            Self::TrailingBytes { consumed, provided } => {
                write!(
                    f,
                    "{} trailing bytes after a complete value ({consumed} of {provided} used)",
                    provided - consumed
                )
            },
        }
    }
}

impl std::error::Error for CodecError {}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Encodes `value` into a freshly allocated buffer.
pub fn encode<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
    bincode::serde::encode_to_vec(value, config())
        .map_err(|e| CodecError::encode(e.to_string(), CodecOperation::Encode))
}

/// Encodes `value`, tagging any failure with `operation`.
pub fn encode_for<T: Serialize>(value: &T, operation: CodecOperation) -> CodecResult<Vec<u8>> {
    encode(value).map_err(|e| e.with_operation(operation))
}

/// Decodes a value from the front of `bytes`, returning it with the number of bytes read.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<(T, usize)> {
    bincode::serde::decode_from_slice(bytes, config())
        .map_err(|e| CodecError::decode(e.to_string(), CodecOperation::Decode))
}

/// Decodes a value that must span all of `bytes`.
pub fn decode_exact<T: DeserializeOwned>(
    bytes: &[u8],
    operation: CodecOperation,
) -> CodecResult<T> {
    let (value, consumed) = decode(bytes).map_err(|e| e.with_operation(operation))?;
    if consumed != bytes.len() {
        return Err(CodecError::TrailingBytes {
            consumed,
            provided: bytes.len(),
        });
    }
    Ok(value)
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
    use crate::Vector2;

    #[test]
    fn integers_use_fixed_width() {
        assert_eq!(encode(&1u32).unwrap().len(), 4);
        assert_eq!(encode(&u32::MAX).unwrap().len(), 4);
    }

    #[test]
    fn vector_encodes_as_two_raw_f64() {
        let bytes = encode(&Vector2::new(1.5, -2.0)).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..8], &1.5f64.to_le_bytes());
        assert_eq!(&bytes[8..], &(-2.0f64).to_le_bytes());
    }

    #[test]
    fn decode_reports_truncation() {
        let bytes = encode(&0xdead_beef_u32).unwrap();
        let err = decode::<u32>(&bytes[..2]).unwrap_err();
        assert!(matches!(err, CodecError::DecodeError { .. }));
    }

    #[test]
    fn decode_exact_rejects_trailing_bytes() {
        let mut bytes = encode(&7u32).unwrap();
        bytes.push(0);
        let err = decode_exact::<u32>(&bytes, CodecOperation::DecodeMoveLog).unwrap_err();
        assert_eq!(
            err,
            CodecError::TrailingBytes {
                consumed: 4,
                provided: 5
            }
        );
        assert!(err.to_string().contains("1 trailing bytes"));
    }

    #[test]
    fn decode_exact_tags_operation() {
        let err = decode_exact::<u64>(&[1, 2], CodecOperation::DecodeMoveLog).unwrap_err();
        match err {
            CodecError::DecodeError { operation, .. } => {
                assert_eq!(operation, CodecOperation::DecodeMoveLog);
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn operation_display() {
        assert_eq!(CodecOperation::Checksum.to_string(), "encoding for checksum");
        let err = CodecError::encode("boom", CodecOperation::EncodeMoveLog);
        assert_eq!(err.to_string(), "encoding failed while encoding move log: boom");
    }
}
