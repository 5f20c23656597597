//! Deterministic checksums over reconstructed trajectories.
//!
//! Lockstep replay has no way of noticing on its own that two peers computed different
//! trajectories from the same logs. Exchanging a checksum of each side's reconstructed
//! positions after every sync turns a silent divergence into an explicit
//! [`DuelError::MismatchedChecksum`](crate::DuelError::MismatchedChecksum).
//!
//! For checksums to be comparable they must be deterministic across all peers:
//!
//! - Same positions, same bytes: values are encoded with the shared fixed-int codec, so every
//!   `f64` contributes its exact bit pattern
//! - Same bytes, same hash: FNV-1a with fixed constants, never a randomly seeded hasher
//!
//! ```
//! use lockstep_duel::checksum::trajectory_checksum;
//! use lockstep_duel::Vector2;
//!
//! let path = [Vector2::new(194.0, 224.0), Vector2::new(219.0, 259.0)];
//! let a = trajectory_checksum(&path).expect("vectors always encode");
//! let b = trajectory_checksum(&path).expect("vectors always encode");
//! assert_eq!(a, b);
//! ```
//!
//! FNV-1a is NOT cryptographically secure. It detects accidental divergence, not a peer
//! that lies on purpose.

use std::hash::Hasher;

use serde::Serialize;

use crate::codec::{encode_for, CodecError, CodecOperation};
use crate::{Side, Vector2};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// A [`Hasher`] running 64-bit FNV-1a with no per-process seed.
///
/// Unlike `std::collections::hash_map::DefaultHasher`, two processes hashing the same bytes
/// always agree.
#[derive(Debug, Clone)]
pub struct DeterministicHasher {
    state: u64,
}

impl DeterministicHasher {
    /// Creates a hasher at the FNV offset basis.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }
}

impl Default for DeterministicHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for DeterministicHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }
}

/// Error type for checksum computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumError {
    /// The value could not be encoded.
    SerializationFailed(CodecError),
}

impl std::fmt::Display for ChecksumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerializationFailed(err) => write!(f, "checksum input failed to encode: {err}"),
        }
    }
}

impl std::error::Error for ChecksumError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SerializationFailed(err) => Some(err),
        }
    }
}

impl From<CodecError> for ChecksumError {
    fn from(err: CodecError) -> Self {
        Self::SerializationFailed(err)
    }
}

impl From<ChecksumError> for crate::DuelError {
    fn from(err: ChecksumError) -> Self {
        match err {
            ChecksumError::SerializationFailed(inner) => inner.into(),
        }
    }
}

/// Trajectory checksums of both sides after one sync.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct SyncChecksums {
    /// Checksum of side A's reconstructed trajectory.
    pub a: u128,
    /// Checksum of side B's reconstructed trajectory.
    pub b: u128,
}

impl SyncChecksums {
    /// Checksum of `side`'s trajectory.
    #[must_use]
    pub const fn get(&self, side: Side) -> u128 {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }
}

/// FNV-1a over raw bytes, widened to `u128` for room to grow.
#[inline]
#[must_use]
pub fn hash_bytes_fnv1a(bytes: &[u8]) -> u128 {
    let mut hasher = DeterministicHasher::new();
    hasher.write(bytes);
    u128::from(hasher.finish())
}

/// Checksum of any serializable value: codec bytes, then FNV-1a.
pub fn compute_checksum<T: Serialize + ?Sized>(value: &T) -> Result<u128, ChecksumError> {
    let bytes = encode_for(&value, CodecOperation::Checksum)?;
    Ok(hash_bytes_fnv1a(&bytes))
}

/// Checksum of a reconstructed trajectory, one position per log entry.
pub fn trajectory_checksum(positions: &[Vector2]) -> Result<u128, ChecksumError> {
    compute_checksum(positions)
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
    use std::hash::Hash;

    #[test]
    fn fnv1a_empty_input_is_offset_basis() {
        assert_eq!(hash_bytes_fnv1a(&[]), u128::from(FNV_OFFSET_BASIS));
    }

    #[test]
    fn fnv1a_known_vector() {
        // Reference FNV-1a 64 of "a"
        assert_eq!(hash_bytes_fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn hasher_is_reproducible_for_hash_types() {
        let mut a = DeterministicHasher::new();
        let mut b = DeterministicHasher::default();
        (42u32, "duel").hash(&mut a);
        (42u32, "duel").hash(&mut b);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn trajectory_checksum_is_order_sensitive() {
        let p = Vector2::new(1.0, 2.0);
        let q = Vector2::new(3.0, 4.0);
        let forward = trajectory_checksum(&[p, q]).unwrap();
        let backward = trajectory_checksum(&[q, p]).unwrap();
        assert_ne!(forward, backward);
    }

    #[test]
    fn trajectory_checksum_sees_last_bit_differences() {
        let x = 100.0f64;
        let nudged = f64::from_bits(x.to_bits() + 1);
        let a = trajectory_checksum(&[Vector2::new(x, 0.0)]).unwrap();
        let b = trajectory_checksum(&[Vector2::new(nudged, 0.0)]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_trajectory_has_stable_checksum() {
        assert_eq!(
            trajectory_checksum(&[]).unwrap(),
            trajectory_checksum(&[]).unwrap()
        );
    }

    #[test]
    fn compute_checksum_matches_manual_pipeline() {
        let value = (7u32, Vector2::new(0.5, 0.25));
        let bytes = crate::codec::encode(&value).unwrap();
        assert_eq!(compute_checksum(&value).unwrap(), hash_bytes_fnv1a(&bytes));
    }
}
