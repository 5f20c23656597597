//! Fuzz target for move log decoding.
//!
//! # Safety Properties Tested
//!
//! - No panics on arbitrary byte sequences
//! - Every accepted log starts with its `Init` and holds only finite payloads
//! - Re-encoding an accepted log reproduces the input bytes exactly
//! - Replaying an accepted log never leaves the arena

#![no_main]

use libfuzzer_sys::fuzz_target;
use lockstep_duel::replay::reconstruct_trajectory;
use lockstep_duel::{ArenaConfig, Move, MoveLog, Side};

fuzz_target!(|data: &[u8]| {
    let Ok(log) = MoveLog::decode(data) else {
        return;
    };

    assert!(matches!(log.as_slice().first(), Some(Move::Init { .. })));
    assert!(log.iter().skip(1).all(|mv| !matches!(mv, Move::Init { .. })));
    assert!(log.iter().all(Move::is_finite));

    let bytes = log.encode().expect("decoded log re-encodes");
    assert_eq!(bytes.as_slice(), data);

    // Long logs are valid but slow; the decoder is what is under test
    if log.len() <= 4_096 {
        let arena = ArenaConfig::default();
        let (_, body) = reconstruct_trajectory(&log, Side::A, &arena);
        assert!(body.is_within(&arena));
    }
});
