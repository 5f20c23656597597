//! Verification integration tests.
//!
//! - Property tests - invariants under random inputs, with proptest
//! - Metamorphic tests - relationships between pairs of replays
//! - Transition tests - the full turn transition table, one test per pair

mod verification {
    pub mod metamorphic;
    pub mod property;
    pub mod transitions;
}
