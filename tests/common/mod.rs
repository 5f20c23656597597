//! Common test infrastructure shared across integration tests.
//!
//! - `test_utils`: seeds, session constructors and turn helpers
//!
//! # Usage
//!
//! From any integration test file:
//! ```ignore
//! mod common;
//! use common::{play_turn, scripted_session, SEED_A, SEED_B};
//! ```

pub mod test_utils;

// Not every integration crate uses every helper
#[allow(unused_imports)]
pub use test_utils::{
    collecting_session, mirror_match, play_random_match, play_turn, scripted_session,
    MAX_TURNS, SEED_A, SEED_B, SPAWN_A, SPAWN_B,
};
