//! Convenient re-exports for common usage.
//!
//! ```rust
//! use lockstep_duel::prelude::*;
//!
//! let mut session = SessionBuilder::new()
//!     .with_seeds(1, 2)
//!     .with_peer(Box::new(RandomPeer::new(3)))
//!     .start_session()?;
//!
//! while session.state() != TurnState::GameOver && session.turn() < Turn::new(5) {
//!     session.request_transition(TurnState::Shoot);
//!     session.confirm(PlayerMove::shoot(400.0, 300.0));
//! }
//! # Ok::<(), DuelError>(())
//! ```
//!
//! # What's Included
//!
//! - **Session**: [`SessionBuilder`], [`GameSession`], [`SessionSnapshot`], [`SyncReport`]
//! - **Turn flow**: [`TurnState`], [`Turn`], [`Side`]
//! - **Moves**: [`PlayerMove`], [`Move`], [`MoveLog`]
//! - **Peers**: [`PeerMoveSource`], [`PeerView`], [`RandomPeer`], [`ScriptedPeer`]
//! - **Simulation**: [`ArenaConfig`], [`Body`], [`Shot`], [`Vector2`]
//! - **Errors**: [`DuelError`], [`DuelResult`]
//! - **Determinism**: [`DesyncDetection`], [`SyncChecksums`]

pub use crate::{
    ArenaConfig, Body, DesyncDetection, DuelError, DuelResult, GameSession, Move, MoveLog,
    PeerMoveSource, PeerView, PlayerMove, RandomPeer, ScriptedPeer, SessionBuilder,
    SessionSnapshot, Shot, Side, SyncChecksums, SyncReport, Turn, TurnState, Vector2,
};
