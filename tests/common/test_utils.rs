//! Shared test utilities for integration tests.
//!
//! Known values for the default seeds on the classic arena:
//!
//! | seed | spawn position | spawn velocity |
//! |------|----------------|----------------|
//! | 1    | (194, 224)     | (25, 35)       |
//! | 2    | (194, 276)     | (9, 37)        |

#![allow(dead_code)]

use std::sync::Arc;

use lockstep_duel::telemetry::CollectingObserver;
use lockstep_duel::{
    GameSession, PlayerMove, RandomPeer, ScriptedPeer, SessionBuilder, Side, SyncReport,
    TurnState, Vector2,
};

/// Seed of side A in most tests.
pub const SEED_A: u32 = 1;
/// Seed of side B in most tests.
pub const SEED_B: u32 = 2;
/// Where [`SEED_A`] spawns on the classic arena.
pub const SPAWN_A: Vector2 = Vector2::new(194.0, 224.0);
/// Where [`SEED_B`] spawns on the classic arena.
pub const SPAWN_B: Vector2 = Vector2::new(194.0, 276.0);
/// Upper bound on turns for matches driven by random peers.
pub const MAX_TURNS: usize = 500;

/// A session for side A against a scripted side B.
pub fn scripted_session(peer_moves: Vec<PlayerMove>) -> GameSession {
    SessionBuilder::new()
        .with_seeds(SEED_A, SEED_B)
        .with_peer(Box::new(ScriptedPeer::new(peer_moves)))
        .start_session()
        .expect("default arena is valid")
}

/// Like [`scripted_session`], with a collecting observer attached.
pub fn collecting_session(
    peer_moves: Vec<PlayerMove>,
) -> (GameSession, Arc<CollectingObserver>) {
    let observer = Arc::new(CollectingObserver::new());
    let session = SessionBuilder::new()
        .with_seeds(SEED_A, SEED_B)
        .with_peer(Box::new(ScriptedPeer::new(peer_moves)))
        .with_violation_observer(observer.clone())
        .start_session()
        .expect("default arena is valid");
    (session, observer)
}

/// Enters the aiming state matching `mv` and confirms it.
pub fn play_turn(session: &mut GameSession, mv: PlayerMove) -> Option<SyncReport> {
    let state = match mv {
        PlayerMove::Accelerate { .. } => TurnState::Accelerate,
        PlayerMove::Shoot { .. } => TurnState::Shoot,
    };
    session.request_transition(state);
    session.confirm(mv)
}

/// Plays `RandomPeer(local_seed)` against `RandomPeer(peer_seed)` until someone wins or
/// [`MAX_TURNS`] is reached. The local side aims with its own random peer policy.
pub fn play_random_match(seeds: (u32, u32), local_seed: u32, peer_seed: u32) -> GameSession {
    use lockstep_duel::{PeerMoveSource, PeerView};

    let mut session = SessionBuilder::new()
        .with_seeds(seeds.0, seeds.1)
        .with_peer(Box::new(RandomPeer::new(peer_seed)))
        .start_session()
        .expect("default arena is valid");
    let mut local = RandomPeer::new(local_seed);

    for _ in 0..MAX_TURNS {
        if session.state() == TurnState::GameOver {
            break;
        }
        let side = session.local_side();
        let view = PeerView {
            side,
            own_log: session.log(side),
            opponent_log: session.log(side.opponent()),
            last_shot: session.shots(side).last().copied(),
            arena: session.arena(),
        };
        let mv = local.produce_next_move(&view);
        play_turn(&mut session, mv).expect("finite move in an aiming state is accepted");
    }
    session
}

/// Replays `source` from the other side's point of view.
///
/// The mirror plays `source`'s remote moves locally and receives `source`'s local moves from
/// a scripted peer, which is exactly what a real remote peer would observe.
pub fn mirror_match(source: &GameSession) -> GameSession {
    let local = source.remote_side();
    let mut mirror = SessionBuilder::new()
        .with_seeds(source.seed(Side::A), source.seed(Side::B))
        .with_arena(*source.arena())
        .with_local_side(local)
        .with_peer(Box::new(ScriptedPeer::from_log(source.log(source.local_side()))))
        .start_session()
        .expect("source arena is valid");

    for mv in source.log(local).player_moves() {
        play_turn(&mut mirror, mv).expect("recorded move is accepted");
    }
    mirror
}
