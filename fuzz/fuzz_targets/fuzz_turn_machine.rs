//! Fuzz target for a session driven by arbitrary input events.
//!
//! Models an input controller that sends transition requests and confirmations in any
//! order, with any payload, including NaN and infinities.
//!
//! # Safety Properties Tested
//!
//! - No panics for any event sequence
//! - Both logs always have the same length, one more than the turn count
//! - The turn only advances through a successful confirmation or update
//! - `GameOver` is never left and the winner never changes once set

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lockstep_duel::{
    DesyncDetection, PlayerMove, RandomPeer, SessionBuilder, Side, TurnState, Vector2,
};

#[derive(Debug, Clone, Copy, Arbitrary)]
enum State {
    Prompt,
    Accelerate,
    Shoot,
    Analyze,
    Sync,
    GameOver,
}

impl From<State> for TurnState {
    fn from(state: State) -> Self {
        match state {
            State::Prompt => Self::Prompt,
            State::Accelerate => Self::Accelerate,
            State::Shoot => Self::Shoot,
            State::Analyze => Self::Analyze,
            State::Sync => Self::Sync,
            State::GameOver => Self::GameOver,
        }
    }
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Event {
    Request(State),
    ConfirmAccelerate { dx: f64, dy: f64 },
    ConfirmShoot { x: f64, y: f64 },
    UpdateAccelerate { dx: f64, dy: f64 },
    UpdateShoot { x: f64, y: f64 },
    AimAt { x: f64, y: f64 },
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    seed_a: u32,
    seed_b: u32,
    peer_seed: u32,
    local_is_b: bool,
    events: Vec<Event>,
}

fuzz_target!(|input: FuzzInput| {
    let local = if input.local_is_b { Side::B } else { Side::A };
    let Ok(mut session) = SessionBuilder::new()
        .with_seeds(input.seed_a, input.seed_b)
        .with_local_side(local)
        .with_peer(Box::new(RandomPeer::new(input.peer_seed)))
        .with_desync_detection(DesyncDetection::Off)
        .start_session()
    else {
        return;
    };

    for event in input.events.into_iter().take(256) {
        let turn_before = session.turn();
        let state_before = session.state();
        let winner_before = session.winner();

        let synced = match event {
            Event::Request(state) => {
                session.request_transition(state.into());
                false
            },
            Event::ConfirmAccelerate { dx, dy } => {
                session.confirm(PlayerMove::accelerate(dx, dy)).is_some()
            },
            Event::ConfirmShoot { x, y } => session.confirm(PlayerMove::shoot(x, y)).is_some(),
            Event::UpdateAccelerate { dx, dy } => {
                session.update(PlayerMove::accelerate(dx, dy)).is_some()
            },
            Event::UpdateShoot { x, y } => session.update(PlayerMove::shoot(x, y)).is_some(),
            Event::AimAt { x, y } => {
                let mv = session.aim_from_pointer(Vector2::new(x, y));
                session.confirm(mv).is_some()
            },
        };

        let expected_turn = if synced { turn_before.next() } else { turn_before };
        assert_eq!(session.turn(), expected_turn);
        assert_eq!(session.log(Side::A).len(), session.log(Side::B).len());
        assert_eq!(session.log(Side::A).turns(), session.turn().as_u32() as usize);

        if state_before == TurnState::GameOver {
            assert_eq!(session.state(), TurnState::GameOver);
        }
        if winner_before.is_some() {
            assert_eq!(session.winner(), winner_before);
        }
    }
});
