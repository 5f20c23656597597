//! Exhaustive check of the turn transition table.
//!
//! One generated test per `(from, requested)` pair, so a failure names the exact pair.

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use lockstep_duel::{TurnState, TurnStateMachine};

/// Legal requests that lead from `Prompt` to `state`.
fn path_to(state: TurnState) -> &'static [TurnState] {
    match state {
        TurnState::Prompt => &[],
        TurnState::Accelerate => &[TurnState::Accelerate],
        TurnState::Shoot => &[TurnState::Shoot],
        TurnState::Analyze => &[TurnState::Analyze],
        TurnState::Sync => &[TurnState::Shoot, TurnState::Sync],
        TurnState::GameOver => &[TurnState::GameOver],
    }
}

fn machine_in(state: TurnState) -> TurnStateMachine {
    let mut machine = TurnStateMachine::new();
    for &step in path_to(state) {
        assert!(machine.transition(step), "setup step {step} rejected");
    }
    assert_eq!(machine.state(), state);
    machine
}

fn check_transition(from: TurnState, requested: TurnState, allowed: bool) {
    let mut machine = machine_in(from);
    assert_eq!(
        machine.transition(requested),
        allowed,
        "{from} -> {requested}"
    );
    let expected = if allowed { requested } else { from };
    assert_eq!(machine.state(), expected, "{from} -> {requested}");
}

macro_rules! transition_cases {
    ($($from:ident => $to:ident : $allowed:expr),* $(,)?) => {
        pastey::paste! {
            $(
                #[test]
                fn [<transition_ $from:snake _to_ $to:snake>]() {
                    check_transition(TurnState::$from, TurnState::$to, $allowed);
                }
            )*
        }
    };
}

transition_cases! {
    Prompt => Prompt: false,
    Prompt => Accelerate: true,
    Prompt => Shoot: true,
    Prompt => Analyze: true,
    Prompt => Sync: false,
    Prompt => GameOver: true,

    Accelerate => Prompt: false,
    Accelerate => Accelerate: false,
    Accelerate => Shoot: true,
    Accelerate => Analyze: true,
    Accelerate => Sync: true,
    Accelerate => GameOver: true,

    Shoot => Prompt: false,
    Shoot => Accelerate: true,
    Shoot => Shoot: false,
    Shoot => Analyze: true,
    Shoot => Sync: true,
    Shoot => GameOver: true,

    Analyze => Prompt: false,
    Analyze => Accelerate: true,
    Analyze => Shoot: true,
    Analyze => Analyze: false,
    Analyze => Sync: false,
    Analyze => GameOver: true,

    Sync => Prompt: true,
    Sync => Accelerate: false,
    Sync => Shoot: false,
    Sync => Analyze: false,
    Sync => Sync: false,
    Sync => GameOver: true,

    GameOver => Prompt: false,
    GameOver => Accelerate: false,
    GameOver => Shoot: false,
    GameOver => Analyze: false,
    GameOver => Sync: false,
    GameOver => GameOver: false,
}

/// The generated cases above cover the whole table
#[test]
fn transition_table_is_consistent_with_allowed_next() {
    let mut allowed = 0;
    for from in TurnState::ALL {
        for to in TurnState::ALL {
            if from.can_transition_to(to) {
                allowed += 1;
            }
        }
    }
    // Twelve table entries plus GameOver from five live states
    assert_eq!(allowed, 17);
}
