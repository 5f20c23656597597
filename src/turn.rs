//! Turn state machine gating which move a side may submit and when a sync runs.
//!
//! # State Machine Diagram
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!                 ▼                              │ prompt
//!           ┌──────────┐                    ┌────┴─────┐
//!           │  Prompt  │                    │   Sync   │
//!           └────┬─────┘                    └──────────┘
//!                │ accelerate / shoot / analyze   ▲
//!                ▼                                │ sync
//!   ┌────────────────┐  shoot   ┌──────────┐      │
//!   │   Accelerate   │ ───────► │  Shoot   │ ─────┤
//!   │                │ ◄─────── │          │      │
//!   └───────┬────────┘ accel.   └────┬─────┘      │
//!           │ ▲ ─────────────────────┼────────────┘
//!  analyze  │ │ accelerate / shoot   │ analyze
//!           ▼ │                      ▼
//!         ┌───┴────────────────────────┐
//!         │          Analyze           │
//!         └────────────────────────────┘
//!
//!   GameOver: reachable from every state, never left.
//! ```
//!
//! ## State Transitions
//!
//! | From       | Allowed next                 |
//! |------------|------------------------------|
//! | Prompt     | Shoot, Accelerate, Analyze   |
//! | Accelerate | Shoot, Sync, Analyze         |
//! | Shoot      | Accelerate, Sync, Analyze    |
//! | Analyze    | Shoot, Accelerate            |
//! | Sync       | Prompt                       |
//! | GameOver   | (none)                       |
//!
//! Every request outside this table is ignored: the state machine is a partial function and
//! late or duplicated input is never an error.

use tracing::trace;

/// The phase a session is in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum TurnState {
    /// Waiting for the player to pick an action.
    #[default]
    Prompt,
    /// Aiming thrust; a confirmed `Accelerate` move ends it.
    Accelerate,
    /// Aiming a shot; a confirmed `Shoot` move ends it.
    Shoot,
    /// Inspecting previous shots. Submits nothing.
    Analyze,
    /// Moves are exchanged and both replays run.
    Sync,
    /// A winner is decided. Terminal.
    GameOver,
}

impl TurnState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Prompt,
        Self::Accelerate,
        Self::Shoot,
        Self::Analyze,
        Self::Sync,
        Self::GameOver,
    ];

    /// States reachable from `self` by an ordinary request. `GameOver` is implicit and not
    /// listed.
    #[must_use]
    pub const fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Prompt => &[Self::Shoot, Self::Accelerate, Self::Analyze],
            Self::Accelerate => &[Self::Shoot, Self::Sync, Self::Analyze],
            Self::Shoot => &[Self::Accelerate, Self::Sync, Self::Analyze],
            Self::Analyze => &[Self::Shoot, Self::Accelerate],
            Self::Sync => &[Self::Prompt],
            Self::GameOver => &[],
        }
    }

    /// Whether a request for `next` is honoured from `self`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == Self::GameOver {
            return false;
        }
        next == Self::GameOver || self.allowed_next().contains(&next)
    }

    /// Returns a string representation suitable for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Accelerate => "accelerate",
            Self::Shoot => "shoot",
            Self::Analyze => "analyze",
            Self::Sync => "sync",
            Self::GameOver => "gameover",
        }
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds the current [`TurnState`] and applies the transition table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnStateMachine {
    state: TurnState,
}

impl TurnStateMachine {
    /// A machine in `Prompt`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: TurnState::Prompt,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.state
    }

    /// Moves to `requested` if the table allows it. Returns whether the state changed.
    ///
    /// `GameOver` is accepted from every non-terminal state.
    pub fn transition(&mut self, requested: TurnState) -> bool {
        if !self.state.can_transition_to(requested) {
            trace!(from = %self.state, to = %requested, "transition ignored");
            return false;
        }
        trace!(from = %self.state, to = %requested, "transition");
        self.state = requested;
        true
    }

    /// True in `GameOver`.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.state == TurnState::GameOver
    }
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

    fn machine_in(state: TurnState) -> TurnStateMachine {
        TurnStateMachine { state }
    }

    #[test]
    fn starts_in_prompt() {
        let machine = TurnStateMachine::new();
        assert_eq!(machine.state(), TurnState::Prompt);
        assert_eq!(TurnStateMachine::default(), machine);
        assert!(!machine.is_over());
    }

    #[test]
    fn full_turn_cycle() {
        let mut machine = TurnStateMachine::new();
        assert!(machine.transition(TurnState::Accelerate));
        assert!(machine.transition(TurnState::Shoot));
        assert!(machine.transition(TurnState::Analyze));
        assert!(machine.transition(TurnState::Shoot));
        assert!(machine.transition(TurnState::Sync));
        assert!(machine.transition(TurnState::Prompt));
        assert_eq!(machine.state(), TurnState::Prompt);
    }

    #[test]
    fn prompt_cannot_jump_to_sync() {
        let mut machine = TurnStateMachine::new();
        assert!(!machine.transition(TurnState::Sync));
        assert_eq!(machine.state(), TurnState::Prompt);
    }

    #[test]
    fn analyze_cannot_sync() {
        let mut machine = machine_in(TurnState::Analyze);
        assert!(!machine.transition(TurnState::Sync));
        assert!(!machine.transition(TurnState::Prompt));
        assert_eq!(machine.state(), TurnState::Analyze);
    }

    #[test]
    fn self_transitions_are_ignored() {
        for state in TurnState::ALL {
            let mut machine = machine_in(state);
            assert!(!machine.transition(state), "{state} -> {state}");
            assert_eq!(machine.state(), state);
        }
    }

    #[test]
    fn gameover_reachable_from_everywhere_and_absorbing() {
        for state in TurnState::ALL {
            let mut machine = machine_in(state);
            machine.transition(TurnState::GameOver);
            assert!(machine.is_over());
            for next in TurnState::ALL {
                assert!(!machine.transition(next));
                assert_eq!(machine.state(), TurnState::GameOver);
            }
        }
    }

    #[test]
    fn display_labels() {
        assert_eq!(TurnState::GameOver.to_string(), "gameover");
        assert_eq!(TurnState::Analyze.as_str(), "analyze");
    }
}
