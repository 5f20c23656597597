use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::body::Body;
use crate::checksum::SyncChecksums;
use crate::move_log::{MoveKind, MoveLog, PlayerMove};
use crate::peer::{PeerMoveSource, PeerView};
use crate::replay::{replay_both, MatchVerdict, Shot};
use crate::sessions::config::ArenaConfig;
use crate::telemetry::{
    report_to_observer, InvariantChecker, Violation, ViolationKind, ViolationObserver,
    ViolationSeverity,
};
use crate::turn::{TurnState, TurnStateMachine};
use crate::vector::Vector2;
use crate::{
    debug_check_invariants, report_violation_to, DesyncDetection, DuelError, DuelResult, Side,
    Turn,
};

/// Result of one completed sync.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncReport {
    /// The turn reached by this sync.
    pub turn: Turn,
    /// The session winner after this sync.
    pub winner: Option<Side>,
    /// Trajectory checksums to exchange with the remote peer.
    pub checksums: SyncChecksums,
    /// The move appended to the local log.
    pub local_move: PlayerMove,
    /// The move appended to the remote log.
    pub peer_move: PlayerMove,
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Current turn state.
    pub state: TurnState,
    /// Completed syncs.
    pub turn: Turn,
    /// Bodies of side A and side B, in that order.
    pub bodies: [Body; 2],
    /// Resolved shots of side A and side B, in that order.
    pub shots: [Vec<Shot>; 2],
    /// The winner, once decided.
    pub winner: Option<Side>,
}

impl SessionSnapshot {
    /// `side`'s body.
    #[must_use]
    pub fn body(&self, side: Side) -> &Body {
        &self.bodies[side.index()]
    }

    /// `side`'s resolved shots.
    #[must_use]
    pub fn shots(&self, side: Side) -> &[Shot] {
        &self.shots[side.index()]
    }
}

/// A two-player duel played in lockstep against a [`PeerMoveSource`].
///
/// The session owns both move logs and both bodies. Input arrives as transition requests and
/// move confirmations; each confirmed move triggers one sync which appends one move per side,
/// replays both perspectives from scratch and publishes the resulting bodies and shots.
///
/// Bodies are never written anywhere except from a replay result, so what is rendered is
/// always what the logs imply.
pub struct GameSession {
    arena: ArenaConfig,
    local_side: Side,
    machine: TurnStateMachine,
    /// Kind of move the pending sync accepts, set when entering `Sync`.
    aiming: Option<MoveKind>,
    turn: Turn,
    winner: Option<Side>,
    logs: [MoveLog; 2],
    bodies: [Body; 2],
    shots: [Vec<Shot>; 2],
    peer: Box<dyn PeerMoveSource>,
    desync_detection: DesyncDetection,
    checksum_history: BTreeMap<Turn, SyncChecksums>,
    max_checksum_history: usize,
    /// Optional observer for violations.
    violation_observer: Option<Arc<dyn ViolationObserver>>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            arena,
            local_side,
            machine,
            aiming,
            turn,
            winner,
            logs,
            bodies,
            shots,
            peer: _,
            desync_detection,
            checksum_history,
            max_checksum_history,
            violation_observer,
        } = self;

        f.debug_struct("GameSession")
            .field("arena", arena)
            .field("local_side", local_side)
            .field("state", &machine.state())
            .field("aiming", aiming)
            .field("turn", turn)
            .field("winner", winner)
            .field("logs", logs)
            .field("bodies", bodies)
            .field("shots", shots)
            .field("desync_detection", desync_detection)
            .field("checksum_history_len", &checksum_history.len())
            .field("max_checksum_history", max_checksum_history)
            .field("has_violation_observer", &violation_observer.is_some())
            .finish_non_exhaustive()
    }
}

impl GameSession {
    pub(crate) fn new(
        seeds: [u32; 2],
        arena: ArenaConfig,
        local_side: Side,
        peer: Box<dyn PeerMoveSource>,
        desync_detection: DesyncDetection,
        max_checksum_history: usize,
        violation_observer: Option<Arc<dyn ViolationObserver>>,
    ) -> DuelResult<Self> {
        let logs = [MoveLog::new(seeds[0]), MoveLog::new(seeds[1])];
        // Turn 0 goes through the same replay as every later turn
        let verdict = replay_both(&logs[0], &logs[1], &arena)?;

        let mut checksum_history = BTreeMap::new();
        checksum_history.insert(Turn::ZERO, verdict.checksums);

        let session = Self {
            arena,
            local_side,
            machine: TurnStateMachine::new(),
            aiming: None,
            turn: Turn::ZERO,
            winner: None,
            bodies: [*verdict.body(Side::A), *verdict.body(Side::B)],
            shots: [Vec::new(), Vec::new()],
            logs,
            peer,
            desync_detection,
            checksum_history,
            max_checksum_history: max_checksum_history.max(1),
            violation_observer,
        };
        session.check_bodies_in_arena(Turn::ZERO);
        Ok(session)
    }

    /// Forwards a transition request to the turn state machine.
    ///
    /// Returns `false` and changes nothing when the request is not allowed from the current
    /// state. Requesting `GameOver` ends the session without a winner.
    ///
    /// Entering `Sync` remembers whether it came from `Accelerate` or `Shoot`; the following
    /// [`update`](Self::update) only accepts a move of that kind.
    pub fn request_transition(&mut self, requested: TurnState) -> bool {
        let from = self.machine.state();
        if !self.machine.transition(requested) {
            debug!(%from, to = %requested, "transition request ignored");
            return false;
        }
        if requested == TurnState::Sync {
            self.aiming = match from {
                TurnState::Accelerate => Some(MoveKind::Accelerate),
                TurnState::Shoot => Some(MoveKind::Shoot),
                _ => None,
            };
        }
        true
    }

    /// Confirms the move being aimed in `Accelerate` or `Shoot` and runs the sync.
    ///
    /// The move's kind must match the current state and its payload must be finite; anything
    /// else is ignored and returns `None` with the state unchanged.
    ///
    /// ```
    /// use lockstep_duel::{PlayerMove, ScriptedPeer, SessionBuilder, TurnState};
    ///
    /// let mut session = SessionBuilder::new()
    ///     .with_seeds(1, 2)
    ///     .with_peer(Box::new(ScriptedPeer::default()))
    ///     .start_session()?;
    ///
    /// session.request_transition(TurnState::Shoot);
    /// // Wrong kind for the Shoot state
    /// assert!(session.confirm(PlayerMove::accelerate(1.0, 0.0)).is_none());
    /// assert!(session.confirm(PlayerMove::shoot(400.0, 300.0)).is_some());
    /// # Ok::<(), lockstep_duel::DuelError>(())
    /// ```
    pub fn confirm(&mut self, mv: PlayerMove) -> Option<SyncReport> {
        let state = self.machine.state();
        let expected = match state {
            TurnState::Accelerate => MoveKind::Accelerate,
            TurnState::Shoot => MoveKind::Shoot,
            _ => {
                debug!(%state, kind = %mv.kind(), "confirm ignored outside an aiming state");
                return None;
            },
        };
        if mv.kind() != expected {
            debug!(%state, kind = %mv.kind(), "confirm ignored: move kind does not match state");
            return None;
        }
        if !mv.is_finite() {
            debug!(?mv, "confirm ignored: non-finite payload");
            return None;
        }
        if !self.request_transition(TurnState::Sync) {
            return None;
        }
        self.update(mv)
    }

    /// Runs one sync with `mv` as the local move. Only acts in `Sync`.
    ///
    /// Appends `mv` to the local log and one move from the peer source to the remote log,
    /// replays both perspectives A first, publishes bodies and shots, then moves to `Prompt`,
    /// or to `GameOver` once a winner is known.
    ///
    /// Returns `None` without side effects outside `Sync`, for a move whose kind differs from
    /// the aiming state that led to `Sync`, or for a non-finite `mv`. The logs only change
    /// once the replay over both new moves has succeeded.
    pub fn update(&mut self, mv: PlayerMove) -> Option<SyncReport> {
        if self.machine.state() != TurnState::Sync {
            debug!(state = %self.machine.state(), "update ignored outside sync");
            return None;
        }
        if self.aiming != Some(mv.kind()) {
            debug!(
                kind = %mv.kind(),
                aiming = ?self.aiming,
                "update ignored: move kind does not match aiming state"
            );
            return None;
        }
        if !mv.is_finite() {
            debug!(?mv, "update ignored: non-finite payload");
            return None;
        }
        let local = self.local_side;
        let remote = local.opponent();

        let peer_move = self.next_peer_move(remote);
        let mut logs = self.logs.clone();
        let pushed = logs[local.index()]
            .push(mv)
            .and_then(|()| logs[remote.index()].push(peer_move));
        if let Err(err) = pushed {
            // Both moves are finite at this point
            report_violation_to!(
                &self.violation_observer,
                ViolationSeverity::Critical,
                ViolationKind::InternalError,
                "move rejected after validation: {}",
                err
            );
            return None;
        }

        let turn = self.turn.next();
        let verdict = match replay_both(&logs[0], &logs[1], &self.arena) {
            Ok(verdict) => verdict,
            Err(err) => {
                report_violation_to!(
                    &self.violation_observer,
                    ViolationSeverity::Critical,
                    ViolationKind::InternalError,
                    "replay failed at turn {}: {}",
                    turn,
                    err
                );
                return None;
            },
        };
        self.logs = logs;
        self.aiming = None;

        if self.desync_detection == DesyncDetection::On {
            self.check_replay_is_stable(turn, &verdict);
        }
        self.report_unmatched_shots(turn, &verdict);
        let checksums = verdict.checksums;
        self.publish(turn, verdict);

        let next = if self.winner.is_some() {
            TurnState::GameOver
        } else {
            TurnState::Prompt
        };
        self.machine.transition(next);

        match self.winner {
            Some(winner) => info!(%turn, %winner, "sync complete, game over"),
            None => info!(%turn, "sync complete"),
        }

        Some(SyncReport {
            turn,
            winner: self.winner,
            checksums,
            local_move: mv,
            peer_move,
        })
    }

    /// Compares checksums received from the remote peer with the local history.
    ///
    /// Turns that were never recorded or have been evicted are accepted, since there is nothing
    /// left to compare against.
    ///
    /// # Errors
    /// - Returns [`DuelError::MismatchedChecksum`] for the first side whose checksum differs,
    ///   after reporting a `Critical` determinism violation.
    pub fn verify_remote_checksums(&self, turn: Turn, remote: SyncChecksums) -> DuelResult<()> {
        let Some(local) = self.checksum_history.get(&turn) else {
            trace!(%turn, "no local checksums recorded, skipping remote verification");
            return Ok(());
        };

        for side in Side::BOTH {
            let (ours, theirs) = (local.get(side), remote.get(side));
            if ours != theirs {
                let violation = Violation::new(
                    ViolationSeverity::Critical,
                    ViolationKind::Determinism,
                    "remote trajectory checksum differs from local replay",
                    concat!(file!(), ":", line!()),
                )
                .with_turn(turn)
                .with_context("side", side.to_string())
                .with_context("local", format!("{ours:#x}"))
                .with_context("remote", format!("{theirs:#x}"));
                report_to_observer(self.violation_observer.as_ref(), &violation);

                return Err(DuelError::MismatchedChecksum {
                    turn,
                    side,
                    local: ours,
                    remote: theirs,
                });
            }
        }
        Ok(())
    }

    /// Acceleration payload that points the local body at `point`.
    ///
    /// Pointer input is absolute; the move stores the offset from the body's current position.
    #[must_use]
    pub fn aim_from_pointer(&self, point: Vector2) -> PlayerMove {
        let offset = point - self.bodies[self.local_side.index()].position;
        PlayerMove::accelerate(offset.x, offset.y)
    }

    /// A copy of everything a renderer draws.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.machine.state(),
            turn: self.turn,
            bodies: self.bodies,
            shots: self.shots.clone(),
            winner: self.winner,
        }
    }

    /// Current turn state.
    #[must_use]
    pub fn state(&self) -> TurnState {
        self.machine.state()
    }

    /// Completed syncs.
    #[must_use]
    pub fn turn(&self) -> Turn {
        self.turn
    }

    /// The winner, once decided. Never changes after being set.
    #[must_use]
    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// `side`'s seed.
    #[must_use]
    pub fn seed(&self, side: Side) -> u32 {
        self.logs[side.index()].seed()
    }

    /// `side`'s body as of the last sync.
    #[must_use]
    pub fn body(&self, side: Side) -> &Body {
        &self.bodies[side.index()]
    }

    /// `side`'s resolved shots as of the last sync.
    #[must_use]
    pub fn shots(&self, side: Side) -> &[Shot] {
        &self.shots[side.index()]
    }

    /// `side`'s move log.
    #[must_use]
    pub fn log(&self, side: Side) -> &MoveLog {
        &self.logs[side.index()]
    }

    /// The side this process controls.
    #[must_use]
    pub fn local_side(&self) -> Side {
        self.local_side
    }

    /// The side played by the peer source.
    #[must_use]
    pub fn remote_side(&self) -> Side {
        self.local_side.opponent()
    }

    /// The arena.
    #[must_use]
    pub fn arena(&self) -> &ArenaConfig {
        &self.arena
    }

    /// Desync detection mode.
    #[must_use]
    pub fn desync_detection(&self) -> DesyncDetection {
        self.desync_detection
    }

    /// Checksums recorded for `turn`, if still in the history.
    #[must_use]
    pub fn checksums(&self, turn: Turn) -> Option<SyncChecksums> {
        self.checksum_history.get(&turn).copied()
    }

    /// Returns the violation observer, if one was configured.
    #[must_use]
    pub fn violation_observer(&self) -> Option<&Arc<dyn ViolationObserver>> {
        self.violation_observer.as_ref()
    }

    fn next_peer_move(&mut self, remote: Side) -> PlayerMove {
        let view = PeerView {
            side: remote,
            own_log: &self.logs[remote.index()],
            opponent_log: &self.logs[remote.opponent().index()],
            last_shot: self.shots[remote.index()].last().copied(),
            arena: &self.arena,
        };
        let mv = self.peer.produce_next_move(&view);
        if mv.is_finite() {
            return mv;
        }

        report_violation_to!(
            &self.violation_observer,
            ViolationSeverity::Warning,
            ViolationKind::PeerInput,
            "peer produced a non-finite {} move, substituting zero thrust: {:?}",
            mv.kind(),
            mv
        );
        PlayerMove::accelerate(0.0, 0.0)
    }

    /// Replays a second time and compares with the first run.
    fn check_replay_is_stable(&self, turn: Turn, first: &MatchVerdict) {
        let second = match replay_both(&self.logs[0], &self.logs[1], &self.arena) {
            Ok(second) => second,
            Err(err) => {
                report_violation_to!(
                    &self.violation_observer,
                    ViolationSeverity::Error,
                    ViolationKind::InternalError,
                    "desync check replay failed at turn {}: {}",
                    turn,
                    err
                );
                return;
            },
        };
        if second.checksums != first.checksums || second.winner != first.winner {
            let violation = Violation::new(
                ViolationSeverity::Critical,
                ViolationKind::Determinism,
                "replaying the same logs twice gave different results",
                concat!(file!(), ":", line!()),
            )
            .with_turn(turn)
            .with_context("first", format!("{:?}", first.checksums))
            .with_context("second", format!("{:?}", second.checksums));
            report_to_observer(self.violation_observer.as_ref(), &violation);
        } else {
            trace!(%turn, "replay self-check passed");
        }
    }

    fn check_bodies_in_arena(&self, turn: Turn) {
        for body in &self.bodies {
            if let Err(broken) = body.in_arena(&self.arena).check_invariants() {
                report_violation_to!(
                    &self.violation_observer,
                    ViolationSeverity::Critical,
                    ViolationKind::ArenaBounds,
                    "turn {}: {}",
                    turn,
                    broken
                );
            }
        }
    }

    fn report_unmatched_shots(&self, turn: Turn, verdict: &MatchVerdict) {
        for side in Side::BOTH {
            let outcome = verdict.outcome(side);
            if !outcome.unmatched_shots.is_empty() {
                report_violation_to!(
                    &self.violation_observer,
                    ViolationSeverity::Warning,
                    ViolationKind::MoveLog,
                    "turn {}: side {} shots at {:?} have no opponent position",
                    turn,
                    side,
                    outcome.unmatched_shots
                );
            }
        }
    }

    fn publish(&mut self, turn: Turn, verdict: MatchVerdict) {
        self.bodies = [*verdict.body(Side::A), *verdict.body(Side::B)];
        self.check_bodies_in_arena(turn);
        debug_check_invariants!(self.logs[0], "side A log after sync");
        debug_check_invariants!(self.logs[1], "side B log after sync");

        if self.winner.is_none() {
            self.winner = verdict.winner;
        }

        self.checksum_history.insert(turn, verdict.checksums);
        while self.checksum_history.len() > self.max_checksum_history {
            self.checksum_history.pop_first();
        }

        let MatchVerdict { a, b, .. } = verdict;
        self.shots = [a.shots, b.shots];
        self.turn = turn;
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
    use crate::peer::ScriptedPeer;
    use crate::telemetry::CollectingObserver;
    use crate::SessionBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session_with(peer_moves: Vec<PlayerMove>) -> GameSession {
        SessionBuilder::new()
            .with_seeds(1, 2)
            .with_peer(Box::new(ScriptedPeer::new(peer_moves)))
            .start_session()
            .unwrap()
    }

    struct NanPeer;

    impl PeerMoveSource for NanPeer {
        fn produce_next_move(&mut self, _view: &PeerView<'_>) -> PlayerMove {
            PlayerMove::shoot(f64::NAN, 1.0)
        }
    }

    struct CountingPeer(Arc<AtomicUsize>);

    impl PeerMoveSource for CountingPeer {
        fn produce_next_move(&mut self, _view: &PeerView<'_>) -> PlayerMove {
            self.0.fetch_add(1, Ordering::SeqCst);
            PlayerMove::accelerate(0.0, 0.0)
        }
    }

    #[test]
    fn rejected_update_touches_neither_logs_nor_peer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut session = SessionBuilder::new()
            .with_seeds(1, 2)
            .with_peer(Box::new(CountingPeer(calls.clone())))
            .start_session()
            .unwrap();
        session.request_transition(TurnState::Shoot);
        session.request_transition(TurnState::Sync);

        assert!(session.update(PlayerMove::accelerate(1.0, 0.0)).is_none());
        assert!(session.update(PlayerMove::shoot(f64::NAN, 0.0)).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.log(Side::A).len(), 1);
        assert_eq!(session.log(Side::B).len(), 1);
        assert_eq!(session.aiming, Some(MoveKind::Shoot));

        assert!(session.update(PlayerMove::shoot(1.0, 1.0)).is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.aiming, None);
    }

    #[test]
    fn body_outside_arena_is_reported() {
        // Skips builder validation: with no margin seed 1 spawns at x = 4, radius 10
        let arena = ArenaConfig {
            width: 20,
            height: 20,
            spawn_margin: 0,
            ..ArenaConfig::default()
        };
        let observer = Arc::new(CollectingObserver::new());
        let shared: Arc<dyn ViolationObserver> = observer.clone();
        let _session = GameSession::new(
            [1, 2],
            arena,
            Side::A,
            Box::new(ScriptedPeer::default()),
            DesyncDetection::Off,
            4,
            Some(shared),
        )
        .unwrap();

        let reported = observer.violations_of_kind(ViolationKind::ArenaBounds);
        assert!(!reported.is_empty());
        assert_eq!(reported[0].severity, ViolationSeverity::Critical);
    }

    #[test]
    fn new_session_starts_at_spawn() {
        let session = session_with(vec![]);
        assert_eq!(session.state(), TurnState::Prompt);
        assert_eq!(session.turn(), Turn::ZERO);
        assert_eq!(session.winner(), None);
        assert_eq!(session.body(Side::A).position, Vector2::new(194.0, 224.0));
        assert_eq!(session.body(Side::B).position, Vector2::new(194.0, 276.0));
        assert!(session.shots(Side::A).is_empty());
        assert!(session.checksums(Turn::ZERO).is_some());
    }

    #[test]
    fn update_outside_sync_is_ignored() {
        let mut session = session_with(vec![]);
        assert!(session.update(PlayerMove::accelerate(1.0, 0.0)).is_none());
        assert_eq!(session.log(Side::A).len(), 1);
    }

    #[test]
    fn confirm_in_prompt_is_ignored() {
        let mut session = session_with(vec![]);
        assert!(session.confirm(PlayerMove::shoot(0.0, 0.0)).is_none());
        assert_eq!(session.state(), TurnState::Prompt);
    }

    #[test]
    fn confirm_rejects_non_finite_payload() {
        let mut session = session_with(vec![]);
        session.request_transition(TurnState::Accelerate);
        assert!(session
            .confirm(PlayerMove::accelerate(f64::INFINITY, 0.0))
            .is_none());
        assert_eq!(session.state(), TurnState::Accelerate);
        assert_eq!(session.turn(), Turn::ZERO);
    }

    #[test]
    fn sync_appends_one_move_per_side() {
        let mut session = session_with(vec![PlayerMove::shoot(1.0, 1.0)]);
        session.request_transition(TurnState::Accelerate);
        let report = session.confirm(PlayerMove::accelerate(0.0, 1.0)).unwrap();

        assert_eq!(report.turn, 1);
        assert_eq!(report.local_move, PlayerMove::accelerate(0.0, 1.0));
        assert_eq!(report.peer_move, PlayerMove::shoot(1.0, 1.0));
        assert_eq!(session.log(Side::A).len(), 2);
        assert_eq!(session.log(Side::B).len(), 2);
        assert_eq!(session.shots(Side::B).len(), 1);
        assert_eq!(session.state(), TurnState::Prompt);
        assert_eq!(session.checksums(Turn::new(1)), Some(report.checksums));
    }

    #[test]
    fn non_finite_peer_move_is_replaced() {
        let observer = Arc::new(CollectingObserver::new());
        let mut session = SessionBuilder::new()
            .with_seeds(1, 2)
            .with_peer(Box::new(NanPeer))
            .with_violation_observer(observer.clone())
            .start_session()
            .unwrap();
        session.request_transition(TurnState::Accelerate);
        let report = session.confirm(PlayerMove::accelerate(1.0, 0.0)).unwrap();

        assert_eq!(report.peer_move, PlayerMove::accelerate(0.0, 0.0));
        assert!(observer.has_violation(ViolationKind::PeerInput));
    }

    #[test]
    fn checksum_history_is_bounded() {
        let mut session = SessionBuilder::new()
            .with_seeds(1, 2)
            .with_peer(Box::new(ScriptedPeer::default()))
            .with_checksum_history(2)
            .unwrap()
            .start_session()
            .unwrap();
        for _ in 0..3 {
            session.request_transition(TurnState::Accelerate);
            session.confirm(PlayerMove::accelerate(0.0, 0.0)).unwrap();
        }
        assert_eq!(session.checksums(Turn::new(1)), None);
        assert!(session.checksums(Turn::new(2)).is_some());
        assert!(session.checksums(Turn::new(3)).is_some());
        // Evicted turns cannot be disputed
        assert!(session
            .verify_remote_checksums(Turn::new(1), SyncChecksums::default())
            .is_ok());
    }

    #[test]
    fn verify_remote_checksums_detects_mismatch() {
        let observer = Arc::new(CollectingObserver::new());
        let session = SessionBuilder::new()
            .with_seeds(1, 2)
            .with_peer(Box::new(ScriptedPeer::default()))
            .with_violation_observer(observer.clone())
            .start_session()
            .unwrap();
        let local = session.checksums(Turn::ZERO).unwrap();
        assert!(session.verify_remote_checksums(Turn::ZERO, local).is_ok());

        let tampered = SyncChecksums {
            b: local.b ^ 1,
            ..local
        };
        let err = session
            .verify_remote_checksums(Turn::ZERO, tampered)
            .unwrap_err();
        assert_eq!(
            err,
            DuelError::MismatchedChecksum {
                turn: Turn::ZERO,
                side: Side::B,
                local: local.b,
                remote: local.b ^ 1,
            }
        );
        assert!(observer.has_violation(ViolationKind::Determinism));
    }

    #[test]
    fn aim_from_pointer_is_relative_to_body() {
        let session = session_with(vec![]);
        assert_eq!(
            session.aim_from_pointer(Vector2::new(200.0, 200.0)),
            PlayerMove::accelerate(6.0, -24.0)
        );
    }

    #[test]
    fn requesting_gameover_ends_without_winner() {
        let mut session = session_with(vec![]);
        assert!(session.request_transition(TurnState::GameOver));
        assert_eq!(session.state(), TurnState::GameOver);
        assert_eq!(session.winner(), None);
        assert!(!session.request_transition(TurnState::Prompt));
    }

    #[test]
    fn snapshot_mirrors_session() {
        let session = session_with(vec![]);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, session.state());
        assert_eq!(snapshot.body(Side::B), session.body(Side::B));
        assert!(snapshot.shots(Side::A).is_empty());
        assert_eq!(snapshot.winner, None);
    }

    #[test]
    fn debug_output_omits_peer() {
        let session = session_with(vec![]);
        let rendered = format!("{session:?}");
        assert!(rendered.contains("GameSession"));
        assert!(rendered.contains("has_violation_observer: false"));
    }
}
