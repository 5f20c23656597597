use std::sync::Arc;

use tracing::debug;

use crate::peer::{PeerMoveSource, RandomPeer};
use crate::rng::random_seed;
use crate::sessions::config::ArenaConfig;
use crate::sessions::game_session::GameSession;
use crate::telemetry::{ViolationKind, ViolationObserver, ViolationSeverity};
use crate::{report_violation_to, DesyncDetection, DuelError, DuelResult, Side};

/// Default desync detection mode.
///
/// Re-running the replay costs one extra pass over two short logs per sync, and it turns a
/// non-deterministic peer source or a platform float difference into a reported violation
/// instead of a silent split between the two peers.
const DEFAULT_DETECTION_MODE: DesyncDetection = DesyncDetection::On;
/// Default number of turns whose checksums are kept for remote verification.
const DEFAULT_CHECKSUM_HISTORY: usize = 32;
const DEFAULT_LOCAL_SIDE: Side = Side::A;

/// The [`SessionBuilder`] builds a [`GameSession`].
///
/// Every setting has a default. Without [`with_seeds`](Self::with_seeds) both seeds are drawn
/// from [`random_seed`]; without [`with_peer`](Self::with_peer) the remote side is a
/// [`RandomPeer`] seeded from entropy.
///
/// ```
/// use lockstep_duel::{ArenaConfig, SessionBuilder, Side};
///
/// let session = SessionBuilder::new()
///     .with_seeds(10, 20)
///     .with_arena(ArenaConfig::compact())
///     .with_local_side(Side::B)
///     .with_checksum_history(8)?
///     .start_session()?;
///
/// assert_eq!(session.seed(Side::A), 10);
/// assert_eq!(session.remote_side(), Side::A);
/// # Ok::<(), lockstep_duel::DuelError>(())
/// ```
#[must_use = "SessionBuilder must be consumed by calling start_session"]
pub struct SessionBuilder {
    seeds: Option<(u32, u32)>,
    arena: ArenaConfig,
    local_side: Side,
    peer: Option<Box<dyn PeerMoveSource>>,
    desync_detection: DesyncDetection,
    checksum_history: usize,
    violation_observer: Option<Arc<dyn ViolationObserver>>,
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Destructure so a new field cannot be forgotten here
        let Self {
            seeds,
            arena,
            local_side,
            peer,
            desync_detection,
            checksum_history,
            violation_observer,
        } = self;

        f.debug_struct("SessionBuilder")
            .field("seeds", seeds)
            .field("arena", arena)
            .field("local_side", local_side)
            .field("has_peer", &peer.is_some())
            .field("desync_detection", desync_detection)
            .field("checksum_history", checksum_history)
            .field("has_violation_observer", &violation_observer.is_some())
            .finish()
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Construct a new builder with all values set to their defaults.
    pub fn new() -> Self {
        Self {
            seeds: None,
            arena: ArenaConfig::default(),
            local_side: DEFAULT_LOCAL_SIDE,
            peer: None,
            desync_detection: DEFAULT_DETECTION_MODE,
            checksum_history: DEFAULT_CHECKSUM_HISTORY,
            violation_observer: None,
        }
    }

    /// Sets the seeds of side A and side B.
    ///
    /// Both peers must start from the same pair or their replays diverge from the first sync.
    pub fn with_seeds(mut self, seed_a: u32, seed_b: u32) -> Self {
        self.seeds = Some((seed_a, seed_b));
        self
    }

    /// Sets the arena. It is validated by [`start_session`](Self::start_session).
    pub fn with_arena(mut self, arena: ArenaConfig) -> Self {
        self.arena = arena;
        self
    }

    /// Sets the side this process controls. The peer source plays the other one.
    pub fn with_local_side(mut self, side: Side) -> Self {
        self.local_side = side;
        self
    }

    /// Sets where the remote side's moves come from.
    pub fn with_peer(mut self, peer: Box<dyn PeerMoveSource>) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Turns the per-sync replay self-check on or off.
    pub fn with_desync_detection(mut self, desync_detection: DesyncDetection) -> Self {
        self.desync_detection = desync_detection;
        self
    }

    /// Sets how many turns of checksums are kept for
    /// [`GameSession::verify_remote_checksums`].
    ///
    /// # Errors
    /// - Returns [`DuelError::InvalidConfig`] if `len` is zero.
    pub fn with_checksum_history(mut self, len: usize) -> DuelResult<Self> {
        if len == 0 {
            return Err(DuelError::InvalidConfig {
                field: "checksum_history",
                reason: "must keep at least one turn".to_owned(),
            });
        }
        self.checksum_history = len;
        Ok(self)
    }

    /// Sets a custom observer for violations detected during the session.
    ///
    /// Without one, violations are logged through `tracing`.
    ///
    /// ```
    /// use lockstep_duel::SessionBuilder;
    /// use lockstep_duel::telemetry::CollectingObserver;
    /// use std::sync::Arc;
    ///
    /// let observer = Arc::new(CollectingObserver::new());
    /// let session = SessionBuilder::new()
    ///     .with_seeds(1, 2)
    ///     .with_violation_observer(observer.clone())
    ///     .start_session()?;
    ///
    /// assert!(session.violation_observer().is_some());
    /// assert!(observer.is_empty());
    /// # Ok::<(), lockstep_duel::DuelError>(())
    /// ```
    pub fn with_violation_observer(mut self, observer: Arc<dyn ViolationObserver>) -> Self {
        self.violation_observer = Some(observer);
        self
    }

    /// Consumes the builder and starts a session in `Prompt` at turn 0.
    ///
    /// # Errors
    /// - Returns [`DuelError::InvalidConfig`] if the arena fails
    ///   [`ArenaConfig::validate`].
    pub fn start_session(self) -> DuelResult<GameSession> {
        if let Err(err) = self.arena.validate() {
            report_violation_to!(
                &self.violation_observer,
                ViolationSeverity::Error,
                ViolationKind::Configuration,
                "session not started: {}",
                err
            );
            return Err(err);
        }

        let (seed_a, seed_b) = self
            .seeds
            .unwrap_or_else(|| (random_seed(), random_seed()));
        let peer = self
            .peer
            .unwrap_or_else(|| Box::new(RandomPeer::from_entropy()));

        debug!(
            seed_a,
            seed_b,
            local_side = %self.local_side,
            "starting session"
        );

        GameSession::new(
            [seed_a, seed_b],
            self.arena,
            self.local_side,
            peer,
            self.desync_detection,
            self.checksum_history,
            self.violation_observer,
        )
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
    use crate::telemetry::CollectingObserver;
    use crate::{ScriptedPeer, TurnState};

    #[test]
    fn defaults() {
        let builder = SessionBuilder::new();
        assert_eq!(builder.seeds, None);
        assert_eq!(builder.arena, ArenaConfig::default());
        assert_eq!(builder.local_side, Side::A);
        assert_eq!(builder.desync_detection, DesyncDetection::On);
        assert_eq!(builder.checksum_history, DEFAULT_CHECKSUM_HISTORY);
        assert!(builder.peer.is_none());
    }

    #[test]
    fn with_checksum_history_rejects_zero() {
        let err = SessionBuilder::new().with_checksum_history(0).unwrap_err();
        assert!(matches!(
            err,
            DuelError::InvalidConfig {
                field: "checksum_history",
                ..
            }
        ));
    }

    #[test]
    fn with_checksum_history_accepts_minimum() {
        let builder = SessionBuilder::new().with_checksum_history(1).unwrap();
        assert_eq!(builder.checksum_history, 1);
    }

    #[test]
    fn start_session_rejects_invalid_arena() {
        let arena = ArenaConfig {
            height: 0,
            ..ArenaConfig::default()
        };
        let err = SessionBuilder::new()
            .with_arena(arena)
            .start_session()
            .unwrap_err();
        assert!(matches!(err, DuelError::InvalidConfig { field: "height", .. }));
    }

    #[test]
    fn rejected_arena_is_reported_to_observer() {
        let observer = Arc::new(CollectingObserver::new());
        let arena = ArenaConfig {
            spawn_margin: 0,
            ..ArenaConfig::default()
        };
        let err = SessionBuilder::new()
            .with_arena(arena)
            .with_violation_observer(observer.clone())
            .start_session()
            .unwrap_err();

        assert!(matches!(err, DuelError::InvalidConfig { field: "spawn_margin", .. }));
        let reported = observer.violations_of_kind(ViolationKind::Configuration);
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].severity, ViolationSeverity::Error);
    }

    #[test]
    fn start_session_applies_settings() {
        let observer = Arc::new(CollectingObserver::new());
        let session = SessionBuilder::new()
            .with_seeds(5, 6)
            .with_arena(ArenaConfig::compact())
            .with_local_side(Side::B)
            .with_peer(Box::new(ScriptedPeer::default()))
            .with_desync_detection(DesyncDetection::Off)
            .with_violation_observer(observer)
            .start_session()
            .unwrap();

        assert_eq!(session.seed(Side::A), 5);
        assert_eq!(session.seed(Side::B), 6);
        assert_eq!(session.arena(), &ArenaConfig::compact());
        assert_eq!(session.local_side(), Side::B);
        assert_eq!(session.desync_detection(), DesyncDetection::Off);
        assert_eq!(session.state(), TurnState::Prompt);
        assert!(session.violation_observer().is_some());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let builder = SessionBuilder::new().with_peer(Box::new(ScriptedPeer::default()));
        let rendered = format!("{builder:?}");
        assert!(rendered.contains("has_peer: true"));
        assert!(rendered.contains("has_violation_observer: false"));
    }
}
