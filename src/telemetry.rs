//! Structured telemetry for determinism and protocol violations.
//!
//! Most anomalies in a duel are not errors: a late click is ignored, a malformed peer move is
//! neutralized. They are still worth knowing about. Instead of just logging with
//! `tracing::warn!`, violations are structured data that can be:
//!
//! - Logged via tracing (the default)
//! - Collected programmatically for testing
//! - Sent to custom observers (metrics, alerting, a referee process)
//!
//! # Example
//!
//! ```
//! use lockstep_duel::telemetry::CollectingObserver;
//! use lockstep_duel::SessionBuilder;
//! use std::sync::Arc;
//!
//! let observer = Arc::new(CollectingObserver::new());
//! let session = SessionBuilder::new()
//!     .with_seeds(1, 2)
//!     .with_violation_observer(observer.clone())
//!     .start_session()
//!     .expect("default arena is valid");
//!
//! assert!(observer.violations().is_empty(), "unexpected violations");
//! # drop(session);
//! ```

use crate::Turn;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Severity of a violation.
///
/// Severities are ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    /// Unexpected but recoverable; a defined fallback was applied.
    ///
    /// Example: a peer move with a NaN coordinate was replaced by zero thrust.
    Warning,
    /// Serious issue; results may be degraded.
    ///
    /// Example: a shot with no matching opponent position was skipped.
    Error,
    /// The two peers can no longer be assumed to agree.
    ///
    /// Example: a remote trajectory checksum differs from ours.
    Critical,
}

impl ViolationSeverity {
    /// Returns a string representation suitable for logging/metrics labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories of violations, one per subsystem.
///
/// # Forward Compatibility
///
/// This enum is marked `#[non_exhaustive]`. Always include a wildcard arm when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ViolationKind {
    /// Replays or checksums disagree.
    ///
    /// Examples:
    /// - Local re-simulation produced a different trajectory
    /// - Remote checksum mismatch
    Determinism,
    /// Move log shape is off.
    ///
    /// Examples:
    /// - Own shot at an index the opponent log does not reach
    MoveLog,
    /// A published body lies outside the arena.
    ArenaBounds,
    /// The peer source produced something unusable.
    ///
    /// Examples:
    /// - Non-finite coordinates
    PeerInput,
    /// A session was refused because its configuration is invalid.
    Configuration,
    /// Runtime invariant check failed.
    ///
    /// Only checked in debug builds or when the `paranoid` feature is enabled.
    Invariant,
    /// Internal logic error (should never happen).
    InternalError,
}

impl ViolationKind {
    /// Returns a string representation suitable for logging/metrics labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Determinism => "determinism",
            Self::MoveLog => "move_log",
            Self::ArenaBounds => "arena_bounds",
            Self::PeerInput => "peer_input",
            Self::Configuration => "configuration",
            Self::Invariant => "invariant",
            Self::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded violation with its diagnostic context.
///
/// # Example
///
/// ```
/// use lockstep_duel::telemetry::{Violation, ViolationKind, ViolationSeverity};
/// use lockstep_duel::Turn;
///
/// let violation = Violation::new(
///     ViolationSeverity::Critical,
///     ViolationKind::Determinism,
///     "checksum mismatch",
///     "game_session.rs:42",
/// )
/// .with_turn(Turn::new(3))
/// .with_context("side", "B");
///
/// assert!(violation.to_string().contains("turn=3"));
/// ```
#[derive(Debug, Clone, serde::Serialize)]
pub struct Violation {
    /// The severity level of this violation.
    pub severity: ViolationSeverity,
    /// The subsystem where the violation occurred.
    pub kind: ViolationKind,
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Source location where the violation was detected (file:line).
    pub location: &'static str,
    /// The sync turn at which the violation occurred, if known.
    pub turn: Option<Turn>,
    /// Additional key-value context (sides, expected vs actual values).
    pub context: BTreeMap<String, String>,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        severity: ViolationSeverity,
        kind: ViolationKind,
        message: impl Into<String>,
        location: &'static str,
    ) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            location,
            turn: None,
            context: BTreeMap::new(),
        }
    }

    /// Sets the turn at which this violation occurred.
    #[must_use]
    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.turn = Some(turn);
        self
    }

    /// Adds a context key-value pair.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Serializes this violation to a JSON string.
    ///
    /// Returns `None` if serialization fails.
    #[cfg(feature = "json")]
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    /// Serializes this violation to a pretty-printed JSON string.
    #[cfg(feature = "json")]
    #[must_use]
    pub fn to_json_pretty(&self) -> Option<String> {
        serde_json::to_string_pretty(self).ok()
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}/{}] {} (at {}",
            self.severity, self.kind, self.message, self.location
        )?;
        if let Some(turn) = self.turn {
            write!(f, ", turn={turn}")?;
        }
        if !self.context.is_empty() {
            write!(f, ", context={:?}", self.context)?;
        }
        write!(f, ")")
    }
}

/// Trait for observing violations.
///
/// # Thread Safety
///
/// When the `sync-send` feature is enabled, observers must be `Send + Sync`.
///
/// # Example
///
/// ```
/// use lockstep_duel::telemetry::{Violation, ViolationObserver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct CountingObserver(AtomicUsize);
///
/// impl ViolationObserver for CountingObserver {
///     fn on_violation(&self, _violation: &Violation) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
#[cfg(feature = "sync-send")]
pub trait ViolationObserver: Send + Sync {
    /// Called when a violation is detected. Should return quickly.
    fn on_violation(&self, violation: &Violation);
}

#[cfg(not(feature = "sync-send"))]
/// Trait for observing violations.
pub trait ViolationObserver {
    /// Called when a violation is detected. Should return quickly.
    fn on_violation(&self, violation: &Violation);
}

/// Default observer: logs violations as structured `tracing` events.
///
/// - `Warning` → `tracing::warn!`
/// - `Error` and `Critical` → `tracing::error!`
///
/// Fields: `severity`, `kind`, `location`, `turn` (or `"null"`), `context`.
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

impl TracingObserver {
    /// Creates a new tracing observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn format_turn(turn: Option<Turn>) -> String {
        turn.map_or_else(|| "null".to_owned(), |t| t.to_string())
    }
}

impl ViolationObserver for TracingObserver {
    fn on_violation(&self, violation: &Violation) {
        let severity = violation.severity.as_str();
        let kind = violation.kind.as_str();
        let location = violation.location;
        let turn = Self::format_turn(violation.turn);

        let context = if violation.context.is_empty() {
            "{}".to_owned()
        } else {
            let pairs: Vec<String> = violation
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        };

        match violation.severity {
            ViolationSeverity::Warning => {
                tracing::warn!(
                    severity,
                    kind,
                    location,
                    turn = %turn,
                    context = %context,
                    "{}",
                    violation.message
                );
            },
            ViolationSeverity::Error | ViolationSeverity::Critical => {
                tracing::error!(
                    severity,
                    kind,
                    location,
                    turn = %turn,
                    context = %context,
                    "{}",
                    violation.message
                );
            },
        }
    }
}

/// Observer that stores every violation, for tests and post-match inspection.
///
/// # Example
///
/// ```
/// use lockstep_duel::telemetry::{
///     CollectingObserver, Violation, ViolationKind, ViolationObserver, ViolationSeverity,
/// };
///
/// let observer = CollectingObserver::new();
/// observer.on_violation(&Violation::new(
///     ViolationSeverity::Warning,
///     ViolationKind::PeerInput,
///     "NaN thrust",
///     "test.rs:1",
/// ));
///
/// assert_eq!(observer.len(), 1);
/// assert!(observer.has_violation(ViolationKind::PeerInput));
/// ```
#[derive(Debug, Default)]
pub struct CollectingObserver {
    violations: Mutex<Vec<Violation>>,
}

impl CollectingObserver {
    /// Creates a new collecting observer with an empty violation list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            violations: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of all collected violations.
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        self.violations.lock().clone()
    }

    /// Returns the number of collected violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.lock().len()
    }

    /// Returns true if no violations have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.lock().is_empty()
    }

    /// Checks if any violation of the specified kind has been collected.
    #[must_use]
    pub fn has_violation(&self, kind: ViolationKind) -> bool {
        self.violations.lock().iter().any(|v| v.kind == kind)
    }

    /// Checks if any violation with the specified severity has been collected.
    #[must_use]
    pub fn has_severity(&self, severity: ViolationSeverity) -> bool {
        self.violations
            .lock()
            .iter()
            .any(|v| v.severity == severity)
    }

    /// Returns all violations matching the specified kind.
    #[must_use]
    pub fn violations_of_kind(&self, kind: ViolationKind) -> Vec<Violation> {
        self.violations
            .lock()
            .iter()
            .filter(|v| v.kind == kind)
            .cloned()
            .collect()
    }

    /// Clears all collected violations.
    pub fn clear(&self) {
        self.violations.lock().clear();
    }
}

impl ViolationObserver for CollectingObserver {
    fn on_violation(&self, violation: &Violation) {
        self.violations.lock().push(violation.clone());
    }
}

/// Forwards every violation to several observers, e.g. logging plus collection.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ViolationObserver>>,
}

impl CompositeObserver {
    /// Creates a composite with no children.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Adds an observer.
    pub fn add(&mut self, observer: Arc<dyn ViolationObserver>) {
        self.observers.push(observer);
    }

    /// Creates a composite from a list of observers.
    #[must_use]
    pub fn from_observers(observers: Vec<Arc<dyn ViolationObserver>>) -> Self {
        Self { observers }
    }
}

impl ViolationObserver for CompositeObserver {
    fn on_violation(&self, violation: &Violation) {
        for observer in &self.observers {
            observer.on_violation(violation);
        }
    }
}

impl std::fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("num_observers", &self.observers.len())
            .finish()
    }
}

/// Reports a violation through [`TracingObserver`] with the current file and line.
///
/// ```
/// use lockstep_duel::{report_violation, telemetry::{ViolationKind, ViolationSeverity}};
///
/// report_violation!(ViolationSeverity::Warning, ViolationKind::MoveLog,
///     "shot at index {} has no opponent position", 4);
/// ```
#[macro_export]
macro_rules! report_violation {
    ($severity:expr, $kind:expr, $msg:literal) => {{
        use $crate::telemetry::ViolationObserver as _;
        let violation = $crate::telemetry::Violation::new(
            $severity,
            $kind,
            $msg,
            concat!(file!(), ":", line!()),
        );
        $crate::telemetry::TracingObserver.on_violation(&violation);
    }};

    ($severity:expr, $kind:expr, $fmt:literal, $($arg:tt)+) => {{
        use $crate::telemetry::ViolationObserver as _;
        let violation = $crate::telemetry::Violation::new(
            $severity,
            $kind,
            format!($fmt, $($arg)+),
            concat!(file!(), ":", line!()),
        );
        $crate::telemetry::TracingObserver.on_violation(&violation);
    }};
}

/// Asserts that an observer collected no violations.
///
/// # Panics
///
/// Panics if the observer contains any violations, printing them for debugging.
#[macro_export]
macro_rules! assert_no_violations {
    ($observer:expr) => {{
        let violations = $observer.violations();
        assert!(
            violations.is_empty(),
            "Expected no violations, but found {}:\n{:#?}",
            violations.len(),
            violations
        );
    }};
}

/// Asserts that a violation of the given kind was collected.
///
/// # Panics
///
/// Panics if no violation of the specified kind was found.
#[macro_export]
macro_rules! assert_violation {
    ($observer:expr, $kind:expr) => {{
        assert!(
            $observer.has_violation($kind),
            "Expected violation of kind {:?}, but found: {:#?}",
            $kind,
            $observer.violations()
        );
    }};
}

/// Sends `violation` to `observer`, or to [`TracingObserver`] when there is none.
pub fn report_to_observer<O: ViolationObserver + ?Sized>(
    observer: Option<&Arc<O>>,
    violation: &Violation,
) {
    match observer {
        Some(obs) => obs.on_violation(violation),
        None => TracingObserver.on_violation(violation),
    }
}

/// Reports a violation through an optional session observer.
///
/// Takes an `&Option<Arc<dyn ViolationObserver>>` and falls back to [`TracingObserver`].
///
/// ```
/// use lockstep_duel::{report_violation_to, telemetry::{CollectingObserver, ViolationKind, ViolationObserver, ViolationSeverity}};
/// use std::sync::Arc;
///
/// let collector = Arc::new(CollectingObserver::new());
/// let observer: Option<Arc<dyn ViolationObserver>> = Some(collector.clone());
/// report_violation_to!(&observer, ViolationSeverity::Error, ViolationKind::MoveLog,
///     "log lengths differ: {} vs {}", 3, 4);
/// assert_eq!(collector.len(), 1);
/// ```
#[macro_export]
macro_rules! report_violation_to {
    ($observer:expr, $severity:expr, $kind:expr, $msg:literal) => {{
        let violation = $crate::telemetry::Violation::new(
            $severity,
            $kind,
            $msg,
            concat!(file!(), ":", line!()),
        );
        $crate::telemetry::report_to_observer($observer.as_ref(), &violation);
    }};

    ($observer:expr, $severity:expr, $kind:expr, $fmt:literal, $($arg:tt)+) => {{
        let violation = $crate::telemetry::Violation::new(
            $severity,
            $kind,
            format!($fmt, $($arg)+),
            concat!(file!(), ":", line!()),
        );
        $crate::telemetry::report_to_observer($observer.as_ref(), &violation);
    }};
}

// ==========================================
// Runtime Invariant Checking
// ==========================================

/// Description of a broken type invariant.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InvariantViolation {
    /// Name of the type whose invariant was violated.
    pub type_name: &'static str,
    /// Description of the violated invariant.
    pub invariant: String,
    /// Additional diagnostic context.
    pub details: Option<String>,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    #[must_use]
    pub fn new(type_name: &'static str, invariant: impl Into<String>) -> Self {
        Self {
            type_name,
            invariant: invariant.into(),
            details: None,
        }
    }

    /// Adds additional details to the violation.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Serializes this violation to a JSON string.
    #[cfg(feature = "json")]
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.type_name, self.invariant)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Types that can check their own invariants at runtime.
pub trait InvariantChecker {
    /// Returns `Ok(())` if all invariants hold, or the first broken one.
    fn check_invariants(&self) -> Result<(), InvariantViolation>;
}

/// Checks invariants in debug builds (or with `paranoid`) and reports failures as
/// `Critical`/`Invariant` violations. Compiles to nothing otherwise.
#[macro_export]
#[cfg(any(debug_assertions, feature = "paranoid"))]
macro_rules! debug_check_invariants {
    ($expr:expr, $context:expr) => {{
        use $crate::telemetry::InvariantChecker as _;
        if let Err(violation) = $expr.check_invariants() {
            $crate::report_violation!(
                $crate::telemetry::ViolationSeverity::Critical,
                $crate::telemetry::ViolationKind::Invariant,
                "{} [context: {}]",
                violation,
                $context
            );
        }
    }};
}

/// No-op version for release builds without `paranoid` feature.
#[macro_export]
#[cfg(not(any(debug_assertions, feature = "paranoid")))]
macro_rules! debug_check_invariants {
    ($expr:expr, $context:expr) => {{}};
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

    fn sample(kind: ViolationKind, severity: ViolationSeverity) -> Violation {
        Violation::new(severity, kind, "sample", "test.rs:1")
    }

    #[test]
    fn severity_ordering() {
        assert!(ViolationSeverity::Warning < ViolationSeverity::Error);
        assert!(ViolationSeverity::Error < ViolationSeverity::Critical);
    }

    #[test]
    fn kind_labels() {
        assert_eq!(ViolationKind::Determinism.as_str(), "determinism");
        assert_eq!(ViolationKind::MoveLog.as_str(), "move_log");
        assert_eq!(ViolationKind::ArenaBounds.as_str(), "arena_bounds");
        assert_eq!(ViolationKind::PeerInput.as_str(), "peer_input");
        assert_eq!(ViolationKind::Invariant.to_string(), "invariant");
    }

    #[test]
    fn builder_and_display() {
        let violation = Violation::new(
            ViolationSeverity::Error,
            ViolationKind::MoveLog,
            "orphan shot",
            "test.rs:10",
        )
        .with_turn(Turn::new(5))
        .with_context("index", "5");

        assert_eq!(violation.turn, Some(Turn::new(5)));
        assert_eq!(violation.context.get("index").map(String::as_str), Some("5"));

        let display = violation.to_string();
        assert!(display.contains("error"));
        assert!(display.contains("move_log"));
        assert!(display.contains("orphan shot"));
        assert!(display.contains("turn=5"));
    }

    #[test]
    fn collecting_observer_queries() {
        let observer = CollectingObserver::new();
        assert!(observer.is_empty());

        observer.on_violation(&sample(ViolationKind::PeerInput, ViolationSeverity::Warning));
        observer.on_violation(&sample(ViolationKind::Determinism, ViolationSeverity::Critical));
        observer.on_violation(&sample(ViolationKind::PeerInput, ViolationSeverity::Warning));

        assert_eq!(observer.len(), 3);
        assert!(observer.has_violation(ViolationKind::Determinism));
        assert!(!observer.has_violation(ViolationKind::ArenaBounds));
        assert!(observer.has_severity(ViolationSeverity::Critical));
        assert!(!observer.has_severity(ViolationSeverity::Error));
        assert_eq!(observer.violations_of_kind(ViolationKind::PeerInput).len(), 2);

        observer.clear();
        assert_no_violations!(observer);
    }

    #[test]
    fn composite_forwards_to_all() {
        let first = Arc::new(CollectingObserver::new());
        let second = Arc::new(CollectingObserver::new());
        let mut composite = CompositeObserver::new();
        composite.add(first.clone());
        composite.add(second.clone());
        composite.add(Arc::new(TracingObserver::new()));

        composite.on_violation(&sample(ViolationKind::MoveLog, ViolationSeverity::Error));

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert!(format!("{composite:?}").contains("num_observers: 3"));
    }

    #[test]
    fn composite_from_observers_delivers_to_each_child() {
        let collector = Arc::new(CollectingObserver::new());
        let children: Vec<Arc<dyn ViolationObserver>> = vec![collector.clone(), collector.clone()];
        let composite = CompositeObserver::from_observers(children);

        composite.on_violation(&sample(ViolationKind::ArenaBounds, ViolationSeverity::Critical));

        assert_eq!(collector.len(), 2);
        assert!(collector.has_violation(ViolationKind::ArenaBounds));
    }

    #[test]
    fn report_to_observer_falls_back_to_tracing() {
        let violation = sample(ViolationKind::Configuration, ViolationSeverity::Warning);
        report_to_observer(None::<&Arc<CollectingObserver>>, &violation);

        let observer = Arc::new(CollectingObserver::new());
        report_to_observer(Some(&observer), &violation);
        assert_eq!(observer.len(), 1);
    }

    #[test]
    fn report_violation_to_macro_captures_location() {
        let collector = Arc::new(CollectingObserver::new());
        let observer: Option<Arc<dyn ViolationObserver>> = Some(collector.clone());
        report_violation_to!(
            &observer,
            ViolationSeverity::Warning,
            ViolationKind::PeerInput,
            "bad payload {}",
            1
        );
        let violations = collector.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "bad payload 1");
        assert!(violations[0].location.contains("telemetry.rs"));
        assert_violation!(collector, ViolationKind::PeerInput);
    }

    #[test]
    fn invariant_violation_display() {
        let violation = InvariantViolation::new("Body", "outside arena").with_details("x=-3");
        assert_eq!(violation.to_string(), "Body: outside arena (x=-3)");
        assert_eq!(
            InvariantViolation::new("MoveLog", "missing init").to_string(),
            "MoveLog: missing init"
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_export() {
        let json = sample(ViolationKind::Determinism, ViolationSeverity::Critical)
            .with_turn(Turn::new(9))
            .to_json()
            .unwrap();
        assert!(json.contains(r#""severity":"critical""#));
        assert!(json.contains(r#""kind":"determinism""#));
        assert!(json.contains(r#""turn":9"#));
    }
}
