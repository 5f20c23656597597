//! Configuration types for duel sessions.
//!
//! | Config Type | Purpose | Key Presets |
//! |-------------|---------|-------------|
//! | `ArenaConfig` | Arena size and kinematic limits | `classic()`, `compact()` |
//!
//! Every value here feeds the replay. Two peers replaying the same logs with different
//! arena settings will disagree, so the configuration is part of what both sides must share
//! before a match starts.
//!
//! # Example
//!
//! ```
//! use lockstep_duel::{ArenaConfig, SessionBuilder};
//!
//! let builder = SessionBuilder::new()
//!     .with_seeds(1, 2)
//!     .with_arena(ArenaConfig::compact());
//! ```

use crate::{DuelError, DuelResult};

/// Arena dimensions and kinematic limits.
///
/// # Forward Compatibility
///
/// New fields may be added to this struct in future versions. Use the
/// `..ArenaConfig::default()` pattern when constructing instances.
///
/// # Example
///
/// ```
/// use lockstep_duel::ArenaConfig;
///
/// let wide = ArenaConfig {
///     width: 1200,
///     ..ArenaConfig::default()
/// };
/// assert!(wide.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[must_use = "ArenaConfig has no effect unless passed to SessionBuilder::with_arena()"]
pub struct ArenaConfig {
    /// Arena width in world units.
    ///
    /// Default: 800
    pub width: u32,

    /// Arena height in world units.
    ///
    /// Default: 600
    pub height: u32,

    /// Magnitude every non-zero acceleration is scaled to.
    ///
    /// Default: 25.0
    pub max_acceleration: f64,

    /// Exclusive upper bound (minus one) for each spawn velocity component.
    /// Spawn velocity is drawn from `[0, max_velocity]` per axis.
    ///
    /// Default: 50
    pub max_velocity: u32,

    /// Radius of both bodies.
    ///
    /// Default: 10.0
    pub body_radius: f64,

    /// Distance from each wall excluded from spawn positions.
    ///
    /// Default: 10
    pub spawn_margin: u32,

    /// Largest impact radius still counted as a hit (inclusive).
    ///
    /// Default: 10.0
    pub hit_threshold: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            max_acceleration: 25.0,
            max_velocity: 50,
            body_radius: 10.0,
            spawn_margin: 10,
            hit_threshold: 10.0,
        }
    }
}

impl ArenaConfig {
    /// Creates a new `ArenaConfig` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard 800x600 arena. Same as [`ArenaConfig::default`].
    pub fn classic() -> Self {
        Self::default()
    }

    /// A 400x300 arena with the classic kinematic limits.
    ///
    /// Bodies hit the walls much sooner, which makes for shorter matches.
    pub fn compact() -> Self {
        Self {
            width: 400,
            height: 300,
            ..Self::default()
        }
    }

    /// Arena width as a float, for kinematics.
    #[inline]
    #[must_use]
    pub fn width_f64(&self) -> f64 {
        f64::from(self.width)
    }

    /// Arena height as a float, for kinematics.
    #[inline]
    #[must_use]
    pub fn height_f64(&self) -> f64 {
        f64::from(self.height)
    }

    /// Validates the arena configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DuelError::InvalidConfig`] naming the first rejected field.
    pub fn validate(&self) -> DuelResult<()> {
        if self.width == 0 {
            return Err(invalid("width", "must be positive"));
        }
        if self.height == 0 {
            return Err(invalid("height", "must be positive"));
        }
        if !self.max_acceleration.is_finite() || self.max_acceleration <= 0.0 {
            return Err(invalid(
                "max_acceleration",
                format!("must be finite and positive, got {}", self.max_acceleration),
            ));
        }
        if !self.body_radius.is_finite() || self.body_radius <= 0.0 {
            return Err(invalid(
                "body_radius",
                format!("must be finite and positive, got {}", self.body_radius),
            ));
        }
        if !self.hit_threshold.is_finite() || self.hit_threshold < 0.0 {
            return Err(invalid(
                "hit_threshold",
                format!("must be finite and non-negative, got {}", self.hit_threshold),
            ));
        }

        let diameter = self.body_radius * 2.0;
        if self.width_f64() < diameter || self.height_f64() < diameter {
            return Err(invalid(
                "body_radius",
                format!(
                    "a body of diameter {} does not fit a {}x{} arena",
                    diameter, self.width, self.height
                ),
            ));
        }

        let margin = u64::from(self.spawn_margin) * 2;
        if margin >= u64::from(self.width) || margin >= u64::from(self.height) {
            return Err(invalid(
                "spawn_margin",
                format!(
                    "margin {} leaves no spawn area in a {}x{} arena",
                    self.spawn_margin, self.width, self.height
                ),
            ));
        }

        if f64::from(self.spawn_margin) < self.body_radius {
            return Err(invalid(
                "spawn_margin",
                format!(
                    "margin {} is thinner than the body radius {}",
                    self.spawn_margin, self.body_radius
                ),
            ));
        }
        let narrowest = self.width.min(self.height) - self.spawn_margin * 2;
        if f64::from(narrowest) < diameter {
            return Err(invalid(
                "spawn_margin",
                format!(
                    "spawn range of {} is narrower than a body of diameter {}",
                    narrowest, diameter
                ),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> DuelError {
    DuelError::InvalidConfig {
        field,
        reason: reason.into(),
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

    fn rejected_field(config: ArenaConfig) -> &'static str {
        match config.validate() {
            Err(DuelError::InvalidConfig { field, .. }) => field,
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn presets_are_valid() {
        assert!(ArenaConfig::default().validate().is_ok());
        assert!(ArenaConfig::classic().validate().is_ok());
        assert!(ArenaConfig::compact().validate().is_ok());
        assert_eq!(ArenaConfig::classic(), ArenaConfig::new());
    }

    #[test]
    fn defaults_match_classic_arena() {
        let arena = ArenaConfig::default();
        assert_eq!((arena.width, arena.height), (800, 600));
        assert_eq!(arena.max_acceleration, 25.0);
        assert_eq!(arena.max_velocity, 50);
        assert_eq!(arena.body_radius, 10.0);
        assert_eq!(arena.spawn_margin, 10);
        assert_eq!(arena.hit_threshold, 10.0);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert_eq!(
            rejected_field(ArenaConfig {
                width: 0,
                ..ArenaConfig::default()
            }),
            "width"
        );
        assert_eq!(
            rejected_field(ArenaConfig {
                height: 0,
                ..ArenaConfig::default()
            }),
            "height"
        );
    }

    #[test]
    fn non_finite_magnitudes_rejected() {
        assert_eq!(
            rejected_field(ArenaConfig {
                max_acceleration: f64::NAN,
                ..ArenaConfig::default()
            }),
            "max_acceleration"
        );
        assert_eq!(
            rejected_field(ArenaConfig {
                body_radius: f64::INFINITY,
                ..ArenaConfig::default()
            }),
            "body_radius"
        );
        assert_eq!(
            rejected_field(ArenaConfig {
                hit_threshold: -1.0,
                ..ArenaConfig::default()
            }),
            "hit_threshold"
        );
    }

    #[test]
    fn zero_hit_threshold_allowed() {
        let arena = ArenaConfig {
            hit_threshold: 0.0,
            ..ArenaConfig::default()
        };
        assert!(arena.validate().is_ok());
    }

    #[test]
    fn oversized_body_rejected() {
        assert_eq!(
            rejected_field(ArenaConfig {
                width: 30,
                height: 30,
                body_radius: 20.0,
                spawn_margin: 1,
                ..ArenaConfig::default()
            }),
            "body_radius"
        );
    }

    #[test]
    fn margin_swallowing_arena_rejected() {
        assert_eq!(
            rejected_field(ArenaConfig {
                width: 40,
                height: 40,
                spawn_margin: 20,
                ..ArenaConfig::default()
            }),
            "spawn_margin"
        );
    }

    #[test]
    fn margin_thinner_than_body_rejected() {
        assert_eq!(
            rejected_field(ArenaConfig {
                spawn_margin: 0,
                ..ArenaConfig::default()
            }),
            "spawn_margin"
        );
        assert_eq!(
            rejected_field(ArenaConfig {
                spawn_margin: 9,
                ..ArenaConfig::default()
            }),
            "spawn_margin"
        );
    }

    #[test]
    fn spawn_range_narrower_than_body_rejected() {
        // [15, 30) on x leaves 15 units for a 20 unit body
        assert_eq!(
            rejected_field(ArenaConfig {
                width: 45,
                spawn_margin: 15,
                ..ArenaConfig::default()
            }),
            "spawn_margin"
        );
    }

    #[test]
    fn valid_arena_spawns_inside() {
        use crate::body::Body;
        use crate::Side;

        let arena = ArenaConfig {
            width: 40,
            height: 40,
            ..ArenaConfig::default()
        };
        assert!(arena.validate().is_ok());
        for seed in 0..2_000 {
            for side in Side::BOTH {
                let body = Body::from_seed(seed, side, &arena);
                assert!(body.is_within(&arena), "seed {seed}: {body:?}");
            }
        }
    }
}
