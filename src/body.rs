//! Circular bodies and the bounded kinematic integrator.
//!
//! A body is the in-game "player": a position, a velocity and a fixed radius. It only ever
//! changes through [`Body::update`], one unit time step per logged move.

use crate::rng::SeededRandom;
use crate::telemetry::{InvariantChecker, InvariantViolation};
use crate::vector::Vector2;
use crate::{ArenaConfig, Side};

/// Position and velocity state of one side's body.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Body {
    /// Center of the body in arena coordinates.
    pub position: Vector2,
    /// Displacement per time step, before acceleration.
    pub velocity: Vector2,
    /// Radius used for wall clamping.
    pub radius: f64,
    /// Owning side.
    pub side: Side,
}

impl Body {
    /// Creates a body from explicit state.
    #[must_use]
    pub const fn new(position: Vector2, velocity: Vector2, radius: f64, side: Side) -> Self {
        Self {
            position,
            velocity,
            radius,
            side,
        }
    }

    /// Draws a spawn position and velocity from `rng`.
    ///
    /// Consumes exactly four values in a fixed order: x, y, then velocity x, velocity y.
    /// Position components come from `[margin, dimension - margin)` and velocity components
    /// from `[0, max_velocity]`. The replay relies on this order to rebuild the same body.
    pub fn spawn(rng: &mut SeededRandom, side: Side, arena: &ArenaConfig) -> Self {
        let margin = i64::from(arena.spawn_margin);
        let x = rng.next_int(margin, i64::from(arena.width) - margin);
        let y = rng.next_int(margin, i64::from(arena.height) - margin);
        let max_vel = i64::from(arena.max_velocity) + 1;
        let vx = rng.next_int(0, max_vel);
        let vy = rng.next_int(0, max_vel);
        Self::new(
            Vector2::new(x as f64, y as f64),
            Vector2::new(vx as f64, vy as f64),
            arena.body_radius,
            side,
        )
    }

    /// Spawns the body a fresh generator seeded with `seed` would produce.
    pub fn from_seed(seed: u32, side: Side, arena: &ArenaConfig) -> Self {
        Self::spawn(&mut SeededRandom::new(seed), side, arena)
    }

    /// Advances the body by one time step.
    ///
    /// The acceleration's direction is kept and its magnitude is set to exactly
    /// `arena.max_acceleration` (a zero vector stays zero). Then
    /// `position += velocity + acceleration / 2` and `velocity += acceleration`, followed by
    /// a per-axis wall clamp that zeroes the clamped axis' velocity.
    ///
    /// A non-finite acceleration is treated as zero thrust.
    pub fn update(&mut self, acceleration: Vector2, arena: &ArenaConfig) {
        let thrust = if acceleration.is_finite() {
            acceleration.normalize().scale(arena.max_acceleration)
        } else {
            Vector2::ZERO
        };

        self.position += self.velocity + thrust.scale(0.5);
        self.velocity += thrust;
        self.clamp_to(arena);
    }

    fn clamp_to(&mut self, arena: &ArenaConfig) {
        let (width, height) = (arena.width_f64(), arena.height_f64());
        let r = self.radius;

        // Comparisons are inclusive: a body exactly touching a wall also stops on that axis
        if self.position.x + r >= width {
            self.position.x = width - r;
            self.velocity.x = 0.0;
        }
        if self.position.x - r <= 0.0 {
            self.position.x = r;
            self.velocity.x = 0.0;
        }
        if self.position.y + r >= height {
            self.position.y = height - r;
            self.velocity.y = 0.0;
        }
        if self.position.y - r <= 0.0 {
            self.position.y = r;
            self.velocity.y = 0.0;
        }
    }

    /// True if the body lies within `[radius, dimension - radius]` on both axes.
    #[must_use]
    pub fn is_within(&self, arena: &ArenaConfig) -> bool {
        let r = self.radius;
        (r..=arena.width_f64() - r).contains(&self.position.x)
            && (r..=arena.height_f64() - r).contains(&self.position.y)
    }

    /// Pairs the body with an arena so its bounds can be checked as an invariant.
    #[must_use]
    pub const fn in_arena<'a>(&'a self, arena: &'a ArenaConfig) -> BodyInArena<'a> {
        BodyInArena { body: self, arena }
    }
}

/// A body viewed together with the arena that bounds it.
#[derive(Debug, Clone, Copy)]
pub struct BodyInArena<'a> {
    body: &'a Body,
    arena: &'a ArenaConfig,
}

impl InvariantChecker for BodyInArena<'_> {
    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let body = self.body;
        if !body.position.is_finite() || !body.velocity.is_finite() {
            return Err(InvariantViolation::new("Body", "state is not finite").with_details(
                format!("position={}, velocity={}", body.position, body.velocity),
            ));
        }
        if !body.is_within(self.arena) {
            return Err(
                InvariantViolation::new("Body", "position outside arena bounds").with_details(
                    format!(
                        "side={}, position={}, radius={}, arena={}x{}",
                        body.side, body.position, body.radius, self.arena.width, self.arena.height
                    ),
                ),
            );
        }
        Ok(())
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

    fn arena() -> ArenaConfig {
        ArenaConfig::default()
    }

    fn body_at(x: f64, y: f64, vx: f64, vy: f64) -> Body {
        Body::new(Vector2::new(x, y), Vector2::new(vx, vy), 10.0, Side::A)
    }

    #[test]
    fn spawn_from_seed_one() {
        let body = Body::from_seed(1, Side::A, &arena());
        assert_eq!(body.position, Vector2::new(194.0, 224.0));
        assert_eq!(body.velocity, Vector2::new(25.0, 35.0));
        assert_eq!(body.radius, 10.0);
        assert_eq!(body.side, Side::A);
    }

    #[test]
    fn spawn_consumes_four_draws() {
        let mut rng = SeededRandom::new(77);
        let _ = Body::spawn(&mut rng, Side::B, &arena());
        let mut reference = SeededRandom::new(77);
        for _ in 0..4 {
            reference.next_f64();
        }
        assert_eq!(rng.state(), reference.state());
    }

    #[test]
    fn zero_acceleration_coasts() {
        let mut body = body_at(100.0, 100.0, 5.0, -3.0);
        body.update(Vector2::ZERO, &arena());
        assert_eq!(body.position, Vector2::new(105.0, 97.0));
        assert_eq!(body.velocity, Vector2::new(5.0, -3.0));
    }

    #[test]
    fn acceleration_is_scaled_to_max() {
        // (3, 4) normalizes to (0.6, 0.8), scaled to (15, 20)
        let mut body = body_at(400.0, 300.0, 0.0, 0.0);
        body.update(Vector2::new(3.0, 4.0), &arena());
        assert_eq!(body.velocity, Vector2::new(15.0, 20.0));
        assert_eq!(body.position, Vector2::new(407.5, 310.0));
    }

    #[test]
    fn tiny_acceleration_still_reaches_max() {
        let mut body = body_at(400.0, 300.0, 0.0, 0.0);
        body.update(Vector2::new(0.0, 0.5), &arena());
        assert_eq!(body.velocity, Vector2::new(0.0, 25.0));
    }

    #[test]
    fn non_finite_acceleration_is_zero_thrust() {
        let mut body = body_at(100.0, 100.0, 1.0, 1.0);
        body.update(Vector2::new(f64::NAN, 1.0), &arena());
        assert_eq!(body.position, Vector2::new(101.0, 101.0));
        assert_eq!(body.velocity, Vector2::new(1.0, 1.0));
    }

    #[test]
    fn clamps_right_and_bottom_walls() {
        let mut body = body_at(780.0, 580.0, 40.0, 40.0);
        body.update(Vector2::new(1.0, 1.0), &arena());
        assert_eq!(body.position, Vector2::new(790.0, 590.0));
        assert_eq!(body.velocity, Vector2::ZERO);
    }

    #[test]
    fn clamps_left_and_top_walls() {
        let mut body = body_at(20.0, 20.0, -40.0, -40.0);
        body.update(Vector2::new(-1.0, -1.0), &arena());
        assert_eq!(body.position, Vector2::new(10.0, 10.0));
        assert_eq!(body.velocity, Vector2::ZERO);
    }

    #[test]
    fn touching_wall_zeroes_only_that_axis() {
        let mut body = body_at(785.0, 300.0, 5.0, 2.0);
        body.update(Vector2::ZERO, &arena());
        assert_eq!(body.position, Vector2::new(790.0, 302.0));
        assert_eq!(body.velocity, Vector2::new(0.0, 2.0));
    }

    #[test]
    fn invariant_check_flags_escaped_body() {
        let arena = arena();
        let inside = body_at(400.0, 300.0, 0.0, 0.0);
        assert!(inside.in_arena(&arena).check_invariants().is_ok());

        let outside = body_at(5.0, 300.0, 0.0, 0.0);
        let err = outside.in_arena(&arena).check_invariants().unwrap_err();
        assert!(err.to_string().contains("outside arena"));
    }

    #[test]
    fn invariant_check_flags_non_finite_state() {
        let arena = arena();
        let body = body_at(f64::NAN, 300.0, 0.0, 0.0);
        assert!(body.in_arena(&arena).check_invariants().is_err());
    }
}
