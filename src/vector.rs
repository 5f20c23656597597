//! Plain 2D vector arithmetic.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A real-valued `(x, y)` pair.
///
/// Pure value type: every operation returns a new vector.
#[derive(Debug, Copy, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Vector2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vector2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a vector from its components.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    ///
    /// Computed as `sqrt(x*x + y*y)` rather than `hypot`: peers must agree to the last bit.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction. The zero vector normalizes to itself.
    #[inline]
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Multiplies both components by `factor`.
    #[inline]
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// True when both components are neither NaN nor infinite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl std::fmt::Display for Vector2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Vector2::new(1.0, 2.0);
        let b = Vector2::new(3.0, -4.0);
        assert_eq!(a + b, Vector2::new(4.0, -2.0));
        assert_eq!(a - b, Vector2::new(-2.0, 6.0));
        assert_eq!(a * 2.0, Vector2::new(2.0, 4.0));
        assert_eq!(-a, Vector2::new(-1.0, -2.0));

        let mut c = a;
        c += b;
        c -= a;
        assert_eq!(c, b);
    }

    #[test]
    fn length_and_distance() {
        assert_eq!(Vector2::new(3.0, 4.0).length(), 5.0);
        assert_eq!(Vector2::new(1.0, 1.0).distance(Vector2::new(4.0, 5.0)), 5.0);
        assert_eq!(Vector2::ZERO.length(), 0.0);
    }

    #[test]
    fn normalize_zero_is_zero() {
        let n = Vector2::ZERO.normalize();
        assert_eq!(n, Vector2::ZERO);
        assert!(n.is_finite());
    }

    #[test]
    fn normalize_has_unit_length() {
        let n = Vector2::new(-30.0, 40.0).normalize();
        assert!((n.length() - 1.0).abs() < 1e-12);
        assert_eq!(n, Vector2::new(-0.6, 0.8));
    }

    #[test]
    fn finiteness() {
        assert!(Vector2::new(1.0, -1.0).is_finite());
        assert!(!Vector2::new(f64::NAN, 0.0).is_finite());
        assert!(!Vector2::new(0.0, f64::INFINITY).is_finite());
    }
}
