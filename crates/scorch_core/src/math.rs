//! Math utilities for the duel engine.
//!
//! Terrain generation runs on fixed-point arithmetic so the solidity mask is
//! bit-identical on every participant's machine. Ballistics needs
//! trigonometry and runs on `f64` [`Point`]s; trajectories only have to be
//! reproducible for a given build, which IEEE arithmetic without fused
//! operations gives us.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for terrain generation.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// A point (or vector) in field space.
///
/// Field space is pixel-aligned: x grows to the right, y grows downward,
/// and the cell `(floor(x), floor(y))` holds the point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (downward).
    pub y: f64,
}

impl Point {
    /// Origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Integer cell containing this point, or `None` for non-finite input.
    #[must_use]
    pub fn cell(self) -> Option<(i64, i64)> {
        if self.x.is_finite() && self.y.is_finite() {
            Some((self.x.floor() as i64, self.y.floor() as i64))
        } else {
            None
        }
    }

    /// Bit-exact hash input for state hashing.
    #[must_use]
    pub fn to_bits(self) -> (u64, u64) {
        (self.x.to_bits(), self.y.to_bits())
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Clamp `value` into `[min, max]`, mapping NaN to `min`.
///
/// Aim input comes from sliders and heuristics; it is clamped rather than
/// rejected, and a NaN must not leak into the trajectory.
#[must_use]
pub fn clamp_input(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(3.0, 0.0);
        let b = Point::new(0.0, 4.0);
        assert_eq!(a.distance_squared(b), 25.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn test_fixed_determinism() {
        // Same operations must produce identical results
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);

        let result1 = a * Fixed::from_num(7);
        let result2 = b * Fixed::from_num(7);
        assert_eq!(result1, result2);
    }

    #[test]
    fn test_point_cell_floors_negative_coordinates() {
        assert_eq!(Point::new(2.9, 0.1).cell(), Some((2, 0)));
        assert_eq!(Point::new(-0.5, -1.2).cell(), Some((-1, -2)));
        assert_eq!(Point::new(f64::NAN, 1.0).cell(), None);
    }

    #[test]
    fn test_clamp_input() {
        assert_eq!(clamp_input(200.0, 20.0, 150.0), 150.0);
        assert_eq!(clamp_input(-5.0, 0.0, 180.0), 0.0);
        assert_eq!(clamp_input(f64::NAN, 20.0, 150.0), 20.0);
        assert_eq!(clamp_input(75.5, 20.0, 150.0), 75.5);
    }
}
