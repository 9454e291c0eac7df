//! Fixed-Point 3D Vector
//!
//! Deterministic 3D vector operations for replicated transforms.
//! Y is the vertical axis; the fall-respawn check compares `y` against
//! [`RESPAWN_HEIGHT_THRESHOLD`](super::fixed::RESPAWN_HEIGHT_THRESHOLD).

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use super::fixed::{fixed_clamp, fixed_mul, Fixed, FIXED_ONE, FIXED_SCALE};

/// 3D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec3 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Y component (Q16.16 fixed-point), vertical axis
    pub y: Fixed,
    /// Z component (Q16.16 fixed-point)
    pub z: Fixed,
}

impl FixedVec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// Unit vector pointing up (+Y)
    pub const UP: Self = Self { x: 0, y: FIXED_ONE, z: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
            z: z << FIXED_SCALE,
        }
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
            z: self.z.wrapping_add(other.z),
        }
    }

    /// Subtract another vector.
    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_sub(other.x),
            y: self.y.wrapping_sub(other.y),
            z: self.z.wrapping_sub(other.z),
        }
    }

    /// Scale by a fixed-point scalar.
    #[inline]
    pub fn scale(self, scalar: Fixed) -> Self {
        Self {
            x: fixed_mul(self.x, scalar),
            y: fixed_mul(self.y, scalar),
            z: fixed_mul(self.z, scalar),
        }
    }

    /// Squared length (avoids sqrt - prefer this for comparisons).
    #[inline]
    pub fn length_squared(self) -> Fixed {
        fixed_mul(self.x, self.x)
            .wrapping_add(fixed_mul(self.y, self.y))
            .wrapping_add(fixed_mul(self.z, self.z))
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Self) -> Fixed {
        self.sub(other).length_squared()
    }

    /// Clamp all components to a range.
    #[inline]
    pub fn clamp(self, min: Fixed, max: Fixed) -> Self {
        Self {
            x: fixed_clamp(self.x, min, max),
            y: fixed_clamp(self.y, min, max),
            z: fixed_clamp(self.z, min, max),
        }
    }

    /// Negate all components.
    #[inline]
    pub fn negate(self) -> Self {
        Self {
            x: self.x.wrapping_neg(),
            y: self.y.wrapping_neg(),
            z: self.z.wrapping_neg(),
        }
    }

    /// Convert to float tuple for rendering.
    #[inline]
    pub fn to_floats(self) -> (f32, f32, f32) {
        (
            self.x as f32 / FIXED_ONE as f32,
            self.y as f32 / FIXED_ONE as f32,
            self.z as f32 / FIXED_ONE as f32,
        )
    }
}

// Operator overloads for ergonomics
impl Add for FixedVec3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.add(rhs)
    }
}

impl Sub for FixedVec3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.sub(rhs)
    }
}

impl Neg for FixedVec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.negate()
    }
}

impl fmt::Debug for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy, fz) = self.to_floats();
        write!(f, "Vec3({:.3}, {:.3}, {:.3})", fx, fy, fz)
    }
}

impl fmt::Display for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy, fz) = self.to_floats();
        write!(f, "({:.3}, {:.3}, {:.3})", fx, fy, fz)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;

    #[test]
    fn test_vec3_constants() {
        assert_eq!(FixedVec3::ZERO.x, 0);
        assert_eq!(FixedVec3::ZERO.y, 0);
        assert_eq!(FixedVec3::ZERO.z, 0);
        assert_eq!(FixedVec3::UP.y, FIXED_ONE);
    }

    #[test]
    fn test_vec3_add_sub() {
        let a = FixedVec3::new(to_fixed(3.0), to_fixed(4.0), to_fixed(5.0));
        let b = FixedVec3::new(to_fixed(1.0), to_fixed(2.0), to_fixed(3.0));
        let sum = a + b;
        assert_eq!(sum.x, to_fixed(4.0));
        assert_eq!(sum.y, to_fixed(6.0));
        assert_eq!(sum.z, to_fixed(8.0));

        let diff = a - b;
        assert_eq!(diff.x, to_fixed(2.0));
        assert_eq!(diff.y, to_fixed(2.0));
        assert_eq!(diff.z, to_fixed(2.0));
    }

    #[test]
    fn test_vec3_scale() {
        let v = FixedVec3::new(to_fixed(2.0), to_fixed(3.0), to_fixed(-1.0));
        let result = v.scale(to_fixed(2.0));
        assert_eq!(result.x, to_fixed(4.0));
        assert_eq!(result.y, to_fixed(6.0));
        assert_eq!(result.z, to_fixed(-2.0));
    }

    #[test]
    fn test_vec3_length_squared() {
        // 1-2-2 gives length 3
        let v = FixedVec3::new(to_fixed(1.0), to_fixed(2.0), to_fixed(2.0));
        assert_eq!(v.length_squared(), to_fixed(9.0));
    }

    #[test]
    fn test_vec3_distance_squared() {
        let a = FixedVec3::ZERO;
        let b = FixedVec3::new(to_fixed(0.0), to_fixed(3.0), to_fixed(4.0));
        assert_eq!(a.distance_squared(b), to_fixed(25.0));
    }

    #[test]
    fn test_vec3_determinism() {
        let a = FixedVec3::new(12345678, -87654321, 13371337);
        let b = FixedVec3::new(11111111, 22222222, -3333333);

        for _ in 0..1000 {
            assert_eq!(a + b, a + b);
            assert_eq!(a.length_squared(), a.length_squared());
        }
    }
}
