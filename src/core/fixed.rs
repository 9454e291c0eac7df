//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic scalar math for the replicated simulation.
//! All operations use integer arithmetic only - no floats in gameplay logic,
//! so every peer computes bit-identical values for replicated quantities.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 units                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

/// Maximum positive value
pub const FIXED_MAX: Fixed = i32::MAX;

/// Minimum negative value
pub const FIXED_MIN: Fixed = i32::MIN;

// =============================================================================
// TRACK CONSTANTS (All as integer literals - NO float conversion!)
// =============================================================================

/// Height below which a fallen entity is returned to its checkpoint:
/// -10.0 = -10 * 65536
pub const RESPAWN_HEIGHT_THRESHOLD: Fixed = -655360;

/// Default spawn height above the track surface: 1.0 = 65536
pub const SPAWN_HEIGHT: Fixed = 65536;

// =============================================================================
// ARITHMETIC
// =============================================================================

/// Multiply two fixed-point numbers.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    (((a as i64) * (b as i64)) >> FIXED_SCALE) as Fixed
}

/// Divide two fixed-point numbers. Returns 0 on division by zero.
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0;
    }
    (((a as i64) << FIXED_SCALE) / (b as i64)) as Fixed
}

/// Absolute value.
#[inline]
pub fn fixed_abs(a: Fixed) -> Fixed {
    a.wrapping_abs()
}

/// Clamp a value to a range.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    value.max(min).min(max)
}

/// Convert a float to fixed-point. Test and display use only -
/// never called from simulation code.
#[inline]
pub fn to_fixed(value: f32) -> Fixed {
    (value * FIXED_ONE as f32) as Fixed
}

/// Convert fixed-point to float for rendering and logs.
#[inline]
pub fn to_float(value: Fixed) -> f32 {
    value as f32 / FIXED_ONE as f32
}

// =============================================================================
// TESTS
// =============================================================================
