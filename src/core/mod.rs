//! Core deterministic primitives.
//!
//! All types in this module are designed for perfect cross-peer determinism:
//! replicated quantities hash identically on every peer unless the peers
//! have genuinely diverged.

pub mod fixed;
pub mod hash;
pub mod vec3;

// Re-export core types
pub use fixed::{Fixed, FIXED_HALF, FIXED_ONE, FIXED_SCALE};
pub use hash::{compute_state_hash, StateHash};
pub use vec3::FixedVec3;
