//! # Skybound Circuit Peer Core
//!
//! Match-session coordination for a peer-hosted obstacle race: no
//! dedicated server, every peer runs the full simulation, one peer at a
//! time holds authority over shared session state, and each peer
//! exclusively authors side effects for the racers it owns.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SKYBOUND PEER CORE                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec3.rs     - 3D vector with fixed-point                │
//! │  └── hash.rs     - State hashing for divergence detection    │
//! │                                                              │
//! │  session/        - Cross-peer coordination                   │
//! │  ├── peer.rs     - Membership and authority election         │
//! │  ├── state.rs    - Session phases and shared properties      │
//! │  ├── authority.rs- Transition validation and migration       │
//! │  ├── countdown.rs- Replicated start countdown                │
//! │  └── runtime.rs  - Per-peer composition and tick loop        │
//! │                                                              │
//! │  race/           - Per-entity gameplay (ownership-gated)     │
//! │  ├── entity.rs   - Racers and the world replica              │
//! │  ├── checkpoint.rs- Last-safe-position and respawn           │
//! │  ├── classify.rs - Finish detection and local ranks          │
//! │  └── hazard.rs   - Death zones and elimination               │
//! │                                                              │
//! │  net/            - Messaging (transport-agnostic)            │
//! │  ├── message.rs  - Wire message types                        │
//! │  └── channel.rs  - Broadcast channel + in-memory hub         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Model
//!
//! Messages are fire-and-forget, at-least-once, FIFO per sender-receiver
//! pair, with no cross-sender ordering. Every handler is idempotent.
//! Writers are disjoint by construction - the authority alone mutates the
//! session record, the owner alone mutates a racer - so no locks guard
//! core state. Terminal flags (finished, dead) are monotone: once set,
//! nothing ever clears them. Rank projections are deliberately per-peer
//! and unreconciled; peers observing the same finishes in different
//! relative order will disagree.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod net;
pub mod presentation;
pub mod race;
pub mod session;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_HALF, FIXED_ONE, FIXED_SCALE};
pub use core::vec3::FixedVec3;
pub use net::{BroadcastChannel, LocalBroadcastHub, PeerMessage, TargetSet};
pub use race::{ContactReport, Entity, EntityId, EntityKind};
pub use session::{PeerId, PeerRuntime, SessionConfig, SessionState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
