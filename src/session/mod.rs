//! Session Coordination Module
//!
//! Everything that keeps independent peers agreeing on one match:
//! membership and authority election, the shared session record and its
//! transitions, the replicated countdown, and the per-peer runtime that
//! composes it all.
//!
//! ## Module Structure
//!
//! - `peer`: peer identity, membership mirror, authority election
//! - `state`: session phases, replicated properties, configuration
//! - `authority`: transition validation, mirroring, migration
//! - `countdown`: the tick-driven start countdown
//! - `runtime`: the per-process composition root

pub mod authority;
pub mod countdown;
pub mod peer;
pub mod runtime;
pub mod state;

// Re-export key types
pub use authority::{SessionAuthority, SessionError};
pub use countdown::{CountdownEvent, CountdownSequencer, COUNTDOWN_STEPS};
pub use peer::{Departure, Peer, PeerId, PeerRegistry};
pub use runtime::PeerRuntime;
pub use state::{MatchSession, SessionConfig, SessionState, SharedProperties};
