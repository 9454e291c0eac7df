//! Peer Messaging Layer
//!
//! Message types and the broadcast channel abstraction. What is sent is
//! decoupled from how it is transported: the core only ever sees
//! [`BroadcastChannel`](channel::BroadcastChannel) and the documented
//! delivery semantics, never a socket.

pub mod channel;
pub mod message;

pub use channel::{BroadcastChannel, DeliveryProfile, HubEndpoint, LocalBroadcastHub, TargetSet};
pub use message::{CodecError, Envelope, PeerMessage};
