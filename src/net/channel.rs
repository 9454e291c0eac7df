//! Broadcast Channel
//!
//! The one abstraction between the session core and whatever carries its
//! messages. Delivery semantics, which every handler upstream must respect:
//!
//! - fire-and-forget: `send` never blocks and never reports delivery
//! - at-least-once: a message may arrive more than once, or not at all
//! - per-sender-receiver FIFO: two messages from the same sender arrive
//!   in order at any given receiver
//! - no cross-sender ordering whatsoever
//! - a severed endpoint drops sends silently; senders that need the state
//!   to be seen must let receivers re-query on reconnect
//!
//! [`LocalBroadcastHub`] is the provided in-memory implementation. Its
//! interior lock is transport plumbing between simulated peers only - the
//! core never locks.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::net::message::{Envelope, PeerMessage};
use crate::session::peer::PeerId;

/// Who a message is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetSet {
    /// Every attached peer, the sender included. Handlers are idempotent,
    /// so senders replaying their own announcements is harmless and keeps
    /// every peer on the same code path.
    All,
    /// Exactly one peer.
    One(PeerId),
}

/// Fire-and-forget message submission.
pub trait BroadcastChannel {
    /// Send a message to the target set. Never blocks; silently drops if
    /// the local connection is severed.
    fn send(&mut self, targets: TargetSet, message: PeerMessage);

    /// The peer this endpoint belongs to.
    fn local_peer(&self) -> PeerId;
}

/// Delivery knobs for the in-memory hub.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeliveryProfile {
    /// Deliver every message twice. Exercises the at-least-once contract
    /// in tests and demos.
    pub duplicate_deliveries: bool,
}

#[derive(Debug, Default)]
struct HubState {
    mailboxes: BTreeMap<PeerId, VecDeque<Envelope>>,
    severed: BTreeSet<PeerId>,
    profile: DeliveryProfile,
}

impl HubState {
    fn deliver(&mut self, to: PeerId, envelope: Envelope) {
        if self.severed.contains(&to) {
            return;
        }
        let Some(mailbox) = self.mailboxes.get_mut(&to) else {
            return;
        };
        mailbox.push_back(envelope.clone());
        if self.profile.duplicate_deliveries {
            mailbox.push_back(envelope);
        }
    }
}

/// In-memory message hub connecting simulated peers.
#[derive(Clone, Debug, Default)]
pub struct LocalBroadcastHub {
    state: Arc<Mutex<HubState>>,
}

impl LocalBroadcastHub {
    /// Create a hub with default (exactly-one-copy) delivery.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hub with explicit delivery knobs.
    pub fn with_profile(profile: DeliveryProfile) -> Self {
        let hub = Self::new();
        hub.state.lock().expect("hub lock").profile = profile;
        hub
    }

    /// Attach a peer, creating its mailbox, and hand back its endpoint.
    pub fn attach(&self, peer: PeerId) -> HubEndpoint {
        let mut state = self.state.lock().expect("hub lock");
        state.mailboxes.entry(peer).or_default();
        state.severed.remove(&peer);
        HubEndpoint {
            state: Arc::clone(&self.state),
            peer,
        }
    }

    /// Sever a peer: its sends vanish and nothing more reaches it.
    pub fn sever(&self, peer: PeerId) {
        let mut state = self.state.lock().expect("hub lock");
        state.severed.insert(peer);
        state.mailboxes.remove(&peer);
    }

    /// Take everything queued for a peer, in delivery order.
    pub fn drain(&self, peer: PeerId) -> Vec<Envelope> {
        let mut state = self.state.lock().expect("hub lock");
        state
            .mailboxes
            .get_mut(&peer)
            .map(|mailbox| mailbox.drain(..).collect())
            .unwrap_or_default()
    }
}

/// A peer's handle on the hub.
#[derive(Clone, Debug)]
pub struct HubEndpoint {
    state: Arc<Mutex<HubState>>,
    peer: PeerId,
}

impl BroadcastChannel for HubEndpoint {
    fn send(&mut self, targets: TargetSet, message: PeerMessage) {
        let mut state = self.state.lock().expect("hub lock");
        if state.severed.contains(&self.peer) {
            // Severed endpoints fail silently from the caller's view
            debug!("send from severed peer {} dropped", self.peer);
            return;
        }

        let envelope = Envelope {
            from: self.peer,
            message,
        };
        match targets {
            TargetSet::All => {
                let receivers: Vec<PeerId> = state.mailboxes.keys().copied().collect();
                for to in receivers {
                    state.deliver(to, envelope.clone());
                }
            }
            TargetSet::One(to) => state.deliver(to, envelope),
        }
    }

    fn local_peer(&self) -> PeerId {
        self.peer
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_message(name: &str) -> PeerMessage {
        PeerMessage::LoadScene {
            scene_name: name.to_string(),
        }
    }

    fn scene_names(envelopes: &[Envelope]) -> Vec<String> {
        envelopes
            .iter()
            .map(|e| match &e.message {
                PeerMessage::LoadScene { scene_name } => scene_name.clone(),
                other => panic!("unexpected message {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_broadcast_reaches_all_including_sender() {
        let hub = LocalBroadcastHub::new();
        let a = PeerId::new([1; 16]);
        let b = PeerId::new([2; 16]);
        let mut ep_a = hub.attach(a);
        hub.attach(b);

        ep_a.send(TargetSet::All, scene_message("X"));

        assert_eq!(hub.drain(a).len(), 1);
        assert_eq!(hub.drain(b).len(), 1);
    }

    #[test]
    fn test_targeted_send_reaches_one() {
        let hub = LocalBroadcastHub::new();
        let a = PeerId::new([1; 16]);
        let b = PeerId::new([2; 16]);
        let c = PeerId::new([3; 16]);
        let mut ep_a = hub.attach(a);
        hub.attach(b);
        hub.attach(c);

        ep_a.send(TargetSet::One(b), scene_message("X"));

        assert!(hub.drain(a).is_empty());
        assert_eq!(hub.drain(b).len(), 1);
        assert!(hub.drain(c).is_empty());
    }

    #[test]
    fn test_per_sender_fifo() {
        let hub = LocalBroadcastHub::new();
        let a = PeerId::new([1; 16]);
        let b = PeerId::new([2; 16]);
        let mut ep_a = hub.attach(a);
        hub.attach(b);

        for name in ["1", "2", "3"] {
            ep_a.send(TargetSet::All, scene_message(name));
        }

        assert_eq!(scene_names(&hub.drain(b)), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_severed_sender_drops_silently() {
        let hub = LocalBroadcastHub::new();
        let a = PeerId::new([1; 16]);
        let b = PeerId::new([2; 16]);
        let mut ep_a = hub.attach(a);
        hub.attach(b);

        hub.sever(a);
        ep_a.send(TargetSet::All, scene_message("lost"));

        assert!(hub.drain(b).is_empty());
    }

    #[test]
    fn test_severed_receiver_gets_nothing() {
        let hub = LocalBroadcastHub::new();
        let a = PeerId::new([1; 16]);
        let b = PeerId::new([2; 16]);
        let mut ep_a = hub.attach(a);
        hub.attach(b);

        hub.sever(b);
        ep_a.send(TargetSet::All, scene_message("X"));

        assert!(hub.drain(b).is_empty());
        // Sender still hears its own broadcast
        assert_eq!(hub.drain(a).len(), 1);
    }

    #[test]
    fn test_duplicate_delivery_profile() {
        let hub = LocalBroadcastHub::with_profile(DeliveryProfile {
            duplicate_deliveries: true,
        });
        let a = PeerId::new([1; 16]);
        let b = PeerId::new([2; 16]);
        let mut ep_a = hub.attach(a);
        hub.attach(b);

        ep_a.send(TargetSet::All, scene_message("X"));

        // At-least-once: both copies arrive, adjacent and in order
        assert_eq!(scene_names(&hub.drain(b)), vec!["X", "X"]);
    }

    #[test]
    fn test_reattach_after_sever() {
        let hub = LocalBroadcastHub::new();
        let a = PeerId::new([1; 16]);
        let b = PeerId::new([2; 16]);
        let mut ep_a = hub.attach(a);
        hub.attach(b);

        hub.sever(b);
        ep_a.send(TargetSet::All, scene_message("missed"));

        // Reconnect: mailbox is fresh, the missed message is gone for good
        hub.attach(b);
        ep_a.send(TargetSet::All, scene_message("seen"));
        assert_eq!(scene_names(&hub.drain(b)), vec!["seen"]);
    }
}
