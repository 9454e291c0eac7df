//! Peer Identity and Membership
//!
//! Every process in a match is a peer; exactly one connected peer holds
//! authority over shared session state at any instant. Each peer maintains
//! its own registry mirror from membership messages, and all mirrors agree
//! on the authority because election is a pure function of membership:
//! the lowest surviving peer id wins.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique peer identifier (UUID as bytes).
///
/// Implements Ord so "lowest surviving peer id" is a total, stable
/// election rule every peer evaluates identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct PeerId(pub [u8; 16]);

impl PeerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..4]))
    }
}

/// A peer known to the local registry mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Peer identifier.
    pub id: PeerId,
    /// Does this peer currently hold session authority?
    pub is_authority: bool,
    /// Is this peer connected? Disconnected peers are dropped from the
    /// registry, so this is only false transiently.
    pub connected: bool,
}

/// Outcome of removing a peer from the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Departure {
    /// The peer was not known; nothing changed.
    Unknown,
    /// A non-authoritative peer left.
    Left,
    /// The authoritative peer left and a survivor was promoted.
    AuthorityMigrated {
        /// Newly elected authority.
        new_authority: PeerId,
    },
    /// The authoritative peer left and no peers survive.
    SessionEmpty,
}

/// Local mirror of match membership.
///
/// Maintained identically on every peer from `PeerJoined` / `PeerLeft`
/// signals plus the authority's `SessionSync` snapshot on join.
#[derive(Clone, Debug, Default)]
pub struct PeerRegistry {
    peers: BTreeMap<PeerId, Peer>,
}

impl PeerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer. Joining never re-elects: authority only moves when the
    /// current holder departs, so a late joiner with a lower id does not
    /// steal the session. Re-adding a known peer is a no-op.
    pub fn join(&mut self, id: PeerId) -> bool {
        if self.peers.contains_key(&id) {
            return false;
        }
        self.peers.insert(
            id,
            Peer {
                id,
                is_authority: false,
                connected: true,
            },
        );
        true
    }

    /// Add a peer and immediately make it the authority. Used by the
    /// session founder, which has no one to learn membership from.
    pub fn join_as_authority(&mut self, id: PeerId) {
        self.join(id);
        self.set_authority(id);
    }

    /// Remove a departed peer, re-electing if it held authority.
    pub fn remove(&mut self, id: PeerId) -> Departure {
        let Some(peer) = self.peers.remove(&id) else {
            return Departure::Unknown;
        };

        if !peer.is_authority {
            return Departure::Left;
        }

        match self.elect_authority() {
            Some(new_authority) => Departure::AuthorityMigrated { new_authority },
            None => Departure::SessionEmpty,
        }
    }

    /// Promote the lowest surviving connected peer.
    ///
    /// BTreeMap iteration order makes "lowest id" the first connected entry.
    pub fn elect_authority(&mut self) -> Option<PeerId> {
        let elected = self
            .peers
            .values()
            .find(|p| p.connected)
            .map(|p| p.id)?;
        self.set_authority(elected);
        Some(elected)
    }

    /// Mark exactly one peer authoritative, clearing all others.
    pub fn set_authority(&mut self, id: PeerId) {
        for peer in self.peers.values_mut() {
            peer.is_authority = peer.id == id;
        }
    }

    /// Current authority, if any.
    pub fn authority(&self) -> Option<PeerId> {
        self.peers
            .values()
            .find(|p| p.is_authority && p.connected)
            .map(|p| p.id)
    }

    /// Does the given peer hold authority?
    pub fn is_authority(&self, id: PeerId) -> bool {
        self.authority() == Some(id)
    }

    /// Is the given peer known and connected?
    pub fn is_connected(&self, id: PeerId) -> bool {
        self.peers.get(&id).is_some_and(|p| p.connected)
    }

    /// Number of connected peers.
    pub fn connected_count(&self) -> usize {
        self.peers.values().filter(|p| p.connected).count()
    }

    /// Number of peers flagged authoritative. Always 0 or 1; exposed so
    /// tests can assert the invariant directly.
    pub fn authority_count(&self) -> usize {
        self.peers
            .values()
            .filter(|p| p.is_authority && p.connected)
            .count()
    }

    /// All known peer ids, in id order.
    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.keys().copied().collect()
    }

    /// Replace the whole mirror from an authority snapshot.
    pub fn adopt_snapshot(&mut self, peers: &[PeerId], authority: PeerId) {
        self.peers.clear();
        for id in peers {
            self.join(*id);
        }
        self.join(authority);
        self.set_authority(authority);
    }
}

// =============================================================================
// TESTS
// =============================================================================
