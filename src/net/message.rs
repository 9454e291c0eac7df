//! Wire Messages
//!
//! Everything peers exchange. Messages are serialized as JSON for
//! debugging ease, with binary (bincode) for production. Delivery is
//! at-least-once with no cross-sender ordering, so every message here is
//! safe to receive twice.

use serde::{Deserialize, Serialize};

use crate::race::entity::EntityId;
use crate::session::peer::PeerId;
use crate::session::state::{SessionState, SharedProperties};

/// Messages exchanged between peers.
///
/// Externally tagged with snake_case variant keys, so the same derive
/// drives both the JSON and the binary codec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerMessage {
    /// The authority applied a session phase change.
    StateTransition {
        /// Phase the session left.
        from: SessionState,
        /// Phase the session entered.
        to: SessionState,
        /// Replicated properties after the change.
        shared: SharedProperties,
    },

    /// The authority started the countdown. Idempotent on receipt.
    StartCountdown,

    /// Leave the current scene for the named one. Applied by all peers.
    LoadScene {
        /// Target scene.
        scene_name: String,
    },

    /// Full session snapshot from the authority to one peer; sent on join
    /// and on reconnect instead of replaying history.
    SessionSync {
        /// Current phase.
        state: SessionState,
        /// Current replicated properties.
        shared: SharedProperties,
        /// Current authority.
        authority: PeerId,
        /// All connected peers.
        peers: Vec<PeerId>,
    },

    /// A peer joined the session.
    PeerJoined {
        /// The joiner.
        peer_id: PeerId,
    },

    /// A peer left or was disconnected.
    PeerLeft {
        /// The departed peer.
        peer_id: PeerId,
    },

    /// The owner destroyed a networked entity; drop the replica.
    DespawnEntity {
        /// The destroyed entity.
        entity_id: EntityId,
    },
}

/// A received message together with its sender.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Sending peer.
    pub from: PeerId,
    /// The message.
    pub message: PeerMessage,
}

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encode/decode failure.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary encode/decode failure.
    #[error("binary codec error: {0}")]
    Binary(#[from] bincode::Error),
}

impl PeerMessage {
    /// Encode as JSON text.
    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as binary.
    pub fn to_binary(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from binary.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_tag_format() {
        let json = PeerMessage::StartCountdown.to_json().unwrap();
        assert_eq!(json, "\"start_countdown\"");

        let json = PeerMessage::LoadScene {
            scene_name: "GameOver".into(),
        }
        .to_json()
        .unwrap();
        assert!(json.contains("\"load_scene\""));
        assert!(json.contains("\"scene_name\":\"GameOver\""));
    }

    #[test]
    fn test_json_round_trip() {
        let mut shared = SharedProperties::new();
        shared.set_game_state(SessionState::InPlay);
        let message = PeerMessage::StateTransition {
            from: SessionState::CountdownStarting,
            to: SessionState::InPlay,
            shared,
        };

        let json = message.to_json().unwrap();
        let back = PeerMessage::from_json(&json).unwrap();
        match back {
            PeerMessage::StateTransition { from, to, shared } => {
                assert_eq!(from, SessionState::CountdownStarting);
                assert_eq!(to, SessionState::InPlay);
                assert_eq!(shared.game_state(), Some(SessionState::InPlay));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_binary_round_trip() {
        let message = PeerMessage::SessionSync {
            state: SessionState::WaitingForPlayers,
            shared: SharedProperties::new(),
            authority: PeerId::new([1; 16]),
            peers: vec![PeerId::new([1; 16]), PeerId::new([2; 16])],
        };

        let bytes = message.to_binary().unwrap();
        let back = PeerMessage::from_binary(&bytes).unwrap();
        match back {
            PeerMessage::SessionSync { authority, peers, .. } => {
                assert_eq!(authority, PeerId::new([1; 16]));
                assert_eq!(peers.len(), 2);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_session_state_wire_names_in_transition() {
        let message = PeerMessage::StateTransition {
            from: SessionState::WaitingForPlayers,
            to: SessionState::CountdownStarting,
            shared: SharedProperties::new(),
        };
        let json = message.to_json().unwrap();
        assert!(json.contains("\"WaitingUser\""));
        assert!(json.contains("\"StartingIntro\""));
    }
}
