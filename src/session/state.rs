//! Session State Definitions
//!
//! The shared session record: the four-phase state machine, the replicated
//! property map, and the configuration knobs for a match. The record itself
//! is owned by whichever peer currently holds authority; every other peer
//! holds a read-only mirror updated by broadcast.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::fixed::{Fixed, RESPAWN_HEIGHT_THRESHOLD};
use crate::core::hash::StateHasher;

/// Replicated property key: current session phase.
pub const KEY_GAME_STATE: &str = "GameState";

/// Replicated property key: wall-clock instant (unix millis) when the
/// authority entered the waiting phase. Informational only - migration
/// deliberately ignores it (see `SessionAuthority`).
pub const KEY_WAITING_START_TIME: &str = "WaitingStartTime";

/// Phase of the match session.
///
/// Wire names predate the internal ones and are kept for compatibility
/// with the replicated property store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionState {
    /// Waiting for players to join.
    #[default]
    #[serde(rename = "WaitingUser")]
    WaitingForPlayers,
    /// Countdown running on every peer.
    #[serde(rename = "StartingIntro")]
    CountdownStarting,
    /// Active play.
    InPlay,
    /// Match over.
    Finished,
}

impl SessionState {
    /// The only state this one may legally transition to.
    /// No transition skips a state; `Finished` is terminal.
    pub fn successor(self) -> Option<SessionState> {
        match self {
            SessionState::WaitingForPlayers => Some(SessionState::CountdownStarting),
            SessionState::CountdownStarting => Some(SessionState::InPlay),
            SessionState::InPlay => Some(SessionState::Finished),
            SessionState::Finished => None,
        }
    }

    /// Stable discriminant for hashing.
    pub fn discriminant(self) -> u8 {
        match self {
            SessionState::WaitingForPlayers => 0,
            SessionState::CountdownStarting => 1,
            SessionState::InPlay => 2,
            SessionState::Finished => 3,
        }
    }
}

/// A value in the replicated property map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Session phase.
    State(SessionState),
    /// Unix-epoch milliseconds.
    Millis(i64),
    /// Free-form text.
    Text(String),
}

/// Best-effort replicated key/value store for session-scoped facts.
///
/// Single-writer (the authority), multi-reader. BTreeMap keeps hashing
/// and wire encoding deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedProperties {
    entries: BTreeMap<String, PropertyValue>,
}

impl SharedProperties {
    /// Create an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw read.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    /// Raw write.
    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.entries.insert(key.into(), value);
    }

    /// Typed read of the session phase.
    pub fn game_state(&self) -> Option<SessionState> {
        match self.entries.get(KEY_GAME_STATE) {
            Some(PropertyValue::State(state)) => Some(*state),
            _ => None,
        }
    }

    /// Typed write of the session phase.
    pub fn set_game_state(&mut self, state: SessionState) {
        self.insert(KEY_GAME_STATE, PropertyValue::State(state));
    }

    /// Typed read of the waiting-start stamp.
    pub fn waiting_start_time(&self) -> Option<i64> {
        match self.entries.get(KEY_WAITING_START_TIME) {
            Some(PropertyValue::Millis(ms)) => Some(*ms),
            _ => None,
        }
    }

    /// Typed write of the waiting-start stamp.
    pub fn set_waiting_start_time(&mut self, millis: i64) {
        self.insert(KEY_WAITING_START_TIME, PropertyValue::Millis(millis));
    }

    /// Hash every entry in key order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        for (key, value) in &self.entries {
            hasher.update_str(key);
            match value {
                PropertyValue::State(state) => hasher.update_u8(state.discriminant()),
                PropertyValue::Millis(ms) => hasher.update_i64(*ms),
                PropertyValue::Text(text) => hasher.update_str(text),
            }
        }
    }
}

/// The shared session record.
#[derive(Clone, Debug)]
pub struct MatchSession {
    state: SessionState,
    state_entered_at: DateTime<Utc>,
    shared: SharedProperties,
}

impl MatchSession {
    /// Create a fresh session in the waiting phase.
    pub fn new() -> Self {
        let now = Utc::now();
        let mut shared = SharedProperties::new();
        shared.set_game_state(SessionState::WaitingForPlayers);
        shared.set_waiting_start_time(now.timestamp_millis());
        Self {
            state: SessionState::WaitingForPlayers,
            state_entered_at: now,
            shared,
        }
    }

    /// Current phase.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// When the current phase was entered (local wall clock).
    pub fn state_entered_at(&self) -> DateTime<Utc> {
        self.state_entered_at
    }

    /// Replicated properties.
    pub fn shared(&self) -> &SharedProperties {
        &self.shared
    }

    /// Apply a phase change, stamping entry time and rewriting the
    /// replicated phase property. Validation happens in `SessionAuthority`;
    /// this is the unconditional mutation.
    pub fn enter_state(&mut self, state: SessionState) {
        self.state = state;
        self.state_entered_at = Utc::now();
        self.shared.set_game_state(state);
    }

    /// Overwrite the local mirror from a broadcast or sync payload.
    pub fn adopt(&mut self, state: SessionState, shared: SharedProperties) {
        self.state = state;
        self.state_entered_at = Utc::now();
        self.shared = shared;
    }

    /// Refresh the waiting-start stamp to now.
    pub fn restamp_waiting_start(&mut self) {
        self.shared.set_waiting_start_time(Utc::now().timestamp_millis());
    }

    /// Hash the replicated portion of the session.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.state.discriminant());
        self.shared.hash_into(hasher);
    }
}

impl Default for MatchSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a match session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Ticks the authority waits in `WaitingForPlayers` before starting
    /// the countdown (5 seconds at 60 Hz).
    pub min_wait_ticks: u64,
    /// Ticks per countdown step (1 second at 60 Hz).
    pub countdown_step_ticks: u64,
    /// Height below which an owned entity respawns at its checkpoint.
    pub respawn_height_threshold: Fixed,
    /// Scene loaded on every peer when a player dies in a hazard.
    pub failure_scene: String,
    /// Scene a disconnected peer falls back to.
    pub lobby_scene: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_wait_ticks: 300,
            countdown_step_ticks: 60,
            respawn_height_threshold: RESPAWN_HEIGHT_THRESHOLD,
            failure_scene: "GameOver".to_string(),
            lobby_scene: "Lobby".to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
