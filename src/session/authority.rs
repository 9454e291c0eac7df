//! Session Authority
//!
//! Canonical owner of the shared session record. The peer currently holding
//! authority validates and applies phase transitions and rewrites the
//! replicated properties; every other peer applies the same transitions as
//! a mirror when the broadcast arrives. Transitions proceed optimistically
//! on the authority - announcements may be lost, and mirrors that miss one
//! resynchronize from a full-state snapshot instead of replayed history.

use tracing::{debug, info, warn};

use crate::session::state::{MatchSession, SessionState, SharedProperties};

/// Session-level errors. All are handled inside the core: benign ones are
/// logged and dropped, and only a full disconnect surfaces to the outside
/// as a single return-to-lobby signal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// A requested phase change does not match the current phase.
    #[error("stale transition: requested {requested_from:?} -> {requested_to:?} but session is {current:?}")]
    StaleTransition {
        /// Phase the caller believed the session was in.
        requested_from: SessionState,
        /// Phase the caller asked for.
        requested_to: SessionState,
        /// Actual phase at the time of the request.
        current: SessionState,
    },

    /// A phase change was requested on a peer that does not hold authority.
    #[error("peer is not authoritative")]
    NotAuthoritative,

    /// The authoritative peer disconnected mid-session.
    #[error("authority lost")]
    AuthorityLost,

    /// The local peer lost its connection to the session.
    #[error("disconnected from session")]
    DisconnectedFromSession,
}

/// Drives the shared session record on whichever peer holds authority, and
/// mirrors it on every other peer.
#[derive(Clone, Debug, Default)]
pub struct SessionAuthority {
    session: MatchSession,
    wait_ticks: u64,
    players_lost: u32,
}

impl SessionAuthority {
    /// Create a fresh session record in the waiting phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// The session record (authoritative copy or mirror).
    pub fn session(&self) -> &MatchSession {
        &self.session
    }

    /// Current phase.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Replicated properties.
    pub fn shared(&self) -> &SharedProperties {
        self.session.shared()
    }

    /// Ticks spent waiting for players under the current authority.
    pub fn wait_ticks(&self) -> u64 {
        self.wait_ticks
    }

    /// Players reported dead so far.
    pub fn players_lost(&self) -> u32 {
        self.players_lost
    }

    /// Request a phase change.
    ///
    /// Succeeds only when `from` matches the current phase and `to` is its
    /// immediate successor - the phase chain never skips a state. Anything
    /// else fails with [`SessionError::StaleTransition`] and leaves the
    /// session untouched; callers log and drop the error.
    pub fn request_transition(
        &mut self,
        from: SessionState,
        to: SessionState,
    ) -> Result<(), SessionError> {
        let current = self.session.state();
        if from != current || current.successor() != Some(to) {
            debug!(
                "transition rejected: {:?} -> {:?} while session is {:?}",
                from, to, current
            );
            return Err(SessionError::StaleTransition {
                requested_from: from,
                requested_to: to,
                current,
            });
        }

        self.session.enter_state(to);
        info!("session {:?} -> {:?}", from, to);
        Ok(())
    }

    /// Count one waiting tick; true exactly when the minimum wait elapses.
    ///
    /// Only meaningful while this peer is authoritative and the session is
    /// waiting - the caller gates on both.
    pub fn advance_wait_timer(&mut self, min_wait_ticks: u64) -> bool {
        if self.session.state() != SessionState::WaitingForPlayers {
            return false;
        }
        self.wait_ticks += 1;
        self.wait_ticks == min_wait_ticks
    }

    /// Apply a transition announced by the authority to the local mirror.
    ///
    /// The mirror only ever moves forward along the phase chain: this
    /// drops redeliveries (`to` equal to the current phase) and stale
    /// announcements from a departed authority that arrive after the new
    /// authority's (cross-sender order is not guaranteed).
    pub fn apply_remote_transition(
        &mut self,
        from: SessionState,
        to: SessionState,
        shared: SharedProperties,
    ) {
        let current = self.session.state();
        if to.discriminant() <= current.discriminant() {
            debug!(
                "transition announcement {:?} -> {:?} ignored at {:?}",
                from, to, current
            );
            return;
        }
        self.session.adopt(to, shared);
        info!("mirrored session transition {:?} -> {:?}", from, to);
    }

    /// Replace the local mirror with the authority's full snapshot.
    /// Used on join and on reconnect.
    pub fn apply_sync(&mut self, state: SessionState, shared: SharedProperties) {
        self.session.adopt(state, shared);
        info!("session mirror synchronized at {:?}", state);
    }

    /// Take over after the previous authority disconnected.
    ///
    /// The new authority keeps the mirrored properties as ground truth. If
    /// the session was still waiting for players, the wait timer restarts
    /// at zero: the previous authority's partial progress was never
    /// replicated, and double-counting it would cut the wait short.
    pub fn on_promoted(&mut self) {
        warn!("previous authority lost; this peer now drives the session");
        if self.session.state() == SessionState::WaitingForPlayers {
            self.wait_ticks = 0;
            self.session.restamp_waiting_start();
        }
    }

    /// Match-progress surface: a player entity died in a hazard.
    pub fn note_player_death(&mut self) {
        self.players_lost += 1;
        info!("player death recorded ({} lost)", self.players_lost);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_legal_chain() {
        let mut authority = SessionAuthority::new();

        authority
            .request_transition(SessionState::WaitingForPlayers, SessionState::CountdownStarting)
            .unwrap();
        authority
            .request_transition(SessionState::CountdownStarting, SessionState::InPlay)
            .unwrap();
        authority
            .request_transition(SessionState::InPlay, SessionState::Finished)
            .unwrap();

        assert_eq!(authority.state(), SessionState::Finished);
    }

    #[test]
    fn test_stale_from_is_rejected() {
        let mut authority = SessionAuthority::new();

        let err = authority
            .request_transition(SessionState::CountdownStarting, SessionState::InPlay)
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::StaleTransition {
                current: SessionState::WaitingForPlayers,
                ..
            }
        ));
        assert_eq!(authority.state(), SessionState::WaitingForPlayers);
    }

    #[test]
    fn test_backwards_transition_is_rejected() {
        let mut authority = SessionAuthority::new();
        authority
            .request_transition(SessionState::WaitingForPlayers, SessionState::CountdownStarting)
            .unwrap();
        authority
            .request_transition(SessionState::CountdownStarting, SessionState::InPlay)
            .unwrap();

        // InPlay -> WaitingForPlayers is not a legal edge
        let err = authority
            .request_transition(SessionState::InPlay, SessionState::WaitingForPlayers)
            .unwrap_err();
        assert!(matches!(err, SessionError::StaleTransition { .. }));
        assert_eq!(authority.state(), SessionState::InPlay);
    }

    #[test]
    fn test_skipping_transition_is_rejected() {
        let mut authority = SessionAuthority::new();

        let err = authority
            .request_transition(SessionState::WaitingForPlayers, SessionState::InPlay)
            .unwrap_err();
        assert!(matches!(err, SessionError::StaleTransition { .. }));
    }

    #[test]
    fn test_transition_rewrites_shared_properties() {
        let mut authority = SessionAuthority::new();
        authority
            .request_transition(SessionState::WaitingForPlayers, SessionState::CountdownStarting)
            .unwrap();

        assert_eq!(
            authority.shared().game_state(),
            Some(SessionState::CountdownStarting)
        );
    }

    #[test]
    fn test_wait_timer_fires_once() {
        let mut authority = SessionAuthority::new();

        for _ in 0..4 {
            assert!(!authority.advance_wait_timer(5));
        }
        assert!(authority.advance_wait_timer(5));
        assert!(!authority.advance_wait_timer(5));
    }

    #[test]
    fn test_wait_timer_stops_outside_waiting() {
        let mut authority = SessionAuthority::new();
        authority
            .request_transition(SessionState::WaitingForPlayers, SessionState::CountdownStarting)
            .unwrap();

        assert!(!authority.advance_wait_timer(1));
        assert_eq!(authority.wait_ticks(), 0);
    }

    #[test]
    fn test_mirror_ignores_duplicate_announcement() {
        let mut mirror = SessionAuthority::new();

        let mut shared = SharedProperties::new();
        shared.set_game_state(SessionState::CountdownStarting);
        mirror.apply_remote_transition(
            SessionState::WaitingForPlayers,
            SessionState::CountdownStarting,
            shared.clone(),
        );
        assert_eq!(mirror.state(), SessionState::CountdownStarting);

        // Same announcement again: no-op
        mirror.apply_remote_transition(
            SessionState::WaitingForPlayers,
            SessionState::CountdownStarting,
            shared,
        );
        assert_eq!(mirror.state(), SessionState::CountdownStarting);
    }

    #[test]
    fn test_mirror_never_regresses() {
        let mut mirror = SessionAuthority::new();

        let mut shared = SharedProperties::new();
        shared.set_game_state(SessionState::InPlay);
        mirror.apply_sync(SessionState::InPlay, shared);

        // Stale announcement from a departed authority arrives late
        let mut stale = SharedProperties::new();
        stale.set_game_state(SessionState::CountdownStarting);
        mirror.apply_remote_transition(
            SessionState::WaitingForPlayers,
            SessionState::CountdownStarting,
            stale,
        );

        assert_eq!(mirror.state(), SessionState::InPlay);
    }

    #[test]
    fn test_promotion_restarts_wait_timer() {
        let mut authority = SessionAuthority::new();

        // Simulate partial progress mirrored from the previous authority
        for _ in 0..42 {
            authority.advance_wait_timer(1000);
        }
        assert_eq!(authority.wait_ticks(), 42);

        authority.on_promoted();
        assert_eq!(authority.wait_ticks(), 0);
    }

    #[test]
    fn test_promotion_mid_play_keeps_state() {
        let mut mirror = SessionAuthority::new();
        let mut shared = SharedProperties::new();
        shared.set_game_state(SessionState::InPlay);
        mirror.apply_sync(SessionState::InPlay, shared);

        mirror.on_promoted();
        assert_eq!(mirror.state(), SessionState::InPlay);
    }
}
