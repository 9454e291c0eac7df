//! Peer Runtime
//!
//! The per-process composition root: one `PeerRuntime` per peer owns the
//! membership mirror, the session record, the countdown, the race
//! trackers, the entity world, and the channel endpoint. Collaborators are
//! passed in at construction and threaded through - no ambient lookup.
//!
//! Scheduling is a single cooperative loop: the embedding calls
//! [`PeerRuntime::handle_message`] for every drained envelope, then
//! [`PeerRuntime::tick`] once per fixed physics step. Every handler runs
//! synchronously within the tick; nothing blocks on a remote peer.

use tracing::{debug, info, warn};

use crate::core::hash::{StateHash, StateHasher};
use crate::net::channel::{BroadcastChannel, TargetSet};
use crate::net::message::{Envelope, PeerMessage};
use crate::presentation::{Presentation, SceneDirector};
use crate::race::contact::ContactReport;
use crate::race::entity::{Entity, EntityWorld};
use crate::race::events::RaceEvent;
use crate::race::tick::run_race_tick;
use crate::race::{CheckpointTracker, ClassificationTracker, HazardEventHandler};
use crate::session::authority::{SessionAuthority, SessionError};
use crate::session::countdown::{CountdownEvent, CountdownSequencer};
use crate::session::peer::{Departure, PeerId, PeerRegistry};
use crate::session::state::{SessionConfig, SessionState};

/// One peer's complete view of the match.
pub struct PeerRuntime {
    peer_id: PeerId,
    config: SessionConfig,
    registry: PeerRegistry,
    authority: SessionAuthority,
    countdown: CountdownSequencer,
    checkpoints: CheckpointTracker,
    classification: ClassificationTracker,
    hazards: HazardEventHandler,
    world: EntityWorld,
    channel: Box<dyn BroadcastChannel>,
    presentation: Box<dyn Presentation>,
    scene: Box<dyn SceneDirector>,
    pending_contacts: Vec<ContactReport>,
    event_log: Vec<RaceEvent>,
    tick: u64,
    connected: bool,
    scene_exit_done: bool,
}

impl PeerRuntime {
    /// Create the founding peer of a session. The founder holds authority
    /// until it disconnects.
    pub fn found_session(
        config: SessionConfig,
        channel: Box<dyn BroadcastChannel>,
        presentation: Box<dyn Presentation>,
        scene: Box<dyn SceneDirector>,
    ) -> Self {
        let peer_id = channel.local_peer();
        let mut registry = PeerRegistry::new();
        registry.join_as_authority(peer_id);
        info!("peer {} founded session as authority", peer_id);
        Self::assemble(peer_id, config, registry, channel, presentation, scene)
    }

    /// Create a peer joining an existing session. Announces itself and
    /// mirrors session state once the authority's snapshot arrives; until
    /// then it is a passive observer. If the snapshot is lost, calling
    /// [`PeerRuntime::request_sync`] re-announces.
    pub fn join_session(
        config: SessionConfig,
        channel: Box<dyn BroadcastChannel>,
        presentation: Box<dyn Presentation>,
        scene: Box<dyn SceneDirector>,
    ) -> Self {
        let peer_id = channel.local_peer();
        let mut registry = PeerRegistry::new();
        registry.join(peer_id);
        let mut runtime = Self::assemble(peer_id, config, registry, channel, presentation, scene);
        info!("peer {} joining session", peer_id);
        runtime.request_sync();
        runtime
    }

    fn assemble(
        peer_id: PeerId,
        config: SessionConfig,
        registry: PeerRegistry,
        channel: Box<dyn BroadcastChannel>,
        presentation: Box<dyn Presentation>,
        scene: Box<dyn SceneDirector>,
    ) -> Self {
        let countdown = CountdownSequencer::new(config.countdown_step_ticks);
        let checkpoints = CheckpointTracker::new(config.respawn_height_threshold);
        Self {
            peer_id,
            config,
            registry,
            authority: SessionAuthority::new(),
            countdown,
            checkpoints,
            classification: ClassificationTracker::new(),
            hazards: HazardEventHandler::new(),
            world: EntityWorld::new(),
            channel,
            presentation,
            scene,
            pending_contacts: Vec::new(),
            event_log: Vec::new(),
            tick: 0,
            connected: true,
            scene_exit_done: false,
        }
    }

    // =========================================================================
    // Inbound messages
    // =========================================================================

    /// Dispatch one received envelope. Safe against duplicates and against
    /// messages from departed peers - every branch is idempotent.
    pub fn handle_message(&mut self, envelope: Envelope) {
        if !self.connected {
            return;
        }

        match envelope.message {
            PeerMessage::StateTransition { from, to, shared } => {
                // The local authority already applied its own transition
                if envelope.from == self.peer_id {
                    return;
                }
                let before = self.authority.state();
                self.authority.apply_remote_transition(from, to, shared);
                let after = self.authority.state();
                if after != before {
                    self.event_log
                        .push(RaceEvent::phase_changed(self.tick, before, after));
                }
            }

            PeerMessage::StartCountdown => self.handle_start_countdown(),

            PeerMessage::LoadScene { scene_name } => {
                if self.scene_exit_done {
                    debug!("redelivered scene exit to {} ignored", scene_name);
                    return;
                }
                info!("leaving scene for {}", scene_name);
                self.scene_exit_done = true;
                self.countdown.halt();
                self.scene.load_scene(&scene_name);
            }

            PeerMessage::SessionSync {
                state,
                shared,
                authority,
                peers,
            } => {
                self.registry.adopt_snapshot(&peers, authority);
                self.authority.apply_sync(state, shared);
            }

            PeerMessage::PeerJoined { peer_id } => {
                if self.registry.join(peer_id) {
                    info!("peer {} joined", peer_id);
                }
                // The authority answers joins (and re-queries after a lost
                // snapshot) with current full state, never with history
                if self.is_local_authority() && peer_id != self.peer_id {
                    let message = PeerMessage::SessionSync {
                        state: self.authority.state(),
                        shared: self.authority.shared().clone(),
                        authority: self.peer_id,
                        peers: self.registry.peer_ids(),
                    };
                    self.channel.send(TargetSet::One(peer_id), message);
                }
            }

            PeerMessage::PeerLeft { peer_id } => self.handle_peer_left(peer_id),

            PeerMessage::DespawnEntity { entity_id } => {
                if self.world.despawn(entity_id) {
                    debug!("despawned entity {}", entity_id);
                }
            }
        }
    }

    fn handle_start_countdown(&mut self) {
        let state = self.authority.state();
        let in_window = matches!(
            state,
            SessionState::WaitingForPlayers | SessionState::CountdownStarting
        );
        if !in_window || self.countdown.is_complete() {
            debug!("countdown trigger ignored in {:?}", state);
            return;
        }
        if let Some(label) = self.countdown.start() {
            self.presentation.show_countdown_step(label);
        }
    }

    fn handle_peer_left(&mut self, peer_id: PeerId) {
        if peer_id == self.peer_id {
            return;
        }
        match self.registry.remove(peer_id) {
            Departure::Unknown => {}
            Departure::Left => info!("peer {} left", peer_id),
            Departure::SessionEmpty => warn!("last remote peer {} left", peer_id),
            Departure::AuthorityMigrated { new_authority } => {
                warn!(
                    "{}: authority migrated {} -> {}",
                    SessionError::AuthorityLost,
                    peer_id,
                    new_authority
                );
                if new_authority == self.peer_id {
                    self.authority.on_promoted();
                    // If the old authority died between our countdown
                    // finishing and its InPlay announcement, that
                    // transition was lost for good - re-derive it
                    if self.authority.state() == SessionState::CountdownStarting
                        && self.countdown.is_complete()
                    {
                        let _ = self.apply_local_transition(
                            SessionState::CountdownStarting,
                            SessionState::InPlay,
                        );
                    }
                }
            }
        }
    }

    // =========================================================================
    // Cooperative tick
    // =========================================================================

    /// Run one fixed-step tick: wait timer, countdown, then the race pass
    /// over queued contact reports and owned entities.
    pub fn tick(&mut self) {
        if !self.connected {
            return;
        }
        self.tick += 1;

        self.tick_wait_timer();
        self.tick_countdown();
        self.tick_race();
    }

    fn tick_wait_timer(&mut self) {
        if !self.is_local_authority() {
            return;
        }
        if self.authority.advance_wait_timer(self.config.min_wait_ticks) {
            // Minimum wait elapsed: start the match
            if self
                .apply_local_transition(SessionState::WaitingForPlayers, SessionState::CountdownStarting)
                .is_ok()
            {
                self.channel.send(TargetSet::All, PeerMessage::StartCountdown);
            }
        }
    }

    fn tick_countdown(&mut self) {
        match self.countdown.advance() {
            Some(CountdownEvent::Step(label)) => {
                self.presentation.show_countdown_step(label);
            }
            Some(CountdownEvent::Completed) => {
                self.presentation.clear_countdown();
                // Only the authority's completion drives the shared record;
                // everyone else's completion is presentation only
                if self.is_local_authority() {
                    let _ = self
                        .apply_local_transition(SessionState::CountdownStarting, SessionState::InPlay);
                }
            }
            None => {}
        }
    }

    fn tick_race(&mut self) {
        if self.authority.state() != SessionState::InPlay {
            self.pending_contacts.clear();
            return;
        }

        let reports = std::mem::take(&mut self.pending_contacts);
        let result = run_race_tick(
            &mut self.world,
            self.peer_id,
            &reports,
            &self.checkpoints,
            &mut self.classification,
            &self.hazards,
            self.presentation.as_mut(),
            self.tick,
        );

        for entity_id in result.despawn_requests {
            self.world.despawn(entity_id);
            self.channel
                .send(TargetSet::All, PeerMessage::DespawnEntity { entity_id });
        }

        for _ in &result.player_deaths {
            self.authority.note_player_death();
        }
        if !result.player_deaths.is_empty() && !self.scene_exit_done {
            // Every peer must leave for the failure scene; the local scene
            // director is driven by our own copy of the broadcast
            self.channel.send(
                TargetSet::All,
                PeerMessage::LoadScene {
                    scene_name: self.config.failure_scene.clone(),
                },
            );
        }

        self.event_log.extend(result.events);
    }

    fn apply_local_transition(
        &mut self,
        from: SessionState,
        to: SessionState,
    ) -> Result<(), SessionError> {
        match self.authority.request_transition(from, to) {
            Ok(()) => {
                self.event_log.push(RaceEvent::phase_changed(self.tick, from, to));
                self.channel.send(
                    TargetSet::All,
                    PeerMessage::StateTransition {
                        from,
                        to,
                        shared: self.authority.shared().clone(),
                    },
                );
                Ok(())
            }
            Err(err) => {
                // Stale request: drop it, the session stays as it is
                debug!("{}", err);
                Err(err)
            }
        }
    }

    // =========================================================================
    // External inputs
    // =========================================================================

    /// Physics collaborator input: an overlap or collision this tick.
    pub fn submit_contact(&mut self, report: ContactReport) {
        self.pending_contacts.push(report);
    }

    /// Register a racer at session setup. Every peer registers the same
    /// set so finish observations work on replicas.
    pub fn register_entity(&mut self, entity: Entity) {
        self.world.register(entity);
    }

    /// External match-end signal. Only honored on the authority during
    /// play.
    pub fn match_end_signal(&mut self) {
        if !self.is_local_authority() {
            debug!("{}", SessionError::NotAuthoritative);
            return;
        }
        let _ = self.apply_local_transition(SessionState::InPlay, SessionState::Finished);
    }

    /// Re-announce to the session after a lost snapshot or a reconnect;
    /// the authority answers with current full state.
    pub fn request_sync(&mut self) {
        self.channel.send(
            TargetSet::All,
            PeerMessage::PeerJoined {
                peer_id: self.peer_id,
            },
        );
    }

    /// The local connection is gone: tear down session state and send the
    /// one outward signal - return to the pre-session screen.
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        warn!("{}", SessionError::DisconnectedFromSession);
        self.connected = false;
        self.countdown.halt();
        self.pending_contacts.clear();
        self.world.clear();
        self.classification.clear();
        self.scene.return_to_lobby();
    }

    /// Gracefully leave: tell the others, then tear down.
    pub fn leave_session(&mut self) {
        self.channel.send(
            TargetSet::All,
            PeerMessage::PeerLeft {
                peer_id: self.peer_id,
            },
        );
        self.disconnect();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// This peer's id.
    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    /// Current session phase (authoritative copy or mirror).
    pub fn session_state(&self) -> SessionState {
        self.authority.state()
    }

    /// Does this peer currently drive the session?
    pub fn is_local_authority(&self) -> bool {
        self.registry.is_authority(self.peer_id)
    }

    /// The peer this runtime currently believes is authoritative.
    pub fn authority_peer(&self) -> Option<PeerId> {
        self.registry.authority()
    }

    /// Membership mirror.
    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// This peer's local rank projection.
    pub fn local_rank(&self) -> u32 {
        self.classification.current_rank()
    }

    /// Ticks elapsed on this peer.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Ticks the wait timer has accumulated (authority only).
    pub fn wait_ticks(&self) -> u64 {
        self.authority.wait_ticks()
    }

    /// Is this peer still in the session?
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The entity world replica.
    pub fn world(&self) -> &EntityWorld {
        &self.world
    }

    /// Mutable world access for the embedding's physics integration.
    pub fn world_mut(&mut self) -> &mut EntityWorld {
        &mut self.world
    }

    /// Take all events logged since the last call.
    pub fn take_events(&mut self) -> Vec<RaceEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Hash of the replicated view (session record + entity world).
    /// Equal hashes on two peers mean their replicated state agrees;
    /// tick counts are deliberately excluded so peers a few ticks apart
    /// still compare equal at quiescence.
    pub fn state_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_session_state();
        self.authority.session().hash_into(&mut hasher);
        self.world.hash_into(&mut hasher);
        hasher.finalize()
    }
}

// =============================================================================
// TESTS
// =============================================================================
