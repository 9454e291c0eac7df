//! Skybound Circuit Peer Demo
//!
//! Wires three in-memory peers through the broadcast hub and runs a full
//! session lifecycle: join, wait, countdown, play, checkpoint, respawn,
//! finish, hazard death, failure-scene exit. Duplicate delivery is turned
//! on so every handler's idempotence is exercised for real.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use skybound::core::fixed::{to_fixed, SPAWN_HEIGHT};
use skybound::net::channel::{DeliveryProfile, LocalBroadcastHub};
use skybound::presentation::{Presentation, SceneDirector};
use skybound::race::contact::ContactKind;
use skybound::race::entity::{Entity, EntityId, EntityKind};
use skybound::{ContactReport, FixedVec3, PeerId, PeerRuntime, SessionConfig, SessionState, TICK_RATE, VERSION};

/// Presentation collaborator that narrates to the log.
struct LogPresentation {
    label: &'static str,
    rank: u32,
}

impl LogPresentation {
    fn new(label: &'static str) -> Self {
        Self { label, rank: 0 }
    }
}

impl Presentation for LogPresentation {
    fn play_checkpoint_effect(&mut self, entity: EntityId) {
        info!("[{}] checkpoint effect for {}", self.label, entity);
    }

    fn play_respawn_effect(&mut self, entity: EntityId) {
        info!("[{}] respawn effect for {}", self.label, entity);
    }

    fn show_countdown_step(&mut self, label: &str) {
        info!("[{}] countdown: {}", self.label, label);
    }

    fn clear_countdown(&mut self) {
        info!("[{}] countdown cleared", self.label);
    }

    fn show_classified(&mut self, entity: EntityId, rank: u32) {
        info!("[{}] racer {} classified #{}", self.label, entity, rank);
    }

    fn increment_rank(&mut self) {
        self.rank += 1;
    }

    fn current_rank(&self) -> u32 {
        self.rank
    }
}

/// Scene collaborator that narrates to the log.
struct LogSceneDirector {
    label: &'static str,
}

impl SceneDirector for LogSceneDirector {
    fn load_scene(&mut self, scene_name: &str) {
        info!("[{}] loading scene {}", self.label, scene_name);
    }

    fn return_to_lobby(&mut self) {
        info!("[{}] returning to lobby", self.label);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Skybound Circuit peer core v{}", VERSION);
    info!("Tick rate: {} Hz", TICK_RATE);

    demo_session().await
}

/// Run a scripted three-peer match.
async fn demo_session() -> Result<()> {
    info!("=== Starting Demo Session ===");

    // Duplicate every delivery: the handlers must not care
    let hub = LocalBroadcastHub::with_profile(DeliveryProfile {
        duplicate_deliveries: true,
    });

    let config = SessionConfig {
        min_wait_ticks: 120,        // 2 seconds
        countdown_step_ticks: 30,   // 0.5 seconds per step
        ..Default::default()
    };

    let labels = ["ana", "bruno", "carla"];
    let mut runtimes: Vec<PeerRuntime> = Vec::new();
    for (index, label) in labels.into_iter().enumerate() {
        let peer = PeerId::random();
        let endpoint = hub.attach(peer);
        let presentation = Box::new(LogPresentation::new(label));
        let scene = Box::new(LogSceneDirector { label });
        let runtime = if index == 0 {
            PeerRuntime::found_session(config.clone(), Box::new(endpoint), presentation, scene)
        } else {
            PeerRuntime::join_session(config.clone(), Box::new(endpoint), presentation, scene)
        };
        info!("[{}] is peer {}", label, runtime.peer_id());
        runtimes.push(runtime);
    }
    pump(&hub, &mut runtimes);

    // Session setup: every peer registers the same racers
    let peer_ids: Vec<PeerId> = runtimes.iter().map(|r| r.peer_id()).collect();
    let racers: Vec<EntityId> = (0..3).map(|_| EntityId::random()).collect();
    let drone = EntityId::random();
    let spawn = FixedVec3::new(0, SPAWN_HEIGHT, 0);
    for runtime in &mut runtimes {
        for (racer, owner) in racers.iter().zip(&peer_ids) {
            runtime.register_entity(Entity::new(*racer, *owner, EntityKind::Player, spawn));
        }
        runtime.register_entity(Entity::new(drone, peer_ids[0], EntityKind::Ai, spawn));
    }

    let mut interval = tokio::time::interval(std::time::Duration::from_millis(
        1000 / u64::from(TICK_RATE),
    ));
    let mut play_started_at: Option<u64> = None;

    for _ in 0..1200u64 {
        interval.tick().await;

        for runtime in &mut runtimes {
            runtime.tick();
        }
        pump(&hub, &mut runtimes);

        let tick = runtimes[0].current_tick();
        if play_started_at.is_none()
            && runtimes.iter().all(|r| r.session_state() == SessionState::InPlay)
        {
            info!("=== Play began on every peer at tick {} ===", tick);
            play_started_at = Some(tick);
        }

        if let Some(start) = play_started_at {
            script_play_events(&mut runtimes, &racers, drone, tick - start);
        }

        if runtimes.iter().any(|r| r.session_state() == SessionState::Finished)
            || runtimes.iter().all(|r| !r.is_connected())
        {
            break;
        }

        // The hazard death ends the demo once every peer has left the scene
        if play_started_at.is_some_and(|start| tick - start > 200) {
            break;
        }
    }

    info!("=== Demo Results ===");
    for (runtime, label) in runtimes.iter_mut().zip(labels) {
        let events = runtime.take_events();
        info!(
            "[{}] state={:?} local_rank={} events={} hash={}",
            label,
            runtime.session_state(),
            runtime.local_rank(),
            events.len(),
            hex::encode(&runtime.state_hash()[..8]),
        );
    }

    let hashes: Vec<_> = runtimes.iter().map(|r| r.state_hash()).collect();
    if hashes.windows(2).all(|w| w[0] == w[1]) {
        info!("replicated views agree");
    } else {
        info!("replicated views diverged (rank projections are per-peer by design)");
    }

    Ok(())
}

/// Deliver every queued message until the hub is quiet.
fn pump(hub: &LocalBroadcastHub, runtimes: &mut [PeerRuntime]) {
    loop {
        let mut delivered = false;
        for runtime in runtimes.iter_mut() {
            for envelope in hub.drain(runtime.peer_id()) {
                delivered = true;
                runtime.handle_message(envelope);
            }
        }
        if !delivered {
            return;
        }
    }
}

/// Scripted gameplay beats, in ticks since play began.
fn script_play_events(
    runtimes: &mut [PeerRuntime],
    racers: &[EntityId],
    drone: EntityId,
    play_tick: u64,
) {
    match play_tick {
        // Bruno's racer banks a checkpoint
        30 => runtimes[1].submit_contact(ContactReport {
            entity: racers[1],
            kind: ContactKind::Checkpoint,
            position: FixedVec3::from_ints(12, 3, 0),
        }),

        // Bruno's racer falls off the track; only his peer evaluates it
        60 => {
            if let Some(entity) = runtimes[1].world_mut().get_mut(racers[1]) {
                entity.position = FixedVec3::new(0, to_fixed(-14.0), 0);
                entity.velocity = FixedVec3::from_ints(0, -20, 0);
            }
        }

        // Ana's racer crosses the finish line; every peer sees it
        90 => {
            for runtime in runtimes.iter_mut() {
                runtime.submit_contact(ContactReport {
                    entity: racers[0],
                    kind: ContactKind::FinishLine,
                    position: FixedVec3::from_ints(40, 2, 0),
                });
            }
        }

        // The drone finishes, but carla's peer misses the observation:
        // her rank projection legitimately diverges from the others
        110 => {
            for runtime in runtimes.iter_mut().take(2) {
                runtime.submit_contact(ContactReport {
                    entity: drone,
                    kind: ContactKind::FinishLine,
                    position: FixedVec3::from_ints(40, 2, 0),
                });
            }
        }

        // Carla's racer drops into a death zone: everyone leaves the scene
        130 => runtimes[2].submit_contact(ContactReport {
            entity: racers[2],
            kind: ContactKind::DeathZone,
            position: FixedVec3::from_ints(25, 0, 5),
        }),

        _ => {}
    }
}
