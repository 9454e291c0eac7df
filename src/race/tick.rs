//! Per-Peer Race Tick
//!
//! One synchronous evaluation pass per physics tick. Contact reports from
//! the physics collaborator are dispatched to the trackers, then every
//! owned racer gets its fall check. Handlers that decline (not the owner,
//! already terminal, unknown entity) have logged the reason themselves;
//! the tick just moves on.

use crate::presentation::Presentation;
use crate::race::checkpoint::CheckpointTracker;
use crate::race::classify::ClassificationTracker;
use crate::race::contact::{ContactKind, ContactReport};
use crate::race::entity::{EntityId, EntityWorld};
use crate::race::events::RaceEvent;
use crate::race::hazard::{HazardEventHandler, HazardOutcome};
use crate::session::peer::PeerId;

/// Result of a race tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, in generation order.
    pub events: Vec<RaceEvent>,
    /// Dead racers the caller must despawn and announce.
    pub despawn_requests: Vec<EntityId>,
    /// Player racers that died this tick; each one demands the failure
    /// scene on every peer.
    pub player_deaths: Vec<EntityId>,
}

/// Run one race tick for the local peer.
#[allow(clippy::too_many_arguments)]
pub fn run_race_tick(
    world: &mut EntityWorld,
    local_peer: PeerId,
    reports: &[ContactReport],
    checkpoints: &CheckpointTracker,
    classification: &mut ClassificationTracker,
    hazards: &HazardEventHandler,
    presentation: &mut dyn Presentation,
    tick: u64,
) -> TickResult {
    let mut result = TickResult::default();

    // 1. Dispatch contact reports in arrival order
    for report in reports {
        match report.kind {
            ContactKind::Checkpoint => {
                let _ = checkpoints.observe_checkpoint(
                    world,
                    report.entity,
                    report.position,
                    local_peer,
                    presentation,
                    &mut result.events,
                    tick,
                );
            }
            ContactKind::LethalSurface => {
                let _ = checkpoints.handle_lethal_surface(
                    world,
                    report.entity,
                    local_peer,
                    presentation,
                    &mut result.events,
                    tick,
                );
            }
            ContactKind::FinishLine => {
                let _ = classification.on_finish_overlap(
                    world,
                    report.entity,
                    local_peer,
                    presentation,
                    &mut result.events,
                    tick,
                );
            }
            ContactKind::DeathZone => {
                match hazards.on_death_zone_overlap(
                    world,
                    report.entity,
                    local_peer,
                    &mut result.events,
                    tick,
                ) {
                    Ok(HazardOutcome::PlayerEliminated { entity }) => {
                        result.despawn_requests.push(entity);
                        result.player_deaths.push(entity);
                    }
                    Ok(HazardOutcome::AiEliminated { entity }) => {
                        result.despawn_requests.push(entity);
                    }
                    Err(_) => {}
                }
            }
        }
    }

    // 2. Fall check for every owned racer
    for entity_id in world.owned_by(local_peer) {
        let _ = checkpoints.evaluate_fall(
            world,
            entity_id,
            local_peer,
            presentation,
            &mut result.events,
            tick,
        );
    }

    result
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{to_fixed, RESPAWN_HEIGHT_THRESHOLD};
    use crate::core::vec3::FixedVec3;
    use crate::presentation::recording::RecordingPresentation;
    use crate::race::entity::{Entity, EntityKind};

    struct Fixture {
        world: EntityWorld,
        checkpoints: CheckpointTracker,
        classification: ClassificationTracker,
        hazards: HazardEventHandler,
        presentation: RecordingPresentation,
        me: PeerId,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                world: EntityWorld::new(),
                checkpoints: CheckpointTracker::new(RESPAWN_HEIGHT_THRESHOLD),
                classification: ClassificationTracker::new(),
                hazards: HazardEventHandler::new(),
                presentation: RecordingPresentation::default(),
                me: PeerId::new([1; 16]),
            }
        }

        fn spawn(&mut self, id: u8, owner: PeerId, kind: EntityKind) -> EntityId {
            let entity_id = EntityId::new([id; 16]);
            self.world
                .register(Entity::new(entity_id, owner, kind, FixedVec3::from_ints(0, 1, 0)));
            entity_id
        }

        fn run(&mut self, reports: &[ContactReport], tick: u64) -> TickResult {
            run_race_tick(
                &mut self.world,
                self.me,
                reports,
                &self.checkpoints,
                &mut self.classification,
                &self.hazards,
                &mut self.presentation,
                tick,
            )
        }
    }

    #[test]
    fn test_checkpoint_then_fall_in_one_session() {
        let mut fx = Fixture::new();
        let me = fx.me;
        let id = fx.spawn(10, me, EntityKind::Player);

        let marker = FixedVec3::from_ints(8, 3, 2);
        let result = fx.run(
            &[ContactReport {
                entity: id,
                kind: ContactKind::Checkpoint,
                position: marker,
            }],
            1,
        );
        assert_eq!(result.events.len(), 1);

        fx.world.get_mut(id).unwrap().position = FixedVec3::new(0, to_fixed(-12.0), 0);
        let result = fx.run(&[], 2);

        assert_eq!(result.events.len(), 1);
        assert_eq!(fx.world.get(id).unwrap().position, marker);
    }

    #[test]
    fn test_player_death_requests_despawn_and_scene_exit() {
        let mut fx = Fixture::new();
        let me = fx.me;
        let id = fx.spawn(10, me, EntityKind::Player);

        let result = fx.run(
            &[ContactReport {
                entity: id,
                kind: ContactKind::DeathZone,
                position: FixedVec3::ZERO,
            }],
            1,
        );

        assert_eq!(result.despawn_requests, vec![id]);
        assert_eq!(result.player_deaths, vec![id]);
    }

    #[test]
    fn test_ai_death_requests_despawn_only() {
        let mut fx = Fixture::new();
        let me = fx.me;
        let id = fx.spawn(10, me, EntityKind::Ai);

        let result = fx.run(
            &[ContactReport {
                entity: id,
                kind: ContactKind::DeathZone,
                position: FixedVec3::ZERO,
            }],
            1,
        );

        assert_eq!(result.despawn_requests, vec![id]);
        assert!(result.player_deaths.is_empty());
    }

    #[test]
    fn test_remote_entity_contacts_do_not_mutate() {
        let mut fx = Fixture::new();
        let remote_owner = PeerId::new([7; 16]);
        let id = fx.spawn(10, remote_owner, EntityKind::Player);

        let result = fx.run(
            &[
                ContactReport {
                    entity: id,
                    kind: ContactKind::Checkpoint,
                    position: FixedVec3::from_ints(9, 9, 9),
                },
                ContactReport {
                    entity: id,
                    kind: ContactKind::DeathZone,
                    position: FixedVec3::ZERO,
                },
            ],
            1,
        );

        let entity = fx.world.get(id).unwrap();
        assert!(entity.alive);
        assert_ne!(entity.last_checkpoint, FixedVec3::from_ints(9, 9, 9));
        assert!(result.despawn_requests.is_empty());
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_remote_finish_updates_projection_only() {
        let mut fx = Fixture::new();
        let remote_owner = PeerId::new([7; 16]);
        let id = fx.spawn(10, remote_owner, EntityKind::Player);

        let result = fx.run(
            &[ContactReport {
                entity: id,
                kind: ContactKind::FinishLine,
                position: FixedVec3::ZERO,
            }],
            1,
        );

        assert_eq!(fx.classification.current_rank(), 1);
        assert!(!fx.world.get(id).unwrap().has_finished);
        assert_eq!(result.events.len(), 1);
    }

    #[test]
    fn test_duplicate_reports_within_tick_count_once() {
        let mut fx = Fixture::new();
        let me = fx.me;
        let id = fx.spawn(10, me, EntityKind::Player);

        let finish = ContactReport {
            entity: id,
            kind: ContactKind::FinishLine,
            position: FixedVec3::ZERO,
        };
        let result = fx.run(&[finish, finish], 1);

        assert_eq!(fx.classification.current_rank(), 1);
        assert_eq!(result.events.len(), 1);
    }
}
