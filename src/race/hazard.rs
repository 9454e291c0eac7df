//! Hazard Elimination
//!
//! Death zones eliminate racers outright: the owning peer marks its racer
//! dead, the entity is despawned everywhere, and - for player racers - the
//! whole session transitions to the failure scene. AI deaths despawn the
//! racer without ending the session. The handler is idempotent: hazards
//! keep reporting overlaps while a body is inside, and only the first one
//! counts.

use tracing::{debug, info};

use crate::race::entity::{EntityId, EntityKind, EntityWorld};
use crate::race::events::RaceEvent;
use crate::race::ownership::ensure_owner;
use crate::race::Rejection;
use crate::session::peer::PeerId;

/// What an accepted hazard overlap requires of the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HazardOutcome {
    /// A player racer died: despawn it everywhere, notify match progress,
    /// and take every peer to the failure scene.
    PlayerEliminated {
        /// The dead racer.
        entity: EntityId,
    },
    /// An AI racer died: despawn it everywhere, nothing else.
    AiEliminated {
        /// The dead racer.
        entity: EntityId,
    },
}

/// Detects owned-racer deaths in hazard volumes.
#[derive(Clone, Copy, Debug, Default)]
pub struct HazardEventHandler;

impl HazardEventHandler {
    /// Create a handler.
    pub fn new() -> Self {
        Self
    }

    /// The simulating peer's racer overlapped a death zone.
    ///
    /// Only the owner reports a death - a non-owner observing the overlap
    /// feeds presentation at most, never shared truth. Re-reports for an
    /// already-dead racer are no-ops.
    pub fn on_death_zone_overlap(
        &self,
        world: &mut EntityWorld,
        entity_id: EntityId,
        acting_peer: PeerId,
        events: &mut Vec<RaceEvent>,
        tick: u64,
    ) -> Result<HazardOutcome, Rejection> {
        let entity = world.get_mut(entity_id).ok_or(Rejection::UnknownEntity)?;
        ensure_owner(entity, acting_peer)?;

        if !entity.alive {
            debug!("death zone overlap for {} ignored: already dead", entity_id);
            return Err(Rejection::DuplicateTerminalEvent);
        }

        entity.mark_dead();
        entity.freeze();
        let kind = entity.kind;

        info!("entity {} eliminated by hazard", entity_id);
        events.push(RaceEvent::entity_died(tick, entity_id));

        Ok(match kind {
            EntityKind::Player => HazardOutcome::PlayerEliminated { entity: entity_id },
            EntityKind::Ai => HazardOutcome::AiEliminated { entity: entity_id },
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec3::FixedVec3;
    use crate::race::entity::Entity;

    fn setup(kind: EntityKind) -> (EntityWorld, EntityId, PeerId) {
        let owner = PeerId::new([1; 16]);
        let id = EntityId::new([10; 16]);
        let mut world = EntityWorld::new();
        world.register(Entity::new(id, owner, kind, FixedVec3::ZERO));
        (world, id, owner)
    }

    #[test]
    fn test_player_death_is_terminal_and_escalates() {
        let (mut world, id, owner) = setup(EntityKind::Player);
        let handler = HazardEventHandler::new();
        let mut events = Vec::new();

        let outcome = handler
            .on_death_zone_overlap(&mut world, id, owner, &mut events, 1)
            .unwrap();

        assert_eq!(outcome, HazardOutcome::PlayerEliminated { entity: id });
        let entity = world.get(id).unwrap();
        assert!(!entity.alive);
        assert_eq!(entity.velocity, FixedVec3::ZERO);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_ai_death_does_not_escalate() {
        let (mut world, id, owner) = setup(EntityKind::Ai);
        let handler = HazardEventHandler::new();
        let mut events = Vec::new();

        let outcome = handler
            .on_death_zone_overlap(&mut world, id, owner, &mut events, 1)
            .unwrap();

        assert_eq!(outcome, HazardOutcome::AiEliminated { entity: id });
        assert!(!world.get(id).unwrap().alive);
    }

    #[test]
    fn test_second_overlap_is_noop() {
        let (mut world, id, owner) = setup(EntityKind::Player);
        let handler = HazardEventHandler::new();
        let mut events = Vec::new();

        handler
            .on_death_zone_overlap(&mut world, id, owner, &mut events, 1)
            .unwrap();
        let second = handler.on_death_zone_overlap(&mut world, id, owner, &mut events, 2);

        assert_eq!(second, Err(Rejection::DuplicateTerminalEvent));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_non_owner_cannot_report_death() {
        let (mut world, id, _owner) = setup(EntityKind::Player);
        let stranger = PeerId::new([9; 16]);
        let handler = HazardEventHandler::new();
        let mut events = Vec::new();

        let result = handler.on_death_zone_overlap(&mut world, id, stranger, &mut events, 1);

        assert_eq!(result, Err(Rejection::OwnershipViolation));
        assert!(world.get(id).unwrap().alive);
        assert!(events.is_empty());
    }
}
