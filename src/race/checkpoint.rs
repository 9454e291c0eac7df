//! Checkpoint Tracking and Respawn
//!
//! Each racer carries its last safe position. The owning peer updates it
//! on checkpoint overlap and teleports the racer back when it falls below
//! the track or touches a lethal surface. Checkpoint state is purely local
//! to the owner - no network message is involved, because only the owner
//! ever evaluates or applies a respawn.

use tracing::debug;

use crate::core::fixed::Fixed;
use crate::core::vec3::FixedVec3;
use crate::presentation::Presentation;
use crate::race::entity::{Entity, EntityId, EntityWorld};
use crate::race::events::RaceEvent;
use crate::race::ownership::ensure_owner;
use crate::race::Rejection;
use crate::session::peer::PeerId;

/// Tracks checkpoints and applies respawns for owned racers.
#[derive(Clone, Debug)]
pub struct CheckpointTracker {
    respawn_height_threshold: Fixed,
}

impl CheckpointTracker {
    /// Create a tracker with the given fall threshold.
    pub fn new(respawn_height_threshold: Fixed) -> Self {
        Self {
            respawn_height_threshold,
        }
    }

    /// The owning peer observed its racer overlapping a checkpoint marker.
    ///
    /// Forward progress is not enforced: a racer that loops back through an
    /// earlier marker banks it again.
    #[allow(clippy::too_many_arguments)]
    pub fn observe_checkpoint(
        &self,
        world: &mut EntityWorld,
        entity_id: EntityId,
        marker: FixedVec3,
        acting_peer: PeerId,
        presentation: &mut dyn Presentation,
        events: &mut Vec<RaceEvent>,
        tick: u64,
    ) -> Result<(), Rejection> {
        let entity = world.get_mut(entity_id).ok_or(Rejection::UnknownEntity)?;
        ensure_owner(entity, acting_peer)?;
        if !entity.alive {
            return Err(Rejection::DuplicateTerminalEvent);
        }

        entity.last_checkpoint = marker;
        presentation.play_checkpoint_effect(entity_id);
        events.push(RaceEvent::checkpoint_reached(tick, entity_id, marker));
        Ok(())
    }

    /// The owning peer's racer touched a lethal surface: respawn it.
    pub fn handle_lethal_surface(
        &self,
        world: &mut EntityWorld,
        entity_id: EntityId,
        acting_peer: PeerId,
        presentation: &mut dyn Presentation,
        events: &mut Vec<RaceEvent>,
        tick: u64,
    ) -> Result<(), Rejection> {
        let entity = world.get_mut(entity_id).ok_or(Rejection::UnknownEntity)?;
        ensure_owner(entity, acting_peer)?;
        if !entity.alive {
            return Err(Rejection::DuplicateTerminalEvent);
        }

        Self::respawn(entity, presentation, events, tick);
        Ok(())
    }

    /// Per-tick fall check for one owned racer. Non-owners never evaluate
    /// this - the caller iterates owned entities only.
    pub fn evaluate_fall(
        &self,
        world: &mut EntityWorld,
        entity_id: EntityId,
        acting_peer: PeerId,
        presentation: &mut dyn Presentation,
        events: &mut Vec<RaceEvent>,
        tick: u64,
    ) -> Result<(), Rejection> {
        let entity = world.get_mut(entity_id).ok_or(Rejection::UnknownEntity)?;
        ensure_owner(entity, acting_peer)?;
        if !entity.alive || entity.position.y >= self.respawn_height_threshold {
            return Ok(());
        }

        debug!(
            "entity {} fell below threshold at {}",
            entity_id, entity.position
        );
        Self::respawn(entity, presentation, events, tick);
        Ok(())
    }

    /// Zero all motion and teleport back to the last checkpoint.
    fn respawn(
        entity: &mut Entity,
        presentation: &mut dyn Presentation,
        events: &mut Vec<RaceEvent>,
        tick: u64,
    ) {
        entity.velocity = FixedVec3::ZERO;
        entity.angular_velocity = FixedVec3::ZERO;
        entity.position = entity.last_checkpoint;
        presentation.play_respawn_effect(entity.id);
        events.push(RaceEvent::entity_respawned(tick, entity.id, entity.position));
    }
}

// =============================================================================
// TESTS
// =============================================================================
