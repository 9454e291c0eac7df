//! Finish-Line Classification
//!
//! Runs on every peer that locally observes a racer inside the finish
//! trigger - transforms are replicated, so each peer sees the crossing for
//! itself and projects its own rank order. The projection is deliberately
//! local: peers that observe two finishes in a different relative order
//! will disagree on ranks, and nothing reconciles them.
//!
//! Idempotence is per peer: a seen-set guards against both redelivered
//! events and the many overlap frames a trigger volume produces. The
//! racer's terminal flag itself is only written through the ownership
//! gate on the owning peer.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::presentation::Presentation;
use crate::race::entity::{EntityId, EntityKind, EntityWorld};
use crate::race::events::RaceEvent;
use crate::race::ownership::authorized;
use crate::race::Rejection;
use crate::session::peer::PeerId;

/// One-shot finish detection and the local rank projection.
#[derive(Clone, Debug, Default)]
pub struct ClassificationTracker {
    rank: u32,
    seen: BTreeSet<EntityId>,
}

impl ClassificationTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// This peer observed a racer overlapping the finish trigger.
    ///
    /// Counts the finish exactly once per entity no matter how many
    /// overlap frames or duplicate deliveries arrive. If this peer owns
    /// the racer, the terminal flag is set and its physics frozen; other
    /// peers only update their local projection.
    pub fn on_finish_overlap(
        &mut self,
        world: &mut EntityWorld,
        entity_id: EntityId,
        acting_peer: PeerId,
        presentation: &mut dyn Presentation,
        events: &mut Vec<RaceEvent>,
        tick: u64,
    ) -> Result<(), Rejection> {
        let entity = world.get(entity_id).ok_or(Rejection::UnknownEntity)?;

        if self.seen.contains(&entity_id) || entity.has_finished || !entity.alive {
            debug!("finish overlap for {} ignored: already classified", entity_id);
            return Err(Rejection::DuplicateTerminalEvent);
        }

        self.seen.insert(entity_id);
        self.rank += 1;
        presentation.increment_rank();

        let is_owner = authorized(entity, acting_peer);
        let kind = entity.kind;
        if is_owner {
            let entity = world.get_mut(entity_id).ok_or(Rejection::UnknownEntity)?;
            entity.mark_finished();
            entity.freeze();
            if kind == EntityKind::Player {
                presentation.show_classified(entity_id, self.rank);
            }
        }

        info!("entity {} classified at local rank {}", entity_id, self.rank);
        events.push(RaceEvent::entity_finished(tick, entity_id, self.rank));
        Ok(())
    }

    /// This peer's local rank projection.
    pub fn current_rank(&self) -> u32 {
        self.rank
    }

    /// Entities this peer has counted.
    pub fn classified_count(&self) -> usize {
        self.seen.len()
    }

    /// Drop all projection state. Used on session teardown.
    pub fn clear(&mut self) {
        self.rank = 0;
        self.seen.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
