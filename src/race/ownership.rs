//! Ownership Gate
//!
//! Every state-mutating handler in the race trackers checks authorship
//! here before touching an entity. Peers freely *read* entities they do
//! not own (to feed local presentation), but only the owning peer writes
//! position, velocity, terminal flags, or checkpoints - that is what keeps
//! the world single-writer without any runtime locking.

use tracing::debug;

use crate::race::entity::Entity;
use crate::race::Rejection;
use crate::session::peer::PeerId;

/// True iff the acting peer is the entity's owner.
#[inline]
pub fn authorized(entity: &Entity, acting_peer: PeerId) -> bool {
    entity.owner == acting_peer
}

/// Gate a mutation on ownership.
///
/// A failed check is a programming-contract violation by the caller, not a
/// runtime fault: it is logged at debug level and the mutation is silently
/// skipped.
pub fn ensure_owner(entity: &Entity, acting_peer: PeerId) -> Result<(), Rejection> {
    if authorized(entity, acting_peer) {
        Ok(())
    } else {
        debug!(
            "ownership violation: peer {} attempted to mutate entity {} owned by {}",
            acting_peer, entity.id, entity.owner
        );
        Err(Rejection::OwnershipViolation)
    }
}

// =============================================================================
// TESTS
// =============================================================================
