//! Entities and the Per-Peer World
//!
//! Every peer holds a replica of every entity on the track; the peer named
//! as owner is the only one allowed to mutate an entity's shared truth
//! (position, velocity, terminal flags). Ownership never moves for the
//! lifetime of an entity. Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::hash::StateHasher;
use crate::core::vec3::FixedVec3;
use crate::session::peer::PeerId;

/// Unique entity identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EntityId(pub [u8; 16]);

impl EntityId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..4]))
    }
}

/// What kind of racer an entity is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Human-controlled racer.
    Player,
    /// Simulated racer.
    Ai,
}

/// State of a single racer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    /// Unique entity id.
    pub id: EntityId,

    /// Peer that exclusively authors this entity's state. Immutable for
    /// the entity's lifetime.
    pub owner: PeerId,

    /// Racer kind.
    pub kind: EntityKind,

    /// Current position (replicated transform).
    pub position: FixedVec3,

    /// Current linear velocity.
    pub velocity: FixedVec3,

    /// Current angular velocity.
    pub angular_velocity: FixedVec3,

    /// Is the racer still alive? Terminal: once false, never true again.
    pub alive: bool,

    /// Has the racer crossed the finish line? Terminal: once true, never
    /// false again.
    pub has_finished: bool,

    /// Locomotion and pathing enabled. Cleared when the racer finishes.
    pub locomotion_enabled: bool,

    /// Last safe position to respawn at.
    pub last_checkpoint: FixedVec3,
}

impl Entity {
    /// Create a new racer at its spawn position. The spawn doubles as the
    /// first checkpoint.
    pub fn new(id: EntityId, owner: PeerId, kind: EntityKind, spawn: FixedVec3) -> Self {
        Self {
            id,
            owner,
            kind,
            position: spawn,
            velocity: FixedVec3::ZERO,
            angular_velocity: FixedVec3::ZERO,
            alive: true,
            has_finished: false,
            locomotion_enabled: true,
            last_checkpoint: spawn,
        }
    }

    /// Set the terminal finished flag. Idempotent; never cleared.
    pub fn mark_finished(&mut self) {
        self.has_finished = true;
    }

    /// Set the terminal dead flag. Idempotent; never cleared.
    pub fn mark_dead(&mut self) {
        self.alive = false;
    }

    /// Zero all motion and disable locomotion.
    pub fn freeze(&mut self) {
        self.velocity = FixedVec3::ZERO;
        self.angular_velocity = FixedVec3::ZERO;
        self.locomotion_enabled = false;
    }

    /// Hash this racer's replicated state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_uuid(&self.id.0);
        hasher.update_uuid(&self.owner.0);
        hasher.update_u8(matches!(self.kind, EntityKind::Ai) as u8);
        hasher.update_vec3(self.position);
        hasher.update_vec3(self.velocity);
        hasher.update_bool(self.alive);
        hasher.update_bool(self.has_finished);
        hasher.update_vec3(self.last_checkpoint);
    }
}

/// All entities known to one peer.
///
/// Populated identically on every peer at session setup (explicit
/// registration, never runtime object-graph search) and kept in step by
/// despawn broadcasts.
#[derive(Clone, Debug, Default)]
pub struct EntityWorld {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity. Replaces any previous entry with the same id.
    pub fn register(&mut self, entity: Entity) {
        self.entities.insert(entity.id, entity);
    }

    /// Get an entity by id.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get an entity mutably by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Remove an entity. Returns false if it was already gone, which is
    /// normal under at-least-once despawn delivery.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        self.entities.remove(&id).is_some()
    }

    /// Iterate all entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Ids of entities owned by the given peer, in id order.
    pub fn owned_by(&self, peer: PeerId) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.owner == peer)
            .map(|e| e.id)
            .collect()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Is the world empty?
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drop all entities. Used on session teardown.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Hash every entity in id order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        for entity in self.entities.values() {
            entity.hash_into(hasher);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
