//! Contact Reports from the Physics Collaborator
//!
//! The physics layer reports trigger overlaps and surface collisions with
//! tag strings attached to the scene geometry. Tags are opaque
//! discriminators at this boundary; they are parsed once into a typed kind
//! and unknown tags are dropped.

use serde::{Deserialize, Serialize};

use crate::core::vec3::FixedVec3;
use crate::race::entity::EntityId;

/// Scene tag carried by racer bodies.
pub const TAG_PLAYER: &str = "Player";

/// Scene tag carried by simulated racer bodies.
pub const TAG_AI: &str = "IA";

/// Scene tag on checkpoint trigger volumes.
pub const TAG_CHECKPOINT: &str = "Checkpoint";

/// Scene tag on surfaces that force an immediate respawn.
pub const TAG_LETHAL_SURFACE: &str = "Lethal";

/// Scene tag on hazard volumes that eliminate a racer.
pub const TAG_DEATH_ZONE: &str = "DeathZone";

/// Scene tag on the finish-line trigger volume.
pub const TAG_FINISH_LINE: &str = "FinishLine";

/// What an entity came into contact with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    /// Checkpoint trigger: record a new safe position.
    Checkpoint,
    /// Lethal surface: respawn at the last checkpoint.
    LethalSurface,
    /// Hazard volume: the racer is eliminated.
    DeathZone,
    /// Finish-line trigger: the racer is classified.
    FinishLine,
}

impl ContactKind {
    /// Parse a scene tag. Unknown tags yield `None` and the contact is
    /// ignored.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TAG_CHECKPOINT => Some(ContactKind::Checkpoint),
            TAG_LETHAL_SURFACE => Some(ContactKind::LethalSurface),
            TAG_DEATH_ZONE => Some(ContactKind::DeathZone),
            TAG_FINISH_LINE => Some(ContactKind::FinishLine),
            _ => None,
        }
    }
}

/// One overlap or collision observed this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReport {
    /// The entity involved.
    pub entity: EntityId,
    /// What it touched.
    pub kind: ContactKind,
    /// Position of the touched marker (checkpoints) or of the contact.
    pub position: FixedVec3,
}

impl ContactReport {
    /// Build a report from a raw scene tag. Returns `None` for tags the
    /// core does not react to.
    pub fn from_tag(entity: EntityId, tag: &str, position: FixedVec3) -> Option<Self> {
        ContactKind::from_tag(tag).map(|kind| Self {
            entity,
            kind,
            position,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
