//! Race Events
//!
//! Events generated during a peer's tick for logging, presentation, and
//! tests. Ordering is deterministic: tick, then priority, then entity id.

use serde::{Deserialize, Serialize};

use crate::core::vec3::FixedVec3;
use crate::race::entity::EntityId;
use crate::session::state::SessionState;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Deaths processed first
    Death = 0,
    /// Then finish-line classifications
    Finish = 1,
    /// Then respawns
    Respawn = 2,
    /// Then checkpoint updates
    Checkpoint = 3,
    /// Session phase changes
    Phase = 4,
    /// Lowest priority
    Other = 255,
}

/// Race event data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RaceEventData {
    /// A racer touched a checkpoint marker.
    CheckpointReached {
        /// Racer involved.
        entity: EntityId,
        /// Marker position, now the racer's respawn point.
        position: FixedVec3,
    },

    /// A racer was returned to its last checkpoint.
    EntityRespawned {
        /// Racer involved.
        entity: EntityId,
        /// Where it reappeared.
        at: FixedVec3,
    },

    /// A racer crossed the finish line.
    EntityFinished {
        /// Racer involved.
        entity: EntityId,
        /// This peer's local rank projection at the moment of observation.
        local_rank: u32,
    },

    /// A racer died in a hazard.
    EntityDied {
        /// Racer involved.
        entity: EntityId,
    },

    /// The session changed phase.
    PhaseChanged {
        /// Previous phase.
        from: SessionState,
        /// New phase.
        to: SessionState,
    },
}

/// A race event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RaceEvent {
    /// Tick when the event occurred (local peer clock).
    pub tick: u64,

    /// Processing priority.
    pub priority: EventPriority,

    /// Entity involved (for tie-breaking).
    pub entity: Option<EntityId>,

    /// Event data.
    pub data: RaceEventData,
}

impl RaceEvent {
    /// Create a new event.
    pub fn new(tick: u64, priority: EventPriority, data: RaceEventData) -> Self {
        let entity = match &data {
            RaceEventData::CheckpointReached { entity, .. } => Some(*entity),
            RaceEventData::EntityRespawned { entity, .. } => Some(*entity),
            RaceEventData::EntityFinished { entity, .. } => Some(*entity),
            RaceEventData::EntityDied { entity } => Some(*entity),
            RaceEventData::PhaseChanged { .. } => None,
        };

        Self {
            tick,
            priority,
            entity,
            data,
        }
    }

    /// Create a checkpoint-reached event.
    pub fn checkpoint_reached(tick: u64, entity: EntityId, position: FixedVec3) -> Self {
        Self::new(
            tick,
            EventPriority::Checkpoint,
            RaceEventData::CheckpointReached { entity, position },
        )
    }

    /// Create a respawn event.
    pub fn entity_respawned(tick: u64, entity: EntityId, at: FixedVec3) -> Self {
        Self::new(
            tick,
            EventPriority::Respawn,
            RaceEventData::EntityRespawned { entity, at },
        )
    }

    /// Create a finish event.
    pub fn entity_finished(tick: u64, entity: EntityId, local_rank: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Finish,
            RaceEventData::EntityFinished { entity, local_rank },
        )
    }

    /// Create a death event.
    pub fn entity_died(tick: u64, entity: EntityId) -> Self {
        Self::new(tick, EventPriority::Death, RaceEventData::EntityDied { entity })
    }

    /// Create a phase-change event.
    pub fn phase_changed(tick: u64, from: SessionState, to: SessionState) -> Self {
        Self::new(
            tick,
            EventPriority::Phase,
            RaceEventData::PhaseChanged { from, to },
        )
    }
}

impl PartialEq for RaceEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.entity == other.entity
    }
}

impl Eq for RaceEvent {}

impl PartialOrd for RaceEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RaceEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then entity id
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.entity.cmp(&other.entity))
    }
}
