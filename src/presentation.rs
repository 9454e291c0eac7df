//! Collaborator Interfaces
//!
//! The core signals rendering, audio, UI, and scene management through
//! these traits. Implementations live outside the core and contain no
//! coordination logic; they are passed into the runtime explicitly at
//! startup - there is no ambient global lookup.

use crate::race::entity::EntityId;

/// Presentation-side effects: HUD, audio, and the local rank display.
pub trait Presentation {
    /// A racer banked a new checkpoint.
    fn play_checkpoint_effect(&mut self, entity: EntityId);

    /// A racer was returned to its checkpoint.
    fn play_respawn_effect(&mut self, entity: EntityId);

    /// Show a countdown step label.
    fn show_countdown_step(&mut self, label: &str);

    /// Clear the countdown display after the sequence ends.
    fn clear_countdown(&mut self);

    /// Show the classified banner for a finished racer.
    fn show_classified(&mut self, entity: EntityId, rank: u32);

    /// Advance the local rank display by one.
    fn increment_rank(&mut self);

    /// Read the rank currently shown.
    fn current_rank(&self) -> u32;
}

/// Scene management: loading the failure scene, returning to the lobby.
pub trait SceneDirector {
    /// Leave the current scene for the named one.
    fn load_scene(&mut self, scene_name: &str);

    /// The local peer left the session; return to the pre-session screen.
    fn return_to_lobby(&mut self);
}

/// No-op presentation that still tracks the rank counter. Suitable for
/// headless peers and tests.
#[derive(Debug, Default)]
pub struct NullPresentation {
    rank: u32,
}

impl Presentation for NullPresentation {
    fn play_checkpoint_effect(&mut self, _entity: EntityId) {}

    fn play_respawn_effect(&mut self, _entity: EntityId) {}

    fn show_countdown_step(&mut self, _label: &str) {}

    fn clear_countdown(&mut self) {}

    fn show_classified(&mut self, _entity: EntityId, _rank: u32) {}

    fn increment_rank(&mut self) {
        self.rank += 1;
    }

    fn current_rank(&self) -> u32 {
        self.rank
    }
}

/// No-op scene director.
#[derive(Debug, Default)]
pub struct NullSceneDirector;

impl SceneDirector for NullSceneDirector {
    fn load_scene(&mut self, _scene_name: &str) {}

    fn return_to_lobby(&mut self) {}
}

// =============================================================================
// TEST DOUBLES
// =============================================================================
