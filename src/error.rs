//! Error kinds raised by the simulation core
//!
//! None of these ever reach the player as a crash: every caller has a local
//! recovery (fallback world, rejected request, despawn/teleport).

use crate::sim::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// World generation output was malformed or empty
    #[error("invalid world layout: {0}")]
    Configuration(String),

    /// A second main boss while one is active
    #[error("main boss {active} already active")]
    DuplicateMainBoss { active: EntityId },

    /// Arena activation with no arena assigned, or while another is active
    #[error("boss arena conflict: {0}")]
    ArenaConflict(&'static str),

    /// Position fell below the world floor
    #[error("position y={y:.2} is below the world floor")]
    OutOfBounds { y: f32 },

    /// Progression store failure
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl SimError {
    /// Conflicts are rejected locally and the simulation carries on
    pub fn is_state_conflict(&self) -> bool {
        matches!(self, SimError::DuplicateMainBoss { .. } | SimError::ArenaConflict(_))
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Persistence(e.to_string())
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Persistence(e.to_string())
    }
}
