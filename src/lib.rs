//! Emberfall - simulation core for a tiered top-down action-survival game
//!
//! Core modules:
//! - `sim`: Gameplay simulation (terrain, movement, AI, bosses, combat, tiers)
//! - `tuning`: Data-driven game balance (character/enemy/boss/weapon tables)
//! - `settings`: Player-facing options and game mode
//! - `persistence`: Progression load/save collaborator
//! - `session`: Host loop around the fixed-timestep tick

pub mod error;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use session::Session;
pub use settings::{GameMode, Settings};
pub use tuning::GameData;

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 6;
    /// Largest real-time delta a single frame may feed the simulation
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Height reported where no platform or ramp exists (the lava sea)
    pub const DEFAULT_GROUND_HEIGHT: f32 = 0.0;
    /// Falling below this in the void bounces the player back up
    pub const HAZARD_FLOOR_Y: f32 = DEFAULT_GROUND_HEIGHT;
    /// Anything below this has left the world
    pub const WORLD_FLOOR_Y: f32 = -40.0;

    /// Player collision footprint
    pub const PLAYER_RADIUS: f32 = 0.5;
    pub const PLAYER_HEIGHT: f32 = 1.8;

    /// Step tolerance for player ground queries
    pub const PLAYER_STEP_TOLERANCE: f32 = 1.2;
    /// Step tolerance for entity ground queries (entities climb more freely)
    pub const ENTITY_STEP_TOLERANCE: f32 = 2.5;
}

/// Project a world position onto the horizontal (XZ) plane
#[inline]
pub fn flat(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Horizontal distance between two world positions (Y ignored)
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    flat(a).distance(flat(b))
}

/// Lift a horizontal point back into the world at height `y`
#[inline]
pub fn at_height(p: Vec2, y: f32) -> Vec3 {
    Vec3::new(p.x, y, p.y)
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Rotate a local XZ offset into world space by `yaw` (radians about +Y)
#[inline]
pub fn rotate_yaw(local: Vec2, yaw: f32) -> Vec2 {
    let (s, c) = yaw.sin_cos();
    Vec2::new(local.x * c + local.y * s, -local.x * s + local.y * c)
}

/// Inverse of [`rotate_yaw`]: bring a world XZ offset into the local frame
#[inline]
pub fn unrotate_yaw(world: Vec2, yaw: f32) -> Vec2 {
    let (s, c) = yaw.sin_cos();
    Vec2::new(world.x * c - world.y * s, world.x * s + world.y * c)
}
