//! Gameplay simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering,
//! audio and platform dependencies:
//! - Fixed timestep, fixed phase order
//! - Seeded RNG only
//! - Entities addressed by integer id, never by reference

pub mod ai;
pub mod boss;
pub mod collision;
pub mod combat;
pub mod controller;
pub mod director;
pub mod entity;
pub mod events;
pub mod obstacles;
pub mod snapshot;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod tier;
pub mod weapons;
pub mod worldgen;

pub use boss::BossArena;
pub use collision::CollisionResult;
pub use combat::{DamageOutcome, Faction, Pickup, PickupKind, Projectile, ProjectileBehavior, damage_entity, damage_player, final_damage};
pub use controller::{Player, PlayerStats, Upgrade};
pub use director::{EntityDirector, SpawnRequest, scaled_enemy_hp};
pub use entity::{AttackPattern, BossArchetype, BossPhase, Entity, EntityId, EntityKind, EntityTag, GruntKind};
pub use events::SimEvent;
pub use obstacles::{Obstacle, ObstacleField, ObstacleShape};
pub use snapshot::{PlayerSnapshot, RemotePlayers, RenderView, render_view};
pub use state::{GamePhase, GameState, SimContext};
pub use terrain::{Ramp, TerrainModel, TerrainPiece};
pub use tick::{TickInput, tick};
pub use tier::{BossLandmark, SimClock, TierMode, TierState};
pub use weapons::{WeaponKind, WeaponSlot};
pub use worldgen::{WorldLayout, generate_world};
