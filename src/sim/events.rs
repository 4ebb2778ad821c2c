//! Semantic events raised by the tick
//!
//! Audio, UI and persistence react to these; the core never plays sounds or
//! draws text itself. Events accumulate in `GameState::events` and the host
//! drains them after each tick.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::{BossArchetype, BossPhase, EntityId, EntityTag};

/// Why a hit was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Boss shield is up
    Shielded,
}

/// Why an entity left the world without being killed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DespawnReason {
    /// Fell below the world floor
    OutOfBounds,
    /// Evicted by the live-entity cap
    Capped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    EntitySpawned {
        id: EntityId,
        tag: EntityTag,
        position: Vec3,
    },
    EntityKilled {
        id: EntityId,
        tag: EntityTag,
        position: Vec3,
    },
    EntityDespawned {
        id: EntityId,
        reason: DespawnReason,
    },
    LootDropped {
        position: Vec3,
        xp_orbs: u32,
        currency: u32,
    },
    DamageRejected {
        id: EntityId,
        reason: RejectReason,
    },
    BossPhaseChanged {
        id: EntityId,
        archetype: BossArchetype,
        phase: BossPhase,
    },
    BossDefeated {
        id: EntityId,
        archetype: BossArchetype,
    },
    ArenaActivated {
        owner: EntityId,
    },
    ArenaDeactivated,
    PlayerDamaged {
        amount: f32,
        health: f32,
    },
    PlayerLeveledUp {
        level: u32,
    },
    PlayerDied,
    /// Player fell out of the world and was returned to safe ground
    PlayerRecovered {
        position: Vec3,
    },
    PickupCollected {
        xp: u32,
        currency: u32,
    },
    HazardEntered,
    HazardExited,
    OvertimeStarted {
        tier: u32,
    },
    TierCompleted {
        completed: u32,
        next: u32,
    },
}

impl SimEvent {
    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            SimEvent::EntitySpawned { .. } => "EntitySpawned",
            SimEvent::EntityKilled { .. } => "EntityKilled",
            SimEvent::EntityDespawned { .. } => "EntityDespawned",
            SimEvent::LootDropped { .. } => "LootDropped",
            SimEvent::DamageRejected { .. } => "DamageRejected",
            SimEvent::BossPhaseChanged { .. } => "BossPhaseChanged",
            SimEvent::BossDefeated { .. } => "BossDefeated",
            SimEvent::ArenaActivated { .. } => "ArenaActivated",
            SimEvent::ArenaDeactivated => "ArenaDeactivated",
            SimEvent::PlayerDamaged { .. } => "PlayerDamaged",
            SimEvent::PlayerLeveledUp { .. } => "PlayerLeveledUp",
            SimEvent::PlayerDied => "PlayerDied",
            SimEvent::PlayerRecovered { .. } => "PlayerRecovered",
            SimEvent::PickupCollected { .. } => "PickupCollected",
            SimEvent::HazardEntered => "HazardEntered",
            SimEvent::HazardExited => "HazardExited",
            SimEvent::OvertimeStarted { .. } => "OvertimeStarted",
            SimEvent::TierCompleted { .. } => "TierCompleted",
        }
    }
}
