//! Enemy entities
//!
//! One tagged variant per archetype with a shared base. Bosses carry their
//! state machine payload inside the variant so dispatch is a `match` on the
//! variant.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Stable entity handle (monotonic, never reused within a run)
pub type EntityId = u32;

/// Ordinary wave enemies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GruntKind {
    /// Slow, weak, comes in numbers
    Crawler,
    /// Fast and fragile
    Charger,
    /// Slow, tanky, hits hard
    Brute,
}

/// Boss archetypes; each has its own attack cycle and cooldowns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossArchetype {
    /// Main boss: volleys and slams, shields behind a guard
    Warden,
    /// Main boss: barrages and bursts, teleports aggressively
    Tempest,
    /// Miniboss: slow slammer
    Colossus,
    /// Shield guard summoned by a shielded boss
    Sentinel,
    /// Overtime stacking boss
    Juggernaut,
}

/// Attack patterns shared by every boss archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackPattern {
    /// Fan of straight projectiles aimed at the player
    Volley,
    /// Instant ring of damage around the boss
    Burst,
    /// Rapid stream of aimed shots
    Barrage,
    /// Telegraphed area hit at the player's position
    Slam,
}

/// Boss state machine states
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BossPhase {
    Idle,
    Attack(AttackPattern),
    Teleporting,
    Shielded,
    Defeated,
}

/// Non-boss AI states (bosses also pass through `Spawning`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiState {
    #[default]
    Spawning,
    Chasing,
    Attacking,
}

/// Boss-only state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossBrain {
    pub archetype: BossArchetype,
    pub phase: BossPhase,
    /// Time left in the current timed phase (attack wind-up, teleport)
    pub phase_timer: f32,
    /// Time until the next attack pattern starts
    pub pattern_cooldown: f32,
    /// Position in the archetype's pattern cycle
    pub pattern_index: usize,
    pub teleport_cooldown: f32,
    pub shield_active: bool,
    /// Time until the next shield cycle
    pub shield_timer: f32,
    /// Linked guard that must die before the shield drops
    pub guard: Option<EntityId>,
    pub guard_requested: bool,
    /// Slam target recorded when the telegraph starts
    pub slam_target: Option<glam::Vec2>,
    pub barrage_left: u32,
    pub barrage_timer: f32,
    /// Has finished rising and entered combat
    pub engaged: bool,
}

impl BossBrain {
    pub fn new(archetype: BossArchetype, first_pattern_delay: f32, shield_interval: f32) -> Self {
        Self {
            archetype,
            phase: BossPhase::Idle,
            phase_timer: 0.0,
            pattern_cooldown: first_pattern_delay,
            pattern_index: 0,
            teleport_cooldown: 0.0,
            shield_active: false,
            shield_timer: shield_interval,
            guard: None,
            guard_requested: false,
            slam_target: None,
            barrage_left: 0,
            barrage_timer: 0.0,
            engaged: false,
        }
    }
}

/// Entity archetype payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    Grunt(GruntKind),
    FlyingHazard,
    Miniboss(BossBrain),
    MainBoss(BossBrain),
}

/// Copyable archetype tag for events and snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityTag {
    Grunt(GruntKind),
    FlyingHazard,
    Miniboss(BossArchetype),
    MainBoss(BossArchetype),
}

/// Scaled stats an entity is created with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityStats {
    pub hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub size: f32,
    pub armor: f32,
    pub xp_value: u32,
}

/// A live enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub hp: f32,
    pub max_hp: f32,
    /// Collision radius
    pub size: f32,
    /// Contact/melee damage per hit
    pub damage: f32,
    pub speed: f32,
    pub armor: f32,
    pub attack_cooldown: f32,
    pub ai_state: AiState,
    /// 0 = just spawned, 1 = fully risen and combat-eligible
    pub spawn_progress: f32,
    /// Per-entity wander oscillator offset
    pub wander_phase: f32,
    /// Time spent beyond the stuck distance from the player
    pub stuck_timer: f32,
    pub xp_value: u32,
    /// Ground height the entity is rising out of
    #[serde(default)]
    pub ground_y: f32,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, position: Vec3, stats: EntityStats) -> Self {
        // Golden-ratio spread keeps neighbours out of phase
        let wander_phase = (id as f32 * 0.618_034).fract() * std::f32::consts::TAU;
        Self {
            id,
            kind,
            position,
            velocity: Vec3::ZERO,
            hp: stats.hp,
            max_hp: stats.hp,
            size: stats.size,
            damage: stats.damage,
            speed: stats.speed,
            armor: stats.armor,
            attack_cooldown: 0.0,
            ai_state: AiState::Spawning,
            spawn_progress: 0.0,
            wander_phase,
            stuck_timer: 0.0,
            xp_value: stats.xp_value,
            ground_y: position.y,
        }
    }

    /// Finished spawning: may move, deal and receive damage
    #[inline]
    pub fn is_active(&self) -> bool {
        self.spawn_progress >= 1.0
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn is_boss(&self) -> bool {
        matches!(self.kind, EntityKind::Miniboss(_) | EntityKind::MainBoss(_))
    }

    pub fn is_main_boss(&self) -> bool {
        matches!(self.kind, EntityKind::MainBoss(_))
    }

    pub fn is_flying(&self) -> bool {
        matches!(self.kind, EntityKind::FlyingHazard)
    }

    pub fn boss(&self) -> Option<&BossBrain> {
        match &self.kind {
            EntityKind::Miniboss(b) | EntityKind::MainBoss(b) => Some(b),
            _ => None,
        }
    }

    pub fn boss_mut(&mut self) -> Option<&mut BossBrain> {
        match &mut self.kind {
            EntityKind::Miniboss(b) | EntityKind::MainBoss(b) => Some(b),
            _ => None,
        }
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn tag(&self) -> EntityTag {
        match &self.kind {
            EntityKind::Grunt(k) => EntityTag::Grunt(*k),
            EntityKind::FlyingHazard => EntityTag::FlyingHazard,
            EntityKind::Miniboss(b) => EntityTag::Miniboss(b.archetype),
            EntityKind::MainBoss(b) => EntityTag::MainBoss(b.archetype),
        }
    }
}
