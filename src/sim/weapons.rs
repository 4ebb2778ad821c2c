//! Player weapons: auto-fire at the nearest active entity

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::combat::{Faction, Projectile};
use super::state::{GameState, SimContext};
use crate::consts::PLAYER_HEIGHT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Fast straight shot
    Bolt,
    /// Homing missile
    Seeker,
    /// Returning blade
    Glaive,
    /// Lobbed shell that explodes
    Mortar,
}

impl WeaponKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponKind::Bolt => "bolt",
            WeaponKind::Seeker => "seeker",
            WeaponKind::Glaive => "glaive",
            WeaponKind::Mortar => "mortar",
        }
    }
}

/// An equipped weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSlot {
    pub kind: WeaponKind,
    /// Seconds until the next shot
    pub cooldown: f32,
    pub level: u32,
}

impl WeaponSlot {
    pub fn new(kind: WeaponKind) -> Self {
        Self {
            kind,
            cooldown: 0.0,
            level: 1,
        }
    }
}

/// Damage bonus per weapon level above 1
const LEVEL_DAMAGE_STEP: f32 = 0.25;

/// Tick weapon cooldowns and fire at the nearest active entity in range
pub fn fire_weapons(state: &mut GameState, ctx: &SimContext, dt: f32) {
    let combat = &ctx.data.tunables.combat;
    let muzzle = state.player.position + Vec3::Y * (PLAYER_HEIGHT * 0.55);
    let stats = state.player.stats;

    let target = state
        .entities
        .iter()
        .filter(|e| e.is_active())
        .map(|e| (e.position + Vec3::Y * e.size, e.position.distance_squared(muzzle)))
        .filter(|&(_, d2)| d2 <= combat.weapon_range * combat.weapon_range)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(aim, _)| aim);

    for slot in state.player.weapons.iter_mut() {
        slot.cooldown = (slot.cooldown - dt).max(0.0);
        let Some(aim) = target else {
            continue;
        };
        if slot.cooldown > 0.0 {
            continue;
        }

        let def = ctx.data.weapons.get(slot.kind);
        slot.cooldown = def.cooldown * stats.cooldown_mult.max(0.1);
        let dir = (aim - muzzle).normalize_or(Vec3::X);
        let damage = def.damage * (1.0 + LEVEL_DAMAGE_STEP * (slot.level - 1) as f32) * stats.damage;
        state.projectiles.push(Projectile {
            position: muzzle,
            velocity: dir * def.speed,
            damage,
            ttl: def.ttl,
            age: 0.0,
            behavior: def.behavior,
            faction: Faction::Player,
            radius: def.radius,
            area_radius: def.area_radius,
            pierce: stats.pierce,
            hit_set: Vec::new(),
            returning: false,
        });
    }
}
