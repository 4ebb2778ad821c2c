//! Combat resolution
//!
//! Damage math, projectile lifecycle, death handling and loot. Every hit on
//! an entity funnels through `damage_entity` so removal, kill events and
//! loot happen exactly once per death.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::boss::release_arena;
use super::entity::{BossPhase, Entity, EntityId, EntityKind};
use super::events::{RejectReason, SimEvent};
use super::state::{GameState, SimContext};
use crate::consts::{PLAYER_HEIGHT, PLAYER_RADIUS};
use crate::{flat, horizontal_distance};

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

/// Flight behaviour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileBehavior {
    Straight,
    /// Steers toward the nearest enemy
    Homing,
    /// Flies out, then returns to the player after `return_after` seconds
    Boomerang { return_after: f32 },
    /// Explodes on first contact or on expiry
    AreaOnImpact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub position: Vec3,
    pub velocity: Vec3,
    pub damage: f32,
    /// Seconds left
    pub ttl: f32,
    pub age: f32,
    pub behavior: ProjectileBehavior,
    pub faction: Faction,
    pub radius: f32,
    pub area_radius: f32,
    /// Extra distinct targets allowed
    pub pierce: u32,
    /// Entities already damaged
    pub hit_set: Vec<EntityId>,
    /// Boomerang on its way back
    pub returning: bool,
}

impl Projectile {
    /// Enemy shot travelling along `dir`
    pub fn enemy(position: Vec3, dir: Vec3, speed: f32, damage: f32, ttl: f32, radius: f32) -> Self {
        Self {
            position,
            velocity: dir.normalize_or_zero() * speed,
            damage,
            ttl,
            age: 0.0,
            behavior: ProjectileBehavior::Straight,
            faction: Faction::Enemy,
            radius,
            area_radius: 0.0,
            pierce: 0,
            hit_set: Vec::new(),
            returning: false,
        }
    }

    pub fn is_boomerang(&self) -> bool {
        matches!(self.behavior, ProjectileBehavior::Boomerang { .. })
    }

    /// Pierce allowance used up
    fn exhausted(&self) -> bool {
        !self.is_boomerang() && self.hit_set.len() > self.pierce as usize
    }
}

/// Damage queued for the player during the AI phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingHit {
    pub source: EntityId,
    pub amount: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupKind {
    Experience(u32),
    Currency(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub position: Vec3,
    pub ttl: f32,
}

/// Result of `damage_entity`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    Applied { dealt: f32, killed: bool },
    /// Refused and signalled (boss shield)
    Rejected(RejectReason),
    /// Unknown, still spawning, or already dead
    Ignored,
}

/// Final damage after crit, difficulty scaling and capped mitigation.
/// Never negative.
pub fn final_damage(raw: f32, crit: bool, crit_multiplier: f32, scalar: f32, armor: f32, cap: f32) -> f32 {
    let crit = if crit { crit_multiplier } else { 1.0 };
    let mitigation = armor.max(0.0).min(cap);
    (raw * crit * scalar * (1.0 - mitigation)).max(0.0)
}

/// Area falloff: full at the centre, never below `min_falloff` inside the radius
pub fn area_falloff(distance: f32, radius: f32, min_falloff: f32) -> f32 {
    if radius <= 0.0 {
        return 1.0;
    }
    (1.0 - distance / radius).max(min_falloff)
}

/// Deal player damage to an entity
pub fn damage_entity(state: &mut GameState, ctx: &SimContext, id: EntityId, raw: f32) -> DamageOutcome {
    let Some(idx) = state.entities.iter().position(|e| e.id == id) else {
        return DamageOutcome::Ignored;
    };
    let target = &state.entities[idx];
    if !target.is_active() || !target.is_alive() {
        return DamageOutcome::Ignored;
    }
    if target.boss().is_some_and(|b| b.shield_active) {
        state.events.push(SimEvent::DamageRejected {
            id,
            reason: RejectReason::Shielded,
        });
        return DamageOutcome::Rejected(RejectReason::Shielded);
    }

    let combat = &ctx.data.tunables.combat;
    let crit = state.rng.random::<f32>() < state.player.stats.crit_chance;
    let dealt = final_damage(
        raw,
        crit,
        combat.crit_multiplier,
        ctx.settings.damage_dealt_scalar,
        target.armor,
        combat.mitigation_cap,
    );

    let target = &mut state.entities[idx];
    target.hp -= dealt;
    let killed = !target.is_alive();
    if killed {
        let entity = state.entities.remove(idx);
        on_entity_killed(state, ctx, entity);
    }
    DamageOutcome::Applied { dealt, killed }
}

/// Deal damage to the player; returns the amount applied
pub fn damage_player(state: &mut GameState, ctx: &SimContext, raw: f32) -> f32 {
    let player = &mut state.player;
    if !player.is_alive() {
        return 0.0;
    }
    let dealt = final_damage(
        raw,
        false,
        1.0,
        ctx.settings.damage_taken_scalar,
        player.stats.armor,
        ctx.data.tunables.combat.mitigation_cap,
    );
    player.health -= dealt;
    state.events.push(SimEvent::PlayerDamaged {
        amount: dealt,
        health: player.health,
    });
    dealt
}

/// Death handling for an entity already removed from the arena
fn on_entity_killed(state: &mut GameState, ctx: &SimContext, mut entity: Entity) {
    let combat = &ctx.data.tunables.combat;
    state.events.push(SimEvent::EntityKilled {
        id: entity.id,
        tag: entity.tag(),
        position: entity.position,
    });
    let vampirism = state.player.stats.vampirism;
    state.player.heal(vampirism);

    let id = entity.id;
    match &mut entity.kind {
        EntityKind::MainBoss(brain) => {
            brain.phase = BossPhase::Defeated;
            let archetype = brain.archetype;
            if release_arena(&mut state.arena, id) {
                state.events.push(SimEvent::ArenaDeactivated);
            }
            state.events.push(SimEvent::BossPhaseChanged {
                id,
                archetype,
                phase: BossPhase::Defeated,
            });
            state.events.push(SimEvent::BossDefeated { id, archetype });
            state.tier.boss_defeated = true;
            state.landmark.consumed = true;
            log::info!("main boss {archetype:?} defeated on tier {}", state.tier.tier);

            // The world is about to be torn down, so rewards skip the pickup stage
            let scale = combat.boss_loot_multiplier * ctx.settings.loot_multiplier;
            let xp = (entity.xp_value as f32 * scale).round() as u32;
            let currency = (combat.currency_per_kill as f32 * scale).round() as u32;
            state.player.currency = state.player.currency.saturating_add(currency);
            grant_xp(state, ctx, xp);
        }
        EntityKind::Miniboss(brain) => {
            brain.phase = BossPhase::Defeated;
            state.events.push(SimEvent::BossPhaseChanged {
                id,
                archetype: brain.archetype,
                phase: BossPhase::Defeated,
            });
            drop_loot(state, ctx, entity.position, entity.xp_value, combat.boss_loot_multiplier);
        }
        EntityKind::Grunt(_) | EntityKind::FlyingHazard => {
            drop_loot(state, ctx, entity.position, entity.xp_value, 1.0);
        }
    }
}

fn drop_loot(state: &mut GameState, ctx: &SimContext, position: Vec3, xp_value: u32, multiplier: f32) {
    let combat = &ctx.data.tunables.combat;
    let scale = (1.0 + state.player.level as f32 * combat.loot_level_scale)
        * ctx.settings.loot_multiplier
        * multiplier;
    let orbs = ((combat.loot_orbs as f32 * scale).ceil() as u32).max(1);
    let currency = (combat.currency_per_kill as f32 * scale).ceil() as u32;

    for i in 0..orbs {
        // Small spiral so orbs don't stack exactly
        let angle = i as f32 * 2.4;
        let offset = Vec3::new(angle.cos(), 0.0, angle.sin()) * (0.3 * i as f32).min(1.5);
        let id = state.next_entity_id();
        state.pickups.push(Pickup {
            id,
            kind: PickupKind::Experience(xp_value),
            position: position + offset,
            ttl: combat.pickup_ttl,
        });
    }
    if currency > 0 {
        let id = state.next_entity_id();
        state.pickups.push(Pickup {
            id,
            kind: PickupKind::Currency(currency),
            position,
            ttl: combat.pickup_ttl,
        });
    }
    state.events.push(SimEvent::LootDropped {
        position,
        xp_orbs: orbs,
        currency,
    });
}

/// Add XP and raise a level-up event per level gained
pub fn grant_xp(state: &mut GameState, ctx: &SimContext, amount: u32) {
    let gained = state.player.grant_xp(amount, &ctx.data.tunables.combat);
    let level = state.player.level;
    for l in (level - gained + 1)..=level {
        state.events.push(SimEvent::PlayerLeveledUp { level: l });
    }
}

/// Combat phase: queued hits, projectiles, pickups, regen
pub fn resolve_combat(state: &mut GameState, ctx: &SimContext, dt: f32) {
    let hits = std::mem::take(&mut state.pending_hits);
    for hit in hits {
        damage_player(state, ctx, hit.amount);
    }

    update_projectiles(state, ctx, dt);
    update_pickups(state, ctx, dt);

    let regen = state.player.stats.regen;
    state.player.heal(regen * dt);
}

fn entity_overlaps(e: &Entity, pos: Vec3, radius: f32) -> bool {
    let reach = radius + e.size;
    let feet = e.position.y;
    horizontal_distance(pos, e.position) <= reach && pos.y >= feet - 0.5 && pos.y <= feet + e.size * 2.0 + 0.5
}

fn player_overlaps(feet: Vec3, pos: Vec3, radius: f32) -> bool {
    horizontal_distance(pos, feet) <= radius + PLAYER_RADIUS
        && pos.y >= feet.y - 0.5
        && pos.y <= feet.y + PLAYER_HEIGHT + 0.5
}

fn update_projectiles(state: &mut GameState, ctx: &SimContext, dt: f32) {
    let combat = &ctx.data.tunables.combat;
    let player_center = state.player.position + Vec3::Y * (PLAYER_HEIGHT * 0.5);
    let player_feet = state.player.position;

    let mut entity_hits: Vec<(EntityId, f32)> = Vec::new();
    let mut explosions: Vec<(Vec3, f32, f32)> = Vec::new();
    let mut player_hits: Vec<f32> = Vec::new();

    let mut projectiles = std::mem::take(&mut state.projectiles);
    for p in projectiles.iter_mut() {
        p.age += dt;
        p.ttl -= dt;

        match p.behavior {
            ProjectileBehavior::Homing => {
                let target = state
                    .entities
                    .iter()
                    .filter(|e| e.is_active() && !p.hit_set.contains(&e.id))
                    .min_by(|a, b| {
                        a.position
                            .distance_squared(p.position)
                            .total_cmp(&b.position.distance_squared(p.position))
                    });
                if let Some(t) = target {
                    let speed = p.velocity.length();
                    let want = (t.position + Vec3::Y * t.size - p.position).normalize_or_zero();
                    let dir = p.velocity.normalize_or_zero();
                    let turned = dir.lerp(want, (combat.homing_turn_rate * dt).min(1.0));
                    p.velocity = turned.normalize_or_zero() * speed;
                }
            }
            ProjectileBehavior::Boomerang { return_after } => {
                if !p.returning && p.age >= return_after {
                    p.returning = true;
                    p.hit_set.clear();
                }
                if p.returning {
                    let speed = p.velocity.length();
                    p.velocity = (player_center - p.position).normalize_or_zero() * speed;
                }
            }
            ProjectileBehavior::Straight | ProjectileBehavior::AreaOnImpact => {}
        }

        p.position += p.velocity * dt;

        let mut exploded = false;
        match p.faction {
            Faction::Player => {
                for e in state.entities.iter() {
                    if !e.is_active() || p.hit_set.contains(&e.id) || !entity_overlaps(e, p.position, p.radius) {
                        continue;
                    }
                    if p.behavior == ProjectileBehavior::AreaOnImpact {
                        explosions.push((p.position, p.damage, p.area_radius));
                        exploded = true;
                        p.ttl = 0.0;
                        break;
                    }
                    entity_hits.push((e.id, p.damage));
                    p.hit_set.push(e.id);
                    if p.exhausted() {
                        p.ttl = 0.0;
                        break;
                    }
                }
                if p.returning && horizontal_distance(p.position, player_center) <= combat.boomerang_catch {
                    p.ttl = 0.0;
                }
            }
            Faction::Enemy => {
                if player_overlaps(player_feet, p.position, p.radius) {
                    player_hits.push(p.damage);
                    p.ttl = 0.0;
                }
            }
        }

        // Area shells that run out of time still go off
        if !exploded && p.ttl <= 0.0 && p.behavior == ProjectileBehavior::AreaOnImpact {
            explosions.push((p.position, p.damage, p.area_radius));
        }
    }
    projectiles.retain(|p| p.ttl > 0.0);
    state.projectiles = projectiles;

    for (id, damage) in entity_hits {
        damage_entity(state, ctx, id, damage);
    }

    let area_mult = state.player.stats.area_mult;
    for (center, damage, radius) in explosions {
        let radius = radius * area_mult;
        let targets: Vec<(EntityId, f32)> = state
            .entities
            .iter()
            .filter(|e| e.is_active())
            .filter_map(|e| {
                let d = flat(e.position).distance(flat(center));
                (d <= radius + e.size).then(|| (e.id, area_falloff(d, radius, combat.area_min_falloff)))
            })
            .collect();
        for (id, falloff) in targets {
            damage_entity(state, ctx, id, damage * falloff);
        }
    }

    for damage in player_hits {
        damage_player(state, ctx, damage);
    }
}

fn update_pickups(state: &mut GameState, ctx: &SimContext, dt: f32) {
    let combat = &ctx.data.tunables.combat;
    let reach = combat.pickup_magnet_radius * state.player.stats.magnet;
    let feet = state.player.position;

    let mut xp = 0u32;
    let mut currency = 0u32;
    state.pickups.retain_mut(|pickup| {
        pickup.ttl -= dt;
        if horizontal_distance(pickup.position, feet) <= reach && (pickup.position.y - feet.y).abs() <= PLAYER_HEIGHT * 2.0 {
            match pickup.kind {
                PickupKind::Experience(v) => xp = xp.saturating_add(v),
                PickupKind::Currency(v) => currency = currency.saturating_add(v),
            }
            return false;
        }
        pickup.ttl > 0.0
    });

    if xp > 0 || currency > 0 {
        state.player.currency = state.player.currency.saturating_add(currency);
        state.events.push(SimEvent::PickupCollected { xp, currency });
        grant_xp(state, ctx, xp);
    }
}
