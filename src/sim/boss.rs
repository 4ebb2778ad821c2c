//! Boss state machine and arena containment
//!
//! Every archetype shares one machine: Idle → Attack(pattern) → Idle, with
//! Teleporting when the player runs too far and an optional Shielded phase
//! guarded by a summoned Sentinel. Archetypes differ only in their pattern
//! cycle and cooldowns, which come from the boss table.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::ai::{AiSink, AiView, advance_spawn, ground_height};
use super::combat::{PendingHit, Projectile};
use super::director::{SpawnRequest, place_on_ring};
use super::entity::{AttackPattern, BossBrain, BossPhase, Entity, EntityId, EntityKind};
use super::events::SimEvent;
use crate::consts::{PLAYER_HEIGHT, PLAYER_RADIUS};
use crate::error::SimError;
use crate::{at_height, flat};

/// Invisible containment circle around an active boss fight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossArena {
    pub center: Vec2,
    pub radius: f32,
    pub active: bool,
    /// Boss the arena belongs to
    pub owner: EntityId,
}

impl BossArena {
    pub fn new(owner: EntityId, center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            active: false,
            owner,
        }
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Pull `pos` back inside the circle and drop the outward part of `vel`
    pub fn clamp(&self, pos: Vec2, vel: Vec2) -> (Vec2, Vec2) {
        if self.contains(pos) {
            return (pos, vel);
        }
        let offset = pos - self.center;
        let dist = offset.length();
        if dist <= f32::EPSILON {
            return (pos, vel);
        }
        let normal = offset / dist;
        let outward = vel.dot(normal);
        let vel = if outward > 0.0 { vel - normal * outward } else { vel };
        (self.center + normal * self.radius, vel)
    }
}

/// Assign an (inactive) arena to a main boss at spawn
pub fn assign_arena(slot: &mut Option<BossArena>, owner: EntityId, center: Vec2, radius: f32) -> Result<(), SimError> {
    if let Some(current) = slot
        && current.active
        && current.owner != owner
    {
        return Err(SimError::ArenaConflict("another arena is already active"));
    }
    *slot = Some(BossArena::new(owner, center, radius));
    Ok(())
}

/// Activate the arena assigned to `owner`
pub fn activate_arena(slot: &mut Option<BossArena>, owner: EntityId) -> Result<(), SimError> {
    match slot {
        None => Err(SimError::ArenaConflict("no arena assigned")),
        Some(arena) if arena.owner != owner => Err(SimError::ArenaConflict("arena is assigned to another boss")),
        Some(arena) => {
            arena.active = true;
            Ok(())
        }
    }
}

/// Drop the arena if `owner` holds it. Returns true if one was released.
pub fn release_arena(slot: &mut Option<BossArena>, owner: EntityId) -> bool {
    if slot.is_some_and(|a| a.owner == owner) {
        *slot = None;
        true
    } else {
        false
    }
}

fn set_phase(brain: &mut BossBrain, id: EntityId, phase: BossPhase, events: &mut Vec<SimEvent>) {
    if brain.phase != phase {
        brain.phase = phase;
        events.push(SimEvent::BossPhaseChanged {
            id,
            archetype: brain.archetype,
            phase,
        });
    }
}

/// Advance one boss by `dt`
pub fn update_boss(entity: &mut Entity, view: &AiView, sink: &mut AiSink, dt: f32) {
    let ai = &view.data.tunables.ai;
    if !entity.is_active() {
        advance_spawn(entity, ai, dt);
        return;
    }
    let is_main = entity.is_main_boss();

    let Entity {
        id,
        kind,
        position,
        velocity,
        speed,
        size,
        damage,
        ground_y,
        ..
    } = entity;
    let id = *id;
    let (EntityKind::MainBoss(brain) | EntityKind::Miniboss(brain)) = kind else {
        return;
    };
    if brain.phase == BossPhase::Defeated {
        return;
    }
    let def = view.data.bosses.get(brain.archetype);
    let player_xz = flat(view.player);
    let player_center = view.player + Vec3::Y * (PLAYER_HEIGHT * 0.5);
    let dist = player_xz.distance(flat(*position));

    if !brain.engaged {
        brain.engaged = true;
        if is_main {
            match activate_arena(sink.arena, id) {
                Ok(()) => {
                    sink.events.push(SimEvent::ArenaActivated { owner: id });
                    log::info!("boss {id} ({:?}) engaged, arena active", brain.archetype);
                }
                Err(err) => log::warn!("boss {id} engaged without arena: {err}"),
            }
        }
        sink.events.push(SimEvent::BossPhaseChanged {
            id,
            archetype: brain.archetype,
            phase: brain.phase,
        });
    }

    brain.teleport_cooldown = (brain.teleport_cooldown - dt).max(0.0);

    // Shield cycle
    if def.shielded {
        if brain.shield_active {
            let guard_alive = brain.guard.is_some_and(|g| view.alive.contains(&g));
            if !guard_alive && !brain.guard_requested {
                brain.shield_active = false;
                brain.guard = None;
                brain.shield_timer = ai.shield_interval;
                if brain.phase == BossPhase::Shielded {
                    set_phase(brain, id, BossPhase::Idle, sink.events);
                }
            }
        } else if brain.phase == BossPhase::Idle {
            brain.shield_timer -= dt;
            if brain.shield_timer <= 0.0 {
                brain.shield_active = true;
                brain.guard_requested = true;
                let at = place_on_ring(view.terrain, flat(*position), ai.guard_ring, view.placement_attempts, sink.rng);
                sink.spawns.push(SpawnRequest::Guard { owner: id, position: at });
                set_phase(brain, id, BossPhase::Shielded, sink.events);
            }
        }
    }

    // Idle and shielded bosses close the gap when the player runs
    let can_teleport = matches!(brain.phase, BossPhase::Idle | BossPhase::Shielded);
    if can_teleport && dist > ai.boss_teleport_distance && brain.teleport_cooldown <= 0.0 {
        brain.teleport_cooldown = def.teleport_cooldown;
        brain.phase_timer = ai.teleport_duration;
        set_phase(brain, id, BossPhase::Teleporting, sink.events);
    }

    let mut chase = false;
    match brain.phase {
        BossPhase::Idle => {
            brain.pattern_cooldown -= dt;
            if brain.pattern_cooldown <= 0.0 {
                let n = def.patterns.len().max(1);
                let pattern = def
                    .patterns
                    .get(brain.pattern_index % n)
                    .copied()
                    .unwrap_or(AttackPattern::Volley);
                brain.pattern_index += 1;
                let origin = *position + Vec3::Y * *size;
                match pattern {
                    AttackPattern::Volley => {
                        fire_volley(origin, player_center, *damage, view, sink);
                        brain.phase_timer = 0.6;
                    }
                    AttackPattern::Burst => {
                        if dist <= ai.burst_radius + PLAYER_RADIUS {
                            sink.hits.push(PendingHit { source: id, amount: *damage });
                        }
                        brain.phase_timer = 0.6;
                    }
                    AttackPattern::Barrage => {
                        brain.barrage_left = ai.barrage_shots;
                        brain.barrage_timer = 0.0;
                    }
                    AttackPattern::Slam => {
                        brain.slam_target = Some(player_xz);
                        brain.phase_timer = ai.slam_telegraph;
                    }
                }
                set_phase(brain, id, BossPhase::Attack(pattern), sink.events);
            } else {
                chase = true;
            }
        }
        BossPhase::Shielded => chase = true,
        BossPhase::Teleporting => {
            brain.phase_timer -= dt;
            if brain.phase_timer <= 0.0 {
                let mut to = place_on_ring(view.terrain, player_xz, ai.boss_teleport_ring, view.placement_attempts, sink.rng);
                if let Some(arena) = sink.arena.as_ref().filter(|a| a.active && a.owner == id) {
                    let (p, _) = arena.clamp(flat(to), Vec2::ZERO);
                    to = at_height(p, view.terrain.height_at(p.x, p.y, None));
                }
                log::debug!("boss {id} teleported to {to:?}");
                *position = to;
                *ground_y = to.y;
                *velocity = Vec3::ZERO;
                let next = if brain.shield_active { BossPhase::Shielded } else { BossPhase::Idle };
                set_phase(brain, id, next, sink.events);
            }
        }
        BossPhase::Attack(pattern) => {
            let done = match pattern {
                AttackPattern::Barrage => {
                    brain.barrage_timer -= dt;
                    while brain.barrage_timer <= 0.0 && brain.barrage_left > 0 {
                        let origin = *position + Vec3::Y * *size;
                        sink.projectiles.push(Projectile::enemy(
                            origin,
                            player_center - origin,
                            ai.enemy_projectile_speed,
                            *damage,
                            ai.enemy_projectile_ttl,
                            ai.enemy_projectile_radius,
                        ));
                        brain.barrage_left -= 1;
                        brain.barrage_timer += ai.barrage_shot_interval;
                    }
                    brain.barrage_left == 0
                }
                AttackPattern::Slam => {
                    brain.phase_timer -= dt;
                    if brain.phase_timer <= 0.0 {
                        if let Some(target) = brain.slam_target.take()
                            && player_xz.distance(target) <= ai.slam_radius
                        {
                            sink.hits.push(PendingHit { source: id, amount: *damage });
                        }
                        true
                    } else {
                        false
                    }
                }
                AttackPattern::Volley | AttackPattern::Burst => {
                    brain.phase_timer -= dt;
                    brain.phase_timer <= 0.0
                }
            };
            if done {
                brain.pattern_cooldown = def.pattern_cooldown;
                set_phase(brain, id, BossPhase::Idle, sink.events);
            }
        }
        BossPhase::Defeated => {}
    }

    if chase && dist > ai.boss_preferred_distance {
        let dir = (player_xz - flat(*position)).normalize_or_zero();
        let mut next = flat(*position) + dir * *speed * dt;
        if let Some(arena) = sink.arena.as_ref().filter(|a| a.active && a.owner == id) {
            next = arena.clamp(next, Vec2::ZERO).0;
        }
        *velocity = at_height(dir * *speed, 0.0);
        let y = ground_height(view.terrain, next, position.y);
        *position = at_height(next, y);
        *ground_y = y;
    } else {
        *velocity = Vec3::ZERO;
    }
}

/// Fan of shots centred on the player
fn fire_volley(origin: Vec3, target: Vec3, damage: f32, view: &AiView, sink: &mut AiSink) {
    let ai = &view.data.tunables.ai;
    let aim = (flat(target) - flat(origin)).normalize_or(Vec2::X);
    let count = ai.volley_count.max(1);
    for i in 0..count {
        let t = if count > 1 { i as f32 / (count - 1) as f32 - 0.5 } else { 0.0 };
        let dir = Vec2::from_angle(t * ai.volley_spread).rotate(aim);
        sink.projectiles.push(Projectile::enemy(
            origin,
            at_height(dir, (target.y - origin.y) / (flat(target).distance(flat(origin)).max(1.0))),
            ai.enemy_projectile_speed,
            damage,
            ai.enemy_projectile_ttl,
            ai.enemy_projectile_radius,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::ai::update_ai;
    use crate::sim::entity::{BossArchetype, EntityStats};
    use crate::sim::state::{GameState, SimContext};
    use crate::tuning::GameData;

    fn boss(state: &mut GameState, archetype: BossArchetype, at: Vec3, main: bool, delay: f32) -> EntityId {
        let id = state.next_entity_id();
        let brain = BossBrain::new(archetype, delay, 30.0);
        let kind = if main { EntityKind::MainBoss(brain) } else { EntityKind::Miniboss(brain) };
        let stats = EntityStats {
            hp: 1000.0,
            damage: 10.0,
            speed: 3.0,
            size: 1.5,
            armor: 0.0,
            xp_value: 10,
        };
        let mut e = Entity::new(id, kind, at, stats);
        e.spawn_progress = 1.0;
        state.entities.push(e);
        id
    }

    fn phase(state: &GameState, id: EntityId) -> BossPhase {
        state
            .entities
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.boss())
            .map(|b| b.phase)
            .unwrap_or(BossPhase::Defeated)
    }

    #[test]
    fn test_arena_clamp_reduces_outward_velocity() {
        let arena = BossArena {
            center: Vec2::ZERO,
            radius: 20.0,
            active: true,
            owner: 1,
        };
        let (p, v) = arena.clamp(Vec2::new(25.0, 0.0), Vec2::new(3.0, 2.0));
        assert!((p.length() - 20.0).abs() < 1e-4);
        assert_eq!(v, Vec2::new(0.0, 2.0));
        // Inside is untouched
        let (p, v) = arena.clamp(Vec2::new(5.0, 0.0), Vec2::new(3.0, 0.0));
        assert_eq!((p, v), (Vec2::new(5.0, 0.0), Vec2::new(3.0, 0.0)));
    }

    #[test]
    fn test_rising_boss_holds_its_patterns() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        let at = state.player.position + Vec3::new(2.0, 0.0, 0.0);
        let id = boss(&mut state, BossArchetype::Colossus, at, false, 0.0);
        state.entities[0].spawn_progress = 0.0;

        let ticks = (data.tunables.ai.spawn_duration / (1.0 / 60.0)).ceil() as usize + 2;
        for _ in 0..ticks {
            if state.entities[0].is_active() {
                break;
            }
            update_ai(&mut state, &ctx, 1.0 / 60.0);
            assert!(state.pending_hits.is_empty());
            assert!(state.projectiles.is_empty());
            assert_eq!(phase(&state, id), BossPhase::Idle);
        }
        assert!(state.entities[0].is_active());

        update_ai(&mut state, &ctx, 1.0 / 60.0);
        assert!(matches!(phase(&state, id), BossPhase::Attack(_)));
    }

    #[test]
    fn test_shielded_boss_teleports_and_keeps_shield() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        let far = data.tunables.ai.boss_teleport_distance + 5.0;
        let at = state.player.position + Vec3::new(far, 0.0, 0.0);
        let id = boss(&mut state, BossArchetype::Warden, at, false, 100.0);
        let near = state.player.position + Vec3::new(3.0, 0.0, 0.0);
        let guard = boss(&mut state, BossArchetype::Sentinel, near, false, 100.0);
        if let Some(b) = state.entities[0].boss_mut() {
            b.engaged = true;
            b.shield_active = true;
            b.guard = Some(guard);
            b.phase = BossPhase::Shielded;
        }

        update_ai(&mut state, &ctx, 1.0 / 60.0);
        assert_eq!(phase(&state, id), BossPhase::Teleporting);
        for _ in 0..60 {
            update_ai(&mut state, &ctx, 1.0 / 60.0);
        }
        let e = &state.entities[0];
        assert!(flat(e.position).distance(flat(state.player.position)) < far);
        assert!(e.boss().is_some_and(|b| b.shield_active));
        assert_eq!(phase(&state, id), BossPhase::Shielded);
    }

    #[test]
    fn test_arena_conflicts() {
        let mut slot = None;
        assert!(matches!(activate_arena(&mut slot, 1), Err(SimError::ArenaConflict(_))));

        assign_arena(&mut slot, 1, Vec2::ZERO, 20.0).unwrap();
        assert!(activate_arena(&mut slot, 2).is_err());
        activate_arena(&mut slot, 1).unwrap();
        assert!(assign_arena(&mut slot, 2, Vec2::ONE, 10.0).is_err());

        assert!(!release_arena(&mut slot, 2));
        assert!(release_arena(&mut slot, 1));
        assert!(slot.is_none());
    }

    #[test]
    fn test_main_boss_engages_and_activates_arena() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        let at = state.player.position + Vec3::new(4.0, 0.0, 0.0);
        let id = boss(&mut state, BossArchetype::Tempest, at, true, 5.0);
        assign_arena(&mut state.arena, id, flat(at), 20.0).unwrap();

        update_ai(&mut state, &ctx, 1.0 / 60.0);
        assert!(state.arena.is_some_and(|a| a.active));
        assert!(state.events.contains(&SimEvent::ArenaActivated { owner: id }));
    }

    #[test]
    fn test_missing_arena_is_logged_not_fatal() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        let at = state.player.position + Vec3::new(4.0, 0.0, 0.0);
        boss(&mut state, BossArchetype::Tempest, at, true, 5.0);
        update_ai(&mut state, &ctx, 1.0 / 60.0);
        assert!(state.arena.is_none());
        assert_eq!(state.entities.len(), 1);
    }

    #[test]
    fn test_pattern_cycle_fires_volley() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        let at = state.player.position + Vec3::new(8.0, 0.0, 0.0);
        // Sentinel cycle is volley only
        let id = boss(&mut state, BossArchetype::Sentinel, at, false, 0.0);

        update_ai(&mut state, &ctx, 1.0 / 60.0);
        assert_eq!(phase(&state, id), BossPhase::Attack(AttackPattern::Volley));
        assert_eq!(state.projectiles.len(), data.tunables.ai.volley_count as usize);

        for _ in 0..60 {
            update_ai(&mut state, &ctx, 1.0 / 60.0);
        }
        assert_eq!(phase(&state, id), BossPhase::Idle);
    }

    #[test]
    fn test_far_player_triggers_teleport() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        let far = data.tunables.ai.boss_teleport_distance + 5.0;
        let at = state.player.position + Vec3::new(far, 0.0, 0.0);
        let id = boss(&mut state, BossArchetype::Colossus, at, false, 10.0);

        update_ai(&mut state, &ctx, 1.0 / 60.0);
        assert_eq!(phase(&state, id), BossPhase::Teleporting);
        for _ in 0..60 {
            update_ai(&mut state, &ctx, 1.0 / 60.0);
        }
        let e = state.entities.iter().find(|e| e.id == id).unwrap();
        let d = flat(e.position).distance(flat(state.player.position));
        assert!(d < far, "boss still {d} away");
    }

    #[test]
    fn test_shield_requests_guard_and_drops_when_guard_dies() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        let at = state.player.position + Vec3::new(3.0, 0.0, 0.0);
        let id = boss(&mut state, BossArchetype::Warden, at, false, 100.0);
        if let Some(b) = state.entities[0].boss_mut() {
            b.shield_timer = 0.0;
        }

        update_ai(&mut state, &ctx, 1.0 / 60.0);
        assert_eq!(phase(&state, id), BossPhase::Shielded);
        assert!(matches!(state.spawn_queue.as_slice(), [SpawnRequest::Guard { owner, .. }] if *owner == id));

        // Guard linked, then killed
        state.spawn_queue.clear();
        let guard = 999;
        if let Some(b) = state.entities[0].boss_mut() {
            b.guard = Some(guard);
            b.guard_requested = false;
        }
        update_ai(&mut state, &ctx, 1.0 / 60.0);
        assert_eq!(phase(&state, id), BossPhase::Idle);
        assert!(state.entities[0].boss().is_some_and(|b| !b.shield_active));
    }
}
