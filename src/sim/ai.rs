//! Per-tick entity behaviour
//!
//! Ordinary entities run Spawning → Chasing ⇄ Attacking. Bosses are handed
//! to the boss state machine. Nothing here touches the player directly:
//! melee hits are queued for the combat phase and summons for the spawn
//! phase, so an entity cannot act on a world it is about to leave.

use glam::{Vec2, Vec3};
use rand_pcg::Pcg32;

use super::boss::{BossArena, release_arena, update_boss};
use super::combat::{PendingHit, Projectile};
use super::director::{SpawnRequest, place_on_ring};
use super::entity::{AiState, Entity, EntityId};
use super::events::{DespawnReason, SimEvent};
use super::obstacles::ObstacleField;
use super::state::{GameState, SimContext};
use super::terrain::{TerrainModel, check_in_world};
use crate::consts::{ENTITY_STEP_TOLERANCE, PLAYER_RADIUS};
use crate::tuning::{AiTuning, GameData};
use crate::{at_height, flat};

/// Read-only inputs for the AI phase
pub struct AiView<'a> {
    pub terrain: &'a TerrainModel,
    pub obstacles: &'a ObstacleField,
    /// Player feet position
    pub player: Vec3,
    /// Total simulation time, drives the wander oscillators
    pub elapsed: f32,
    /// Entity ids alive at the start of the phase
    pub alive: &'a [EntityId],
    pub data: &'a GameData,
    pub placement_attempts: u32,
}

/// Everything the AI phase may write
pub struct AiSink<'a> {
    pub rng: &'a mut Pcg32,
    pub events: &'a mut Vec<SimEvent>,
    pub projectiles: &'a mut Vec<Projectile>,
    pub hits: &'a mut Vec<PendingHit>,
    pub spawns: &'a mut Vec<SpawnRequest>,
    pub arena: &'a mut Option<BossArena>,
}

/// AI phase entry point
pub fn update_ai(state: &mut GameState, ctx: &SimContext, dt: f32) {
    let alive: Vec<EntityId> = state.entities.iter().map(|e| e.id).collect();
    let GameState {
        entities,
        player,
        terrain,
        obstacles,
        arena,
        projectiles,
        rng,
        events,
        pending_hits,
        spawn_queue,
        clock,
        landmark,
        ..
    } = state;

    let view = AiView {
        terrain,
        obstacles,
        player: player.position,
        elapsed: clock.elapsed,
        alive: &alive,
        data: ctx.data,
        placement_attempts: ctx.data.tunables.director.placement_attempts,
    };
    let mut sink = AiSink {
        rng,
        events,
        projectiles,
        hits: pending_hits,
        spawns: spawn_queue,
        arena,
    };

    let mut lost = Vec::new();
    for entity in entities.iter_mut() {
        if entity.is_boss() {
            update_boss(entity, &view, &mut sink, dt);
        } else {
            update_entity(entity, &view, &mut sink, dt);
        }
        if let Err(err) = check_in_world(entity.position.y) {
            log::warn!("entity {}: {err}, despawning", entity.id);
            lost.push((entity.id, entity.is_main_boss()));
        }
    }

    // Out of bounds: despawn without reward
    for (id, main) in lost {
        entities.retain(|e| e.id != id);
        sink.events.push(SimEvent::EntityDespawned {
            id,
            reason: DespawnReason::OutOfBounds,
        });
        if main {
            if release_arena(sink.arena, id) {
                sink.events.push(SimEvent::ArenaDeactivated);
            }
            // Let the landmark summon again
            landmark.active = false;
        }
    }
}

/// Rise-in; shared with bosses
pub fn advance_spawn(entity: &mut Entity, ai: &AiTuning, dt: f32) {
    let duration = ai.spawn_duration.max(1e-3);
    entity.spawn_progress = (entity.spawn_progress + dt / duration).min(1.0);
    let sunk = (1.0 - entity.spawn_progress) * entity.size * 2.0;
    entity.position.y = entity.ground_y - sunk;
    if entity.is_active() {
        entity.ai_state = AiState::Chasing;
    }
}

/// Walkable height for an entity at `pos`, respecting its step tolerance
pub fn ground_height(terrain: &TerrainModel, pos: Vec2, current_y: f32) -> f32 {
    terrain.height_at_with_tolerance(pos.x, pos.y, Some(current_y), ENTITY_STEP_TOLERANCE)
}

/// Unit steering toward `dir` with a perpendicular wander oscillation
pub fn wander_steer(dir: Vec2, elapsed: f32, phase: f32, ai: &AiTuning) -> Vec2 {
    let side = dir.perp();
    let wobble = (elapsed * ai.wander_frequency + phase).sin() * ai.wander_strength;
    (dir + side * wobble).normalize_or(dir)
}

fn update_entity(entity: &mut Entity, view: &AiView, sink: &mut AiSink, dt: f32) {
    let ai = &view.data.tunables.ai;
    if entity.ai_state == AiState::Spawning {
        advance_spawn(entity, ai, dt);
        return;
    }

    let here = flat(entity.position);
    let to_player = flat(view.player) - here;
    let dist = to_player.length();
    entity.attack_cooldown = (entity.attack_cooldown - dt).max(0.0);

    let reach = entity.size + PLAYER_RADIUS + ai.melee_reach;
    let level = entity.is_flying() || (view.player.y - entity.position.y).abs() <= ENTITY_STEP_TOLERANCE;
    if dist <= reach && level {
        entity.ai_state = AiState::Attacking;
        entity.velocity = Vec3::ZERO;
        if entity.attack_cooldown <= 0.0 {
            sink.hits.push(PendingHit {
                source: entity.id,
                amount: entity.damage,
            });
            entity.attack_cooldown = ai.attack_interval;
        }
    } else {
        entity.ai_state = AiState::Chasing;
        let dir = to_player.normalize_or_zero();
        let steer = wander_steer(dir, view.elapsed, entity.wander_phase, ai);
        let mut next = here + steer * entity.speed * dt;
        if !entity.is_flying() {
            next = view.obstacles.resolve(next, entity.size).0;
        }
        entity.velocity = at_height((next - here) / dt.max(1e-6), 0.0);
        let y = if entity.is_flying() {
            view.terrain.height_at(next.x, next.y, None) + ai.flyer_hover
        } else {
            ground_height(view.terrain, next, entity.position.y)
        };
        entity.position = at_height(next, y);
        entity.ground_y = y;
    }

    watchdog(entity, dist, view, sink, dt);
}

/// Relocate entities that have been out of reach for too long
fn watchdog(entity: &mut Entity, dist: f32, view: &AiView, sink: &mut AiSink, dt: f32) {
    let ai = &view.data.tunables.ai;
    if dist <= ai.stuck_distance {
        entity.stuck_timer = 0.0;
        return;
    }
    entity.stuck_timer += dt;
    if entity.stuck_timer < ai.stuck_timeout {
        return;
    }

    let mut to = place_on_ring(view.terrain, flat(view.player), ai.unstuck_ring, view.placement_attempts, sink.rng);
    if entity.is_flying() {
        to.y += ai.flyer_hover;
    }
    log::debug!("entity {} stuck for {:.1}s, relocating to {to:?}", entity.id, entity.stuck_timer);
    entity.position = to;
    entity.ground_y = to.y;
    entity.stuck_timer = 0.0;
}
