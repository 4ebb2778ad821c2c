//! Entity director
//!
//! Decides when, where and what to spawn. The director only produces
//! `SpawnRequest`s; the spawn phase turns them into entities with
//! tier-scaled stats so placement and scaling stay testable on their own.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::assign_arena;
use super::entity::{BossArchetype, BossBrain, Entity, EntityId, EntityKind, EntityStats, GruntKind};
use super::events::{DespawnReason, SimEvent};
use super::state::{GameState, SimContext};
use super::terrain::TerrainModel;
use super::tier::{BossLandmark, SimClock, TierMode, TierState};
use crate::error::SimError;
use crate::tuning::{BossDef, DirectorTuning, EnemyDef};
use crate::{at_height, flat, horizontal_distance};

/// Something the spawn phase should create
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRequest {
    Grunt { kind: GruntKind, position: Vec3 },
    /// Overtime flyer
    Ghost { position: Vec3 },
    Miniboss { archetype: BossArchetype, position: Vec3 },
    MainBoss { archetype: BossArchetype, position: Vec3 },
    /// Overtime stacking boss with explicit stats
    OvertimeBoss { position: Vec3, hp: f32, damage: f32 },
    /// Shield guard linked to `owner`
    Guard { owner: EntityId, position: Vec3 },
}

/// What the director can see of the world
pub struct DirectorView<'a> {
    pub terrain: &'a TerrainModel,
    pub player: Vec3,
    pub player_level: u32,
    pub landmark: &'a BossLandmark,
    pub miniboss_active: bool,
    pub main_boss_active: bool,
}

/// Spawn timers; reset on every tier transition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityDirector {
    spawn_timer: f32,
    ghost_timer: f32,
    overtime_boss_timer: f32,
    /// Overtime bosses spawned so far this tier
    overtime_boss_count: u32,
    /// Index of the next miniboss checkpoint
    next_checkpoint: usize,
}

impl EntityDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn overtime_boss_count(&self) -> u32 {
        self.overtime_boss_count
    }

    /// Advance timers and return this tick's spawn requests
    pub fn tick(
        &mut self,
        dt: f32,
        clock: &SimClock,
        tier: &TierState,
        view: &DirectorView,
        ctx: &SimContext,
        rng: &mut Pcg32,
    ) -> Vec<SpawnRequest> {
        let d = &ctx.data.tunables.director;
        let center = flat(view.player);
        let mut out = Vec::new();

        match tier.mode {
            TierMode::Calm => {
                self.spawn_timer += dt;
                let interval = spawn_interval(d, view.player_level, clock.tier_elapsed, ctx.settings.mode.spawn_rate());
                while self.spawn_timer >= interval {
                    self.spawn_timer -= interval;
                    for _ in 0..d.batch_size {
                        let kind = pick_grunt(rng);
                        let position = place_on_ring(view.terrain, center, d.ring_distance, d.placement_attempts, rng);
                        out.push(SpawnRequest::Grunt { kind, position });
                    }
                }

                while let Some(&at) = d.miniboss_checkpoints.get(self.next_checkpoint) {
                    if clock.tier_elapsed < at {
                        break;
                    }
                    self.next_checkpoint += 1;
                    if view.miniboss_active {
                        log::debug!("miniboss checkpoint {at}s skipped, one is already active");
                        continue;
                    }
                    let position = place_on_ring(view.terrain, center, d.ring_distance, d.placement_attempts, rng);
                    out.push(SpawnRequest::Miniboss {
                        archetype: BossArchetype::Colossus,
                        position,
                    });
                }
            }
            TierMode::Overtime => {
                let ghost_interval =
                    (d.ghost_base_interval - d.ghost_shrink_rate * tier.overtime_elapsed).max(d.ghost_min_interval.max(1e-3));
                self.ghost_timer += dt;
                while self.ghost_timer >= ghost_interval {
                    self.ghost_timer -= ghost_interval;
                    let position = place_on_ring(view.terrain, center, d.ring_distance, d.placement_attempts, rng);
                    out.push(SpawnRequest::Ghost { position });
                }

                self.overtime_boss_timer += dt;
                if self.overtime_boss_timer >= d.overtime_boss_interval {
                    self.overtime_boss_timer -= d.overtime_boss_interval;
                    let stack = d.overtime_boss_stack.powi(self.overtime_boss_count as i32);
                    self.overtime_boss_count += 1;
                    let position = place_on_ring(view.terrain, center, d.ring_distance, d.placement_attempts, rng);
                    out.push(SpawnRequest::OvertimeBoss {
                        position,
                        hp: d.overtime_boss_hp * stack,
                        damage: d.overtime_boss_damage * stack,
                    });
                }
            }
        }

        let landmark = view.landmark;
        if !tier.boss_defeated
            && !view.main_boss_active
            && !landmark.active
            && !landmark.consumed
            && horizontal_distance(view.player, landmark.position) <= d.boss_trigger_distance
        {
            out.push(SpawnRequest::MainBoss {
                archetype: main_boss_for_tier(tier.tier),
                position: landmark.position,
            });
        }

        out
    }
}

/// Main boss rotation
pub fn main_boss_for_tier(tier: u32) -> BossArchetype {
    if tier % 2 == 1 { BossArchetype::Warden } else { BossArchetype::Tempest }
}

fn pick_grunt(rng: &mut Pcg32) -> GruntKind {
    let roll = rng.random::<f32>();
    if roll < 0.5 {
        GruntKind::Crawler
    } else if roll < 0.8 {
        GruntKind::Charger
    } else {
        GruntKind::Brute
    }
}

/// Seconds between grunt waves, floored
pub fn spawn_interval(d: &DirectorTuning, level: u32, tier_elapsed: f32, mode_rate: f32) -> f32 {
    let level_factor = (1.0 - level as f32 * d.level_factor).max(d.min_level_factor);
    let time_factor = (1.0 - tier_elapsed / d.time_ramp.max(1e-3)).max(d.min_time_factor);
    (d.base_interval * level_factor * time_factor / mode_rate.max(0.01)).max(d.min_interval.max(1e-3))
}

/// `(base + level * level_scale) * tier_multiplier^(tier - 1)`
pub fn scaled_enemy_hp(base: f32, level: u32, tier: u32, d: &DirectorTuning) -> f32 {
    (base + level as f32 * d.level_scale) * d.tier_multiplier.powi(tier.saturating_sub(1) as i32)
}

pub fn scaled_enemy_damage(base: f32, level: u32, tier: u32, d: &DirectorTuning) -> f32 {
    (base + level as f32 * d.damage_level_scale) * d.damage_tier_multiplier.powi(tier.saturating_sub(1) as i32)
}

/// Sample a non-hazard point on a ring around `center`. After `attempts`
/// misses the last candidate is accepted anyway.
pub fn place_on_ring(terrain: &TerrainModel, center: Vec2, ring: f32, attempts: u32, rng: &mut Pcg32) -> Vec3 {
    let mut candidate = center;
    for _ in 0..attempts.max(1) {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        candidate = center + Vec2::from_angle(angle) * ring;
        if !terrain.is_hazard(candidate.x, candidate.y) {
            return at_height(candidate, terrain.height_at(candidate.x, candidate.y, None));
        }
    }
    log::debug!("no safe spawn point near {center:?} after {attempts} attempts, accepting {candidate:?}");
    at_height(candidate, terrain.height_at(candidate.x, candidate.y, None))
}

fn grunt_stats(def: &EnemyDef, level: u32, tier: u32, d: &DirectorTuning) -> EntityStats {
    EntityStats {
        hp: scaled_enemy_hp(def.base_hp, level, tier, d),
        damage: scaled_enemy_damage(def.base_damage, level, tier, d),
        speed: def.speed,
        size: def.size,
        armor: def.armor,
        xp_value: def.xp_value,
    }
}

fn boss_stats(def: &BossDef, level: u32, tier: u32, d: &DirectorTuning) -> EntityStats {
    EntityStats {
        hp: scaled_enemy_hp(def.base_hp, level, tier, d),
        damage: scaled_enemy_damage(def.damage, level, tier, d),
        speed: def.speed,
        size: def.size,
        armor: def.armor,
        xp_value: def.xp_value,
    }
}

/// Create one entity from a request
pub fn spawn_entity(state: &mut GameState, ctx: &SimContext, request: SpawnRequest) -> Result<Option<EntityId>, SimError> {
    let data = ctx.data;
    let d = &data.tunables.director;
    let ai = &data.tunables.ai;
    let level = state.player.level;
    let tier = state.tier.tier;
    let brain = |archetype: BossArchetype| BossBrain::new(archetype, ai.boss_first_pattern_delay, ai.shield_interval);

    let (kind, position, stats) = match request {
        SpawnRequest::Grunt { kind, position } => (
            EntityKind::Grunt(kind),
            position,
            grunt_stats(data.enemies.grunt(kind), level, tier, d),
        ),
        SpawnRequest::Ghost { position } => (
            EntityKind::FlyingHazard,
            position + Vec3::Y * ai.flyer_hover,
            grunt_stats(&data.enemies.ghost, level, tier, d),
        ),
        SpawnRequest::Miniboss { archetype, position } => (
            EntityKind::Miniboss(brain(archetype)),
            position,
            boss_stats(data.bosses.get(archetype), level, tier, d),
        ),
        SpawnRequest::OvertimeBoss { position, hp, damage } => {
            let mut stats = boss_stats(&data.bosses.juggernaut, level, tier, d);
            stats.hp = hp;
            stats.damage = damage;
            (EntityKind::Miniboss(brain(BossArchetype::Juggernaut)), position, stats)
        }
        SpawnRequest::Guard { owner, position } => {
            if !state.entities.iter().any(|e| e.id == owner) {
                log::debug!("guard for boss {owner} dropped, owner is gone");
                return Ok(None);
            }
            (
                EntityKind::Miniboss(brain(BossArchetype::Sentinel)),
                position,
                boss_stats(&data.bosses.sentinel, level, tier, d),
            )
        }
        SpawnRequest::MainBoss { archetype, position } => {
            if let Some(active) = state.entities.iter().find(|e| e.is_main_boss()) {
                return Err(SimError::DuplicateMainBoss { active: active.id });
            }
            (
                EntityKind::MainBoss(brain(archetype)),
                position,
                boss_stats(data.bosses.get(archetype), level, tier, d),
            )
        }
    };

    let id = state.next_entity_id();
    if matches!(kind, EntityKind::MainBoss(_)) {
        assign_arena(&mut state.arena, id, flat(position), d.arena_radius)?;
        state.landmark.active = true;
        log::info!("main boss {id} summoned at {position:?} on tier {tier}");
    }
    if let SpawnRequest::Guard { owner, .. } = request
        && let Some(boss) = state.entities.iter_mut().find(|e| e.id == owner).and_then(Entity::boss_mut)
    {
        boss.guard = Some(id);
        boss.guard_requested = false;
    }

    let entity = Entity::new(id, kind, position, stats);
    state.events.push(SimEvent::EntitySpawned {
        id,
        tag: entity.tag(),
        position,
    });
    state.entities.push(entity);
    Ok(Some(id))
}

/// Spawn phase: run the director, apply queued and fresh requests, enforce the cap
pub fn run_spawn_phase(state: &mut GameState, ctx: &SimContext, dt: f32) {
    let view = DirectorView {
        terrain: &state.terrain,
        player: state.player.position,
        player_level: state.player.level,
        landmark: &state.landmark,
        miniboss_active: state
            .entities
            .iter()
            .any(|e| matches!(e.kind, EntityKind::Miniboss(ref b) if b.archetype == BossArchetype::Colossus)),
        main_boss_active: state.entities.iter().any(Entity::is_main_boss),
    };
    let fresh = state
        .director
        .tick(dt, &state.clock, &state.tier, &view, ctx, &mut state.rng);

    let mut requests = std::mem::take(&mut state.spawn_queue);
    requests.extend(fresh);
    for request in requests {
        match spawn_entity(state, ctx, request) {
            Ok(_) => {}
            Err(err) if err.is_state_conflict() => log::warn!("spawn rejected: {err}"),
            Err(err) => log::warn!("spawn failed: {err}"),
        }
    }

    enforce_cap(state, ctx.data.tunables.director.max_live);
}

/// Evict the oldest non-boss entities beyond `max_live`. Bosses are never
/// evicted.
pub fn enforce_cap(state: &mut GameState, max_live: usize) {
    let mut ordinary: Vec<EntityId> = state.entities.iter().filter(|e| !e.is_boss()).map(|e| e.id).collect();
    if ordinary.len() <= max_live {
        return;
    }
    ordinary.sort_unstable();
    let evict = &ordinary[..ordinary.len() - max_live];
    state.entities.retain(|e| !evict.contains(&e.id));
    for &id in evict {
        state.events.push(SimEvent::EntityDespawned {
            id,
            reason: DespawnReason::Capped,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{GameMode, Settings};
    use crate::tuning::GameData;
    use rand::SeedableRng;

    #[test]
    fn test_hp_scaling_reference() {
        let d = DirectorTuning::default();
        assert!((scaled_enemy_hp(5.0, 5, 2, &d) - 262.5).abs() < 1e-3);
        assert!((scaled_enemy_hp(5.0, 5, 1, &d) - 17.5).abs() < 1e-4);
    }

    #[test]
    fn test_spawn_interval_floors() {
        let d = DirectorTuning::default();
        let early = spawn_interval(&d, 1, 0.0, 1.0);
        let late = spawn_interval(&d, 50, 10_000.0, 1.0);
        assert!(late < early);
        assert!(late >= d.min_interval);
        // Extreme mode multipliers still respect the floor
        assert!(spawn_interval(&d, 1, 0.0, 1000.0) >= d.min_interval);
        assert!(spawn_interval(&d, 1, 0.0, GameMode::Coop.spawn_rate()) < early);
    }

    #[test]
    fn test_place_on_ring_avoids_hazard() {
        let terrain = TerrainModel::new(
            vec![crate::sim::terrain::TerrainPiece::new(10.0, 0.0, 6.0, 30.0, 2.0)],
            Vec::new(),
        )
        .unwrap();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..20 {
            let p = place_on_ring(&terrain, Vec2::ZERO, 10.0, 64, &mut rng);
            assert!(!terrain.is_hazard(p.x, p.z));
            assert!((p.y - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_place_on_ring_falls_back_in_void() {
        let terrain = TerrainModel::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let p = place_on_ring(&terrain, Vec2::ZERO, 10.0, 4, &mut rng);
        assert!((flat(p).length() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_calm_waves_and_checkpoint() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let state = GameState::for_tests(&ctx);
        let mut director = EntityDirector::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut clock = SimClock::default();
        clock.tier_elapsed = data.tunables.director.miniboss_checkpoints[0] + 1.0;
        let view = DirectorView {
            terrain: &state.terrain,
            player: state.player.position,
            player_level: 1,
            landmark: &state.landmark,
            miniboss_active: false,
            main_boss_active: false,
        };
        let out = director.tick(2.0, &clock, &state.tier, &view, &ctx, &mut rng);
        assert!(out.iter().any(|r| matches!(r, SpawnRequest::Grunt { .. })));
        assert_eq!(out.iter().filter(|r| matches!(r, SpawnRequest::Miniboss { .. })).count(), 1);

        // Checkpoint is consumed
        let again = director.tick(0.0, &clock, &state.tier, &view, &ctx, &mut rng);
        assert!(!again.iter().any(|r| matches!(r, SpawnRequest::Miniboss { .. })));
    }

    #[test]
    fn test_overtime_stops_waves_and_stacks_bosses() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let state = GameState::for_tests(&ctx);
        let d = &data.tunables.director;
        let mut tier = state.tier.clone();
        tier.mode = TierMode::Overtime;
        let mut director = EntityDirector::new();
        let mut rng = Pcg32::seed_from_u64(9);
        let view = DirectorView {
            terrain: &state.terrain,
            player: state.player.position,
            player_level: 1,
            landmark: &state.landmark,
            miniboss_active: false,
            main_boss_active: false,
        };

        let mut bosses = Vec::new();
        for _ in 0..2 {
            let out = director.tick(d.overtime_boss_interval, &SimClock::default(), &tier, &view, &ctx, &mut rng);
            assert!(!out.iter().any(|r| matches!(r, SpawnRequest::Grunt { .. })));
            assert!(out.iter().any(|r| matches!(r, SpawnRequest::Ghost { .. })));
            bosses.extend(out.into_iter().filter_map(|r| match r {
                SpawnRequest::OvertimeBoss { hp, damage, .. } => Some((hp, damage)),
                _ => None,
            }));
        }
        assert_eq!(bosses.len(), 2);
        assert!((bosses[1].0 - bosses[0].0 * d.overtime_boss_stack).abs() < 1e-1);
        assert!((bosses[1].1 - bosses[0].1 * d.overtime_boss_stack).abs() < 1e-3);
    }

    #[test]
    fn test_landmark_proximity_summons_main_boss_once() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        state.player.position = state.landmark.position;

        run_spawn_phase(&mut state, &ctx, 0.0);
        let bosses = state.entities.iter().filter(|e| e.is_main_boss()).count();
        assert_eq!(bosses, 1);
        assert!(state.landmark.active);
        assert!(state.arena.is_some_and(|a| !a.active));

        run_spawn_phase(&mut state, &ctx, 0.0);
        assert_eq!(state.entities.iter().filter(|e| e.is_main_boss()).count(), 1);
    }

    #[test]
    fn test_duplicate_main_boss_is_state_conflict() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        let req = SpawnRequest::MainBoss {
            archetype: BossArchetype::Warden,
            position: Vec3::new(0.0, 1.0, 5.0),
        };
        let first = spawn_entity(&mut state, &ctx, req.clone()).unwrap();
        let err = spawn_entity(&mut state, &ctx, req).unwrap_err();
        assert!(err.is_state_conflict());
        assert!(matches!(err, SimError::DuplicateMainBoss { active } if Some(active) == first));
        assert_eq!(state.entities.len(), 1);
    }

    #[test]
    fn test_guard_links_to_owner() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        let owner = spawn_entity(
            &mut state,
            &ctx,
            SpawnRequest::Miniboss { archetype: BossArchetype::Warden, position: Vec3::new(0.0, 1.0, 5.0) },
        )
        .unwrap()
        .unwrap();
        let guard = spawn_entity(&mut state, &ctx, SpawnRequest::Guard { owner, position: Vec3::new(3.0, 1.0, 5.0) })
            .unwrap();
        let brain = state.entities[0].boss().unwrap();
        assert_eq!(brain.guard, guard);
        assert!(!brain.guard_requested);

        let orphan = spawn_entity(&mut state, &ctx, SpawnRequest::Guard { owner: 4242, position: Vec3::ZERO }).unwrap();
        assert_eq!(orphan, None);
    }

    #[test]
    fn test_cap_evicts_oldest_non_boss() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        spawn_entity(
            &mut state,
            &ctx,
            SpawnRequest::Miniboss { archetype: BossArchetype::Colossus, position: Vec3::ZERO },
        )
        .unwrap();
        let mut grunts = Vec::new();
        for i in 0..5 {
            let position = Vec3::new(i as f32, 1.0, 0.0);
            grunts.push(spawn_entity(&mut state, &ctx, SpawnRequest::Grunt { kind: GruntKind::Crawler, position }).unwrap().unwrap());
        }

        enforce_cap(&mut state, 3);
        assert_eq!(state.entities.iter().filter(|e| e.is_boss()).count(), 1);
        let left: Vec<EntityId> = state.entities.iter().filter(|e| !e.is_boss()).map(|e| e.id).collect();
        assert_eq!(left, grunts[2..].to_vec());
    }

    #[test]
    fn test_spawned_stats_follow_tier_law() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        state.tier.tier = 2;
        state.player.level = 5;
        let id = spawn_entity(
            &mut state,
            &ctx,
            SpawnRequest::Grunt { kind: GruntKind::Crawler, position: Vec3::ZERO },
        )
        .unwrap()
        .unwrap();
        let e = state.entities.iter().find(|e| e.id == id).unwrap();
        assert!((e.max_hp - 262.5).abs() < 1e-3);
    }
}
