//! Character controller
//!
//! Turns input plus the read-only world (terrain, obstacles, boss arena) into
//! the player's new position and velocity. Grounded/Airborne is implicit in
//! `Player::grounded`; the step order is fixed:
//! gravity → horizontal input → obstacles → terrain walls → arena clamp →
//! ground snap → jump → hazard.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::boss::BossArena;
use super::collision::{circle_box, slide_velocity};
use super::events::SimEvent;
use super::obstacles::ObstacleField;
use super::terrain::{TerrainModel, check_in_world};
use super::weapons::{WeaponKind, WeaponSlot};
use crate::consts::*;
use crate::tuning::{CharacterDef, CombatTuning, HazardTuning, MovementTuning};
use crate::{flat, rotate_yaw};

/// Player stat block; upgrades mutate it in place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    /// Run speed (units/s)
    pub speed: f32,
    /// Outgoing damage multiplier
    pub damage: f32,
    /// 0..1
    pub crit_chance: f32,
    /// Fraction of incoming damage mitigated (capped by combat tuning)
    pub armor: f32,
    /// Extra distinct targets a projectile may hit
    pub pierce: u32,
    /// Area weapon radius multiplier
    pub area_mult: f32,
    /// 0..1 reduction of lava damage
    pub lava_resist: f32,
    /// Health per second
    pub regen: f32,
    /// Health per kill
    pub vampirism: f32,
    /// Weapon cooldown multiplier (lower is faster)
    pub cooldown_mult: f32,
    /// Pickup magnet radius multiplier
    pub magnet: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            speed: 7.0,
            damage: 1.0,
            crit_chance: 0.05,
            armor: 0.0,
            pierce: 0,
            area_mult: 1.0,
            lava_resist: 0.0,
            regen: 0.0,
            vampirism: 0.0,
            cooldown_mult: 1.0,
            magnet: 1.0,
        }
    }
}

/// Level-up choices. The UI picks one, the core applies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Upgrade {
    Speed,
    Damage,
    CritChance,
    Armor,
    Pierce,
    AreaSize,
    LavaResist,
    Regen,
    Vampirism,
    MaxHealth,
    Cooldown,
    Magnet,
    /// Add a weapon slot, or level the existing one
    Weapon(WeaponKind),
}

/// The local player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Feet position
    pub position: Vec3,
    pub velocity: Vec3,
    /// Facing (radians about +Y)
    pub yaw: f32,
    pub grounded: bool,
    pub double_jump_available: bool,
    pub health: f32,
    pub max_health: f32,
    pub stats: PlayerStats,
    /// Walls boost upward instead of pushing back
    pub can_climb: bool,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub currency: u32,
    /// Level-ups not yet spent on an upgrade
    pub pending_upgrades: u32,
    pub weapons: Vec<WeaponSlot>,
    /// Last grounded, non-hazard position
    pub last_safe_position: Vec3,
    pub in_hazard: bool,
}

impl Player {
    pub fn new(def: &CharacterDef, spawn: Vec3, combat: &CombatTuning) -> Self {
        Self {
            position: spawn,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            grounded: false,
            double_jump_available: false,
            health: def.max_health,
            max_health: def.max_health,
            stats: def.stats,
            can_climb: def.can_climb,
            level: 1,
            xp: 0,
            xp_to_next: xp_threshold(1, combat),
            currency: 0,
            pending_upgrades: 0,
            weapons: vec![WeaponSlot::new(def.starting_weapon)],
            last_safe_position: spawn,
            in_hazard: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Heal outside the mitigation pipeline, capped at max health
    pub fn heal(&mut self, amount: f32) {
        if amount > 0.0 && self.is_alive() {
            self.health = (self.health + amount).min(self.max_health);
        }
    }

    /// Place on the spawn point of a fresh world
    pub fn respawn_at(&mut self, spawn: Vec3) {
        self.position = spawn;
        self.velocity = Vec3::ZERO;
        self.grounded = false;
        self.double_jump_available = false;
        self.last_safe_position = spawn;
        self.in_hazard = false;
    }

    /// Add experience; returns the number of levels gained
    pub fn grant_xp(&mut self, amount: u32, combat: &CombatTuning) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.level += 1;
            self.pending_upgrades += 1;
            self.xp_to_next = xp_threshold(self.level, combat);
            gained += 1;
        }
        gained
    }

    /// Spend one pending level-up. Returns false with nothing to spend.
    pub fn apply_upgrade(&mut self, upgrade: Upgrade) -> bool {
        if self.pending_upgrades == 0 {
            return false;
        }
        self.pending_upgrades -= 1;

        let s = &mut self.stats;
        match upgrade {
            Upgrade::Speed => s.speed *= 1.08,
            Upgrade::Damage => s.damage += 0.15,
            Upgrade::CritChance => s.crit_chance = (s.crit_chance + 0.05).min(1.0),
            Upgrade::Armor => s.armor = (s.armor + 0.05).min(0.95),
            Upgrade::Pierce => s.pierce += 1,
            Upgrade::AreaSize => s.area_mult += 0.15,
            Upgrade::LavaResist => s.lava_resist = (s.lava_resist + 0.15).min(1.0),
            Upgrade::Regen => s.regen += 0.5,
            Upgrade::Vampirism => s.vampirism += 1.0,
            Upgrade::Cooldown => s.cooldown_mult = (s.cooldown_mult * 0.92).max(0.3),
            Upgrade::Magnet => s.magnet += 0.25,
            Upgrade::MaxHealth => {
                self.max_health += 20.0;
                self.health += 20.0;
            }
            Upgrade::Weapon(kind) => match self.weapons.iter_mut().find(|w| w.kind == kind) {
                Some(slot) => slot.level += 1,
                None => self.weapons.push(WeaponSlot::new(kind)),
            },
        }
        true
    }
}

/// XP needed to go from `level` to `level + 1`
pub fn xp_threshold(level: u32, combat: &CombatTuning) -> u32 {
    let exp = level.saturating_sub(1) as i32;
    ((combat.xp_base as f32) * combat.xp_growth.powi(exp)).round().max(1.0) as u32
}

/// Movement input for one tick
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveInput {
    /// Stick/WASD: x = strafe right, y = forward
    pub axis: Vec2,
    /// Camera yaw the axis is relative to
    pub camera_yaw: f32,
    /// Jump pressed this tick (edge)
    pub jump: bool,
}

/// Read-only world the controller moves through
pub struct MoveWorld<'a> {
    pub terrain: &'a TerrainModel,
    pub obstacles: &'a ObstacleField,
    pub arena: Option<&'a BossArena>,
    pub tier: u32,
}

/// Advance the player by `dt`
pub fn step_player(
    player: &mut Player,
    input: &MoveInput,
    world: &MoveWorld,
    movement: &MovementTuning,
    hazard: &HazardTuning,
    dt: f32,
    events: &mut Vec<SimEvent>,
) {
    let was_grounded = player.grounded;

    // 1. Gravity
    player.velocity.y -= movement.gravity * dt;
    player.position.y += player.velocity.y * dt;

    // 2. Horizontal input sets velocity directly
    let mut horizontal = Vec2::new(player.velocity.x, player.velocity.z);
    let axis = input.axis.clamp_length_max(1.0);
    if axis.length_squared() > 1e-6 {
        let dir = rotate_yaw(axis, input.camera_yaw);
        horizontal = dir * player.stats.speed;
        player.yaw = dir.x.atan2(dir.y);
    } else {
        horizontal *= movement.idle_damping.powf(dt * 60.0);
    }
    let mut pos = flat(player.position) + horizontal * dt;

    // 3. Obstacles
    let (resolved, normal) = world.obstacles.resolve(pos, PLAYER_RADIUS);
    pos = resolved;
    if normal != Vec2::ZERO {
        horizontal = slide_velocity(horizontal, normal);
    }

    // 4. Terrain walls
    let feet = player.position.y;
    let (walled, wall) = resolve_terrain_walls(world.terrain, pos, feet, movement.step_height);
    if wall.is_some() && player.can_climb {
        player.velocity.y = player.velocity.y.max(movement.climb_boost);
    } else {
        pos = walled;
        if let Some(n) = wall {
            horizontal = slide_velocity(horizontal, n);
        }
    }

    // Arena containment
    if let Some(arena) = world.arena.filter(|a| a.active) {
        let (p, v) = arena.clamp(pos, horizontal);
        pos = p;
        horizontal = v;
    }

    player.position.x = pos.x;
    player.position.z = pos.y;
    player.velocity.x = horizontal.x;
    player.velocity.z = horizontal.y;

    // 5. Ground snap
    snap_to_ground(player, world.terrain, movement, was_grounded, dt);

    // 6. Jump
    if input.jump {
        if player.grounded {
            player.velocity.y = movement.jump_strength;
            player.grounded = false;
            player.double_jump_available = true;
        } else if player.double_jump_available {
            player.velocity.y = movement.double_jump_strength;
            player.double_jump_available = false;
        }
    }

    // 7. Hazard
    apply_hazard(player, world, movement, hazard, dt, events);
}

/// Push out of any footprint whose surface is a wall for feet at `feet`.
/// Returns the corrected position and the last wall normal, if any.
fn resolve_terrain_walls(terrain: &TerrainModel, pos: Vec2, feet: f32, step: f32) -> (Vec2, Option<Vec2>) {
    let mut pos = pos;
    let mut wall = None;
    let is_wall = |surface: f32, underside: Option<f32>| {
        feet + step < surface && underside.is_none_or(|u| u <= feet + PLAYER_HEIGHT)
    };

    for piece in terrain.pieces() {
        if !is_wall(piece.height, piece.underside) {
            continue;
        }
        let hit = circle_box(pos, PLAYER_RADIUS, piece.center(), piece.half_extents());
        if hit.hit {
            pos += hit.push();
            wall = Some(hit.normal);
        }
    }

    for ramp in terrain.ramps() {
        let local = ramp.to_local(pos.x, pos.y);
        let half = Vec2::new(ramp.width * 0.5, ramp.length * 0.5);
        let nearest = local.clamp(-half, half);
        if !is_wall(ramp.height_at_local(nearest), None) {
            continue;
        }
        let hit = circle_box(local, PLAYER_RADIUS, Vec2::ZERO, half);
        if hit.hit {
            let push = rotate_yaw(hit.push(), ramp.yaw);
            pos += push;
            wall = Some(rotate_yaw(hit.normal, ramp.yaw));
        }
    }

    (pos, wall)
}

fn snap_to_ground(player: &mut Player, terrain: &TerrainModel, movement: &MovementTuning, was_grounded: bool, dt: f32) {
    let feet = player.position.y;
    let surface = terrain.surface_at(player.position.x, player.position.z, Some(feet), movement.step_height);

    let Some(surface) = surface.filter(|_| player.velocity.y <= 0.0) else {
        player.grounded = false;
        return;
    };

    let below = feet - surface;
    let window = if was_grounded { movement.snap_down } else { movement.ground_epsilon };
    if below > window {
        player.grounded = false;
        return;
    }

    if surface > feet && was_grounded {
        // Stepping up is rate-limited
        player.position.y = surface.min(feet + movement.step_up_speed * dt);
    } else {
        player.position.y = surface;
    }
    player.velocity.y = 0.0;
    player.grounded = true;
}

fn apply_hazard(
    player: &mut Player,
    world: &MoveWorld,
    movement: &MovementTuning,
    hazard: &HazardTuning,
    dt: f32,
    events: &mut Vec<SimEvent>,
) {
    let (x, z) = (player.position.x, player.position.z);
    let burning = world.terrain.in_hazard(x, z, player.position.y, hazard.contact_height);

    if burning {
        let tier_scale = 1.0 + hazard.lava_tier_scale * world.tier.saturating_sub(1) as f32;
        let resist = 1.0 - player.stats.lava_resist.clamp(0.0, 1.0);
        player.health -= hazard.lava_dps * tier_scale * resist * dt;

        // Lava sea bounce
        if !world.terrain.is_ground(x, z) && player.position.y < HAZARD_FLOOR_Y && player.velocity.y < 0.0 {
            player.velocity.y = movement.lava_bounce_impulse;
            player.health -= movement.lava_impact_penalty;
            player.grounded = false;
        }
    } else if player.grounded {
        player.last_safe_position = player.position;
    }

    if burning != player.in_hazard {
        player.in_hazard = burning;
        events.push(if burning { SimEvent::HazardEntered } else { SimEvent::HazardExited });
    }

    if let Err(err) = check_in_world(player.position.y) {
        log::warn!("player {err}, returning to {:?}", player.last_safe_position);
        let safe = player.last_safe_position;
        player.position = safe;
        player.velocity = Vec3::ZERO;
        player.grounded = false;
        events.push(SimEvent::PlayerRecovered { position: safe });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacles::{Obstacle, ObstacleShape};
    use crate::sim::terrain::TerrainPiece;
    use crate::tuning::GameData;

    const DT: f32 = 1.0 / 60.0;

    fn flat_world() -> TerrainModel {
        TerrainModel::new(vec![TerrainPiece::new(0.0, 0.0, 200.0, 200.0, 1.0)], Vec::new()).unwrap()
    }

    fn player_at(pos: Vec3) -> Player {
        let data = GameData::builtin();
        let mut p = Player::new(&data.characters[0], pos, &data.tunables.combat);
        p.grounded = true;
        p
    }

    fn step(player: &mut Player, terrain: &TerrainModel, arena: Option<&BossArena>, input: MoveInput) -> Vec<SimEvent> {
        let data = GameData::builtin();
        let obstacles = ObstacleField::default();
        let world = MoveWorld { terrain, obstacles: &obstacles, arena, tier: 1 };
        let mut events = Vec::new();
        step_player(player, &input, &world, &data.tunables.movement, &data.tunables.hazard, DT, &mut events);
        events
    }

    #[test]
    fn test_standing_player_stays_on_ground() {
        let terrain = flat_world();
        let mut p = player_at(Vec3::new(0.0, 1.0, 0.0));
        for _ in 0..120 {
            step(&mut p, &terrain, None, MoveInput::default());
            assert!(p.grounded);
            assert!((p.position.y - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_grounded_never_below_surface_while_walking_ramp() {
        let terrain = TerrainModel::new(
            vec![
                TerrainPiece::new(0.0, -20.0, 40.0, 20.0, 1.0),
                TerrainPiece::new(0.0, 20.0, 40.0, 20.0, 4.0),
            ],
            vec![crate::sim::terrain::Ramp {
                x: 0.0,
                z: 0.0,
                length: 20.0,
                width: 8.0,
                from_height: 1.0,
                to_height: 4.0,
                yaw: 0.0,
            }],
        )
        .unwrap();
        let mut p = player_at(Vec3::new(0.0, 1.0, -15.0));
        let forward = MoveInput { axis: Vec2::new(0.0, 1.0), ..Default::default() };
        let mut below_ticks = 0;
        for _ in 0..300 {
            step(&mut p, &terrain, None, forward);
            let h = terrain.height_at(p.position.x, p.position.z, Some(p.position.y));
            if p.grounded && p.position.y < h - 1e-3 {
                below_ticks += 1;
                assert!(below_ticks <= 1, "grounded below surface for consecutive ticks");
            } else {
                below_ticks = 0;
            }
        }
        // Walked up onto the high platform
        assert!(p.position.z > 10.0);
        assert!((p.position.y - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_jump_double_jump_and_ignored_third_press() {
        let data = GameData::builtin();
        let m = &data.tunables.movement;
        let terrain = flat_world();
        let mut p = player_at(Vec3::new(0.0, 1.0, 0.0));
        let jump = MoveInput { jump: true, ..Default::default() };

        step(&mut p, &terrain, None, MoveInput::default());
        assert!(p.grounded);

        step(&mut p, &terrain, None, jump);
        assert_eq!(p.velocity.y, m.jump_strength);
        assert!(p.double_jump_available);
        assert!(!p.grounded);

        step(&mut p, &terrain, None, jump);
        assert_eq!(p.velocity.y, m.double_jump_strength);
        assert!(!p.double_jump_available);

        step(&mut p, &terrain, None, jump);
        let expected = m.double_jump_strength - m.gravity * DT;
        assert!((p.velocity.y - expected).abs() < 1e-4);
        assert!(!p.double_jump_available);
    }

    #[test]
    fn test_arena_clamps_player_inside() {
        let terrain = flat_world();
        let arena = BossArena {
            center: Vec2::ZERO,
            radius: 20.0,
            active: true,
            owner: 1,
        };
        let mut p = player_at(Vec3::new(25.0, 1.0, 0.0));
        p.velocity = Vec3::new(5.0, 0.0, 0.0);
        let outward_before = p.velocity.x;
        step(&mut p, &terrain, Some(&arena), MoveInput::default());
        let dist = flat(p.position).length();
        assert!(dist <= 20.0 + 1e-4, "distance {dist}");
        assert!(p.velocity.x < outward_before);
    }

    #[test]
    fn test_wall_pushes_back_and_climber_climbs() {
        let terrain = TerrainModel::new(
            vec![
                TerrainPiece::new(0.0, 0.0, 40.0, 40.0, 1.0),
                // Tall block east of the player
                TerrainPiece::new(6.0, 0.0, 4.0, 4.0, 6.0),
            ],
            Vec::new(),
        )
        .unwrap();
        let east = MoveInput { axis: Vec2::new(1.0, 0.0), ..Default::default() };

        let mut p = player_at(Vec3::new(2.0, 1.0, 0.0));
        for _ in 0..60 {
            step(&mut p, &terrain, None, east);
        }
        assert!(p.position.x <= 4.0 - PLAYER_RADIUS + 1e-3);
        assert!(p.position.y < 1.5);

        let data = GameData::builtin();
        let climber = data.character("climber").unwrap();
        let mut c = Player::new(climber, Vec3::new(3.4, 1.0, 0.0), &data.tunables.combat);
        c.grounded = true;
        step(&mut c, &terrain, None, east);
        assert!(c.velocity.y > 0.0);
    }

    #[test]
    fn test_walk_under_bridge_slab() {
        let terrain = TerrainModel::new(
            vec![
                TerrainPiece::new(0.0, 0.0, 40.0, 40.0, 1.0),
                TerrainPiece::slab(5.0, 0.0, 2.0, 40.0, 6.0, 0.5),
            ],
            Vec::new(),
        )
        .unwrap();
        let mut p = player_at(Vec3::new(0.0, 1.0, 0.0));
        let east = MoveInput { axis: Vec2::new(1.0, 0.0), ..Default::default() };
        for _ in 0..90 {
            step(&mut p, &terrain, None, east);
        }
        assert!(p.position.x > 8.0);
        assert!((p.position.y - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_obstacle_blocks_player() {
        let data = GameData::builtin();
        let terrain = flat_world();
        let obstacles = ObstacleField::new(vec![Obstacle {
            shape: ObstacleShape::Cylinder { radius: 1.0 },
            x: 3.0,
            z: 0.0,
        }]);
        let world = MoveWorld { terrain: &terrain, obstacles: &obstacles, arena: None, tier: 1 };
        let mut p = player_at(Vec3::new(0.0, 1.0, 0.0));
        let east = MoveInput { axis: Vec2::new(1.0, 0.0), ..Default::default() };
        let mut events = Vec::new();
        for _ in 0..60 {
            step_player(&mut p, &east, &world, &data.tunables.movement, &data.tunables.hazard, DT, &mut events);
        }
        assert!(p.position.x <= 3.0 - 1.0 - PLAYER_RADIUS + 1e-3);
    }

    #[test]
    fn test_lava_damage_bounce_and_events() {
        let terrain = TerrainModel::new(vec![TerrainPiece::new(0.0, 0.0, 10.0, 10.0, 1.0)], Vec::new()).unwrap();
        let mut p = player_at(Vec3::new(20.0, -0.5, 0.0));
        p.grounded = false;
        p.velocity.y = -5.0;
        let start = p.health;
        let events = step(&mut p, &terrain, None, MoveInput::default());
        assert!(events.contains(&SimEvent::HazardEntered));
        assert!(p.velocity.y > 0.0);
        assert!(p.health < start - 8.0 + 1e-3);
    }

    #[test]
    fn test_lava_resist_scales_damage() {
        let terrain = TerrainModel::new(vec![TerrainPiece::new(0.0, 0.0, 10.0, 10.0, 1.0)], Vec::new()).unwrap();
        let mut plain = player_at(Vec3::new(20.0, 0.1, 0.0));
        let mut resist = player_at(Vec3::new(20.0, 0.1, 0.0));
        resist.stats.lava_resist = 0.5;
        step(&mut plain, &terrain, None, MoveInput::default());
        step(&mut resist, &terrain, None, MoveInput::default());
        let lost_plain = plain.max_health - plain.health;
        let lost_resist = resist.max_health - resist.health;
        assert!((lost_resist - lost_plain * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_rising_lava_burns_under_bridge_not_on_it() {
        let mut terrain = TerrainModel::new(
            vec![
                TerrainPiece::new(0.0, 0.0, 40.0, 40.0, 1.0),
                TerrainPiece::slab(0.0, 0.0, 4.0, 40.0, 5.0, 0.5),
            ],
            Vec::new(),
        )
        .unwrap();
        terrain.raise_hazard(3.0);

        let mut under = player_at(Vec3::new(0.0, 1.0, 0.0));
        let events = step(&mut under, &terrain, None, MoveInput::default());
        assert!(events.contains(&SimEvent::HazardEntered));
        assert!(under.health < under.max_health);

        let mut above = player_at(Vec3::new(0.0, 5.0, 0.0));
        let events = step(&mut above, &terrain, None, MoveInput::default());
        assert!(!events.contains(&SimEvent::HazardEntered));
        assert_eq!(above.health, above.max_health);
    }

    #[test]
    fn test_jumping_over_gap_does_not_burn() {
        let terrain = TerrainModel::new(vec![TerrainPiece::new(0.0, 0.0, 10.0, 10.0, 1.0)], Vec::new()).unwrap();
        let mut p = player_at(Vec3::new(8.0, 3.0, 0.0));
        p.grounded = false;
        p.velocity.y = 4.0;
        let events = step(&mut p, &terrain, None, MoveInput::default());
        assert!(!events.contains(&SimEvent::HazardEntered));
        assert!(!p.in_hazard);
        assert_eq!(p.health, p.max_health);
    }

    #[test]
    fn test_out_of_bounds_returns_to_safe_position() {
        let terrain = flat_world();
        let mut p = player_at(Vec3::new(0.0, 1.0, 0.0));
        step(&mut p, &terrain, None, MoveInput::default());
        let safe = p.last_safe_position;
        p.position = Vec3::new(0.0, WORLD_FLOOR_Y - 5.0, 0.0);
        p.grounded = false;
        let events = step(&mut p, &terrain, None, MoveInput::default());
        assert_eq!(p.position, safe);
        assert!(events.iter().any(|e| matches!(e, SimEvent::PlayerRecovered { .. })));
    }

    #[test]
    fn test_levelling_and_upgrades() {
        let data = GameData::builtin();
        let combat = &data.tunables.combat;
        let mut p = player_at(Vec3::ZERO);
        assert!(!p.apply_upgrade(Upgrade::Speed));

        let needed = p.xp_to_next;
        assert_eq!(p.grant_xp(needed, combat), 1);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp_to_next, xp_threshold(2, combat));
        assert!(p.xp_to_next > needed);

        assert!(p.apply_upgrade(Upgrade::Weapon(WeaponKind::Seeker)));
        assert_eq!(p.weapons.len(), 2);
        assert_eq!(p.pending_upgrades, 0);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut p = player_at(Vec3::ZERO);
        p.health = p.max_health - 3.0;
        p.heal(10.0);
        assert_eq!(p.health, p.max_health);
    }
}
