//! Data-driven game balance
//!
//! Definition tables (characters, enemies, bosses, weapons) and every
//! empirically chosen threshold live here as named values. Loaded once at
//! startup and handed to the tick by reference through `SimContext`.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::combat::ProjectileBehavior;
use crate::sim::controller::PlayerStats;
use crate::sim::entity::{AttackPattern, BossArchetype, GruntKind};
use crate::sim::weapons::WeaponKind;

/// Character controller tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Downward acceleration (units/s²)
    pub gravity: f32,
    pub jump_strength: f32,
    pub double_jump_strength: f32,
    /// Horizontal velocity kept per 1/60 s with no input
    pub idle_damping: f32,
    /// Feet within this of the surface count as grounded
    pub ground_epsilon: f32,
    /// How far below the feet a surface still snaps the player down
    pub snap_down: f32,
    /// Taller rises than this are walls
    pub step_height: f32,
    /// Rate-limit for stepping up onto higher ground (units/s)
    pub step_up_speed: f32,
    /// Upward velocity granted to climbers pressing into a wall
    pub climb_boost: f32,
    /// Upward velocity after touching the lava sea
    pub lava_bounce_impulse: f32,
    /// One-time health loss for each lava bounce
    pub lava_impact_penalty: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            gravity: 32.0,
            jump_strength: 11.0,
            double_jump_strength: 9.5,
            idle_damping: 0.8,
            ground_epsilon: 0.05,
            snap_down: 0.6,
            step_height: crate::consts::PLAYER_STEP_TOLERANCE,
            step_up_speed: 72.0,
            climb_boost: 7.0,
            lava_bounce_impulse: 18.0,
            lava_impact_penalty: 8.0,
        }
    }
}

/// Lava and rising-hazard tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    /// Lava damage per second at tier 1
    pub lava_dps: f32,
    /// Extra lava dps fraction per tier above 1
    pub lava_tier_scale: f32,
    /// Overtime hazard starts this far below the lowest platform
    pub overtime_start_depth: f32,
    /// Overtime hazard rise (units/s)
    pub rise_rate: f32,
    /// Feet within this height above the lava surface are touching it
    pub contact_height: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            lava_dps: 12.0,
            lava_tier_scale: 0.5,
            overtime_start_depth: 1.0,
            rise_rate: 0.05,
            contact_height: 0.25,
        }
    }
}

/// Spawn director tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorTuning {
    /// Wave interval at level 1, tier start
    pub base_interval: f32,
    /// Hard floor on the wave interval
    pub min_interval: f32,
    /// Interval shrink per player level
    pub level_factor: f32,
    pub min_level_factor: f32,
    /// Tier time over which the interval ramps down
    pub time_ramp: f32,
    pub min_time_factor: f32,
    /// Grunts per wave
    pub batch_size: u32,
    /// Spawn ring radius around the player
    pub ring_distance: f32,
    pub placement_attempts: u32,
    /// Cap on live non-boss entities
    pub max_live: usize,
    /// HP added per player level
    pub level_scale: f32,
    /// Exponential HP growth per tier step
    pub tier_multiplier: f32,
    /// Damage added per player level
    pub damage_level_scale: f32,
    /// Exponential damage growth per tier step
    pub damage_tier_multiplier: f32,
    /// Tier time before overtime begins
    pub time_limit: f32,
    /// Tier times at which a miniboss spawns if none is active
    pub miniboss_checkpoints: Vec<f32>,
    /// Player distance to the landmark that summons the main boss
    pub boss_trigger_distance: f32,
    pub arena_radius: f32,
    pub ghost_base_interval: f32,
    pub ghost_min_interval: f32,
    /// Ghost interval shrink per second of overtime
    pub ghost_shrink_rate: f32,
    pub overtime_boss_interval: f32,
    pub overtime_boss_hp: f32,
    pub overtime_boss_damage: f32,
    /// Each overtime boss is this many times the previous one
    pub overtime_boss_stack: f32,
}

impl Default for DirectorTuning {
    fn default() -> Self {
        Self {
            base_interval: 1.6,
            min_interval: 0.2,
            level_factor: 0.035,
            min_level_factor: 0.3,
            time_ramp: 480.0,
            min_time_factor: 0.4,
            batch_size: 3,
            ring_distance: 24.0,
            placement_attempts: 12,
            max_live: 120,
            level_scale: 2.5,
            tier_multiplier: 15.0,
            damage_level_scale: 0.15,
            damage_tier_multiplier: 1.6,
            time_limit: 900.0,
            miniboss_checkpoints: vec![240.0, 480.0, 720.0],
            boss_trigger_distance: 14.0,
            arena_radius: 28.0,
            ghost_base_interval: 4.0,
            ghost_min_interval: 0.5,
            ghost_shrink_rate: 0.02,
            overtime_boss_interval: 60.0,
            overtime_boss_hp: 50_000.0,
            overtime_boss_damage: 40.0,
            overtime_boss_stack: 2.0,
        }
    }
}

/// Per-entity AI tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Rise-in duration
    pub spawn_duration: f32,
    pub wander_strength: f32,
    pub wander_frequency: f32,
    /// Melee reach beyond touching distance
    pub melee_reach: f32,
    pub attack_interval: f32,
    pub flyer_hover: f32,
    /// Beyond this distance from the player the stuck watchdog runs
    pub stuck_distance: f32,
    pub stuck_timeout: f32,
    /// Relocation ring used by the watchdog
    pub unstuck_ring: f32,
    pub boss_first_pattern_delay: f32,
    pub boss_preferred_distance: f32,
    pub boss_teleport_distance: f32,
    pub boss_teleport_ring: f32,
    pub teleport_duration: f32,
    pub slam_telegraph: f32,
    pub slam_radius: f32,
    pub burst_radius: f32,
    pub barrage_shots: u32,
    pub barrage_shot_interval: f32,
    pub volley_count: u32,
    /// Total fan angle of a volley (radians)
    pub volley_spread: f32,
    pub enemy_projectile_speed: f32,
    pub enemy_projectile_ttl: f32,
    pub enemy_projectile_radius: f32,
    /// Time between shield cycles
    pub shield_interval: f32,
    pub guard_ring: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            spawn_duration: 0.8,
            wander_strength: 0.45,
            wander_frequency: 1.3,
            melee_reach: 0.6,
            attack_interval: 1.0,
            flyer_hover: 2.5,
            stuck_distance: 40.0,
            stuck_timeout: 20.0,
            unstuck_ring: 14.0,
            boss_first_pattern_delay: 2.5,
            boss_preferred_distance: 6.0,
            boss_teleport_distance: 35.0,
            boss_teleport_ring: 9.0,
            teleport_duration: 0.4,
            slam_telegraph: 1.0,
            slam_radius: 5.0,
            burst_radius: 7.0,
            barrage_shots: 10,
            barrage_shot_interval: 0.12,
            volley_count: 8,
            volley_spread: 1.2,
            enemy_projectile_speed: 14.0,
            enemy_projectile_ttl: 4.0,
            enemy_projectile_radius: 0.4,
            shield_interval: 30.0,
            guard_ring: 8.0,
        }
    }
}

/// Damage, loot and projectile tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub crit_multiplier: f32,
    /// Armor never mitigates more than this fraction
    pub mitigation_cap: f32,
    /// Area damage never falls below this fraction
    pub area_min_falloff: f32,
    /// XP orbs per kill before scaling
    pub loot_orbs: u32,
    pub currency_per_kill: u32,
    /// Extra loot per player level (fraction)
    pub loot_level_scale: f32,
    pub boss_loot_multiplier: f32,
    pub pickup_magnet_radius: f32,
    pub pickup_ttl: f32,
    /// XP needed for level 2
    pub xp_base: u32,
    pub xp_growth: f32,
    /// Homing steering rate (radians/s)
    pub homing_turn_rate: f32,
    /// Boomerang catch distance on return
    pub boomerang_catch: f32,
    /// Auto-fire targeting range
    pub weapon_range: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            crit_multiplier: 2.0,
            mitigation_cap: 0.9,
            area_min_falloff: 0.25,
            loot_orbs: 1,
            currency_per_kill: 1,
            loot_level_scale: 0.05,
            boss_loot_multiplier: 10.0,
            pickup_magnet_radius: 3.0,
            pickup_ttl: 60.0,
            xp_base: 10,
            xp_growth: 1.25,
            homing_turn_rate: 6.0,
            boomerang_catch: 1.2,
            weapon_range: 28.0,
        }
    }
}

/// All named tunables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub movement: MovementTuning,
    pub hazard: HazardTuning,
    pub director: DirectorTuning,
    pub ai: AiTuning,
    pub combat: CombatTuning,
}

/// Grunt/ghost definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDef {
    pub base_hp: f32,
    pub base_damage: f32,
    pub speed: f32,
    pub size: f32,
    pub armor: f32,
    pub xp_value: u32,
}

/// Enemy table, one entry per ordinary enemy kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyTable {
    pub crawler: EnemyDef,
    pub charger: EnemyDef,
    pub brute: EnemyDef,
    pub ghost: EnemyDef,
}

impl EnemyTable {
    pub fn grunt(&self, kind: GruntKind) -> &EnemyDef {
        match kind {
            GruntKind::Crawler => &self.crawler,
            GruntKind::Charger => &self.charger,
            GruntKind::Brute => &self.brute,
        }
    }
}

/// Boss definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossDef {
    pub base_hp: f32,
    pub damage: f32,
    pub speed: f32,
    pub size: f32,
    pub armor: f32,
    pub xp_value: u32,
    /// Fixed attack cycle
    pub patterns: Vec<AttackPattern>,
    /// Idle time between patterns
    pub pattern_cooldown: f32,
    pub teleport_cooldown: f32,
    /// Cycles an invulnerability shield guarded by a Sentinel
    pub shielded: bool,
}

/// Boss table, one entry per archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossTable {
    pub warden: BossDef,
    pub tempest: BossDef,
    pub colossus: BossDef,
    pub sentinel: BossDef,
    pub juggernaut: BossDef,
}

impl BossTable {
    pub fn get(&self, archetype: BossArchetype) -> &BossDef {
        match archetype {
            BossArchetype::Warden => &self.warden,
            BossArchetype::Tempest => &self.tempest,
            BossArchetype::Colossus => &self.colossus,
            BossArchetype::Sentinel => &self.sentinel,
            BossArchetype::Juggernaut => &self.juggernaut,
        }
    }
}

/// Weapon definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponDef {
    pub damage: f32,
    pub cooldown: f32,
    pub speed: f32,
    pub ttl: f32,
    pub radius: f32,
    pub behavior: ProjectileBehavior,
    /// Explosion radius for area weapons
    pub area_radius: f32,
}

/// Weapon table, one entry per weapon kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponTable {
    pub bolt: WeaponDef,
    pub seeker: WeaponDef,
    pub glaive: WeaponDef,
    pub mortar: WeaponDef,
}

impl WeaponTable {
    pub fn get(&self, kind: WeaponKind) -> &WeaponDef {
        match kind {
            WeaponKind::Bolt => &self.bolt,
            WeaponKind::Seeker => &self.seeker,
            WeaponKind::Glaive => &self.glaive,
            WeaponKind::Mortar => &self.mortar,
        }
    }
}

/// Playable character definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterDef {
    pub id: String,
    pub stats: PlayerStats,
    pub max_health: f32,
    /// Walls grant a vertical boost instead of pushing back
    pub can_climb: bool,
    pub starting_weapon: WeaponKind,
}

/// Immutable data tables, loaded once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    #[serde(default)]
    pub tunables: Tunables,
    pub characters: Vec<CharacterDef>,
    pub enemies: EnemyTable,
    pub bosses: BossTable,
    pub weapons: WeaponTable,
}

impl Default for GameData {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GameData {
    /// Parse tables from JSON, rejecting unusable data
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let data: GameData = serde_json::from_str(json)
            .map_err(|e| SimError::Configuration(format!("game data: {e}")))?;
        data.validate()?;
        Ok(data)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.characters.is_empty() {
            return Err(SimError::Configuration("no characters defined".into()));
        }
        for (name, def) in [
            ("warden", &self.bosses.warden),
            ("tempest", &self.bosses.tempest),
            ("colossus", &self.bosses.colossus),
            ("sentinel", &self.bosses.sentinel),
            ("juggernaut", &self.bosses.juggernaut),
        ] {
            if def.patterns.is_empty() {
                return Err(SimError::Configuration(format!("boss {name} has no attack patterns")));
            }
        }
        let cap = self.tunables.combat.mitigation_cap;
        if !(0.0..1.0).contains(&cap) {
            return Err(SimError::Configuration(format!("mitigation cap {cap} must be in [0, 1)")));
        }
        Ok(())
    }

    /// Look up a character by id, falling back to the first entry
    pub fn character(&self, id: &str) -> Option<&CharacterDef> {
        self.characters
            .iter()
            .find(|c| c.id == id)
            .or_else(|| self.characters.first())
    }

    /// Built-in balance tables
    pub fn builtin() -> Self {
        use AttackPattern::*;

        #[allow(clippy::too_many_arguments)]
        fn boss(
            base_hp: f32,
            damage: f32,
            speed: f32,
            size: f32,
            patterns: Vec<AttackPattern>,
            pattern_cooldown: f32,
            teleport_cooldown: f32,
            shielded: bool,
        ) -> BossDef {
            BossDef {
                base_hp,
                damage,
                speed,
                size,
                armor: 0.1,
                xp_value: 50,
                patterns,
                pattern_cooldown,
                teleport_cooldown,
                shielded,
            }
        }

        Self {
            tunables: Tunables::default(),
            characters: vec![
                CharacterDef {
                    id: "ranger".into(),
                    stats: PlayerStats::default(),
                    max_health: 100.0,
                    can_climb: false,
                    starting_weapon: WeaponKind::Bolt,
                },
                CharacterDef {
                    id: "climber".into(),
                    stats: PlayerStats {
                        speed: 7.5,
                        armor: 0.05,
                        ..PlayerStats::default()
                    },
                    max_health: 85.0,
                    can_climb: true,
                    starting_weapon: WeaponKind::Glaive,
                },
                CharacterDef {
                    id: "alchemist".into(),
                    stats: PlayerStats {
                        speed: 6.5,
                        area_mult: 1.3,
                        lava_resist: 0.5,
                        ..PlayerStats::default()
                    },
                    max_health: 110.0,
                    can_climb: false,
                    starting_weapon: WeaponKind::Mortar,
                },
            ],
            enemies: EnemyTable {
                crawler: EnemyDef { base_hp: 5.0, base_damage: 4.0, speed: 3.2, size: 0.6, armor: 0.0, xp_value: 1 },
                charger: EnemyDef { base_hp: 3.0, base_damage: 3.0, speed: 5.5, size: 0.5, armor: 0.0, xp_value: 1 },
                brute: EnemyDef { base_hp: 20.0, base_damage: 9.0, speed: 2.2, size: 1.1, armor: 0.2, xp_value: 4 },
                ghost: EnemyDef { base_hp: 8.0, base_damage: 6.0, speed: 6.0, size: 0.7, armor: 0.0, xp_value: 2 },
            },
            bosses: BossTable {
                warden: boss(2500.0, 18.0, 3.0, 2.2, vec![Volley, Slam, Volley, Burst], 2.2, 6.0, true),
                tempest: boss(2000.0, 14.0, 4.0, 1.8, vec![Barrage, Burst, Barrage, Volley], 1.6, 4.0, false),
                colossus: boss(600.0, 20.0, 2.4, 2.0, vec![Slam, Burst], 3.0, 8.0, false),
                sentinel: boss(300.0, 10.0, 3.0, 1.3, vec![Volley], 3.5, 8.0, false),
                juggernaut: boss(50_000.0, 40.0, 3.5, 2.6, vec![Slam, Barrage, Burst], 2.0, 5.0, false),
            },
            weapons: WeaponTable {
                bolt: WeaponDef { damage: 6.0, cooldown: 0.45, speed: 30.0, ttl: 1.2, radius: 0.3, behavior: ProjectileBehavior::Straight, area_radius: 0.0 },
                seeker: WeaponDef { damage: 4.0, cooldown: 0.8, speed: 18.0, ttl: 2.5, radius: 0.35, behavior: ProjectileBehavior::Homing, area_radius: 0.0 },
                glaive: WeaponDef { damage: 5.0, cooldown: 1.4, speed: 20.0, ttl: 3.0, radius: 0.6, behavior: ProjectileBehavior::Boomerang { return_after: 0.6 }, area_radius: 0.0 },
                mortar: WeaponDef { damage: 12.0, cooldown: 1.8, speed: 16.0, ttl: 1.5, radius: 0.4, behavior: ProjectileBehavior::AreaOnImpact, area_radius: 4.0 },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_validates() {
        assert!(GameData::builtin().validate().is_ok());
    }

    #[test]
    fn test_named_thresholds_keep_reference_values() {
        let t = Tunables::default();
        assert_eq!(t.ai.stuck_timeout, 20.0);
        assert_eq!(t.director.tier_multiplier, 15.0);
        assert_eq!(t.combat.mitigation_cap, 0.9);
    }

    #[test]
    fn test_json_roundtrip_and_partial_tunables() {
        let json = serde_json::to_string(&GameData::builtin()).unwrap();
        let data = GameData::from_json(&json).unwrap();
        assert_eq!(data.characters.len(), 3);

        // Missing tunable groups fall back to defaults
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["tunables"] = serde_json::json!({ "ai": { "stuck_timeout": 5.0 } });
        let data = GameData::from_json(&value.to_string()).unwrap();
        assert_eq!(data.tunables.ai.stuck_timeout, 5.0);
        assert_eq!(data.tunables.ai.spawn_duration, 0.8);
        assert_eq!(data.tunables.director.tier_multiplier, 15.0);
    }

    #[test]
    fn test_rejects_bad_tables() {
        let mut data = GameData::builtin();
        data.characters.clear();
        assert!(matches!(data.validate(), Err(SimError::Configuration(_))));

        let mut data = GameData::builtin();
        data.bosses.tempest.patterns.clear();
        assert!(data.validate().is_err());

        assert!(GameData::from_json("{ not json").is_err());
    }

    #[test]
    fn test_character_lookup_falls_back() {
        let data = GameData::builtin();
        assert!(data.character("climber").is_some_and(|c| c.can_climb));
        assert_eq!(data.character("nobody").map(|c| c.id.as_str()), Some("ranger"));
    }
}
