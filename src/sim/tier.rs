//! Tier manager and simulation clock
//!
//! Tracks elapsed time, switches a tier into overtime once its time limit
//! passes (raising the lava), and on main-boss defeat tears the world down
//! and rebuilds it for the next tier in one step.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::events::SimEvent;
use super::state::{GameState, SimContext};
use super::worldgen::generate_or_fallback;

/// Simulation time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimClock {
    /// Seconds since the run started
    pub elapsed: f32,
    /// Seconds since the current tier started
    pub tier_elapsed: f32,
    pub tick_count: u64,
}

impl SimClock {
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
        self.tier_elapsed += dt;
        self.tick_count += 1;
    }

    pub fn reset_tier(&mut self) {
        self.tier_elapsed = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TierMode {
    /// Baseline grunt waves
    #[default]
    Calm,
    /// Past the time limit: ghosts, stacking bosses, rising lava
    Overtime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierState {
    pub tier: u32,
    pub mode: TierMode,
    /// Main boss of this tier is dead; the tier ends this tick
    pub boss_defeated: bool,
    pub overtime_elapsed: f32,
}

impl TierState {
    pub fn new(tier: u32) -> Self {
        Self {
            tier: tier.max(1),
            mode: TierMode::Calm,
            boss_defeated: false,
            overtime_elapsed: 0.0,
        }
    }
}

/// Where this tier's main boss is summoned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossLandmark {
    pub position: Vec3,
    /// Main boss is alive
    pub active: bool,
    /// Main boss was defeated
    pub consumed: bool,
}

impl BossLandmark {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            active: false,
            consumed: false,
        }
    }
}

/// Tier phase: completion and overtime checks
pub fn check_tier(state: &mut GameState, ctx: &SimContext, dt: f32) {
    if state.tier.boss_defeated {
        advance_tier(state);
        return;
    }

    let hazard = &ctx.data.tunables.hazard;
    match state.tier.mode {
        TierMode::Calm => {
            if state.clock.tier_elapsed >= ctx.data.tunables.director.time_limit {
                state.tier.mode = TierMode::Overtime;
                state.tier.overtime_elapsed = 0.0;
                let start = state.terrain.min_height() - hazard.overtime_start_depth;
                state.terrain.raise_hazard(start);
                state.events.push(SimEvent::OvertimeStarted { tier: state.tier.tier });
                log::info!("tier {} entered overtime, lava at {start:.2}", state.tier.tier);
            }
        }
        TierMode::Overtime => {
            state.tier.overtime_elapsed += dt;
            let level = state.terrain.min_height() - hazard.overtime_start_depth
                + hazard.rise_rate * state.tier.overtime_elapsed;
            state.terrain.raise_hazard(level);
        }
    }
}

/// Tear down the current tier and build the next one. Nothing from the old
/// world survives: terrain, obstacles, entities, projectiles, pickups, queued
/// hits and spawns, the arena and the director timers are all replaced.
pub fn advance_tier(state: &mut GameState) {
    let completed = state.tier.tier;
    let next = completed + 1;
    let (layout, terrain, obstacles) = generate_or_fallback(state.seed, next);

    state.terrain = terrain;
    state.obstacles = obstacles;
    state.entities.clear();
    state.projectiles.clear();
    state.pickups.clear();
    state.pending_hits.clear();
    state.spawn_queue.clear();
    state.arena = None;
    state.director.reset();
    state.clock.reset_tier();
    state.tier = TierState::new(next);
    state.landmark = BossLandmark::new(layout.landmark);
    state.player.respawn_at(layout.spawn);

    state.events.push(SimEvent::TierCompleted { completed, next });
    log::info!("tier {completed} complete, now on tier {next}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::combat::Projectile;
    use crate::sim::director::{SpawnRequest, spawn_entity};
    use crate::sim::entity::{BossArchetype, GruntKind};
    use crate::tuning::GameData;

    #[test]
    fn test_clock_tracks_run_and_tier_time() {
        let mut clock = SimClock::default();
        for _ in 0..60 {
            clock.advance(1.0 / 60.0);
        }
        clock.reset_tier();
        clock.advance(0.5);
        assert!((clock.elapsed - 1.5).abs() < 1e-4);
        assert!((clock.tier_elapsed - 0.5).abs() < 1e-6);
        assert_eq!(clock.tick_count, 61);
    }

    #[test]
    fn test_tier_transition_clears_world() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);

        spawn_entity(&mut state, &ctx, SpawnRequest::Grunt { kind: GruntKind::Brute, position: Vec3::ZERO }).unwrap();
        let landmark_pos = state.landmark.position;
        spawn_entity(
            &mut state,
            &ctx,
            SpawnRequest::MainBoss { archetype: BossArchetype::Warden, position: landmark_pos },
        )
        .unwrap();
        state
            .projectiles
            .push(Projectile::enemy(Vec3::ONE, Vec3::X, 5.0, 1.0, 3.0, 0.3));
        state.tier.boss_defeated = true;
        state.clock.tier_elapsed = 100.0;

        check_tier(&mut state, &ctx, 1.0 / 60.0);

        assert!(state.entities.is_empty());
        assert!(state.projectiles.is_empty());
        assert!(state.pickups.is_empty());
        assert!(state.arena.is_none());
        assert!(!state.landmark.active && !state.landmark.consumed);
        assert_eq!(state.tier.tier, 2);
        assert!(!state.tier.boss_defeated);
        assert_eq!(state.clock.tier_elapsed, 0.0);
        assert!(state.events.contains(&SimEvent::TierCompleted { completed: 1, next: 2 }));

        // The player stands on the new world's ground
        let p = state.player.position;
        assert!(state.terrain.is_ground(p.x, p.z));
        assert!(!state.terrain.is_hazard(state.landmark.position.x, state.landmark.position.z));
    }

    #[test]
    fn test_overtime_raises_lava_monotonically() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        let dt = 1.0;
        state.clock.tier_elapsed = data.tunables.director.time_limit;

        check_tier(&mut state, &ctx, dt);
        assert_eq!(state.tier.mode, TierMode::Overtime);
        let start = state.terrain.hazard_level().unwrap();
        assert!(start < state.terrain.min_height());
        assert!(!state.terrain.is_hazard(0.0, 0.0));

        let mut last = start;
        for _ in 0..100 {
            check_tier(&mut state, &ctx, dt);
            let level = state.terrain.hazard_level().unwrap();
            assert!(level >= last);
            last = level;
        }
        assert!(last > start);

        // Long enough and the lava swallows the platform
        state.tier.overtime_elapsed = 1.0e4;
        check_tier(&mut state, &ctx, dt);
        assert!(state.terrain.is_hazard(0.0, 0.0));
    }

    #[test]
    fn test_no_overtime_before_limit() {
        let data = GameData::builtin();
        let settings = Settings::default();
        let ctx = SimContext::new(&data, &settings);
        let mut state = GameState::for_tests(&ctx);
        state.clock.tier_elapsed = data.tunables.director.time_limit - 1.0;
        check_tier(&mut state, &ctx, 0.5);
        assert_eq!(state.tier.mode, TierMode::Calm);
        assert!(state.terrain.hazard_level().is_none());
    }
}
