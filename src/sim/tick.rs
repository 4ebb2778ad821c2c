//! Fixed timestep simulation tick
//!
//! Phases run to completion in a fixed order every tick:
//! movement, AI, combat, spawn, tier check. An entity spawned this tick
//! first acts next tick, and one removed this tick never acts again.

use glam::Vec2;

use super::ai::update_ai;
use super::combat::resolve_combat;
use super::controller::{MoveInput, MoveWorld, Upgrade, step_player};
use super::director::run_spawn_phase;
use super::events::SimEvent;
use super::state::{GamePhase, GameState, SimContext};
use super::tier::check_tier;
use super::weapons::fire_weapons;
use crate::consts::MAX_FRAME_DT;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement stick, relative to the camera
    pub axis: Vec2,
    pub camera_yaw: f32,
    /// Jump pressed this tick
    pub jump: bool,
    /// Pause toggle
    pub pause: bool,
    /// Level-up choice made by the UI
    pub upgrade: Option<Upgrade>,
}

/// Advance the game state by one timestep
pub fn tick(state: &mut GameState, ctx: &SimContext, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, MAX_FRAME_DT);

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }
    if state.phase != GamePhase::Playing {
        return;
    }

    state.clock.advance(dt);

    if let Some(upgrade) = input.upgrade
        && !state.player.apply_upgrade(upgrade)
    {
        log::debug!("upgrade {upgrade:?} ignored, no level-up pending");
    }

    // Movement
    let tunables = &ctx.data.tunables;
    let world = MoveWorld {
        terrain: &state.terrain,
        obstacles: &state.obstacles,
        arena: state.arena.as_ref(),
        tier: state.tier.tier,
    };
    let move_input = MoveInput {
        axis: input.axis,
        camera_yaw: input.camera_yaw,
        jump: input.jump,
    };
    step_player(
        &mut state.player,
        &move_input,
        &world,
        &tunables.movement,
        &tunables.hazard,
        dt,
        &mut state.events,
    );

    // AI
    update_ai(state, ctx, dt);

    // Combat
    resolve_combat(state, ctx, dt);
    fire_weapons(state, ctx, dt);

    if !state.player.is_alive() {
        state.phase = GamePhase::GameOver;
        state.events.push(SimEvent::PlayerDied);
        log::info!(
            "player died on tier {} at level {} after {:.1}s",
            state.tier.tier,
            state.player.level,
            state.clock.elapsed
        );
        return;
    }

    // Spawn
    run_spawn_phase(state, ctx, dt);

    // Tier check
    check_tier(state, ctx, dt);
}
