//! Game state and core simulation types
//!
//! Everything one tier of a run needs lives in `GameState`. Immutable data
//! tables and settings are passed alongside it in `SimContext`.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::BossArena;
use super::combat::{PendingHit, Pickup, Projectile};
use super::controller::Player;
use super::director::{EntityDirector, SpawnRequest};
use super::entity::{Entity, EntityId};
use super::events::SimEvent;
use super::obstacles::ObstacleField;
use super::terrain::TerrainModel;
use super::tier::{BossLandmark, SimClock, TierState};
use super::worldgen::{WorldLayout, generate_or_fallback};
use crate::error::SimError;
use crate::settings::Settings;
use crate::tuning::{CharacterDef, GameData};

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Player died
    GameOver,
}

/// Read-only data handed to every phase of the tick
#[derive(Debug, Clone, Copy)]
pub struct SimContext<'a> {
    pub data: &'a GameData,
    pub settings: &'a Settings,
}

impl<'a> SimContext<'a> {
    pub fn new(data: &'a GameData, settings: &'a Settings) -> Self {
        Self { data, settings }
    }
}

/// Complete simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed; world generation derives per-tier seeds from it
    pub seed: u64,
    pub phase: GamePhase,
    pub clock: SimClock,
    pub tier: TierState,
    pub player: Player,
    /// Live entities, in spawn order
    pub entities: Vec<Entity>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub terrain: TerrainModel,
    pub obstacles: ObstacleField,
    /// At most one arena per tier
    pub arena: Option<BossArena>,
    pub landmark: BossLandmark,
    pub director: EntityDirector,
    /// Player damage queued by the AI phase for the combat phase
    #[serde(skip)]
    pub pending_hits: Vec<PendingHit>,
    /// Spawns requested mid-tick (boss guards), applied in the spawn phase
    #[serde(skip)]
    pub spawn_queue: Vec<SpawnRequest>,
    /// Events raised since the host last drained them
    #[serde(skip)]
    pub events: Vec<SimEvent>,
    pub rng: Pcg32,
    /// Next entity/pickup ID
    next_id: u32,
}

impl GameState {
    /// Start a run on `tier` with the named character
    pub fn new(ctx: &SimContext, seed: u64, tier: u32, character: &str) -> Result<Self, SimError> {
        let def = ctx
            .data
            .character(character)
            .ok_or_else(|| SimError::Configuration("no characters defined".into()))?;
        let (layout, terrain, obstacles) = generate_or_fallback(seed, tier.max(1));
        log::info!("starting run: seed={seed} tier={} character={}", tier.max(1), def.id);
        Ok(Self::from_world(ctx, seed, tier, def, &layout, terrain, obstacles))
    }

    fn from_world(
        ctx: &SimContext,
        seed: u64,
        tier: u32,
        def: &CharacterDef,
        layout: &WorldLayout,
        terrain: TerrainModel,
        obstacles: ObstacleField,
    ) -> Self {
        Self {
            seed,
            phase: GamePhase::Playing,
            clock: SimClock::default(),
            tier: TierState::new(tier),
            player: Player::new(def, layout.spawn, &ctx.data.tunables.combat),
            entities: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            terrain,
            obstacles,
            arena: None,
            landmark: BossLandmark::new(layout.landmark),
            director: EntityDirector::new(),
            pending_hits: Vec::new(),
            spawn_queue: Vec::new(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Take the events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn main_boss(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_main_boss())
    }

    /// Single flat platform, player standing at the centre, nothing spawned
    #[cfg(test)]
    pub(crate) fn for_tests(ctx: &SimContext) -> Self {
        let layout = WorldLayout::fallback();
        let terrain = TerrainModel::new(layout.platforms.clone(), Vec::new()).unwrap();
        let def = ctx.data.character("ranger").unwrap();
        let mut state = Self::from_world(ctx, 0x5EED, 1, def, &layout, terrain, ObstacleField::default());
        state.player.grounded = true;
        state
    }
}
