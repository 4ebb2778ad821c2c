//! Read-only surfaces for the rendering and multiplayer collaborators
//!
//! The renderer gets a per-tick view keyed by entity id; it keeps its own
//! id-to-visual table. The multiplayer collaborator gets a fixed-size
//! `Pod` record of the local player and hands back records from peers.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::combat::Faction;
use super::entity::{AiState, BossPhase, Entity, EntityId, EntityTag};
use super::state::GameState;

/// Animation state the renderer should play
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnimPhase {
    /// Rising out of the ground, 0..1
    Rising(f32),
    Moving,
    Attacking,
    Idle,
    Teleporting,
    Shielded,
    Defeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub tag: EntityTag,
    pub position: Vec3,
    /// Facing (radians about +Y)
    pub yaw: f32,
    pub hp_ratio: f32,
    pub anim: AnimPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub position: Vec3,
    pub yaw: f32,
    pub hp_ratio: f32,
    pub grounded: bool,
    pub level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub position: Vec3,
    pub radius: f32,
    pub hostile: bool,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderView {
    pub tick: u64,
    pub player: PlayerView,
    pub entities: Vec<EntityView>,
    pub projectiles: Vec<ProjectileView>,
    pub hazard_level: Option<f32>,
    /// Arena centre and radius while active
    pub arena: Option<(Vec3, f32)>,
}

fn anim_phase(e: &Entity) -> AnimPhase {
    if !e.is_active() {
        return AnimPhase::Rising(e.spawn_progress.clamp(0.0, 1.0));
    }
    if let Some(brain) = e.boss() {
        if brain.shield_active {
            return AnimPhase::Shielded;
        }
        return match brain.phase {
            BossPhase::Idle => AnimPhase::Moving,
            BossPhase::Attack(_) => AnimPhase::Attacking,
            BossPhase::Teleporting => AnimPhase::Teleporting,
            BossPhase::Shielded => AnimPhase::Shielded,
            BossPhase::Defeated => AnimPhase::Defeated,
        };
    }
    match e.ai_state {
        AiState::Spawning => AnimPhase::Rising(e.spawn_progress),
        AiState::Attacking => AnimPhase::Attacking,
        AiState::Chasing if e.velocity.length_squared() > 1e-4 => AnimPhase::Moving,
        AiState::Chasing => AnimPhase::Idle,
    }
}

/// Build this tick's render view
pub fn render_view(state: &GameState) -> RenderView {
    let p = &state.player;
    RenderView {
        tick: state.clock.tick_count,
        player: PlayerView {
            position: p.position,
            yaw: p.yaw,
            hp_ratio: p.hp_ratio(),
            grounded: p.grounded,
            level: p.level,
        },
        entities: state
            .entities
            .iter()
            .map(|e| EntityView {
                id: e.id,
                tag: e.tag(),
                position: e.position,
                yaw: e.velocity.x.atan2(e.velocity.z),
                hp_ratio: e.hp_ratio(),
                anim: anim_phase(e),
            })
            .collect(),
        projectiles: state
            .projectiles
            .iter()
            .map(|pr| ProjectileView {
                position: pr.position,
                radius: pr.radius,
                hostile: pr.faction == Faction::Enemy,
            })
            .collect(),
        hazard_level: state.terrain.hazard_level(),
        arena: state
            .arena
            .filter(|a| a.active)
            .map(|a| (crate::at_height(a.center, state.landmark.position.y), a.radius)),
    }
}

/// Local player record published to peers
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PlayerSnapshot {
    pub position: [f32; 3],
    pub yaw: f32,
    pub health: f32,
    pub level: u32,
    /// Sender's tick, for ordering
    pub tick: u32,
}

impl PlayerSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let p = &state.player;
        Self {
            position: p.position.to_array(),
            yaw: p.yaw,
            health: p.health,
            level: p.level,
            tick: state.clock.tick_count as u32,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(self).to_vec()
    }

    /// `None` on a short or oversized buffer
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Emits a snapshot at a fixed cadence
#[derive(Debug, Clone)]
pub struct SnapshotPublisher {
    interval: f32,
    timer: f32,
}

impl SnapshotPublisher {
    /// `rate` in snapshots per second
    pub fn new(rate: f32) -> Self {
        Self {
            interval: 1.0 / rate.max(0.1),
            timer: 0.0,
        }
    }

    pub fn poll(&mut self, dt: f32, state: &GameState) -> Option<PlayerSnapshot> {
        self.timer += dt;
        if self.timer < self.interval {
            return None;
        }
        self.timer %= self.interval;
        Some(PlayerSnapshot::capture(state))
    }
}

/// Latest snapshot per remote peer; used only to drive visual proxies
#[derive(Debug, Clone, Default)]
pub struct RemotePlayers {
    peers: HashMap<u32, PlayerSnapshot>,
}

impl RemotePlayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the newest snapshot; stale ones are dropped. Returns whether it was kept.
    pub fn accept(&mut self, peer: u32, snapshot: PlayerSnapshot) -> bool {
        match self.peers.get(&peer) {
            Some(current) if current.tick > snapshot.tick => false,
            _ => {
                self.peers.insert(peer, snapshot);
                true
            }
        }
    }

    pub fn get(&self, peer: u32) -> Option<&PlayerSnapshot> {
        self.peers.get(&peer)
    }

    pub fn remove(&mut self, peer: u32) {
        self.peers.remove(&peer);
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Peers in id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &PlayerSnapshot)> {
        let mut ids: Vec<u32> = self.peers.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.peers.get(&id).map(|s| (id, s)))
    }
}
