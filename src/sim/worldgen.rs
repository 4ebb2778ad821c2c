//! Procedural tier layout
//!
//! A grid of platforms at varied heights linked by ramps, a floating bridge
//! over the central plaza, scattered obstacles and one boss landmark in a far
//! corner. The core only consumes the geometry lists.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

use super::obstacles::{Obstacle, ObstacleField, ObstacleShape};
use super::terrain::{Ramp, TerrainModel, TerrainPiece};
use crate::error::SimError;

/// Cells per side
const GRID: i32 = 5;
/// Distance between cell centres
const CELL_SPACING: f32 = 24.0;
const PLAZA_HEIGHT: f32 = 1.0;
const PLAZA_SIZE: f32 = 20.0;
/// Ramps run this far onto each platform
const RAMP_OVERLAP: f32 = 1.0;
const RAMP_WIDTH: f32 = 5.0;
/// Chance an optional cross-link ramp is left out
const SKIP_LINK_CHANCE: f32 = 0.3;
const BRIDGE_CLEARANCE: f32 = 4.0;

/// One tier's generated geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldLayout {
    pub platforms: Vec<TerrainPiece>,
    pub ramps: Vec<Ramp>,
    pub obstacles: Vec<Obstacle>,
    /// Where the main boss is summoned
    pub landmark: Vec3,
    /// Player start (feet)
    pub spawn: Vec3,
}

impl WorldLayout {
    /// Minimal safe world: one wide platform
    pub fn fallback() -> Self {
        Self {
            platforms: vec![TerrainPiece::new(0.0, 0.0, 40.0, 40.0, PLAZA_HEIGHT)],
            ramps: Vec::new(),
            obstacles: Vec::new(),
            landmark: Vec3::new(0.0, PLAZA_HEIGHT, 15.0),
            spawn: Vec3::new(0.0, PLAZA_HEIGHT, 0.0),
        }
    }

    /// Reject layouts the tick cannot run on
    pub fn validate(&self) -> Result<(), SimError> {
        if self.platforms.is_empty() {
            return Err(SimError::Configuration("layout contains no platforms".into()));
        }
        if !self.spawn.is_finite() || !self.landmark.is_finite() {
            return Err(SimError::Configuration("spawn or landmark is not finite".into()));
        }
        let on_ground = |p: Vec3| self.platforms.iter().any(|piece| piece.contains(p.x, p.z));
        if !on_ground(self.spawn) {
            return Err(SimError::Configuration(format!("spawn {:?} is over the void", self.spawn)));
        }
        if !on_ground(self.landmark) {
            return Err(SimError::Configuration(format!("landmark {:?} is over the void", self.landmark)));
        }
        Ok(())
    }

    /// Build the read-only world models for the tick
    pub fn build(&self) -> Result<(TerrainModel, ObstacleField), SimError> {
        self.validate()?;
        let terrain = TerrainModel::new(self.platforms.clone(), self.ramps.clone())?;
        Ok((terrain, ObstacleField::new(self.obstacles.clone())))
    }
}

fn cell_center(i: i32, j: i32) -> Vec2 {
    let half = (GRID / 2) as f32;
    Vec2::new((i as f32 - half) * CELL_SPACING, (j as f32 - half) * CELL_SPACING)
}

/// Generate the layout for `tier` deterministically from `seed`
pub fn generate_world(seed: u64, tier: u32) -> Result<WorldLayout, SimError> {
    let tier_seed = (tier as u64).wrapping_mul(2_654_435_761).wrapping_add(seed);
    let mut rng = Pcg32::seed_from_u64(tier_seed);
    let plaza = (GRID / 2, GRID / 2);

    // Platforms, row-major; index = j * GRID + i
    let mut platforms = Vec::with_capacity((GRID * GRID) as usize + 1);
    for j in 0..GRID {
        for i in 0..GRID {
            let c = cell_center(i, j);
            let (size_x, size_z, height) = if (i, j) == plaza {
                (PLAZA_SIZE, PLAZA_SIZE, PLAZA_HEIGHT)
            } else {
                (
                    rng.random_range(14.0..19.0),
                    rng.random_range(14.0..19.0),
                    PLAZA_HEIGHT + rng.random_range(0..=4) as f32,
                )
            };
            platforms.push(TerrainPiece::new(c.x, c.y, size_x, size_z, height));
        }
    }
    let at = |i: i32, j: i32| (j * GRID + i) as usize;

    // Ramps: every east-west link plus the centre column are kept so the grid
    // stays connected; other north-south links are optional.
    let mut ramps = Vec::new();
    for j in 0..GRID {
        for i in 0..GRID {
            let here = &platforms[at(i, j)];
            if i + 1 < GRID {
                let east = &platforms[at(i + 1, j)];
                let start = here.x + here.width * 0.5 - RAMP_OVERLAP;
                let end = east.x - east.width * 0.5 + RAMP_OVERLAP;
                ramps.push(Ramp {
                    x: (start + end) * 0.5,
                    z: here.z,
                    length: end - start,
                    width: RAMP_WIDTH,
                    from_height: here.height,
                    to_height: east.height,
                    yaw: FRAC_PI_2,
                });
            }
            if j + 1 < GRID && (i == plaza.0 || rng.random::<f32>() >= SKIP_LINK_CHANCE) {
                let north = &platforms[at(i, j + 1)];
                let start = here.z + here.depth * 0.5 - RAMP_OVERLAP;
                let end = north.z - north.depth * 0.5 + RAMP_OVERLAP;
                ramps.push(Ramp {
                    x: here.x,
                    z: (start + end) * 0.5,
                    length: end - start,
                    width: RAMP_WIDTH,
                    from_height: here.height,
                    to_height: north.height,
                    yaw: 0.0,
                });
            }
        }
    }

    // Bridge over the east half of the plaza
    let p = platforms[at(plaza.0, plaza.1)];
    platforms.push(TerrainPiece::slab(
        p.x + PLAZA_SIZE * 0.3,
        p.z,
        3.0,
        PLAZA_SIZE,
        p.height + BRIDGE_CLEARANCE,
        0.5,
    ));

    let corners = [(0, 0), (GRID - 1, 0), (0, GRID - 1), (GRID - 1, GRID - 1)];
    let (li, lj) = corners[rng.random_range(0..corners.len())];
    let lp = platforms[at(li, lj)];
    let landmark = Vec3::new(lp.x, lp.height, lp.z);

    let mut obstacles = Vec::new();
    for j in 0..GRID {
        for i in 0..GRID {
            if (i, j) == plaza || (i, j) == (li, lj) {
                continue;
            }
            let piece = &platforms[at(i, j)];
            let half = piece.half_extents() - Vec2::splat(2.5);
            for _ in 0..rng.random_range(0..=3) {
                let x = piece.x + rng.random_range(-half.x..half.x);
                let z = piece.z + rng.random_range(-half.y..half.y);
                let shape = match rng.random_range(0..3) {
                    0 => ObstacleShape::Sphere { radius: rng.random_range(0.6..1.4) },
                    1 => ObstacleShape::Cylinder { radius: rng.random_range(0.3..0.7) },
                    _ => ObstacleShape::Box { half_extents: Vec2::splat(rng.random_range(0.5..1.2)) },
                };
                obstacles.push(Obstacle { shape, x, z });
            }
        }
    }

    let layout = WorldLayout {
        platforms,
        ramps,
        obstacles,
        landmark,
        spawn: Vec3::new(p.x, PLAZA_HEIGHT, p.z),
    };
    layout.validate()?;
    log::info!(
        "generated tier {tier}: {} platforms, {} ramps, {} obstacles",
        layout.platforms.len(),
        layout.ramps.len(),
        layout.obstacles.len()
    );
    Ok(layout)
}

/// Generate, or fall back to the minimal world on bad output
pub fn generate_or_fallback(seed: u64, tier: u32) -> (WorldLayout, TerrainModel, ObstacleField) {
    let built = generate_world(seed, tier).and_then(|layout| {
        let (terrain, obstacles) = layout.build()?;
        Ok((layout, terrain, obstacles))
    });
    match built {
        Ok(world) => world,
        Err(err) => {
            log::warn!("world generation for tier {tier} failed ({err}), using fallback platform");
            fallback_world()
        }
    }
}

fn fallback_world() -> (WorldLayout, TerrainModel, ObstacleField) {
    let layout = WorldLayout::fallback();
    let terrain = TerrainModel::new(layout.platforms.clone(), Vec::new()).unwrap_or_default();
    (layout, terrain, ObstacleField::default())
}
