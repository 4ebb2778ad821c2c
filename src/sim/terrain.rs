//! Terrain model: flat platforms and yawed ramps
//!
//! Answers the three questions everything else asks of the world: how high
//! is the ground here, is there ground here at all, and is it burning.
//! Built once per tier from the world generator's layout and never mutated
//! during a tick, except for the hazard level which the tier check advances
//! after every other phase has run.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_GROUND_HEIGHT, HAZARD_FLOOR_Y, WORLD_FLOOR_Y};
use crate::error::SimError;
use crate::{lerp, unrotate_yaw};

/// Axis-aligned flat surface centred on (x, z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainPiece {
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    /// Bottom of a floating slab (bridge). `None` is a solid column.
    #[serde(default)]
    pub underside: Option<f32>,
}

impl TerrainPiece {
    pub fn new(x: f32, z: f32, width: f32, depth: f32, height: f32) -> Self {
        Self {
            x,
            z,
            width,
            depth,
            height,
            underside: None,
        }
    }

    /// Floating slab `thickness` deep
    pub fn slab(x: f32, z: f32, width: f32, depth: f32, height: f32, thickness: f32) -> Self {
        Self {
            underside: Some(height - thickness),
            ..Self::new(x, z, width, depth, height)
        }
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.depth * 0.5)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        let h = self.half_extents();
        (x - self.x).abs() <= h.x && (z - self.z).abs() <= h.y
    }

    fn is_finite(&self) -> bool {
        [self.x, self.z, self.width, self.depth, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.underside.is_none_or(f32::is_finite)
    }
}

/// Sloped surface; height varies linearly along its local Z (length) axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ramp {
    pub x: f32,
    pub z: f32,
    pub length: f32,
    pub width: f32,
    pub from_height: f32,
    pub to_height: f32,
    /// Rotation about +Y (radians)
    pub yaw: f32,
}

impl Ramp {
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    /// World point in the ramp's local frame (x across, z along the slope)
    #[inline]
    pub fn to_local(&self, x: f32, z: f32) -> Vec2 {
        unrotate_yaw(Vec2::new(x - self.x, z - self.z), self.yaw)
    }

    #[inline]
    pub fn contains_local(&self, local: Vec2) -> bool {
        local.x.abs() <= self.width * 0.5 && local.y.abs() <= self.length * 0.5
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        self.contains_local(self.to_local(x, z))
    }

    /// Surface height at a local point (clamped to the ramp's ends)
    pub fn height_at_local(&self, local: Vec2) -> f32 {
        let t = if self.length > 0.0 {
            ((local.y + self.length * 0.5) / self.length).clamp(0.0, 1.0)
        } else {
            1.0
        };
        lerp(self.from_height, self.to_height, t)
    }

    fn is_finite(&self) -> bool {
        [self.x, self.z, self.length, self.width, self.from_height, self.to_height, self.yaw]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Height, ground and hazard queries over a tier's platforms and ramps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainModel {
    pieces: Vec<TerrainPiece>,
    ramps: Vec<Ramp>,
    /// Default tolerance applied when a reference height is supplied
    pub step_tolerance: f32,
    /// Overtime rising hazard level, if any
    hazard_level: Option<f32>,
}

impl Default for TerrainModel {
    /// No geometry: every query answers the default ground height
    fn default() -> Self {
        Self {
            pieces: Vec::new(),
            ramps: Vec::new(),
            step_tolerance: crate::consts::PLAYER_STEP_TOLERANCE,
            hazard_level: None,
        }
    }
}

impl TerrainModel {
    /// Build from generated geometry, rejecting empty or non-finite input
    pub fn new(pieces: Vec<TerrainPiece>, ramps: Vec<Ramp>) -> Result<Self, SimError> {
        if pieces.is_empty() {
            return Err(SimError::Configuration("layout contains no platforms".into()));
        }
        if let Some(i) = pieces.iter().position(|p| !p.is_finite() || p.width <= 0.0 || p.depth <= 0.0) {
            return Err(SimError::Configuration(format!("platform {i} has invalid geometry")));
        }
        if let Some(i) = ramps.iter().position(|r| !r.is_finite() || r.width <= 0.0 || r.length <= 0.0) {
            return Err(SimError::Configuration(format!("ramp {i} has invalid geometry")));
        }
        Ok(Self {
            pieces,
            ramps,
            ..Self::default()
        })
    }

    pub fn pieces(&self) -> &[TerrainPiece] {
        &self.pieces
    }

    pub fn ramps(&self) -> &[Ramp] {
        &self.ramps
    }

    /// Highest surface under (x, z), ignoring anything more than `tolerance`
    /// above `reference_y`. `None` where there is no candidate.
    pub fn surface_at(&self, x: f32, z: f32, reference_y: Option<f32>, tolerance: f32) -> Option<f32> {
        let ceiling = reference_y.map(|y| y + tolerance);
        let admit = |h: f32| ceiling.is_none_or(|c| h <= c);

        let platforms = self
            .pieces
            .iter()
            .filter(|p| p.contains(x, z))
            .map(|p| p.height);
        let ramps = self.ramps.iter().filter_map(|r| {
            let local = r.to_local(x, z);
            r.contains_local(local).then(|| r.height_at_local(local))
        });

        platforms
            .chain(ramps)
            .filter(|h| admit(*h))
            .fold(None, |best: Option<f32>, h| Some(best.map_or(h, |b| b.max(h))))
    }

    /// Ground height at (x, z) using the model's step tolerance. Always finite.
    pub fn height_at(&self, x: f32, z: f32, reference_y: Option<f32>) -> f32 {
        self.height_at_with_tolerance(x, z, reference_y, self.step_tolerance)
    }

    pub fn height_at_with_tolerance(&self, x: f32, z: f32, reference_y: Option<f32>, tolerance: f32) -> f32 {
        self.surface_at(x, z, reference_y, tolerance)
            .unwrap_or(DEFAULT_GROUND_HEIGHT)
    }

    /// Inside any platform or ramp footprint
    pub fn is_ground(&self, x: f32, z: f32) -> bool {
        self.pieces.iter().any(|p| p.contains(x, z)) || self.ramps.iter().any(|r| r.contains(x, z))
    }

    /// Lowest surface under (x, z); a slab over solid ground does not count
    /// as the ground there
    fn floor_at(&self, x: f32, z: f32) -> Option<f32> {
        let platforms = self
            .pieces
            .iter()
            .filter(|p| p.contains(x, z))
            .map(|p| p.height);
        let ramps = self.ramps.iter().filter_map(|r| {
            let local = r.to_local(x, z);
            r.contains_local(local).then(|| r.height_at_local(local))
        });
        platforms
            .chain(ramps)
            .fold(None, |low: Option<f32>, h| Some(low.map_or(h, |l| l.min(h))))
    }

    /// Void, or a column whose lowest ground the rising hazard has climbed
    /// above
    pub fn is_hazard(&self, x: f32, z: f32) -> bool {
        let Some(floor) = self.floor_at(x, z) else {
            return true;
        };
        self.hazard_level.is_some_and(|level| level > floor)
    }

    /// Whether feet at `feet` are actually in the hazard: over the void or
    /// on submerged ground, and no more than `contact` above the lava
    /// surface. Jumping over a gap or standing on a bridge above the lava
    /// does not burn.
    pub fn in_hazard(&self, x: f32, z: f32, feet: f32, contact: f32) -> bool {
        if !self.is_ground(x, z) {
            let lava = self.hazard_level.map_or(HAZARD_FLOOR_Y, |l| l.max(HAZARD_FLOOR_Y));
            return feet <= lava + contact;
        }
        let Some(level) = self.hazard_level else {
            return false;
        };
        level > self.height_at(x, z, Some(feet)) && feet <= level + contact
    }

    pub fn hazard_level(&self) -> Option<f32> {
        self.hazard_level
    }

    /// Raise the hazard level; it never goes back down within a tier
    pub fn raise_hazard(&mut self, level: f32) {
        if !level.is_finite() {
            return;
        }
        self.hazard_level = Some(self.hazard_level.map_or(level, |l| l.max(level)));
    }

    /// Lowest walkable surface (platform tops and ramp low ends)
    pub fn min_height(&self) -> f32 {
        self.pieces
            .iter()
            .map(|p| p.height)
            .chain(self.ramps.iter().map(|r| r.from_height.min(r.to_height)))
            .fold(None, |m: Option<f32>, h| Some(m.map_or(h, |m| m.min(h))))
            .unwrap_or(DEFAULT_GROUND_HEIGHT)
    }
}

/// Anything below the world floor has left the playable volume
pub fn check_in_world(y: f32) -> Result<(), SimError> {
    if y < WORLD_FLOOR_Y || y.is_nan() {
        return Err(SimError::OutOfBounds { y });
    }
    Ok(())
}
