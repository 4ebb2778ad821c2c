//! Static lateral blockers (trees, rocks, pillars)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionResult, circle_box, circle_circle};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleShape {
    /// Rock
    Sphere { radius: f32 },
    /// Tree trunk
    Cylinder { radius: f32 },
    /// Pillar
    Box { half_extents: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub shape: ObstacleShape,
    pub x: f32,
    pub z: f32,
}

impl Obstacle {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    /// Footprint check for a circle at `pos`
    pub fn collide(&self, pos: Vec2, radius: f32) -> CollisionResult {
        match self.shape {
            ObstacleShape::Sphere { radius: r } | ObstacleShape::Cylinder { radius: r } => {
                circle_circle(pos, radius, self.center(), r)
            }
            ObstacleShape::Box { half_extents } => circle_box(pos, radius, self.center(), half_extents),
        }
    }

    /// Bounding radius for broad-phase rejection
    fn bound(&self) -> f32 {
        match self.shape {
            ObstacleShape::Sphere { radius } | ObstacleShape::Cylinder { radius } => radius,
            ObstacleShape::Box { half_extents } => half_extents.length(),
        }
    }
}

/// All obstacles of the current tier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Push a circle out of every obstacle it overlaps.
    ///
    /// Returns the corrected position and the accumulated push normal (zero
    /// when nothing was hit).
    pub fn resolve(&self, pos: Vec2, radius: f32) -> (Vec2, Vec2) {
        let mut pos = pos;
        let mut pushed = Vec2::ZERO;
        for obstacle in &self.obstacles {
            let reach = obstacle.bound() + radius;
            if pos.distance_squared(obstacle.center()) > reach * reach {
                continue;
            }
            let hit = obstacle.collide(pos, radius);
            if hit.hit {
                pos += hit.push();
                pushed += hit.normal;
            }
        }
        (pos, pushed.normalize_or_zero())
    }

    /// True if a circle at `pos` overlaps any obstacle
    pub fn blocked(&self, pos: Vec2, radius: f32) -> bool {
        self.obstacles.iter().any(|o| o.collide(pos, radius).hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> ObstacleField {
        ObstacleField::new(vec![
            Obstacle { shape: ObstacleShape::Cylinder { radius: 1.0 }, x: 0.0, z: 0.0 },
            Obstacle { shape: ObstacleShape::Box { half_extents: Vec2::new(1.0, 1.0) }, x: 10.0, z: 0.0 },
        ])
    }

    #[test]
    fn test_resolve_pushes_out_of_tree() {
        let (pos, normal) = field().resolve(Vec2::new(0.0, 1.2), 0.5);
        assert!((pos.length() - 1.5).abs() < 1e-5);
        assert!(normal.y > 0.99);
    }

    #[test]
    fn test_resolve_pushes_out_of_pillar() {
        let (pos, normal) = field().resolve(Vec2::new(8.8, 0.3), 0.5);
        assert!((pos.x - 8.5).abs() < 1e-5);
        assert_eq!(normal, Vec2::new(-1.0, 0.0));
        assert!(!field().blocked(pos, 0.49));
    }

    #[test]
    fn test_clear_space_untouched() {
        let (pos, normal) = field().resolve(Vec2::new(5.0, 5.0), 0.5);
        assert_eq!(pos, Vec2::new(5.0, 5.0));
        assert_eq!(normal, Vec2::ZERO);
    }
}
