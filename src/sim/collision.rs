//! Lateral collision primitives
//!
//! Everything here works on the horizontal (XZ) plane: a circle (player or
//! entity footprint) against circles and axis-aligned boxes. Vertical
//! interaction is the terrain model's job.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Unit direction to push the circle out along
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }

    /// Correction to add to the circle's centre
    #[inline]
    pub fn push(&self) -> Vec2 {
        if self.hit {
            self.normal * self.penetration
        } else {
            Vec2::ZERO
        }
    }
}

/// Circle against circle: push out along the separating axis
pub fn circle_circle(pos: Vec2, radius: f32, center: Vec2, other_radius: f32) -> CollisionResult {
    let delta = pos - center;
    let min_dist = radius + other_radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_dist * min_dist {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    // Exactly centred: any axis separates, pick +X for stability
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::X };
    CollisionResult {
        hit: true,
        normal,
        penetration: min_dist - dist,
    }
}

/// Circle against an axis-aligned box, resolved along the axis of least
/// penetration
pub fn circle_box(pos: Vec2, radius: f32, center: Vec2, half_extents: Vec2) -> CollisionResult {
    let delta = pos - center;
    let reach = half_extents + Vec2::splat(radius);
    let overlap = reach - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return CollisionResult::miss();
    }

    // Corner region: the circle only touches if it reaches the corner itself
    let outside = delta.abs() - half_extents;
    if outside.x > 0.0 && outside.y > 0.0 {
        let corner = center + delta.signum() * half_extents;
        return circle_circle(pos, radius, corner, 0.0);
    }

    if overlap.x < overlap.y {
        CollisionResult {
            hit: true,
            normal: Vec2::new(sign_or_one(delta.x), 0.0),
            penetration: overlap.x,
        }
    } else {
        CollisionResult {
            hit: true,
            normal: Vec2::new(0.0, sign_or_one(delta.y)),
            penetration: overlap.y,
        }
    }
}

#[inline]
fn sign_or_one(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

/// Remove the part of `velocity` that drives into a surface with outward
/// `normal`
#[inline]
pub fn slide_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    let into = velocity.dot(normal);
    if into < 0.0 {
        velocity - normal * into
    } else {
        velocity
    }
}
