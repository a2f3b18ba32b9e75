//! Collision detection and response for circles and boxes
//!
//! Everything in the field is either a circle (balls, pins, creatures) or an
//! axis-aligned box (buckets, creature bounds, the field itself).

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(x + w, y + h))
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Contact between a moving circle and an obstacle
#[derive(Debug, Clone)]
pub struct CollisionResult {
    pub hit: bool,
    /// Closest point on the obstacle's surface
    pub point: Vec2,
    /// Unit normal pointing out of the obstacle, toward the moving circle
    pub normal: Vec2,
    /// Overlap depth along `normal`
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check collision between a moving circle and a static circle
///
/// The normal points from the static circle toward the moving one. When the
/// centers coincide the normal falls back to straight up.
pub fn circle_circle(pos: Vec2, radius: f32, other: Vec2, other_radius: f32) -> CollisionResult {
    let delta = pos - other;
    let reach = radius + other_radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= reach * reach {
        return CollisionResult::miss();
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        Vec2::NEG_Y
    };
    CollisionResult {
        hit: true,
        point: other + normal * other_radius,
        normal,
        penetration: reach - dist,
    }
}

/// Whether a circle overlaps a rectangle (sensor test, no response)
pub fn circle_rect_overlap(pos: Vec2, radius: f32, rect: &Rect) -> bool {
    let closest = pos.clamp(rect.min, rect.max);
    (pos - closest).length_squared() <= radius * radius
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Reflect with energy loss along the normal only
///
/// v' = v - (1 + e)(v·n)n; `e = 1` is a perfect bounce.
#[inline]
pub fn bounce_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    velocity - (1.0 + restitution) * velocity.dot(normal) * normal
}
