//! Wandering creature
//!
//! Floats freely (no gravity), changes heading at random intervals and
//! bounces elastically off the walls of its bounding box.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, reflect_velocity};
use crate::consts::{CREATURE_TURN_MAX_MS, CREATURE_TURN_MIN_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub speed: f32,
    /// Tint (0xRRGGBB)
    pub color: u32,
    /// Carried from configuration; not used by the wander movement
    pub dash_intensity: f32,
    pub bounds: Rect,
    /// Time until the next heading change
    turn_timer_ms: f32,
}

impl Creature {
    #[allow(clippy::too_many_arguments)]
    pub fn new<R: Rng>(
        id: u32,
        pos: Vec2,
        radius: f32,
        speed: f32,
        dash_intensity: f32,
        color: u32,
        bounds: Rect,
        rng: &mut R,
    ) -> Self {
        let mut creature = Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius,
            speed,
            color,
            dash_intensity,
            bounds,
            turn_timer_ms: 0.0,
        };
        creature.pick_heading(rng);
        creature
    }

    /// New uniform random heading at constant speed, and a new turn timer
    pub fn pick_heading<R: Rng>(&mut self, rng: &mut R) {
        let angle = rng.random_range(0.0..TAU);
        self.vel = Vec2::from_angle(angle) * self.speed;
        self.turn_timer_ms = rng.random_range(CREATURE_TURN_MIN_MS..=CREATURE_TURN_MAX_MS);
    }

    pub fn turn_timer_ms(&self) -> f32 {
        self.turn_timer_ms
    }

    /// Advance by `dt` seconds
    pub fn update<R: Rng>(&mut self, dt: f32, rng: &mut R) {
        self.turn_timer_ms -= dt * 1000.0;
        if self.turn_timer_ms <= 0.0 {
            self.pick_heading(rng);
        }
        self.pos += self.vel * dt;
        self.bounce();
    }

    /// Reflect the axis that left the bounds and clamp back inside
    fn bounce(&mut self) {
        let lo = self.bounds.min + Vec2::splat(self.radius);
        let hi = (self.bounds.max - Vec2::splat(self.radius)).max(lo);

        let mut walls = [Vec2::ZERO; 2];
        if self.pos.x < lo.x {
            self.pos.x = lo.x;
            walls[0] = Vec2::X;
        } else if self.pos.x > hi.x {
            self.pos.x = hi.x;
            walls[0] = Vec2::NEG_X;
        }
        if self.pos.y < lo.y {
            self.pos.y = lo.y;
            walls[1] = Vec2::Y;
        } else if self.pos.y > hi.y {
            self.pos.y = hi.y;
            walls[1] = Vec2::NEG_Y;
        }

        for normal in walls {
            // Only while still heading out
            if self.vel.dot(normal) < 0.0 {
                self.vel = reflect_velocity(self.vel, normal);
            }
        }
    }
}
