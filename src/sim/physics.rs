//! Ball integration and contact reporting
//!
//! Stepping is deterministic: balls are processed in slice order and each
//! ball's contacts are reported pins first (in the order they were touched,
//! once per fresh contact, so A-B-A within a step reports A twice), then buckets (by index), then creatures (by slice order), then leaving the
//! field. Callers resolve contacts in exactly that order.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::bucket::Bucket;
use super::collision::{bounce_velocity, circle_circle, circle_rect_overlap};
use super::creature::Creature;
use super::pin::{Pin, PinId};
use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH, GRAVITY, MAGNET_PULL, MAX_SUBSTEPS, RESTITUTION};

/// What a ball touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    Pin(PinId),
    /// Bucket index
    Bucket(usize),
    /// Creature id
    Creature(u32),
    /// Fell below the bottom edge
    OutOfBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub ball_id: u32,
    pub kind: ContactKind,
}

/// World parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsWorld {
    pub gravity: f32,
    pub restitution: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(FIELD_WIDTH, FIELD_HEIGHT)
    }
}

impl PhysicsWorld {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            gravity: GRAVITY,
            restitution: RESTITUTION,
            width,
            height,
        }
    }

    /// Advance every active ball by `dt` seconds and collect contacts
    pub fn step(
        &self,
        balls: &mut [Ball],
        pins: &[Pin],
        buckets: &[Bucket],
        creatures: &[Creature],
        dt: f32,
    ) -> Vec<Contact> {
        let magnet_x = super::bucket::best_bucket(buckets).map(|b| b.rect.center().x);
        let mut contacts = Vec::new();

        for ball in balls.iter_mut().filter(|b| b.is_active()) {
            ball.vel.y += self.gravity * dt;
            if let (true, Some(target)) = (ball.magnet, magnet_x) {
                let dx = target - ball.pos.x;
                if dx.abs() > 1.0 {
                    ball.vel.x += dx.signum() * MAGNET_PULL * dt;
                }
            }

            // Substep so fast balls can't skip over pins
            let move_dist = ball.vel.length() * dt;
            let step_size = (ball.radius * 0.5).max(0.5);
            let num_steps = ((move_dist / step_size).ceil() as u32).clamp(1, MAX_SUBSTEPS);
            let step_dt = dt / num_steps as f32;

            let mut touched: Vec<PinId> = Vec::new();
            // Pins overlapping on the previous substep
            let mut touching: Vec<PinId> = Vec::new();
            for _ in 0..num_steps {
                ball.pos += ball.vel * step_dt;
                self.collide_walls(ball);
                if ball.ghost {
                    continue;
                }
                let mut now = Vec::new();
                for pin in pins {
                    let result = circle_circle(ball.pos, ball.radius, pin.body, pin.radius);
                    if !result.hit {
                        continue;
                    }
                    if ball.vel.dot(result.normal) < 0.0 {
                        ball.vel = bounce_velocity(ball.vel, result.normal, self.restitution);
                    }
                    ball.pos += result.normal * result.penetration;
                    // One report per contact, not per overlapping substep
                    if !touching.contains(&pin.id) {
                        touched.push(pin.id);
                    }
                    now.push(pin.id);
                }
                touching = now;
            }

            let id = ball.id;
            contacts.extend(touched.into_iter().map(|pin| Contact {
                ball_id: id,
                kind: ContactKind::Pin(pin),
            }));
            contacts.extend(
                buckets
                    .iter()
                    .filter(|b| circle_rect_overlap(ball.pos, ball.radius, &b.rect))
                    .map(|b| Contact {
                        ball_id: id,
                        kind: ContactKind::Bucket(b.index),
                    }),
            );
            contacts.extend(
                creatures
                    .iter()
                    .filter(|c| circle_circle(ball.pos, ball.radius, c.pos, c.radius).hit)
                    .map(|c| Contact {
                        ball_id: id,
                        kind: ContactKind::Creature(c.id),
                    }),
            );
            if ball.pos.y - ball.radius > self.height {
                contacts.push(Contact {
                    ball_id: id,
                    kind: ContactKind::OutOfBounds,
                });
            }
        }

        contacts
    }

    /// Side walls and ceiling; the bottom is open
    fn collide_walls(&self, ball: &mut Ball) {
        let r = ball.radius;
        if ball.pos.x < r {
            ball.pos.x = r;
            ball.vel.x = ball.vel.x.abs() * self.restitution;
        } else if ball.pos.x > self.width - r {
            ball.pos.x = self.width - r;
            ball.vel.x = -ball.vel.x.abs() * self.restitution;
        }
        if ball.pos.y < r {
            ball.pos.y = r;
            ball.vel.y = ball.vel.y.abs() * self.restitution;
        }
    }
}

/// Convenience for tests and tools: has any ball hit `pin`?
pub fn touches_pin(contacts: &[Contact], pin: PinId) -> bool {
    contacts.iter().any(|c| c.kind == ContactKind::Pin(pin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BALL_RADIUS, BUCKET_HEIGHT, PIN_RADIUS, SIM_DT};
    use crate::sim::bucket::layout_buckets;

    fn drop_ball(x: f32) -> Ball {
        Ball::new(1, Vec2::new(x, 40.0), Vec2::ZERO, BALL_RADIUS)
    }

    #[test]
    fn test_free_fall_is_vertical() {
        let world = PhysicsWorld::default();
        let mut balls = vec![drop_ball(400.0)];
        for _ in 0..30 {
            world.step(&mut balls, &[], &[], &[], SIM_DT);
        }
        assert_eq!(balls[0].pos.x, 400.0);
        assert!(balls[0].pos.y > 40.0);
        assert!(balls[0].vel.y > 0.0);
    }

    #[test]
    fn test_lands_in_bucket() {
        let world = PhysicsWorld::default();
        let buckets = layout_buckets(&[10], FIELD_WIDTH, FIELD_HEIGHT, BUCKET_HEIGHT);
        let mut balls = vec![drop_ball(400.0)];
        let mut landed = None;
        for _ in 0..600 {
            let contacts = world.step(&mut balls, &[], &buckets, &[], SIM_DT);
            if let Some(c) = contacts.first() {
                landed = Some(c.kind);
                break;
            }
        }
        assert_eq!(landed, Some(ContactKind::Bucket(0)));
    }

    #[test]
    fn test_pin_deflects_and_reports_once_per_step() {
        let world = PhysicsWorld::default();
        let pin = Pin::new(PinId(0), 0, 0, Vec2::new(402.0, 60.0), PIN_RADIUS, 1.0);
        let mut balls = vec![Ball::new(1, Vec2::new(400.0, 44.0), Vec2::new(0.0, 400.0), BALL_RADIUS)];
        let contacts = world.step(&mut balls, std::slice::from_ref(&pin), &[], &[], SIM_DT);
        let pin_hits = contacts
            .iter()
            .filter(|c| c.kind == ContactKind::Pin(PinId(0)))
            .count();
        assert_eq!(pin_hits, 1);
        // Pushed left, away from the pin
        assert!(balls[0].vel.x < 0.0);
    }

    #[test]
    fn test_rattle_between_pins_reports_each_contact() {
        let world = PhysicsWorld {
            gravity: 0.0,
            restitution: 1.0,
            ..PhysicsWorld::default()
        };
        let a = Pin::new(PinId(0), 0, 0, Vec2::new(384.0, 100.0), PIN_RADIUS, 1.0);
        let b = Pin::new(PinId(1), 0, 1, Vec2::new(416.0, 100.0), PIN_RADIUS, 1.0);
        let mut balls = vec![Ball::new(1, Vec2::new(400.0, 100.0), Vec2::new(3000.0, 0.0), BALL_RADIUS)];
        let contacts = world.step(&mut balls, &[a, b], &[], &[], SIM_DT);
        let order: Vec<PinId> = contacts
            .iter()
            .filter_map(|c| match c.kind {
                ContactKind::Pin(id) => Some(id),
                _ => None,
            })
            .collect();
        assert!(order.len() >= 3);
        assert_eq!(order[..3], [PinId(1), PinId(0), PinId(1)]);
    }

    #[test]
    fn test_ghost_passes_pins() {
        let world = PhysicsWorld::default();
        let pin = Pin::new(PinId(0), 0, 0, Vec2::new(400.0, 60.0), PIN_RADIUS, 1.0);
        let mut ball = Ball::new(1, Vec2::new(400.0, 44.0), Vec2::new(0.0, 400.0), BALL_RADIUS);
        ball.ghost = true;
        let mut balls = vec![ball];
        let contacts = world.step(&mut balls, std::slice::from_ref(&pin), &[], &[], SIM_DT);
        assert!(!touches_pin(&contacts, PinId(0)));
        assert_eq!(balls[0].vel.x, 0.0);
    }

    #[test]
    fn test_pin_collides_at_body_not_visual() {
        let world = PhysicsWorld::default();
        let mut pin = Pin::new(PinId(0), 0, 0, Vec2::new(400.0, 60.0), PIN_RADIUS, 1.0);
        pin.pos.x = 600.0; // moved visually, collider not synced yet
        let mut balls = vec![Ball::new(1, Vec2::new(400.0, 44.0), Vec2::new(0.0, 400.0), BALL_RADIUS)];
        let contacts = world.step(&mut balls, std::slice::from_ref(&pin), &[], &[], SIM_DT);
        assert!(touches_pin(&contacts, PinId(0)));
    }

    #[test]
    fn test_magnet_drifts_toward_best_bucket() {
        let world = PhysicsWorld::default();
        let buckets = layout_buckets(&[10, 10, 10, 100], FIELD_WIDTH, FIELD_HEIGHT, BUCKET_HEIGHT);
        let mut ball = drop_ball(100.0);
        ball.magnet = true;
        let mut balls = vec![ball];
        for _ in 0..10 {
            world.step(&mut balls, &[], &buckets, &[], SIM_DT);
        }
        assert!(balls[0].vel.x > 0.0);
    }

    #[test]
    fn test_out_of_bounds_reported() {
        let world = PhysicsWorld::default();
        let mut balls = vec![Ball::new(1, Vec2::new(400.0, 620.0), Vec2::ZERO, BALL_RADIUS)];
        let contacts = world.step(&mut balls, &[], &[], &[], SIM_DT);
        assert_eq!(contacts.last().map(|c| c.kind), Some(ContactKind::OutOfBounds));
    }

    #[test]
    fn test_inactive_balls_skipped() {
        let world = PhysicsWorld::default();
        let mut ball = drop_ball(400.0);
        ball.deactivate(crate::sim::ball::BallState::Consumed);
        let mut balls = vec![ball];
        world.step(&mut balls, &[], &[], &[], SIM_DT);
        assert_eq!(balls[0].pos.y, 40.0);
    }
}
