//! Ball launcher and hardcore aiming
//!
//! The launcher follows the cursor along the launch line. In hardcore mode
//! size, angle and force each swing back and forth on their own period, and a
//! launch takes whatever values are showing at that instant.

use glam::Vec2;
use rand::Rng;

use crate::consts::{HARDCORE_VERTICAL_FACTOR, LAUNCH_JITTER, LAUNCH_Y};
use crate::features::{FeatureRegistry, ids};
use crate::{ease_sine_in_out, lerp, ping_pong};

/// Value that yoyos between `min` and `max` with sine easing
#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator {
    pub min: f32,
    pub max: f32,
    /// One-way sweep time
    pub period_ms: f32,
    elapsed_ms: f32,
}

impl Oscillator {
    pub fn new(min: f32, max: f32, period_ms: f32) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            period_ms: period_ms.max(1.0),
            elapsed_ms: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed_ms += dt * 1000.0;
    }

    /// Live value
    pub fn value(&self) -> f32 {
        let t = ease_sine_in_out(ping_pong(self.elapsed_ms / self.period_ms));
        lerp(self.min, self.max, t)
    }
}

/// The three hardcore oscillators
#[derive(Debug, Clone, PartialEq)]
pub struct HardcoreAim {
    pub size: Oscillator,
    /// Degrees from straight down
    pub angle: Oscillator,
    pub force: Oscillator,
}

impl HardcoreAim {
    pub fn from_features(features: &FeatureRegistry) -> Self {
        let p = |key, fallback| features.number_or(ids::HARDCORE_LAUNCH, key, fallback);
        let range = p("angleRange", 40.0);
        Self {
            size: Oscillator::new(p("sizeMin", 0.6), p("sizeMax", 1.6), p("sizePeriod", 1100.0)),
            angle: Oscillator::new(-range, range, p("anglePeriod", 1700.0)),
            force: Oscillator::new(p("forceMin", 150.0), p("forceMax", 450.0), p("forcePeriod", 1300.0)),
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.size.update(dt);
        self.angle.update(dt);
        self.force.update(dt);
    }
}

/// What a launch produces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchSpec {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Ball radius multiplier
    pub size: f32,
}

#[derive(Debug, Clone)]
pub struct BallLauncher {
    cursor_x: f32,
    min_x: f32,
    max_x: f32,
    hardcore: Option<HardcoreAim>,
}

impl BallLauncher {
    /// Launch zone spans `[min_x, max_x]`
    pub fn new(min_x: f32, max_x: f32) -> Self {
        let (min_x, max_x) = (min_x.min(max_x), min_x.max(max_x));
        Self {
            cursor_x: (min_x + max_x) * 0.5,
            min_x,
            max_x,
            hardcore: None,
        }
    }

    /// Switch hardcore aiming on or off from the live feature state
    pub fn configure(&mut self, features: &FeatureRegistry) {
        self.hardcore = features
            .is_enabled(ids::HARDCORE_LAUNCH)
            .then(|| HardcoreAim::from_features(features));
    }

    pub fn is_hardcore(&self) -> bool {
        self.hardcore.is_some()
    }

    pub fn hardcore(&self) -> Option<&HardcoreAim> {
        self.hardcore.as_ref()
    }

    /// Follow the cursor, clamped to the launch zone
    pub fn move_cursor(&mut self, x: f32) {
        self.cursor_x = x.clamp(self.min_x, self.max_x);
    }

    pub fn cursor(&self) -> Vec2 {
        Vec2::new(self.cursor_x, LAUNCH_Y)
    }

    pub fn update(&mut self, dt: f32) {
        if let Some(aim) = self.hardcore.as_mut() {
            aim.update(dt);
        }
    }

    /// Sample a launch. `vy` overrides the initial vertical speed in normal
    /// mode; without it the ball gets a random horizontal nudge.
    pub fn launch<R: Rng>(&self, vy: Option<f32>, rng: &mut R) -> LaunchSpec {
        let pos = self.cursor();
        match &self.hardcore {
            Some(aim) => {
                let angle = aim.angle.value().to_radians();
                let force = aim.force.value();
                LaunchSpec {
                    pos,
                    vel: Vec2::new(
                        angle.sin() * force,
                        angle.cos() * force * HARDCORE_VERTICAL_FACTOR,
                    ),
                    size: aim.size.value(),
                }
            }
            None => {
                let vx = match vy {
                    Some(_) => 0.0,
                    None => rng.random_range(-LAUNCH_JITTER..=LAUNCH_JITTER),
                };
                LaunchSpec {
                    pos,
                    vel: Vec2::new(vx, vy.unwrap_or(0.0)),
                    size: 1.0,
                }
            }
        }
    }
}
