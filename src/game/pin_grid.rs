//! Pin field layout and moving pins
//!
//! Rows are staggered like brickwork: odd rows hold one pin fewer and sit
//! half a spacing to the right. When moving pins are on, even rows slide
//! horizontally and every pin's collider is re-synced to its rendered
//! position after each update.

use glam::Vec2;
use rand::Rng;

use crate::consts::PIN_RADIUS;
use crate::features::{FeatureRegistry, ids};
use crate::sim::{Pin, PinId, Rect};
use crate::{ease_sine_in_out, ping_pong};

/// Moving-pins settings captured at build time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinMotion {
    pub speed: f32,
    pub distance: f32,
    pub alternate_direction: bool,
}

impl PinMotion {
    /// One-way travel time
    pub fn duration_ms(&self) -> f32 {
        self.distance / self.speed.max(1.0) * 1000.0
    }

    /// Horizontal direction for a row; `None` for rows that stay put
    pub fn direction(&self, row: u32) -> Option<f32> {
        if row % 2 != 0 {
            return None;
        }
        let flipped = self.alternate_direction && (row / 2) % 2 == 1;
        Some(if flipped { -1.0 } else { 1.0 })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PinGridManager {
    pins: Vec<Pin>,
    motion: Option<PinMotion>,
    elapsed_ms: f32,
}

impl PinGridManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut [Pin] {
        &mut self.pins
    }

    pub fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.get_mut(id.0)
    }

    pub fn motion(&self) -> Option<PinMotion> {
        self.motion
    }

    /// Lay out a fresh grid inside `area` from the live feature state
    pub fn build<R: Rng>(&mut self, features: &FeatureRegistry, area: Rect, rng: &mut R) {
        self.pins.clear();
        self.elapsed_ms = 0.0;
        self.motion = None;

        if !features.is_enabled(ids::PIN_GRID) {
            log::debug!("Pin grid disabled");
            return;
        }

        let rows = features.number_or(ids::PIN_GRID, "rows", 10.0).round().max(1.0) as u32;
        let cols = features.number_or(ids::PIN_GRID, "cols", 9.0).round().max(1.0) as u32;

        let jitter = features
            .is_enabled(ids::WABI_SABI)
            .then(|| features.number_or(ids::WABI_SABI, "jitter", 3.0).max(0.0));
        let scale_range = features.is_enabled(ids::PIN_SIZE_VARIATION).then(|| {
            let a = features.number_or(ids::PIN_SIZE_VARIATION, "minScale", 0.3);
            let b = features.number_or(ids::PIN_SIZE_VARIATION, "maxScale", 2.0);
            (a.min(b), a.max(b))
        });

        let spacing_x = area.width() / (cols + 1) as f32;
        let spacing_y = if rows > 1 {
            area.height() / (rows - 1) as f32
        } else {
            0.0
        };

        for row in 0..rows {
            let odd = row % 2 == 1;
            let count = if odd { cols.saturating_sub(1) } else { cols };
            let offset = if odd { spacing_x * 0.5 } else { 0.0 };
            for col in 0..count {
                let mut pos = Vec2::new(
                    area.min.x + spacing_x * (col + 1) as f32 + offset,
                    area.min.y + spacing_y * row as f32,
                );
                if let Some(j) = jitter {
                    pos.x += rng.random_range(-j..=j);
                    pos.y += rng.random_range(-j..=j);
                }
                let scale = match scale_range {
                    Some((lo, hi)) => rng.random_range(lo..=hi),
                    None => 1.0,
                };
                let id = PinId(self.pins.len());
                self.pins.push(Pin::new(id, row, col, pos, PIN_RADIUS, scale));
            }
        }

        if features.is_enabled(ids::MOVING_PINS) {
            self.motion = Some(PinMotion {
                speed: features.number_or(ids::MOVING_PINS, "speed", 50.0),
                distance: features.number_or(ids::MOVING_PINS, "distance", 40.0),
                alternate_direction: features.flag_or(ids::MOVING_PINS, "alternateDirection", true),
            });
        }

        log::info!(
            "Built pin grid {}x{} ({} pins, moving: {})",
            rows,
            cols,
            self.pins.len(),
            self.motion.is_some()
        );
    }

    /// Advance moving pins and re-sync their colliders
    pub fn update(&mut self, dt: f32) {
        let Some(motion) = self.motion else {
            return;
        };
        self.elapsed_ms += dt * 1000.0;
        let t = ease_sine_in_out(ping_pong(self.elapsed_ms / motion.duration_ms()));
        for pin in &mut self.pins {
            if let Some(dir) = motion.direction(pin.row) {
                pin.pos.x = pin.initial.x + dir * motion.distance * t;
                pin.sync_body();
            }
        }
    }
}
