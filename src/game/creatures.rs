//! Creature spawning and movement

use glam::Vec2;
use rand::Rng;

use crate::features::{FeatureRegistry, ids};
use crate::sim::{Creature, Rect};

/// Tints handed out in spawn order
const PALETTE: [u32; 3] = [0xff6b6b, 0x4ecdc4, 0xffe66d];

#[derive(Debug, Clone, Default)]
pub struct CreatureManager {
    creatures: Vec<Creature>,
}

impl CreatureManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    /// Replace the current creatures with `count` fresh ones spread evenly
    /// across the middle of `bounds`
    pub fn spawn<R: Rng>(&mut self, features: &FeatureRegistry, bounds: Rect, rng: &mut R) {
        self.creatures.clear();
        if !features.is_enabled(ids::CREATURE) {
            return;
        }

        let count = features.number_or(ids::CREATURE, "count", 1.0).round().max(1.0) as u32;
        let speed = features.number_or(ids::CREATURE, "speed", 80.0);
        let radius = features.number_or(ids::CREATURE, "radius", 20.0);
        let dash = features.number_or(ids::CREATURE, "dashIntensity", 1.0);

        let center = bounds.center();
        let spacing = bounds.width() / (count + 1) as f32;
        for i in 0..count {
            let pos = Vec2::new(bounds.min.x + spacing * (i + 1) as f32, center.y);
            let color = PALETTE[i as usize % PALETTE.len()];
            self.creatures
                .push(Creature::new(i, pos, radius, speed, dash, color, bounds, rng));
        }
        log::info!("Spawned {} creature(s) at speed {}", count, speed);
    }

    pub fn update<R: Rng>(&mut self, dt: f32, rng: &mut R) {
        for creature in &mut self.creatures {
            creature.update(dt, rng);
        }
    }

    pub fn clear(&mut self) {
        self.creatures.clear();
    }
}
