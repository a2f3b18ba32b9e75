//! Pin entity
//!
//! The visual position and the collider (`body`) position are separate: moving
//! a pin does not move its collider until [`Pin::sync_body`] is called.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::PIN_INTENSIFY_HITS;

/// Index of a pin in the grid's pin arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(pub usize);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    pub row: u32,
    pub col: u32,
    /// Layout position (before any movement)
    pub initial: Vec2,
    /// Rendered position
    pub pos: Vec2,
    /// Collider position
    pub body: Vec2,
    pub radius: f32,
    /// Visual size multiplier (already folded into `radius`)
    pub scale: f32,
    pub hit_count: u32,
}

impl Pin {
    pub fn new(id: PinId, row: u32, col: u32, pos: Vec2, radius: f32, scale: f32) -> Self {
        Self {
            id,
            row,
            col,
            initial: pos,
            pos,
            body: pos,
            radius: radius * scale,
            scale,
            hit_count: 0,
        }
    }

    /// Tally a contact; returns the new count
    pub fn register_hit(&mut self) -> u32 {
        self.hit_count += 1;
        self.hit_count
    }

    /// Whether feedback should use the stronger flash
    pub fn is_intensified(&self) -> bool {
        self.hit_count >= PIN_INTENSIFY_HITS
    }

    /// Copy the rendered position to the collider
    pub fn sync_body(&mut self) {
        self.body = self.pos;
    }
}
