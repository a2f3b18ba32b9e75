//! Ball entity: combo counting and stuck detection
//!
//! A ball keeps two views of its pin contacts:
//! - the combo, which only grows when the ball touches a pin other than the
//!   one it touched last (resting on a pin is not a new bounce), and
//! - a bounded raw history of every contact, same-pin bounces included, used
//!   to spot a ball trapped between one or two pins.

use std::collections::{HashSet, VecDeque};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pin::PinId;
use crate::consts::{COLLISION_HISTORY_CAPACITY, STUCK_DISTINCT_PIN_LIMIT};

/// Where a ball is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    /// In play
    Falling,
    /// Scored in a bucket
    Landed { bucket: usize },
    /// Eaten by a creature
    Consumed,
    /// Fell past the bottom of the field
    OutOfBounds,
    /// Pulled out of play (stuck recovery)
    Removed,
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    state: BallState,
    /// Combo counter
    pin_hit_count: u32,
    /// Identity only; never dereferenced
    last_hit_pin: Option<PinId>,
    /// Raw pin contacts, oldest first
    collision_history: VecDeque<PinId>,
    #[serde(default)]
    stuck_reported: bool,
    /// Golden ball (bonus multiplier already folded into `score_multiplier`)
    #[serde(default)]
    pub golden: bool,
    /// Multiplier applied to this ball's bucket score
    pub score_multiplier: f64,
    /// Passes through pins
    #[serde(default)]
    pub ghost: bool,
    /// Pulled toward the best bucket
    #[serde(default)]
    pub magnet: bool,
    /// Trail history for rendering (newest first)
    #[serde(skip)]
    pub trail: Vec<Vec2>,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            state: BallState::Falling,
            pin_hit_count: 0,
            last_hit_pin: None,
            collision_history: VecDeque::with_capacity(COLLISION_HISTORY_CAPACITY),
            stuck_reported: false,
            golden: false,
            score_multiplier: 1.0,
            ghost: false,
            magnet: false,
            trail: Vec::new(),
        }
    }

    /// Register a pin contact. Returns `true` when it extends the combo.
    pub fn hit_pin(&mut self, pin: PinId) -> bool {
        if self.collision_history.len() == COLLISION_HISTORY_CAPACITY {
            self.collision_history.pop_front();
        }
        self.collision_history.push_back(pin);

        if self.last_hit_pin == Some(pin) {
            return false;
        }
        self.last_hit_pin = Some(pin);
        self.pin_hit_count += 1;
        true
    }

    /// Distinct-pin transitions since launch
    pub fn combo(&self) -> u32 {
        self.pin_hit_count
    }

    pub fn last_hit_pin(&self) -> Option<PinId> {
        self.last_hit_pin
    }

    pub fn history_len(&self) -> usize {
        self.collision_history.len()
    }

    /// Full history window touching at most two distinct pins
    pub fn is_stuck_between_pins(&self) -> bool {
        if self.collision_history.len() < COLLISION_HISTORY_CAPACITY {
            return false;
        }
        let mut distinct = HashSet::with_capacity(STUCK_DISTINCT_PIN_LIMIT + 1);
        for pin in &self.collision_history {
            distinct.insert(*pin);
            if distinct.len() > STUCK_DISTINCT_PIN_LIMIT {
                return false;
            }
        }
        true
    }

    /// Returns `true` the first time it is called for a stuck ball
    pub fn take_stuck_report(&mut self) -> bool {
        if self.stuck_reported || !self.is_stuck_between_pins() {
            return false;
        }
        self.stuck_reported = true;
        true
    }

    pub fn state(&self) -> BallState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == BallState::Falling
    }

    /// Leave play. Only the first call succeeds; later collisions in the same
    /// step see an inactive ball and must ignore it.
    pub fn deactivate(&mut self, terminal: BallState) -> bool {
        if !self.is_active() || terminal == BallState::Falling {
            return false;
        }
        self.state = terminal;
        true
    }

    /// Record current position to trail
    pub fn record_trail(&mut self, max_len: usize) {
        self.trail.insert(0, self.pos);
        self.trail.truncate(max_len);
    }
}
