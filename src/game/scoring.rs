//! Score formula and the running total

use crate::consts::COMBO_SCORE_WEIGHT;

/// Absorbs binary rounding in products like 25 * 1.4 before flooring
const FLOOR_EPSILON: f64 = 1e-9;

/// `floor(value * (1 + combo * COMBO_SCORE_WEIGHT))`
pub fn calculate_score(bucket_value: u32, combo: u32) -> u64 {
    let raw = f64::from(bucket_value) * (1.0 + f64::from(combo) * COMBO_SCORE_WEIGHT);
    (raw + FLOOR_EPSILON).floor() as u64
}

/// Running score for one game
#[derive(Debug, Clone)]
pub struct ScoringSystem {
    total: u64,
    /// Round bonus from maluses
    malus_multiplier: f64,
}

impl Default for ScoringSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringSystem {
    pub fn new() -> Self {
        Self {
            total: 0,
            malus_multiplier: 1.0,
        }
    }

    pub fn reset(&mut self, malus_multiplier: f64) {
        self.total = 0;
        self.malus_multiplier = malus_multiplier.max(0.0);
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn malus_multiplier(&self) -> f64 {
        self.malus_multiplier
    }

    /// Score a landing and add it to the total. `multiplier` folds together
    /// ball bonuses (golden) and bucket bonuses (mystery, lucky zone).
    /// Returns the delta.
    pub fn award(&mut self, bucket_value: u32, combo: u32, multiplier: f64) -> u64 {
        let base = calculate_score(bucket_value, combo);
        let factor = multiplier * self.malus_multiplier;
        let delta = if factor == 1.0 {
            base
        } else {
            (base as f64 * factor.max(0.0) + FLOOR_EPSILON).floor() as u64
        };
        self.total += delta;
        delta
    }
}
