//! Pachinko - a ball-drop arcade game
//!
//! Core modules:
//! - `sim`: Entities (ball, pin, creature, bucket) and physics stepping
//! - `game`: Gameplay coordinators (launcher, pin grid, collisions, scoring)
//! - `features`: Data-driven feature toggles and parameters
//! - `progress`: Achievements, daily challenge, tiers, power-ups, effects
//! - `events`: Synchronous publish/subscribe bus tying the above together
//! - `persistence`: Key-value storage collaborator and typed accessors

pub mod budget;
pub mod events;
pub mod features;
pub mod fx;
pub mod game;
pub mod highscores;
pub mod malus;
pub mod persistence;
pub mod platform;
pub mod progress;
pub mod services;
pub mod settings;
pub mod sim;

pub use budget::{BudgetError, BudgetLedger};
pub use events::{EventBus, GameEvent};
pub use features::FeatureRegistry;
pub use game::{Game, GameConfig};
pub use highscores::HighScores;
pub use services::Services;
pub use settings::{Language, PlayerSettings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Play field dimensions (pixels)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Downward acceleration applied to balls (pixels/s²)
    pub const GRAVITY: f32 = 300.0;
    /// Bounce energy kept on pin and wall contact
    pub const RESTITUTION: f32 = 0.6;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    /// Height of the launch line the cursor placeholder sits on
    pub const LAUNCH_Y: f32 = 40.0;
    /// Horizontal velocity jitter for normal launches (±)
    pub const LAUNCH_JITTER: f32 = 50.0;
    /// Hardcore launches scale the vertical component down by this much
    pub const HARDCORE_VERTICAL_FACTOR: f32 = 0.5;

    /// Pin defaults
    pub const PIN_RADIUS: f32 = 5.0;
    /// First pin row sits this far below the top of the field
    pub const PIN_GRID_TOP: f32 = 110.0;
    /// Pin hits from this count on get the intensified flash
    pub const PIN_INTENSIFY_HITS: u32 = 2;

    /// Bucket strip height along the bottom of the field
    pub const BUCKET_HEIGHT: f32 = 60.0;
    /// Default bucket values from left to right
    pub const DEFAULT_BUCKET_VALUES: [u32; 7] = [10, 25, 50, 100, 50, 25, 10];

    /// Score weight per combo step: score = value * (1 + combo * weight)
    pub const COMBO_SCORE_WEIGHT: f64 = 0.2;

    /// Pin references kept per ball for stuck detection
    pub const COLLISION_HISTORY_CAPACITY: usize = 100;
    /// A full history touching this many distinct pins or fewer is stuck
    pub const STUCK_DISTINCT_PIN_LIMIT: usize = 2;

    /// Creature heading change interval bounds (ms)
    pub const CREATURE_TURN_MIN_MS: f32 = 800.0;
    pub const CREATURE_TURN_MAX_MS: f32 = 1500.0;

    /// Horizontal acceleration toward the best bucket for magnet balls
    pub const MAGNET_PULL: f32 = 120.0;
    /// Radius multiplier for big balls
    pub const BIG_BALL_SCALE: f32 = 1.5;

    /// Lives at the start of a round
    pub const START_LIVES: u8 = 3;
}

/// Ping-pong a phase into [0, 1]: 0 → 1 over the first unit, 1 → 0 over the next
#[inline]
pub fn ping_pong(phase: f32) -> f32 {
    let t = phase.rem_euclid(2.0);
    if t <= 1.0 { t } else { 2.0 - t }
}

/// Sine in-out easing on [0, 1]
#[inline]
pub fn ease_sine_in_out(t: f32) -> f32 {
    0.5 - 0.5 * (std::f32::consts::PI * t.clamp(0.0, 1.0)).cos()
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
