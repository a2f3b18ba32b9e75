//! Meta-progression: achievements, daily challenge, tiers, power-ups, effects
//!
//! Per-game counters live in [`GameSession`] and are never persisted. Anything
//! that outlives a game goes through the [`ProgressionStore`], which saves
//! after every mutation.

pub mod achievements;
pub mod daily;
pub mod effects;
pub mod powerups;
pub mod session;
pub mod tiers;

use std::cell::{Ref, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::persistence::Persistence;

pub use achievements::{ACHIEVEMENTS, AchievementDef, AchievementManager, Condition};
pub use daily::{DAILY_CHALLENGES, DailyChallengeDef, DailyChallengeState};
pub use effects::EffectsManager;
pub use powerups::{BallModifiers, PowerUpKind, PowerUpManager};
pub use session::GameSession;
pub use tiers::{TIERS, TierDef};

/// Everything progression-related that survives a restart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressionRecord {
    pub unlocked_achievements: BTreeSet<String>,
    pub login_streak: u32,
    pub last_login: Option<NaiveDate>,
    pub daily_challenge: Option<DailyChallengeState>,
    pub best_tier: Option<String>,
}

/// Loaded once at startup, written back after each change
pub struct ProgressionStore {
    persistence: Rc<Persistence>,
    record: RefCell<ProgressionRecord>,
}

impl ProgressionStore {
    pub fn load(persistence: Rc<Persistence>) -> Self {
        let record = persistence.get_progression();
        log::debug!(
            "Progression loaded: {} achievement(s), streak {}",
            record.unlocked_achievements.len(),
            record.login_streak
        );
        Self {
            persistence,
            record: RefCell::new(record),
        }
    }

    pub fn get(&self) -> Ref<'_, ProgressionRecord> {
        self.record.borrow()
    }

    /// Mutate and persist. Returns whatever `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut ProgressionRecord) -> R) -> R {
        let out = f(&mut self.record.borrow_mut());
        self.persistence.save_progression(&self.record.borrow());
        out
    }
}
