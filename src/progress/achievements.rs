//! Achievements, daily challenge progress and tier tracking
//!
//! [`AchievementManager`] folds gameplay events into the [`GameSession`], then
//! checks only the predicates watching the metrics that changed. Unlocks are
//! one-time and saved immediately.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;

use super::ProgressionStore;
use super::daily::{self, DailyChallengeDef, DailyChallengeState};
use super::session::{GameSession, Metric};
use super::tiers;
use crate::events::{EventBus, GameEvent, Subscriptions, names, subscribe};
use crate::features::{FeatureRegistry, ids};

pub use super::session::Condition;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name_key: &'static str,
    pub icon: &'static str,
    pub condition: Condition,
}

macro_rules! achievement {
    ($id:literal, $icon:literal, $cond:expr) => {
        AchievementDef {
            id: $id,
            name_key: concat!("achievement.", $id),
            icon: $icon,
            condition: $cond,
        }
    };
}

pub static ACHIEVEMENTS: &[AchievementDef] = &[
    achievement!("first_ball", "play", Condition::BallsLaunched { value: 1 }),
    achievement!("balls_50", "layers", Condition::BallsLaunched { value: 50 }),
    achievement!("combo_5", "zap", Condition::Combo { value: 5 }),
    achievement!("combo_10", "zap", Condition::Combo { value: 10 }),
    achievement!("combo_20", "flame", Condition::Combo { value: 20 }),
    achievement!("score_1000", "star", Condition::Score { value: 1_000 }),
    achievement!("score_5000", "star", Condition::Score { value: 5_000 }),
    achievement!("score_10000", "crown", Condition::Score { value: 10_000 }),
    achievement!("survivor_10", "shield", Condition::Consecutive { value: 10 }),
    achievement!(
        "jackpot",
        "target",
        Condition::BucketCount {
            bucket_value: 100,
            count: 1
        }
    ),
    achievement!(
        "jackpot_5",
        "trophy",
        Condition::BucketCount {
            bucket_value: 100,
            count: 5
        }
    ),
    achievement!("golden_touch", "sun", Condition::GoldenBalls { value: 1 }),
    achievement!("mystery_fan", "help-circle", Condition::MysteryHits { value: 3 }),
    achievement!("lucky_streak", "clover", Condition::LuckyZoneHits { value: 3 }),
];

pub fn find(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Events the manager listens to
pub const WATCHED_EVENTS: &[&str] = &[
    names::GAME_START,
    names::SCORE_UPDATE,
    names::COMBO_UPDATE,
    names::BALL_LAUNCHED,
    names::BALL_LOST,
    names::BALL_HIT_BUCKET,
    names::GOLDEN_BALL,
    names::MYSTERY_BUCKET,
    names::LUCKY_ZONE,
];

pub struct AchievementManager {
    bus: Rc<EventBus>,
    features: Rc<RefCell<FeatureRegistry>>,
    store: Rc<ProgressionStore>,
    session: GameSession,
    /// Highest tier reached this game
    session_tier: usize,
    daily: Option<&'static DailyChallengeDef>,
}

impl AchievementManager {
    pub fn new(
        bus: Rc<EventBus>,
        features: Rc<RefCell<FeatureRegistry>>,
        store: Rc<ProgressionStore>,
    ) -> Self {
        Self {
            bus,
            features,
            store,
            session: GameSession::default(),
            session_tier: 0,
            daily: None,
        }
    }

    /// Subscribe to gameplay events. Must run before the first game starts.
    pub fn attach(this: &Rc<RefCell<Self>>) -> Subscriptions {
        let bus = Rc::clone(&this.borrow().bus);
        subscribe(&bus, this, WATCHED_EVENTS, Self::handle_event)
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.store.get().unlocked_achievements.contains(id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.store.get().unlocked_achievements.len()
    }

    /// Unlock `id` and announce it. Returns `false` if it was already
    /// unlocked, unknown, or achievements are switched off.
    pub fn unlock_achievement(&mut self, id: &str) -> bool {
        let mut out = Vec::new();
        let unlocked = self.unlock(id, &mut out);
        for e in out {
            self.bus.emit(e);
        }
        unlocked
    }

    fn unlock(&mut self, id: &str, out: &mut Vec<GameEvent>) -> bool {
        if !self.features.borrow().is_enabled(ids::ACHIEVEMENTS) {
            return false;
        }
        let Some(def) = find(id) else {
            log::warn!("Unknown achievement {}", id);
            return false;
        };
        let fresh = self
            .store
            .update(|r| r.unlocked_achievements.insert(def.id.to_string()));
        if fresh {
            log::info!("Achievement unlocked: {}", def.id);
            out.push(GameEvent::AchievementUnlocked { id: def.id });
        }
        fresh
    }

    /// Fold a gameplay event in and return any follow-up events
    pub fn handle_event(&mut self, event: &GameEvent) -> Vec<GameEvent> {
        let mut out = Vec::new();
        if let GameEvent::GameStarted { .. } = event {
            self.session_tier = 0;
        }
        let touched = self.session.apply(event);
        if touched.is_empty() {
            return out;
        }

        for def in ACHIEVEMENTS {
            if touched.contains(&def.condition.metric())
                && !self.is_unlocked(def.id)
                && def.condition.is_met(&self.session)
            {
                self.unlock(def.id, &mut out);
            }
        }

        self.check_daily(&touched, &mut out);
        if touched.contains(&Metric::Score) {
            self.check_tier(&mut out);
        }
        out
    }

    fn check_daily(&mut self, touched: &[Metric], out: &mut Vec<GameEvent>) {
        if !self.features.borrow().is_enabled(ids::DAILY_CHALLENGE) {
            return;
        }
        let Some(def) = self.daily else {
            return;
        };
        if !touched.contains(&def.condition.metric()) {
            return;
        }
        let session = &self.session;
        let completed = self.store.update(|r| match r.daily_challenge.as_mut() {
            Some(state) if state.id == def.id => daily::record_progress(state, def, session),
            _ => false,
        });
        if completed {
            log::info!("Daily challenge {} complete (+{})", def.id, def.reward);
            out.push(GameEvent::ChallengeCompleted {
                id: def.id,
                reward: def.reward,
            });
        }
    }

    fn check_tier(&mut self, out: &mut Vec<GameEvent>) {
        let tier = tiers::tier_for_score(self.session.score);
        let rank = tiers::rank(tier.id);
        if rank <= self.session_tier {
            return;
        }
        self.session_tier = rank;
        self.store.update(|r| {
            let best = r.best_tier.as_deref().map_or(0, tiers::rank);
            if rank > best {
                r.best_tier = Some(tier.id.to_string());
            }
        });
        out.push(GameEvent::TierReached { id: tier.id });
    }

    /// Update the login streak for `today`; returns the new streak
    pub fn update_login_streak(&mut self, today: NaiveDate) -> u32 {
        self.store.update(|r| {
            r.login_streak = daily::next_streak(r.last_login, r.login_streak, today);
            if r.last_login.is_none_or(|last| today > last) {
                r.last_login = Some(today);
            }
            r.login_streak
        })
    }

    /// Pick today's challenge, keeping saved progress if it is still today's
    pub fn refresh_daily_challenge(&mut self, today: NaiveDate) -> &'static DailyChallengeDef {
        let def = daily::challenge_for_date(today);
        self.daily = Some(def);
        let current = self
            .store
            .get()
            .daily_challenge
            .as_ref()
            .is_some_and(|s| s.date == today && s.id == def.id);
        if !current {
            self.store
                .update(|r| r.daily_challenge = Some(DailyChallengeState::fresh(def, today)));
            log::info!("Daily challenge for {}: {}", today, def.id);
        }
        def
    }

    pub fn daily_challenge(&self) -> Option<DailyChallengeState> {
        self.store.get().daily_challenge.clone()
    }

    pub fn login_streak(&self) -> u32 {
        self.store.get().login_streak
    }

    pub fn best_tier(&self) -> Option<String> {
        self.store.get().best_tier.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::persistence::Persistence;

    struct Harness {
        bus: Rc<EventBus>,
        features: Rc<RefCell<FeatureRegistry>>,
        persistence: Rc<Persistence>,
        manager: Rc<RefCell<AchievementManager>>,
        _subs: Subscriptions,
    }

    fn harness() -> Harness {
        let persistence = Rc::new(Persistence::in_memory());
        let bus = Rc::new(EventBus::new());
        let mut registry = FeatureRegistry::new(Rc::clone(&persistence));
        registry.init();
        let features = Rc::new(RefCell::new(registry));
        let store = Rc::new(ProgressionStore::load(Rc::clone(&persistence)));
        let manager = Rc::new(RefCell::new(AchievementManager::new(
            Rc::clone(&bus),
            Rc::clone(&features),
            store,
        )));
        let subs = AchievementManager::attach(&manager);
        Harness {
            bus,
            features,
            persistence,
            manager,
            _subs: subs,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let h = harness();
        let log = EventLog::attach(&h.bus, &[names::ACHIEVEMENT_UNLOCKED]);

        assert!(h.manager.borrow_mut().unlock_achievement("combo_5"));
        assert!(!h.manager.borrow_mut().unlock_achievement("combo_5"));

        assert_eq!(log.count(names::ACHIEVEMENT_UNLOCKED), 1);
        let saved = h.persistence.get_progression();
        assert_eq!(
            saved
                .unlocked_achievements
                .iter()
                .filter(|id| *id == "combo_5")
                .count(),
            1
        );
    }

    #[test]
    fn test_unlock_gated_by_feature() {
        let h = harness();
        h.features.borrow_mut().set_enabled(ids::ACHIEVEMENTS, false);
        assert!(!h.manager.borrow_mut().unlock_achievement("combo_5"));
        assert!(!h.manager.borrow().is_unlocked("combo_5"));
    }

    #[test]
    fn test_combo_event_unlocks_via_bus() {
        let h = harness();
        let log = EventLog::attach(&h.bus, &[names::ACHIEVEMENT_UNLOCKED]);
        for combo in 1..=5 {
            h.bus.emit(GameEvent::ComboUpdate { ball_id: 1, combo });
        }
        assert_eq!(
            log.events(),
            vec![GameEvent::AchievementUnlocked { id: "combo_5" }]
        );
        // Replaying the milestone does nothing
        h.bus.emit(GameEvent::ComboUpdate { ball_id: 2, combo: 5 });
        assert_eq!(log.count(names::ACHIEVEMENT_UNLOCKED), 1);
    }

    #[test]
    fn test_only_matching_metric_is_checked() {
        let h = harness();
        // Score high enough for score_1000, but delivered as a bucket landing
        // only; the score achievement must wait for the score update.
        h.manager.borrow_mut().session.score = 5_000;
        h.bus.emit(GameEvent::BallHitBucket {
            ball_id: 1,
            bucket_index: 0,
            bucket_value: 10,
            combo: 0,
            delta: 10,
        });
        assert!(!h.manager.borrow().is_unlocked("score_1000"));
        h.bus.emit(GameEvent::ScoreUpdate {
            delta: 10,
            total: 5_010,
        });
        assert!(h.manager.borrow().is_unlocked("score_1000"));
        assert!(h.manager.borrow().is_unlocked("score_5000"));
    }

    #[test]
    fn test_tier_reached_once_per_game() {
        let h = harness();
        let log = EventLog::attach(&h.bus, &[names::TIER_REACHED]);
        h.bus.emit(GameEvent::GameStarted { malus_multiplier: 1.0 });
        h.bus.emit(GameEvent::ScoreUpdate { delta: 1_200, total: 1_200 });
        h.bus.emit(GameEvent::ScoreUpdate { delta: 100, total: 1_300 });
        assert_eq!(log.events(), vec![GameEvent::TierReached { id: "silver" }]);
        assert_eq!(h.manager.borrow().best_tier().as_deref(), Some("silver"));

        h.bus.emit(GameEvent::GameStarted { malus_multiplier: 1.0 });
        h.bus.emit(GameEvent::ScoreUpdate { delta: 1_000, total: 1_000 });
        assert_eq!(log.count(names::TIER_REACHED), 2);
    }

    #[test]
    fn test_daily_challenge_completes_once() {
        let h = harness();
        let log = EventLog::attach(&h.bus, &[names::CHALLENGE_COMPLETE]);
        // Find a date whose challenge is combo-based
        let day = (1..=31)
            .map(|d| date(2025, 1, d))
            .find(|d| daily::challenge_for_date(*d).id == "combo_8")
            .unwrap();
        h.manager.borrow_mut().refresh_daily_challenge(day);

        for combo in 1..=12 {
            h.bus.emit(GameEvent::ComboUpdate { ball_id: 1, combo });
        }
        assert_eq!(
            log.events(),
            vec![GameEvent::ChallengeCompleted {
                id: "combo_8",
                reward: 150
            }]
        );
        let state = h.manager.borrow().daily_challenge().unwrap();
        assert!(state.completed);

        // Same day refresh keeps completion
        h.manager.borrow_mut().refresh_daily_challenge(day);
        assert!(h.manager.borrow().daily_challenge().unwrap().completed);
    }

    #[test]
    fn test_login_streak_persisted() {
        let h = harness();
        let mut m = h.manager.borrow_mut();
        assert_eq!(m.update_login_streak(date(2025, 3, 1)), 1);
        assert_eq!(m.update_login_streak(date(2025, 3, 2)), 2);
        assert_eq!(m.update_login_streak(date(2025, 3, 2)), 2);
        assert_eq!(m.update_login_streak(date(2025, 3, 5)), 1);
        assert_eq!(h.persistence.get_progression().login_streak, 1);
    }
}
