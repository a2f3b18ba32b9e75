//! Composition root
//!
//! Builds the long-lived services in dependency order and wires the
//! progression listeners before any round can emit. Tests get isolation by
//! building a fresh `Services` each time.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;

use crate::events::{EventBus, Subscriptions, unsubscribe};
use crate::features::FeatureRegistry;
use crate::fx::{Fx, Presentation};
use crate::game::{Game, GameConfig, GameSummary};
use crate::highscores::{Leaderboard, RemoteLeaderboard};
use crate::persistence::{KeyValueStore, Persistence};
use crate::platform;
use crate::progress::{AchievementManager, EffectsManager, PowerUpManager, ProgressionStore};
use crate::settings::PlayerSettings;

pub struct Services {
    pub persistence: Rc<Persistence>,
    pub bus: Rc<EventBus>,
    pub features: Rc<RefCell<FeatureRegistry>>,
    pub fx: Rc<Fx>,
    pub progression: Rc<ProgressionStore>,
    pub achievements: Rc<RefCell<AchievementManager>>,
    pub powerups: Rc<RefCell<PowerUpManager>>,
    pub effects: Rc<RefCell<EffectsManager>>,
    pub leaderboard: Leaderboard,
    pub settings: PlayerSettings,
    subscriptions: Subscriptions,
    seed: u64,
}

impl Services {
    pub fn new(
        store: Box<dyn KeyValueStore>,
        presentation: Box<dyn Presentation>,
        seed: u64,
        today: NaiveDate,
    ) -> Self {
        let persistence = Rc::new(Persistence::new(store));
        let bus = Rc::new(EventBus::new());

        // Registry first: everything below reads parameters
        let mut registry = FeatureRegistry::new(Rc::clone(&persistence));
        registry.init();
        let features = Rc::new(RefCell::new(registry));

        let settings = PlayerSettings::load(&persistence);
        let fx = Rc::new(Fx::new(presentation));
        fx.apply_settings(&settings);

        let progression = Rc::new(ProgressionStore::load(Rc::clone(&persistence)));
        let achievements = Rc::new(RefCell::new(AchievementManager::new(
            Rc::clone(&bus),
            Rc::clone(&features),
            Rc::clone(&progression),
        )));
        let powerups = Rc::new(RefCell::new(PowerUpManager::new(
            Rc::clone(&bus),
            Rc::clone(&features),
            seed ^ 0x9e37_79b9_7f4a_7c15,
        )));
        let effects = Rc::new(RefCell::new(EffectsManager::new(
            Rc::clone(&bus),
            Rc::clone(&features),
            Rc::clone(&fx),
        )));

        let mut subscriptions = AchievementManager::attach(&achievements);
        subscriptions.extend(PowerUpManager::attach(&powerups));
        subscriptions.extend(EffectsManager::attach(&effects));

        {
            let mut a = achievements.borrow_mut();
            let streak = a.update_login_streak(today);
            let daily = a.refresh_daily_challenge(today);
            log::info!("Login streak {}, daily challenge {}", streak, daily.id);
        }

        let leaderboard = Leaderboard::new(Rc::clone(&persistence), Rc::clone(&features));

        log::info!("Services ready ({} listener(s))", subscriptions.len());
        Self {
            persistence,
            bus,
            features,
            fx,
            progression,
            achievements,
            powerups,
            effects,
            leaderboard,
            settings,
            subscriptions,
            seed,
        }
    }

    /// Plug in a global leaderboard backend
    pub fn with_remote_leaderboard(mut self, remote: Box<dyn RemoteLeaderboard>) -> Self {
        self.leaderboard = self.leaderboard.with_remote(remote);
        self
    }

    /// A round wired to these services. The config seed is mixed with the
    /// services seed so separate services give separate rounds.
    pub fn new_game(&self, mut config: GameConfig) -> Game {
        config.seed ^= self.seed;
        Game::new(
            config,
            Rc::clone(&self.bus),
            Rc::clone(&self.features),
            Rc::clone(&self.fx),
            Rc::clone(&self.powerups),
            Rc::clone(&self.persistence),
        )
    }

    /// Record a finished round on the leaderboard under the current username
    pub fn submit_score(&self, summary: &GameSummary) -> Option<usize> {
        self.leaderboard
            .submit(&self.settings.username, summary.score, platform::now_ms())
    }

    pub fn update_settings(&mut self, settings: PlayerSettings) {
        self.fx.apply_settings(&settings);
        settings.save(&self.persistence);
        self.settings = settings;
    }

    /// Drop every manager subscription
    pub fn detach(&mut self) {
        unsubscribe(&self.bus, &mut self.subscriptions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::events::{EventLog, GameEvent, names};
    use crate::features::ids;
    use crate::fx::{FxCommand, NullPresentation, RecordingPresentation};
    use crate::game::{GamePhase, TickInput};
    use crate::malus::MalusConfiguration;
    use crate::persistence::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn services(store: &MemoryStore, today: NaiveDate) -> Services {
        Services::new(Box::new(store.clone()), Box::new(NullPresentation), 1, today)
    }

    #[test]
    fn test_listeners_ready_before_first_round() {
        let s = services(&MemoryStore::new(), date(2025, 3, 1));
        for name in [names::GAME_START, names::COMBO_UPDATE, names::SCORE_UPDATE] {
            assert!(s.bus.listener_count(name) > 0, "{} has no listener", name);
        }
        assert!(s.features.borrow().is_initialized());
        assert!(s.achievements.borrow().daily_challenge().is_some());
        assert_eq!(s.achievements.borrow().login_streak(), 1);
    }

    #[test]
    fn test_streak_survives_restart() {
        let store = MemoryStore::new();
        drop(services(&store, date(2025, 3, 1)));
        let s = services(&store, date(2025, 3, 2));
        assert_eq!(s.achievements.borrow().login_streak(), 2);
        drop(s);
        let s = services(&store, date(2025, 3, 5));
        assert_eq!(s.achievements.borrow().login_streak(), 1);
    }

    #[test]
    fn test_first_ball_unlocks_through_the_bus() {
        let mut s = services(&MemoryStore::new(), date(2025, 3, 1));
        {
            let mut f = s.features.borrow_mut();
            f.set_enabled(ids::PIN_GRID, false);
            f.set_enabled(ids::GOLDEN_BALL, false);
        }
        let log = EventLog::attach(&s.bus, &[names::ACHIEVEMENT_UNLOCKED]);
        let mut game = s.new_game(GameConfig::default());
        game.start(MalusConfiguration::none());
        game.launch(Some(0.0));

        assert!(s.achievements.borrow().is_unlocked("first_ball"));
        assert_eq!(s.achievements.borrow().unlocked_count(), 1);
        assert_eq!(
            log.events(),
            vec![GameEvent::AchievementUnlocked { id: "first_ball" }]
        );
        assert_eq!(s.achievements.borrow().session().balls_launched, 1);

        s.detach();
        game.launch(Some(0.0));
        assert_eq!(s.achievements.borrow().session().balls_launched, 1);
    }

    #[test]
    fn test_round_to_leaderboard() {
        let store = MemoryStore::new();
        let s = services(&store, date(2025, 3, 1));
        s.features.borrow_mut().set_enabled(ids::PIN_GRID, false);
        let mut game = s.new_game(GameConfig {
            bucket_values: vec![10],
            ..GameConfig::default()
        });
        game.start(MalusConfiguration::none());
        game.launch(Some(0.0));
        for _ in 0..300 {
            game.tick(&TickInput::default(), SIM_DT);
        }
        let summary = game.finish();
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert!(summary.score >= 10);

        assert_eq!(s.submit_score(&summary), Some(1));
        let (top, _) = s.leaderboard.top_scores(10);
        assert_eq!(top[0].score, summary.score);
        assert_eq!(top[0].username, s.settings.username);
    }

    #[test]
    fn test_settings_reach_fx() {
        let rec = RecordingPresentation::new();
        let mut s = Services::new(
            Box::new(MemoryStore::new()),
            Box::new(rec.clone()),
            3,
            date(2025, 3, 1),
        );
        let mut settings = s.settings.clone();
        settings.muted = true;
        s.update_settings(settings);
        assert_eq!(s.fx.effective_volume(), 0.0);

        s.fx.play(crate::fx::SoundEffect::Launch, &s.features.borrow());
        assert_eq!(rec.count(|c| matches!(c, FxCommand::PlaySound { .. })), 0);
    }
}
