//! Reacts to gameplay events with banners, sounds and shakes

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::events::{EventBus, GameEvent, Subscriptions, names, subscribe};
use crate::features::{FeatureRegistry, ids};
use crate::fx::{Fx, FxCommand, SoundEffect, TweenTarget};

pub const WATCHED_EVENTS: &[&str] = &[
    names::COMBO_UPDATE,
    names::BALL_HIT_BUCKET,
    names::GOLDEN_BALL,
    names::MYSTERY_BUCKET,
    names::LUCKY_ZONE,
    names::ACHIEVEMENT_UNLOCKED,
    names::CHALLENGE_COMPLETE,
    names::TIER_REACHED,
    names::POWERUP_ACTIVATED,
    names::BALL_LOST,
    names::GAME_OVER,
];

pub struct EffectsManager {
    bus: Rc<EventBus>,
    features: Rc<RefCell<FeatureRegistry>>,
    fx: Rc<Fx>,
    /// Last combo that got a banner, per ball in flight
    banner_combos: HashMap<u32, u32>,
}

impl EffectsManager {
    pub fn new(bus: Rc<EventBus>, features: Rc<RefCell<FeatureRegistry>>, fx: Rc<Fx>) -> Self {
        Self {
            bus,
            features,
            fx,
            banner_combos: HashMap::new(),
        }
    }

    pub fn attach(this: &Rc<RefCell<Self>>) -> Subscriptions {
        let bus = Rc::clone(&this.borrow().bus);
        subscribe(&bus, this, WATCHED_EVENTS, Self::handle_event)
    }

    pub fn handle_event(&mut self, event: &GameEvent) -> Vec<GameEvent> {
        let features = self.features.borrow();
        match event {
            GameEvent::ComboUpdate { ball_id, combo } => {
                if !features.is_enabled(ids::COMBO_EFFECTS) {
                    return Vec::new();
                }
                let threshold = features.number_or(ids::COMBO_EFFECTS, "threshold", 3.0) as u32;
                let last = self.banner_combos.entry(*ball_id).or_insert(0);
                if *combo >= threshold && *combo > *last {
                    *last = *combo;
                    self.fx.send(FxCommand::Banner {
                        text_key: "fx.combo",
                        detail: format!("x{}", combo),
                    });
                }
            }
            GameEvent::BallHitBucket { ball_id, .. } => {
                self.banner_combos.remove(ball_id);
            }
            GameEvent::GoldenBallTriggered { multiplier } => {
                self.fx.play(SoundEffect::GoldenBall, &features);
                self.fx.send(FxCommand::Banner {
                    text_key: "fx.goldenBall",
                    detail: format!("x{}", multiplier),
                });
            }
            GameEvent::MysteryBucketHit { multiplier, .. } => {
                self.fx.send(FxCommand::Banner {
                    text_key: "fx.mystery",
                    detail: format!("x{:.1}", multiplier),
                });
            }
            GameEvent::LuckyZoneHit { .. } => {
                self.fx.send(FxCommand::Banner {
                    text_key: "fx.luckyZone",
                    detail: String::new(),
                });
            }
            GameEvent::AchievementUnlocked { id } => {
                self.fx.play(SoundEffect::Achievement, &features);
                self.fx.send(FxCommand::Banner {
                    text_key: "fx.achievement",
                    detail: (*id).to_string(),
                });
            }
            GameEvent::ChallengeCompleted { id, reward } => {
                self.fx.play(SoundEffect::ChallengeComplete, &features);
                self.fx.send(FxCommand::Banner {
                    text_key: "fx.dailyComplete",
                    detail: format!("{} +{}", id, reward),
                });
            }
            GameEvent::TierReached { id } => {
                self.fx.play(SoundEffect::TierUp, &features);
                self.fx.send(FxCommand::Banner {
                    text_key: "fx.tier",
                    detail: (*id).to_string(),
                });
            }
            GameEvent::PowerUpActivated { kind } => {
                self.fx.play(SoundEffect::PowerUp, &features);
                self.fx.send(FxCommand::Banner {
                    text_key: "fx.powerUp",
                    detail: kind.id().to_string(),
                });
            }
            GameEvent::BallLost { ball_id, .. } => {
                self.banner_combos.remove(ball_id);
                self.fx.play(SoundEffect::BallLost, &features);
                self.fx.send(FxCommand::Tween {
                    target: TweenTarget::Ball(*ball_id),
                    property: "alpha",
                    to: 0.0,
                    duration_ms: 200.0,
                });
            }
            GameEvent::GameOver { .. } => {
                self.banner_combos.clear();
                self.fx.play(SoundEffect::GameOver, &features);
                self.fx.shake(&features, 3.0);
            }
            _ => {}
        }
        Vec::new()
    }
}
