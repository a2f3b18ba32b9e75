//! Presentation commands (sound, camera, particles, tweens)
//!
//! Gameplay never renders or plays anything itself. It sends fire-and-forget
//! [`FxCommand`]s through [`Fx`], which applies volume and feature gating and
//! forwards them to whatever [`Presentation`] backend is plugged in.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;

use crate::features::{FeatureRegistry, ids};
use crate::settings::PlayerSettings;
use crate::sim::PinId;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Ball hits a pin (new combo)
    PinHit,
    /// Ball lands in a bucket
    BucketLand,
    /// Ball lands in the top bucket
    Jackpot,
    /// Ball launched
    Launch,
    /// Golden ball rolled
    GoldenBall,
    /// Ball eaten by a creature
    CreatureEat,
    /// Ball fell out or was removed
    BallLost,
    /// Power-up unlocked
    PowerUp,
    /// Achievement unlocked
    Achievement,
    /// Daily challenge complete
    ChallengeComplete,
    /// Reached a new tier
    TierUp,
    /// Round over
    GameOver,
}

impl SoundEffect {
    /// Asset key understood by the audio backend
    pub fn key(&self) -> &'static str {
        match self {
            SoundEffect::PinHit => "pin_hit",
            SoundEffect::BucketLand => "bucket_land",
            SoundEffect::Jackpot => "jackpot",
            SoundEffect::Launch => "launch",
            SoundEffect::GoldenBall => "golden_ball",
            SoundEffect::CreatureEat => "creature_eat",
            SoundEffect::BallLost => "ball_lost",
            SoundEffect::PowerUp => "powerup",
            SoundEffect::Achievement => "achievement",
            SoundEffect::ChallengeComplete => "challenge_complete",
            SoundEffect::TierUp => "tier_up",
            SoundEffect::GameOver => "game_over",
        }
    }
}

/// What a tween animates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenTarget {
    Pin(PinId),
    Ball(u32),
    Camera,
}

/// Fire-and-forget presentation request
#[derive(Debug, Clone, PartialEq)]
pub enum FxCommand {
    PlaySound {
        key: &'static str,
        volume: f32,
    },
    CameraShake {
        intensity: f32,
        duration_ms: f32,
    },
    Particles {
        pos: Vec2,
        count: u32,
        tint: u32,
        lifespan_ms: f32,
    },
    Tween {
        target: TweenTarget,
        property: &'static str,
        to: f32,
        duration_ms: f32,
    },
    ScorePopup {
        pos: Vec2,
        amount: u64,
    },
    /// Transient text banner (i18n key plus free-form detail)
    Banner {
        text_key: &'static str,
        detail: String,
    },
}

/// Rendering/audio backend
pub trait Presentation {
    fn dispatch(&mut self, command: FxCommand);
}

/// Discards everything (headless runs)
#[derive(Debug, Default)]
pub struct NullPresentation;

impl Presentation for NullPresentation {
    fn dispatch(&mut self, _command: FxCommand) {}
}

/// Keeps every command; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    commands: Rc<RefCell<Vec<FxCommand>>>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<FxCommand> {
        self.commands.borrow().clone()
    }

    /// Keys of every sound played, in order
    pub fn sounds(&self) -> Vec<&'static str> {
        self.commands
            .borrow()
            .iter()
            .filter_map(|c| match c {
                FxCommand::PlaySound { key, .. } => Some(*key),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&FxCommand) -> bool) -> usize {
        self.commands.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn clear(&self) {
        self.commands.borrow_mut().clear();
    }
}

impl Presentation for RecordingPresentation {
    fn dispatch(&mut self, command: FxCommand) {
        self.commands.borrow_mut().push(command);
    }
}

/// Gatekeeper in front of the presentation backend
pub struct Fx {
    sink: RefCell<Box<dyn Presentation>>,
    master_volume: Cell<f32>,
    sfx_volume: Cell<f32>,
    muted: Cell<bool>,
}

impl Fx {
    pub fn new(sink: Box<dyn Presentation>) -> Self {
        Self {
            sink: RefCell::new(sink),
            master_volume: Cell::new(0.8),
            sfx_volume: Cell::new(1.0),
            muted: Cell::new(false),
        }
    }

    pub fn null() -> Self {
        Self::new(Box::new(NullPresentation))
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&self, vol: f32) {
        self.master_volume.set(vol.clamp(0.0, 1.0));
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&self, vol: f32) {
        self.sfx_volume.set(vol.clamp(0.0, 1.0));
    }

    /// Mute/unmute all audio
    pub fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
    }

    pub fn apply_settings(&self, settings: &PlayerSettings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_muted(settings.muted);
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted.get() {
            0.0
        } else {
            self.master_volume.get() * self.sfx_volume.get()
        }
    }

    /// Forward a command unconditionally
    pub fn send(&self, command: FxCommand) {
        match self.sink.try_borrow_mut() {
            Ok(mut sink) => sink.dispatch(command),
            Err(_) => log::warn!("Presentation busy, dropped {:?}", command),
        }
    }

    /// Play a sound effect if sound is enabled and audible
    pub fn play(&self, effect: SoundEffect, features: &FeatureRegistry) {
        if !features.is_enabled(ids::SOUND_EFFECTS) {
            return;
        }
        let vol = self.effective_volume() * features.number_or(ids::SOUND_EFFECTS, "volume", 1.0);
        if vol <= 0.0 {
            return;
        }
        self.send(FxCommand::PlaySound {
            key: effect.key(),
            volume: vol,
        });
    }

    /// Shake the camera, scaled from the configured intensity
    pub fn shake(&self, features: &FeatureRegistry, scale: f32) {
        if !features.is_enabled(ids::SCREEN_SHAKE) {
            return;
        }
        self.send(FxCommand::CameraShake {
            intensity: features.number_or(ids::SCREEN_SHAKE, "intensity", 0.004) * scale,
            duration_ms: features.number_or(ids::SCREEN_SHAKE, "duration", 80.0),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Persistence;

    fn registry() -> FeatureRegistry {
        let mut r = FeatureRegistry::new(Rc::new(Persistence::in_memory()));
        r.init();
        r
    }

    #[test]
    fn test_play_respects_feature_and_mute() {
        let rec = RecordingPresentation::new();
        let fx = Fx::new(Box::new(rec.clone()));
        let mut features = registry();

        fx.play(SoundEffect::PinHit, &features);
        assert_eq!(rec.sounds(), vec!["pin_hit"]);

        fx.set_muted(true);
        fx.play(SoundEffect::PinHit, &features);
        assert_eq!(rec.sounds().len(), 1);

        fx.set_muted(false);
        features.set_enabled(ids::SOUND_EFFECTS, false);
        fx.play(SoundEffect::Launch, &features);
        assert_eq!(rec.sounds().len(), 1);
    }

    #[test]
    fn test_volume_combines_settings_and_feature() {
        let rec = RecordingPresentation::new();
        let fx = Fx::new(Box::new(rec.clone()));
        fx.set_master_volume(0.5);
        fx.set_sfx_volume(1.0);
        let features = registry();
        fx.play(SoundEffect::Jackpot, &features);
        match rec.commands().first() {
            Some(FxCommand::PlaySound { volume, .. }) => assert!((volume - 0.4).abs() < 1e-6),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_shake_gated() {
        let rec = RecordingPresentation::new();
        let fx = Fx::new(Box::new(rec.clone()));
        let mut features = registry();
        fx.shake(&features, 2.0);
        features.set_enabled(ids::SCREEN_SHAKE, false);
        fx.shake(&features, 2.0);
        let shakes = rec.count(|c| matches!(c, FxCommand::CameraShake { .. }));
        assert_eq!(shakes, 1);
    }
}
