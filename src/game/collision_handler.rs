//! Turns physics contacts into gameplay
//!
//! Contacts are resolved strictly in the order the physics step reported
//! them. Every handler first checks that the ball is still in play: once a
//! ball has landed, been eaten or left the field, later contacts from the same
//! step are ignored. That is what keeps two overlapping buckets from both
//! scoring one ball.

use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;

use super::scoring::ScoringSystem;
use crate::events::{EventBus, GameEvent, LossCause};
use crate::features::{FeatureRegistry, ids};
use crate::fx::{Fx, FxCommand, SoundEffect, TweenTarget};
use crate::sim::{Ball, BallState, Bucket, BucketKind, Contact, ContactKind, Pin};

/// Bucket values at or above this play the jackpot sound
const JACKPOT_VALUE: u32 = 100;

/// What resolving one contact did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionOutcome {
    /// Ball already out of play, or target missing
    Ignored,
    PinHit { ball_id: u32, new_combo: bool },
    Scored { ball_id: u32, delta: u64 },
    Lost { ball_id: u32, cause: LossCause },
}

pub struct CollisionHandler {
    bus: Rc<EventBus>,
    features: Rc<RefCell<FeatureRegistry>>,
    fx: Rc<Fx>,
}

impl CollisionHandler {
    pub fn new(bus: Rc<EventBus>, features: Rc<RefCell<FeatureRegistry>>, fx: Rc<Fx>) -> Self {
        Self { bus, features, fx }
    }

    /// Resolve a step's contacts in order
    pub fn resolve<R: Rng>(
        &self,
        contacts: &[Contact],
        balls: &mut [Ball],
        pins: &mut [Pin],
        buckets: &[Bucket],
        scoring: &mut ScoringSystem,
        rng: &mut R,
    ) -> Vec<CollisionOutcome> {
        contacts
            .iter()
            .map(|contact| {
                let Some(ball) = balls.iter_mut().find(|b| b.id == contact.ball_id) else {
                    return CollisionOutcome::Ignored;
                };
                match contact.kind {
                    ContactKind::Pin(id) => match pins.get_mut(id.0) {
                        Some(pin) => self.handle_pin_hit(ball, pin),
                        None => CollisionOutcome::Ignored,
                    },
                    ContactKind::Bucket(index) => match buckets.get(index) {
                        Some(bucket) => self.handle_bucket_hit(ball, bucket, scoring, rng),
                        None => CollisionOutcome::Ignored,
                    },
                    ContactKind::Creature(_) => self.handle_creature_eat(ball),
                    ContactKind::OutOfBounds => self.handle_out_of_bounds(ball),
                }
            })
            .collect()
    }

    /// Pin feedback always; sound, shake, events and particles only for a new combo
    pub fn handle_pin_hit(&self, ball: &mut Ball, pin: &mut Pin) -> CollisionOutcome {
        if !ball.is_active() {
            return CollisionOutcome::Ignored;
        }

        pin.register_hit();
        self.fx.send(FxCommand::Tween {
            target: TweenTarget::Pin(pin.id),
            property: "scale",
            to: if pin.is_intensified() { 1.6 } else { 1.3 },
            duration_ms: 100.0,
        });

        let new_combo = ball.hit_pin(pin.id);
        if new_combo {
            let combo = ball.combo();
            {
                let features = self.features.borrow();
                self.fx.play(SoundEffect::PinHit, &features);
                self.fx.shake(&features, 1.0);
                if features.is_enabled(ids::COMBO_EFFECTS) {
                    self.fx.send(FxCommand::Particles {
                        pos: pin.pos,
                        count: 4 + combo.min(16),
                        tint: combo_tint(combo),
                        lifespan_ms: 300.0 + 20.0 * combo.min(20) as f32,
                    });
                }
            }
            self.bus.emit(GameEvent::BallHitPin {
                ball_id: ball.id,
                pin_id: pin.id.0,
                combo,
            });
            self.bus.emit(GameEvent::ComboUpdate {
                ball_id: ball.id,
                combo,
            });
        }

        if ball.take_stuck_report() {
            log::debug!("Ball {} stuck near pin {}", ball.id, pin.id.0);
            self.bus.emit(GameEvent::BallStuck { ball_id: ball.id });
        }

        CollisionOutcome::PinHit {
            ball_id: ball.id,
            new_combo,
        }
    }

    /// First bucket wins; the ball leaves play before anything is emitted
    pub fn handle_bucket_hit<R: Rng>(
        &self,
        ball: &mut Ball,
        bucket: &Bucket,
        scoring: &mut ScoringSystem,
        rng: &mut R,
    ) -> CollisionOutcome {
        if !ball.deactivate(BallState::Landed {
            bucket: bucket.index,
        }) {
            return CollisionOutcome::Ignored;
        }

        let combo = ball.combo();
        let (bucket_multiplier, bonus_event) = match bucket.kind {
            BucketKind::Normal => (1.0, None),
            BucketKind::Mystery { min, max } => {
                let m = if max > min { rng.random_range(min..=max) } else { min };
                (
                    m,
                    Some(GameEvent::MysteryBucketHit {
                        bucket_index: bucket.index,
                        multiplier: m,
                    }),
                )
            }
            BucketKind::Lucky { multiplier } => (
                multiplier,
                Some(GameEvent::LuckyZoneHit {
                    bucket_index: bucket.index,
                }),
            ),
        };
        let delta = scoring.award(bucket.value, combo, ball.score_multiplier * bucket_multiplier);

        {
            let features = self.features.borrow();
            let sound = if bucket.value >= JACKPOT_VALUE {
                SoundEffect::Jackpot
            } else {
                SoundEffect::BucketLand
            };
            self.fx.play(sound, &features);
        }
        self.fx.send(FxCommand::ScorePopup {
            pos: ball.pos,
            amount: delta,
        });

        log::debug!(
            "Ball {} landed in bucket {} (value {}, combo {}) +{}",
            ball.id,
            bucket.index,
            bucket.value,
            combo,
            delta
        );
        self.bus.emit(GameEvent::BallHitBucket {
            ball_id: ball.id,
            bucket_index: bucket.index,
            bucket_value: bucket.value,
            combo,
            delta,
        });
        if let Some(event) = bonus_event {
            self.bus.emit(event);
        }
        self.bus.emit(GameEvent::ScoreUpdate {
            delta,
            total: scoring.total(),
        });

        CollisionOutcome::Scored {
            ball_id: ball.id,
            delta,
        }
    }

    /// The ball is destroyed; the creature is untouched
    pub fn handle_creature_eat(&self, ball: &mut Ball) -> CollisionOutcome {
        if !ball.deactivate(BallState::Consumed) {
            return CollisionOutcome::Ignored;
        }
        self.fx.play(SoundEffect::CreatureEat, &self.features.borrow());
        self.lose(ball.id, LossCause::Creature)
    }

    pub fn handle_out_of_bounds(&self, ball: &mut Ball) -> CollisionOutcome {
        if !ball.deactivate(BallState::OutOfBounds) {
            return CollisionOutcome::Ignored;
        }
        self.lose(ball.id, LossCause::OutOfBounds)
    }

    fn lose(&self, ball_id: u32, cause: LossCause) -> CollisionOutcome {
        log::debug!("Ball {} lost ({})", ball_id, cause.as_str());
        self.bus.emit(GameEvent::BallLost { ball_id, cause });
        CollisionOutcome::Lost { ball_id, cause }
    }
}

/// Warmer tint as the combo grows
fn combo_tint(combo: u32) -> u32 {
    match combo {
        0..=4 => 0x66ccff,
        5..=9 => 0x66ff99,
        10..=19 => 0xffcc33,
        _ => 0xff4466,
    }
}
