//! Synchronous publish/subscribe event bus
//!
//! Gameplay coordinators emit [`GameEvent`]s; progression managers and effects
//! subscribe by namespaced event name (`domain:action`). Dispatch is
//! synchronous and in subscription order. A handler may emit further events,
//! which are dispatched re-entrantly before `emit` returns.
//!
//! Handlers must not assume isolation: a handler that emits can observe state
//! mutated by handlers of the nested event. Recursion past
//! [`MAX_DISPATCH_DEPTH`] is dropped with a warning.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::progress::powerups::PowerUpKind;

/// Event name catalog (the cross-module contract)
pub mod names {
    pub const GAME_START: &str = "game:start";
    pub const GAME_OVER: &str = "game:over";
    pub const BALL_LAUNCHED: &str = "ball:launched";
    pub const BALL_HIT_PIN: &str = "ball:hitPin";
    pub const COMBO_UPDATE: &str = "combo:update";
    pub const BALL_HIT_BUCKET: &str = "ball:hitBucket";
    pub const SCORE_UPDATE: &str = "score:update";
    pub const BALL_LOST: &str = "ball:lost";
    pub const BALL_STUCK: &str = "ball:stuck";
    pub const GOLDEN_BALL: &str = "goldenBall:triggered";
    pub const MYSTERY_BUCKET: &str = "bucket:mystery";
    pub const LUCKY_ZONE: &str = "luckyZone:hit";
    pub const ACHIEVEMENT_UNLOCKED: &str = "achievement:unlocked";
    pub const CHALLENGE_COMPLETE: &str = "challenge:complete";
    pub const TIER_REACHED: &str = "tier:reached";
    pub const POWERUP_ACTIVATED: &str = "powerup:activated";
    pub const POWERUP_EXPIRED: &str = "powerup:expired";
    pub const BUDGET_UPDATE: &str = "budget:update";
}

/// Nested emits deeper than this are dropped
pub const MAX_DISPATCH_DEPTH: usize = 16;

/// Why a ball left play without scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LossCause {
    Creature,
    OutOfBounds,
    Stuck,
}

impl LossCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossCause::Creature => "creature",
            LossCause::OutOfBounds => "outOfBounds",
            LossCause::Stuck => "stuck",
        }
    }
}

/// Event payloads
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameStarted { malus_multiplier: f64 },
    GameOver { score: u64, max_combo: u32 },
    BallLaunched { ball_id: u32, golden: bool },
    BallHitPin { ball_id: u32, pin_id: usize, combo: u32 },
    ComboUpdate { ball_id: u32, combo: u32 },
    BallHitBucket { ball_id: u32, bucket_index: usize, bucket_value: u32, combo: u32, delta: u64 },
    ScoreUpdate { delta: u64, total: u64 },
    BallLost { ball_id: u32, cause: LossCause },
    BallStuck { ball_id: u32 },
    GoldenBallTriggered { multiplier: f64 },
    MysteryBucketHit { bucket_index: usize, multiplier: f64 },
    LuckyZoneHit { bucket_index: usize },
    AchievementUnlocked { id: &'static str },
    ChallengeCompleted { id: &'static str, reward: u64 },
    TierReached { id: &'static str },
    PowerUpActivated { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    BudgetUpdate { balance: u64, credits: u32 },
}

impl GameEvent {
    /// Namespaced event name used for subscription
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::GameStarted { .. } => names::GAME_START,
            GameEvent::GameOver { .. } => names::GAME_OVER,
            GameEvent::BallLaunched { .. } => names::BALL_LAUNCHED,
            GameEvent::BallHitPin { .. } => names::BALL_HIT_PIN,
            GameEvent::ComboUpdate { .. } => names::COMBO_UPDATE,
            GameEvent::BallHitBucket { .. } => names::BALL_HIT_BUCKET,
            GameEvent::ScoreUpdate { .. } => names::SCORE_UPDATE,
            GameEvent::BallLost { .. } => names::BALL_LOST,
            GameEvent::BallStuck { .. } => names::BALL_STUCK,
            GameEvent::GoldenBallTriggered { .. } => names::GOLDEN_BALL,
            GameEvent::MysteryBucketHit { .. } => names::MYSTERY_BUCKET,
            GameEvent::LuckyZoneHit { .. } => names::LUCKY_ZONE,
            GameEvent::AchievementUnlocked { .. } => names::ACHIEVEMENT_UNLOCKED,
            GameEvent::ChallengeCompleted { .. } => names::CHALLENGE_COMPLETE,
            GameEvent::TierReached { .. } => names::TIER_REACHED,
            GameEvent::PowerUpActivated { .. } => names::POWERUP_ACTIVATED,
            GameEvent::PowerUpExpired { .. } => names::POWERUP_EXPIRED,
            GameEvent::BudgetUpdate { .. } => names::BUDGET_UPDATE,
        }
    }
}

/// Handle returned by [`EventBus::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Rc<dyn Fn(&GameEvent)>;

struct Listener {
    id: ListenerId,
    handler: Handler,
}

/// Process-wide event channel (one per composition root)
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<HashMap<&'static str, Vec<Listener>>>,
    next_id: Cell<u64>,
    depth: Cell<usize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to events named `event`
    pub fn on<F>(&self, event: &'static str, handler: F) -> ListenerId
    where
        F: Fn(&GameEvent) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(event)
            .or_default()
            .push(Listener {
                id,
                handler: Rc::new(handler),
            });
        id
    }

    /// Remove a subscription. Unknown pairs are ignored.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        before != list.len()
    }

    /// Dispatch `event` to every handler subscribed to its name, in order
    pub fn emit(&self, event: GameEvent) {
        let depth = self.depth.get();
        if depth >= MAX_DISPATCH_DEPTH {
            log::warn!(
                "Dropping {} at dispatch depth {} (handler loop?)",
                event.name(),
                depth
            );
            return;
        }

        // Snapshot so handlers can subscribe/unsubscribe/emit while we dispatch
        let handlers: Vec<Handler> = match self.listeners.borrow().get(event.name()) {
            Some(list) => list.iter().map(|l| Rc::clone(&l.handler)).collect(),
            None => return,
        };

        log::trace!("emit {} to {} listener(s)", event.name(), handlers.len());
        self.depth.set(depth + 1);
        for handler in handlers {
            handler(&event);
        }
        self.depth.set(depth);
    }

    /// Number of handlers subscribed to `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().get(event).map_or(0, Vec::len)
    }

    /// Drop every subscription (test harnesses only)
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

/// Collects emitted events for assertions
#[derive(Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<GameEvent>>>,
}

impl EventLog {
    /// Record every event in `names` emitted on `bus`
    pub fn attach(bus: &EventBus, names: &[&'static str]) -> Self {
        let log = Self::default();
        for &name in names {
            let sink = Rc::clone(&log.events);
            bus.on(name, move |event| sink.borrow_mut().push(event.clone()));
        }
        log
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Subscriptions held by a manager, for [`unsubscribe`]
pub type Subscriptions = Vec<(&'static str, ListenerId)>;

/// Route events named in `names` to `handler` on a shared `target`
///
/// The bus only keeps weak handles, so dropping the target silently retires
/// its handlers. Events returned by `handler` are emitted after the target's
/// borrow is released. A delivery that arrives while the target is already
/// borrowed (an event emitted from inside its own handling) is skipped.
pub fn subscribe<T: 'static>(
    bus: &Rc<EventBus>,
    target: &Rc<RefCell<T>>,
    names: &[&'static str],
    handler: fn(&mut T, &GameEvent) -> Vec<GameEvent>,
) -> Subscriptions {
    names
        .iter()
        .map(|&name| {
            let target = Rc::downgrade(target);
            let weak_bus = Rc::downgrade(bus);
            let id = bus.on(name, move |event| {
                let Some(target) = target.upgrade() else {
                    return;
                };
                let outbound = match target.try_borrow_mut() {
                    Ok(mut t) => handler(&mut t, event),
                    Err(_) => {
                        log::warn!("Skipping re-entrant delivery of {}", event.name());
                        return;
                    }
                };
                if let Some(bus) = weak_bus.upgrade() {
                    for e in outbound {
                        bus.emit(e);
                    }
                }
            });
            (name, id)
        })
        .collect()
}

/// Drop every subscription in `subs`
pub fn unsubscribe(bus: &EventBus, subs: &mut Subscriptions) {
    for (name, id) in subs.drain(..) {
        bus.off(name, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(delta: u64) -> GameEvent {
        GameEvent::ScoreUpdate { delta, total: delta }
    }

    #[test]
    fn test_dispatch_in_subscription_order() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3 {
            let order = Rc::clone(&order);
            bus.on(names::SCORE_UPDATE, move |_| order.borrow_mut().push(tag));
        }
        bus.emit(score(5));
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_only_matching_name_receives() {
        let bus = EventBus::new();
        let log = EventLog::attach(&bus, &[names::BALL_LOST]);
        bus.emit(score(5));
        assert!(log.events().is_empty());
        bus.emit(GameEvent::BallLost {
            ball_id: 1,
            cause: LossCause::Creature,
        });
        assert_eq!(log.count(names::BALL_LOST), 1);
    }

    #[test]
    fn test_off_is_idempotent() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = bus.on(names::SCORE_UPDATE, move |_| h.set(h.get() + 1));

        assert!(bus.off(names::SCORE_UPDATE, id));
        assert!(!bus.off(names::SCORE_UPDATE, id));
        assert!(!bus.off(names::BALL_LOST, id));

        bus.emit(score(1));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_reentrant_emit() {
        let bus = Rc::new(EventBus::new());
        let log = EventLog::attach(&bus, &[names::SCORE_UPDATE, names::TIER_REACHED]);

        let weak = Rc::downgrade(&bus);
        bus.on(names::SCORE_UPDATE, move |_| {
            if let Some(bus) = weak.upgrade() {
                bus.emit(GameEvent::TierReached { id: "silver" });
            }
        });

        bus.emit(score(10));
        let seen: Vec<_> = log.events().iter().map(|e| e.name()).collect();
        assert_eq!(seen, vec![names::SCORE_UPDATE, names::TIER_REACHED]);
    }

    #[test]
    fn test_runaway_recursion_is_bounded() {
        let bus = Rc::new(EventBus::new());
        let calls = Rc::new(Cell::new(0usize));

        let weak = Rc::downgrade(&bus);
        let c = Rc::clone(&calls);
        bus.on(names::SCORE_UPDATE, move |event| {
            c.set(c.get() + 1);
            if let Some(bus) = weak.upgrade() {
                bus.emit(event.clone());
            }
        });

        bus.emit(score(1));
        assert_eq!(calls.get(), MAX_DISPATCH_DEPTH);
    }

    #[test]
    fn test_clear() {
        let bus = EventBus::new();
        bus.on(names::SCORE_UPDATE, |_| {});
        assert_eq!(bus.listener_count(names::SCORE_UPDATE), 1);
        bus.clear();
        assert_eq!(bus.listener_count(names::SCORE_UPDATE), 0);
    }

    #[derive(Default)]
    struct Counter {
        seen: u32,
    }

    fn count_and_promote(c: &mut Counter, event: &GameEvent) -> Vec<GameEvent> {
        c.seen += 1;
        match event {
            GameEvent::ScoreUpdate { total, .. } if *total >= 100 => {
                vec![GameEvent::TierReached { id: "silver" }]
            }
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_subscribe_emits_outbound_after_borrow() {
        let bus = Rc::new(EventBus::new());
        let counter = Rc::new(RefCell::new(Counter::default()));
        let log = EventLog::attach(&bus, &[names::TIER_REACHED]);
        let mut subs = subscribe(
            &bus,
            &counter,
            &[names::SCORE_UPDATE, names::TIER_REACHED],
            count_and_promote,
        );

        bus.emit(GameEvent::ScoreUpdate { delta: 100, total: 100 });
        // score update + the tier event it produced
        assert_eq!(counter.borrow().seen, 2);
        assert_eq!(log.count(names::TIER_REACHED), 1);

        unsubscribe(&bus, &mut subs);
        assert!(subs.is_empty());
        bus.emit(score(1));
        assert_eq!(counter.borrow().seen, 2);
    }

    #[test]
    fn test_dropped_target_is_ignored() {
        let bus = Rc::new(EventBus::new());
        let counter = Rc::new(RefCell::new(Counter::default()));
        subscribe(&bus, &counter, &[names::SCORE_UPDATE], count_and_promote);
        drop(counter);
        bus.emit(score(1));
    }
}
