//! Combo-unlocked power-ups and the golden ball roll
//!
//! Reaching exactly combo 5, 10, 20 or 30 arms magnet, multi-ball, ghost or
//! big-ball for a number of launches. Each launch asks for the next ball's
//! modifiers, which spends one charge of every armed power-up.

use std::cell::RefCell;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::events::{EventBus, GameEvent, Subscriptions, names, subscribe};
use crate::features::{FeatureRegistry, ids};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    Magnet,
    MultiBall,
    Ghost,
    BigBall,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Magnet,
        PowerUpKind::MultiBall,
        PowerUpKind::Ghost,
        PowerUpKind::BigBall,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            PowerUpKind::Magnet => "magnet",
            PowerUpKind::MultiBall => "multiBall",
            PowerUpKind::Ghost => "ghost",
            PowerUpKind::BigBall => "bigBall",
        }
    }

    /// Combo value that arms this power-up
    pub fn combo_threshold(&self) -> u32 {
        match self {
            PowerUpKind::Magnet => 5,
            PowerUpKind::MultiBall => 10,
            PowerUpKind::Ghost => 20,
            PowerUpKind::BigBall => 30,
        }
    }

    /// Exact-match lookup; combos between milestones arm nothing
    pub fn for_combo(combo: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.combo_threshold() == combo)
    }

    fn launches_param(&self) -> &'static str {
        match self {
            PowerUpKind::Magnet => "magnetLaunches",
            PowerUpKind::MultiBall => "multiBallLaunches",
            PowerUpKind::Ghost => "ghostLaunches",
            PowerUpKind::BigBall => "bigBallLaunches",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Modifiers for the next launched ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallModifiers {
    pub magnet: bool,
    pub ghost: bool,
    pub big_ball: bool,
    /// Additional balls to spawn with this launch
    pub extra_balls: u32,
    pub golden: bool,
    pub score_multiplier: f64,
}

impl Default for BallModifiers {
    fn default() -> Self {
        Self {
            magnet: false,
            ghost: false,
            big_ball: false,
            extra_balls: 0,
            golden: false,
            score_multiplier: 1.0,
        }
    }
}

pub const WATCHED_EVENTS: &[&str] = &[names::GAME_START, names::COMBO_UPDATE];

pub struct PowerUpManager {
    bus: Rc<EventBus>,
    features: Rc<RefCell<FeatureRegistry>>,
    /// Remaining launches per kind (0 = inactive)
    remaining: [u32; 4],
    rng: Pcg32,
}

impl PowerUpManager {
    pub fn new(bus: Rc<EventBus>, features: Rc<RefCell<FeatureRegistry>>, seed: u64) -> Self {
        Self {
            bus,
            features,
            remaining: [0; 4],
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn attach(this: &Rc<RefCell<Self>>) -> Subscriptions {
        let bus = Rc::clone(&this.borrow().bus);
        subscribe(&bus, this, WATCHED_EVENTS, Self::handle_event)
    }

    pub fn handle_event(&mut self, event: &GameEvent) -> Vec<GameEvent> {
        match *event {
            GameEvent::GameStarted { .. } => {
                self.remaining = [0; 4];
                Vec::new()
            }
            GameEvent::ComboUpdate { combo, .. } => match PowerUpKind::for_combo(combo) {
                Some(kind) => self.activate(kind).into_iter().collect(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Arm (or re-arm) `kind` with its configured launch count
    pub fn activate(&mut self, kind: PowerUpKind) -> Option<GameEvent> {
        let features = self.features.borrow();
        if !features.is_enabled(ids::POWER_UPS) {
            return None;
        }
        let launches = features.number_or(ids::POWER_UPS, kind.launches_param(), 1.0).max(1.0) as u32;
        self.remaining[kind.index()] = launches;
        log::info!("Power-up {} armed for {} launch(es)", kind.id(), launches);
        Some(GameEvent::PowerUpActivated { kind })
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.remaining[kind.index()] > 0
    }

    pub fn remaining(&self, kind: PowerUpKind) -> u32 {
        self.remaining[kind.index()]
    }

    pub fn active(&self) -> Vec<PowerUpKind> {
        PowerUpKind::ALL.into_iter().filter(|k| self.is_active(*k)).collect()
    }

    /// Modifiers for the ball about to launch, spending one charge of each
    /// armed power-up and rolling for a golden ball. Emits expiry and golden
    /// events on the bus.
    pub fn get_next_ball_modifiers(&mut self) -> BallModifiers {
        let mut out = Vec::new();
        let mods = self.next_ball_modifiers(&mut out);
        for e in out {
            self.bus.emit(e);
        }
        mods
    }

    fn next_ball_modifiers(&mut self, out: &mut Vec<GameEvent>) -> BallModifiers {
        let features = self.features.borrow();
        let mut mods = BallModifiers::default();

        for kind in PowerUpKind::ALL {
            let left = &mut self.remaining[kind.index()];
            if *left == 0 {
                continue;
            }
            match kind {
                PowerUpKind::Magnet => mods.magnet = true,
                PowerUpKind::Ghost => mods.ghost = true,
                PowerUpKind::BigBall => mods.big_ball = true,
                PowerUpKind::MultiBall => {
                    mods.extra_balls = features.number_or(ids::POWER_UPS, "multiBallExtra", 2.0).max(0.0) as u32;
                }
            }
            *left -= 1;
            if *left == 0 {
                log::debug!("Power-up {} expired", kind.id());
                out.push(GameEvent::PowerUpExpired { kind });
            }
        }

        if features.is_enabled(ids::GOLDEN_BALL) {
            let chance = features.number(ids::GOLDEN_BALL, "chance").unwrap_or(0.0).clamp(0.0, 1.0);
            if self.rng.random_bool(chance) {
                let multiplier = features.number(ids::GOLDEN_BALL, "multiplier").unwrap_or(1.0);
                mods.golden = true;
                mods.score_multiplier *= multiplier;
                out.push(GameEvent::GoldenBallTriggered { multiplier });
            }
        }
        mods
    }
}
