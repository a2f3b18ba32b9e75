//! Per-game counters and the predicates evaluated against them

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::events::GameEvent;

/// Counter a condition watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Score,
    Combo,
    BallsLaunched,
    Consecutive,
    BucketCount,
    GoldenBalls,
    MysteryHits,
    LuckyZoneHits,
}

/// Unlock condition (`{type, value}` or `{type: bucket_count, bucketValue, count}`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Score { value: u64 },
    Combo { value: u32 },
    BallsLaunched { value: u32 },
    Consecutive { value: u32 },
    #[serde(rename_all = "camelCase")]
    BucketCount { bucket_value: u32, count: u32 },
    GoldenBalls { value: u32 },
    MysteryHits { value: u32 },
    LuckyZoneHits { value: u32 },
}

impl Condition {
    pub fn metric(&self) -> Metric {
        match self {
            Condition::Score { .. } => Metric::Score,
            Condition::Combo { .. } => Metric::Combo,
            Condition::BallsLaunched { .. } => Metric::BallsLaunched,
            Condition::Consecutive { .. } => Metric::Consecutive,
            Condition::BucketCount { .. } => Metric::BucketCount,
            Condition::GoldenBalls { .. } => Metric::GoldenBalls,
            Condition::MysteryHits { .. } => Metric::MysteryHits,
            Condition::LuckyZoneHits { .. } => Metric::LuckyZoneHits,
        }
    }

    pub fn target(&self) -> u64 {
        match *self {
            Condition::Score { value } => value,
            Condition::Combo { value }
            | Condition::BallsLaunched { value }
            | Condition::Consecutive { value }
            | Condition::GoldenBalls { value }
            | Condition::MysteryHits { value }
            | Condition::LuckyZoneHits { value } => u64::from(value),
            Condition::BucketCount { count, .. } => u64::from(count),
        }
    }

    /// Current value of the watched counter
    pub fn progress(&self, session: &GameSession) -> u64 {
        match *self {
            Condition::Score { .. } => session.score,
            Condition::Combo { .. } => u64::from(session.max_combo),
            Condition::BallsLaunched { .. } => u64::from(session.balls_launched),
            Condition::Consecutive { .. } => u64::from(session.consecutive_survived),
            Condition::BucketCount { bucket_value, .. } => u64::from(session.bucket_hits(bucket_value)),
            Condition::GoldenBalls { .. } => u64::from(session.golden_balls),
            Condition::MysteryHits { .. } => u64::from(session.mystery_hits),
            Condition::LuckyZoneHits { .. } => u64::from(session.lucky_zone_hits),
        }
    }

    pub fn is_met(&self, session: &GameSession) -> bool {
        self.progress(session) >= self.target()
    }
}

/// Counters for the game in progress; reset on `game:start`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameSession {
    pub score: u64,
    pub max_combo: u32,
    pub balls_launched: u32,
    /// Balls in a row that reached a bucket
    pub consecutive_survived: u32,
    /// Landings per bucket value
    pub bucket_hits: BTreeMap<u32, u32>,
    pub golden_balls: u32,
    pub mystery_hits: u32,
    pub lucky_zone_hits: u32,
}

impl GameSession {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn bucket_hits(&self, bucket_value: u32) -> u32 {
        self.bucket_hits.get(&bucket_value).copied().unwrap_or(0)
    }

    /// Fold an event into the counters; returns the metrics it touched
    pub fn apply(&mut self, event: &GameEvent) -> Vec<Metric> {
        match *event {
            GameEvent::GameStarted { .. } => {
                self.reset();
                Vec::new()
            }
            GameEvent::ScoreUpdate { total, .. } => {
                self.score = total;
                vec![Metric::Score]
            }
            GameEvent::ComboUpdate { combo, .. } => {
                self.max_combo = self.max_combo.max(combo);
                vec![Metric::Combo]
            }
            GameEvent::BallLaunched { .. } => {
                self.balls_launched += 1;
                vec![Metric::BallsLaunched]
            }
            GameEvent::BallLost { .. } => {
                self.consecutive_survived = 0;
                vec![Metric::Consecutive]
            }
            GameEvent::BallHitBucket { bucket_value, .. } => {
                *self.bucket_hits.entry(bucket_value).or_insert(0) += 1;
                self.consecutive_survived += 1;
                vec![Metric::BucketCount, Metric::Consecutive]
            }
            GameEvent::GoldenBallTriggered { .. } => {
                self.golden_balls += 1;
                vec![Metric::GoldenBalls]
            }
            GameEvent::MysteryBucketHit { .. } => {
                self.mystery_hits += 1;
                vec![Metric::MysteryHits]
            }
            GameEvent::LuckyZoneHit { .. } => {
                self.lucky_zone_hits += 1;
                vec![Metric::LuckyZoneHits]
            }
            _ => Vec::new(),
        }
    }
}
