//! Daily challenge and login streak
//!
//! The challenge of the day is picked deterministically from the date, so
//! every player gets the same one without any server involvement.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::session::{Condition, GameSession};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyChallengeDef {
    pub id: &'static str,
    pub description_key: &'static str,
    pub condition: Condition,
    /// Credits awarded on completion
    pub reward: u64,
}

macro_rules! challenge {
    ($id:literal, $cond:expr, $reward:expr) => {
        DailyChallengeDef {
            id: $id,
            description_key: concat!("daily.", $id),
            condition: $cond,
            reward: $reward,
        }
    };
}

pub static DAILY_CHALLENGES: &[DailyChallengeDef] = &[
    challenge!("score_2000", Condition::Score { value: 2_000 }, 100),
    challenge!("combo_8", Condition::Combo { value: 8 }, 150),
    challenge!("launch_20", Condition::BallsLaunched { value: 20 }, 75),
    challenge!(
        "jackpot_3",
        Condition::BucketCount {
            bucket_value: 100,
            count: 3
        },
        200
    ),
    challenge!("survive_15", Condition::Consecutive { value: 15 }, 125),
    challenge!("golden_2", Condition::GoldenBalls { value: 2 }, 175),
    challenge!("score_5000", Condition::Score { value: 5_000 }, 250),
];

/// Persisted state of the current day's challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallengeState {
    pub id: String,
    pub date: NaiveDate,
    /// Best progress seen today
    pub progress: u64,
    pub completed: bool,
}

impl DailyChallengeState {
    pub fn fresh(def: &DailyChallengeDef, date: NaiveDate) -> Self {
        Self {
            id: def.id.to_string(),
            date,
            progress: 0,
            completed: false,
        }
    }
}

/// Sum of the date components
pub fn date_seed(date: NaiveDate) -> u32 {
    date.year().unsigned_abs() + date.month() + date.day()
}

/// The challenge of the day
pub fn challenge_for_date(date: NaiveDate) -> &'static DailyChallengeDef {
    let index = date_seed(date) as usize % DAILY_CHALLENGES.len();
    &DAILY_CHALLENGES[index]
}

pub fn find(id: &str) -> Option<&'static DailyChallengeDef> {
    DAILY_CHALLENGES.iter().find(|c| c.id == id)
}

/// Record progress against `def`. Returns `true` exactly once, on the update
/// that completes the challenge.
pub fn record_progress(state: &mut DailyChallengeState, def: &DailyChallengeDef, session: &GameSession) -> bool {
    if state.completed {
        return false;
    }
    state.progress = state.progress.max(def.condition.progress(session));
    if state.progress >= def.condition.target() {
        state.completed = true;
        return true;
    }
    false
}

/// Streak after logging in on `today`
///
/// One day after the last login extends the streak, a longer gap restarts it
/// at 1, and another login the same day leaves it alone. A clock that went
/// backwards is treated like a same-day login.
pub fn next_streak(last_login: Option<NaiveDate>, streak: u32, today: NaiveDate) -> u32 {
    let Some(last) = last_login else {
        return 1;
    };
    match today.signed_duration_since(last).num_days() {
        1 => streak.saturating_add(1),
        gap if gap > 1 => 1,
        _ => streak.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_seed_is_component_sum() {
        assert_eq!(date_seed(date(2024, 3, 15)), 2042);
        let expected = &DAILY_CHALLENGES[2042 % DAILY_CHALLENGES.len()];
        assert_eq!(challenge_for_date(date(2024, 3, 15)).id, expected.id);
    }

    #[test]
    fn test_same_day_same_challenge() {
        let a = challenge_for_date(date(2025, 1, 1));
        let b = challenge_for_date(date(2025, 1, 1));
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_streak_rules() {
        let today = date(2025, 6, 10);
        assert_eq!(next_streak(None, 0, today), 1);
        assert_eq!(next_streak(Some(date(2025, 6, 9)), 4, today), 5);
        assert_eq!(next_streak(Some(date(2025, 6, 10)), 4, today), 4);
        assert_eq!(next_streak(Some(date(2025, 6, 7)), 4, today), 1);
        // Month boundary
        assert_eq!(next_streak(Some(date(2025, 5, 31)), 2, date(2025, 6, 1)), 3);
    }

    #[test]
    fn test_completes_once() {
        let def = find("combo_8").unwrap();
        let mut state = DailyChallengeState::fresh(def, date(2025, 1, 1));
        let mut session = GameSession::default();

        session.max_combo = 5;
        assert!(!record_progress(&mut state, def, &session));
        assert_eq!(state.progress, 5);

        session.max_combo = 9;
        assert!(record_progress(&mut state, def, &session));
        assert!(state.completed);
        assert!(!record_progress(&mut state, def, &session));
    }

    #[test]
    fn test_progress_keeps_best_across_games() {
        let def = find("score_2000").unwrap();
        let mut state = DailyChallengeState::fresh(def, date(2025, 1, 1));
        let mut session = GameSession::default();
        session.score = 1500;
        record_progress(&mut state, def, &session);
        session.reset();
        session.score = 200;
        record_progress(&mut state, def, &session);
        assert_eq!(state.progress, 1500);
    }
}
