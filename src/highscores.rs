//! Local high scores and the optional global leaderboard
//!
//! A local top-10 table persisted through [`Persistence`], plus an optional
//! remote leaderboard. Scores are always written locally first; the remote
//! is best-effort and any failure falls back to the local table.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{FeatureRegistry, ids};
use crate::persistence::Persistence;

/// Rows kept in the local table
pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub username: String,
    pub score: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp: f64,
}

/// Local table, best first. Equal scores keep their arrival order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<ScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-based slot `score` would take, below any equal scores
    fn slot(&self, score: u64) -> usize {
        self.entries.partition_point(|e| e.score >= score)
    }

    /// 1-based rank `score` would reach, `None` when it would not make the table
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let slot = self.slot(score);
        (slot < MAX_HIGH_SCORES).then_some(slot + 1)
    }

    pub fn qualifies(&self, score: u64) -> bool {
        self.potential_rank(score).is_some()
    }

    /// Insert `entry` and return its 1-based rank, or `None` if it missed the cut
    pub fn add_entry(&mut self, entry: ScoreEntry) -> Option<usize> {
        let rank = self.potential_rank(entry.score)?;
        self.entries.insert(rank - 1, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("leaderboard request failed: {0}")]
    Network(String),
    #[error("leaderboard rejected submission: {0}")]
    Rejected(String),
}

/// Remote leaderboard backend. Implementations own their transport.
pub trait RemoteLeaderboard {
    fn fetch_top_scores(&self) -> Result<Vec<ScoreEntry>, RemoteError>;
    fn submit_score(&self, username: &str, score: u64) -> Result<bool, RemoteError>;
}

/// Where a leaderboard read was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    Remote,
    Local,
}

/// Local-first leaderboard with optional global backend
pub struct Leaderboard {
    persistence: Rc<Persistence>,
    features: Rc<RefCell<FeatureRegistry>>,
    remote: Option<Box<dyn RemoteLeaderboard>>,
}

impl Leaderboard {
    pub fn new(persistence: Rc<Persistence>, features: Rc<RefCell<FeatureRegistry>>) -> Self {
        Self {
            persistence,
            features,
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: Box<dyn RemoteLeaderboard>) -> Self {
        self.remote = Some(remote);
        self
    }

    fn active_remote(&self) -> Option<&dyn RemoteLeaderboard> {
        if !self.features.borrow().is_enabled(ids::GLOBAL_LEADERBOARD) {
            return None;
        }
        self.remote.as_deref()
    }

    /// Record a score. Returns the local rank achieved.
    pub fn submit(&self, username: &str, score: u64, timestamp: f64) -> Option<usize> {
        let rank = self.persistence.save_score_entry(ScoreEntry {
            username: username.to_string(),
            score,
            timestamp,
        });

        if let Some(remote) = self.active_remote() {
            match remote.submit_score(username, score) {
                Ok(true) => log::info!("Submitted {} to global leaderboard", score),
                Ok(false) => log::warn!("Global leaderboard declined score {}", score),
                Err(e) => log::warn!("Global leaderboard unavailable: {}", e),
            }
        }

        rank
    }

    /// Top scores, preferring the global board when it is reachable
    pub fn top_scores(&self, limit: usize) -> (Vec<ScoreEntry>, ScoreSource) {
        if let Some(remote) = self.active_remote() {
            match remote.fetch_top_scores() {
                Ok(mut entries) => {
                    entries.truncate(limit);
                    return (entries, ScoreSource::Remote);
                }
                Err(e) => log::warn!("Falling back to local scores: {}", e),
            }
        }
        (self.persistence.get_top_scores(limit), ScoreSource::Local)
    }
}
