//! Durable key-value storage and the typed records kept in it
//!
//! Backends implement [`KeyValueStore`]: `MemoryStore` for tests,
//! `FileStore` (native, one JSON file per key) and `LocalStore` (browser
//! LocalStorage). [`Persistence`] layers typed accessors on top; every
//! accessor swallows storage and parse failures after logging them and falls
//! back to an in-memory default, so gameplay code never sees a storage error.

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local;
pub mod memory;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::FeatureConfig;
use crate::highscores::{HighScores, ScoreEntry};
use crate::progress::ProgressionRecord;
use crate::settings::Language;

/// Storage keys
pub mod keys {
    pub const FEATURE_CONFIG: &str = "pachinko_features";
    pub const HIGH_SCORES: &str = "pachinko_highscores";
    pub const STATS: &str = "pachinko_stats";
    pub const USERNAME: &str = "pachinko_username";
    pub const LANGUAGE: &str = "pachinko_language";
    pub const PROGRESSION: &str = "pachinko_progression";
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record under `{key}`: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Raw string key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Lifetime play statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub games_played: u32,
    pub total_score: u64,
    pub best_score: u64,
    pub balls_launched: u64,
    pub best_combo: u32,
}

impl PlayerStats {
    /// Fold a finished game into the totals
    pub fn record_game(&mut self, score: u64, balls_launched: u32, max_combo: u32) {
        self.games_played += 1;
        self.total_score += score;
        self.best_score = self.best_score.max(score);
        self.balls_launched += u64::from(balls_launched);
        self.best_combo = self.best_combo.max(max_combo);
    }
}

/// Typed accessors over a [`KeyValueStore`]
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// In-memory persistence (tests, demo)
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    fn try_read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|source| StorageError::Parse {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_read(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to load {}: {} (using defaults)", key, e);
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize {}: {}", key, e);
                return false;
            }
        };
        match self.store.set(key, &json) {
            Ok(()) => {
                log::debug!("Saved {}", key);
                true
            }
            Err(e) => {
                log::warn!("Failed to save {}: {}", key, e);
                false
            }
        }
    }

    pub fn get_feature_config(&self) -> Option<FeatureConfig> {
        self.read(keys::FEATURE_CONFIG)
    }

    pub fn save_feature_config(&self, config: &FeatureConfig) -> bool {
        self.write(keys::FEATURE_CONFIG, config)
    }

    /// Local leaderboard table
    pub fn get_high_scores(&self) -> HighScores {
        self.read(keys::HIGH_SCORES).unwrap_or_default()
    }

    pub fn get_top_scores(&self, limit: usize) -> Vec<ScoreEntry> {
        let mut entries = self.get_high_scores().entries;
        entries.truncate(limit);
        entries
    }

    /// Insert a score into the local table. Returns the rank achieved.
    pub fn save_score_entry(&self, entry: ScoreEntry) -> Option<usize> {
        let mut scores = self.get_high_scores();
        let rank = scores.add_entry(entry)?;
        self.write(keys::HIGH_SCORES, &scores);
        Some(rank)
    }

    pub fn get_stats(&self) -> PlayerStats {
        self.read(keys::STATS).unwrap_or_default()
    }

    pub fn save_stats(&self, stats: &PlayerStats) -> bool {
        self.write(keys::STATS, stats)
    }

    pub fn get_username(&self) -> Option<String> {
        self.read(keys::USERNAME)
    }

    pub fn save_username(&self, name: &str) -> bool {
        self.write(keys::USERNAME, &name)
    }

    pub fn get_language_preference(&self) -> Option<Language> {
        self.read(keys::LANGUAGE)
    }

    pub fn save_language_preference(&self, language: Language) -> bool {
        self.write(keys::LANGUAGE, &language)
    }

    pub fn get_progression(&self) -> ProgressionRecord {
        self.read(keys::PROGRESSION).unwrap_or_default()
    }

    pub fn save_progression(&self, record: &ProgressionRecord) -> bool {
        self.write(keys::PROGRESSION, record)
    }
}
