//! Player settings and preferences
//!
//! Persisted separately from feature configuration.

use serde::{Deserialize, Serialize};

use crate::persistence::Persistence;

/// Name used when the player never entered one
pub const DEFAULT_USERNAME: &str = "Player";

/// Supported UI languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    De,
    Es,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Es => "es",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "fr" | "french" | "français" => Some(Language::Fr),
            "de" | "german" | "deutsch" => Some(Language::De),
            "es" | "spanish" | "español" => Some(Language::Es),
            _ => None,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Name submitted with scores
    pub username: String,
    pub language: Language,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            language: Language::En,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl PlayerSettings {
    /// Effective SFX volume (0 when muted)
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Set the username, ignoring blank input. Trims and caps at 16 chars.
    pub fn set_username(&mut self, name: &str) -> bool {
        let trimmed: String = name.trim().chars().take(16).collect();
        if trimmed.is_empty() {
            return false;
        }
        self.username = trimmed;
        true
    }

    /// Load the persisted parts of the settings
    pub fn load(persistence: &Persistence) -> Self {
        let mut settings = Self::default();
        if let Some(name) = persistence.get_username() {
            settings.set_username(&name);
        }
        if let Some(language) = persistence.get_language_preference() {
            settings.language = language;
        }
        log::info!(
            "Settings loaded (user={}, lang={})",
            settings.username,
            settings.language.as_str()
        );
        settings
    }

    pub fn save(&self, persistence: &Persistence) {
        persistence.save_username(&self.username);
        persistence.save_language_preference(self.language);
        log::info!("Settings saved");
    }
}
