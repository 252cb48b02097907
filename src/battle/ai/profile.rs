//! Bot profiles loaded from TOML
//!
//! A profile fixes the bot's temperament (aggression, caution), how often
//! it blunders and how long it pauses before acting. Each difficulty tier
//! has a built-in profile; `data/bot_profiles/<tier>.toml` can override it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::battle::ai::{BotError, Difficulty};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotProfile {
    /// Name of this profile (set from filename when loaded)
    pub name: String,
    /// Base seed; mixed with turn, phase and state version per decision
    pub seed: u64,
    /// Probability of picking a random candidate instead of the best one
    pub mistake_chance: f64,
    pub thinking_delay_ms: u64,
    /// 0.0 = holds back, 1.0 = closes with the enemy at every chance
    pub aggression: f64,
    /// 0.0 = ignores its own losses, 1.0 = avoids costly trades
    pub caution: f64,
}

impl Default for BotProfile {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::Normal)
    }
}

impl BotProfile {
    /// Built-in profile for a tier
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let (mistake_chance, thinking_delay_ms, aggression, caution) = match difficulty {
            Difficulty::Easy => (0.3, 1500, 0.4, 0.3),
            Difficulty::Normal => (0.1, 1000, 0.6, 0.5),
            Difficulty::Hard => (0.0, 600, 0.7, 0.7),
        };
        Self {
            name: difficulty.as_str().to_string(),
            seed: 0x5eed,
            mistake_chance,
            thinking_delay_ms,
            aggression,
            caution,
        }
    }

    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.thinking_delay_ms)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, BotError> {
        let profile: BotProfile = toml::from_str(contents)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile file; the name comes from the file stem
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, BotError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| BotError::ProfileIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut profile = Self::from_toml_str(&contents)?;
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            profile.name = stem.to_string();
        }
        Ok(profile)
    }

    /// Load `data/bot_profiles/{difficulty}.toml`
    pub fn load(difficulty: Difficulty) -> Result<Self, BotError> {
        Self::load_from(profile_path(difficulty))
    }

    pub fn validate(&self) -> Result<(), BotError> {
        for (name, value) in [
            ("mistake_chance", self.mistake_chance),
            ("aggression", self.aggression),
            ("caution", self.caution),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BotError::InvalidProfile(format!(
                    "{name} must be within 0.0..=1.0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Get path to profile file
fn profile_path(difficulty: Difficulty) -> PathBuf {
    PathBuf::from("data/bot_profiles").join(format!("{}.toml", difficulty.as_str()))
}
