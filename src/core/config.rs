//! Battle configuration with documented defaults
//!
//! Tunable values that shape a match but are not rules of the game itself.
//! Rule constants live in `battle::constants`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for a battle and the session that hosts it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    // === MAP ===
    /// Number of columns (axial q runs from 0 to width - 1)
    pub map_width: i32,

    /// Number of rows (axial r runs from 0 to height - 1)
    ///
    /// Row 0 is player 1's home edge, the last row is player 2's.
    /// Routing units flee toward these rows.
    pub map_height: i32,

    /// Chance that a generated interior hex is forest
    ///
    /// Forest slows movement, grants cover and blocks line of sight,
    /// so dense forest makes ranged units much weaker.
    pub forest_chance: f64,

    /// Chance that a generated interior hex is a hill
    pub hill_chance: f64,

    // === SESSION ===
    /// How many times a session reloads and re-validates an action after
    /// the backend rejects a save as conflicting
    pub save_retry_limit: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            map_width: crate::battle::constants::DEFAULT_MAP_WIDTH,
            map_height: crate::battle::constants::DEFAULT_MAP_HEIGHT,
            forest_chance: 0.08,
            hill_chance: 0.06,
            save_retry_limit: 3,
        }
    }
}

impl BattleConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML, filling missing keys with defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: BattleConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Need room for two home rows and at least one row between them
        if self.map_width < 2 || self.map_height < 3 {
            return Err(ConfigError::Invalid(format!(
                "map must be at least 2x3, got {}x{}",
                self.map_width, self.map_height
            )));
        }

        for (name, chance) in [
            ("forest_chance", self.forest_chance),
            ("hill_chance", self.hill_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within 0.0..=1.0, got {chance}"
                )));
            }
        }

        if self.forest_chance + self.hill_chance > 1.0 {
            return Err(ConfigError::Invalid(
                "forest_chance + hill_chance must not exceed 1.0".into(),
            ));
        }

        if self.save_retry_limit == 0 {
            return Err(ConfigError::Invalid(
                "save_retry_limit must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BattleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BattleConfig::from_toml_str("map_width = 16\n").unwrap();
        assert_eq!(config.map_width, 16);
        assert_eq!(config.map_height, BattleConfig::default().map_height);
    }

    #[test]
    fn test_rejects_tiny_map() {
        let config = BattleConfig {
            map_height: 2,
            ..BattleConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_oversaturated_terrain() {
        let result = BattleConfig::from_toml_str("forest_chance = 0.7\nhill_chance = 0.5\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = BattleConfig::from_toml_str("map_width = \"wide\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = BattleConfig::load("does/not/exist.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
