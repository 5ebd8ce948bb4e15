//! Configuration loading and management
//!
//! Handles parsing of `huddle.toml` from the data directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Acting-user configuration
    #[serde(default)]
    pub user: UserConfig,

    /// Board configuration
    #[serde(default)]
    pub boards: BoardsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: UserConfig::default(),
            boards: BoardsConfig::default(),
        }
    }
}

/// Acting-user configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Default user identity when none is supplied
    #[serde(default = "default_user")]
    pub default: String,
}

fn default_user() -> String {
    "unknown".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            default: default_user(),
        }
    }
}

/// Board configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardsConfig {
    /// Columns created on a new board; the first one becomes the default
    #[serde(default = "default_columns")]
    pub default_columns: Vec<String>,

    /// WIP limit applied to newly created columns (none = unlimited)
    #[serde(default)]
    pub default_wip_limit: Option<u32>,
}

fn default_columns() -> Vec<String> {
    vec![
        "Backlog".to_string(),
        "In Progress".to_string(),
        "Done".to_string(),
    ]
}

impl Default for BoardsConfig {
    fn default() -> Self {
        Self {
            default_columns: default_columns(),
            default_wip_limit: None,
        }
    }
}

impl Config {
    /// Load configuration from a `huddle.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_data_dir(data_root: &Path) -> Self {
        let config_path = data_root.join("huddle.toml");
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.boards.validate()?;
        Ok(())
    }
}

impl BoardsConfig {
    fn validate(&self) -> Result<()> {
        if self.default_columns.is_empty() {
            return Err(Error::InvalidConfig(
                "boards.default_columns cannot be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for name in &self.default_columns {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(Error::InvalidConfig(
                    "boards.default_columns cannot include empty entries".to_string(),
                ));
            }
            if !seen.insert(trimmed.to_string()) {
                return Err(Error::InvalidConfig(format!(
                    "boards.default_columns has duplicate entry '{trimmed}'"
                )));
            }
        }

        if let Some(limit) = self.default_wip_limit {
            if limit == 0 {
                return Err(Error::InvalidConfig(
                    "boards.default_wip_limit must be > 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}
