//! Engine configuration loaded from JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio_engine::errors::ConfigError;
use crate::banks::BankSet;

/// What the engine does when a pad is triggered before power-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerOnPolicy {
    /// Ignore triggers until the user powers the engine on.
    #[default]
    Explicit,
    /// Treat the first trigger as the power-on gesture.
    OnFirstTrigger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundboardConfig {
    /// Directory that sound paths are resolved against.
    pub asset_root: PathBuf,
    pub power_on_policy: PowerOnPolicy,
    pub banks: BankSet,
}

impl Default for SoundboardConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            power_on_policy: PowerOnPolicy::default(),
            banks: BankSet::default(),
        }
    }
}

impl SoundboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a config file. A relative `asset_root` is resolved against the file's directory.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&text)?;

        if config.asset_root.is_relative()
            && let Some(dir) = path.parent()
        {
            config.asset_root = dir.join(&config.asset_root);
        }

        log::info!(
            "Loaded config from {} ({} banks)",
            path.display(),
            config.banks.len()
        );
        Ok(config)
    }
}
