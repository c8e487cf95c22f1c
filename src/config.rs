use std::path::Path;

use crate::ai::LearnerConfig;
use crate::checkpoint::CheckpointManagerConfig;
use crate::error::ConfigError;
use crate::game::POSITION_ROWS;
use crate::nn::NetworkConfig;
use crate::training::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub player: LearnerConfig,
    pub training: TrainerConfig,
    pub checkpoint: CheckpointManagerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let network = &self.network;
        if network.inputs != POSITION_ROWS {
            return Err(ConfigError::Validation(format!(
                "network.inputs must be {POSITION_ROWS}"
            )));
        }
        if network.outputs != 1 {
            return Err(ConfigError::Validation("network.outputs must be 1".into()));
        }
        if network.hidden.is_empty() || network.hidden.contains(&0) {
            return Err(ConfigError::Validation(
                "network.hidden must list at least one non-empty layer".into(),
            ));
        }
        if network.eta <= 0.0 {
            return Err(ConfigError::Validation("network.eta must be > 0".into()));
        }
        if network.lambda < 0.0 {
            return Err(ConfigError::Validation("network.lambda must be >= 0".into()));
        }
        if network.parallel_threshold == 0 {
            return Err(ConfigError::Validation(
                "network.parallel_threshold must be > 0".into(),
            ));
        }

        let player = &self.player;
        if player.gamma <= 0.0 || player.gamma > 1.0 {
            return Err(ConfigError::Validation("player.gamma must be in (0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&player.epsilon) {
            return Err(ConfigError::Validation("player.epsilon must be in [0, 1]".into()));
        }
        if player.train_iterations == 0 {
            return Err(ConfigError::Validation(
                "player.train_iterations must be > 0".into(),
            ));
        }

        let training = &self.training;
        if training.episodes == 0 {
            return Err(ConfigError::Validation("training.episodes must be > 0".into()));
        }
        if training.batch_games == 0 {
            return Err(ConfigError::Validation("training.batch_games must be > 0".into()));
        }
        if training.log_interval == 0 {
            return Err(ConfigError::Validation("training.log_interval must be > 0".into()));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&AppConfig::default())
    }
}
