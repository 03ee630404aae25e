use std::path::PathBuf;

use thiserror::Error;

use crate::Family;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {family} settings: {reason}")]
    InvalidConfiguration { family: Family, reason: String },

    #[error("Settings are sealed and can no longer be modified")]
    ConfigurationFrozen,

    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(family: Family, reason: impl Into<String>) -> Self {
        ConfigError::InvalidConfiguration {
            family,
            reason: reason.into(),
        }
    }
}
