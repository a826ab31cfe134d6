//! Engine configuration, loaded from TOML.
//!
//! Every section has defaults, so an empty document is a valid configuration.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("failed to parse configuration: {message}")]
    Parse { message: String },

    #[error("invalid configuration value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

///
/// EngineConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub introspection: IntrospectionConfig,
    pub tracking: TrackingConfig,
    pub identity: IdentityConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let intro = &self.introspection;

        if intro.id_token.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "introspection.id_token",
                message: "token must not be empty".to_string(),
            });
        }
        if intro.version_token.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "introspection.version_token",
                message: "token must not be empty".to_string(),
            });
        }
        if intro.default_min_length > intro.default_max_length {
            return Err(ConfigError::Invalid {
                key: "introspection.default_min_length",
                message: format!(
                    "{} exceeds default_max_length {}",
                    intro.default_min_length, intro.default_max_length
                ),
            });
        }

        Ok(())
    }
}

///
/// IntrospectionConfig
/// Controls template construction and missing-attribute defaults.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntrospectionConfig {
    /// Name token used to recognise id properties by convention.
    pub id_token: String,

    /// Name token used to recognise version properties by convention.
    pub version_token: String,

    pub default_max_length: usize,
    pub default_min_length: usize,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            id_token: "id".to_string(),
            version_token: "version".to_string(),
            default_max_length: 2000,
            default_min_length: 0,
        }
    }
}

///
/// TrackingConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackingConfig {
    /// Persistent objects defer object and collection properties until read.
    pub lazy_load_persistent: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            lazy_load_persistent: true,
        }
    }
}

///
/// IdentityConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Maximum number of identity anomalies retained by the observer cache.
    pub anomaly_log_limit: usize,

    /// Fail observer creation instead of recording the anomaly.
    pub reject_duplicates: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            anomaly_log_limit: 256,
            reject_duplicates: false,
        }
    }
}
