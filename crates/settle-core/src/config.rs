//! Provider configuration.
//!
//! Read from a JSON file. Unknown fields are rejected so typos surface
//! immediately instead of silently falling back to defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::PollBackoff;
use crate::domain::Tags;

/// Default create/update/delete timeout (30 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to open config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Region used when building ARNs and endpoints.
    #[serde(default = "default_region")]
    pub region: String,

    /// Tags applied to every resource; resource tags win on conflict.
    #[serde(default)]
    pub default_tags: Tags,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub poll: PollConfig,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            default_tags: Tags::new(),
            timeouts: TimeoutsConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl ProviderConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: ProviderConfig =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timeouts;
        if t.create_secs == 0 || t.update_secs == 0 || t.delete_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be greater than zero".to_string()));
        }
        self.poll
            .backoff()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Provider-wide default timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutsConfig {
    #[serde(default = "default_timeout_secs")]
    pub create_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub update_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub delete_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            create_secs: DEFAULT_TIMEOUT_SECS,
            update_secs: DEFAULT_TIMEOUT_SECS,
            delete_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TimeoutsConfig {
    /// Apply per-resource overrides on top of the provider defaults.
    pub fn resolve(&self, overrides: &TimeoutOverrides) -> Timeouts {
        Timeouts {
            create: Duration::from_secs(overrides.create_secs.unwrap_or(self.create_secs)),
            update: Duration::from_secs(overrides.update_secs.unwrap_or(self.update_secs)),
            delete: Duration::from_secs(overrides.delete_secs.unwrap_or(self.delete_secs)),
        }
    }
}

/// The `timeouts` block of a resource model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_secs: Option<u64>,
}

impl TimeoutOverrides {
    pub fn is_empty(&self) -> bool {
        self.create_secs.is_none() && self.update_secs.is_none() && self.delete_secs.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

/// Poll interval settings shared by every wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    #[serde(default = "default_base_delay_millis")]
    pub base_delay_millis: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_base_delay_millis() -> u64 {
    100
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_secs() -> u64 {
    10
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            base_delay_millis: default_base_delay_millis(),
            multiplier: default_multiplier(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl PollConfig {
    pub fn backoff(&self) -> PollBackoff {
        PollBackoff::new(
            Duration::from_millis(self.base_delay_millis),
            self.multiplier,
            Duration::from_secs(self.max_delay_secs),
        )
    }
}
