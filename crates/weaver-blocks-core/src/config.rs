//! Editor-level configuration for blocks and inline tools.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::notifier::DEFAULT_DEBOUNCE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocksConfig {
    /// Quiet period before a block reports a change.
    pub mutation_debounce_ms: u64,
    pub link: LinkConfig,
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            mutation_debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            link: LinkConfig::default(),
        }
    }
}

/// Link inline tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// How long the "invalid link" tooltip stays up.
    pub validation_tooltip_ms: u64,
    /// Prefix for links entered without a scheme.
    pub default_protocol: String,
    /// Forced on every created anchor.
    pub target: String,
    /// Forced on every created anchor.
    pub rel: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            validation_tooltip_ms: 1000,
            default_protocol: "https://".to_string(),
            target: "_blank".to_string(),
            rel: "nofollow noopener noreferrer".to_string(),
        }
    }
}

impl LinkConfig {
    pub fn validation_tooltip(&self) -> Duration {
        Duration::from_millis(self.validation_tooltip_ms)
    }
}

impl BlocksConfig {
    /// Parse and check a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mutation_debounce_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "mutation_debounce_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if !self.link.default_protocol.ends_with("://") {
            return Err(ConfigError::Invalid {
                field: "link.default_protocol",
                message: format!("`{}` does not end in `://`", self.link.default_protocol),
            });
        }
        Ok(())
    }

    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }
}
