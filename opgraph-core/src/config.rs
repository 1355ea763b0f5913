//! Graph configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bound on nested slot evaluations in one pull.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 128;

/// Tunables for a [`Graph`](crate::graph::Graph).
///
/// Missing fields in a config file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum depth of the evaluation stack before a pull is aborted.
    pub max_recursion_depth: usize,

    /// Emit a trace event for every cache hit. Noisy; off by default.
    pub log_cache_hits: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            log_cache_hits: false,
        }
    }
}

impl GraphConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_recursion_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_recursion_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
