pub mod observability_config;
pub mod temporal_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use observability_config::ObservabilityConfig;
pub use temporal_config::TemporalConfig;

use crate::errors::{BitemporalError, BitemporalResult};

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BitemporalConfig {
    pub temporal: TemporalConfig,
    pub observability: ObservabilityConfig,
}

impl BitemporalConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load config from a TOML file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> BitemporalResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BitemporalError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw).map_err(|e| {
            BitemporalError::ConfigError(format!("cannot parse {}: {e}", path.display()))
        })
    }
}
