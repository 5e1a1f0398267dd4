//! Registry configuration, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a [`SymbolRegistry`](crate::registry::SymbolRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory of the durable record store. `None` for memory-only mode.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Bound on namespace parent-chain walks; deeper chains are treated as cycles.
    #[serde(default = "default_max_namespace_depth")]
    pub max_namespace_depth: usize,
    /// Maximum symbol name length in characters.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Capacity hint for the object cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_max_namespace_depth() -> usize {
    256
}
fn default_max_name_length() -> usize {
    2000
}
fn default_cache_capacity() -> usize {
    1024
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_namespace_depth: default_max_namespace_depth(),
            max_name_length: default_max_name_length(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl RegistryConfig {
    /// Memory-only configuration with default limits.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Durable configuration rooted at `dir`.
    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_namespace_depth == 0 {
            return Err(ConfigError::Invalid {
                message: "max_namespace_depth must be > 0".into(),
            });
        }
        if self.max_name_length == 0 {
            return Err(ConfigError::Invalid {
                message: "max_name_length must be > 0".into(),
            });
        }
        Ok(())
    }
}
