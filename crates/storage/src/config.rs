// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migrator configuration.
//!
//! Resolution order, lowest to highest precedence: built-in defaults, a TOML
//! file, then `SW_*` environment variables.
//!
//! ```toml
//! scratch_dir = "/var/tmp/stepwise"
//! swap_strategy = "staged"   # or "in_place"
//! ```

use crate::env;
use crate::swap::SwapStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigratorConfig {
    /// Directory migrated copies are written to before the swap.
    pub scratch_dir: PathBuf,
    pub swap_strategy: SwapStrategy,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            scratch_dir: env::default_scratch_dir(),
            swap_strategy: SwapStrategy::default(),
        }
    }
}

impl MigratorConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)?.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(dir) = env::scratch_dir_override() {
            self.scratch_dir = dir;
        }
        if let Some(raw) = env::swap_strategy_override() {
            self.swap_strategy = raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: env::SWAP_STRATEGY_VAR.to_string(),
                message,
            })?;
        }
        Ok(self)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
