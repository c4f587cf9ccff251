//! Config file discovery and loading
//!
//! Config is searched in order:
//! 1. Explicit path (`--config` / `INSTRUMENT_CONFIG_PATH`)
//! 2. `./instrument.toml`
//! 3. `$XDG_CONFIG_HOME/instrument/config.toml`
//! 4. `~/.instrument.toml`
//! 5. Default config if none found
//!
//! An explicit path must exist and parse. Discovered files that fail to parse
//! are skipped with a warning.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::types::{Config, InstrumentError};

/// Values from the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, InstrumentError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            InstrumentError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| InstrumentError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Load config from an explicit path or the standard locations
    pub fn load(explicit: Option<&Path>) -> Result<Self, InstrumentError> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            tracing::info!("Loaded config from {}", path.display());
            return Ok(config);
        }

        for path in search_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    return Ok(config);
                }
                Err(e) => tracing::warn!("Skipping config: {}", e),
            }
        }

        tracing::info!("Using default configuration");
        Ok(Config::default())
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(data_dir) = overrides.data_dir {
            self.runner.data_dir = data_dir;
        }
        self
    }
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("instrument.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("instrument").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".instrument.toml"));
    }

    paths
}
