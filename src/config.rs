// src/config.rs

//! Configuration loading.
//!
//! Resolves the file, applies environment overrides and validates, in that
//! order. The result is the one `Config` a process uses.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Config;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "jobwatch.toml";

/// Where the configuration comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Explicitly requested; must exist and parse
    Explicit(PathBuf),
    /// Default location; missing falls back to defaults, broken is an error
    Default(PathBuf),
}

impl ConfigSource {
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::Explicit(path),
            None => Self::Default(PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::Default(path) => path,
        }
    }
}

/// Load, override and validate the configuration.
pub fn load_config<F>(source: &ConfigSource, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match source {
        ConfigSource::Explicit(path) => Config::load(path)?,
        ConfigSource::Default(path) if path.exists() => Config::load(path)?,
        ConfigSource::Default(path) => {
            log::debug!("No config file at {}; using defaults", path.display());
            Config::default()
        }
    };

    let config = config.with_env_overrides(lookup)?;
    config.validate()?;
    Ok(config)
}
