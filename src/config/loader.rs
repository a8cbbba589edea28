// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ReloadwatchError, Result};

/// File name looked up in the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "Reloadwatch.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        ReloadwatchError::ConfigError(format!("cannot read config {}: {e}", path.display()))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` default functions).
/// - Checks root, hook command and pattern syntax.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Like [`load_and_validate`], but a missing file at `path` yields the
/// built-in defaults when `allow_missing` is set.
///
/// Used for the default config location, which is optional; an explicitly
/// passed path must exist.
pub fn load_or_default(path: impl AsRef<Path>, allow_missing: bool) -> Result<ConfigFile> {
    let path = path.as_ref();
    if allow_missing && !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(ConfigFile::default());
    }

    let config = load_and_validate(path)?;
    info!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Helper to resolve the default config path (`Reloadwatch.toml` in the
/// current working directory).
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
