// src/config/validate.rs

use crate::config::model::{ConfigFile, HookSection, RawConfigFile, WatchSection};
use crate::errors::{ReloadwatchError, Result};
use crate::watch::patterns::PatternSet;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ReloadwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.hook))
    }
}

/// Re-run validation on an already-built config, e.g. after CLI overrides.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_watch(&cfg.watch)?;
    validate_hook(&cfg.hook)?;
    Ok(())
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_watch(&cfg.watch)?;
    validate_hook(&cfg.hook)?;
    Ok(())
}

fn validate_watch(watch: &WatchSection) -> Result<()> {
    if watch.root.trim().is_empty() {
        return Err(ReloadwatchError::ConfigError(
            "[watch].root must not be empty".to_string(),
        ));
    }

    PatternSet::new(&watch.filter).map_err(|e| {
        ReloadwatchError::ConfigError(format!("invalid pattern in [watch].filter: {e}"))
    })?;
    PatternSet::new(&watch.ignore).map_err(|e| {
        ReloadwatchError::ConfigError(format!("invalid pattern in [watch].ignore: {e}"))
    })?;

    Ok(())
}

fn validate_hook(hook: &HookSection) -> Result<()> {
    if let Some(cmd) = &hook.cmd {
        if cmd.trim().is_empty() {
            return Err(ReloadwatchError::ConfigError(
                "[hook].cmd must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}
