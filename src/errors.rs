// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReloadwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("cannot read watch root {path:?}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Watcher error: {0}")]
    NotifyError(#[from] notify::Error),

    #[error("Invalid pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error("Ignore file error: {0}")]
    IgnoreError(#[from] ignore::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ReloadwatchError>;
