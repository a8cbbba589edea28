// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{WatchSettings, DEFAULT_DEBOUNCE};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// root = "."
/// filter = ["*.go", "go.mod"]
/// ignore = ["*.tmp", "testdata"]
/// debounce_ms = 300
///
/// [hook]
/// cmd = "go build ./... && ./app"
/// long_lived = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub hook: HookSection,
}

/// Validated configuration. Only constructed through `TryFrom<RawConfigFile>`
/// or [`ConfigFile::new_unchecked`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub hook: HookSection,
}

impl ConfigFile {
    /// Build a config without validation. Callers are expected to have
    /// checked the sections already.
    pub fn new_unchecked(watch: WatchSection, hook: HookSection) -> Self {
        Self { watch, hook }
    }

    /// Settings the watch session reads.
    pub fn to_settings(&self) -> WatchSettings {
        WatchSettings {
            root: PathBuf::from(&self.watch.root),
            filter: self.watch.filter.clone(),
            ignore: self.watch.ignore.clone(),
            use_ignore_file: self.watch.use_gitignore,
            recursive: self.watch.recursive,
            debounce_ms: self.watch.debounce_ms,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(WatchSection::default(), HookSection::default())
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// When false, the hook runs once and nothing is watched.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory to watch, relative to the working directory.
    #[serde(default = "default_root")]
    pub root: String,

    /// Allow-list; empty means every non-ignored file counts.
    #[serde(default)]
    pub filter: Vec<String>,

    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Quiet period. Zero or negative falls back to 300 ms.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: i64,

    /// Merged with the built-in ignore lists.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Honour `.gitignore` at the root.
    #[serde(default = "default_true")]
    pub use_gitignore: bool,
}

fn default_true() -> bool {
    true
}

fn default_root() -> String {
    ".".to_string()
}

fn default_debounce_ms() -> i64 {
    DEFAULT_DEBOUNCE.as_millis() as i64
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            enabled: true,
            root: default_root(),
            filter: Vec::new(),
            recursive: true,
            debounce_ms: default_debounce_ms(),
            ignore: Vec::new(),
            use_gitignore: true,
        }
    }
}

/// `[hook]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct HookSection {
    /// Shell command run when changes settle.
    ///
    /// Required before watching starts, either here or via `--cmd`.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Restart a persistent process instead of running to completion.
    #[serde(default)]
    pub long_lived: bool,
}
