#![allow(dead_code)]

use std::path::PathBuf;

use reloadwatch::config::{ConfigFile, HookSection, RawConfigFile, WatchSection};
use reloadwatch::types::WatchSettings;

/// Builder for `WatchSettings` to simplify test setup.
pub struct WatchSettingsBuilder {
    settings: WatchSettings,
}

impl WatchSettingsBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            settings: WatchSettings::new(root),
        }
    }

    pub fn filter(mut self, pattern: &str) -> Self {
        self.settings.filter.push(pattern.to_string());
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.settings.ignore.push(pattern.to_string());
        self
    }

    pub fn use_ignore_file(mut self, val: bool) -> Self {
        self.settings.use_ignore_file = val;
        self
    }

    pub fn recursive(mut self, val: bool) -> Self {
        self.settings.recursive = val;
        self
    }

    pub fn debounce_ms(mut self, ms: i64) -> Self {
        self.settings.debounce_ms = ms;
        self
    }

    pub fn build(self) -> WatchSettings {
        self.settings
    }
}

/// Builder for `ConfigFile`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                watch: WatchSection::default(),
                hook: HookSection::default(),
            },
        }
    }

    pub fn root(mut self, root: &str) -> Self {
        self.config.watch.root = root.to_string();
        self
    }

    pub fn filter(mut self, pattern: &str) -> Self {
        self.config.watch.filter.push(pattern.to_string());
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.watch.ignore.push(pattern.to_string());
        self
    }

    pub fn debounce_ms(mut self, ms: i64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn enabled(mut self, val: bool) -> Self {
        self.config.watch.enabled = val;
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.config.hook.cmd = Some(cmd.to_string());
        self
    }

    pub fn long_lived(mut self, val: bool) -> Self {
        self.config.hook.long_lived = val;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
