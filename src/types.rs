use std::path::PathBuf;
use std::time::Duration;

/// Quiet period used when the configured debounce is zero or negative.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Resolved settings for one watch session.
///
/// Produced from the `[watch]` config section (plus CLI overrides); the
/// engine only reads it.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Directory being watched. Made absolute at session start.
    pub root: PathBuf,
    /// Allow-list: when non-empty, only matching files are reported.
    pub filter: Vec<String>,
    /// User ignore patterns, merged with the built-in defaults.
    pub ignore: Vec<String>,
    /// Honour `<root>/.gitignore`.
    pub use_ignore_file: bool,
    /// Subscribe subdirectories and track files below the root level.
    pub recursive: bool,
    /// Configured quiet period in milliseconds; see [`WatchSettings::debounce`].
    pub debounce_ms: i64,
}

impl WatchSettings {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            filter: Vec::new(),
            ignore: Vec::new(),
            use_ignore_file: true,
            recursive: true,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as i64,
        }
    }

    /// The effective quiet period: `debounce_ms`, or 300 ms when that is
    /// zero or negative.
    pub fn debounce(&self) -> Duration {
        if self.debounce_ms > 0 {
            Duration::from_millis(self.debounce_ms as u64)
        } else {
            DEFAULT_DEBOUNCE
        }
    }
}
