use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::watch::event::FsOp;

/// Occurrences of the same (op, path) logged before sampling kicks in.
const LOG_FIRST: u32 = 3;
/// After that, one in this many occurrences is logged.
const LOG_EVERY: u32 = 50;

/// Rate limiter for per-event diagnostic logging.
///
/// Owned by one session and reset after every hook firing. It never affects
/// classification.
#[derive(Debug, Default)]
pub struct EventLogThrottle {
    counts: HashMap<(FsOp, PathBuf), u32>,
}

impl EventLogThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence; returns whether it should be logged, along with
    /// the running count.
    pub fn observe(&mut self, op: FsOp, path: &Path) -> (bool, u32) {
        let count = self.counts.entry((op, path.to_path_buf())).or_insert(0);
        *count += 1;
        let n = *count;
        (n <= LOG_FIRST || n % LOG_EVERY == 0, n)
    }

    pub fn reset(&mut self) {
        self.counts.clear();
    }
}
