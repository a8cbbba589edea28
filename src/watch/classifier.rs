// src/watch/classifier.rs

//! Per-event classification state machine.
//!
//! Each path is either untracked or tracked (present in the [`StateCache`]).
//! A raw event is turned into a [`Verdict`] by:
//! - dropping ignored paths before anything else,
//! - stat-ing the path to learn what actually exists now,
//! - comparing a fresh snapshot with the cached one.
//!
//! Editors that save in two phases (truncate, then write) are handled by the
//! [`SaveDetector`]: the truncation updates the cache but is reported as
//! [`Verdict::Deferred`]; the following non-empty write is the change.
//!
//! The classifier performs IO (stat, hashing) but holds no channels and no
//! timers; the engine decides what to do with each verdict.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::cache::{build_state_cache, snapshot_file, StateCache};
use crate::watch::event::{FsOp, RawEvent};
use crate::watch::ignore::IgnoreEvaluator;
use crate::watch::throttle::EventLogThrottle;

/// How long after a truncation a non-empty write still counts as the second
/// half of the same save.
pub const SAVE_WINDOW: Duration = Duration::from_secs(1);

/// Outcome of classifying one raw event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Excluded by the ignore rules; nothing was touched.
    Ignored,
    /// Not a semantic change (unknown op, unchanged content, untracked delete).
    NoOp,
    /// A real change; the pending flag must be set.
    Changed,
    /// First half of a two-phase save: cache updated, pending flag untouched.
    Deferred,
    /// A new, non-ignored directory that should be subscribed.
    DirectoryCreated(PathBuf),
}

/// Outstanding truncations, keyed by path.
#[derive(Debug, Default)]
pub struct SaveDetector {
    truncated_at: HashMap<PathBuf, Instant>,
}

impl SaveDetector {
    pub fn record(&mut self, path: &Path, now: Instant) {
        self.truncated_at.insert(path.to_path_buf(), now);
    }

    /// Remove the entry for `path`, returning its age if there was one.
    pub fn take(&mut self, path: &Path, now: Instant) -> Option<Duration> {
        self.truncated_at
            .remove(path)
            .map(|at| now.saturating_duration_since(at))
    }

    /// Drop the entry for `path` if it is at least [`SAVE_WINDOW`] old.
    ///
    /// Returns true if an entry was dropped.
    pub fn expire(&mut self, path: &Path, now: Instant) -> bool {
        match self.truncated_at.get(path) {
            Some(at) if now.saturating_duration_since(*at) >= SAVE_WINDOW => {
                self.truncated_at.remove(path);
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.truncated_at.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.truncated_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truncated_at.is_empty()
    }
}

/// Turns raw events into verdicts while maintaining the [`StateCache`].
pub struct Classifier {
    fs: Arc<dyn FileSystem>,
    ignore: IgnoreEvaluator,
    recursive: bool,
    cache: StateCache,
    saves: SaveDetector,
    throttle: EventLogThrottle,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("root", &self.ignore.root())
            .field("recursive", &self.recursive)
            .field("tracked", &self.cache.len())
            .field("pending_saves", &self.saves.len())
            .finish_non_exhaustive()
    }
}

impl Classifier {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        ignore: IgnoreEvaluator,
        recursive: bool,
        cache: StateCache,
    ) -> Self {
        Self {
            fs,
            ignore,
            recursive,
            cache,
            saves: SaveDetector::default(),
            throttle: EventLogThrottle::new(),
        }
    }

    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    pub fn ignore(&self) -> &IgnoreEvaluator {
        &self.ignore
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn saves(&self) -> &SaveDetector {
        &self.saves
    }

    /// Replace the incrementally maintained cache with a fresh full walk.
    ///
    /// On failure the current cache is kept.
    pub fn rebuild(&mut self) -> Result<()> {
        let fresh = build_state_cache(self.fs.as_ref(), self.ignore.root(), self.recursive)?;
        debug!(before = self.cache.len(), after = fresh.len(), "cache rebuilt");
        self.cache = fresh;
        Ok(())
    }

    /// Forget diagnostic counters; called after each hook firing.
    pub fn reset_log_throttle(&mut self) {
        self.throttle.reset();
    }

    /// Classify one raw event observed at `now`.
    pub fn classify(&mut self, event: &RawEvent, now: Instant) -> Verdict {
        let path = event.path.as_path();
        let (log, count) = self.throttle.observe(event.op, path);
        if log {
            trace!(op = %event.op, ?path, count, "raw event");
        }

        let meta = self.fs.metadata(path).ok();
        let is_dir = match &meta {
            Some(m) => m.is_dir,
            // Gone: it was a directory if we track anything below it.
            None => !self.cache.contains(path) && self.has_tracked_descendants(path),
        };

        let ignored = if is_dir {
            self.ignore.is_ignored_dir(path)
        } else {
            self.ignore.is_ignored(path)
        };
        if ignored {
            if log {
                debug!(op = %event.op, ?path, "ignored");
            }
            return Verdict::Ignored;
        }

        if event.op == FsOp::Other {
            return Verdict::NoOp;
        }

        let exists_as_file = meta.as_ref().map(|m| m.is_file).unwrap_or(false);

        match event.op {
            FsOp::Create if is_dir && meta.is_some() => {
                if self.recursive {
                    Verdict::DirectoryCreated(path.to_path_buf())
                } else {
                    Verdict::NoOp
                }
            }
            _ if is_dir && meta.is_some() => Verdict::NoOp,
            FsOp::Create | FsOp::Write if exists_as_file => self.on_write(path, now),
            FsOp::Remove | FsOp::Rename if exists_as_file => {
                // Renamed or removed and immediately replaced (atomic save).
                self.on_write(path, now)
            }
            _ => self.on_remove(path),
        }
    }

    /// Handle the expiry of a save-detection window for `path`.
    ///
    /// If the truncation was never followed by a write and the file is still
    /// empty, the emptying itself is reported as a change.
    pub fn expire_save(&mut self, path: &Path, now: Instant) -> Verdict {
        if !self.saves.expire(path, now) {
            return Verdict::NoOp;
        }
        match self.cache.get(path) {
            Some(state) if state.size == 0 => {
                info!(?path, "truncation not followed by a write; reporting change");
                Verdict::Changed
            }
            _ => Verdict::NoOp,
        }
    }

    fn on_write(&mut self, path: &Path, now: Instant) -> Verdict {
        let Some(new_state) = snapshot_file(self.fs.as_ref(), path) else {
            // Vanished or unreadable between stat and hash.
            return self.on_remove(path);
        };

        let Some(old_state) = self.cache.get(path) else {
            debug!(?path, "new file tracked");
            self.saves.take(path, now);
            self.cache.insert(path.to_path_buf(), new_state);
            return Verdict::Changed;
        };

        if !old_state.differs_from(&new_state) {
            trace!(?path, "content unchanged");
            self.cache.insert(path.to_path_buf(), new_state);
            return Verdict::NoOp;
        }

        let truncated = new_state.size == 0;
        self.cache.insert(path.to_path_buf(), new_state);

        if truncated {
            debug!(?path, "file truncated; waiting for the content write");
            self.saves.record(path, now);
            return Verdict::Deferred;
        }

        match self.saves.take(path, now) {
            Some(age) if age <= SAVE_WINDOW => {
                debug!(?path, ?age, "two-phase save completed");
            }
            Some(age) => {
                debug!(?path, ?age, "write after stale truncation");
            }
            None => {
                debug!(?path, "file changed");
            }
        }
        Verdict::Changed
    }

    fn on_remove(&mut self, path: &Path) -> Verdict {
        self.saves.truncated_at.remove(path);

        if self.cache.remove(path).is_some() {
            debug!(?path, "tracked file removed");
            return Verdict::Changed;
        }

        // The baseline walk records ignored files too; they must not signal
        // when their directory goes away.
        let dropped = self.cache.drain_under(path);
        let relevant = dropped
            .iter()
            .filter(|p| !self.ignore.is_ignored(p))
            .count();
        if relevant > 0 {
            debug!(?path, files = relevant, "tracked directory removed");
            return Verdict::Changed;
        }
        if !dropped.is_empty() {
            trace!(?path, files = dropped.len(), "removed directory held only ignored files");
            return Verdict::NoOp;
        }

        trace!(?path, "removal of untracked path");
        Verdict::NoOp
    }

    fn has_tracked_descendants(&self, dir: &Path) -> bool {
        self.cache.paths().any(|p| p != dir && p.starts_with(dir))
    }
}
