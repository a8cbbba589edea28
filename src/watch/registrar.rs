// src/watch/registrar.rs

//! Subscribes directories to the OS notification primitive.
//!
//! Every directory is watched non-recursively so excluded subtrees such as
//! `node_modules` never generate events in the first place. Directories that
//! appear later are added one at a time by the session.

use std::fmt;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::ignore::IgnoreEvaluator;
use crate::watch::tree::list_directories;

/// Seam between the session and the notification backend.
///
/// Production code uses [`NotifyRegistrar`]; tests record subscriptions
/// instead.
pub trait DirectoryWatcher: Send {
    /// Start receiving events for the direct children of `dir`.
    fn watch_dir(&mut self, dir: &Path) -> Result<()>;
}

/// [`DirectoryWatcher`] backed by a `notify` watcher.
///
/// Dropping it stops all subscriptions.
pub struct NotifyRegistrar {
    inner: RecommendedWatcher,
}

impl NotifyRegistrar {
    pub fn new(inner: RecommendedWatcher) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for NotifyRegistrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyRegistrar").finish_non_exhaustive()
    }
}

impl DirectoryWatcher for NotifyRegistrar {
    fn watch_dir(&mut self, dir: &Path) -> Result<()> {
        self.inner.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(())
    }
}

/// Subdirectories of `dir` (inclusive unless `dir` is the root) that should
/// be subscribed.
///
/// Used both for the initial tree and for directories created later. The
/// listing is pruned by the ignore file, then filtered by the directory
/// rules.
pub fn directories_to_watch(
    fs: &dyn FileSystem,
    ignore: &IgnoreEvaluator,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let root = ignore.root();
    let mut dirs = Vec::new();
    if dir != root {
        if ignore.is_ignored_dir(dir) {
            return Ok(dirs);
        }
        dirs.push(dir.to_path_buf());
    }

    let listed = list_directories(fs, root, dir, ignore.ignore_file())?;
    dirs.extend(listed.into_iter().filter(|d| !ignore.is_ignored_dir(d)));
    Ok(dirs)
}

/// Subscribe the root and, in recursive mode, every non-ignored
/// subdirectory.
///
/// Failing to watch the root is returned; failures on subdirectories are
/// logged and leave that directory unmonitored. Returns the number of
/// directories subscribed.
pub fn register_tree<W: DirectoryWatcher + ?Sized>(
    watcher: &mut W,
    fs: &dyn FileSystem,
    ignore: &IgnoreEvaluator,
    recursive: bool,
) -> Result<usize> {
    let root = ignore.root();
    watcher.watch_dir(root)?;
    let mut count = 1;

    if recursive {
        for dir in directories_to_watch(fs, ignore, root)? {
            if watch_one(watcher, &dir) {
                count += 1;
            }
        }
    }

    info!(directories = count, root = ?root, recursive, "watch subscriptions registered");
    Ok(count)
}

/// Best-effort subscription of a single directory.
pub fn watch_one<W: DirectoryWatcher + ?Sized>(watcher: &mut W, dir: &Path) -> bool {
    match watcher.watch_dir(dir) {
        Ok(()) => {
            debug!(?dir, "watching directory");
            true
        }
        Err(err) => {
            warn!(?dir, error = %err, "failed to watch directory; leaving it unmonitored");
            false
        }
    }
}
