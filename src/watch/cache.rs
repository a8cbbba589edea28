// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::errors::{ReloadwatchError, Result};
use crate::fs::FileSystem;
use crate::watch::hash::{fingerprint, ContentHash};
use crate::watch::path_utils::{file_name_str, is_vcs_dir_name};

/// Modification times closer than this are considered equal.
pub const MTIME_TOLERANCE: Duration = Duration::from_millis(100);

/// Snapshot of one tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileState {
    pub mod_time: SystemTime,
    pub size: u64,
    pub content: ContentHash,
}

impl FileState {
    /// Whether `other` describes different content than `self`.
    ///
    /// Two digests are compared directly, which filters out metadata-only
    /// touches. Otherwise size and modification time decide.
    pub fn differs_from(&self, other: &FileState) -> bool {
        match (&self.content, &other.content) {
            (ContentHash::Digest(a), ContentHash::Digest(b)) => a != b,
            _ => self.size != other.size || !mtime_close(self.mod_time, other.mod_time),
        }
    }
}

fn mtime_close(a: SystemTime, b: SystemTime) -> bool {
    let delta = a
        .duration_since(b)
        .or_else(|_| b.duration_since(a))
        .unwrap_or_default();
    delta <= MTIME_TOLERANCE
}

/// Stat and fingerprint a single file.
///
/// Returns `None` if the path is missing, is not a regular file, or cannot
/// be read; callers treat all three as "file absent".
pub fn snapshot_file(fs: &dyn FileSystem, path: &Path) -> Option<FileState> {
    let meta = fs.metadata(path).ok()?;
    if !meta.is_file {
        return None;
    }
    match fingerprint(fs, path, meta.len) {
        Ok(content) => Some(FileState {
            mod_time: meta.modified,
            size: meta.len,
            content,
        }),
        Err(err) => {
            debug!(?path, error = %err, "cannot fingerprint file; treating as absent");
            None
        }
    }
}

/// Baseline of every tracked file, keyed by absolute path.
#[derive(Debug, Default, Clone)]
pub struct StateCache {
    files: HashMap<PathBuf, FileState>,
}

impl StateCache {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn get(&self, path: &Path) -> Option<&FileState> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn insert(&mut self, path: PathBuf, state: FileState) -> Option<FileState> {
        self.files.insert(path, state)
    }

    pub fn remove(&mut self, path: &Path) -> Option<FileState> {
        self.files.remove(path)
    }

    /// Drop every entry strictly below directory `dir`; returns how many.
    pub fn remove_under(&mut self, dir: &Path) -> usize {
        self.drain_under(dir).len()
    }

    /// Drop every entry strictly below directory `dir`, returning their
    /// paths.
    pub fn drain_under(&mut self, dir: &Path) -> Vec<PathBuf> {
        let doomed: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|p| p.starts_with(dir) && p.as_path() != dir)
            .cloned()
            .collect();
        for path in &doomed {
            self.files.remove(path);
        }
        doomed
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(|p| p.as_path())
    }
}

/// Walk `root` and snapshot every regular file.
///
/// Version-control metadata directories are skipped entirely; in
/// non-recursive mode only the root's direct children are considered. Failing
/// to list the root is fatal. Unreadable subdirectories and files are skipped.
pub fn build_state_cache(fs: &dyn FileSystem, root: &Path, recursive: bool) -> Result<StateCache> {
    let mut cache = StateCache::new();

    let top = fs
        .read_dir(root)
        .map_err(|source| ReloadwatchError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        })?;

    let mut stack: Vec<Vec<PathBuf>> = vec![top];
    while let Some(entries) = stack.pop() {
        for path in entries {
            let Ok(meta) = fs.metadata(&path) else {
                continue;
            };

            if meta.is_dir {
                if !recursive || is_vcs_dir_name(file_name_str(&path)) {
                    continue;
                }
                match fs.read_dir(&path) {
                    Ok(children) => stack.push(children),
                    Err(err) => warn!(dir = ?path, error = %err, "skipping unreadable directory"),
                }
            } else if meta.is_file {
                if let Some(state) = snapshot_file(fs, &path) {
                    cache.insert(path, state);
                }
            }
        }
    }

    info!(files = cache.len(), root = ?root, "built file state cache");
    Ok(cache)
}
