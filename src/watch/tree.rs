// src/watch/tree.rs

//! Directory enumeration used when subscribing a tree.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::watch::ignore::IgnoreMatcher;
use crate::watch::path_utils::{file_name_str, is_vcs_dir_name, relative_str};

/// List every directory strictly below `dir`, depth first.
///
/// VCS metadata directories are never descended into. When `ignore_file` is
/// given, directories it ignores (relative to `root`) are pruned together
/// with their subtrees. Failing to list `dir` itself is an error; failures
/// deeper down are logged and skipped.
pub fn list_directories(
    fs: &dyn FileSystem,
    root: &Path,
    dir: &Path,
    ignore_file: Option<&dyn IgnoreMatcher>,
) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut stack = vec![fs.read_dir(dir)?];

    while let Some(entries) = stack.pop() {
        for path in entries {
            if !fs.is_dir(&path) || is_vcs_dir_name(file_name_str(&path)) {
                continue;
            }

            if let (Some(matcher), Some(rel)) = (ignore_file, relative_str(root, &path)) {
                if matcher.is_ignored(&rel, true) {
                    debug!(dir = %rel, "pruned by ignore file");
                    continue;
                }
            }

            match fs.read_dir(&path) {
                Ok(children) => stack.push(children),
                Err(err) => warn!(dir = ?path, error = %err, "cannot list directory"),
            }
            found.push(path);
        }
    }

    Ok(found)
}
