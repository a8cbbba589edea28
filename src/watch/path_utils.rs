// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

/// Directory names holding version-control metadata. Anything below them is
/// never walked, watched or reported.
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn", ".bzr", ".jj"];

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Event paths normally start with the (canonicalized) root already. When
/// they don't, e.g. because the platform reports a different absolute prefix
/// for the same directory, both sides are canonicalized and compared again.
/// Canonicalizing a deleted path fails, so removals rely on the fast path.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(normalize(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(normalize(rel));
        }
    }

    None
}

fn normalize(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

/// Bare file name of `path`, or an empty string.
pub fn file_name_str(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// True if `name` is a version-control metadata directory name.
pub fn is_vcs_dir_name(name: &str) -> bool {
    VCS_DIRS.contains(&name)
}

/// True if any component of the root-relative path `rel` is VCS metadata.
pub fn is_vcs_rel(rel: &str) -> bool {
    rel.split('/').any(is_vcs_dir_name)
}

/// The relative paths of every ancestor directory of `rel`, nearest last.
///
/// `"a/b/c.go"` yields `["a", "a/b"]`.
pub fn ancestor_dirs(rel: &str) -> Vec<&str> {
    rel.match_indices('/').map(|(idx, _)| &rel[..idx]).collect()
}
