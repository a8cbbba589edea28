// src/watch/ignore.rs

//! Decides which paths the watcher must never report.
//!
//! Files are checked in this order:
//! 1. version-control metadata (always excluded),
//! 2. the merged ignore set (user patterns + [`DEFAULT_IGNORE_PATTERNS`]),
//!    whose literals match as substrings of the name or relative path,
//!    plus any ancestor directory excluded by the directory rules,
//! 3. the allow-list filter, when non-empty,
//! 4. the root ignore file (`.gitignore`), when enabled.
//!
//! Directories use their own rule set: [`DEFAULT_IGNORED_DIRS`] merged with
//! the user ignore patterns (literals aligned to whole components), plus VCS
//! metadata and the ignore file.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::WatchSettings;
use crate::watch::path_utils::{ancestor_dirs, file_name_str, is_vcs_rel, relative_str};
use crate::watch::patterns::{
    merged_with_defaults, LiteralMatch, PatternSet, DEFAULT_IGNORED_DIRS, DEFAULT_IGNORE_PATTERNS,
};

/// Name of the ignore file read from the watch root.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// A loaded ignore file.
pub trait IgnoreMatcher: Send + Sync {
    /// `rel` is relative to the watch root, with forward slashes.
    fn is_ignored(&self, rel: &str, is_dir: bool) -> bool;

    /// The non-comment lines the matcher was built from.
    fn patterns(&self) -> &[String];
}

/// `.gitignore` semantics backed by the `ignore` crate.
pub struct GitignoreMatcher {
    inner: Gitignore,
    patterns: Vec<String>,
}

impl GitignoreMatcher {
    /// Load `<root>/.gitignore`. A missing file yields an empty matcher.
    pub fn load(fs: &dyn FileSystem, root: &Path) -> Result<Self> {
        let path = root.join(IGNORE_FILE_NAME);
        let contents = if fs.exists(&path) {
            fs.read_to_string(&path)?
        } else {
            debug!(?path, "no ignore file at root");
            String::new()
        };
        Self::from_contents(root, &contents)
    }

    pub fn from_contents(root: &Path, contents: &str) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        let mut patterns = Vec::new();

        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            builder.add_line(None, line)?;
            patterns.push(trimmed.to_string());
        }

        Ok(Self {
            inner: builder.build()?,
            patterns,
        })
    }
}

impl IgnoreMatcher for GitignoreMatcher {
    fn is_ignored(&self, rel: &str, is_dir: bool) -> bool {
        if rel.is_empty() {
            return false;
        }
        self.inner
            .matched_path_or_any_parents(rel, is_dir)
            .is_ignore()
    }

    fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Combined file and directory exclusion rules for one session.
pub struct IgnoreEvaluator {
    root: PathBuf,
    ignore: PatternSet,
    filter: PatternSet,
    dir_rules: PatternSet,
    ignore_file: Option<Box<dyn IgnoreMatcher>>,
}

impl std::fmt::Debug for IgnoreEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgnoreEvaluator")
            .field("root", &self.root)
            .field("ignore", &self.ignore)
            .field("filter", &self.filter)
            .field("dir_rules", &self.dir_rules)
            .field("ignore_file", &self.ignore_file.is_some())
            .finish()
    }
}

impl IgnoreEvaluator {
    pub fn new(
        root: impl Into<PathBuf>,
        ignore_patterns: &[String],
        filter_patterns: &[String],
        ignore_file: Option<Box<dyn IgnoreMatcher>>,
    ) -> Result<Self> {
        let ignore = PatternSet::with_literal_match(
            merged_with_defaults(ignore_patterns, DEFAULT_IGNORE_PATTERNS),
            LiteralMatch::Substring,
        )?;
        let dir_rules = PatternSet::new(merged_with_defaults(ignore_patterns, DEFAULT_IGNORED_DIRS))?;
        let filter = PatternSet::new(filter_patterns)?;

        Ok(Self {
            root: root.into(),
            ignore,
            filter,
            dir_rules,
            ignore_file,
        })
    }

    /// Build the evaluator for a session, loading the ignore file once if
    /// the settings ask for it.
    pub fn from_settings(fs: &dyn FileSystem, settings: &WatchSettings) -> Result<Self> {
        let ignore_file: Option<Box<dyn IgnoreMatcher>> = if settings.use_ignore_file {
            let matcher = GitignoreMatcher::load(fs, &settings.root)?;
            info!(
                patterns = matcher.patterns().len(),
                "loaded {} from watch root", IGNORE_FILE_NAME
            );
            debug!(patterns = ?matcher.patterns(), "ignore file patterns");
            Some(Box::new(matcher))
        } else {
            None
        };

        Self::new(
            settings.root.clone(),
            &settings.ignore,
            &settings.filter,
            ignore_file,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ignore_file(&self) -> Option<&dyn IgnoreMatcher> {
        self.ignore_file.as_deref()
    }

    /// Should a file event for `path` be dropped?
    pub fn is_ignored(&self, path: &Path) -> bool {
        let Some(rel) = relative_str(&self.root, path) else {
            debug!(?path, "path outside watch root; ignoring");
            return true;
        };
        if is_vcs_rel(&rel) {
            return true;
        }
        let name = file_name_str(path);

        if self.ignore.is_match(name, &rel) {
            return true;
        }
        if ancestor_dirs(&rel)
            .into_iter()
            .any(|dir| self.dir_rules.is_match(last_component(dir), dir))
        {
            return true;
        }
        if !self.filter.is_empty() && !self.filter.is_match(name, &rel) {
            return true;
        }
        if let Some(matcher) = &self.ignore_file {
            if matcher.is_ignored(&rel, false) {
                return true;
            }
        }

        false
    }

    /// Should directory `path` be left unwatched (and its events dropped)?
    ///
    /// A directory below an excluded directory is excluded too.
    pub fn is_ignored_dir(&self, path: &Path) -> bool {
        let Some(rel) = relative_str(&self.root, path) else {
            return true;
        };
        if rel.is_empty() {
            return false;
        }
        if is_vcs_rel(&rel) {
            return true;
        }

        let excluded_by_rules = ancestor_dirs(&rel)
            .into_iter()
            .chain(std::iter::once(rel.as_str()))
            .any(|dir| self.dir_rules.is_match(last_component(dir), dir));
        if excluded_by_rules {
            return true;
        }

        match &self.ignore_file {
            Some(matcher) => matcher.is_ignored(&rel, true),
            None => false,
        }
    }
}

fn last_component(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}
