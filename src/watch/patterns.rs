// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Ignore patterns merged into every session's file rules.
///
/// Editor swap/backup files, lock files and OS metadata. `4913` is the probe
/// file vim creates to test directory writability.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "*.swp",
    "*.swo",
    "*.swx",
    "*~",
    ".#*",
    "#*#",
    "4913",
    "*.tmp",
    "*.temp",
    "*.bak",
    "*.orig",
    "*.lck",
    ".~lock.*",
    ".DS_Store",
    "._*",
    "Thumbs.db",
    "desktop.ini",
];

/// Build and dependency directories never subscribed or reported.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "target",
    "dist",
    "tmp",
    "__pycache__",
    ".venv",
    ".idea",
    ".vscode",
    ".cache",
];

/// How a pattern without glob metacharacters is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiteralMatch {
    /// The whole file name, the whole relative path, or a run of whole path
    /// components inside it: `build` matches `a/build/x` but not
    /// `rebuild.go`.
    #[default]
    Components,
    /// Anywhere inside the file name or the relative path: `generated`
    /// matches `api_generated.go`.
    Substring,
}

/// A compiled list of user or default patterns.
///
/// Patterns containing glob metacharacters (`*?[{`) are compiled into a
/// [`GlobSet`]; anything else is a literal, compared per [`LiteralMatch`].
/// Globs are tested against both the bare file name and the relative path
/// (`*` crosses `/`).
///
/// Trailing slashes (`build/`) are dropped before compiling.
#[derive(Clone)]
pub struct PatternSet {
    globs: GlobSet,
    literals: Vec<String>,
    literal_match: LiteralMatch,
    source: Vec<String>,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("patterns", &self.source)
            .finish_non_exhaustive()
    }
}

impl PatternSet {
    /// Compile the given patterns with component-aligned literals. Blank
    /// entries are skipped.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_literal_match(patterns, LiteralMatch::Components)
    }

    pub fn with_literal_match<I, S>(patterns: I, literal_match: LiteralMatch) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut literals = Vec::new();
        let mut source = Vec::new();

        for raw in patterns {
            let pat = raw.as_ref().trim();
            let pat = pat.trim_end_matches('/');
            if pat.is_empty() {
                continue;
            }
            source.push(pat.to_string());

            if is_glob(pat) {
                let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
                builder.add(glob);
            } else {
                literals.push(pat.to_string());
            }
        }

        let globs = builder.build().context("building glob set")?;
        Ok(Self {
            globs,
            literals,
            literal_match,
            source,
        })
    }

    pub fn empty() -> Self {
        Self {
            globs: GlobSet::empty(),
            literals: Vec::new(),
            literal_match: LiteralMatch::default(),
            source: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The normalized patterns this set was built from.
    pub fn patterns(&self) -> &[String] {
        &self.source
    }

    /// Test a path given as its bare `name` and its root-relative `rel` path.
    pub fn is_match(&self, name: &str, rel: &str) -> bool {
        if self.globs.is_match(name) || self.globs.is_match(rel) {
            return true;
        }
        match self.literal_match {
            LiteralMatch::Components => self
                .literals
                .iter()
                .any(|lit| lit == name || contains_components(rel, lit)),
            LiteralMatch::Substring => self
                .literals
                .iter()
                .any(|lit| name.contains(lit.as_str()) || rel.contains(lit.as_str())),
        }
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// True if `needle` occurs in `rel` aligned to `/` boundaries on both ends.
fn contains_components(rel: &str, needle: &str) -> bool {
    rel.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let starts_clean = start == 0 || rel.as_bytes()[start - 1] == b'/';
        let ends_clean = end == rel.len() || rel.as_bytes()[end] == b'/';
        starts_clean && ends_clean
    })
}

/// Merge user patterns with a fixed default list, defaults last.
pub fn merged_with_defaults(user: &[String], defaults: &[&str]) -> Vec<String> {
    let mut merged: Vec<String> = user.to_vec();
    merged.extend(defaults.iter().map(|d| d.to_string()));
    merged
}
