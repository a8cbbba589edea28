use std::fmt;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::trace;

use crate::fs::FileSystem;
use crate::watch::path_utils::file_name_str;

/// Files at or above this size are compared by size and mtime only.
pub const SIGNIFICANT_SIZE_LIMIT: u64 = 1024 * 1024;

/// Extensions whose content is hashed.
const SIGNIFICANT_EXTENSIONS: &[&str] = &[
    // systems / compiled
    "go", "rs", "c", "h", "cc", "cpp", "cxx", "hpp", "hh", "zig", "swift", "java", "kt", "kts",
    "scala", "cs", "fs", "m", "mm",
    // scripting
    "py", "rb", "php", "pl", "lua", "sh", "bash", "zsh", "ps1", "ex", "exs", "erl", "hs", "ml",
    "clj", "dart", "r", "jl",
    // web
    "js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx", "vue", "svelte", "html", "htm", "css",
    "scss", "sass", "less",
    // templates / data / config
    "tmpl", "tpl", "gohtml", "templ", "sql", "proto", "graphql", "gql", "json", "yaml", "yml",
    "toml", "xml", "ini", "conf", "cfg", "env", "properties", "mod", "sum", "gradle", "cmake",
];

/// Canonical names hashed regardless of extension.
const SIGNIFICANT_NAMES: &[&str] = &[
    "Makefile",
    "makefile",
    "GNUmakefile",
    "Dockerfile",
    "Containerfile",
    "Justfile",
    "justfile",
    "Rakefile",
    "Gemfile",
    "Procfile",
    "go.mod",
    "go.sum",
    "go.work",
    "Cargo.toml",
    "Cargo.lock",
    "package.json",
    "tsconfig.json",
    "pyproject.toml",
    "requirements.txt",
    "CMakeLists.txt",
    "build.gradle",
    "pom.xml",
    ".env",
];

/// What the cache remembers about a file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentHash {
    /// blake3 hex digest of the whole file.
    Digest(String),
    /// Stand-in for files that are not hashed; carries the size.
    Placeholder(u64),
}

impl ContentHash {
    pub fn is_digest(&self) -> bool {
        matches!(self, ContentHash::Digest(_))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentHash::Digest(hex) => f.write_str(hex),
            ContentHash::Placeholder(size) => write!(f, "size:{size}"),
        }
    }
}

/// Whether `path` is a source, config or build-descriptor file worth hashing.
pub fn is_significant(path: &Path) -> bool {
    let name = file_name_str(path);
    if SIGNIFICANT_NAMES.contains(&name) {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SIGNIFICANT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Compute the blake3 hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// The content fingerprint stored in the cache for a file of `size` bytes.
///
/// Significant files under [`SIGNIFICANT_SIZE_LIMIT`] are hashed; everything
/// else gets a placeholder. A read failure is returned to the caller, which
/// treats the file as absent.
pub fn fingerprint(fs: &dyn FileSystem, path: &Path, size: u64) -> Result<ContentHash> {
    if size >= SIGNIFICANT_SIZE_LIMIT || !is_significant(path) {
        trace!(?path, size, "not hashing");
        return Ok(ContentHash::Placeholder(size));
    }

    let hex = compute_file_hash(fs, path)?;
    trace!(?path, hash = %hex, "hashed file");
    Ok(ContentHash::Digest(hex))
}
