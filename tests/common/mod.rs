#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reloadwatch::fs::mock::MockFileSystem;
use reloadwatch::fs::FileSystem;
use reloadwatch::types::WatchSettings;
use reloadwatch::watch::{build_state_cache, Classifier, IgnoreEvaluator};

pub use reloadwatch_test_utils::{init_tracing, with_timeout};

pub const ROOT: &str = "/proj";

pub fn root() -> PathBuf {
    PathBuf::from(ROOT)
}

pub fn p(rel: &str) -> PathBuf {
    Path::new(ROOT).join(rel)
}

/// A mock project with a couple of source files, a VCS directory and a
/// dependency directory.
pub fn sample_project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir(ROOT);
    fs.add_file(p("main.go"), "package main\n");
    fs.add_file(p("go.mod"), "module example.com/app\n");
    fs.add_file(p("README"), "readme\n");
    fs.add_file(p("pkg/util.go"), "package pkg\n");
    fs.add_file(p(".git/HEAD"), "ref: refs/heads/main\n");
    fs.add_file(p("node_modules/lib/index.js"), "module.exports = {}\n");
    fs
}

/// Build a classifier over `fs` for `settings`, with the baseline cache
/// already walked.
pub fn classifier_for(fs: &MockFileSystem, settings: &WatchSettings) -> Classifier {
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    let ignore = IgnoreEvaluator::from_settings(shared.as_ref(), settings)
        .expect("ignore evaluator");
    let cache = build_state_cache(shared.as_ref(), &settings.root, settings.recursive)
        .expect("baseline cache");
    Classifier::new(shared, ignore, settings.recursive, cache)
}
