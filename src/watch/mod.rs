// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Deciding which paths are ignored (`ignore`, `patterns`).
//! - Building and maintaining the baseline of tracked files (`cache`, `hash`).
//! - Subscribing directories to `notify` (`registrar`, `tree`).
//! - Turning raw notifications into verdicts (`event`, `classifier`).
//!
//! It does **not** know about timers or the hook; the engine decides what a
//! verdict means for the session.

pub mod cache;
pub mod classifier;
pub mod event;
pub mod hash;
pub mod ignore;
pub mod path_utils;
pub mod patterns;
pub mod registrar;
pub mod throttle;
pub mod tree;

pub use cache::{build_state_cache, FileState, StateCache};
pub use classifier::{Classifier, SaveDetector, Verdict, SAVE_WINDOW};
pub use event::{translate, FsOp, RawEvent};
pub use hash::ContentHash;
pub use ignore::{GitignoreMatcher, IgnoreEvaluator, IgnoreMatcher};
pub use patterns::{LiteralMatch, PatternSet};
pub use registrar::{register_tree, DirectoryWatcher, NotifyRegistrar};
