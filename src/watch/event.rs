// src/watch/event.rs

//! Translation of `notify` events into the four operations the classifier
//! understands.
//!
//! The tag is only a hint: the classifier re-derives what happened by
//! stat-ing the path and comparing against the cache.

use std::fmt;
use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

use crate::fs::FileSystem;

/// Operation carried by a raw notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    Create,
    Write,
    Remove,
    /// The path was renamed away (it is the old name).
    Rename,
    /// Anything else (access, attribute change, unknown); never a change.
    Other,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FsOp::Create => "create",
            FsOp::Write => "write",
            FsOp::Remove => "remove",
            FsOp::Rename => "rename",
            FsOp::Other => "other",
        };
        f.write_str(s)
    }
}

/// One operation on one absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub op: FsOp,
    pub path: PathBuf,
}

impl RawEvent {
    pub fn new(op: FsOp, path: impl Into<PathBuf>) -> Self {
        Self {
            op,
            path: path.into(),
        }
    }
}

/// Split a `notify` event into per-path [`RawEvent`]s.
///
/// Renames are reported by notify either as a from/to pair, as separate
/// halves, or (on some backends) without knowing which half a path is. The
/// new name is treated as a creation and the old one as a rename-away; when
/// the backend cannot tell, the path's existence decides.
pub fn translate(event: &Event, fs: &dyn FileSystem) -> Vec<RawEvent> {
    match event.kind {
        EventKind::Create(_) => all_paths(event, FsOp::Create),
        EventKind::Remove(_) => all_paths(event, FsOp::Remove),
        EventKind::Modify(ModifyKind::Metadata(_)) => all_paths(event, FsOp::Other),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => all_paths(event, FsOp::Rename),
            RenameMode::To => all_paths(event, FsOp::Create),
            RenameMode::Both => event
                .paths
                .iter()
                .enumerate()
                .map(|(idx, path)| {
                    let op = if idx == 0 { FsOp::Rename } else { FsOp::Create };
                    RawEvent::new(op, path.clone())
                })
                .collect(),
            RenameMode::Any | RenameMode::Other => event
                .paths
                .iter()
                .map(|path| {
                    let op = if fs.exists(path) { FsOp::Create } else { FsOp::Rename };
                    RawEvent::new(op, path.clone())
                })
                .collect(),
        },
        EventKind::Modify(_) => all_paths(event, FsOp::Write),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => all_paths(event, FsOp::Other),
    }
}

fn all_paths(event: &Event, op: FsOp) -> Vec<RawEvent> {
    event
        .paths
        .iter()
        .map(|path| RawEvent::new(op, path.clone()))
        .collect()
}
