// src/engine/mod.rs

//! Debounce engine for reloadwatch.
//!
//! This module ties together:
//! - the event classifier (through [`core::SessionCore`])
//! - the debounce state ([`debounce::Debouncer`])
//! - the session event loop that reacts to:
//!   - raw `notify` events
//!   - debounce timer expiry
//!   - save-window expiry
//!   - shutdown signals
//!
//! The core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`session`].

use std::path::PathBuf;
use std::time::Duration;

/// Events flowing into the session consumer.
///
/// Timer expiries are delivered through the same queue as filesystem
/// notifications so that only the consumer ever touches session state.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A raw notification from the OS primitive.
    Notify(notify::Event),
    /// The debounce timer armed with `generation` expired.
    DebounceElapsed { generation: u64 },
    /// The save-detection window for `path` may have closed.
    SaveWindowElapsed { path: PathBuf },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Command produced by the core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Replace the debounce timer with one that expires after `after`.
    ArmDebounce { generation: u64, after: Duration },
    /// Deliver `SaveWindowElapsed { path }` after `after`.
    ScheduleSaveCheck { path: PathBuf, after: Duration },
    /// Subscribe a newly created directory.
    WatchDirectory(PathBuf),
    /// Run the hook, then report back via `SessionCore::hook_finished`.
    FireHook,
}

/// Decision returned by the core after handling a single [`SessionEvent`].
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<SessionCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

pub mod core;
pub mod debounce;
pub mod session;

pub use core::SessionCore;
pub use debounce::Debouncer;
pub use session::{start_session, start_session_with, Session, SessionHandle};
