// src/engine/core.rs

//! Core session state machine.
//!
//! [`SessionCore`] consumes [`SessionEvent`]s and produces:
//! - an updated classifier / debounce state
//! - a list of commands describing what the IO shell should do next
//!
//! It owns no channels, timers or processes. The only IO it performs is the
//! stat/hash work of the classifier, which goes through the
//! [`FileSystem`] abstraction, so it can be driven against a mock filesystem
//! with a hand-supplied clock.

use std::path::Path;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::debounce::Debouncer;
use crate::engine::{CoreStep, SessionCommand, SessionEvent};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::WatchSettings;
use crate::watch::cache::{build_state_cache, StateCache};
use crate::watch::classifier::{Classifier, Verdict, SAVE_WINDOW};
use crate::watch::event::translate;
use crate::watch::ignore::IgnoreEvaluator;
use crate::watch::registrar::directories_to_watch;

#[derive(Debug)]
pub struct SessionCore {
    classifier: Classifier,
    debouncer: Debouncer,
    recursive: bool,
}

impl SessionCore {
    pub fn new(classifier: Classifier, settings: &WatchSettings) -> Self {
        Self {
            classifier,
            debouncer: Debouncer::new(settings.debounce()),
            recursive: settings.recursive,
        }
    }

    /// Build the baseline cache and the core for `settings`.
    ///
    /// `settings.root` must already be absolute. Failing to read the root is
    /// returned.
    pub fn start(
        settings: &WatchSettings,
        fs: Arc<dyn FileSystem>,
        ignore: IgnoreEvaluator,
    ) -> Result<Self> {
        let cache = build_state_cache(fs.as_ref(), &settings.root, settings.recursive)?;
        Ok(Self::with_cache(settings, fs, ignore, cache))
    }

    pub fn with_cache(
        settings: &WatchSettings,
        fs: Arc<dyn FileSystem>,
        ignore: IgnoreEvaluator,
        cache: StateCache,
    ) -> Self {
        let classifier = Classifier::new(fs, ignore, settings.recursive, cache);
        Self::new(classifier, settings)
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn is_armed(&self) -> bool {
        self.debouncer.is_armed()
    }

    pub fn cache(&self) -> &StateCache {
        self.classifier.cache()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Handle a single event observed at `now`, returning the commands for
    /// the IO shell.
    pub fn step(&mut self, event: SessionEvent, now: Instant) -> CoreStep {
        match event {
            SessionEvent::Notify(event) => self.on_notify(&event, now),
            SessionEvent::DebounceElapsed { generation } => self.on_debounce_elapsed(generation),
            SessionEvent::SaveWindowElapsed { path } => self.on_save_window(&path, now),
            SessionEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    /// The hook returned; the burst is complete.
    pub fn hook_finished(&mut self) {
        self.debouncer.finish();
        self.classifier.reset_log_throttle();
    }

    fn on_notify(&mut self, event: &notify::Event, now: Instant) -> CoreStep {
        let mut commands = Vec::new();
        let mut changed = false;

        for raw in translate(event, self.classifier.fs()) {
            match self.classifier.classify(&raw, now) {
                Verdict::Changed => changed = true,
                Verdict::Deferred => commands.push(SessionCommand::ScheduleSaveCheck {
                    path: raw.path,
                    after: SAVE_WINDOW,
                }),
                Verdict::DirectoryCreated(dir) => self.subscribe_new_dir(&dir, &mut commands),
                Verdict::Ignored | Verdict::NoOp => {}
            }
        }

        if changed {
            commands.push(self.arm());
        }

        CoreStep {
            commands,
            keep_running: true,
        }
    }

    fn on_save_window(&mut self, path: &Path, now: Instant) -> CoreStep {
        let mut commands = Vec::new();
        if self.classifier.expire_save(path, now) == Verdict::Changed {
            commands.push(self.arm());
        }
        CoreStep {
            commands,
            keep_running: true,
        }
    }

    fn on_debounce_elapsed(&mut self, generation: u64) -> CoreStep {
        let mut commands = Vec::new();

        if self.debouncer.should_fire(generation) {
            info!(generation, "changes settled; firing hook");
            if let Err(err) = self.classifier.rebuild() {
                warn!(error = %err, "cache rebuild failed; keeping incremental cache");
            }
            commands.push(SessionCommand::FireHook);
        } else {
            debug!(
                generation,
                current = self.debouncer.generation(),
                "stale or idle debounce expiry ignored"
            );
            self.debouncer.disarm(generation);
        }

        CoreStep {
            commands,
            keep_running: true,
        }
    }

    fn arm(&mut self) -> SessionCommand {
        let generation = self.debouncer.note_change();
        debug!(generation, "change pending; (re)arming debounce timer");
        SessionCommand::ArmDebounce {
            generation,
            after: self.debouncer.delay(),
        }
    }

    fn subscribe_new_dir(&self, dir: &Path, commands: &mut Vec<SessionCommand>) {
        if !self.recursive {
            return;
        }
        match directories_to_watch(self.classifier.fs(), self.classifier.ignore(), dir) {
            Ok(dirs) => {
                debug!(?dir, count = dirs.len(), "new directory appeared");
                commands.extend(dirs.into_iter().map(SessionCommand::WatchDirectory));
            }
            Err(err) => warn!(?dir, error = %err, "cannot enumerate new directory"),
        }
    }
}
