// src/engine/session.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use notify::{Event, RecommendedWatcher, Watcher};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::errors::{ReloadwatchError, Result};
use crate::exec::ReloadHook;
use crate::fs::FileSystem;
use crate::types::WatchSettings;
use crate::watch::ignore::IgnoreEvaluator;
use crate::watch::registrar::{register_tree, watch_one, DirectoryWatcher, NotifyRegistrar};

use super::core::SessionCore;
use super::{SessionCommand, SessionEvent};

/// The queues a session drains.
///
/// `loopback` is how timer tasks feed their expiry back into `events`. It is
/// weak so the session ends once every producer of filesystem events is
/// gone.
pub struct SessionInputs {
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
    pub loopback: mpsc::WeakUnboundedSender<SessionEvent>,
}

impl SessionInputs {
    /// Create the two queues; returns their senders and the inputs.
    pub fn channel() -> (
        mpsc::UnboundedSender<SessionEvent>,
        mpsc::UnboundedSender<notify::Error>,
        SessionInputs,
    ) {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();
        let loopback = event_tx.downgrade();
        (
            event_tx,
            error_tx,
            SessionInputs {
                events,
                errors,
                loopback,
            },
        )
    }
}

/// Drives a [`SessionCore`] from the event and error queues, and executes
/// the commands it returns: timers, directory subscriptions, hook calls.
///
/// This is the only place session state is mutated. Timer tasks only send
/// synthetic events back into the queue.
pub struct Session<W: DirectoryWatcher, H: ReloadHook> {
    core: SessionCore,
    watcher: W,
    hook: H,
    inputs: SessionInputs,
    cancel_rx: watch::Receiver<bool>,
    timer: Option<JoinHandle<()>>,
}

impl<W: DirectoryWatcher, H: ReloadHook> fmt::Debug for Session<W, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("core", &self.core)
            .field("timer_armed", &self.timer.is_some())
            .finish_non_exhaustive()
    }
}

impl<W: DirectoryWatcher, H: ReloadHook> Session<W, H> {
    pub fn new(
        core: SessionCore,
        watcher: W,
        hook: H,
        inputs: SessionInputs,
        cancel_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            core,
            watcher,
            hook,
            inputs,
            cancel_rx,
            timer: None,
        }
    }

    /// Main event loop.
    ///
    /// - Waits on the event queue, the error queue and the cancel signal.
    /// - Feeds events into the core.
    /// - Executes the commands returned by the core.
    pub async fn run(mut self) -> Result<()> {
        info!("watch session started");

        loop {
            let event = tokio::select! {
                biased;

                _ = self.cancel_rx.changed() => {
                    info!("cancellation requested; stopping watch session");
                    SessionEvent::ShutdownRequested
                }
                maybe = self.inputs.events.recv() => match maybe {
                    Some(e) => e,
                    None => {
                        info!("event queue closed; stopping watch session");
                        break;
                    }
                },
                Some(err) = self.inputs.errors.recv() => {
                    warn!(error = %err, "watcher reported an error");
                    continue;
                }
            };

            let step = self.core.step(event, Instant::now());

            for command in step.commands {
                self.execute_command(command).await;
            }

            if !step.keep_running {
                break;
            }
        }

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        info!("watch session exiting");
        Ok(())
    }

    async fn execute_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::ArmDebounce { generation, after } => {
                if let Some(previous) = self.timer.take() {
                    previous.abort();
                }
                self.timer = Some(self.schedule(after, SessionEvent::DebounceElapsed { generation }));
            }
            SessionCommand::ScheduleSaveCheck { path, after } => {
                debug!(?path, ?after, "scheduling save-window check");
                // Independent of the debounce timer; never aborted.
                drop(self.schedule(after, SessionEvent::SaveWindowElapsed { path }));
            }
            SessionCommand::WatchDirectory(dir) => {
                watch_one(&mut self.watcher, &dir);
            }
            SessionCommand::FireHook => {
                self.timer = None;
                self.hook.fire().await;
                self.core.hook_finished();
                debug!("hook returned; pending flag cleared");
            }
        }
    }

    fn schedule(&self, after: Duration, event: SessionEvent) -> JoinHandle<()> {
        let loopback = self.inputs.loopback.clone();
        tokio::spawn(async move {
            sleep(after).await;
            if let Some(tx) = loopback.upgrade() {
                let _ = tx.send(event);
            }
        })
    }
}

/// Handle to a running session.
#[derive(Debug)]
pub struct SessionHandle {
    root: PathBuf,
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<Result<()>>,
}

impl SessionHandle {
    /// The canonical root being watched.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the session to stop and wait for it to exit.
    pub async fn stop(self) -> Result<()> {
        let _ = self.cancel_tx.send(true);
        self.wait().await
    }

    /// Wait for the session to exit on its own.
    pub async fn wait(self) -> Result<()> {
        let SessionHandle {
            cancel_tx, task, ..
        } = self;
        let res = task.await;
        drop(cancel_tx);
        match res {
            Ok(inner) => inner,
            Err(join_err) => Err(ReloadwatchError::Other(anyhow!(
                "watch session task failed: {join_err}"
            ))),
        }
    }
}

/// Start watching `settings.root` with a `notify` watcher and call `hook`
/// once per settled burst.
///
/// Fatal errors (watcher creation, unreadable root, root subscription) are
/// returned here and nothing is left running.
pub async fn start_session<H>(
    settings: WatchSettings,
    fs: Arc<dyn FileSystem>,
    hook: H,
) -> Result<SessionHandle>
where
    H: ReloadHook + 'static,
{
    let (event_tx, error_tx, inputs) = SessionInputs::channel();

    let watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = event_tx.send(SessionEvent::Notify(event));
            }
            Err(err) => {
                let _ = error_tx.send(err);
            }
        },
        notify::Config::default(),
    )?;

    start_session_with(settings, fs, NotifyRegistrar::new(watcher), hook, inputs).await
}

/// Like [`start_session`], but with a caller-supplied directory watcher and
/// queues.
pub async fn start_session_with<W, H>(
    mut settings: WatchSettings,
    fs: Arc<dyn FileSystem>,
    mut watcher: W,
    hook: H,
    inputs: SessionInputs,
) -> Result<SessionHandle>
where
    W: DirectoryWatcher + 'static,
    H: ReloadHook + 'static,
{
    settings.root = fs
        .canonicalize(&settings.root)
        .map_err(|source| ReloadwatchError::RootUnreadable {
            path: settings.root.clone(),
            source,
        })?;

    info!(
        root = ?settings.root,
        recursive = settings.recursive,
        debounce = ?settings.debounce(),
        "starting watch session"
    );

    let ignore = IgnoreEvaluator::from_settings(fs.as_ref(), &settings)?;
    register_tree(&mut watcher, fs.as_ref(), &ignore, settings.recursive)?;
    let core = SessionCore::start(&settings, fs, ignore)?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let session = Session::new(core, watcher, hook, inputs, cancel_rx);
    let task = tokio::spawn(session.run());

    Ok(SessionHandle {
        root: settings.root,
        cancel_tx,
        task,
    })
}
