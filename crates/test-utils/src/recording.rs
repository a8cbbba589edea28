use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use notify::event::{
    CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode,
};
use notify::{Event, EventKind};
use tokio::time::Instant;
use reloadwatch::errors::{ReloadwatchError, Result};
use reloadwatch::exec::ReloadHook;
use reloadwatch::watch::DirectoryWatcher;

/// A hook that records the (tokio) instant of every firing.
///
/// Clones share the same record, so a test can keep one clone and hand the
/// other to the session.
#[derive(Debug, Clone, Default)]
pub struct RecordingHook {
    fired: Arc<Mutex<Vec<Instant>>>,
}

impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.fired.lock().unwrap().len()
    }

    pub fn firings(&self) -> Vec<Instant> {
        self.fired.lock().unwrap().clone()
    }
}

impl ReloadHook for RecordingHook {
    fn fire(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let fired = Arc::clone(&self.fired);
        Box::pin(async move {
            fired.lock().unwrap().push(Instant::now());
        })
    }
}

/// A directory watcher that records subscriptions instead of touching the
/// OS. Paths listed in `failing` return an error.
#[derive(Debug, Clone, Default)]
pub struct RecordingRegistrar {
    watched: Arc<Mutex<Vec<PathBuf>>>,
    failing: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subscribing `dir` fail.
    pub fn fail_on(&self, dir: impl Into<PathBuf>) {
        self.failing.lock().unwrap().push(dir.into());
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched.lock().unwrap().clone()
    }

    pub fn is_watching(&self, dir: &Path) -> bool {
        self.watched.lock().unwrap().iter().any(|d| d == dir)
    }
}

impl DirectoryWatcher for RecordingRegistrar {
    fn watch_dir(&mut self, dir: &Path) -> Result<()> {
        if self.failing.lock().unwrap().iter().any(|d| d == dir) {
            return Err(ReloadwatchError::ConfigError(format!(
                "refusing to watch {}",
                dir.display()
            )));
        }
        self.watched.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }
}

pub fn created(path: impl Into<PathBuf>) -> Event {
    Event::new(EventKind::Create(CreateKind::File)).add_path(path.into())
}

pub fn created_dir(path: impl Into<PathBuf>) -> Event {
    Event::new(EventKind::Create(CreateKind::Folder)).add_path(path.into())
}

pub fn data_modified(path: impl Into<PathBuf>) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path.into())
}

pub fn metadata_changed(path: impl Into<PathBuf>) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)))
        .add_path(path.into())
}

pub fn removed(path: impl Into<PathBuf>) -> Event {
    Event::new(EventKind::Remove(RemoveKind::Any)).add_path(path.into())
}

pub fn renamed(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
        .add_path(from.into())
        .add_path(to.into())
}

/// A rename whose backend could not say which half `path` is.
pub fn renamed_any(path: impl Into<PathBuf>) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any))).add_path(path.into())
}
