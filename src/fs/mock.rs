// src/fs/mock.rs

use super::{FileMeta, FileSystem};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, modified: SystemTime },
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem with a logical clock.
///
/// Every mutation advances the clock by one second, so two successive writes
/// to the same file always carry distinguishable modification times.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    tick: Arc<Mutex<u64>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_mtime(&self) -> SystemTime {
        let mut tick = self.tick.lock().unwrap();
        *tick += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(*tick)
    }

    /// Create or overwrite a file, creating parent directories implicitly.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let modified = self.next_mtime();
        self.set_file(path, content, modified);
    }

    /// Create or overwrite a file with an explicit modification time.
    pub fn set_file(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.files.lock().unwrap();
        files.insert(
            path.clone(),
            MockEntry::File {
                content: content.into(),
                modified,
            },
        );
        link_into_parent(&mut files, &path);
    }

    /// Create an (empty) directory and its parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.files.lock().unwrap();
        files
            .entry(path.clone())
            .or_insert_with(|| MockEntry::Dir(Vec::new()));
        link_into_parent(&mut files, &path);
    }

    /// Bump a file's modification time without touching its content.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let modified = self.next_mtime();
        let mut files = self.files.lock().unwrap();
        if let Some(MockEntry::File { modified: m, .. }) = files.get_mut(path.as_ref()) {
            *m = modified;
        }
    }

    /// Remove a file or a whole directory subtree.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut files = self.files.lock().unwrap();
        files.retain(|p, _| !p.starts_with(path));
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                let name = name.to_string_lossy();
                children.retain(|c| c.as_str() != name);
            }
        }
    }
}

fn link_into_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return;
    };
    if parent.as_os_str().is_empty() {
        return;
    }

    if !files.contains_key(parent) {
        files.insert(parent.to_path_buf(), MockEntry::Dir(Vec::new()));
        link_into_parent(files, parent);
    }

    if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
        let name = name.to_string_lossy().into_owned();
        if !children.contains(&name) {
            children.push(name);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File { content, .. }) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn metadata(&self, path: &Path) -> Result<FileMeta> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File { content, modified }) => Ok(FileMeta {
                is_dir: false,
                is_file: true,
                len: content.len() as u64,
                modified: *modified,
            }),
            Some(MockEntry::Dir(_)) => Ok(FileMeta {
                is_dir: true,
                is_file: false,
                len: 0,
                modified: SystemTime::UNIX_EPOCH,
            }),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Tests use absolute paths throughout, so the path is already canonical.
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(anyhow!("File not found: {:?}", path))
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
