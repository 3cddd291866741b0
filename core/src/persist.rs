//! Persistence-sync barrier
//!
//! After a batch of saves lands in the native module's store, the host asks
//! the store's backing medium to flush. The flush does not gate the uploads
//! themselves: they count as applied once the barrier has been issued.
//!
//! The module writes its saves into a [`SaveDir`] through host imports, so
//! [`DirectorySync`] over that directory flushes exactly what it wrote.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::SyncError;
use crate::store::SaveDir;

/// Flushes the native module's durable store.
pub trait PersistenceBarrier {
    /// Resolve once pending writes have reached the storage medium.
    fn sync(&self) -> impl Future<Output = Result<(), SyncError>>;
}

/// Barrier that fsyncs every file under a save directory.
#[derive(Debug, Clone)]
pub struct DirectorySync {
    dir: PathBuf,
}

impl DirectorySync {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Barrier over the directory a module's save store writes to.
    pub fn for_store(store: &SaveDir) -> Self {
        Self::new(store.root())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sync the directory off the async thread. Returns the files synced.
    pub async fn flush(&self) -> Result<usize, SyncError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || sync_tree(&dir))
            .await
            .map_err(|e| SyncError::Join(e.to_string()))?
    }
}

impl PersistenceBarrier for DirectorySync {
    async fn sync(&self) -> Result<(), SyncError> {
        let synced = self.flush().await?;
        tracing::debug!(dir = %self.dir.display(), files = synced, "Save directory synced");
        Ok(())
    }
}

/// Sync every file below `root`, then the directories themselves.
///
/// A missing root has nothing to flush. Returns the number of files synced.
fn sync_tree(root: &Path) -> Result<usize, SyncError> {
    if !root.exists() {
        tracing::debug!(dir = %root.display(), "Save directory does not exist yet");
        return Ok(0);
    }

    let mut files = 0;
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() {
            sync_path(path)?;
            files += 1;
        } else if entry.file_type().is_dir() {
            dirs.push(path.to_path_buf());
        }
    }

    // Children before parents.
    for dir in dirs.iter().rev() {
        sync_dir(dir)?;
    }
    Ok(files)
}

fn sync_path(path: &Path) -> Result<(), SyncError> {
    fs::File::open(path)
        .and_then(|file| file.sync_all())
        .map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> Result<(), SyncError> {
    sync_path(path)
}

// Directories cannot be opened for syncing on Windows.
#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> Result<(), SyncError> {
    Ok(())
}
