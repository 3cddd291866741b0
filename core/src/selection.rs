//! Host-side file selections
//!
//! A [`FileSelection`] is what a file picker hands the bridge: names and
//! reported sizes up front, contents only on demand. Flows validate the
//! reported sizes before reading anything.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;

/// Where a selected file's contents come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A file on disk, read with `tokio::fs`
    Path(PathBuf),
    /// Contents already held in memory
    Memory(Arc<[u8]>),
    /// Contents another task delivers later through [`DeferredContents`]
    Deferred(watch::Receiver<Option<Arc<[u8]>>>),
}

/// Sending half of a [`FileSource::Deferred`] selection.
///
/// Dropping it without delivering makes the read fail.
#[derive(Debug)]
pub struct DeferredContents {
    tx: watch::Sender<Option<Arc<[u8]>>>,
}

impl DeferredContents {
    pub fn deliver(self, bytes: impl Into<Arc<[u8]>>) {
        // No receivers left means nobody will read it.
        let _ = self.tx.send(Some(bytes.into()));
    }
}

/// One entry of a selection.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    size: u64,
    source: FileSource,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, size: u64, source: FileSource) -> Self {
        Self {
            name: name.into(),
            size,
            source,
        }
    }

    /// Select an in-memory blob; its reported size is its length.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self::new(name, bytes.len() as u64, FileSource::Memory(bytes))
    }

    /// Select a file whose size is known now but whose contents arrive later.
    pub fn deferred(name: impl Into<String>, size: u64) -> (Self, DeferredContents) {
        let (tx, rx) = watch::channel(None);
        let file = Self::new(name, size, FileSource::Deferred(rx));
        (file, DeferredContents { tx })
    }

    /// Select a file on disk, taking its name and size from the filesystem.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, metadata.len(), FileSource::Path(path.to_path_buf())))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size reported at selection time.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Read the whole file. This is the flows' only suspension point.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(path) => tokio::fs::read(path).await,
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
            FileSource::Deferred(rx) => {
                let mut rx = rx.clone();
                let contents = rx.wait_for(Option::is_some).await.map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("{} was never delivered", self.name),
                    )
                })?;
                Ok(contents.as_deref().map(<[u8]>::to_vec).unwrap_or_default())
            }
        }
    }
}

/// The files picked by one user action, in selection order.
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    files: Vec<SelectedFile>,
}

impl FileSelection {
    pub fn new(files: Vec<SelectedFile>) -> Self {
        Self { files }
    }

    /// Select every path, in order.
    pub async fn from_paths<P: AsRef<Path>>(paths: &[P]) -> io::Result<Self> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(SelectedFile::from_path(path).await?);
        }
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SelectedFile> {
        self.files.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedFile> {
        self.files.iter()
    }
}

impl FromIterator<SelectedFile> for FileSelection {
    fn from_iter<T: IntoIterator<Item = SelectedFile>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
