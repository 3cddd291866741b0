//! The native module's durable save store
//!
//! Saves the module writes through its host imports land here, one file per
//! save name. [`crate::persist::DirectorySync`] flushes the same directory.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// A directory holding one file per save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDir {
    root: PathBuf,
}

impl SaveDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `name` is stored, or `None` if it is not a plain file name.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => Some(self.root.join(file)),
            _ => None,
        }
    }

    /// Store one save, replacing any previous contents.
    ///
    /// Written to a temporary file and renamed into place. Nothing is synced
    /// here; the persistence barrier does that once per batch.
    pub fn write(&self, name: &str, data: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(name).ok_or_else(|| invalid_name(name))?;
        fs::create_dir_all(&self.root)?;

        let tmp = self.root.join(format!(".{name}.tmp"));
        fs::write(&tmp, data)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(path)
    }

    /// Contents of a stored save; `None` if it was never written.
    pub fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.path_for(name).ok_or_else(|| invalid_name(name))?;
        match fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn invalid_name(name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{name:?} is not a valid save name"),
    )
}
