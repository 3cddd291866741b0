//! Error types for the host bridge

use std::path::PathBuf;

use thiserror::Error;

use crate::foreign::{EntryPoint, ForeignPtr};

/// A selection was rejected before any read or foreign call happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing was selected
    #[error("no files selected")]
    NoFiles,

    /// ROM loading takes exactly one file
    #[error("expected exactly one ROM file, got {0}")]
    WrongFileCount(usize),

    /// A file exceeds the configured cap
    #[error("{name} is too big ({size} bytes, max {max} bytes)")]
    FileTooLarge { name: String, size: u64, max: u64 },

    /// An empty ROM can never load
    #[error("{0} is empty")]
    EmptyFile(String),

    /// The name cannot be passed as a C string
    #[error("file name {0:?} contains a NUL byte")]
    InvalidName(String),
}

/// The persistence barrier could not flush the durable store.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to sync {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk save directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("sync task did not complete: {0}")]
    Join(String),
}

/// Every way a bridge operation can fail.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// `malloc` returned null
    #[error("foreign allocation of {len} bytes failed")]
    AllocationFailed { len: u32 },

    /// A host buffer is too long to address from a 32-bit module
    #[error("payload of {len} bytes does not fit in foreign memory")]
    PayloadTooLarge { len: usize },

    /// A copy into or out of linear memory fell outside its bounds
    #[error("foreign memory access out of bounds ({len} bytes at {ptr})")]
    OutOfBounds { ptr: ForeignPtr, len: u32 },

    /// The module does not export a required function
    #[error("module does not export {0:?}")]
    MissingExport(String),

    /// An entry point returned nothing where a value was expected
    #[error("{0} returned no value")]
    MissingReturn(EntryPoint),

    /// The foreign function trapped or rejected its arguments
    #[error("{name} failed: {source:#}")]
    ForeignCall {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The archive size was nonzero but no archive pointer came back
    #[error("archive of {size} bytes has a null pointer")]
    NullArchive { size: u32 },

    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl BridgeError {
    /// True for rejections that happened before any read or foreign call.
    pub fn is_validation(&self) -> bool {
        matches!(self, BridgeError::Validation(_))
    }
}
