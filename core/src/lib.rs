//! TotalGB Core - Host bridge for the native emulator module
//!
//! Moves ROMs, save files and the save archive between the host and a
//! sandboxed WASM build of the emulator.
//!
//! # Architecture
//!
//! - [`ForeignModule`] - Seam to the native module (allocate, copy, call, free)
//! - [`transfer`] - The name + data transfer primitive, scoped by [`BufferScope`]
//! - [`flows`] - ROM load, save batch upload, archive download
//! - [`Bridge`] - One module bound to its configuration and download target
//! - [`NativeModule`] - wasmtime implementation of [`ForeignModule`]
//! - [`SaveDir`] - The module's save store, flushed by [`DirectorySync`]

pub mod bridge;
pub mod config;
pub mod download;
pub mod error;
pub mod flows;
pub mod foreign;
#[cfg(test)]
mod integration;
pub mod payload;
pub mod persist;
pub mod selection;
pub mod store;
#[cfg(test)]
pub mod test_utils;
pub mod wasm;

pub use bridge::{Bridge, SAVES_TARGET};
pub use config::BridgeConfig;
pub use download::{DownloadTarget, DownloadableObject, ObjectUrl, ObjectUrlRegistry};
pub use error::{BridgeError, SyncError, ValidationError};
pub use flows::{BatchReport, download_archive, load_rom, upload_saves};
pub use foreign::{
    BufferScope, EntryPoint, ForeignBuffer, ForeignModule, ForeignPtr, TransferRequest, transfer,
};
pub use payload::BinaryPayload;
pub use persist::{DirectorySync, PersistenceBarrier};
pub use selection::{FileSelection, FileSource, SelectedFile};
pub use store::SaveDir;
pub use wasm::{ModuleContext, NativeModule, WasmEngine};
