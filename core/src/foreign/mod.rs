//! The foreign module seam
//!
//! The native module owns its own linear memory and exposes a handful of
//! entry points taking and returning 32-bit integers. Everything the bridge
//! needs from it goes through [`ForeignModule`], so the flows can run against
//! a real wasmtime instance ([`crate::wasm::NativeModule`]) or a test double.
//!
//! # Key Types
//!
//! - [`ForeignModule`] - Allocate, copy, call and free across the boundary
//! - [`BufferScope`] - Owns every buffer of one request and frees them on drop
//! - [`TransferRequest`] / [`transfer`] - The name + data transfer primitive

mod buffer;
mod transfer;


use std::fmt;

use crate::error::BridgeError;

pub use buffer::{BufferScope, ForeignBuffer};
pub use transfer::{TransferRequest, transfer};

/// A pointer into foreign linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForeignPtr(u32);

impl ForeignPtr {
    pub const NULL: ForeignPtr = ForeignPtr(0);

    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    pub const fn addr(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ForeignPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Entry points the bridge calls by role.
///
/// Memory management (`malloc`/`free`) is not listed here; it is reached only
/// through [`BufferScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// `(name_ptr, data_ptr, data_len)`
    LoadRom,
    /// `(name_ptr, data_ptr, data_len)`
    UploadSave,
    /// `() -> size`, zero when there is nothing to archive
    ArchiveSize,
    /// `() -> ptr` to the archive built by [`EntryPoint::ArchiveSize`]
    ArchiveData,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 4] = [
        EntryPoint::LoadRom,
        EntryPoint::UploadSave,
        EntryPoint::ArchiveSize,
        EntryPoint::ArchiveData,
    ];

    /// Human-readable role name used in diagnostics.
    pub fn role(self) -> &'static str {
        match self {
            EntryPoint::LoadRom => "load ROM",
            EntryPoint::UploadSave => "upload save",
            EntryPoint::ArchiveSize => "compute archive size",
            EntryPoint::ArchiveData => "fetch archive pointer",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role())
    }
}

/// Operations the bridge needs from a native module.
///
/// Implementations are single-threaded and synchronous; none of these calls
/// may suspend, which keeps every allocate/copy/call/free sequence atomic with
/// respect to the event loop.
pub trait ForeignModule {
    /// Allocate `len` bytes of linear memory. May return [`ForeignPtr::NULL`]
    /// when memory is exhausted.
    fn malloc(&mut self, len: u32) -> Result<ForeignPtr, BridgeError>;

    /// Release a pointer previously returned by `malloc` (or handed over by an
    /// entry point). Freeing null is a no-op.
    fn free(&mut self, ptr: ForeignPtr) -> Result<(), BridgeError>;

    /// Copy `bytes` into linear memory starting at `ptr`.
    fn write_bytes(&mut self, ptr: ForeignPtr, bytes: &[u8]) -> Result<(), BridgeError>;

    /// Copy `len` bytes starting at `ptr` out of linear memory.
    fn read_bytes(&self, ptr: ForeignPtr, len: u32) -> Result<Vec<u8>, BridgeError>;

    /// Call an entry point with positional integer arguments, returning its
    /// first result (if it has one) uninterpreted.
    fn invoke(&mut self, entry: EntryPoint, args: &[u32]) -> Result<Option<u32>, BridgeError>;
}
