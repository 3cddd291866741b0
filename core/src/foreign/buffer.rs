//! Scoped ownership of foreign buffers

use smallvec::SmallVec;

use super::{ForeignModule, ForeignPtr};
use crate::error::BridgeError;

/// A `(pointer, length)` view of a buffer owned by a [`BufferScope`].
///
/// The view is only meaningful while the scope that produced it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignBuffer {
    pub ptr: ForeignPtr,
    pub len: u32,
}

/// Exclusive owner of every foreign buffer taken during one request.
///
/// The scope holds the only mutable borrow of the module for its lifetime and
/// frees each buffer it owns, exactly once and in reverse order, when dropped.
/// That covers normal returns, early `?` returns and unwinding alike.
pub struct BufferScope<'m, M: ForeignModule + ?Sized> {
    module: &'m mut M,
    owned: SmallVec<[ForeignBuffer; 2]>,
}

impl<'m, M: ForeignModule + ?Sized> BufferScope<'m, M> {
    pub fn new(module: &'m mut M) -> Self {
        Self {
            module,
            owned: SmallVec::new(),
        }
    }

    /// Allocate a buffer sized exactly to `bytes` and copy them in verbatim.
    ///
    /// The buffer is owned by the scope as soon as `malloc` succeeds, so a
    /// failed copy still frees it.
    pub fn alloc_copy(&mut self, bytes: &[u8]) -> Result<ForeignBuffer, BridgeError> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| BridgeError::PayloadTooLarge { len: bytes.len() })?;

        let ptr = self.module.malloc(len)?;
        if ptr.is_null() && len > 0 {
            return Err(BridgeError::AllocationFailed { len });
        }

        let buffer = ForeignBuffer { ptr, len };
        self.owned.push(buffer);
        self.module.write_bytes(ptr, bytes)?;
        Ok(buffer)
    }

    /// Take ownership of a buffer the module allocated on its own, such as
    /// the save archive.
    pub fn adopt(&mut self, ptr: ForeignPtr, len: u32) -> ForeignBuffer {
        let buffer = ForeignBuffer { ptr, len };
        self.owned.push(buffer);
        buffer
    }

    /// Copy an owned buffer's contents back into host memory.
    pub fn read(&self, buffer: ForeignBuffer) -> Result<Vec<u8>, BridgeError> {
        self.module.read_bytes(buffer.ptr, buffer.len)
    }

    /// The module, for calls made while the buffers are live.
    pub fn module(&mut self) -> &mut M {
        &mut *self.module
    }

    /// Number of buffers still waiting to be freed.
    pub fn live(&self) -> usize {
        self.owned.len()
    }
}

impl<M: ForeignModule + ?Sized> Drop for BufferScope<'_, M> {
    fn drop(&mut self) {
        if self.live() > 0 {
            tracing::trace!(buffers = self.live(), "Releasing foreign buffers");
        }
        while let Some(buffer) = self.owned.pop() {
            if let Err(e) = self.module.free(buffer.ptr) {
                tracing::warn!(
                    error = %e,
                    ptr = %buffer.ptr,
                    len = buffer.len,
                    "Failed to free foreign buffer"
                );
            }
        }
    }
}
