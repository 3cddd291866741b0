//! The name + data transfer primitive

use super::{BufferScope, EntryPoint, ForeignModule};
use crate::error::BridgeError;
use crate::payload::BinaryPayload;

/// One call into a `(name_ptr, data_ptr, data_len)` entry point.
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest<'a> {
    pub entry: EntryPoint,
    /// NUL-terminated name bytes
    pub name: &'a [u8],
    pub data: &'a [u8],
}

impl<'a> TransferRequest<'a> {
    pub fn new(entry: EntryPoint, payload: &'a BinaryPayload) -> Self {
        Self {
            entry,
            name: payload.name_bytes(),
            data: payload.data(),
        }
    }
}

/// Copy a request's name and data into foreign memory and call its entry
/// point as `entry(name_ptr, data_ptr, data_len)`.
///
/// One buffer is allocated per byte sequence, name first. Both are freed
/// before this returns, whether the allocation, the copy or the call failed.
/// The entry point's own return value is handed back untouched.
pub fn transfer<M: ForeignModule + ?Sized>(
    module: &mut M,
    request: &TransferRequest<'_>,
) -> Result<Option<u32>, BridgeError> {
    let mut scope = BufferScope::new(module);

    let name = scope.alloc_copy(request.name)?;
    let data = scope.alloc_copy(request.data)?;

    tracing::debug!(
        entry = %request.entry,
        name_ptr = %name.ptr,
        data_ptr = %data.ptr,
        len = data.len,
        "Calling foreign entry point"
    );

    scope
        .module()
        .invoke(request.entry, &[name.ptr.addr(), data.ptr.addr(), data.len])
}
