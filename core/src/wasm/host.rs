//! Host functions the native module imports
//!
//! The module keeps its saves in the host's [`SaveDir`](crate::store::SaveDir)
//! instead of a filesystem of its own. Names are passed as NUL-terminated
//! pointers, the same way the bridge hands them to the module.

use anyhow::Result;
use wasmtime::{Caller, Linker};

use super::module::ModuleContext;

/// Import module the host functions are defined in
pub const HOST_MODULE: &str = "env";
/// `(name_ptr, data_ptr, data_len) -> status`
pub const SAVE_WRITE: &str = "totalgb_save_write";
/// `(name_ptr, data_ptr, max_len) -> bytes copied or status`
pub const SAVE_READ: &str = "totalgb_save_read";

pub const SAVE_OK: i32 = 0;
pub const SAVE_NO_STORE: i32 = -1;
pub const SAVE_BAD_NAME: i32 = -2;
pub const SAVE_TOO_LARGE: i32 = -3;
pub const SAVE_BAD_POINTER: i32 = -4;
pub const SAVE_IO: i32 = -5;
pub const SAVE_NOT_FOUND: i32 = -6;

/// Longest save name read out of linear memory, terminator excluded.
const MAX_NAME_LEN: usize = 255;

/// Register the save store imports with the linker
pub fn register_host_functions(linker: &mut Linker<ModuleContext>) -> Result<()> {
    linker.func_wrap(HOST_MODULE, SAVE_WRITE, save_write)?;
    linker.func_wrap(HOST_MODULE, SAVE_READ, save_read)?;
    Ok(())
}

fn read_name(memory: &[u8], ptr: u32) -> Option<String> {
    let tail = memory.get(ptr as usize..)?;
    let window = &tail[..tail.len().min(MAX_NAME_LEN + 1)];
    let end = window.iter().position(|&b| b == 0)?;
    String::from_utf8(window[..end].to_vec()).ok()
}

/// Store a save under its name.
///
/// Returns `SAVE_OK`, or a negative status.
fn save_write(
    caller: Caller<'_, ModuleContext>,
    name_ptr: u32,
    data_ptr: u32,
    data_len: u32,
) -> i32 {
    let ctx = caller.data();
    let Some(memory) = ctx.memory else {
        return SAVE_BAD_POINTER;
    };
    let Some(store) = ctx.saves.as_ref() else {
        return SAVE_NO_STORE;
    };
    if u64::from(data_len) > ctx.limits.save_max_size {
        return SAVE_TOO_LARGE;
    }

    let bytes = memory.data(&caller);
    let Some(name) = read_name(bytes, name_ptr) else {
        return SAVE_BAD_NAME;
    };
    let start = data_ptr as usize;
    let Some(data) = start
        .checked_add(data_len as usize)
        .and_then(|end| bytes.get(start..end))
    else {
        return SAVE_BAD_POINTER;
    };

    match store.write(&name, data) {
        Ok(path) => {
            tracing::debug!(name = %name, len = data.len(), path = %path.display(), "Save written");
            SAVE_OK
        }
        Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => SAVE_BAD_NAME,
        Err(e) => {
            tracing::warn!(name = %name, "Failed to write save: {}", e);
            SAVE_IO
        }
    }
}

/// Copy up to `max_len` bytes of a stored save into linear memory.
///
/// Returns the number of bytes copied, or a negative status.
fn save_read(
    mut caller: Caller<'_, ModuleContext>,
    name_ptr: u32,
    data_ptr: u32,
    max_len: u32,
) -> i32 {
    let Some(memory) = caller.data().memory else {
        return SAVE_BAD_POINTER;
    };
    let Some(name) = read_name(memory.data(&caller), name_ptr) else {
        return SAVE_BAD_NAME;
    };
    let read = match caller.data().saves.as_ref() {
        Some(store) => store.read(&name),
        None => return SAVE_NO_STORE,
    };

    let data = match read {
        Ok(Some(data)) => data,
        Ok(None) => return SAVE_NOT_FOUND,
        Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => return SAVE_BAD_NAME,
        Err(e) => {
            tracing::warn!(name = %name, "Failed to read save: {}", e);
            return SAVE_IO;
        }
    };

    let len = data.len().min(max_len as usize);
    let Ok(copied) = i32::try_from(len) else {
        return SAVE_TOO_LARGE;
    };
    match memory.write(&mut caller, data_ptr as usize, &data[..len]) {
        Ok(()) => copied,
        Err(_) => SAVE_BAD_POINTER,
    }
}
