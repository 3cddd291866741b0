//! Save archive download flow

use crate::config::DownloadConfig;
use crate::download::{DownloadTarget, DownloadableObject, ObjectUrl, ObjectUrlRegistry};
use crate::error::BridgeError;
use crate::foreign::{BufferScope, EntryPoint, ForeignModule, ForeignPtr};

/// What the module reported when asked to build the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveResult {
    pub size: u32,
    pub ptr: ForeignPtr,
}

fn expect_value<M: ForeignModule + ?Sized>(
    module: &mut M,
    entry: EntryPoint,
) -> Result<u32, BridgeError> {
    module
        .invoke(entry, &[])?
        .ok_or(BridgeError::MissingReturn(entry))
}

/// Ask the module to build its save archive and copy it out.
///
/// Returns `Ok(None)` when there is nothing to archive; in that case the data
/// entry point is never called. The module's archive buffer is freed before
/// this returns, including when the copy fails.
pub fn fetch_archive<M: ForeignModule + ?Sized>(
    module: &mut M,
) -> Result<Option<Vec<u8>>, BridgeError> {
    let size = expect_value(module, EntryPoint::ArchiveSize)?;
    if size == 0 {
        return Ok(None);
    }

    let ptr = ForeignPtr::new(expect_value(module, EntryPoint::ArchiveData)?);
    let archive = ArchiveResult { size, ptr };
    if archive.ptr.is_null() {
        return Err(BridgeError::NullArchive { size });
    }

    tracing::debug!(size = archive.size, ptr = %archive.ptr, "Copying save archive");

    let mut scope = BufferScope::new(module);
    let buffer = scope.adopt(archive.ptr, archive.size);
    scope.read(buffer).map(Some)
}

/// Build the save archive and publish it to `target` for download.
///
/// With no saves nothing is published and `target` keeps whatever it pointed
/// at. Otherwise the archive bytes are registered under a fresh object URL
/// and any URL the target held before is revoked.
pub fn download_archive<M: ForeignModule + ?Sized>(
    module: &mut M,
    registry: &mut ObjectUrlRegistry,
    target: &mut DownloadTarget,
    download: &DownloadConfig,
) -> Result<Option<ObjectUrl>, BridgeError> {
    let Some(bytes) = fetch_archive(module)? else {
        tracing::info!("No saves to archive");
        return Ok(None);
    };

    let len = bytes.len();
    let object = DownloadableObject::new(bytes, &*download.file_name, &*download.mime_type);
    let url = registry.publish(target, object);

    tracing::info!(
        file = %download.file_name,
        len,
        url = %url,
        "Save archive ready"
    );
    Ok(Some(url))
}
