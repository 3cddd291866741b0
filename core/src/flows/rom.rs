//! ROM load flow

use crate::config::LimitsConfig;
use crate::error::{BridgeError, ValidationError};
use crate::foreign::{EntryPoint, ForeignModule, TransferRequest, transfer};
use crate::payload::{BinaryPayload, encode_name};
use crate::selection::{FileSelection, SelectedFile};

/// Check a ROM selection without reading it.
///
/// Exactly one non-empty file no larger than `rom_max_size`, with a name
/// that can be passed as a C string.
pub fn validate_rom_selection<'a>(
    selection: &'a FileSelection,
    limits: &LimitsConfig,
) -> Result<&'a SelectedFile, ValidationError> {
    let file = match (selection.len(), selection.get(0)) {
        (1, Some(file)) => file,
        (count, _) => return Err(ValidationError::WrongFileCount(count)),
    };

    if file.size() > limits.rom_max_size {
        return Err(ValidationError::FileTooLarge {
            name: file.name().to_string(),
            size: file.size(),
            max: limits.rom_max_size,
        });
    }
    if file.size() == 0 {
        return Err(ValidationError::EmptyFile(file.name().to_string()));
    }
    encode_name(file.name())?;

    Ok(file)
}

/// Read the selected ROM and hand it to the module's "load ROM" entry point.
///
/// Nothing is read and nothing crosses the boundary unless the selection
/// validates. The bytes actually read are checked against the limit again, so
/// a file that grew after selection is never truncated or passed through.
pub async fn load_rom<M: ForeignModule + ?Sized>(
    module: &mut M,
    selection: &FileSelection,
    limits: &LimitsConfig,
) -> Result<(), BridgeError> {
    let file = match validate_rom_selection(selection, limits) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(files = selection.len(), "Rejected ROM selection: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!(
        name = file.name(),
        files = selection.len(),
        size = file.size(),
        "Loading ROM"
    );

    let data = file.read().await.map_err(|source| BridgeError::Read {
        name: file.name().to_string(),
        source,
    })?;

    if data.len() as u64 > limits.rom_max_size {
        return Err(ValidationError::FileTooLarge {
            name: file.name().to_string(),
            size: data.len() as u64,
            max: limits.rom_max_size,
        }
        .into());
    }

    let payload = BinaryPayload::new(file.name(), data)?;
    transfer(module, &TransferRequest::new(EntryPoint::LoadRom, &payload))?;

    tracing::info!(name = payload.name(), len = payload.len(), "ROM handed to module");
    Ok(())
}
