//! Save upload flow (batch)

use futures::StreamExt;
use futures::stream::FuturesUnordered;

use super::batch::{BatchJob, BatchProgress};
use crate::config::LimitsConfig;
use crate::error::{BridgeError, SyncError, ValidationError};
use crate::foreign::{EntryPoint, ForeignModule, TransferRequest, transfer};
use crate::payload::{BinaryPayload, encode_name};
use crate::persist::PersistenceBarrier;
use crate::selection::FileSelection;

/// Outcome of one upload batch.
#[derive(Debug)]
pub struct BatchReport {
    /// Names handed to the module, in completion order
    pub uploaded: Vec<String>,
    /// Members whose read or transfer failed
    pub failed: Vec<(String, BridgeError)>,
    /// Barrier result; `None` only if the batch never completed
    pub sync: Option<Result<(), SyncError>>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }

    /// True when every save uploaded and the barrier succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && matches!(self.sync, Some(Ok(())))
    }
}

/// Check every file of a save selection without reading any of them.
///
/// One oversized file rejects the whole batch.
pub fn validate_save_selection(
    selection: &FileSelection,
    limits: &LimitsConfig,
) -> Result<(), ValidationError> {
    if selection.is_empty() {
        return Err(ValidationError::NoFiles);
    }

    for file in selection.iter() {
        tracing::debug!(name = file.name(), size = file.size(), "Checking save");
        if file.size() > limits.save_max_size {
            return Err(ValidationError::FileTooLarge {
                name: file.name().to_string(),
                size: file.size(),
                max: limits.save_max_size,
            });
        }
        encode_name(file.name())?;
    }
    Ok(())
}

fn upload_one<M: ForeignModule + ?Sized>(
    module: &mut M,
    name: &str,
    data: Vec<u8>,
    limits: &LimitsConfig,
) -> Result<(), BridgeError> {
    if data.len() as u64 > limits.save_max_size {
        return Err(ValidationError::FileTooLarge {
            name: name.to_string(),
            size: data.len() as u64,
            max: limits.save_max_size,
        }
        .into());
    }

    let payload = BinaryPayload::new(name, data)?;
    transfer(module, &TransferRequest::new(EntryPoint::UploadSave, &payload))?;
    Ok(())
}

/// Upload every selected save, then issue one persistence barrier.
///
/// All reads start together; each save is transferred as soon as its own read
/// finishes, so transfers happen in completion order. A member whose read or
/// transfer fails is reported and still counts toward the batch. The barrier
/// runs once, after the last member, and its failure rolls nothing back.
///
/// If validation fails nothing is read and the barrier is not issued.
pub async fn upload_saves<M, B>(
    module: &mut M,
    selection: &FileSelection,
    limits: &LimitsConfig,
    barrier: &B,
) -> Result<BatchReport, BridgeError>
where
    M: ForeignModule + ?Sized,
    B: PersistenceBarrier + ?Sized,
{
    if let Err(e) = validate_save_selection(selection, limits) {
        tracing::warn!(files = selection.len(), "Rejected save batch: {}", e);
        return Err(e.into());
    }

    tracing::info!(files = selection.len(), "Uploading saves");

    let mut job = BatchJob::new(selection.len());
    let mut reads: FuturesUnordered<_> = selection
        .iter()
        .enumerate()
        .map(|(index, file)| async move { (index, file, file.read().await) })
        .collect();

    let mut report = BatchReport {
        uploaded: Vec::with_capacity(selection.len()),
        failed: Vec::new(),
        sync: None,
    };

    while let Some((index, file, read)) = reads.next().await {
        let outcome = read
            .map_err(|source| BridgeError::Read {
                name: file.name().to_string(),
                source,
            })
            .and_then(|data| upload_one(module, file.name(), data, limits));

        let uploaded = match outcome {
            Ok(()) => {
                tracing::debug!(name = file.name(), index, "Save uploaded");
                report.uploaded.push(file.name().to_string());
                true
            }
            Err(e) => {
                tracing::warn!(name = file.name(), index, "Save upload failed: {}", e);
                report.failed.push((file.name().to_string(), e));
                false
            }
        };

        match job.record(index, uploaded) {
            BatchProgress::Pending { remaining } => {
                tracing::trace!(remaining, "Waiting for batch");
            }
            BatchProgress::Duplicate => {
                tracing::warn!(index, "Batch member completed twice");
            }
            BatchProgress::Complete => {
                let sync = barrier.sync().await;
                if let Err(e) = &sync {
                    tracing::warn!("Persistence sync failed: {}", e);
                }
                report.sync = Some(sync);
                break;
            }
        }
    }

    tracing::info!(
        uploaded = report.uploaded.len(),
        failed = report.failed.len(),
        "Save batch finished"
    );
    Ok(report)
}
