//! The bridge facade
//!
//! Binds one native module to the configuration and download target the
//! flows need, so hosts can call `load_rom` / `upload_saves` /
//! `download_archive` without threading limits through every call.

use crate::config::{BridgeConfig, DownloadConfig, LimitsConfig};
use crate::download::{DownloadTarget, DownloadableObject, ObjectUrl, ObjectUrlRegistry};
use crate::error::BridgeError;
use crate::flows::{self, BatchReport};
use crate::foreign::ForeignModule;
use crate::persist::PersistenceBarrier;
use crate::selection::FileSelection;

/// Id of the element the save archive is published to.
pub const SAVES_TARGET: &str = "DlSaves";

/// A native module plus the host state its flows operate on.
///
/// Every flow takes `&mut self`, so two flows on one bridge never overlap and
/// a second save batch starts only after the first has issued its barrier.
pub struct Bridge<M: ForeignModule> {
    module: M,
    limits: LimitsConfig,
    download: DownloadConfig,
    registry: ObjectUrlRegistry,
    target: DownloadTarget,
}

impl<M: ForeignModule> Bridge<M> {
    pub fn new(module: M, config: &BridgeConfig) -> Self {
        Self {
            module,
            limits: config.limits.clone(),
            download: config.download.clone(),
            registry: ObjectUrlRegistry::new(),
            target: DownloadTarget::new(SAVES_TARGET),
        }
    }

    pub async fn load_rom(&mut self, selection: &FileSelection) -> Result<(), BridgeError> {
        flows::load_rom(&mut self.module, selection, &self.limits).await
    }

    pub async fn upload_saves<B: PersistenceBarrier + ?Sized>(
        &mut self,
        selection: &FileSelection,
        barrier: &B,
    ) -> Result<BatchReport, BridgeError> {
        flows::upload_saves(&mut self.module, selection, &self.limits, barrier).await
    }

    /// Build and publish the save archive. `Ok(None)` means there were no
    /// saves and the previous download (if any) is still current.
    pub fn download_archive(&mut self) -> Result<Option<ObjectUrl>, BridgeError> {
        flows::download_archive(
            &mut self.module,
            &mut self.registry,
            &mut self.target,
            &self.download,
        )
    }

    /// The object the download target currently points at.
    pub fn current_download(&self) -> Option<&DownloadableObject> {
        self.target
            .href()
            .and_then(|url| self.registry.resolve(url))
    }

    pub fn target(&self) -> &DownloadTarget {
        &self.target
    }

    pub fn registry(&self) -> &ObjectUrlRegistry {
        &self.registry
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn into_inner(self) -> M {
        self.module
    }
}
