//! Upload-saves command - batch upload, then one sync of the module's store

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use totalgb_core::{BridgeConfig, DirectorySync, FileSelection};

use crate::download_saves;
use crate::host::{self, ModuleArgs};

/// Arguments for the upload-saves command
#[derive(Args, Debug)]
pub struct UploadSavesArgs {
    #[command(flatten)]
    pub module: ModuleArgs,

    /// Save files to upload
    #[arg(required = true)]
    pub saves: Vec<PathBuf>,

    /// Also download the resulting save archive to this file
    #[arg(long)]
    pub archive: Option<PathBuf>,
}

/// Execute the upload-saves command
pub fn execute(args: UploadSavesArgs, config: &BridgeConfig) -> Result<()> {
    let saves = args.module.save_store(config)?;
    let barrier = DirectorySync::for_store(&saves);
    let mut bridge = host::open_bridge(&args.module, &saves, config)?;

    let report = host::runtime()?.block_on(async {
        let selection = FileSelection::from_paths(args.saves.as_slice()).await?;
        let report = bridge.upload_saves(&selection, &barrier).await?;
        Ok::<_, anyhow::Error>(report)
    })?;

    for name in &report.uploaded {
        println!("uploaded {name}");
    }
    for (name, error) in &report.failed {
        eprintln!("failed {name}: {error}");
    }
    if let Some(Err(e)) = &report.sync {
        eprintln!("sync failed: {e}");
    }

    if let Some(out) = &args.archive {
        download_saves::write_archive(&mut bridge, out)?;
    }

    if !report.is_clean() {
        anyhow::bail!(
            "{} of {} saves failed{}",
            report.failed.len(),
            report.total(),
            if matches!(report.sync, Some(Err(_))) {
                " (sync failed)"
            } else {
                ""
            }
        );
    }
    Ok(())
}
