//! Download-saves command - write the module's save archive to disk

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use totalgb_core::{Bridge, BridgeConfig, ForeignModule};

use crate::host::{self, ModuleArgs};

/// Arguments for the download-saves command
#[derive(Args, Debug)]
pub struct DownloadSavesArgs {
    #[command(flatten)]
    pub module: ModuleArgs,

    /// Output file (defaults to [download] file_name in the current directory)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Execute the download-saves command
pub fn execute(args: DownloadSavesArgs, config: &BridgeConfig) -> Result<()> {
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.download.file_name));
    let saves = args.module.save_store(config)?;
    let mut bridge = host::open_bridge(&args.module, &saves, config)?;
    write_archive(&mut bridge, &out)?;
    Ok(())
}

/// Publish the archive and save the published object to `out`.
///
/// Returns false (and leaves `out` untouched) when there are no saves.
pub fn write_archive<M: ForeignModule>(bridge: &mut Bridge<M>, out: &Path) -> Result<bool> {
    if bridge.download_archive()?.is_none() {
        println!("no saves to download");
        return Ok(false);
    }

    let object = bridge
        .current_download()
        .context("Published archive is not registered")?;
    std::fs::write(out, object.bytes())
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!(
        "wrote {} ({} bytes, {})",
        out.display(),
        object.len(),
        object.mime_type()
    );
    Ok(true)
}
