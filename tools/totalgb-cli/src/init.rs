//! Init-config command - write the default configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use totalgb_core::config::{self, BridgeConfig};

/// Arguments for the init-config command
#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Execute the init-config command
///
/// Writes to `--config` when given, otherwise to the platform config directory.
pub fn execute(args: InitConfigArgs, path: Option<&Path>) -> Result<()> {
    let path: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => config::config_dir()
            .context("Could not determine the platform config directory")?
            .join("config.toml"),
    };

    if path.exists() && !args.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    config::save_to(&path, &BridgeConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}
