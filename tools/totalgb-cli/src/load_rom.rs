//! Load-rom command - hand one ROM to the module

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use totalgb_core::{BridgeConfig, FileSelection};

use crate::host::{self, ModuleArgs};

/// Arguments for the load-rom command
#[derive(Args, Debug)]
pub struct LoadRomArgs {
    #[command(flatten)]
    pub module: ModuleArgs,

    /// ROM file (exactly one is accepted)
    #[arg(required = true)]
    pub rom: Vec<PathBuf>,
}

/// Execute the load-rom command
pub fn execute(args: LoadRomArgs, config: &BridgeConfig) -> Result<()> {
    let saves = args.module.save_store(config)?;
    let mut bridge = host::open_bridge(&args.module, &saves, config)?;

    host::runtime()?.block_on(async {
        let selection = FileSelection::from_paths(args.rom.as_slice()).await?;
        bridge.load_rom(&selection).await?;
        Ok::<_, anyhow::Error>(())
    })
}
