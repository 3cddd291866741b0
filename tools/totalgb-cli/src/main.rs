//! TotalGB CLI - Drive the host bridge against a native module build
//!
//! # Commands
//!
//! - `totalgb load-rom` - Hand one ROM to the module's loader
//! - `totalgb upload-saves` - Upload a batch of saves, then sync the module's save store
//! - `totalgb download-saves` - Build the save archive and write it to disk
//! - `totalgb init-config` - Write a default config.toml
//!
//! # Usage
//!
//! ```bash
//! totalgb load-rom --wasm build/totalgb.wasm games/tetris.gb
//! totalgb upload-saves --wasm build/totalgb.wasm --save-dir store/ saves/*.sav --archive backup.zip
//! totalgb download-saves --wasm build/totalgb.wasm --out saves.zip
//! ```
//!
//! Logging is controlled by `RUST_LOG` (default `info`).

mod download_saves;
mod host;
mod init;
mod load_rom;
mod upload_saves;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// TotalGB CLI - Drive the host bridge against a native module build
#[derive(Parser)]
#[command(name = "totalgb")]
#[command(about = "Move ROMs and saves in and out of the TotalGB WASM module")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load one ROM into the module
    LoadRom(load_rom::LoadRomArgs),

    /// Upload save files into the module's store, then sync it once
    UploadSaves(upload_saves::UploadSavesArgs),

    /// Write the module's save archive to a file
    DownloadSaves(download_saves::DownloadSavesArgs),

    /// Write the default configuration
    InitConfig(init::InitConfigArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::LoadRom(args) => load_rom::execute(args, &host::load_config(config_path)?),
        Commands::UploadSaves(args) => {
            upload_saves::execute(args, &host::load_config(config_path)?)
        }
        Commands::DownloadSaves(args) => {
            download_saves::execute(args, &host::load_config(config_path)?)
        }
        Commands::InitConfig(args) => init::execute(args, config_path),
    }
}
