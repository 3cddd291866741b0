//! Host setup shared by every command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use totalgb_core::config::{self, BridgeConfig};
use totalgb_core::{Bridge, ModuleContext, NativeModule, SaveDir, WasmEngine};
use totalgb_shared::{MAX_WASM_BYTES, fs::read_file_with_limit};

/// Which native module build to drive
#[derive(Args, Debug)]
pub struct ModuleArgs {
    /// Path to the emulator's .wasm build
    #[arg(long)]
    pub wasm: PathBuf,

    /// Directory the module stores its saves in (overrides [storage] save_dir)
    #[arg(long)]
    pub save_dir: Option<PathBuf>,
}

impl ModuleArgs {
    /// The module's save store: `--save-dir`, then the config, then the
    /// platform data directory.
    pub fn save_store(&self, config: &BridgeConfig) -> Result<SaveDir> {
        self.save_dir
            .clone()
            .or_else(|| config.storage.resolve_save_dir())
            .map(SaveDir::new)
            .context("No save directory configured and no platform data directory found")
    }
}

/// Load `--config` if given, otherwise the platform config (or defaults).
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    match path {
        Some(path) => config::load_from(path),
        None => Ok(config::load()),
    }
}

/// Compile and instantiate the module over its save store and bind it to a
/// bridge.
pub fn open_bridge(
    args: &ModuleArgs,
    saves: &SaveDir,
    config: &BridgeConfig,
) -> Result<Bridge<NativeModule>> {
    let bytes = read_file_with_limit(&args.wasm, MAX_WASM_BYTES)?;
    let engine = WasmEngine::new()?;
    let context = ModuleContext::new(&config.limits).with_save_dir(saves.clone());
    let module = NativeModule::from_bytes(&engine, &bytes, &config.exports, context)
        .with_context(|| format!("Failed to load native module: {}", args.wasm.display()))?;

    tracing::info!(
        wasm = %args.wasm.display(),
        bytes = bytes.len(),
        memory = module.memory_size(),
        saves = %saves.root().display(),
        "Native module loaded"
    );
    Ok(Bridge::new(module, config))
}

/// The flows' event loop: one thread, file reads as the only suspension points.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .context("Failed to start async runtime")
}
