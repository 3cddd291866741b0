//! WASM runtime wrapper
//!
//! Provides the wasmtime-backed implementation of [`crate::foreign::ForeignModule`].
//!
//! # Key Types
//!
//! - [`WasmEngine`] - Shared WASM engine (one per application)
//! - [`NativeModule`] - The instantiated native module and its exports
//! - [`ModuleContext`] - Per-store limits and the module's save store
//!
//! The module's only host imports are `env.totalgb_save_write` and
//! `env.totalgb_save_read`, backed by a [`crate::store::SaveDir`].

mod host;
mod module;


use anyhow::{Context, Result};
use wasmtime::{Engine, ExternType, Module};

use crate::config::{ExportNames, LimitsConfig};

pub use host::{
    HOST_MODULE, SAVE_BAD_NAME, SAVE_BAD_POINTER, SAVE_IO, SAVE_NO_STORE, SAVE_NOT_FOUND,
    SAVE_OK, SAVE_READ, SAVE_TOO_LARGE, SAVE_WRITE,
};
pub use module::{ModuleContext, NativeModule};

/// Bytes per WASM page
const PAGE_SIZE: u64 = 64 * 1024;

/// Compiles native module builds. One engine can back many modules.
pub struct WasmEngine {
    engine: Engine,
}

impl WasmEngine {
    pub fn new() -> Result<Self> {
        let engine = Engine::new(&wasmtime::Config::new()).context("Failed to create engine")?;
        Ok(Self { engine })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Compile a `.wasm` binary
    pub fn load_module(&self, bytes: &[u8]) -> Result<Module> {
        Module::new(&self.engine, bytes).context("Failed to compile WASM module")
    }

    /// Check every exported memory against the configured memory limit.
    ///
    /// A memory whose initial size already exceeds the limit is rejected here
    /// rather than at instantiation.
    pub fn validate_module_memory(module: &Module, limits: &LimitsConfig) -> Result<()> {
        let limit = limits.memory_limit as u64;
        let memories = module.exports().filter_map(|export| match export.ty() {
            ExternType::Memory(ty) => Some((export.name(), ty)),
            _ => None,
        });

        for (name, ty) in memories {
            let initial = ty.minimum().saturating_mul(PAGE_SIZE);
            anyhow::ensure!(
                initial <= limit,
                "Memory '{}' starts at {} pages ({} bytes), over the {} byte memory_limit",
                name,
                ty.minimum(),
                initial,
                limit
            );

            match ty.maximum() {
                Some(max) if max.saturating_mul(PAGE_SIZE) > limit => {
                    tracing::debug!(
                        memory = name,
                        max_pages = max,
                        limit,
                        "Memory may grow past memory_limit; growth will be refused"
                    );
                }
                None => {
                    tracing::debug!(memory = name, limit, "Memory declares no maximum");
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Validate that the module exports its memory and allocator
    ///
    /// Entry points are resolved lazily and may be missing; memory, `malloc`
    /// and `free` may not.
    pub fn validate_module_exports(module: &Module, exports: &ExportNames) -> Result<()> {
        let has_memory = module
            .get_export(&exports.memory)
            .is_some_and(|ty| matches!(ty, ExternType::Memory(_)));
        anyhow::ensure!(has_memory, "Module does not export memory '{}'", exports.memory);

        for name in [&exports.malloc, &exports.free] {
            let is_func = module
                .get_export(name)
                .is_some_and(|ty| matches!(ty, ExternType::Func(_)));
            anyhow::ensure!(is_func, "Module does not export function '{}'", name);
        }
        Ok(())
    }
}
