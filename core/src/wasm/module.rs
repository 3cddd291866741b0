//! The instantiated native module

use anyhow::{Context, Result};
use hashbrown::HashMap;
use wasmtime::{
    Func, Instance, Linker, Memory, Module, Store, StoreLimits, StoreLimitsBuilder, TypedFunc, Val,
};

use super::WasmEngine;
use super::host::register_host_functions;
use crate::config::{ExportNames, LimitsConfig};
use crate::error::BridgeError;
use crate::foreign::{EntryPoint, ForeignModule, ForeignPtr};
use crate::store::SaveDir;

/// Per-store host data.
pub struct ModuleContext {
    pub(super) limits: LimitsConfig,
    pub(super) saves: Option<SaveDir>,
    /// Set once the instance exists
    pub(super) memory: Option<Memory>,
    store_limits: StoreLimits,
}

impl ModuleContext {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            limits: limits.clone(),
            saves: None,
            memory: None,
            store_limits: StoreLimitsBuilder::new()
                .memory_size(limits.memory_limit)
                .build(),
        }
    }

    /// Give the module a durable store for its saves.
    pub fn with_save_dir(mut self, saves: SaveDir) -> Self {
        self.saves = Some(saves);
        self
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }
}

/// A native module instance with its memory, allocator and entry points
/// resolved.
pub struct NativeModule {
    store: Store<ModuleContext>,
    instance: Instance,
    memory: Memory,
    malloc_fn: TypedFunc<i32, i32>,
    free_fn: TypedFunc<i32, ()>,
    entries: HashMap<EntryPoint, (String, Option<Func>)>,
}

impl NativeModule {
    /// Instantiate `module` and resolve its exports.
    ///
    /// The linker must already satisfy every import. Memory, `malloc` and
    /// `free` are required; entry points that are missing only fail when
    /// called.
    pub fn new(
        engine: &WasmEngine,
        module: &Module,
        linker: &Linker<ModuleContext>,
        exports: &ExportNames,
        context: ModuleContext,
    ) -> Result<Self> {
        WasmEngine::validate_module_memory(module, context.limits())?;
        WasmEngine::validate_module_exports(module, exports)?;

        let mut store = Store::new(engine.engine(), context);
        store.limiter(|ctx| &mut ctx.store_limits);

        let instance = linker
            .instantiate(&mut store, module)
            .context("Failed to instantiate WASM module")?;

        let memory = instance
            .get_memory(&mut store, &exports.memory)
            .with_context(|| format!("No memory export '{}'", exports.memory))?;
        store.data_mut().memory = Some(memory);
        let malloc_fn = instance
            .get_typed_func::<i32, i32>(&mut store, &exports.malloc)
            .with_context(|| format!("'{}' must have type (i32) -> i32", exports.malloc))?;
        let free_fn = instance
            .get_typed_func::<i32, ()>(&mut store, &exports.free)
            .with_context(|| format!("'{}' must have type (i32) -> ()", exports.free))?;

        let mut entries = HashMap::new();
        for entry in EntryPoint::ALL {
            let name = exports.entry(entry).to_string();
            let func = instance.get_func(&mut store, &name);
            if func.is_none() {
                tracing::debug!(export = %name, role = %entry, "Entry point not exported");
            }
            entries.insert(entry, (name, func));
        }

        Ok(Self {
            store,
            instance,
            memory,
            malloc_fn,
            free_fn,
            entries,
        })
    }

    /// Compile, link and initialize a module from raw `.wasm` bytes.
    ///
    /// The save store imports are linked to the context's [`SaveDir`]. Any
    /// other import is linked as a trap and fails when called.
    pub fn from_bytes(
        engine: &WasmEngine,
        bytes: &[u8],
        exports: &ExportNames,
        context: ModuleContext,
    ) -> Result<Self> {
        let module = engine.load_module(bytes)?;
        let mut linker = Linker::new(engine.engine());
        register_host_functions(&mut linker).context("Failed to register host functions")?;
        linker
            .define_unknown_imports_as_traps(&module)
            .context("Failed to link module imports")?;

        let mut native = Self::new(engine, &module, &linker, exports, context)?;
        native.initialize()?;
        tracing::debug!(
            memory = native.memory_size(),
            store = ?native.save_dir().map(SaveDir::root),
            "Native module ready"
        );
        Ok(native)
    }

    /// Run the module's reactor initializer if it exports one.
    pub fn initialize(&mut self) -> Result<()> {
        if let Ok(init) = self
            .instance
            .get_typed_func::<(), ()>(&mut self.store, "_initialize")
        {
            init.call(&mut self.store, ())
                .context("WASM _initialize() failed")?;
        }
        Ok(())
    }

    /// Current size of linear memory in bytes.
    pub fn memory_size(&self) -> usize {
        self.memory.data_size(&self.store)
    }

    /// Where the module's saves are stored, if it has a store.
    pub fn save_dir(&self) -> Option<&SaveDir> {
        self.store.data().saves.as_ref()
    }

    /// Get the underlying instance
    pub fn instance(&self) -> Instance {
        self.instance
    }

    /// Get mutable reference to the store
    pub fn store_mut(&mut self) -> &mut Store<ModuleContext> {
        &mut self.store
    }

    fn check_range(&self, ptr: ForeignPtr, len: u32) -> Result<usize, BridgeError> {
        let start = ptr.addr() as usize;
        let in_bounds = start
            .checked_add(len as usize)
            .is_some_and(|end| end <= self.memory_size());
        if in_bounds {
            Ok(start)
        } else {
            Err(BridgeError::OutOfBounds { ptr, len })
        }
    }
}

fn foreign_call(name: &str, source: anyhow::Error) -> BridgeError {
    BridgeError::ForeignCall {
        name: name.to_string(),
        source,
    }
}

impl ForeignModule for NativeModule {
    fn malloc(&mut self, len: u32) -> Result<ForeignPtr, BridgeError> {
        let ptr = self
            .malloc_fn
            .call(&mut self.store, len as i32)
            .map_err(|e| foreign_call("malloc", e))?;
        Ok(ForeignPtr::new(ptr as u32))
    }

    fn free(&mut self, ptr: ForeignPtr) -> Result<(), BridgeError> {
        self.free_fn
            .call(&mut self.store, ptr.addr() as i32)
            .map_err(|e| foreign_call("free", e))
    }

    fn write_bytes(&mut self, ptr: ForeignPtr, bytes: &[u8]) -> Result<(), BridgeError> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| BridgeError::PayloadTooLarge { len: bytes.len() })?;
        let offset = self.check_range(ptr, len)?;
        self.memory
            .write(&mut self.store, offset, bytes)
            .map_err(|_| BridgeError::OutOfBounds { ptr, len })
    }

    fn read_bytes(&self, ptr: ForeignPtr, len: u32) -> Result<Vec<u8>, BridgeError> {
        let offset = self.check_range(ptr, len)?;
        let mut buffer = vec![0u8; len as usize];
        self.memory
            .read(&self.store, offset, &mut buffer)
            .map_err(|_| BridgeError::OutOfBounds { ptr, len })?;
        Ok(buffer)
    }

    fn invoke(&mut self, entry: EntryPoint, args: &[u32]) -> Result<Option<u32>, BridgeError> {
        let (name, func) = match self.entries.get(&entry) {
            Some((name, Some(func))) => (name.as_str(), *func),
            Some((name, None)) => return Err(BridgeError::MissingExport(name.clone())),
            None => return Err(BridgeError::MissingExport(entry.role().to_string())),
        };

        let params: Vec<Val> = args.iter().map(|&arg| Val::I32(arg as i32)).collect();
        let mut results = vec![Val::I32(0); func.ty(&self.store).results().len()];

        func.call(&mut self.store, &params, &mut results)
            .map_err(|e| foreign_call(name, e))?;

        match results.first() {
            None => Ok(None),
            Some(Val::I32(value)) => Ok(Some(*value as u32)),
            Some(_) => Err(foreign_call(
                name,
                anyhow::anyhow!("entry point returned a non-i32 result"),
            )),
        }
    }
}
