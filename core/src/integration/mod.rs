//! Integration tests for the host bridge
//!
//! Drive the flows against real WAT modules instantiated in wasmtime and
//! check what the module observed through its exported counters.

#[cfg(test)]
mod rom_tests;

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::config::{ExportNames, LimitsConfig};
    use crate::store::SaveDir;
    use crate::wasm::{ModuleContext, NativeModule, WasmEngine};

    /// Compile and instantiate a WAT module with the default export names
    pub fn native(wat: &str) -> NativeModule {
        native_with(wat, ModuleContext::new(&LimitsConfig::default()))
    }

    /// Like [`native`], with the module's saves stored in `saves`
    pub fn native_with_store(wat: &str, saves: &SaveDir) -> NativeModule {
        native_with(
            wat,
            ModuleContext::new(&LimitsConfig::default()).with_save_dir(saves.clone()),
        )
    }

    fn native_with(wat: &str, context: ModuleContext) -> NativeModule {
        let engine = WasmEngine::new().unwrap();
        let wasm = wat::parse_str(wat).unwrap();
        NativeModule::from_bytes(&engine, &wasm, &ExportNames::default(), context).unwrap()
    }

    /// Call a `() -> i32` probe export
    pub fn probe(module: &mut NativeModule, name: &str) -> i32 {
        let instance = module.instance();
        let func = instance
            .get_typed_func::<(), i32>(module.store_mut(), name)
            .unwrap();
        func.call(module.store_mut(), ()).unwrap()
    }

    /// Call an `(i32) -> ()` setter export
    pub fn set(module: &mut NativeModule, name: &str, value: i32) {
        let instance = module.instance();
        let func = instance
            .get_typed_func::<i32, ()>(module.store_mut(), name)
            .unwrap();
        func.call(module.store_mut(), value).unwrap();
    }
}
