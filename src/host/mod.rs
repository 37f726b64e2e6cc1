pub mod exports;

pub use exports::*;

use crate::config::{HostConfig, Invocation};
use crate::contract;
use crate::error::{Result, Stage, StageContext as _};
use log::debug;
use std::{fs, path::Path};
use wasmtime::{Config, Engine, Instance, Module, Store};

/// A contract runtime module instantiated in wasmtime.
pub struct Host {
    store: Store<()>,
    instance: Instance,
    exports: Exports,
}

impl Host {
    pub fn from_file(path: impl AsRef<Path>, config: &HostConfig) -> Result<Self> {
        let path = path.as_ref();
        let wasm = fs::read(path)
            .stage_with(Stage::Load, || format!("cannot read runtime {}", path.display()))?;
        debug!("read {} bytes from {}", wasm.len(), path.display());
        Self::from_bytes(wasm, config)
    }

    pub fn from_bytes<T: AsRef<[u8]>>(wasm: T, config: &HostConfig) -> Result<Self> {
        let mut engine_config = Config::new();
        engine_config
            .consume_fuel(config.fuel.is_some())
            .max_wasm_stack(config.max_wasm_stack);
        let engine = Engine::new(&engine_config).stage(Stage::Load)?;
        let module = Module::new(&engine, wasm.as_ref())
            .stage_with(Stage::Load, || "cannot compile runtime module")?;

        let mut store = Store::new(&engine, ());
        if let Some(fuel) = config.fuel {
            store.set_fuel(fuel).stage(Stage::Instantiate)?;
        }

        // the runtime is self-contained, it imports nothing
        let instance = Instance::new(&mut store, &module, &[])
            .stage_with(Stage::Instantiate, || "cannot instantiate runtime module")?;
        let exports = Exports::resolve(&mut store, &instance)?;

        Ok(Self {
            store,
            instance,
            exports,
        })
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn exports(&self) -> &Exports {
        &self.exports
    }

    pub fn store_mut(&mut self) -> &mut Store<()> {
        &mut self.store
    }

    /// Borrows the store mutably alongside the export handles.
    pub fn split_mut(&mut self) -> (&mut Store<()>, &Exports) {
        (&mut self.store, &self.exports)
    }

    /// Fuel left in the store, if metering is enabled.
    pub fn remaining_fuel(&self) -> Option<u64> {
        self.store.get_fuel().ok()
    }

    pub fn invoke(&mut self, invocation: &Invocation) -> Result<Vec<u8>> {
        contract::invoke_contract(&mut self.store, &self.exports, invocation)
    }

    #[cfg(test)]
    pub(crate) fn global_i32(&mut self, name: &str) -> anyhow::Result<i32> {
        use anyhow::Context as _;
        let global = self
            .instance
            .get_global(&mut self.store, name)
            .with_context(|| format!("not found global: {name}"))?;
        global
            .get(&mut self.store)
            .i32()
            .with_context(|| format!("global {name} is not an i32"))
    }
}

/// A runtime shaped like a wasm-bindgen build of the contract runtime.
#[cfg(test)]
pub(crate) fn fixture() -> anyhow::Result<Host> {
    let wasm = wat::parse_str(include_str!("../fixtures/runtime.wat"))?;
    Ok(Host::from_bytes(wasm, &HostConfig::default())?)
}
