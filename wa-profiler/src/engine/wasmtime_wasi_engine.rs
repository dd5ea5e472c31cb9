//! Wasmtime backend with WASI preview1
//!
//! The guest inherits the host's stdio and environment, and sees the module
//! path as its `argv[0]`, so ordinary WASI command modules run unchanged.

use wasmtime::{Engine, Func, Instance, Linker, Store};
use wasmtime_wasi::p1::{self, WasiP1Ctx};
use wasmtime_wasi::WasiCtxBuilder;

use super::wasmtime_engine::{call_entry, compile, resolve_func, validate};
use super::{EngineAdapter, EngineKind, ResolvedEntry};
use crate::domain::{EngineError, EntryPointError, TrapError};

/// Wasmtime with a WASI-wired linker
pub struct WasmtimeWasi {
    engine: Engine,
    linker: Linker<WasiP1Ctx>,
    store: Store<WasiP1Ctx>,
}

impl WasmtimeWasi {
    /// Set up the engine and WASI context
    ///
    /// # Errors
    /// Returns [`EngineError::Linking`] if the WASI functions can't be defined.
    pub fn new(program_name: &str) -> Result<Self, EngineError> {
        let engine = Engine::default();

        let mut linker = Linker::new(&engine);
        p1::add_to_linker_sync(&mut linker, |cx| cx)
            .map_err(|e| EngineError::Linking(format!("failed to link wasi: {e:#}")))?;

        let wasi = WasiCtxBuilder::new()
            .inherit_stdio()
            .inherit_env()
            .args(&[program_name])
            .build_p1();
        let store = Store::new(&engine, wasi);

        Ok(Self { engine, linker, store })
    }
}

impl EngineAdapter for WasmtimeWasi {
    type Instance = Instance;
    type Entry = ResolvedEntry<Func>;

    fn kind(&self) -> EngineKind {
        EngineKind::WasmtimeWasi
    }

    fn validate(&mut self, wasm: &[u8]) -> Result<(), EngineError> {
        validate(&self.engine, wasm)
    }

    fn instantiate(&mut self, wasm: &[u8]) -> Result<Instance, EngineError> {
        let module = compile(&self.engine, wasm)?;
        self.linker
            .instantiate(&mut self.store, &module)
            .map_err(|e| EngineError::Instantiation(format!("{e:#}")))
    }

    fn resolve_entry_point(
        &mut self,
        instance: &Instance,
        name: &str,
    ) -> Result<Self::Entry, EntryPointError> {
        resolve_func(&mut self.store, instance, name)
    }

    fn invoke(&mut self, entry: &Self::Entry) -> Result<(), TrapError> {
        call_entry(&mut self.store, entry)
    }
}
