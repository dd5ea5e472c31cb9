//! Wasmtime backend without imports
//!
//! The module is instantiated with an empty import list, so anything that
//! imports host functions (including WASI) fails at instantiation. Export
//! lookup and the call path are shared with the WASI adapter.

use wasmtime::{Engine, Extern, Func, Instance, Module, Store};
use wasmtime_wasi::I32Exit;

use super::{EngineAdapter, EngineKind, ResolvedEntry};
use crate::domain::{EngineError, EntryPointError, TrapError};

/// Wasmtime with an empty linker
pub struct Wasmtime {
    engine: Engine,
    store: Store<()>,
}

impl Wasmtime {
    #[must_use]
    pub fn new() -> Self {
        let engine = Engine::default();
        let store = Store::new(&engine, ());
        Self { engine, store }
    }
}

impl Default for Wasmtime {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineAdapter for Wasmtime {
    type Instance = Instance;
    type Entry = ResolvedEntry<Func>;

    fn kind(&self) -> EngineKind {
        EngineKind::Wasmtime
    }

    fn validate(&mut self, wasm: &[u8]) -> Result<(), EngineError> {
        validate(&self.engine, wasm)
    }

    fn instantiate(&mut self, wasm: &[u8]) -> Result<Instance, EngineError> {
        let module = compile(&self.engine, wasm)?;
        Instance::new(&mut self.store, &module, &[])
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

pub(super) fn validate(engine: &Engine, wasm: &[u8]) -> Result<(), EngineError> {
    Module::validate(engine, wasm).map_err(|e| EngineError::Validation(format!("{e:#}")))
}

pub(super) fn compile(engine: &Engine, wasm: &[u8]) -> Result<Module, EngineError> {
    Module::new(engine, wasm).map_err(|e| EngineError::Compilation(format!("{e:#}")))
}

pub(super) fn resolve_func<T>(
    store: &mut Store<T>,
    instance: &Instance,
    name: &str,
) -> Result<ResolvedEntry<Func>, EntryPointError> {
    let export = instance
        .get_export(&mut *store, name)
        .ok_or_else(|| EntryPointError::NotFound { name: name.to_string() })?;

    let func = match export {
        Extern::Func(func) => func,
        Extern::Global(_) => return Err(wrong_kind(name, "global")),
        Extern::Table(_) => return Err(wrong_kind(name, "table")),
        Extern::Memory(_) => return Err(wrong_kind(name, "memory")),
        _ => return Err(wrong_kind(name, "non-function export")),
    };

    let ty = func.ty(&*store);
    EntryPointError::check_signature(name, ty.params().len(), ty.results().len())?;
    Ok(ResolvedEntry { name: name.to_string(), func })
}

/// Call a `() -> ()` function
///
/// A WASI `proc_exit(0)` unwinds out of the call as an error but is a normal
/// end of a command module.
pub(super) fn call_entry<T>(
    store: &mut Store<T>,
    entry: &ResolvedEntry<Func>,
) -> Result<(), TrapError> {
    match entry.func.call(&mut *store, &[], &mut []) {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<I32Exit>() {
            Some(I32Exit(0)) => Ok(()),
            Some(I32Exit(code)) => {
                Err(TrapError::new(&entry.name, format!("guest exited with status {code}")))
            }
            None => Err(TrapError::new(&entry.name, format!("{err:#}"))),
        },
    }
}

fn wrong_kind(name: &str, kind: &'static str) -> EntryPointError {
    EntryPointError::WrongKind { name: name.to_string(), kind }
}
