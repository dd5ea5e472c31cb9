//! Wasmer backend
//!
//! Built only with the `wasmer` feature. Uses the store's default compiler and
//! an empty import object.

use wasmer::{imports, Extern, Function, Instance, Module, Store};

use super::{EngineAdapter, EngineKind, ResolvedEntry};
use crate::domain::{EngineError, EntryPointError, TrapError};

pub struct Wasmer {
    store: Store,
}

impl Wasmer {
    #[must_use]
    pub fn new() -> Self {
        Self { store: Store::default() }
    }
}

impl Default for Wasmer {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineAdapter for Wasmer {
    type Instance = Instance;
    type Entry = ResolvedEntry<Function>;

    fn kind(&self) -> EngineKind {
        EngineKind::Wasmer
    }

    fn validate(&mut self, wasm: &[u8]) -> Result<(), EngineError> {
        Module::validate(&self.store, wasm).map_err(|e| EngineError::Validation(e.to_string()))
    }

    fn instantiate(&mut self, wasm: &[u8]) -> Result<Instance, EngineError> {
        let module = Module::new(&self.store, wasm)
            .map_err(|e| EngineError::Compilation(e.to_string()))?;
        Instance::new(&mut self.store, &module, &imports! {})
            .map_err(|e| EngineError::Instantiation(e.to_string()))
    }

    fn resolve_entry_point(
        &mut self,
        instance: &Instance,
        name: &str,
    ) -> Result<Self::Entry, EntryPointError> {
        let export = instance
            .exports
            .get_extern(name)
            .ok_or_else(|| EntryPointError::NotFound { name: name.to_string() })?;

        let kind = match export {
            Extern::Function(func) => {
                let ty = func.ty(&self.store);
                EntryPointError::check_signature(name, ty.params().len(), ty.results().len())?;
                return Ok(ResolvedEntry { name: name.to_string(), func: func.clone() });
            }
            Extern::Global(_) => "global",
            Extern::Table(_) => "table",
            Extern::Memory(_) => "memory",
            #[allow(unreachable_patterns)]
            _ => "non-function export",
        };
        Err(EntryPointError::WrongKind { name: name.to_string(), kind })
    }

    fn invoke(&mut self, entry: &Self::Entry) -> Result<(), TrapError> {
        entry
            .func
            .call(&mut self.store, &[])
            .map(|_| ())
            .map_err(|e| TrapError::new(&entry.name, e.message()))
    }
}
