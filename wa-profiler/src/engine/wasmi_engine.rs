//! wasmi interpreter backend
//!
//! An interpreter has no compile step worth profiling, so samples taken while
//! the guest runs land in the interpreter loop rather than in JIT code.

use wasmi::{Engine, Extern, Func, Instance, Linker, Module, Store};

use super::{EngineAdapter, EngineKind, ResolvedEntry};
use crate::domain::{EngineError, EntryPointError, TrapError};

pub struct Wasmi {
    engine: Engine,
    linker: Linker<()>,
    store: Store<()>,
}

impl Wasmi {
    #[must_use]
    pub fn new() -> Self {
        let engine = Engine::default();
        let linker = Linker::new(&engine);
        let store = Store::new(&engine, ());
        Self { engine, linker, store }
    }
}

impl Default for Wasmi {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineAdapter for Wasmi {
    type Instance = Instance;
    type Entry = ResolvedEntry<Func>;

    fn kind(&self) -> EngineKind {
        EngineKind::Wasmi
    }

    fn validate(&mut self, wasm: &[u8]) -> Result<(), EngineError> {
        Module::validate(&self.engine, wasm).map_err(|e| EngineError::Validation(e.to_string()))
    }

    fn instantiate(&mut self, wasm: &[u8]) -> Result<Instance, EngineError> {
        let module = Module::new(&self.engine, wasm)
            .map_err(|e| EngineError::Compilation(e.to_string()))?;
        let pre = self
            .linker
            .instantiate(&mut self.store, &module)
            .map_err(|e| EngineError::Linking(e.to_string()))?;
        pre.start(&mut self.store).map_err(|e| EngineError::Instantiation(e.to_string()))
    }

    fn resolve_entry_point(
        &mut self,
        instance: &Instance,
        name: &str,
    ) -> Result<Self::Entry, EntryPointError> {
        let export = instance
            .get_export(&self.store, name)
            .ok_or_else(|| EntryPointError::NotFound { name: name.to_string() })?;

        let kind = match export {
            Extern::Func(func) => {
                let ty = func.ty(&self.store);
                EntryPointError::check_signature(name, ty.params().len(), ty.results().len())?;
                return Ok(ResolvedEntry { name: name.to_string(), func });
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
            .call(&mut self.store, &[], &mut [])
            .map_err(|e| TrapError::new(&entry.name, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_modules::{self, wasm};

    fn instantiate(text: &str) -> (Wasmi, Instance) {
        let mut engine = Wasmi::new();
        let bytes = wasm(text);
        engine.validate(&bytes).unwrap();
        let instance = engine.instantiate(&bytes).unwrap();
        (engine, instance)
    }

    #[test]
    fn test_runs_noop_entry() {
        let (mut engine, instance) = instantiate(test_modules::NOOP);
        let entry = engine.resolve_entry_point(&instance, "_start").unwrap();
        assert!(engine.invoke(&entry).is_ok());
    }

    #[test]
    fn test_resolution_errors() {
        let (mut engine, instance) = instantiate(test_modules::MISSING_ENTRY);
        assert!(matches!(
            engine.resolve_entry_point(&instance, "_start"),
            Err(EntryPointError::NotFound { .. })
        ));

        let (mut engine, instance) = instantiate(test_modules::MEMORY_ENTRY);
        assert!(matches!(
            engine.resolve_entry_point(&instance, "_start"),
            Err(EntryPointError::WrongKind { kind: "memory", .. })
        ));

        let (mut engine, instance) = instantiate(test_modules::PARAM_ENTRY);
        assert!(matches!(
            engine.resolve_entry_point(&instance, "_start"),
            Err(EntryPointError::WrongSignature { params: 1, .. })
        ));
    }

    #[test]
    fn test_trap_is_reported() {
        let (mut engine, instance) = instantiate(test_modules::TRAPPING);
        let entry = engine.resolve_entry_point(&instance, "_start").unwrap();
        let err = engine.invoke(&entry).unwrap_err();
        assert_eq!(err.entry, "_start");
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_invalid_module_fails_validation() {
        let err = Wasmi::new().validate(test_modules::INVALID).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_imports_fail_linking() {
        let text = r#"(module (import "env" "missing" (func)) (func (export "_start")))"#;
        let err = Wasmi::new().instantiate(&wasm(text)).unwrap_err();
        assert!(matches!(err, EngineError::Linking(_)));
    }
}
