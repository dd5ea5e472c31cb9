//! # WebAssembly Execution Engines
//!
//! Each engine parses, validates, instantiates and runs guest modules in its own
//! way. This module hides those differences behind [`EngineAdapter`] so the
//! profiling session drives every engine through the same five steps.
//!
//! ## Adapters
//!
//! | Kind            | Crate                      | Imports provided           |
//! |-----------------|----------------------------|----------------------------|
//! | `wasmtime-wasi` | `wasmtime`, `wasmtime-wasi`| WASI preview1              |
//! | `wasmtime`      | `wasmtime`                 | none                       |
//! | `wasmi`         | `wasmi` (feature)          | none                       |
//! | `wasmer`        | `wasmer` (feature)         | none                       |
//!
//! ## Entry Point Contract
//!
//! The guest must export a function (by default `_start`) with signature
//! `() -> ()`. Resolution distinguishes a missing export, an export that is not
//! a function, and a function with the wrong arity; see [`EntryPointError`].

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::domain::{EngineError, EntryPointError, TrapError};

mod wasmtime_engine;
mod wasmtime_wasi_engine;

#[cfg(feature = "wasmi")]
mod wasmi_engine;

#[cfg(feature = "wasmer")]
mod wasmer_engine;

pub use wasmtime_engine::Wasmtime;
pub use wasmtime_wasi_engine::WasmtimeWasi;

#[cfg(feature = "wasmi")]
pub use wasmi_engine::Wasmi;

#[cfg(feature = "wasmer")]
pub use wasmer_engine::Wasmer;

/// Capability set every execution engine provides
///
/// Calls happen in order: `validate`, `instantiate`, `resolve_entry_point`,
/// then at most one `invoke`. Engine resources (store, instance) are owned by
/// the adapter and released when it is dropped.
pub trait EngineAdapter {
    type Instance;
    type Entry;

    fn kind(&self) -> EngineKind;

    /// Check that `wasm` is a well-formed module
    ///
    /// # Errors
    /// Returns [`EngineError::Validation`] for malformed modules.
    fn validate(&mut self, wasm: &[u8]) -> Result<(), EngineError>;

    /// Compile, link and instantiate the module
    ///
    /// # Errors
    /// Returns the [`EngineError`] kind matching the failing step.
    fn instantiate(&mut self, wasm: &[u8]) -> Result<Self::Instance, EngineError>;

    /// Find the entry point and check it is a `() -> ()` function
    ///
    /// # Errors
    /// Returns [`EntryPointError`] if the export is missing, not a function, or
    /// has parameters or results.
    fn resolve_entry_point(
        &mut self,
        instance: &Self::Instance,
        name: &str,
    ) -> Result<Self::Entry, EntryPointError>;

    /// Run the entry point to completion on the calling thread
    ///
    /// # Errors
    /// Returns [`TrapError`] with the engine's diagnostic if the guest traps.
    fn invoke(&mut self, entry: &Self::Entry) -> Result<(), TrapError>;
}

/// A resolved entry point: the engine's function handle plus its export name
#[derive(Debug, Clone)]
pub struct ResolvedEntry<F> {
    pub name: String,
    pub func: F,
}

/// Selectable execution engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// Wasmtime with WASI preview1 wired in
    WasmtimeWasi,
    /// Wasmtime without any imports
    Wasmtime,
    /// The wasmi interpreter
    Wasmi,
    /// Wasmer with its default compiler
    Wasmer,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] =
        [Self::WasmtimeWasi, Self::Wasmtime, Self::Wasmi, Self::Wasmer];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WasmtimeWasi => "wasmtime-wasi",
            Self::Wasmtime => "wasmtime",
            Self::Wasmi => "wasmi",
            Self::Wasmer => "wasmer",
        }
    }

    /// Whether this engine was compiled into the binary
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Self::WasmtimeWasi | Self::Wasmtime => true,
            Self::Wasmi => cfg!(feature = "wasmi"),
            Self::Wasmer => cfg!(feature = "wasmer"),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
pub(crate) mod test_modules {
    //! Guest modules shared by the adapter tests

    pub(crate) const NOOP: &str = r#"(module (func (export "_start")))"#;

    pub(crate) const MISSING_ENTRY: &str = r#"(module (func (export "main")))"#;

    pub(crate) const MEMORY_ENTRY: &str = r#"(module (memory (export "_start") 1))"#;

    pub(crate) const PARAM_ENTRY: &str = r#"(module (func (export "_start") (param i32)))"#;

    pub(crate) const RESULT_ENTRY: &str =
        r#"(module (func (export "_start") (result i32) i32.const 0))"#;

    pub(crate) const TRAPPING: &str = r#"(module (func (export "_start") unreachable))"#;

    pub(crate) const CUSTOM_ENTRY: &str = r#"(module (func (export "bench")))"#;

    /// Valid header, garbage body
    pub(crate) const INVALID: &[u8] = b"\0asm\x01\0\0\0\xff\xff\xff";

    pub(crate) fn wasm(text: &str) -> Vec<u8> {
        wat::parse_str(text).expect("test module should assemble")
    }
}
