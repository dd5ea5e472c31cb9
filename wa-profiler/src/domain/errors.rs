//! Structured error types for wa-profiler
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Every engine maps its own failure shapes onto [`EngineError`],
//! [`EntryPointError`] and [`TrapError`], so the session never sees an
//! engine-specific error type.

use std::path::PathBuf;

use super::types::Pid;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("profiler command is empty: expected at least the profiler executable")]
    Empty,

    #[error("placeholder token must not be empty")]
    EmptyPlaceholder,
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to start the profiler `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum TerminateError {
    #[error("failed to signal observer {pid}: {source}")]
    Signal {
        pid: Pid,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for observer {pid}: {source}")]
    Wait {
        pid: Pid,
        #[source]
        source: std::io::Error,
    },
}

/// Engine failures outside entry-point resolution and invocation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("module is not valid WebAssembly: {0}")]
    Validation(String),

    #[error("failed to compile module: {0}")]
    Compilation(String),

    #[error("failed to link module: {0}")]
    Linking(String),

    #[error("failed to instantiate module: {0}")]
    Instantiation(String),

    #[error("engine `{0}` is not compiled into this build (enable the `{0}` feature)")]
    Unavailable(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryPointError {
    #[error("entry point `{name}` not found")]
    NotFound { name: String },

    #[error("entry point `{name}` is a {kind}, not a function")]
    WrongKind { name: String, kind: &'static str },

    #[error(
        "wrong function signature of `{name}`: expected () -> (), \
         found {params} param(s) and {results} result(s)"
    )]
    WrongSignature { name: String, params: usize, results: usize },
}

impl EntryPointError {
    /// Check an already-found function's arity against `() -> ()`
    pub fn check_signature(name: &str, params: usize, results: usize) -> Result<(), Self> {
        if params == 0 && results == 0 {
            Ok(())
        } else {
            Err(Self::WrongSignature { name: name.to_string(), params, results })
        }
    }
}

/// A guest trap, carrying the engine's own diagnostic text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error calling `{entry}`: {message}")]
pub struct TrapError {
    pub entry: String,
    pub message: String,
}

impl TrapError {
    pub fn new(entry: impl Into<String>, message: impl Into<String>) -> Self {
        Self { entry: entry.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Top-level failure of a profiling run
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("failed to load module {}: {source}", path.display())]
    ModuleLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    EntryPoint(#[from] EntryPointError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Trap(#[from] TrapError),
}
