//! # wa-profiler - Run WebAssembly Guests Under an External Profiler
//!
//! wa-profiler loads a WebAssembly module, launches a profiler pointed at its
//! own process id, and calls the module's entry point while the profiler
//! watches. When the call returns (or traps) the profiler is signalled so it
//! can write its results and exit.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    wa-profiler (host process)                   │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │    Module    │──▶│    Engine    │──▶│    Entry     │         │
//! │  │   (bytes)    │   │  (adapter)   │   │  `() -> ()`  │         │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘         │
//! │                                               │ invoke          │
//! │  ┌──────────────┐   ┌──────────────┐          │                 │
//! │  │   Template   │──▶│   Launcher   │── sync ──┘                 │
//! │  │ (PID → pid)  │   │   (spawn)    │                            │
//! │  └──────────────┘   └──────┬───────┘                            │
//! │                            │ handle                             │
//! │                            ▼                                    │
//! │                     ┌──────────────┐   ┌──────────────┐         │
//! │                     │  Terminator  │   │    Export    │         │
//! │                     │   (signal)   │   │ (report.json)│         │
//! │                     └──────┬───────┘   └──────────────┘         │
//! └────────────────────────────┼────────────────────────────────────┘
//!                              │ SIGINT
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Profiler (perf stat -p <host pid>, ...)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`session`]: runs one module through one engine inside the profiler's window
//! - [`engine`]: the [`engine::EngineAdapter`] trait and its four implementations
//!   - `wasmtime-wasi`: wasmtime with WASI preview1 imports
//!   - `wasmtime`, `wasmi`, `wasmer`: no imports
//! - [`observer`]: profiler command template, launch, start delay and termination
//! - [`module`]: reading the guest module from disk
//! - [`export`]: JSON report of a finished run
//! - [`preflight`]: warnings about profiler setups that are likely to fail
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: core types (`Pid`, `HostId`, `EntryName`) and errors
//!
//! ## Guarantees
//!
//! - The profiler is never launched for a module that fails to validate,
//!   instantiate, or export a `() -> ()` entry point
//! - The guest never runs if the profiler could not be launched
//! - The profiler is signalled at most once

pub mod cli;
pub mod domain;
pub mod engine;
pub mod export;
pub mod module;
pub mod observer;
pub mod preflight;
pub mod session;
