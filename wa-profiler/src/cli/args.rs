//! CLI argument definitions

use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::EntryName;
use crate::engine::EngineKind;
use crate::observer::{ObserverSignal, TerminationPolicy, Terminator, DEFAULT_PLACEHOLDER};
use crate::session::SessionConfig;

#[derive(Parser, Debug)]
#[command(
    name = "wa-profiler",
    version,
    about = "Run a WebAssembly module's entry point under an external profiler",
    after_help = "\
Options go before MODULE; everything after PROFILER is passed to the profiler.
Any profiler argument exactly equal to PID is replaced with the process id of
wa-profiler itself, which is where the module runs.

EXAMPLES:
    wa-profiler fft.wasm perf stat -p PID
    wa-profiler --engine wasmi --delay-ms 0 fft.wasm perf record -g -p PID
    wa-profiler --terminate never fft.wasm echo PID"
)]
pub struct Args {
    /// Execution engine
    #[arg(short, long, value_enum, default_value_t = EngineKind::WasmtimeWasi)]
    pub engine: EngineKind,

    /// Exported function to call (must take and return nothing)
    #[arg(
        long,
        default_value = EntryName::DEFAULT,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub entry: String,

    /// Milliseconds to wait after launching the profiler before running the guest (0 = none)
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub delay_ms: u64,

    /// When to signal the profiler after the entry point finishes
    #[arg(long, value_enum, default_value_t)]
    pub terminate: TerminationPolicy,

    /// Signal sent to the profiler
    #[arg(long, value_enum, default_value_t)]
    pub signal: ObserverSignal,

    /// Wait for the profiler to exit after signalling it
    #[arg(long)]
    pub wait: bool,

    /// Profiler argument replaced with the host process id
    #[arg(
        long,
        default_value = DEFAULT_PLACEHOLDER,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub placeholder: String,

    /// Write a JSON run report to FILE
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// List execution engines and exit
    #[arg(long, exclusive = true)]
    pub list_engines: bool,

    /// WebAssembly module to run
    #[arg(value_name = "MODULE", required_unless_present = "list_engines")]
    pub module: Option<PathBuf>,

    /// Profiler executable followed by its arguments
    #[arg(
        value_name = "PROFILER",
        required_unless_present = "list_engines",
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub profiler: Vec<String>,
}

impl Args {
    #[must_use]
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            entry: EntryName::new(self.entry.clone()),
            terminator: Terminator { policy: self.terminate, signal: self.signal, wait: self.wait },
        }
    }
}
