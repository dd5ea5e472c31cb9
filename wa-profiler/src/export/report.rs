use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::errors::ExportError;
use crate::engine::EngineKind;
use crate::observer::{ObserverSignal, TerminationPolicy};

/// Summary of one profiling window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub engine: EngineKind,
    pub module: PathBuf,
    pub entry: String,
    pub host_pid: u32,
    pub observer_pid: u32,
    /// Observer command line after placeholder substitution
    pub observer_argv: Vec<String>,
    pub start_delay_ms: u64,
    /// Wall-clock time spent inside the entry-point call
    pub guest_micros: u64,
    pub termination: TerminationPolicy,
    /// Signal sent to the observer, `None` if it was left running
    pub signal: Option<ObserverSignal>,
}

impl RunReport {
    /// Write the report as pretty-printed JSON
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails.
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
