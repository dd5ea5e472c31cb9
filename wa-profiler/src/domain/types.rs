//! Domain types providing compile-time safety and self-documentation
//!
//! The host and the observer are both plain OS processes; these newtypes keep
//! "the process running the guest" apart from "the process watching it".

use std::fmt;

/// Process ID of a spawned observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

impl From<Pid> for libc::pid_t {
    #[allow(clippy::cast_possible_wrap)]
    fn from(pid: Pid) -> Self {
        pid.0 as libc::pid_t
    }
}

/// Process ID of the host (the process executing the guest module)
///
/// Captured once at startup and passed explicitly into the session. Its
/// `Display` form is the bare decimal id, which is what gets substituted into
/// the observer's command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostId(pub u32);

impl HostId {
    /// The id of the current process
    #[must_use]
    pub fn current() -> Self {
        Self(std::process::id())
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of the exported function the guest starts from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryName(String);

impl EntryName {
    /// Export name used by WASI command modules
    pub const DEFAULT: &'static str = "_start";

    /// Create a new entry name (panics if empty)
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "Entry point name cannot be empty");
        Self(name)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntryName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
