//! Pre-flight checks for wa-profiler
//!
//! Spots profiler setups that are likely to fail before any guest code runs.
//! These checks only warn: launching the profiler is what decides.

#![allow(unsafe_code)] // geteuid() requires unsafe

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::observer::ObserverCommand;

/// Highest `perf_event_paranoid` level that still lets an unprivileged user
/// attach to their own processes
const MAX_UNPRIVILEGED_PARANOID: i32 = 2;

const PERF_EVENT_PARANOID: &str = "/proc/sys/kernel/perf_event_paranoid";

/// Run all pre-flight checks for the profiler command
pub fn run_preflight_checks(command: &ObserverCommand, quiet: bool) {
    if quiet {
        return;
    }
    let program = command.program();
    if find_program(program).is_none() {
        eprintln!("warning: profiler `{program}` not found on PATH");
    }
    if is_perf(program) {
        check_perf_event_paranoid();
    }
}

/// Resolve a program the way `execvp` would
fn find_program(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let path = Path::new(program);
        return path.is_file().then(|| path.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    find_in_path(program, &path_var)
}

fn find_in_path(program: &str, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn is_perf(program: &str) -> bool {
    Path::new(program).file_name().and_then(|n| n.to_str()) == Some("perf")
}

/// Warn when `perf -p` is likely to be refused
fn check_perf_event_paranoid() {
    let Ok(content) = std::fs::read_to_string(PERF_EVENT_PARANOID) else {
        return;
    };
    let Some(level) = parse_paranoid(&content) else {
        return;
    };
    let is_root = unsafe { libc::geteuid() } == 0;
    if paranoid_blocks_attach(level, is_root) {
        eprintln!(
            "warning: {PERF_EVENT_PARANOID} is {level}; perf may not be allowed to attach.\n\
             Lower it with: sudo sysctl kernel.perf_event_paranoid={MAX_UNPRIVILEGED_PARANOID}"
        );
    }
}

fn parse_paranoid(content: &str) -> Option<i32> {
    content.trim().parse().ok()
}

fn paranoid_blocks_attach(level: i32, is_root: bool) -> bool {
    !is_root && level > MAX_UNPRIVILEGED_PARANOID
}
