//! The external profiler and its lifecycle
//!
//! - `template`: build the profiler command line, substituting the host pid
//! - `launcher`: spawn the profiler and hold its handle
//! - `sync`: hold the guest back until the profiler is assumed attached
//! - `terminator`: signal the profiler when the guest is done

pub mod launcher;
pub mod sync;
pub mod template;
pub mod terminator;

pub use launcher::{
    ChildProcess, CommandLauncher, Delivery, Launch, ObserverHandle, ObserverProcess,
    SignalledObserver,
};
pub use sync::{FixedDelay, StartSync, DEFAULT_START_DELAY};
pub use template::{ObserverCommand, DEFAULT_PLACEHOLDER};
pub use terminator::{GuestOutcome, ObserverSignal, TerminationPolicy, Terminator};
