//! End-of-window signalling
//!
//! Once the guest's entry point hands control back, the observer is told to
//! stop. Whether that also happens after a trap is a policy choice.

use std::fmt;

use clap::ValueEnum;
use log::{info, warn};
use serde::Serialize;

use super::launcher::{Delivery, ObserverHandle, ObserverProcess};

/// Signal used to stop the observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObserverSignal {
    /// SIGINT, lets `perf` print its summary
    #[default]
    #[value(name = "int")]
    #[serde(rename = "int")]
    Interrupt,
    /// SIGTERM
    #[value(name = "term")]
    #[serde(rename = "term")]
    Terminate,
    /// SIGKILL
    Kill,
}

impl ObserverSignal {
    #[must_use]
    pub fn as_raw(self) -> libc::c_int {
        match self {
            Self::Interrupt => libc::SIGINT,
            Self::Terminate => libc::SIGTERM,
            Self::Kill => libc::SIGKILL,
        }
    }
}

impl fmt::Display for ObserverSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Kill => "SIGKILL",
        };
        f.write_str(name)
    }
}

/// When the observer gets its termination signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationPolicy {
    /// After the entry point returns or traps
    #[default]
    Always,
    /// Only after the entry point returns normally
    OnSuccess,
    /// Never; the observer stops on its own or outlives the host
    Never,
}

/// How the guest's entry-point call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestOutcome {
    Returned,
    Trapped,
}

/// Applies a [`TerminationPolicy`] to an observer handle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Terminator {
    pub policy: TerminationPolicy,
    pub signal: ObserverSignal,
    /// Reap the observer after signalling
    pub wait: bool,
}

impl Terminator {
    #[must_use]
    pub fn should_signal(&self, outcome: GuestOutcome) -> bool {
        match self.policy {
            TerminationPolicy::Always => true,
            TerminationPolicy::OnSuccess => outcome == GuestOutcome::Returned,
            TerminationPolicy::Never => false,
        }
    }

    /// Close the profiling window
    ///
    /// Consumes the handle. Returns the signal that reached the observer, or
    /// `None` if none was sent or the observer had already exited. Signal
    /// delivery problems are logged rather than failing the run: the guest has
    /// already finished by the time this runs.
    pub fn finish<P: ObserverProcess>(
        &self,
        observer: ObserverHandle<P>,
        outcome: GuestOutcome,
    ) -> Option<ObserverSignal> {
        if !self.should_signal(outcome) {
            let pid = observer.detach();
            info!("Observer {pid} left running ({:?} policy)", self.policy);
            return None;
        }

        let pid = observer.pid();
        let signalled = match observer.terminate(self.signal) {
            Ok(signalled) => signalled,
            Err(e) => {
                warn!("{e}");
                return None;
            }
        };
        let sent = match signalled.delivery() {
            Delivery::Delivered => {
                info!("Stopped observer {pid} with {}", self.signal);
                Some(self.signal)
            }
            Delivery::AlreadyExited => {
                info!("Observer {pid} had already exited, no signal sent");
                None
            }
        };

        if self.wait {
            if let Err(e) = signalled.wait() {
                warn!("{e}");
            }
        }
        sent
    }
}
