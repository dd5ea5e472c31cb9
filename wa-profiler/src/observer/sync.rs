//! Start-of-window synchronization
//!
//! No engine says "guest code starts now", and the observer never reports back
//! that it has attached. The only lever is to hold the guest back for a while
//! after the observer is spawned.

use std::time::Duration;

use log::debug;

use crate::domain::Pid;

/// Delay used when none is configured, long enough for `perf` to attach
pub const DEFAULT_START_DELAY: Duration = Duration::from_millis(100);

/// Strategy run between observer launch and guest invocation
pub trait StartSync {
    /// Block until the observer is assumed to be watching the host
    fn wait_for_observer(&mut self, observer: Pid);

    /// Configured delay, for reporting
    fn delay(&self) -> Duration;
}

/// Sleep for a fixed duration; zero skips the wait entirely
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
    fn default() -> Self {
        Self(DEFAULT_START_DELAY)
    }
}

impl StartSync for FixedDelay {
    fn wait_for_observer(&mut self, observer: Pid) {
        if self.0.is_zero() {
            debug!("Not waiting for observer {observer}");
            return;
        }
        debug!("Giving observer {observer} {:?} to attach", self.0);
        std::thread::sleep(self.0);
    }

    fn delay(&self) -> Duration {
        self.0
    }
}
