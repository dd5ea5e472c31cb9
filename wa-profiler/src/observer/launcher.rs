//! Observer process spawning
//!
//! The observer is fire-and-forget: once spawned, the host keeps only a handle
//! that can be signalled once. There is no channel back from the observer.

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus};

use log::{debug, info};

use super::template::ObserverCommand;
use super::terminator::ObserverSignal;
use crate::domain::{HostId, LaunchError, Pid, TerminateError};

/// A running observer process, as seen from the host
///
/// Implemented by [`ChildProcess`] for real processes and by test doubles.
pub trait ObserverProcess {
    fn pid(&self) -> Pid;

    /// Non-blocking check whether the observer has already exited
    ///
    /// # Errors
    /// Returns the underlying OS error if the status can't be queried.
    fn try_exit_status(&mut self) -> io::Result<Option<ExitStatus>>;

    /// Deliver `signal` to the observer
    ///
    /// # Errors
    /// Returns the underlying OS error from `kill(2)`.
    fn send_signal(&mut self, signal: ObserverSignal) -> io::Result<()>;

    /// Block until the observer exits
    ///
    /// # Errors
    /// Returns the underlying OS error from `waitpid(2)`.
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

/// Spawns observers from a templated command line
pub trait Launch {
    type Process: ObserverProcess;

    /// Start the observer for `host`
    ///
    /// # Errors
    /// Returns [`LaunchError::Spawn`] if the profiler could not be started.
    fn launch(
        &mut self,
        command: &ObserverCommand,
        host: HostId,
    ) -> Result<ObserverHandle<Self::Process>, LaunchError>;
}

/// Launcher backed by `std::process::Command`
///
/// `Command::spawn` reports exec failures (e.g. profiler not on `PATH`)
/// synchronously, so a returned handle always refers to the profiler image.
/// The observer inherits the host's stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandLauncher;

impl Launch for CommandLauncher {
    type Process = ChildProcess;

    fn launch(
        &mut self,
        command: &ObserverCommand,
        host: HostId,
    ) -> Result<ObserverHandle<ChildProcess>, LaunchError> {
        let argv = command.render(host);
        debug!("Observer argv: {argv:?}");

        let child = Command::new(&argv[0]).args(&argv[1..]).spawn().map_err(|source| {
            LaunchError::Spawn { program: command.program().to_string(), source }
        })?;

        let process = ChildProcess { child, reaped: None };
        info!("Launched observer `{}` as {}", command.program(), process.pid());
        Ok(ObserverHandle::new(process, argv))
    }
}

/// A real observer child process
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    /// Set once the child has been waited on; its pid may be reused after that
    reaped: Option<ExitStatus>,
}

impl ObserverProcess for ChildProcess {
    fn pid(&self) -> Pid {
        Pid(self.child.id())
    }

    fn try_exit_status(&mut self) -> io::Result<Option<ExitStatus>> {
        if self.reaped.is_none() {
            self.reaped = self.child.try_wait()?;
        }
        Ok(self.reaped)
    }

    fn send_signal(&mut self, signal: ObserverSignal) -> io::Result<()> {
        if self.reaped.is_some() {
            return Err(io::Error::from_raw_os_error(libc::ESRCH));
        }
        let pid: libc::pid_t = self.pid().into();
        // SAFETY: kill(2) takes plain integers and has no memory-safety preconditions.
        // The child is not reaped yet, so `pid` still names it.
        #[allow(unsafe_code)]
        let rc = unsafe { libc::kill(pid, signal.as_raw()) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        match self.reaped {
            Some(status) => Ok(status),
            None => self.child.wait(),
        }
    }
}

/// Exclusive handle to a launched observer
///
/// Consumed by [`ObserverHandle::terminate`] or [`ObserverHandle::detach`], so
/// at most one termination signal can ever be sent through it.
#[derive(Debug)]
pub struct ObserverHandle<P: ObserverProcess> {
    process: P,
    argv: Vec<String>,
}

impl<P: ObserverProcess> ObserverHandle<P> {
    pub fn new(process: P, argv: Vec<String>) -> Self {
        Self { process, argv }
    }

    #[must_use]
    pub fn pid(&self) -> Pid {
        self.process.pid()
    }

    /// The command line the observer was started with
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Exit status if the observer has already exited
    ///
    /// Query failures are treated as "still running".
    pub fn exit_status(&mut self) -> Option<ExitStatus> {
        match self.process.try_exit_status() {
            Ok(status) => status,
            Err(e) => {
                debug!("Could not query observer {}: {e}", self.pid());
                None
            }
        }
    }

    /// Send the end-of-window signal
    ///
    /// An observer that has already gone away (`ESRCH`) is not an error; the
    /// returned [`SignalledObserver::delivery`] tells the two cases apart.
    ///
    /// # Errors
    /// Returns [`TerminateError::Signal`] if `kill(2)` fails for any other reason.
    pub fn terminate(
        mut self,
        signal: ObserverSignal,
    ) -> Result<SignalledObserver<P>, TerminateError> {
        let pid = self.pid();
        let delivery = match self.process.send_signal(signal) {
            Ok(()) => {
                debug!("Sent {signal} to observer {pid}");
                Delivery::Delivered
            }
            Err(e) if e.raw_os_error() == Some(libc::ESRCH) => {
                debug!("Observer {pid} already exited, {signal} not delivered");
                Delivery::AlreadyExited
            }
            Err(source) => return Err(TerminateError::Signal { pid, source }),
        };
        Ok(SignalledObserver { process: self.process, pid, delivery })
    }

    /// Give up the handle without signalling
    ///
    /// The observer keeps running in the background and may outlive the host.
    pub fn detach(self) -> Pid {
        let pid = self.pid();
        debug!("Leaving observer {pid} running");
        pid
    }
}

/// Whether the termination signal reached the observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The observer had exited before the signal was sent
    AlreadyExited,
}

/// An observer that has been through [`ObserverHandle::terminate`]
#[derive(Debug)]
pub struct SignalledObserver<P: ObserverProcess> {
    process: P,
    pid: Pid,
    delivery: Delivery,
}

impl<P: ObserverProcess> SignalledObserver<P> {
    #[must_use]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[must_use]
    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// Reap the observer
    ///
    /// # Errors
    /// Returns [`TerminateError::Wait`] if waiting fails.
    pub fn wait(mut self) -> Result<ExitStatus, TerminateError> {
        let pid = self.pid;
        let status =
            self.process.wait().map_err(|source| TerminateError::Wait { pid, source })?;
        match (status.code(), status.signal()) {
            (Some(code), _) => debug!("Observer {pid} exited with status {code}"),
            (None, Some(sig)) => debug!("Observer {pid} killed by signal {sig}"),
            (None, None) => debug!("Observer {pid} exited"),
        }
        Ok(status)
    }
}
