//! # Profiling Session
//!
//! Drives one guest module through one engine while one observer watches.
//!
//! ```text
//!  validate ─▶ instantiate ─▶ resolve entry      (input errors: no observer yet)
//!                                  │
//!                                  ▼
//!                           launch observer       (spawn error: guest never runs)
//!                                  │
//!                                  ▼
//!                          start synchronizer     (best effort, no handshake)
//!                                  │
//!                                  ▼
//!                            invoke entry         (blocks until return or trap)
//!                                  │
//!                                  ▼
//!                             terminator          (policy decides on a signal)
//! ```
//!
//! Everything before the launch can fail without side effects. Once the
//! observer exists, the terminator always gets the handle, even if the guest
//! traps; what it does with it is up to the [`TerminationPolicy`].
//!
//! [`TerminationPolicy`]: crate::observer::TerminationPolicy

use std::time::Instant;

use log::{info, warn};

use crate::domain::{EngineError, EntryName, HostId, ProfileError};
use crate::engine::{EngineAdapter, EngineKind, Wasmtime, WasmtimeWasi};
use crate::export::RunReport;
use crate::module::GuestModule;
use crate::observer::{GuestOutcome, Launch, ObserverCommand, StartSync, Terminator};

/// Resolved run options
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub entry: EntryName,
    pub terminator: Terminator,
}

/// One profiling run
pub struct ProfileSession<L, S> {
    launcher: L,
    sync: S,
    command: ObserverCommand,
    host: HostId,
    config: SessionConfig,
}

impl<L: Launch, S: StartSync> ProfileSession<L, S> {
    pub fn new(
        launcher: L,
        sync: S,
        command: ObserverCommand,
        host: HostId,
        config: SessionConfig,
    ) -> Self {
        Self { launcher, sync, command, host, config }
    }

    /// Build the adapter for `kind` and run the module through it
    ///
    /// # Errors
    /// Returns [`EngineError::Unavailable`] for engines not compiled in, and
    /// otherwise whatever [`ProfileSession::run`] returns.
    pub fn run_engine(
        &mut self,
        kind: EngineKind,
        module: &GuestModule,
    ) -> Result<RunReport, ProfileError> {
        info!("Using engine {kind}");
        match kind {
            EngineKind::WasmtimeWasi => {
                let mut engine = WasmtimeWasi::new(&module.program_name())?;
                self.run(&mut engine, module)
            }
            EngineKind::Wasmtime => self.run(&mut Wasmtime::new(), module),
            #[cfg(feature = "wasmi")]
            EngineKind::Wasmi => self.run(&mut crate::engine::Wasmi::new(), module),
            #[cfg(feature = "wasmer")]
            EngineKind::Wasmer => self.run(&mut crate::engine::Wasmer::new(), module),
            #[allow(unreachable_patterns)]
            other => Err(EngineError::Unavailable(other.as_str()).into()),
        }
    }

    /// Run the guest's entry point inside the observer's window
    ///
    /// # Errors
    /// - Engine and entry-point errors, before any observer is launched
    /// - [`ProfileError::Launch`] if the observer can't be spawned
    /// - [`ProfileError::Trap`] if the guest traps (after the terminator ran)
    pub fn run<E: EngineAdapter>(
        &mut self,
        engine: &mut E,
        module: &GuestModule,
    ) -> Result<RunReport, ProfileError> {
        let wasm = module.bytes();
        let entry_name = self.config.entry.as_str();

        engine.validate(wasm)?;
        let instance = engine.instantiate(wasm)?;
        let entry = engine.resolve_entry_point(&instance, entry_name)?;

        let mut observer = self.launcher.launch(&self.command, self.host)?;
        let observer_pid = observer.pid();
        let observer_argv = observer.argv().to_vec();

        self.sync.wait_for_observer(observer_pid);
        if let Some(status) = observer.exit_status() {
            warn!("Observer {observer_pid} exited before the guest started ({status})");
        }

        info!("Calling `{entry_name}`");
        let started = Instant::now();
        let result = engine.invoke(&entry);
        let elapsed = started.elapsed();

        let outcome = if result.is_ok() { GuestOutcome::Returned } else { GuestOutcome::Trapped };
        info!("`{entry_name}` {outcome:?} after {elapsed:?}");
        let signal = self.config.terminator.finish(observer, outcome);
        result?;

        Ok(RunReport {
            engine: engine.kind(),
            module: module.path().to_path_buf(),
            entry: entry_name.to_string(),
            host_pid: self.host.0,
            observer_pid: observer_pid.0,
            observer_argv,
            start_delay_ms: u64::try_from(self.sync.delay().as_millis()).unwrap_or(u64::MAX),
            guest_micros: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            termination: self.config.terminator.policy,
            signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryPointError, LaunchError, Pid, TrapError};
    use crate::observer::{
        ObserverHandle, ObserverProcess, ObserverSignal, TerminationPolicy, DEFAULT_PLACEHOLDER,
    };
    use std::cell::RefCell;
    use std::io;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Validate,
        Instantiate,
        Resolve,
        Launch(Vec<String>),
        Sync(Pid),
        Invoke,
        Signal(ObserverSignal),
        Wait,
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    #[derive(Clone, Copy)]
    enum Behaviour {
        Ok,
        Missing,
        WrongSignature,
        Trap,
    }

    struct MockEngine {
        log: Log,
        behaviour: Behaviour,
    }

    impl EngineAdapter for MockEngine {
        type Instance = ();
        type Entry = String;

        fn kind(&self) -> EngineKind {
            EngineKind::Wasmtime
        }

        fn validate(&mut self, _wasm: &[u8]) -> Result<(), EngineError> {
            self.log.borrow_mut().push(Event::Validate);
            Ok(())
        }

        fn instantiate(&mut self, _wasm: &[u8]) -> Result<(), EngineError> {
            self.log.borrow_mut().push(Event::Instantiate);
            Ok(())
        }

        fn resolve_entry_point(
            &mut self,
            _instance: &(),
            name: &str,
        ) -> Result<String, EntryPointError> {
            self.log.borrow_mut().push(Event::Resolve);
            match self.behaviour {
                Behaviour::Missing => Err(EntryPointError::NotFound { name: name.into() }),
                Behaviour::WrongSignature => Err(EntryPointError::WrongSignature {
                    name: name.into(),
                    params: 1,
                    results: 0,
                }),
                Behaviour::Ok | Behaviour::Trap => Ok(name.to_string()),
            }
        }

        fn invoke(&mut self, entry: &String) -> Result<(), TrapError> {
            self.log.borrow_mut().push(Event::Invoke);
            match self.behaviour {
                Behaviour::Trap => Err(TrapError::new(entry, "unreachable executed")),
                _ => Ok(()),
            }
        }
    }

    struct MockProcess {
        log: Log,
        exited: bool,
    }

    impl ObserverProcess for MockProcess {
        fn pid(&self) -> Pid {
            Pid(777)
        }

        fn try_exit_status(&mut self) -> io::Result<Option<ExitStatus>> {
            Ok(self.exited.then(|| ExitStatus::from_raw(0)))
        }

        fn send_signal(&mut self, signal: ObserverSignal) -> io::Result<()> {
            if self.exited {
                return Err(io::Error::from_raw_os_error(libc::ESRCH));
            }
            self.log.borrow_mut().push(Event::Signal(signal));
            Ok(())
        }

        fn wait(&mut self) -> io::Result<ExitStatus> {
            self.log.borrow_mut().push(Event::Wait);
            Ok(ExitStatus::from_raw(0))
        }
    }

    struct MockLauncher {
        log: Log,
        fail: bool,
        observer_exits_early: bool,
    }

    impl Launch for MockLauncher {
        type Process = MockProcess;

        fn launch(
            &mut self,
            command: &ObserverCommand,
            host: HostId,
        ) -> Result<ObserverHandle<MockProcess>, LaunchError> {
            if self.fail {
                return Err(LaunchError::Spawn {
                    program: command.program().to_string(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                });
            }
            let argv = command.render(host);
            self.log.borrow_mut().push(Event::Launch(argv.clone()));
            let process =
                MockProcess { log: Rc::clone(&self.log), exited: self.observer_exits_early };
            Ok(ObserverHandle::new(process, argv))
        }
    }

    struct MockSync {
        log: Log,
    }

    impl StartSync for MockSync {
        fn wait_for_observer(&mut self, observer: Pid) {
            self.log.borrow_mut().push(Event::Sync(observer));
        }

        fn delay(&self) -> Duration {
            Duration::ZERO
        }
    }

    struct Harness {
        log: Log,
        session: ProfileSession<MockLauncher, MockSync>,
    }

    fn harness(terminator: Terminator, launch_fails: bool) -> Harness {
        let log = Log::default();
        let command = ObserverCommand::new(["perf", "stat", "-p", "PID"], DEFAULT_PLACEHOLDER)
            .unwrap();
        let session = ProfileSession::new(
            MockLauncher {
                log: Rc::clone(&log),
                fail: launch_fails,
                observer_exits_early: false,
            },
            MockSync { log: Rc::clone(&log) },
            command,
            HostId(4242),
            SessionConfig { entry: EntryName::default(), terminator },
        );
        Harness { log, session }
    }

    fn run(h: &mut Harness, behaviour: Behaviour) -> Result<RunReport, ProfileError> {
        let mut engine = MockEngine { log: Rc::clone(&h.log), behaviour };
        let module = GuestModule::from_bytes("guest.wasm", Vec::new());
        h.session.run(&mut engine, &module)
    }

    fn signals(log: &Log) -> usize {
        log.borrow().iter().filter(|e| matches!(e, Event::Signal(_))).count()
    }

    #[test]
    fn test_successful_run_ordering() {
        let mut h = harness(Terminator::default(), false);
        let report = run(&mut h, Behaviour::Ok).unwrap();

        assert_eq!(
            *h.log.borrow(),
            vec![
                Event::Validate,
                Event::Instantiate,
                Event::Resolve,
                Event::Launch(vec!["perf".into(), "stat".into(), "-p".into(), "4242".into()]),
                Event::Sync(Pid(777)),
                Event::Invoke,
                Event::Signal(ObserverSignal::Interrupt),
            ]
        );
        assert_eq!(report.observer_pid, 777);
        assert_eq!(report.host_pid, 4242);
        assert_eq!(report.signal, Some(ObserverSignal::Interrupt));
    }

    #[test]
    fn test_missing_entry_launches_nothing() {
        let mut h = harness(Terminator::default(), false);
        let err = run(&mut h, Behaviour::Missing).unwrap_err();

        assert!(matches!(err, ProfileError::EntryPoint(EntryPointError::NotFound { .. })));
        assert_eq!(*h.log.borrow(), vec![Event::Validate, Event::Instantiate, Event::Resolve]);
    }

    #[test]
    fn test_wrong_signature_launches_nothing() {
        let mut h = harness(Terminator::default(), false);
        let err = run(&mut h, Behaviour::WrongSignature).unwrap_err();

        assert!(matches!(err, ProfileError::EntryPoint(EntryPointError::WrongSignature { .. })));
        assert!(!h.log.borrow().iter().any(|e| matches!(e, Event::Launch(_) | Event::Invoke)));
    }

    #[test]
    fn test_launch_failure_skips_guest() {
        let mut h = harness(Terminator::default(), true);
        let err = run(&mut h, Behaviour::Ok).unwrap_err();

        assert!(matches!(err, ProfileError::Launch(_)));
        assert!(!h.log.borrow().contains(&Event::Invoke));
    }

    #[test]
    fn test_exactly_one_signal_per_successful_run() {
        let mut h = harness(Terminator::default(), false);
        run(&mut h, Behaviour::Ok).unwrap();
        assert_eq!(signals(&h.log), 1);
    }

    #[test]
    fn test_trap_with_always_policy_signals_once() {
        let terminator = Terminator { policy: TerminationPolicy::Always, ..Terminator::default() };
        let mut h = harness(terminator, false);
        let err = run(&mut h, Behaviour::Trap).unwrap_err();

        assert!(matches!(err, ProfileError::Trap(_)));
        assert_eq!(signals(&h.log), 1);
        assert_eq!(h.log.borrow().last(), Some(&Event::Signal(ObserverSignal::Interrupt)));
    }

    #[test]
    fn test_trap_with_on_success_policy_sends_nothing() {
        let terminator =
            Terminator { policy: TerminationPolicy::OnSuccess, ..Terminator::default() };
        let mut h = harness(terminator, false);
        assert!(run(&mut h, Behaviour::Trap).is_err());
        assert_eq!(signals(&h.log), 0);

        let mut h = harness(terminator, false);
        run(&mut h, Behaviour::Ok).unwrap();
        assert_eq!(signals(&h.log), 1);
    }

    #[test]
    fn test_never_policy_leaves_observer_running() {
        let terminator = Terminator { policy: TerminationPolicy::Never, ..Terminator::default() };
        let mut h = harness(terminator, false);
        let report = run(&mut h, Behaviour::Ok).unwrap();

        assert_eq!(signals(&h.log), 0);
        assert_eq!(report.signal, None);
    }

    #[test]
    fn test_exited_observer_reports_no_signal() {
        let mut h = harness(Terminator::default(), false);
        h.session.launcher.observer_exits_early = true;
        let report = run(&mut h, Behaviour::Ok).unwrap();

        assert_eq!(signals(&h.log), 0);
        assert_eq!(report.signal, None);
        assert!(h.log.borrow().contains(&Event::Invoke));
    }

    #[test]
    fn test_wait_reaps_after_signal() {
        let terminator = Terminator {
            signal: ObserverSignal::Terminate,
            wait: true,
            ..Terminator::default()
        };
        let mut h = harness(terminator, false);
        run(&mut h, Behaviour::Ok).unwrap();

        let log = h.log.borrow();
        let tail = &log[log.len() - 2..];
        assert_eq!(tail, &[Event::Signal(ObserverSignal::Terminate), Event::Wait]);
    }

    #[test]
    fn test_custom_entry_name_is_resolved() {
        let mut h = harness(Terminator::default(), false);
        h.session.config.entry = EntryName::new("bench");
        let report = run(&mut h, Behaviour::Ok).unwrap();
        assert_eq!(report.entry, "bench");
    }
}
