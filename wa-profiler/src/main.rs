//! # wa-profiler - Main Entry Point
//!
//! Parses arguments, loads the module, and hands off to a [`ProfileSession`].
//! Exit codes tell input problems apart from guest failures so scripts can
//! react without parsing stderr.

// Durations are converted to floats for display only
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;

use wa_profiler::cli::Args;
use wa_profiler::domain::{EngineError, EntryPointError, HostId, ProfileError};
use wa_profiler::engine::EngineKind;
use wa_profiler::module::GuestModule;
use wa_profiler::observer::{CommandLauncher, FixedDelay, ObserverCommand};
use wa_profiler::preflight::run_preflight_checks;
use wa_profiler::session::ProfileSession;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_INVALID_MODULE: i32 = 3;
const EXIT_BAD_ENTRY: i32 = 4;
const EXIT_NO_ENTRY: i32 = 5;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let Some(err) = err.downcast_ref::<ProfileError>() else {
        return EXIT_ERROR;
    };
    match err {
        ProfileError::ModuleLoad { .. }
        | ProfileError::Template(_)
        | ProfileError::Engine(EngineError::Unavailable(_)) => EXIT_USAGE,
        ProfileError::Engine(EngineError::Validation(_) | EngineError::Compilation(_)) => {
            EXIT_INVALID_MODULE
        }
        ProfileError::EntryPoint(EntryPointError::NotFound { .. }) => EXIT_NO_ENTRY,
        ProfileError::EntryPoint(_) => EXIT_BAD_ENTRY,
        ProfileError::Engine(_) | ProfileError::Launch(_) | ProfileError::Trap(_) => EXIT_ERROR,
    }
}

fn list_engines() {
    for kind in EngineKind::ALL {
        if kind.is_available() {
            println!("{kind}");
        } else {
            println!("{kind} (not compiled in)");
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    if args.list_engines {
        list_engines();
        return Ok(());
    }

    // clap enforces both when --list-engines is absent
    let Some(module_path) = args.module.as_deref() else {
        anyhow::bail!("Missing required argument: MODULE");
    };
    let command = ObserverCommand::new(args.profiler.iter().cloned(), args.placeholder.clone())
        .map_err(ProfileError::from)?;

    run_preflight_checks(&command, args.quiet);

    let module = GuestModule::load(module_path)?;
    let host = HostId::current();

    if !args.quiet {
        eprintln!(
            "Profiling {} ({}) with `{}` as host {host}",
            module.path().display(),
            args.engine,
            command.render(host).join(" ")
        );
    }

    let mut session = ProfileSession::new(
        CommandLauncher,
        FixedDelay(args.start_delay()),
        command,
        host,
        args.session_config(),
    );
    let report = session.run_engine(args.engine, &module)?;

    if !args.quiet {
        eprintln!(
            "`{}` returned after {:.3} ms",
            report.entry,
            report.guest_micros as f64 / 1000.0
        );
    }

    if let Some(ref path) = args.export {
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file: {}", path.display()))?;
        report
            .export(BufWriter::new(file))
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        if !args.quiet {
            eprintln!("Report written to {}", path.display());
        }
    }

    Ok(())
}
