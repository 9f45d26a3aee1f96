//! bfind - locate files recursively under a directory.
//!
//! Entry point for the CLI application.

use std::io::IsTerminal;
use std::process::ExitCode;

use bfind::cli::CliArgs;
use bfind::{Environment, FindError};
use clap::error::ErrorKind;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = match CliArgs::parse_find_style(std::env::args_os()) {
        Ok(args) => args,
        // Usage is printed but the run did not search anything.
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };

    setup_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<(), FindError> {
    let env = Environment::from_env();
    let invocation = args.into_invocation(&env)?;

    let mut search = bfind::search(&invocation.root).query(invocation.query);
    if let Some(executable) = invocation.executable {
        search = search.exec(executable);
    }

    let results = search.run(&env)?;
    debug!(
        matches = results.matches,
        dirs = results.stats.dirs,
        entries = results.stats.entries,
        per_sec = results.stats.entries_per_sec,
        "done"
    );
    // The child's own exit status is not ours to propagate.
    if let Some(action) = results.action {
        debug!(%action, "action finished");
    }
    Ok(())
}

/// Diagnostics go to stderr; stdout carries nothing but matches.
fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("bfind=debug,warn")
        } else {
            EnvFilter::new("bfind=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}
