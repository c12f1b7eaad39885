//! CLI entry point for the toolkit.
//!
//! Builds the command registry, hands the process arguments to the
//! dispatcher, and maps the outcome to an exit code. Usage errors and help
//! requests are rendered by `clap`; command failures have already been logged
//! by the dispatcher.

use std::process::ExitCode;

use anyhow::{Context, Result};

use toolkit_cli::{
    cli::{CommandRegistry, DispatchError, DispatchOutcome, Dispatcher},
    logging,
};
use tracing::error;

/// Build the registry and dispatch the process arguments.
fn try_main(argv: &[String]) -> Result<DispatchOutcome> {
    let registry = CommandRegistry::builtin().context("invalid command registry")?;
    let outcome = Dispatcher::new(registry)
        .dispatch(argv)
        .context("failed to dispatch command")?;
    Ok(outcome)
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    let Err(err) = try_main(&argv) else {
        return ExitCode::SUCCESS;
    };
    report(&err);
    ExitCode::from(failure_status(&err))
}

/// Exit status for a failed run: `clap`'s code for usage errors and help
/// requests, 1 otherwise.
fn failure_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DispatchError>() {
        Some(DispatchError::Usage(usage)) => u8::try_from(usage.exit_code()).unwrap_or(1),
        _ => 1,
    }
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<DispatchError>() {
        Some(DispatchError::Usage(usage)) => {
            if usage.print().is_err() {
                report_failure(err);
            }
        }
        Some(DispatchError::Command { .. }) => {}
        _ => report_failure(err),
    }
}

fn report_failure(err: &anyhow::Error) {
    if logging::is_initialized() {
        error!(error = format!("{err:#}"), "toolkit failed");
    } else {
        report_before_logging(err);
    }
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_before_logging(err: &anyhow::Error) {
    eprintln!("toolkit: {err:#}");
}
