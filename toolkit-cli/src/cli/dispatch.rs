//! Splits the command line into global and command segments and runs the
//! selected command.

use thiserror::Error;
use tracing::{error, info, instrument};

use super::{
    global::GlobalArgs,
    options::{OptionConflict, merge_short_options},
    registry::{CommandError, CommandRegistry},
};
use crate::logging::{LoggingError, init_logging};

/// The command line divided at the first registered command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgvSplit<'a> {
    /// `argv[0]`, or empty when `argv` is empty.
    pub program: &'a str,
    /// Tokens between the program and the command name.
    pub global: &'a [String],
    /// The command name and everything after it.
    pub command: Option<&'a [String]>,
}

/// Finds the first token after `argv[0]` naming a registered command.
///
/// A command name that appears as the value of a global option is taken as
/// the command.
#[must_use]
pub fn split_argv<'a>(argv: &'a [String], registry: &CommandRegistry) -> ArgvSplit<'a> {
    let (program, rest) = match argv.split_first() {
        Some((program, rest)) => (program.as_str(), rest),
        None => ("", argv),
    };
    match rest.iter().position(|token| registry.contains(token)) {
        Some(index) => {
            let (global, command) = rest.split_at(index);
            ArgvSplit {
                program,
                global,
                command: Some(command),
            }
        }
        None => ArgvSplit {
            program,
            global: rest,
            command: None,
        },
    }
}

/// What [`Dispatcher::dispatch`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The named command ran to completion.
    Completed {
        /// Command name.
        command: &'static str,
    },
    /// Only global options were given; no command ran.
    GlobalOnly,
}

/// Errors raised while dispatching a command line.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Invalid arguments, or a help request.
    #[error(transparent)]
    Usage(#[from] clap::Error),
    /// Commands requested conflicting short options.
    #[error(transparent)]
    Conflict(#[from] OptionConflict),
    /// Logging could not be configured.
    #[error(transparent)]
    Logging(#[from] LoggingError),
    /// The command itself failed.
    #[error("command `{command}` failed: {source}")]
    Command {
        /// Command name.
        command: &'static str,
        /// Failure raised by the command.
        #[source]
        source: CommandError,
    },
}

/// Runs commands from a [`CommandRegistry`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: CommandRegistry,
}

impl Dispatcher {
    /// Dispatches against `registry`.
    #[must_use]
    pub const fn new(registry: CommandRegistry) -> Self {
        Self { registry }
    }

    /// The commands this dispatcher knows.
    #[must_use]
    pub const fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Parses `argv`, configures logging, and runs the selected command.
    ///
    /// # Errors
    /// Returns [`DispatchError::Usage`] for invalid arguments and help
    /// requests, [`DispatchError::Logging`] if logging cannot be configured,
    /// [`DispatchError::Conflict`] if the registered commands disagree on
    /// short options, and [`DispatchError::Command`] if the command fails.
    #[instrument(name = "toolkit.dispatch", skip_all)]
    pub fn dispatch(&self, argv: &[String]) -> Result<DispatchOutcome, DispatchError> {
        let split = split_argv(argv, &self.registry);
        let globals = self.parse_globals(&split)?;
        init_logging(&globals.logging_config())?;

        let Some(segment) = split.command else {
            return Ok(DispatchOutcome::GlobalOnly);
        };
        let Some(spec) = segment
            .first()
            .and_then(|name| self.registry.get(name))
        else {
            return Ok(DispatchOutcome::GlobalOnly);
        };

        let table = merge_short_options(self.registry.specs())?;
        let matches = spec
            .parser(split.program, &table)
            .try_get_matches_from(segment)?;

        info!("Executing: {}", argv.join(" "));
        let handler = spec.handler();
        match handler(&matches, &globals.common_options()) {
            Ok(()) => {
                info!("Finished executing successfully.");
                Ok(DispatchOutcome::Completed {
                    command: spec.name(),
                })
            }
            Err(source) => {
                error!(
                    severity = "critical",
                    command = spec.name(),
                    error = %source,
                    "Execution failed"
                );
                Err(DispatchError::Command {
                    command: spec.name(),
                    source,
                })
            }
        }
    }

    // The global parser requires a command positional, so a registered name
    // stands in for the command segment.
    fn parse_globals(&self, split: &ArgvSplit<'_>) -> Result<GlobalArgs, clap::Error> {
        let placeholder = self.registry.names().next().unwrap_or_default();
        let args = std::iter::once(split.program)
            .chain(split.global.iter().map(String::as_str))
            .chain(std::iter::once(placeholder));
        GlobalArgs::parse_with_registry(&self.registry, args)
    }
}
