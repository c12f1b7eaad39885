//! The table of sub-commands the dispatcher can run.

use std::{collections::HashSet, fmt, io, path::PathBuf};

use clap::{ArgMatches, Command};
use thiserror::Error;

use super::options::GlobalOptionTable;

/// Options parsed before the command name and injected into every command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommonOptions {
    /// Replace existing output files instead of refusing to run.
    pub overwrite: bool,
}

/// Adds a command's arguments to its `clap` parser.
pub type ArgsBuilder = fn(Command) -> Command;

/// Runs a command against its bound arguments.
pub type CommandHandler = fn(&ArgMatches, &CommonOptions) -> Result<(), CommandError>;

/// Errors raised by command bodies.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Parsed arguments could not be converted into the command's type.
    #[error(transparent)]
    Arguments(#[from] clap::Error),
    /// An input file could not be read.
    #[error("failed to read `{path}`: {source}")]
    Read {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An output file could not be written.
    #[error("failed to write `{path}`: {source}")]
    Write {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The output already exists and `--overwrite` was not given.
    #[error("output `{path}` already exists; pass --overwrite to replace it")]
    OutputExists {
        /// Existing output path.
        path: PathBuf,
    },
    /// The error summary could not be produced.
    #[error("error summary was not written: {message}")]
    Report {
        /// Description of the contained failure.
        message: String,
    },
}

/// One registrable sub-command.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    name: &'static str,
    display_name: &'static str,
    description: &'static str,
    short_options: &'static [(&'static str, char)],
    args: ArgsBuilder,
    handler: CommandHandler,
}

impl CommandSpec {
    /// Creates a command without short options.
    #[must_use]
    pub const fn new(
        name: &'static str,
        display_name: &'static str,
        description: &'static str,
        args: ArgsBuilder,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            display_name,
            description,
            short_options: &[],
            args,
            handler,
        }
    }

    /// Sets the `(parameter, flag)` pairs this command wants as short options.
    /// Parameters are named by their long option.
    #[must_use]
    pub const fn with_short_options(
        mut self,
        short_options: &'static [(&'static str, char)],
    ) -> Self {
        self.short_options = short_options;
        self
    }

    /// Name matched on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Human-friendly name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        self.display_name
    }

    /// One-line description shown in help output.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Requested short options, in declaration order.
    #[must_use]
    pub const fn short_options(&self) -> &'static [(&'static str, char)] {
        self.short_options
    }

    /// The command's handler.
    #[must_use]
    pub const fn handler(&self) -> CommandHandler {
        self.handler
    }

    /// Builds the command's parser with the merged short options applied.
    ///
    /// Every argument whose long name appears in `table` receives the merged
    /// flag, so a parameter shared by several commands gets the same short
    /// option everywhere.
    #[must_use]
    pub fn parser(&self, program: &str, table: &GlobalOptionTable) -> Command {
        let command = (self.args)(
            Command::new(self.name).bin_name(format!("{program} {}", self.name)),
        )
        .about(self.description);
        let shorts: Vec<(String, char)> = command
            .get_arguments()
            .filter_map(|arg| {
                let flag = table.flag_for(arg.get_long()?)?;
                Some((arg.get_id().to_string(), flag))
            })
            .collect();
        shorts.into_iter().fold(command, |command, (id, flag)| {
            command.mut_arg(id, |arg| arg.short(flag))
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name)
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("description", &self.description)
            .field("short_options", &self.short_options)
            .finish_non_exhaustive()
    }
}

/// Errors in the command table itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No commands were registered.
    #[error("no commands are registered")]
    Empty,
    /// Two commands share a name.
    #[error("command name `{name}` is registered more than once")]
    DuplicateName {
        /// The repeated name.
        name: &'static str,
    },
}

/// The immutable list of commands available to the dispatcher.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    specs: Vec<CommandSpec>,
}

impl CommandRegistry {
    /// Validates and stores `specs` in registration order.
    ///
    /// # Errors
    /// Returns [`RegistryError`] if `specs` is empty or two commands share a
    /// name.
    pub fn new(specs: Vec<CommandSpec>) -> Result<Self, RegistryError> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.name()) {
                return Err(RegistryError::DuplicateName { name: spec.name() });
            }
        }
        Ok(Self { specs })
    }

    /// The commands bundled with the toolkit binary.
    ///
    /// # Errors
    /// Returns [`RegistryError`] if the bundled table is inconsistent.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(crate::tools::builtin_commands())
    }

    /// Registered commands in registration order.
    #[must_use]
    pub fn specs(&self) -> &[CommandSpec] {
        &self.specs
    }

    /// Looks up a command by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.specs.iter().find(|spec| spec.name() == name)
    }

    /// Whether `name` is a registered command.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Command names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(CommandSpec::name)
    }

    /// Bulleted `* name<TAB>description` listing for help output.
    #[must_use]
    pub fn doc(&self) -> String {
        self.specs
            .iter()
            .map(|spec| format!("* {}\t{}", spec.name(), spec.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
