//! Options accepted before the command name.

use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser, builder::PossibleValuesParser};

use super::registry::{CommandRegistry, CommonOptions};
use crate::logging::{LogLevel, LoggingConfig};

/// Global options shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "toolkit", about = "Client pipeline tools.")]
pub struct GlobalArgs {
    /// Command to run.
    pub command: String,

    /// Minimum severity written to the log.
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info, ignore_case = true)]
    pub log_level: LogLevel,

    /// Write the log to this file instead of stderr.
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Log errors only.
    #[arg(long = "no-log")]
    pub no_log: bool,

    /// Replace existing output files, including the log file.
    #[arg(long)]
    pub overwrite: bool,
}

impl GlobalArgs {
    /// Parses `args` (program name first) with `command` restricted to the
    /// registered names and the command list appended to the help text.
    ///
    /// # Errors
    /// Returns the `clap` error for invalid input or a help/version request.
    pub fn parse_with_registry<I, T>(
        registry: &CommandRegistry,
        args: I,
    ) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let names: Vec<&'static str> = registry.names().collect();
        let mut command = Self::command()
            .mut_arg("command", |arg| arg.value_parser(PossibleValuesParser::new(names)))
            .after_help(format!("commands:\n{}", registry.doc()));
        let matches = command.try_get_matches_from_mut(args)?;
        Self::from_arg_matches(&matches).map_err(|err| err.format(&mut command))
    }

    /// Logging configuration implied by these options.
    #[must_use]
    pub fn logging_config(&self) -> LoggingConfig {
        if self.no_log {
            return LoggingConfig::errors_only();
        }
        let config = LoggingConfig::new(self.log_level);
        match &self.log_file {
            Some(path) => config.with_file(path, self.overwrite),
            None => config,
        }
    }

    /// Options injected into the command.
    #[must_use]
    pub const fn common_options(&self) -> CommonOptions {
        CommonOptions {
            overwrite: self.overwrite,
        }
    }
}
