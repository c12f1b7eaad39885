//! Small helpers shared across CLI tests.
//!
//! The dispatcher tests need throwaway commands with chosen names and short
//! options. These helpers keep the test cases concise and consistent.

use clap::{Arg, ArgAction, ArgMatches, Command};
use tempfile::TempDir;

use super::{CommandError, CommandRegistry, CommandSpec, CommonOptions};

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn argv(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|token| (*token).to_owned()).collect()
}

fn name_arg(command: Command) -> Command {
    command
        .arg(Arg::new("name").long("name"))
        .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue))
}

fn succeed(_: &ArgMatches, _: &CommonOptions) -> Result<(), CommandError> {
    Ok(())
}

fn fail(_: &ArgMatches, _: &CommonOptions) -> Result<(), CommandError> {
    Err(CommandError::Report {
        message: "deliberate failure".to_owned(),
    })
}

pub(super) fn stub(
    name: &'static str,
    short_options: &'static [(&'static str, char)],
) -> CommandSpec {
    CommandSpec::new(name, name, "Stub command.", name_arg, succeed)
        .with_short_options(short_options)
}

pub(super) fn failing(name: &'static str) -> CommandSpec {
    CommandSpec::new(name, name, "Always fails.", name_arg, fail)
}

pub(super) fn registry(specs: Vec<CommandSpec>) -> CommandRegistry {
    match CommandRegistry::new(specs) {
        Ok(registry) => registry,
        Err(err) => panic!("failed to build registry: {err}"),
    }
}
