//! The `example` command: copies a text file line by line.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use clap::{ArgMatches, Args, FromArgMatches};
use tracing::{info, instrument};

use crate::cli::{CommandError, CommandSpec, CommonOptions};

const SHORT_OPTIONS: &[(&str, char)] = &[("input-file", 'i'), ("output-file", 'o')];

/// Arguments accepted by `example`.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ExampleArgs {
    /// Path to the input file.
    #[arg(long = "input-file")]
    pub input_file: PathBuf,

    /// Path to the output file.
    #[arg(long = "output-file")]
    pub output_file: PathBuf,
}

/// Registration for the `example` command.
#[must_use]
pub fn command() -> CommandSpec {
    CommandSpec::new(
        "example",
        "example",
        "Do an awesome thing.",
        <ExampleArgs as Args>::augment_args,
        handle,
    )
    .with_short_options(SHORT_OPTIONS)
}

fn handle(matches: &ArgMatches, common: &CommonOptions) -> Result<(), CommandError> {
    let args = ExampleArgs::from_arg_matches(matches)?;
    run(&args, common)
}

/// Copies `input_file` to `output_file`, terminating every line with `\n`.
///
/// # Errors
/// Returns [`CommandError::OutputExists`] if the output exists and
/// `overwrite` is unset, and [`CommandError::Read`] or
/// [`CommandError::Write`] on I/O failure.
#[instrument(
    name = "toolkit.command",
    skip_all,
    fields(command = "example", overwrite = common.overwrite)
)]
pub fn run(args: &ExampleArgs, common: &CommonOptions) -> Result<(), CommandError> {
    info!(
        "Reading input from {} to {}...",
        args.input_file.display(),
        args.output_file.display()
    );

    if !common.overwrite && args.output_file.exists() {
        return Err(CommandError::OutputExists {
            path: args.output_file.clone(),
        });
    }

    let input =
        File::open(&args.input_file).map_err(|source| read_error(&args.input_file, source))?;
    let output =
        File::create(&args.output_file).map_err(|source| write_error(&args.output_file, source))?;
    let mut writer = BufWriter::new(output);

    for line in BufReader::new(input).lines() {
        let line = line.map_err(|source| read_error(&args.input_file, source))?;
        writeln!(writer, "{line}").map_err(|source| write_error(&args.output_file, source))?;
    }
    writer
        .flush()
        .map_err(|source| write_error(&args.output_file, source))
}

fn read_error(path: &Path, source: std::io::Error) -> CommandError {
    CommandError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn write_error(path: &Path, source: std::io::Error) -> CommandError {
    CommandError::Write {
        path: path.to_path_buf(),
        source,
    }
}
