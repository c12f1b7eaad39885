//! The `summarize-errors` command: writes the error summary for a finished
//! pipeline run.

use std::{collections::BTreeMap, path::PathBuf};

use clap::{ArgMatches, Args, FromArgMatches};
use toolkit_core::{DEFAULT_LINES_PER_LOG, DescribeConfig, ReportOutcome, on_failure};
use tracing::{info, instrument};

use crate::cli::{CommandError, CommandSpec, CommonOptions};

const SHORT_OPTIONS: &[(&str, char)] = &[
    ("snakemake-log", 's'),
    ("pipeline", 'p'),
    ("lines-per-log", 'n'),
];

/// Arguments accepted by `summarize-errors`.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct SummarizeArgs {
    /// Execution log written by the pipeline runner.
    #[arg(long = "snakemake-log")]
    pub snakemake_log: PathBuf,

    /// Pipeline definition file; its stem names the report.
    #[arg(long)]
    pub pipeline: PathBuf,

    /// Trailing lines to include from each failed rule's log.
    #[arg(
        long = "lines-per-log",
        default_value_t = DEFAULT_LINES_PER_LOG,
        conflicts_with = "all_lines"
    )]
    pub lines_per_log: usize,

    /// Include every line of each failed rule's log.
    #[arg(long = "all-lines")]
    pub all_lines: bool,

    /// Configuration entry to record in the report, as `KEY=VALUE`.
    #[arg(long = "config", value_name = "KEY=VALUE", value_parser = parse_config_entry)]
    pub config: Vec<(String, String)>,
}

impl SummarizeArgs {
    /// Line limit passed to the report writer.
    #[must_use]
    pub const fn line_limit(&self) -> Option<usize> {
        if self.all_lines {
            None
        } else {
            Some(self.lines_per_log)
        }
    }
}

/// Registration for the `summarize-errors` command.
#[must_use]
pub fn command() -> CommandSpec {
    CommandSpec::new(
        "summarize-errors",
        "summarize errors",
        "Summarize failed rules from a pipeline execution log.",
        <SummarizeArgs as Args>::augment_args,
        handle,
    )
    .with_short_options(SHORT_OPTIONS)
}

fn handle(matches: &ArgMatches, common: &CommonOptions) -> Result<(), CommandError> {
    let args = SummarizeArgs::from_arg_matches(matches)?;
    run(&args, common)
}

/// Writes `./error_summary.txt` for the run recorded in `snakemake_log`.
///
/// # Errors
/// Returns [`CommandError::Report`] if the summary could not be produced.
#[instrument(
    name = "toolkit.command",
    skip_all,
    fields(command = "summarize-errors", log = %args.snakemake_log.display())
)]
pub fn run(args: &SummarizeArgs, _common: &CommonOptions) -> Result<(), CommandError> {
    let config: BTreeMap<String, String> = args.config.iter().cloned().collect();
    let config = (!config.is_empty()).then_some(&config as &dyn DescribeConfig);

    match on_failure(&args.pipeline, config, &args.snakemake_log, args.line_limit()) {
        ReportOutcome::Written { path, failed_rules } => {
            info!(path = %path.display(), failed_rules, "error summary ready");
            Ok(())
        }
        ReportOutcome::Failed { message } => Err(CommandError::Report { message }),
    }
}

fn parse_config_entry(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}
