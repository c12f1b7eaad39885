//! Error reports produced when a pipeline run fails.
//!
//! The pipeline runner calls [`on_failure`] from its own error path, so the
//! handler contains every failure it encounters: unreadable rule logs become
//! placeholder lines and anything else is printed between banner lines and
//! returned as [`ReportOutcome::Failed`].

use std::{
    any::Any,
    env, fs,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
};

use tracing::{error, info, instrument};

use crate::{
    config::{DescribeConfig, describe_config},
    error::{ReportError, ScanError},
    scanner::LogScanner,
    summary::{DEFAULT_LINES_PER_LOG, summarize},
};

/// File name of the summary artifact, relative to the working directory.
pub const ERROR_SUMMARY_FILE: &str = "error_summary.txt";

const HEADER: &str = "Error in snakemake pipeline.";
const DETAILS_FOLLOW: &str = "Detailed error information follows.";
const BANNER: &str = "###########################################################################";

/// A fully rendered error report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pipeline: String,
    lines: Vec<String>,
    failed_rules: usize,
}

impl ErrorReport {
    /// Name of the pipeline, taken from the pipeline file's stem.
    #[must_use]
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// Report lines, preface first.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of failed rules found in the execution log.
    #[must_use]
    pub const fn failed_rules(&self) -> usize {
        self.failed_rules
    }

    /// The report as written to the artifact: lines joined by newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Result of the never-failing [`ErrorReportWriter::on_failure`] entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The report was logged and written to `path`.
    Written {
        /// Location of the summary artifact.
        path: PathBuf,
        /// Number of failed rules summarised.
        failed_rules: usize,
    },
    /// Writing the report failed; the failure was printed and contained.
    Failed {
        /// Description of what went wrong.
        message: String,
    },
}

/// Builds, logs, and persists error reports for one working directory.
///
/// # Examples
/// ```
/// use toolkit_core::ErrorReportWriter;
///
/// let writer = ErrorReportWriter::new("/work").with_lines_per_log(Some(20));
/// assert_eq!(writer.summary_path(), std::path::Path::new("/work/error_summary.txt"));
/// ```
#[derive(Debug, Clone)]
pub struct ErrorReportWriter {
    working_dir: PathBuf,
    lines_per_log: Option<usize>,
}

impl ErrorReportWriter {
    /// Creates a writer rooted at `working_dir`.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            lines_per_log: Some(DEFAULT_LINES_PER_LOG),
        }
    }

    /// Creates a writer rooted at the process working directory.
    ///
    /// # Errors
    /// Returns [`ReportError::Scan`] when the working directory cannot be
    /// resolved.
    pub fn from_current_dir() -> Result<Self, ReportError> {
        let working_dir = env::current_dir().map_err(|source| ScanError::WorkingDir { source })?;
        Ok(Self::new(working_dir))
    }

    /// Sets how many trailing lines to include per rule log; `None` includes
    /// every line.
    #[must_use]
    pub fn with_lines_per_log(mut self, lines_per_log: Option<usize>) -> Self {
        self.lines_per_log = lines_per_log;
        self
    }

    /// Location of the summary artifact.
    #[must_use]
    pub fn summary_path(&self) -> PathBuf {
        self.working_dir.join(ERROR_SUMMARY_FILE)
    }

    /// Builds the report for a failed run without logging or writing it.
    ///
    /// # Errors
    /// Returns [`ReportError::Scan`] when the execution log cannot be read.
    pub fn build(
        &self,
        pipeline_file: &Path,
        config: Option<&dyn DescribeConfig>,
        log_file: &Path,
    ) -> Result<ErrorReport, ReportError> {
        let log_path = self.working_dir.join(log_file);
        let log_text = fs::read_to_string(&log_path).map_err(|source| ScanError::ReadLog {
            path: log_path.clone(),
            source,
        })?;
        let records: Vec<_> = LogScanner::new(&log_text, &self.working_dir).collect();

        let mut lines = vec![
            HEADER.to_owned(),
            format!("working_dir = {}", self.working_dir.display()),
        ];
        if let Some(config) = config {
            lines.extend(describe_config(config));
        }
        lines.push(DETAILS_FOLLOW.to_owned());
        lines.extend(summarize(&records, self.lines_per_log));

        Ok(ErrorReport {
            pipeline: pipeline_name(pipeline_file),
            lines,
            failed_rules: records.len(),
        })
    }

    /// Builds the report, emits it at error level, and overwrites the summary
    /// artifact.
    ///
    /// # Errors
    /// Returns [`ReportError`] when the execution log cannot be read or the
    /// artifact cannot be written.
    #[instrument(
        name = "toolkit.report",
        err,
        skip_all,
        fields(pipeline = %pipeline_file.display(), log = %log_file.display()),
    )]
    pub fn write(
        &self,
        pipeline_file: &Path,
        config: Option<&dyn DescribeConfig>,
        log_file: &Path,
    ) -> Result<ErrorReport, ReportError> {
        let report = self.build(pipeline_file, config, log_file)?;
        let text = report.text();
        error!(pipeline = report.pipeline(), "{text}");

        let path = self.summary_path();
        fs::write(&path, &text).map_err(|source| ReportError::WriteSummary {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), failed_rules = report.failed_rules(), "error summary written");
        Ok(report)
    }

    /// Runs [`write`](Self::write), containing every error and panic.
    ///
    /// Failures are printed to stdout between banner lines and returned as
    /// [`ReportOutcome::Failed`]; this never panics or returns an error.
    pub fn on_failure(
        &self,
        pipeline_file: &Path,
        config: Option<&dyn DescribeConfig>,
        log_file: &Path,
    ) -> ReportOutcome {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            self.write(pipeline_file, config, log_file)
        }));
        let message = match attempt {
            Ok(Ok(report)) => {
                return ReportOutcome::Written {
                    path: self.summary_path(),
                    failed_rules: report.failed_rules(),
                };
            }
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        print_banner(&message);
        ReportOutcome::Failed { message }
    }
}

/// Failure callback for the pipeline runner.
///
/// Summarises the failed rules in `log_file`, logs the report at error level,
/// and writes `./error_summary.txt`. `lines_per_log` limits how much of each
/// rule log is included; `None` includes everything. Never propagates errors.
pub fn on_failure(
    pipeline_file: &Path,
    config: Option<&dyn DescribeConfig>,
    log_file: &Path,
    lines_per_log: Option<usize>,
) -> ReportOutcome {
    match ErrorReportWriter::from_current_dir() {
        Ok(writer) => writer
            .with_lines_per_log(lines_per_log)
            .on_failure(pipeline_file, config, log_file),
        Err(err) => {
            let message = err.to_string();
            print_banner(&message);
            ReportOutcome::Failed { message }
        }
    }
}

fn pipeline_name(pipeline_file: &Path) -> String {
    pipeline_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map_or_else(|| "pipeline".to_owned(), ToOwned::to_owned)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "report handler panicked".to_owned())
}

#[expect(
    clippy::print_stdout,
    reason = "The failure handler reports on stdout because logging may be unavailable"
)]
fn print_banner(message: &str) {
    println!("{BANNER}");
    println!("Exception raised in Snakemake onerror handler.");
    println!("{message}");
    println!("{BANNER}");
}
