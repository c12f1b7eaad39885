//! Post-mortem diagnostics for failed pipeline runs.
//!
//! When the external pipeline runner reports a failure it hands over the path
//! to its execution log. This crate scans that log for failed rules, pulls the
//! trailing lines of each rule's own log file, and writes a consolidated
//! `error_summary.txt` next to the run. The report path never propagates
//! errors back to the runner: failures degrade to placeholder lines or a
//! printed banner.

mod config;
mod error;
mod lines;
mod report;
mod scanner;
mod summary;

pub use crate::{
    config::{DescribeConfig, describe_config},
    error::{ReportError, ScanError},
    lines::read_lines,
    report::{ERROR_SUMMARY_FILE, ErrorReport, ErrorReportWriter, ReportOutcome, on_failure},
    scanner::{
        FailureRecord, LOG_PREFIX, LOG_SUFFIX, LogScanner, RULE_ERROR_PREFIX, scan, scan_file,
    },
    summary::{DEFAULT_LINES_PER_LOG, summarize, summarize_log, tail},
};
