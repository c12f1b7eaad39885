//! Extraction of failed rule invocations from an execution log.
//!
//! The pipeline runner reports each failed rule as a block that opens with an
//! `Error in rule <name>:` line and, somewhere below it, names the rule's own
//! log file:
//!
//! ```text
//! Error in rule align:
//!     jobid: 3
//!     log: logs/align.log (check log file(s) for error message)
//! ```
//!
//! A block ends at the next `Error in rule` line or at the end of the log.

use std::{
    env, fs,
    iter::Peekable,
    path::{Path, PathBuf},
    str::Lines,
};

use tracing::debug;

use crate::error::ScanError;

/// Prefix of the line that opens a failed rule block.
pub const RULE_ERROR_PREFIX: &str = "Error in rule ";
/// Prefix of the line naming the failed rule's log file.
pub const LOG_PREFIX: &str = "    log: ";
/// Suffix the runner appends to the log file line.
pub const LOG_SUFFIX: &str = " (check log file(s) for error message)";

/// A failed rule invocation found in an execution log.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use toolkit_core::FailureRecord;
///
/// let record = FailureRecord::new("align", "/work/logs/align.log");
/// assert_eq!(record.rule_name(), "align");
/// assert_eq!(record.log_path(), Path::new("/work/logs/align.log"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    rule_name: String,
    log_path: PathBuf,
}

impl FailureRecord {
    /// Creates a record for `rule_name` whose log lives at `log_path`.
    #[must_use]
    pub fn new(rule_name: impl Into<String>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            rule_name: rule_name.into(),
            log_path: log_path.into(),
        }
    }

    /// Name of the failed rule.
    #[must_use]
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// Resolved path of the rule's log file.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// One-pass iterator over the [`FailureRecord`]s of an execution log.
///
/// Relative log paths are resolved against `base_dir`. A rule block without a
/// `log:` line yields no record and scanning carries on with the next block.
/// Only the first `log:` line of a block is used.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use toolkit_core::LogScanner;
///
/// let log = "Error in rule sort:\n    log: logs/sort.log (check log file(s) for error message)\n";
/// let records: Vec<_> = LogScanner::new(log, "/work").collect();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].rule_name(), "sort");
/// assert_eq!(records[0].log_path(), Path::new("/work/logs/sort.log"));
/// ```
#[derive(Debug)]
pub struct LogScanner<'a> {
    lines: Peekable<Lines<'a>>,
    base_dir: PathBuf,
}

impl<'a> LogScanner<'a> {
    /// Creates a scanner over `log_text` resolving paths against `base_dir`.
    #[must_use]
    pub fn new(log_text: &'a str, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            lines: log_text.lines().peekable(),
            base_dir: base_dir.into(),
        }
    }

    /// Creates a scanner resolving paths against the process working directory.
    ///
    /// # Errors
    /// Returns [`ScanError::WorkingDir`] when the working directory cannot be
    /// determined.
    pub fn in_working_dir(log_text: &'a str) -> Result<Self, ScanError> {
        let base_dir = env::current_dir().map_err(|source| ScanError::WorkingDir { source })?;
        Ok(Self::new(log_text, base_dir))
    }

    /// Advances to the `log:` line of the current block, stopping before the
    /// next rule marker.
    fn next_log_path(&mut self) -> Option<&'a str> {
        while let Some(line) = self
            .lines
            .next_if(|line| !line.starts_with(RULE_ERROR_PREFIX))
        {
            if let Some(rest) = line.strip_prefix(LOG_PREFIX) {
                return Some(parse_log_path(rest));
            }
        }
        None
    }
}

impl Iterator for LogScanner<'_> {
    type Item = FailureRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let marker = self
                .lines
                .find(|line| line.starts_with(RULE_ERROR_PREFIX))?;
            let rule_name = parse_rule_name(marker);
            match self.next_log_path() {
                Some(relative) if !relative.is_empty() => {
                    return Some(FailureRecord::new(rule_name, self.base_dir.join(relative)));
                }
                _ => debug!(rule = rule_name, "failed rule has no log file; skipping"),
            }
        }
    }
}

/// Scans `log_text`, resolving log paths against the working directory.
///
/// # Errors
/// Returns [`ScanError::WorkingDir`] when the working directory cannot be
/// determined.
pub fn scan(log_text: &str) -> Result<Vec<FailureRecord>, ScanError> {
    Ok(LogScanner::in_working_dir(log_text)?.collect())
}

/// Reads the execution log at `path` and scans it against the working
/// directory.
///
/// # Errors
/// Returns [`ScanError`] when the log cannot be read or the working directory
/// cannot be determined.
pub fn scan_file(path: &Path) -> Result<Vec<FailureRecord>, ScanError> {
    let text = fs::read_to_string(path).map_err(|source| ScanError::ReadLog {
        path: path.to_path_buf(),
        source,
    })?;
    scan(&text)
}

/// Strips the marker and the trailing delimiter from a rule marker line.
fn parse_rule_name(line: &str) -> &str {
    let name = line
        .trim_end()
        .strip_prefix(RULE_ERROR_PREFIX)
        .unwrap_or_default();
    let mut chars = name.chars();
    chars.next_back();
    chars.as_str()
}

fn parse_log_path(rest: &str) -> &str {
    let rest = rest.trim_end();
    rest.strip_suffix(LOG_SUFFIX).unwrap_or(rest)
}
