//! Rendering of per-rule failure summaries.

use std::path::Path;

use tracing::debug;

use crate::{
    error::ScanError,
    lines::read_lines,
    scanner::{FailureRecord, scan_file},
};

/// Number of trailing lines pulled from each rule log unless told otherwise.
pub const DEFAULT_LINES_PER_LOG: usize = 50;

/// Returns the last `n` lines of the file at `path`.
///
/// All lines are returned when the file is shorter than `n` or when `n` is
/// `None`. Read failures never propagate; they produce a single placeholder
/// line naming the path instead.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use toolkit_core::tail;
///
/// let lines = tail(Path::new("/does/not/exist.log"), Some(5));
/// assert_eq!(
///     lines,
///     vec![">>> Could not open log file for reading: /does/not/exist.log. <<<".to_owned()]
/// );
/// ```
#[must_use]
pub fn tail(path: &Path, n: Option<usize>) -> Vec<String> {
    match read_lines(path) {
        Ok(mut lines) => {
            if let Some(n) = n {
                let excess = lines.len().saturating_sub(n);
                lines.drain(..excess);
            }
            lines
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "rule log unreadable");
            vec![format!(
                ">>> Could not open log file for reading: {}. <<<",
                path.display()
            )]
        }
    }
}

/// Renders a summary block for every record, in discovery order.
///
/// # Examples
/// ```
/// use toolkit_core::{FailureRecord, summarize};
///
/// let records = [FailureRecord::new("sort", "/missing/sort.log")];
/// let summary = summarize(&records, Some(10));
/// assert_eq!(summary[0], "========== Start of Error Info for sort ==========");
/// assert_eq!(summary[1], "Failed rule: sort");
/// assert_eq!(summary[2], "Last 10 lines of log file: /missing/sort.log");
/// assert_eq!(summary.last().map(String::as_str), Some("=========== End of Error Info for sort ==========="));
/// ```
#[must_use]
pub fn summarize(records: &[FailureRecord], lines_per_log: Option<usize>) -> Vec<String> {
    let count = lines_per_log.map_or_else(|| "all".to_owned(), |n| n.to_string());
    let mut summary = Vec::new();
    for record in records {
        let name = record.rule_name();
        summary.push(format!("========== Start of Error Info for {name} =========="));
        summary.push(format!("Failed rule: {name}"));
        summary.push(format!(
            "Last {count} lines of log file: {}",
            record.log_path().display()
        ));
        summary.extend(
            tail(record.log_path(), lines_per_log)
                .into_iter()
                .map(|line| format!("    {line}")),
        );
        summary.push(format!("=========== End of Error Info for {name} ==========="));
    }
    summary
}

/// Scans the execution log at `path` and summarises every failed rule.
///
/// # Errors
/// Returns [`ScanError`] when the execution log cannot be read or the working
/// directory cannot be resolved.
pub fn summarize_log(
    path: &Path,
    lines_per_log: Option<usize>,
) -> Result<Vec<String>, ScanError> {
    let records = scan_file(path)?;
    Ok(summarize(&records, lines_per_log))
}
