//! Error types for the diagnostics library.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while locating or reading an execution log.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The process working directory could not be resolved.
    #[error("failed to resolve the working directory: {source}")]
    WorkingDir {
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The execution log could not be read.
    #[error("failed to read execution log `{path}`: {source}")]
    ReadLog {
        /// Path of the execution log.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
}

/// Errors raised while assembling or persisting an error report.
///
/// These never escape [`crate::on_failure`]; they surface only through the
/// fallible [`crate::ErrorReportWriter::write`] entry point.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Scanning the execution log failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// The summary artifact could not be written.
    #[error("failed to write error summary `{path}`: {source}")]
    WriteSummary {
        /// Destination of the summary artifact.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
}
