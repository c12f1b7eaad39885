//! Logging initialisation for the toolkit CLI.
//!
//! Installs a global `tracing` subscriber once per process, writing either to
//! `stderr` or to a log file, and bridges the `log` facade so crates using
//! either API emit structured events. The level comes from the `--log-level`
//! global option; `RUST_LOG`, when set, refines it except under `--no-log`.

use std::{
    env,
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use clap::ValueEnum;
use thiserror::Error;
use tracing::{level_filters::LevelFilter, subscriber::SetGlobalDefaultError, warn};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Layer, fmt::writer::BoxMakeWriter, layer::SubscriberExt};

const LOG_FORMAT_ENV: &str = "TOOLKIT_LOG_FORMAT";

static STATE: Mutex<LoggingState> = Mutex::new(LoggingState { initialized: false });

struct LoggingState {
    initialized: bool,
}

/// Minimum severity accepted by `--log-level`.
///
/// `Critical` and `Error` share `tracing`'s `ERROR` level; critical events are
/// distinguished by a `severity = "critical"` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Verbose diagnostics.
    #[value(name = "DEBUG")]
    Debug,
    /// Progress messages.
    #[default]
    #[value(name = "INFO")]
    Info,
    /// Recoverable problems.
    #[value(name = "WARNING")]
    Warning,
    /// Failures.
    #[value(name = "ERROR")]
    Error,
    /// Failures that abort the process.
    #[value(name = "CRITICAL")]
    Critical,
}

impl LogLevel {
    /// The `tracing` filter corresponding to this level.
    #[must_use]
    pub const fn filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    level: LogLevel,
    file: Option<PathBuf>,
    overwrite: bool,
    respect_env: bool,
}

impl LoggingConfig {
    /// Logs at `level` and above to `stderr`.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self {
            level,
            file: None,
            overwrite: false,
            respect_env: true,
        }
    }

    /// Logs only errors, to `stderr`, ignoring `RUST_LOG`. Used by `--no-log`.
    #[must_use]
    pub const fn errors_only() -> Self {
        Self {
            level: LogLevel::Error,
            file: None,
            overwrite: false,
            respect_env: false,
        }
    }

    /// Writes to `path` instead of `stderr`, truncating it when `overwrite`
    /// is set and appending otherwise.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, overwrite: bool) -> Self {
        self.file = Some(path.into());
        self.overwrite = overwrite;
        self
    }

    /// Configured minimum level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Configured log file, if any.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// Errors raised while initialising structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Environment variable contained invalid UTF-8 data.
    #[error("environment variable `{name}` contained invalid UTF-8: {source}")]
    InvalidUnicode {
        /// Name of the offending environment variable.
        name: &'static str,
        /// Underlying parse failure.
        #[source]
        source: env::VarError,
    },
    /// Unsupported log format requested via `TOOLKIT_LOG_FORMAT`.
    #[error("unsupported log format `{provided}`; expected `human` or `json`")]
    UnsupportedFormat {
        /// Raw value supplied by the user.
        provided: String,
    },
    /// The log file could not be opened.
    #[error("failed to open log file `{path}`: {source}")]
    OpenLogFile {
        /// Requested log file.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the global tracing subscriber.
    #[error("failed to install tracing subscriber: {source}")]
    InstallFailed {
        /// Error raised by `tracing`.
        #[source]
        source: SetGlobalDefaultError,
    },
}

/// Install global structured logging unless it is already initialised.
///
/// A second call logs a warning and leaves the existing configuration in
/// place. The output format defaults to human-readable text and switches to
/// JSON with `TOOLKIT_LOG_FORMAT=json`.
///
/// # Errors
/// Returns [`LoggingError`] if the format variable is invalid or the log file
/// cannot be opened.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let mut state = STATE.lock().unwrap_or_else(PoisonError::into_inner);
    if state.initialized {
        warn!("Logging already initialized.");
        return Ok(());
    }

    match install_subscriber(config) {
        Ok(()) => {}
        Err(LoggingError::InstallFailed { source }) => report_existing_subscriber(&source),
        Err(err) => return Err(err),
    }
    state.initialized = true;
    Ok(())
}

/// Whether [`init_logging`] has completed in this process.
#[must_use]
pub fn is_initialized() -> bool {
    STATE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .initialized
}

fn install_subscriber(config: &LoggingConfig) -> Result<(), LoggingError> {
    let use_json = match env::var(LOG_FORMAT_ENV) {
        Ok(raw) => parse_log_format(&raw)?,
        Err(env::VarError::NotPresent) => false,
        Err(err @ env::VarError::NotUnicode(_)) => Err(LoggingError::InvalidUnicode {
            name: LOG_FORMAT_ENV,
            source: err,
        })?,
    };

    let writer = match config.file() {
        Some(path) => BoxMakeWriter::new(Mutex::new(open_log_file(path, config.overwrite)?)),
        None => BoxMakeWriter::new(io::stderr),
    };

    let env_filter = build_filter(config, env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(config.file.is_none())
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let fmt_layer = if use_json {
        fmt_layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed()
    } else {
        fmt_layer.boxed()
    };

    // Installing the log bridge is best-effort; if another logger already owns
    // the global slot we keep the existing configuration.
    let _ = LogTracer::init();

    let subscriber = tracing_subscriber::registry().with(env_filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|source| LoggingError::InstallFailed { source })
}

// `RUST_LOG` refines the configured level unless the configuration opts out.
fn build_filter(config: &LoggingConfig, directives: Option<&str>) -> EnvFilter {
    let builder = EnvFilter::builder().with_default_directive(config.level.filter().into());
    match directives.filter(|_| config.respect_env) {
        Some(directives) => builder.parse_lossy(directives),
        None => builder.parse_lossy(""),
    }
}

fn open_log_file(path: &Path, overwrite: bool) -> Result<File, LoggingError> {
    let mut options = OpenOptions::new();
    options.create(true);
    if overwrite {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    options.open(path).map_err(|source| LoggingError::OpenLogFile {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_log_format(raw: &str) -> Result<bool, LoggingError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "human" => Ok(false),
        "json" => Ok(true),
        other => Err(LoggingError::UnsupportedFormat {
            provided: other.to_owned(),
        }),
    }
}

#[expect(
    clippy::print_stderr,
    reason = "Another subscriber owns the global slot, so tracing output would be lost"
)]
fn report_existing_subscriber(source: &SetGlobalDefaultError) {
    eprintln!("structured logging already configured elsewhere: {source}");
}
