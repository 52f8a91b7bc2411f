//! Structured logging.
//!
//! # Responsibilities
//! - Parse the log level from configuration text
//! - Build a JSON `tracing` subscriber writing to one or more sinks
//! - Adjust the level at runtime through a reload handle
//!
//! # Design Decisions
//! - The logger is a value (`Logger`); installing it globally is the caller's call
//! - Unparsable level text and unopenable sinks are startup errors

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{reload, Registry};

use crate::observability::sink::{Sink, SinkSet, STDERR};

/// Logging error types.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level `{0}`: expected one of trace, debug, info, warn, error")]
    InvalidLevel(String),

    #[error("cannot open log sink `{name}`: {reason}")]
    Sink { name: String, reason: String },

    #[error("cannot change log level: {0}")]
    Reload(#[from] reload::Error),

    #[error("a global logger is already installed")]
    AlreadyInstalled(#[from] tracing::dispatcher::SetGlobalDefaultError),
}

/// Minimum severity a logger emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// A built logger: a JSON subscriber over a set of sinks.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
    level: reload::Handle<LevelFilter, Registry>,
    sinks: SinkSet,
}

impl Logger {
    /// The subscriber, for `tracing::dispatcher::with_default` and friends.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Make this logger the process-wide default.
    pub fn install_global(&self) -> Result<(), LoggingError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())?;
        Ok(())
    }

    /// Run `f` with this logger as the current thread's default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    pub fn set_level(&self, level: LogLevel) -> Result<(), LoggingError> {
        self.level.modify(|filter| *filter = level.into())?;
        Ok(())
    }

    pub fn level(&self) -> LevelFilter {
        self.level.clone_current().unwrap_or(LevelFilter::OFF)
    }

    pub fn sink_names(&self) -> impl Iterator<Item = &str> {
        self.sinks.names()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("sinks", &self.sinks)
            .finish()
    }
}

/// Builds [`Logger`]s with the production preset: JSON records with
/// timestamp, level, target and message fields.
pub struct LoggerFactory;

impl LoggerFactory {
    /// Build a logger at `level` writing to every output.
    ///
    /// Outputs are `stdout`, `stderr` or file paths; none means `stderr`.
    ///
    /// # Panics
    /// If the level text is invalid or a sink cannot be opened.
    pub fn new_logger<O: AsRef<str>>(level: &str, outputs: &[O]) -> Logger {
        match Self::try_new_logger(level, outputs) {
            Ok(logger) => logger,
            Err(err) => panic!("failed to build logger: {}", err),
        }
    }

    pub fn try_new_logger<O: AsRef<str>>(level: &str, outputs: &[O]) -> Result<Logger, LoggingError> {
        let level: LogLevel = level.parse()?;

        let sinks = if outputs.is_empty() {
            vec![Sink::open(STDERR)?]
        } else {
            outputs
                .iter()
                .map(|name| Sink::open(name.as_ref()))
                .collect::<Result<Vec<_>, _>>()?
        };
        let sinks = SinkSet::new(sinks);

        let (filter, handle) = reload::Layer::new(LevelFilter::from(level));
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(sinks.clone())
            .with_ansi(false)
            .with_target(true)
            .with_current_span(true);

        let subscriber = tracing_subscriber::registry().with(filter).with(json_layer);

        Ok(Logger {
            dispatch: Dispatch::new(subscriber),
            level: handle,
            sinks,
        })
    }
}
