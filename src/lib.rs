//! Startup glue for command-line services: layered configuration,
//! structured logging and HTTP access logging.

pub mod config;
pub mod http;
pub mod observability;

pub use config::{ConfigError, ConfigStore, ConfigValue, InfoDump, LoadMode, ReadOutcome};
pub use http::AccessLog;
pub use observability::{LogLevel, Logger, LoggerFactory, LoggingError, Sink};
