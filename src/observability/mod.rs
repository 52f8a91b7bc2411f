//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! level text + output names
//!     → logging.rs (LogLevel parse, JSON subscriber, reload handle)
//!     → sink.rs (stdout / stderr / append-only file, one lock per record)
//!
//! Consumers:
//!     → tracing macros, once the Logger is installed or scoped
//!     → http::access_log (shares Sink for access-log lines)
//! ```

pub mod logging;
pub mod sink;

pub use logging::{LogLevel, Logger, LoggerFactory, LoggingError};
pub use sink::{Sink, SinkSet};
