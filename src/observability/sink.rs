//! Log sinks: standard streams or append-only files.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;

use crate::observability::logging::LoggingError;

/// Sink name for standard output.
pub const STDOUT: &str = "stdout";
/// Sink name for standard error.
pub const STDERR: &str = "stderr";

enum Target {
    Stdout,
    Stderr,
    File(RollingFileAppender),
}

/// A named, shareable log destination.
///
/// Each record is written under a mutex, so concurrent writers never
/// interleave within a line.
#[derive(Clone)]
pub struct Sink {
    name: String,
    target: Arc<Mutex<Target>>,
}

impl Sink {
    /// Resolve `stdout`, `stderr`, or open a file for create-or-append.
    pub fn open(name: &str) -> Result<Self, LoggingError> {
        let target = match name {
            STDOUT => Target::Stdout,
            STDERR => Target::Stderr,
            path => Target::File(open_append(name, Path::new(path))?),
        };

        Ok(Self {
            name: name.to_string(),
            target: Arc::new(Mutex::new(target)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write one complete record and flush it.
    pub fn write_record(&self, record: &[u8]) -> io::Result<()> {
        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *target {
            Target::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(record)?;
                out.flush()
            }
            Target::Stderr => {
                let mut out = io::stderr().lock();
                out.write_all(record)?;
                out.flush()
            }
            Target::File(file) => {
                file.write_all(record)?;
                file.flush()
            }
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("name", &self.name).finish()
    }
}

fn open_append(name: &str, path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::Sink {
            name: name.to_string(),
            reason: "path does not name a file".to_string(),
        })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|err| LoggingError::Sink {
            name: name.to_string(),
            reason: err.to_string(),
        })
}

/// Every sink a logger writes to, as a `MakeWriter`.
#[derive(Clone, Debug)]
pub struct SinkSet {
    sinks: Vec<Sink>,
}

impl SinkSet {
    pub fn new(sinks: Vec<Sink>) -> Self {
        Self { sinks }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sinks.iter().map(Sink::name)
    }
}

/// Writer handed to the formatter for a single record.
pub struct SinkSetWriter<'a> {
    sinks: &'a [Sink],
}

impl io::Write for SinkSetWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in self.sinks {
            sink.write_record(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SinkSet {
    type Writer = SinkSetWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkSetWriter { sinks: &self.sinks }
    }
}
