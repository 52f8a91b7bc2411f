//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from registering, parsing flags and loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported default for key `{key}`: {value} (expected int, int64, uint64, string, float64 or bool)")]
    UnsupportedDefault { key: String, value: String },

    #[error("config file `{name}` not found in {}", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("unsupported config file format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },

    #[error("invalid command-line flags: {0}")]
    Flags(#[from] clap::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    let shown: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    format!("[{}]", shown.join(", "))
}
