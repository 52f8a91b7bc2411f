//! Config file discovery and parsing.

use std::fs;
use std::path::{Path, PathBuf};

use figment::providers::{Format, Json, Toml, Yaml};
use figment::Figment;
use serde_json::{Map, Value};

use crate::config::error::ConfigError;

/// Extensions tried, in order, for every search path.
pub const EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// File formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(FileFormat::Toml),
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }

    fn parse(self, content: &str) -> Result<Map<String, Value>, figment::Error> {
        let figment = match self {
            FileFormat::Toml => Figment::from(Toml::string(content)),
            FileFormat::Yaml => Figment::from(Yaml::string(content)),
            FileFormat::Json => Figment::from(Json::string(content)),
        };
        figment.extract().map(fold_keys)
    }
}

/// Lower-case every key, recursing into nested tables.
fn fold_keys(values: Map<String, Value>) -> Map<String, Value> {
    values
        .into_iter()
        .map(|(key, value)| (key.to_lowercase(), fold_value(value)))
        .collect()
}

fn fold_value(value: Value) -> Value {
    match value {
        Value::Object(table) => Value::Object(fold_keys(table)),
        Value::Array(items) => Value::Array(items.into_iter().map(fold_value).collect()),
        other => other,
    }
}

/// The file layer of the merged table.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub format: FileFormat,
    pub values: Map<String, Value>,
}

impl LoadedFile {
    /// Look up a key, first verbatim, then as a dotted path into nested tables.
    /// Matching ignores case.
    pub fn find(&self, key: &str) -> Option<&Value> {
        let key = key.to_lowercase();
        if let Some(value) = self.values.get(&key) {
            return Some(value);
        }

        let mut segments = key.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// Find `<dir>/<name>.<ext>` across the search paths.
///
/// Directories are tried in the order given, extensions in [`EXTENSIONS`]
/// order; the first existing file wins.
pub fn locate(name: &str, search_paths: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    let mut searched = Vec::with_capacity(search_paths.len() * EXTENSIONS.len());
    for dir in search_paths {
        for ext in EXTENSIONS {
            let candidate = dir.join(format!("{}.{}", name, ext));
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(candidate);
        }
    }

    Err(ConfigError::NotFound {
        name: name.to_string(),
        searched,
    })
}

/// Read and parse a config file.
pub fn load_file(path: &Path) -> Result<LoadedFile, ConfigError> {
    let format = FileFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    if !path.is_file() {
        return Err(ConfigError::NotFound {
            name: path.display().to_string(),
            searched: vec![path.to_path_buf()],
        });
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let values = format.parse(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;

    Ok(LoadedFile {
        path: path.to_path_buf(),
        format,
        values,
    })
}
