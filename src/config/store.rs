//! The configuration store: registered keys, flags, config file and typed reads.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use figment::providers::Serialized;
use figment::Figment;
use serde_json::Value;

use crate::config::coerce;
use crate::config::error::ConfigError;
use crate::config::flags;
use crate::config::loader::{self, LoadedFile};
use crate::config::value::ConfigValue;

/// Built-in flag: print the merged configuration after loading.
pub const SHOW_CONFIG_KEY: &str = "show-config";
/// Built-in flag: print the resolution trail and merged configuration.
pub const SHOW_CONFIG_DEBUG_KEY: &str = "show-config-debug";
/// Built-in flag: exact config file path, bypassing the search.
pub const CONFIG_FILE_KEY: &str = "config-file";

const DEFAULT_CONFIG_NAME: &str = "config";

/// A registered key.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub key: String,
    pub default: ConfigValue,
    pub description: String,
}

/// What `read_config` does when the file cannot be found, read or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Panic with the load error.
    #[default]
    Strict,
    /// Return the load error; defaults and flags stay readable.
    Lenient,
}

/// What happens after `--show-config` or `--show-config-debug` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoDump {
    /// Terminate the process with this status.
    Exit(i32),
    /// Return [`ReadOutcome::Dumped`] to the caller.
    Return,
}

impl Default for InfoDump {
    fn default() -> Self {
        InfoDump::Exit(1)
    }
}

/// Result of a successful `read_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Loaded,
    /// An info-dump flag was set and its output was printed.
    Dumped,
}

/// Key/value store merging registered defaults, a config file and
/// command-line flags (in increasing precedence).
///
/// Keys are case-insensitive and stored lower-cased. They must be registered
/// before they can be read; reading an unknown key is a programming error and
/// panics.
#[derive(Debug)]
pub struct ConfigStore {
    entries: Vec<ConfigEntry>,
    config_name: String,
    search_paths: Vec<PathBuf>,
    flag_values: Vec<(String, ConfigValue)>,
    file: Option<LoadedFile>,
    flags_bound: bool,
    load_mode: LoadMode,
    info_dump: InfoDump,
    merged: Figment,
}

impl ConfigStore {
    /// Create a store that searches the working directory for `config.*`.
    pub fn new() -> Self {
        let mut store = Self {
            entries: Vec::new(),
            config_name: DEFAULT_CONFIG_NAME.to_string(),
            search_paths: vec![PathBuf::from(".")],
            flag_values: Vec::new(),
            file: None,
            flags_bound: false,
            load_mode: LoadMode::default(),
            info_dump: InfoDump::default(),
            merged: Figment::new(),
        };

        store.register(SHOW_CONFIG_KEY, false, "prints the configuration");
        store.register(
            SHOW_CONFIG_DEBUG_KEY,
            false,
            "prints the configuration with resolution steps",
        );
        store.register(CONFIG_FILE_KEY, "", "configuration file to use");
        store
    }

    pub fn with_load_mode(mut self, mode: LoadMode) -> Self {
        self.load_mode = mode;
        self
    }

    pub fn with_info_dump(mut self, info_dump: InfoDump) -> Self {
        self.info_dump = info_dump;
        self
    }

    /// Register `key` with its default and declare `--key` for it.
    ///
    /// # Panics
    /// If the key is already registered or flags have already been bound.
    pub fn register(&mut self, key: &str, default: impl Into<ConfigValue>, description: &str) {
        let key = fold_key(key);
        if self.flags_bound {
            panic!("cannot register configuration key `{}` after flags were bound", key);
        }
        if self.is_registered(&key) {
            panic!("configuration key `{}` is already registered", key);
        }

        self.entries.push(ConfigEntry {
            key,
            default: default.into(),
            description: description.to_string(),
        });
        self.rebuild();
    }

    /// Register a key whose default is only known as a JSON value.
    ///
    /// Null, arrays and objects are rejected here rather than at read time.
    pub fn try_register(
        &mut self,
        key: &str,
        default: &Value,
        description: &str,
    ) -> Result<(), ConfigError> {
        let value = ConfigValue::from_json(default).ok_or_else(|| ConfigError::UnsupportedDefault {
            key: key.to_string(),
            value: default.to_string(),
        })?;
        self.register(key, value, description);
        Ok(())
    }

    /// Base name of the config file, without extension.
    pub fn set_config_name(&mut self, name: &str) {
        self.config_name = name.to_string();
    }

    /// Directories searched after the working directory, in order.
    pub fn add_search_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.search_paths
            .extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
    }

    /// Parse the process arguments into the registered flags.
    ///
    /// Invalid arguments and `--help` are handled by clap, which prints and
    /// exits.
    pub fn bind_flags(&mut self) {
        let matches = flags::command(&self.entries).get_matches();
        self.apply_flags(&matches);
    }

    /// Parse an explicit argument list; the first item is the program name.
    pub fn try_bind_flags_from<I, T>(&mut self, args: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = flags::command(&self.entries).try_get_matches_from(args)?;
        self.apply_flags(&matches);
        Ok(())
    }

    fn apply_flags(&mut self, matches: &clap::ArgMatches) {
        self.flag_values = self
            .entries
            .iter()
            .filter_map(|entry| {
                flags::command_line_value(matches, entry).map(|value| (entry.key.clone(), value))
            })
            .collect();
        self.flags_bound = true;
        self.rebuild();

        tracing::debug!(count = self.flag_values.len(), "Command-line flags bound");
    }

    /// Load the config file into the merged table.
    ///
    /// With flags bound and a non-empty `--config-file`, that exact path is
    /// loaded. Otherwise `<name>.<ext>` is searched across the search paths.
    ///
    /// # Panics
    /// In [`LoadMode::Strict`] when the file cannot be found, read or parsed.
    pub fn read_config(&mut self) -> Result<ReadOutcome, ConfigError> {
        match self.load() {
            Ok(()) => Ok(self.handle_info_flags()),
            Err(err) => match self.load_mode {
                LoadMode::Strict => panic!("failed to read configuration: {}", err),
                LoadMode::Lenient => {
                    tracing::warn!(error = %err, "Config file not loaded");
                    Err(err)
                }
            },
        }
    }

    fn load(&mut self) -> Result<(), ConfigError> {
        let explicit = if self.flags_bound {
            Some(self.get_string(CONFIG_FILE_KEY)).filter(|path| !path.is_empty())
        } else {
            None
        };

        let path = match explicit {
            Some(path) => PathBuf::from(path),
            None => loader::locate(&self.config_name, &self.search_paths)?,
        };

        let file = loader::load_file(&path)?;
        tracing::info!(path = %file.path.display(), format = ?file.format, "Config file loaded");

        self.file = Some(file);
        self.rebuild();
        Ok(())
    }

    /// Run the `show-config` / `show-config-debug` actions if requested.
    ///
    /// Called by `read_config` on success. A caller using lenient loading can
    /// call it after handling a load error.
    pub fn handle_info_flags(&self) -> ReadOutcome {
        let dumped = if self.get_bool(SHOW_CONFIG_KEY) {
            self.print_config();
            true
        } else if self.get_bool(SHOW_CONFIG_DEBUG_KEY) {
            self.print_debug_config();
            true
        } else {
            false
        };

        if !dumped {
            return ReadOutcome::Loaded;
        }
        match self.info_dump {
            InfoDump::Exit(code) => std::process::exit(code),
            InfoDump::Return => ReadOutcome::Dumped,
        }
    }

    pub fn get_string(&self, key: &str) -> String {
        coerce::to_string(&self.lookup(key))
    }

    pub fn get_int(&self, key: &str) -> i32 {
        coerce::to_i32(&self.lookup(key))
    }

    pub fn get_int64(&self, key: &str) -> i64 {
        coerce::to_i64(&self.lookup(key))
    }

    pub fn get_uint64(&self, key: &str) -> u64 {
        coerce::to_u64(&self.lookup(key))
    }

    pub fn get_bool(&self, key: &str) -> bool {
        coerce::to_bool(&self.lookup(key))
    }

    pub fn get_float64(&self, key: &str) -> f64 {
        coerce::to_f64(&self.lookup(key))
    }

    pub fn is_registered(&self, key: &str) -> bool {
        let key = fold_key(key);
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Registered keys, in registration order.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    /// Path of the loaded config file, if any.
    pub fn config_file(&self) -> Option<&Path> {
        self.file.as_ref().map(|file| file.path.as_path())
    }

    /// The merged table as a JSON object.
    pub fn all_settings(&self) -> Value {
        self.merged
            .extract::<Value>()
            .unwrap_or_else(|_| Value::Object(Default::default()))
    }

    /// Write the merged table as indented JSON.
    pub fn write_config(&self, out: &mut impl Write) -> io::Result<()> {
        let encoded = serde_json::to_string_pretty(&self.all_settings())?;
        writeln!(out, "{}", encoded)
    }

    /// Write which layer supplied each key, then the merged table.
    pub fn write_debug_config(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Resolution:")?;
        for entry in &self.entries {
            writeln!(out, "  {}:", entry.key)?;
            writeln!(out, "    default = {}", entry.default.to_json())?;

            let from_file = self.file.as_ref().and_then(|file| {
                file.find(&entry.key)
                    .map(|value| (value, file.path.display().to_string()))
            });
            if let Some((value, path)) = &from_file {
                writeln!(out, "    file    = {} ({})", value, path)?;
            }

            let from_flag = self.flag_value(&entry.key);
            if let Some(value) = from_flag {
                writeln!(out, "    flag    = {}", value.to_json())?;
            }

            let layer = if from_flag.is_some() {
                "flag"
            } else if from_file.is_some() {
                "file"
            } else {
                "default"
            };
            writeln!(out, "    resolved from {}", layer)?;
        }

        writeln!(out, "Merged configuration:")?;
        self.write_config(out)
    }

    pub fn print_config(&self) {
        if let Err(err) = self.write_config(&mut io::stdout().lock()) {
            tracing::warn!(error = %err, "Failed to print configuration");
        }
    }

    pub fn print_debug_config(&self) {
        if let Err(err) = self.write_debug_config(&mut io::stdout().lock()) {
            tracing::warn!(error = %err, "Failed to print configuration");
        }
    }

    fn flag_value(&self, key: &str) -> Option<&ConfigValue> {
        self.flag_values
            .iter()
            .find(|(flag_key, _)| flag_key == key)
            .map(|(_, value)| value)
    }

    fn lookup(&self, key: &str) -> Value {
        if !self.is_registered(key) {
            panic!("configuration key `{}` has not been registered", key);
        }
        self.merged
            .extract_inner::<Value>(&fold_key(key))
            .unwrap_or(Value::Null)
    }

    fn rebuild(&mut self) {
        let mut merged = Figment::new();
        for entry in &self.entries {
            merged = merged.merge(Serialized::default(&entry.key, entry.default.clone()));
        }
        if let Some(file) = &self.file {
            merged = merged.merge(Serialized::defaults(file.values.clone()));
        }
        for (key, value) in &self.flag_values {
            merged = merged.merge(Serialized::default(key, value.clone()));
        }
        self.merged = merged;
    }
}

fn fold_key(key: &str) -> String {
    key.to_lowercase()
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
