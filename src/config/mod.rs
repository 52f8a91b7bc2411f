//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! register(key, default, description)
//!     → store.rs (default layer + declared --key flag)
//!     → flags.rs (clap parse; only values given on the command line)
//!     → loader.rs (locate & parse config.{toml,yaml,yml,json})
//!     → figment merge: defaults < file < flags
//!     → typed getters (coerce.rs)
//! ```
//!
//! # Design Decisions
//! - Reading a key that was never registered panics: it is a programming error
//! - Default values are a closed set of kinds (`ConfigValue`)
//! - A missing or broken config file either panics (strict) or is returned
//!   to the caller (lenient); the caller picks with `LoadMode`
//! - No global state: every `ConfigStore` is independent

mod coerce;
pub mod error;
mod flags;
pub mod loader;
pub mod store;
pub mod value;

pub use error::ConfigError;
pub use loader::FileFormat;
pub use store::{
    ConfigEntry, ConfigStore, InfoDump, LoadMode, ReadOutcome, CONFIG_FILE_KEY,
    SHOW_CONFIG_DEBUG_KEY, SHOW_CONFIG_KEY,
};
pub use value::{ConfigValue, ValueKind};
