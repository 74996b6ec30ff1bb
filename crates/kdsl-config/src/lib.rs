#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for the Kotlin DSL support kernel.
//!
//! # Usage
//!
//! ```rust,no_run
//! use kdsl_config::Config;
//!
//! // defaults → config file → KDSL_* environment variables
//! let config = Config::load(Some(std::path::Path::new("kdsl.toml"))).unwrap();
//! println!("writer queue holds {} commands", config.writer.queue_capacity);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`KDSL_*`)
//! 2. **Config file** passed to [`Config::load`]
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! # Design
//!
//! This crate has **no dependencies on other internal kdsl crates**.
//! Conversion into `WriterOptions`, `MetadataOptions` and `LogConfig` lives
//! behind the `config` feature of the consuming crates.

/// Environment variable overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Layered configuration merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load configuration from defaults, `config_file` and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is unreadable or malformed, an
    /// environment override does not parse, or validation fails.
    pub fn load(config_file: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(config_file, &env::collect_env_vars())
    }

    /// Parse a TOML document layered over the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the document is malformed or fails
    /// validation.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        loader::load_from_str(contents)
    }
}
