//! Config file loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse the embedded `defaults.toml` → base
//! 2. Merge the config file, if one is given
//! 3. Apply `KDSL_*` environment overrides
//! 4. Deserialize the merged tree → `Config`
//! 5. Validate

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::env::apply_env_overrides;
use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Load the configuration from defaults, an optional file and `env_vars`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, an
/// environment override is malformed, or the merged configuration fails
/// validation.
pub fn load<S: ::std::hash::BuildHasher>(
    config_file: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    let mut merged = parse_toml(DEFAULTS_TOML, "<embedded defaults>")?;

    if let Some(path) = config_file {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        let overlay = parse_toml(&contents, &path.display().to_string())?;
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded config file");
    }

    apply_env_overrides(&mut merged, env_vars)?;

    let config = deserialize(merged)?;
    validate::validate(&config)?;
    debug!(?config, "configuration resolved");
    Ok(config)
}

/// Parse a TOML document on top of the embedded defaults, without
/// environment overrides.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the document is malformed or the result fails
/// validation.
pub fn load_from_str(contents: &str) -> ConfigResult<Config> {
    let mut merged = parse_toml(DEFAULTS_TOML, "<embedded defaults>")?;
    let overlay = parse_toml(contents, "<string>")?;
    deep_merge(&mut merged, &overlay);

    let config = deserialize(merged)?;
    validate::validate(&config)?;
    Ok(config)
}

fn parse_toml(contents: &str, origin: &str) -> ConfigResult<toml::Value> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseError {
        path: origin.to_owned(),
        source,
    })
}

fn deserialize(merged: toml::Value) -> ConfigResult<Config> {
    merged
        .try_into()
        .map_err(|source| ConfigError::ParseError {
            path: "<merged configuration>".to_owned(),
            source,
        })
}
