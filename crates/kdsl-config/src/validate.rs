//! Configuration validation rules.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Lowest class-file major version the generator can emit (Java 1.1).
const MIN_CLASS_FILE_MAJOR: u16 = 45;

/// Largest writer queue accepted; each slot reserves channel capacity up front.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns the first [`ConfigError::ValidationError`] found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    if config.writer.queue_capacity == 0 {
        return Err(invalid("writer.queue_capacity", "must be greater than zero"));
    }
    if config.writer.queue_capacity > MAX_QUEUE_CAPACITY {
        return Err(invalid(
            "writer.queue_capacity",
            format!("must not exceed {MAX_QUEUE_CAPACITY}"),
        ));
    }
    if config.writer.thread_name.trim().is_empty() {
        return Err(invalid("writer.thread_name", "must not be empty"));
    }

    validate_version("metadata.metadata_version", &config.metadata.metadata_version)?;
    validate_version("metadata.bytecode_version", &config.metadata.bytecode_version)?;

    let package = &config.metadata.package_name;
    if package.is_empty() || package.split('.').any(str::is_empty) {
        return Err(invalid(
            "metadata.package_name",
            format!("'{package}' is not a dotted package name"),
        ));
    }
    if package.contains('/') {
        return Err(invalid(
            "metadata.package_name",
            "use '.' as separator, not '/'",
        ));
    }

    if config.metadata.class_file_major < MIN_CLASS_FILE_MAJOR {
        return Err(invalid(
            "metadata.class_file_major",
            format!("must be at least {MIN_CLASS_FILE_MAJOR}"),
        ));
    }

    if !matches!(config.logging.format.as_str(), "pretty" | "compact" | "json") {
        return Err(invalid(
            "logging.format",
            format!("unknown format '{}'", config.logging.format),
        ));
    }

    Ok(())
}

fn validate_version(field: &str, version: &[i32]) -> ConfigResult<()> {
    if version.len() < 3 {
        return Err(invalid(field, "needs major, minor and patch components"));
    }
    if version.iter().any(|part| *part < 0) {
        return Err(invalid(field, "components must not be negative"));
    }
    Ok(())
}
