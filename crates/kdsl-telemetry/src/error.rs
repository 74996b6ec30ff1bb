//! Telemetry error types.

use thiserror::Error;

/// Errors raised while configuring or installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level, a directive or the format is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A global subscriber is already installed.
    #[error("Initialization error: {0}")]
    InitError(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
