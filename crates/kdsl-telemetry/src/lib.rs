//! Kotlin DSL Telemetry - logging setup for the support kernel.
//!
//! This crate provides:
//! - [`LogConfig`] with pretty, compact and JSON formats
//! - Per-crate directive overrides on top of a global level
//! - Conversion from the `[logging]` config section (feature `config`)
//!
//! # Example
//!
//! ```rust,no_run
//! use kdsl_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), kdsl_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("kdsl_concurrent=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("writer ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
