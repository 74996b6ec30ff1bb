//! Configuration types.
//!
//! Every section implements [`Default`] with the values of the embedded
//! `defaults.toml`, so a bare `[section]` header in a file still produces a
//! working configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Background writer queue.
    pub writer: WriterSection,
    /// Kotlin metadata and class-file generation.
    pub metadata: MetadataSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// WriterSection
// ---------------------------------------------------------------------------

/// Background writer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSection {
    /// Commands the queue holds before submission blocks.
    pub queue_capacity: usize,
    /// Name of the worker thread.
    pub thread_name: String,
}

impl Default for WriterSection {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            thread_name: "kotlin-dsl-writer".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// MetadataSection
// ---------------------------------------------------------------------------

/// Kotlin metadata generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSection {
    /// Metadata version written to `kotlin.Metadata.mv` and module files.
    pub metadata_version: Vec<i32>,
    /// Bytecode interface version written to `kotlin.Metadata.bv`.
    pub bytecode_version: Vec<i32>,
    /// Package of generated file facades, in dotted form.
    pub package_name: String,
    /// Major version of generated class files (52 = Java 8).
    pub class_file_major: u16,
}

impl Default for MetadataSection {
    fn default() -> Self {
        Self {
            metadata_version: vec![1, 1, 13],
            bytecode_version: vec![1, 0, 3],
            package_name: "org.gradle.kotlin.dsl".to_owned(),
            class_file_major: 52,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, or `"json"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["kdsl_concurrent=trace"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
