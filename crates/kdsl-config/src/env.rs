//! Environment variable overrides.
//!
//! `KDSL_*` variables override whatever the defaults and the config file
//! set. Values are coerced to the field's TOML type.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: FieldKind,
}

#[derive(Clone, Copy)]
enum FieldKind {
    Integer,
    String,
}

/// All supported `KDSL_*` mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "KDSL_WRITER_QUEUE_CAPACITY",
        field_path: "writer.queue_capacity",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "KDSL_WRITER_THREAD_NAME",
        field_path: "writer.thread_name",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "KDSL_METADATA_PACKAGE",
        field_path: "metadata.package_name",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "KDSL_CLASS_FILE_MAJOR",
        field_path: "metadata.class_file_major",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "KDSL_LOG_LEVEL",
        field_path: "logging.level",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "KDSL_LOG_FORMAT",
        field_path: "logging.format",
        kind: FieldKind::String,
    },
];

/// Apply every mapped variable present in `env_vars` to the config tree.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] when a numeric variable does not parse.
pub fn apply_env_overrides<S: ::std::hash::BuildHasher>(
    root: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<()> {
    for mapping in ENV_MAPPINGS {
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let value = match mapping.kind {
            FieldKind::Integer => {
                let parsed = raw.trim().parse::<i64>().map_err(|e| ConfigError::EnvError {
                    var_name: mapping.var_name.to_owned(),
                    message: format!("expected an integer: {e}"),
                })?;
                toml::Value::Integer(parsed)
            },
            FieldKind::String => toml::Value::String(raw.clone()),
        };

        debug!(var = mapping.var_name, field = mapping.field_path, "applying env override");
        set_field(root, mapping.field_path, value);
    }
    Ok(())
}

/// Set a dotted-path field in the TOML tree, creating tables as needed.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let Some((parents, leaf)) = path.rsplit_once('.') else {
        if let Some(table) = root.as_table_mut() {
            table.insert(path.to_owned(), value);
        }
        return;
    };

    let mut current = root;
    for segment in parents.split('.') {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
