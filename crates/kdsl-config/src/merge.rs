//! Deep merge of TOML value trees.
//!
//! Merging operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from an overlay never resets the base value.

/// Recursively merge `overlay` into `base`.
///
/// - Tables merge per key.
/// - Scalars and arrays from the overlay replace the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_scalars_and_keeps_siblings() {
        let mut base = parse("[writer]\nqueue_capacity = 64\nthread_name = \"w\"\n");
        let overlay = parse("[writer]\nqueue_capacity = 8\n");

        deep_merge(&mut base, &overlay);

        assert_eq!(base["writer"]["queue_capacity"].as_integer(), Some(8));
        assert_eq!(base["writer"]["thread_name"].as_str(), Some("w"));
    }

    #[test]
    fn test_overlay_replaces_arrays_wholesale() {
        let mut base = parse("[metadata]\nmetadata_version = [1, 1, 13]\n");
        let overlay = parse("[metadata]\nmetadata_version = [1, 1]\n");

        deep_merge(&mut base, &overlay);

        let version = base["metadata"]["metadata_version"].as_array().unwrap();
        assert_eq!(version.len(), 2);
    }

    #[test]
    fn test_overlay_adds_new_tables() {
        let mut base = parse("[writer]\nqueue_capacity = 64\n");
        let overlay = parse("[logging]\nlevel = \"debug\"\n");

        deep_merge(&mut base, &overlay);

        assert_eq!(base["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(base["writer"]["queue_capacity"].as_integer(), Some(64));
    }
}
