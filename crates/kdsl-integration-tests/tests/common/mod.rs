//! Shared fixtures for integration tests.

use std::path::{Path, PathBuf};

use kdsl_bytecode::prelude::*;
use kdsl_config::Config;
use tempfile::TempDir;

/// An output directory plus the configuration the generators run with.
///
/// The directory is removed when the fixture is dropped.
#[allow(dead_code)]
pub struct OutputFixture {
    /// Resolved configuration.
    pub config: Config,
    /// Metadata options derived from `config`.
    pub options: MetadataOptions,
    dir: TempDir,
}

#[allow(dead_code)]
impl OutputFixture {
    /// Fixture with the embedded default configuration.
    pub fn new() -> Self {
        Self::from_toml("")
    }

    /// Fixture configured by a TOML overlay.
    pub fn from_toml(overlay: &str) -> Self {
        let config = Config::from_toml_str(overlay).expect("invalid test config");
        let options = MetadataOptions::from(&config.metadata);
        Self {
            config,
            options,
            dir: TempDir::new().expect("failed to create tempdir"),
        }
    }

    /// Root of the output directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Where the class file of `name` lives under the output root.
    pub fn class_path(&self, name: &InternalName) -> PathBuf {
        self.root().join(format!("{}.class", name.as_str()))
    }
}

/// `Project` receiver type.
#[allow(dead_code)]
pub fn project_type() -> KmType {
    KmType::class("org/gradle/api/Project")
}

/// Header of a facade exposing one extension property `name` of type
/// `kotlin.String` on `Project`.
#[allow(dead_code)]
pub fn string_property_header(options: &MetadataOptions, name: &str) -> MetadataHeader {
    let mut facade = options.begin_file_facade_header();
    facade.write_property_of(
        project_type(),
        KmType::class("kotlin/String"),
        name,
        jvm_getter_signature_for(name, "(Lorg/gradle/api/Project;)Ljava/lang/String;"),
    );
    facade.close_header()
}
