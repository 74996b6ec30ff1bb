//! Generation options shared by headers, module files and class files.

use crate::class_writer::{ClassWriter, DEFAULT_CLASS_FILE_MAJOR};
use crate::error::BytecodeResult;
use crate::header::{
    DEFAULT_BYTECODE_VERSION, DEFAULT_METADATA_VERSION, FileFacadeWriter, begin_file_facade_header,
};
use crate::module::{KOTLIN_DSL_PACKAGE, ModuleMetadata};
use crate::names::InternalName;

/// Versions and target package for generated metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOptions {
    /// `kotlin.Metadata.mv` and the module file version.
    pub metadata_version: Vec<i32>,
    /// `kotlin.Metadata.bv`.
    pub bytecode_version: Vec<i32>,
    /// Dotted package of generated facades.
    pub package_name: String,
    /// Class-file major version.
    pub class_file_major: u16,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            metadata_version: DEFAULT_METADATA_VERSION.to_vec(),
            bytecode_version: DEFAULT_BYTECODE_VERSION.to_vec(),
            package_name: KOTLIN_DSL_PACKAGE.to_string(),
            class_file_major: DEFAULT_CLASS_FILE_MAJOR,
        }
    }
}

impl MetadataOptions {
    /// Open a file-facade session with these versions.
    pub fn begin_file_facade_header(&self) -> FileFacadeWriter {
        begin_file_facade_header().with_versions(&self.metadata_version, &self.bytecode_version)
    }

    /// Internal name of facade `simple_name` in the configured package.
    #[must_use]
    pub fn facade_name(&self, simple_name: &str) -> InternalName {
        InternalName::from_package(&self.package_name, simple_name)
    }

    /// Module listing `file_facades` in the configured package.
    #[must_use]
    pub fn module_metadata(&self, file_facades: &[InternalName]) -> ModuleMetadata {
        ModuleMetadata::new()
            .with_version(&self.metadata_version)
            .with_package(self.package_name.clone(), file_facades.to_vec())
    }

    /// Bytes of [`MetadataOptions::module_metadata`].
    #[must_use]
    pub fn module_metadata_bytes_for(&self, file_facades: &[InternalName]) -> Vec<u8> {
        self.module_metadata(file_facades).to_bytes()
    }

    /// A public final class at the configured class-file version.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` does not fit the constant pool.
    pub fn public_class(&self, name: &InternalName) -> BytecodeResult<ClassWriter> {
        Ok(ClassWriter::public_class(name)?.with_major_version(self.class_file_major))
    }
}

#[cfg(feature = "config")]
impl From<&kdsl_config::MetadataSection> for MetadataOptions {
    fn from(section: &kdsl_config::MetadataSection) -> Self {
        Self {
            metadata_version: section.metadata_version.clone(),
            bytecode_version: section.bytecode_version.clone(),
            package_name: section.package_name.clone(),
            class_file_major: section.class_file_major,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_reader::ClassFile;

    #[test]
    fn test_defaults() {
        let options = MetadataOptions::default();
        assert_eq!(options.metadata_version, vec![1, 1, 13]);
        assert_eq!(options.bytecode_version, vec![1, 0, 3]);
        assert_eq!(options.package_name, "org.gradle.kotlin.dsl");
        assert_eq!(options.class_file_major, 52);
    }

    #[test]
    fn test_versions_flow_into_header() {
        let options = MetadataOptions {
            metadata_version: vec![1, 4, 2],
            bytecode_version: vec![1, 0, 3],
            ..MetadataOptions::default()
        };
        let header = options.begin_file_facade_header().close_header();
        assert_eq!(header.metadata_version, vec![1, 4, 2]);
    }

    #[test]
    fn test_module_uses_configured_package_and_version() {
        let options = MetadataOptions {
            metadata_version: vec![1, 4, 2],
            package_name: "com.example.dsl".to_string(),
            ..MetadataOptions::default()
        };
        let facade = options.facade_name("AccessorsKt");
        assert_eq!(facade.as_str(), "com/example/dsl/AccessorsKt");

        let module = ModuleMetadata::parse(&options.module_metadata_bytes_for(&[facade])).unwrap();
        assert_eq!(module.version, vec![1, 4, 2]);
        assert_eq!(module.packages[0].fq_name, "com.example.dsl");
    }

    #[test]
    fn test_public_class_uses_configured_major() {
        let options = MetadataOptions {
            class_file_major: 61,
            ..MetadataOptions::default()
        };
        let bytes = options
            .public_class(&options.facade_name("FooKt"))
            .unwrap()
            .into_bytes()
            .unwrap();
        assert_eq!(ClassFile::parse(&bytes).unwrap().major_version, 61);
    }
}
