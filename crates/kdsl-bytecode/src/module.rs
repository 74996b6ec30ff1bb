//! `.kotlin_module` files: the per-module index of file facades.
//!
//! Layout: a big-endian `i32` count, that many big-endian `i32` version
//! components, then a `Module` protobuf message.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::cursor::ByteCursor;
use crate::error::{BytecodeError, BytecodeResult};
use crate::header::DEFAULT_METADATA_VERSION;
use crate::names::InternalName;
use crate::wire::{ProtoReader, ProtoWriter};

/// Package of the generated Kotlin DSL accessors.
pub const KOTLIN_DSL_PACKAGE: &str = "org.gradle.kotlin.dsl";

// Module
const MODULE_PACKAGE_PARTS: u32 = 1;
const MODULE_JVM_PACKAGE_NAME: u32 = 3;

// PackageParts
const PARTS_PACKAGE_FQ_NAME: u32 = 1;
const PARTS_SHORT_CLASS_NAME: u32 = 2;
const PARTS_CLASS_WITH_JVM_PACKAGE_NAME_SHORT_NAME: u32 = 5;
const PARTS_CLASS_WITH_JVM_PACKAGE_NAME_PACKAGE_ID: u32 = 6;

/// Version arrays longer than this are rejected when reading.
const MAX_VERSION_COMPONENTS: usize = 1024;

/// File facades of one Kotlin package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageParts {
    /// Dotted package name (`org.gradle.kotlin.dsl`).
    pub fq_name: String,
    /// Facade classes in declaration order.
    pub file_facades: Vec<InternalName>,
}

/// Contents of a `.kotlin_module` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMetadata {
    /// Metadata version of the module file.
    pub version: Vec<i32>,
    /// Packages and their facades.
    pub packages: Vec<PackageParts>,
}

impl Default for ModuleMetadata {
    fn default() -> Self {
        Self {
            version: DEFAULT_METADATA_VERSION.to_vec(),
            packages: Vec::new(),
        }
    }
}

impl ModuleMetadata {
    /// Empty module with the default version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the version.
    #[must_use]
    pub fn with_version(mut self, version: &[i32]) -> Self {
        self.version = version.to_vec();
        self
    }

    /// Add a package with its facades.
    #[must_use]
    pub fn with_package(mut self, fq_name: impl Into<String>, file_facades: Vec<InternalName>) -> Self {
        self.packages.push(PackageParts {
            fq_name: fq_name.into(),
            file_facades,
        });
        self
    }

    /// Serialise to `.kotlin_module` bytes.
    ///
    /// Packages without facades are omitted. Facades outside their package's
    /// JVM directory are recorded against an explicit JVM package name.
    ///
    /// Facades keep caller order and every JVM package id is written. kotlinc
    /// sorts parts and trims trailing duplicate ids, so bytes can differ from
    /// its output while reading back to the same parts.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut module = ProtoWriter::new();
        let mut jvm_package_names: Vec<String> = Vec::new();

        for package in &self.packages {
            if package.file_facades.is_empty() {
                continue;
            }
            let internal_package = package.fq_name.replace('.', "/");
            let mut parts = ProtoWriter::new();
            parts.string(PARTS_PACKAGE_FQ_NAME, &package.fq_name);

            let mut outside = Vec::new();
            for facade in &package.file_facades {
                if facade.package() == internal_package {
                    parts.string(PARTS_SHORT_CLASS_NAME, facade.simple_name());
                } else {
                    outside.push(facade);
                }
            }

            let mut package_ids = Vec::with_capacity(outside.len());
            for facade in &outside {
                let jvm_package = facade.package().replace('/', ".");
                let id = match jvm_package_names.iter().position(|p| *p == jvm_package) {
                    Some(id) => id,
                    None => {
                        jvm_package_names.push(jvm_package);
                        jvm_package_names.len().saturating_sub(1)
                    },
                };
                parts.string(PARTS_CLASS_WITH_JVM_PACKAGE_NAME_SHORT_NAME, facade.simple_name());
                package_ids.push(i32::try_from(id).unwrap_or(i32::MAX));
            }
            parts.packed_int32(PARTS_CLASS_WITH_JVM_PACKAGE_NAME_PACKAGE_ID, &package_ids);

            module.message(MODULE_PACKAGE_PARTS, &parts);
        }

        for name in &jvm_package_names {
            module.string(MODULE_JVM_PACKAGE_NAME, name);
        }

        let mut out = Vec::with_capacity(
            self.version
                .len()
                .saturating_add(1)
                .saturating_mul(4)
                .saturating_add(module.as_bytes().len()),
        );
        out.extend_from_slice(&i32::try_from(self.version.len()).unwrap_or(i32::MAX).to_be_bytes());
        for component in &self.version {
            out.extend_from_slice(&component.to_be_bytes());
        }
        out.extend_from_slice(module.as_bytes());
        trace!(packages = self.packages.len(), bytes = out.len(), "serialised module metadata");
        out
    }

    /// Parse `.kotlin_module` bytes.
    ///
    /// Facades inside the package directory come first, then those recorded
    /// against an explicit JVM package name.
    ///
    /// # Errors
    ///
    /// Returns [`BytecodeError::Truncated`] or [`BytecodeError::Malformed`] if
    /// the bytes are not a module file.
    pub fn parse(bytes: &[u8]) -> BytecodeResult<Self> {
        const WHAT: &str = "Module";
        let mut cursor = ByteCursor::new(bytes);
        let count = cursor.i32("module version length")?;
        let count = usize::try_from(count)
            .ok()
            .filter(|c| *c <= MAX_VERSION_COMPONENTS)
            .ok_or_else(|| BytecodeError::malformed(WHAT, format!("bad version length {count}")))?;
        let mut version = Vec::with_capacity(count);
        for _ in 0..count {
            version.push(cursor.i32("module version")?);
        }

        let mut raw_parts = Vec::new();
        let mut jvm_package_names = Vec::new();
        let mut reader = ProtoReader::new(cursor.remaining());
        while let Some((field, value)) = reader.next_field(WHAT)? {
            match field {
                MODULE_PACKAGE_PARTS => raw_parts.push(RawPackageParts::parse(value.as_bytes(WHAT)?)?),
                MODULE_JVM_PACKAGE_NAME => jvm_package_names.push(value.as_string(WHAT)?),
                _ => {},
            }
        }

        let packages = raw_parts
            .into_iter()
            .map(|raw| raw.resolve(&jvm_package_names))
            .collect::<BytecodeResult<Vec<_>>>()?;

        Ok(Self { version, packages })
    }
}

struct RawPackageParts {
    fq_name: String,
    short_names: Vec<String>,
    outside_names: Vec<String>,
    outside_package_ids: Vec<i32>,
}

impl RawPackageParts {
    fn parse(bytes: &[u8]) -> BytecodeResult<Self> {
        const WHAT: &str = "PackageParts";
        let mut raw = Self {
            fq_name: String::new(),
            short_names: Vec::new(),
            outside_names: Vec::new(),
            outside_package_ids: Vec::new(),
        };
        let mut reader = ProtoReader::new(bytes);
        while let Some((field, value)) = reader.next_field(WHAT)? {
            match field {
                PARTS_PACKAGE_FQ_NAME => raw.fq_name = value.as_string(WHAT)?,
                PARTS_SHORT_CLASS_NAME => raw.short_names.push(value.as_string(WHAT)?),
                PARTS_CLASS_WITH_JVM_PACKAGE_NAME_SHORT_NAME => {
                    raw.outside_names.push(value.as_string(WHAT)?);
                },
                PARTS_CLASS_WITH_JVM_PACKAGE_NAME_PACKAGE_ID => {
                    value.push_int32s(&mut raw.outside_package_ids, WHAT)?;
                },
                _ => {},
            }
        }
        Ok(raw)
    }

    fn resolve(self, jvm_package_names: &[String]) -> BytecodeResult<PackageParts> {
        let mut file_facades: Vec<InternalName> = self
            .short_names
            .iter()
            .map(|short| InternalName::from_package(&self.fq_name, short))
            .collect();

        // A shorter id list repeats its last id for the remaining names.
        let mut last_id = None;
        for (i, short) in self.outside_names.iter().enumerate() {
            let id = self.outside_package_ids.get(i).copied().or(last_id).ok_or_else(|| {
                BytecodeError::malformed("PackageParts", "missing JVM package id")
            })?;
            last_id = Some(id);
            let package = usize::try_from(id)
                .ok()
                .and_then(|id| jvm_package_names.get(id))
                .ok_or_else(|| {
                    BytecodeError::malformed("PackageParts", format!("JVM package id {id} out of range"))
                })?;
            file_facades.push(InternalName::from_package(package, short));
        }

        Ok(PackageParts {
            fq_name: self.fq_name,
            file_facades,
        })
    }
}

/// Module bytes listing `file_facades` in the Kotlin DSL package.
///
/// Facades are not sorted. See [`ModuleMetadata::to_bytes`] for how this
/// differs from kotlinc output.
#[must_use]
pub fn module_metadata_bytes_for(file_facades: &[InternalName]) -> Vec<u8> {
    module_metadata_bytes_for_package(KOTLIN_DSL_PACKAGE, file_facades)
}

/// Module bytes listing `file_facades` in `package`.
#[must_use]
pub fn module_metadata_bytes_for_package(package: &str, file_facades: &[InternalName]) -> Vec<u8> {
    ModuleMetadata::new()
        .with_package(package, file_facades.to_vec())
        .to_bytes()
}

/// `base_dir/META-INF/<module_name>.kotlin_module`
#[must_use]
pub fn module_file_for(base_dir: &Path, module_name: &str) -> PathBuf {
    base_dir
        .join("META-INF")
        .join(format!("{module_name}.kotlin_module"))
}

/// [`module_file_for`] with the name of `base_dir` as module name.
#[must_use]
pub fn module_file_for_dir(base_dir: &Path) -> PathBuf {
    let module_name = base_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    module_file_for(base_dir, &module_name)
}
