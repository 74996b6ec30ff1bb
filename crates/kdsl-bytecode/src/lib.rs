//! Kotlin DSL Bytecode - Kotlin metadata synthesis for generated accessors.
//!
//! This crate provides:
//! - A file-facade session ([`FileFacadeWriter`]) that collects extension
//!   functions and properties and closes into a `kotlin.Metadata` header
//! - Descriptor and type builders ([`KmFunction`], [`KmProperty`], [`KmType`])
//! - `.kotlin_module` files listing the generated facades
//! - A minimal class writer that attaches the header as an annotation, and a
//!   reader that gets it back out
//!
//! # Example
//!
//! ```rust
//! use kdsl_bytecode::prelude::*;
//!
//! # fn main() -> BytecodeResult<()> {
//! let project = KmType::class("org/gradle/api/Project");
//! let header = write_file_facade_class_header(|facade| {
//!     facade.write_property_of(
//!         project,
//!         KmType::class("kotlin/String"),
//!         "displayName",
//!         jvm_getter_signature_for(
//!             "displayName",
//!             "(Lorg/gradle/api/Project;)Ljava/lang/String;",
//!         ),
//!     );
//! });
//!
//! let facade = InternalName::new("org/gradle/kotlin/dsl/DisplayNameKt");
//! let class = public_kotlin_class(&facade, &header, |_| Ok(()))?;
//! let module = module_metadata_bytes_for(&[facade]);
//!
//! let package = KmPackage::read(&ClassFile::parse(&class)?.kotlin_metadata()?)?;
//! assert_eq!(package.properties[0].name, "displayName");
//! assert!(!module.is_empty());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod bit_encoding;
pub mod mutf8;
pub mod prelude;

mod class_reader;
mod class_writer;
mod constant_pool;
mod cursor;
mod descriptor;
mod encode;
mod error;
mod flags;
mod header;
mod metadata_reader;
mod module;
mod names;
mod options;
mod proto;
mod signature;
mod string_table;
mod types;
mod wire;

pub use class_reader::{Annotation, ClassFile, CodeInfo, ElementValue, MethodInfo};
pub use class_writer::{
    ClassWriter, CodeBuilder, DEFAULT_CLASS_FILE_MAJOR, access, public_kotlin_class,
    public_kotlin_class_with_major,
};
pub use descriptor::{KmFunction, KmProperty, KmValueParameter};
pub use error::{BytecodeError, BytecodeResult};
pub use flags::{AccessorFlags, FunctionFlags, PropertyFlags, TypeFlags, ValueParameterFlags};
pub use header::{
    DEFAULT_BYTECODE_VERSION, DEFAULT_METADATA_VERSION, FileFacadeWriter, MetadataHeader,
    MetadataKind, begin_file_facade_header, write_file_facade_class_header,
};
pub use metadata_reader::KmPackage;
pub use module::{
    KOTLIN_DSL_PACKAGE, ModuleMetadata, PackageParts, module_file_for, module_file_for_dir,
    module_metadata_bytes_for, module_metadata_bytes_for_package,
};
pub use names::{ClassName, InternalName};
pub use options::MetadataOptions;
pub use signature::{JvmMethodSignature, jvm_getter_signature_for};
pub use types::{
    ACTION_CLASS, FUNCTION1_CLASS, KmClassifier, KmType, KmTypeProjection, KmVariance,
    action_type_of, function_type_of,
};
