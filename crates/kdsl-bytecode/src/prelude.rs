//! Prelude module - commonly used types for convenient import.
//!
//! Use `use kdsl_bytecode::prelude::*;` to import all essential types.

// Errors
pub use crate::{BytecodeError, BytecodeResult};

// Descriptors
pub use crate::{
    AccessorFlags, FunctionFlags, KmFunction, KmProperty, KmType, KmTypeProjection,
    KmValueParameter, KmVariance, PropertyFlags, TypeFlags, ValueParameterFlags,
};

// Headers and module files
pub use crate::{
    FileFacadeWriter, KmPackage, MetadataHeader, MetadataKind, MetadataOptions, ModuleMetadata,
};

// Class files
pub use crate::{ClassFile, ClassWriter, CodeBuilder};

// Names and signatures
pub use crate::{ClassName, InternalName, JvmMethodSignature};

// Builder entry points
pub use crate::{
    action_type_of, begin_file_facade_header, function_type_of, jvm_getter_signature_for,
    module_metadata_bytes_for, public_kotlin_class, write_file_facade_class_header,
};
