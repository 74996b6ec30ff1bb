//! `kotlin.Metadata` headers and the file-facade builder session.

use tracing::debug;

use crate::bit_encoding;
use crate::descriptor::{KmFunction, KmProperty};
use crate::flags::{AccessorFlags, FunctionFlags, TypeFlags};
use crate::signature::JvmMethodSignature;
use crate::types::KmType;

/// Metadata version written when none is configured.
pub const DEFAULT_METADATA_VERSION: [i32; 3] = [1, 1, 13];

/// Bytecode interface version written when none is configured.
pub const DEFAULT_BYTECODE_VERSION: [i32; 3] = [1, 0, 3];

/// The `k` field of `kotlin.Metadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// A class, interface or object.
    Class,
    /// The facade class of a single source file.
    FileFacade,
    /// A synthetic class such as a lambda.
    SyntheticClass,
    /// The facade of a `@JvmMultifileClass`.
    MultiFileClassFacade,
    /// One part of a `@JvmMultifileClass`.
    MultiFileClassPart,
}

impl MetadataKind {
    /// Wire value of the kind.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Class => 1,
            Self::FileFacade => 2,
            Self::SyntheticClass => 3,
            Self::MultiFileClassFacade => 4,
            Self::MultiFileClassPart => 5,
        }
    }

    /// Kind for a wire value, if known.
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Class),
            2 => Some(Self::FileFacade),
            3 => Some(Self::SyntheticClass),
            4 => Some(Self::MultiFileClassFacade),
            5 => Some(Self::MultiFileClassPart),
            _ => None,
        }
    }
}

/// Contents of a `kotlin.Metadata` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataHeader {
    /// `mv`
    pub metadata_version: Vec<i32>,
    /// `bv`
    pub bytecode_version: Vec<i32>,
    /// `k`
    pub kind: MetadataKind,
    /// `d1`: bit-encoded protobuf data.
    pub data1: Vec<String>,
    /// `d2`: string table.
    pub data2: Vec<String>,
    /// `xi`
    pub extra_int: i32,
}

/// An open file-facade metadata session.
///
/// Declarations accumulate in call order; [`FileFacadeWriter::close_header`]
/// consumes the session and returns the finished header.
#[derive(Debug, Clone)]
#[must_use = "a file facade session produces nothing until close_header is called"]
pub struct FileFacadeWriter {
    metadata_version: Vec<i32>,
    bytecode_version: Vec<i32>,
    functions: Vec<KmFunction>,
    properties: Vec<KmProperty>,
}

impl Default for FileFacadeWriter {
    fn default() -> Self {
        Self {
            metadata_version: DEFAULT_METADATA_VERSION.to_vec(),
            bytecode_version: DEFAULT_BYTECODE_VERSION.to_vec(),
            functions: Vec::new(),
            properties: Vec::new(),
        }
    }
}

/// Open a file-facade session with the default versions.
pub fn begin_file_facade_header() -> FileFacadeWriter {
    FileFacadeWriter::default()
}

/// Run `body` in a fresh file-facade session and close it.
#[must_use]
pub fn write_file_facade_class_header(body: impl FnOnce(&mut FileFacadeWriter)) -> MetadataHeader {
    let mut writer = begin_file_facade_header();
    body(&mut writer);
    writer.close_header()
}

impl FileFacadeWriter {
    /// Override the metadata and bytecode versions.
    pub fn with_versions(mut self, metadata_version: &[i32], bytecode_version: &[i32]) -> Self {
        self.metadata_version = metadata_version.to_vec();
        self.bytecode_version = bytecode_version.to_vec();
        self
    }

    /// Register a fully described function.
    pub fn write_function(&mut self, function: KmFunction) -> &mut Self {
        self.functions.push(function);
        self
    }

    /// Register a public inline extension function.
    ///
    /// `parameters` runs against the new function to append its parameters.
    pub fn write_function_of(
        &mut self,
        receiver_type: KmType,
        return_type: KmType,
        name: &str,
        signature: JvmMethodSignature,
        parameters: impl FnOnce(&mut KmFunction),
    ) -> &mut Self {
        self.write_function_with_flags_of(
            receiver_type,
            return_type,
            name,
            signature,
            FunctionFlags::INLINE_FUNCTION,
            TypeFlags::empty(),
            parameters,
        )
    }

    /// Register an extension function with explicit function and return type
    /// flags.
    #[allow(clippy::too_many_arguments)]
    pub fn write_function_with_flags_of(
        &mut self,
        receiver_type: KmType,
        return_type: KmType,
        name: &str,
        signature: JvmMethodSignature,
        function_flags: FunctionFlags,
        return_type_flags: TypeFlags,
        parameters: impl FnOnce(&mut KmFunction),
    ) -> &mut Self {
        let mut function = KmFunction::new(name, return_type)
            .with_flags(function_flags)
            .with_receiver(receiver_type);
        parameters(&mut function);
        let function = function
            .with_return_type_flags(return_type_flags)
            .with_signature(signature);
        self.write_function(function)
    }

    /// Register a public inline extension function with one required
    /// parameter and a nullable return type.
    pub fn write_function_with_parameter_of(
        &mut self,
        receiver_type: KmType,
        nullable_return_type: KmType,
        name: &str,
        parameter_name: &str,
        parameter_type: KmType,
        signature: JvmMethodSignature,
    ) -> &mut Self {
        self.write_function_with_flags_of(
            receiver_type,
            nullable_return_type,
            name,
            signature,
            FunctionFlags::INLINE_FUNCTION,
            TypeFlags::IS_NULLABLE,
            |function| {
                function.visit_parameter(parameter_name, parameter_type);
            },
        )
    }

    /// Register a read-only extension property with an inline getter.
    pub fn write_property_of(
        &mut self,
        receiver_type: KmType,
        return_type: KmType,
        name: &str,
        getter_signature: JvmMethodSignature,
    ) -> &mut Self {
        self.write_property_with_getter_flags_of(
            receiver_type,
            return_type,
            name,
            getter_signature,
            AccessorFlags::INLINE_GETTER,
        )
    }

    /// Register a read-only extension property with explicit getter flags.
    pub fn write_property_with_getter_flags_of(
        &mut self,
        receiver_type: KmType,
        return_type: KmType,
        name: &str,
        getter_signature: JvmMethodSignature,
        getter_flags: AccessorFlags,
    ) -> &mut Self {
        let property = KmProperty::new(name, return_type)
            .with_getter_flags(getter_flags)
            .with_receiver(receiver_type)
            .with_getter_signature(getter_signature);
        self.write_property(property)
    }

    /// Register a fully described property.
    pub fn write_property(&mut self, property: KmProperty) -> &mut Self {
        self.properties.push(property);
        self
    }

    /// Functions registered so far.
    #[must_use]
    pub fn functions(&self) -> &[KmFunction] {
        &self.functions
    }

    /// Properties registered so far.
    #[must_use]
    pub fn properties(&self) -> &[KmProperty] {
        &self.properties
    }

    /// Finish the session and serialise it.
    #[must_use]
    pub fn close_header(self) -> MetadataHeader {
        let (bytes, data2) = crate::encode::write_package(&self.functions, &self.properties);
        let data1 = bit_encoding::encode_bytes(&bytes);
        debug!(
            functions = self.functions.len(),
            properties = self.properties.len(),
            proto_bytes = bytes.len(),
            strings = data2.len(),
            "closed file facade header"
        );
        MetadataHeader {
            metadata_version: self.metadata_version,
            bytecode_version: self.bytecode_version,
            kind: MetadataKind::FileFacade,
            data1,
            data2,
            extra_int: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::action_type_of;

    fn project() -> KmType {
        KmType::class("org/gradle/api/Project")
    }

    #[test]
    fn test_kind_wire_values() {
        for kind in [
            MetadataKind::Class,
            MetadataKind::FileFacade,
            MetadataKind::SyntheticClass,
            MetadataKind::MultiFileClassFacade,
            MetadataKind::MultiFileClassPart,
        ] {
            assert_eq!(MetadataKind::from_i32(kind.as_i32()), Some(kind));
        }
        assert_eq!(MetadataKind::FileFacade.as_i32(), 2);
        assert_eq!(MetadataKind::from_i32(0), None);
    }

    #[test]
    fn test_empty_header() {
        let header = begin_file_facade_header().close_header();
        assert_eq!(header.kind, MetadataKind::FileFacade);
        assert_eq!(header.metadata_version, vec![1, 1, 13]);
        assert_eq!(header.bytecode_version, vec![1, 0, 3]);
        assert_eq!(header.extra_int, 0);
        assert!(header.data2.is_empty());
        // Only the empty StringTableTypes length prefix.
        assert_eq!(header.data1.len(), 1);
    }

    #[test]
    fn test_with_versions() {
        let header = begin_file_facade_header()
            .with_versions(&[1, 4, 0], &[1, 0, 3])
            .close_header();
        assert_eq!(header.metadata_version, vec![1, 4, 0]);
    }

    #[test]
    fn test_write_function_of_defaults() {
        let mut writer = begin_file_facade_header();
        writer.write_function_of(
            project(),
            KmType::class("kotlin/Unit"),
            "configure",
            JvmMethodSignature::new("configure", "(Lorg/gradle/api/Project;Lorg/gradle/api/Action;)V"),
            |f| {
                f.visit_parameter("action", action_type_of(KmType::class("kotlin/Any")));
            },
        );
        let function = &writer.functions()[0];
        assert_eq!(function.flags, FunctionFlags::INLINE_FUNCTION);
        assert_eq!(function.receiver_type.as_ref(), Some(&project()));
        assert_eq!(function.value_parameters.len(), 1);
        assert!(!function.return_type.is_nullable());
    }

    #[test]
    fn test_write_function_with_parameter_of_marks_return_nullable() {
        let mut writer = begin_file_facade_header();
        writer.write_function_with_parameter_of(
            project(),
            KmType::class("kotlin/Any"),
            "findByName",
            "name",
            KmType::class("kotlin/String"),
            JvmMethodSignature::new("findByName", "(Lorg/gradle/api/Project;Ljava/lang/String;)Ljava/lang/Object;"),
        );
        let function = &writer.functions()[0];
        assert!(function.return_type.is_nullable());
        assert_eq!(function.value_parameters[0].name, "name");
    }

    #[test]
    fn test_write_property_of_defaults() {
        let mut writer = begin_file_facade_header();
        writer.write_property_of(
            project(),
            KmType::class("kotlin/String"),
            "name",
            JvmMethodSignature::new("getName", "(Lorg/gradle/api/Project;)Ljava/lang/String;"),
        );
        let property = &writer.properties()[0];
        assert_eq!(property.getter_flags, AccessorFlags::INLINE_GETTER);
        assert_eq!(property.flags, crate::flags::PropertyFlags::READ_ONLY);
    }

    #[test]
    fn test_closed_header_is_reproducible() {
        let build = || {
            write_file_facade_class_header(|w| {
                w.write_property_of(
                    project(),
                    KmType::class("kotlin/String"),
                    "name",
                    JvmMethodSignature::new("getName", "(Lorg/gradle/api/Project;)Ljava/lang/String;"),
                );
            })
        };
        assert_eq!(build(), build());
    }
}
