//! Serialisation of descriptors into `Package` protobuf messages.
//!
//! Fields are emitted in ascending field-number order with default values
//! omitted. Strings are interned in declaration order (name, receiver,
//! parameters, return type, signature), which is not the order kotlinc uses,
//! so `d2` and the string indexes can differ from compiler output. Readers
//! resolve strings through those indexes and decode the same declarations.

use crate::descriptor::{KmFunction, KmProperty, KmValueParameter};
use crate::flags::{self, FunctionFlags, PropertyFlags, TypeFlags};
use crate::proto;
use crate::signature::JvmMethodSignature;
use crate::string_table::StringTableBuilder;
use crate::types::{KmType, KmTypeProjection, KmVariance};
use crate::wire::ProtoWriter;

pub(crate) fn write_type(ty: &KmType, strings: &mut StringTableBuilder) -> ProtoWriter {
    use proto::types::{ARGUMENT, CLASS_NAME, FLAGS, NULLABLE};

    let class_name = strings.class_name_index(ty.class_name());
    let arguments: Vec<_> = ty
        .arguments
        .iter()
        .map(|argument| write_argument(argument, strings))
        .collect();

    let mut message = ProtoWriter::new();
    // Nullability has its own field; the remaining bits shift down by one.
    // Safety: a right shift by one cannot overflow.
    #[allow(clippy::arithmetic_side_effects)]
    let flags = (ty.flags - TypeFlags::IS_NULLABLE).bits() >> 1;
    if flags != 0 {
        message.int32(FLAGS, flags::to_proto(flags));
    }
    for argument in &arguments {
        message.message(ARGUMENT, argument);
    }
    if ty.is_nullable() {
        message.bool(NULLABLE, true);
    }
    message.int32(CLASS_NAME, class_name);
    message
}

fn write_argument(argument: &KmTypeProjection, strings: &mut StringTableBuilder) -> ProtoWriter {
    use proto::argument::{PROJECTION, PROJECTION_IN, PROJECTION_OUT, PROJECTION_STAR, TYPE};

    let mut message = ProtoWriter::new();
    match argument {
        KmTypeProjection::Star => message.int32(PROJECTION, PROJECTION_STAR),
        KmTypeProjection::Projection { variance, ty } => {
            match variance {
                KmVariance::In => message.int32(PROJECTION, PROJECTION_IN),
                KmVariance::Out => message.int32(PROJECTION, PROJECTION_OUT),
                KmVariance::Invariant => {},
            }
            message.message(TYPE, &write_type(ty, strings));
        },
    }
    message
}

fn write_value_parameter(
    parameter: &KmValueParameter,
    strings: &mut StringTableBuilder,
) -> ProtoWriter {
    use proto::value_parameter::{FLAGS, NAME, TYPE};

    let mut message = ProtoWriter::new();
    if !parameter.flags.is_empty() {
        message.int32(FLAGS, flags::to_proto(parameter.flags.bits()));
    }
    message.int32(NAME, strings.string_index(&parameter.name));
    message.message(TYPE, &write_type(&parameter.ty, strings));
    message
}

fn write_method_signature(
    signature: &JvmMethodSignature,
    strings: &mut StringTableBuilder,
) -> ProtoWriter {
    use proto::jvm_method_signature::{DESC, NAME};

    let mut message = ProtoWriter::new();
    message.int32(NAME, strings.string_index(&signature.name));
    message.int32(DESC, strings.string_index(&signature.desc));
    message
}

pub(crate) fn write_function(function: &KmFunction, strings: &mut StringTableBuilder) -> ProtoWriter {
    use proto::function::{
        FLAGS, JVM_METHOD_SIGNATURE, NAME, RECEIVER_TYPE, RETURN_TYPE, VALUE_PARAMETER,
    };

    let name = strings.string_index(&function.name);
    let receiver = function
        .receiver_type
        .as_ref()
        .map(|receiver| write_type(receiver, strings));
    let parameters: Vec<_> = function
        .value_parameters
        .iter()
        .map(|parameter| write_value_parameter(parameter, strings))
        .collect();
    let return_type = write_type(&function.return_type, strings);
    let signature = function
        .signature
        .as_ref()
        .map(|signature| write_method_signature(signature, strings));

    let mut message = ProtoWriter::new();
    message.int32(NAME, name);
    message.message(RETURN_TYPE, &return_type);
    if let Some(receiver) = &receiver {
        message.message(RECEIVER_TYPE, receiver);
    }
    for parameter in &parameters {
        message.message(VALUE_PARAMETER, parameter);
    }
    if function.flags.bits() != FunctionFlags::PROTO_DEFAULT {
        message.int32(FLAGS, flags::to_proto(function.flags.bits()));
    }
    if let Some(signature) = &signature {
        message.message(JVM_METHOD_SIGNATURE, signature);
    }
    message
}

pub(crate) fn write_property(property: &KmProperty, strings: &mut StringTableBuilder) -> ProtoWriter {
    use proto::property::{
        FLAGS, GETTER_FLAGS, JVM_PROPERTY_SIGNATURE, NAME, RECEIVER_TYPE, RETURN_TYPE,
    };

    let name = strings.string_index(&property.name);
    let receiver = property
        .receiver_type
        .as_ref()
        .map(|receiver| write_type(receiver, strings));
    let return_type = write_type(&property.return_type, strings);

    let mut message = ProtoWriter::new();
    message.int32(NAME, name);
    message.message(RETURN_TYPE, &return_type);
    if let Some(receiver) = &receiver {
        message.message(RECEIVER_TYPE, receiver);
    }
    if property.flags.contains(PropertyFlags::HAS_GETTER)
        && property.getter_flags != property.flags.default_accessor_flags()
    {
        message.int32(GETTER_FLAGS, flags::to_proto(property.getter_flags.bits()));
    }
    if property.flags.bits() != PropertyFlags::PROTO_DEFAULT {
        message.int32(FLAGS, flags::to_proto(property.flags.bits()));
    }
    if let Some(getter) = &property.getter_signature {
        let mut signature = ProtoWriter::new();
        signature.message(
            proto::jvm_property_signature::GETTER,
            &write_method_signature(getter, strings),
        );
        message.message(JVM_PROPERTY_SIGNATURE, &signature);
    }
    message
}

/// Serialise a package and its string table into `(d1 bytes, d2 strings)`.
pub(crate) fn write_package(
    functions: &[KmFunction],
    properties: &[KmProperty],
) -> (Vec<u8>, Vec<String>) {
    let mut strings = StringTableBuilder::new();
    let mut package = ProtoWriter::new();
    for function in functions {
        package.message(proto::package::FUNCTION, &write_function(function, &mut strings));
    }
    for property in properties {
        package.message(proto::package::PROPERTY, &write_property(property, &mut strings));
    }

    let (types, d2) = strings.finish();
    let mut out = ProtoWriter::new();
    out.delimited(&types);
    out.raw(&package);
    (out.into_bytes(), d2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::action_type_of;

    fn serialize(ty: &KmType) -> (Vec<u8>, Vec<String>) {
        let mut strings = StringTableBuilder::new();
        let bytes = write_type(ty, &mut strings).into_bytes();
        let (_, d2) = strings.finish();
        (bytes, d2)
    }

    #[test]
    fn test_action_type_serialisation_is_deterministic() {
        let a = serialize(&action_type_of(KmType::class("org/gradle/api/Project")));
        let b = serialize(&action_type_of(KmType::class("org/gradle/api/Project")));
        assert_eq!(a, b);
    }

    #[test]
    fn test_simple_type_bytes() {
        let (bytes, d2) = serialize(&KmType::class("kotlin/String"));
        // class_name = 0 (key 0x30)
        assert_eq!(bytes, vec![0x30, 0x00]);
        assert_eq!(d2, vec!["kotlin/String"]);
    }

    #[test]
    fn test_nullable_type_bytes() {
        let (bytes, _) = serialize(&KmType::class("kotlin/String").nullable());
        // nullable = true (0x18 0x01), class_name = 0
        assert_eq!(bytes, vec![0x18, 0x01, 0x30, 0x00]);
    }

    #[test]
    fn test_suspend_flag_shifts_down() {
        let (bytes, _) = serialize(&KmType::class("kotlin/Function0").with_flags(TypeFlags::IS_SUSPEND));
        assert_eq!(bytes, vec![0x08, 0x01, 0x30, 0x00]);
    }

    #[test]
    fn test_default_function_flags_are_omitted() {
        let mut strings = StringTableBuilder::new();
        let function = KmFunction::new("f", KmType::class("kotlin/Unit"));
        let bytes = write_function(&function, &mut strings).into_bytes();
        // name, return type; no flags key (0x48)
        assert!(!bytes.contains(&0x48));

        let inline = function.with_flags(FunctionFlags::INLINE_FUNCTION);
        let bytes = write_function(&inline, &mut strings).into_bytes();
        assert!(bytes.windows(3).any(|w| w == [0x48, 0x86, 0x08]));
    }

    #[test]
    fn test_inline_getter_flags_are_written() {
        let mut strings = StringTableBuilder::new();
        let property = KmProperty::new("p", KmType::class("kotlin/String"));
        let bytes = write_property(&property, &mut strings).into_bytes();
        // getter_flags = 326 (key 0x38, varint C6 02); default property flags omitted
        assert!(bytes.windows(3).any(|w| w == [0x38, 0xC6, 0x02]));
        assert!(!bytes.contains(&0x58));
    }

    #[test]
    fn test_default_getter_flags_are_omitted() {
        let mut strings = StringTableBuilder::new();
        let property = KmProperty::new("p", KmType::class("kotlin/String"))
            .with_getter_flags(crate::flags::AccessorFlags::IS_PUBLIC);
        let bytes = write_property(&property, &mut strings).into_bytes();
        assert!(!bytes.contains(&0x38));
    }

    #[test]
    fn test_strings_interned_in_declaration_order() {
        let mut function = KmFunction::new("f", KmType::class("kotlin/Unit"))
            .with_receiver(KmType::class("org/gradle/api/Project"))
            .with_signature(JvmMethodSignature::new("f", "()V"));
        function.visit_parameter("action", KmType::class("org/gradle/api/Action"));

        let (_, d2) = write_package(&[function], &[]);
        assert_eq!(
            d2,
            vec![
                "f",
                "org/gradle/api/Project",
                "action",
                "org/gradle/api/Action",
                "kotlin/Unit",
                "()V",
            ]
        );
    }
}
