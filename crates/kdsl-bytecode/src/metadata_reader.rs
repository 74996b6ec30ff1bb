//! Decoding of file-facade metadata back into descriptors.

use tracing::trace;

use crate::bit_encoding;
use crate::descriptor::{KmFunction, KmProperty, KmValueParameter};
use crate::error::{BytecodeError, BytecodeResult};
use crate::flags::{
    self, AccessorFlags, FunctionFlags, PropertyFlags, TypeFlags, ValueParameterFlags,
};
use crate::header::{MetadataHeader, MetadataKind};
use crate::proto;
use crate::signature::{JvmMethodSignature, jvm_getter_signature_for};
use crate::string_table::StringTable;
use crate::types::{KmClassifier, KmType, KmTypeProjection, KmVariance};
use crate::wire::ProtoReader;

/// Declarations of a file facade or multi-file class part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KmPackage {
    /// Functions in declaration order.
    pub functions: Vec<KmFunction>,
    /// Properties in declaration order.
    pub properties: Vec<KmProperty>,
}

impl KmPackage {
    /// Decode the package carried by `header`.
    ///
    /// # Errors
    ///
    /// Returns [`BytecodeError::UnexpectedKind`] unless the header describes
    /// a file facade or multi-file class part, and a decoding error if `d1`
    /// or `d2` are malformed.
    pub fn read(header: &MetadataHeader) -> BytecodeResult<Self> {
        match header.kind {
            MetadataKind::FileFacade | MetadataKind::MultiFileClassPart => {},
            other => {
                return Err(BytecodeError::UnexpectedKind {
                    expected: MetadataKind::FileFacade.as_i32(),
                    found: other.as_i32(),
                });
            },
        }
        let bytes = bit_encoding::decode_bytes(&header.data1)?;
        Self::parse(&bytes, &header.data2)
    }

    fn parse(bytes: &[u8], strings: &[String]) -> BytecodeResult<Self> {
        const WHAT: &str = "Package";
        let mut reader = ProtoReader::new(bytes);
        let types = reader.delimited("StringTableTypes")?;
        let table = StringTable::parse(types, strings)?;

        let mut package = Self::default();
        let mut body = ProtoReader::new(reader.rest());
        while let Some((field, value)) = body.next_field(WHAT)? {
            match field {
                proto::package::FUNCTION => {
                    package.functions.push(read_function(value.as_bytes(WHAT)?, &table)?);
                },
                proto::package::PROPERTY => {
                    package.properties.push(read_property(value.as_bytes(WHAT)?, &table)?);
                },
                other => trace!(field = other, "skipping package field"),
            }
        }
        Ok(package)
    }
}

fn read_type(bytes: &[u8], table: &StringTable) -> BytecodeResult<KmType> {
    use proto::types::{ARGUMENT, CLASS_NAME, FLAGS, NULLABLE};
    const WHAT: &str = "Type";

    let mut flags = TypeFlags::empty();
    let mut arguments = Vec::new();
    let mut class_name = None;
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field(WHAT)? {
        match field {
            FLAGS => {
                let shifted = flags::from_proto(value.as_i32(WHAT)?).wrapping_shl(1);
                flags |= TypeFlags::from_bits_retain(shifted);
            },
            ARGUMENT => arguments.push(read_argument(value.as_bytes(WHAT)?, table)?),
            NULLABLE => {
                if value.as_bool(WHAT)? {
                    flags |= TypeFlags::IS_NULLABLE;
                }
            },
            CLASS_NAME => class_name = Some(table.class_name(value.as_i32(WHAT)?)?),
            other => trace!(field = other, "skipping type field"),
        }
    }

    let class_name =
        class_name.ok_or_else(|| BytecodeError::malformed(WHAT, "type without class name"))?;
    Ok(KmType {
        classifier: KmClassifier::Class(class_name),
        arguments,
        flags,
    })
}

fn read_argument(bytes: &[u8], table: &StringTable) -> BytecodeResult<KmTypeProjection> {
    use proto::argument::{
        PROJECTION, PROJECTION_IN, PROJECTION_INV, PROJECTION_OUT, PROJECTION_STAR, TYPE,
    };
    const WHAT: &str = "Type.Argument";

    let mut projection = PROJECTION_INV;
    let mut ty = None;
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field(WHAT)? {
        match field {
            PROJECTION => projection = value.as_i32(WHAT)?,
            TYPE => ty = Some(read_type(value.as_bytes(WHAT)?, table)?),
            other => trace!(field = other, "skipping argument field"),
        }
    }

    let variance = match projection {
        PROJECTION_STAR => return Ok(KmTypeProjection::Star),
        PROJECTION_IN => KmVariance::In,
        PROJECTION_OUT => KmVariance::Out,
        PROJECTION_INV => KmVariance::Invariant,
        other => {
            return Err(BytecodeError::malformed(
                WHAT,
                format!("unknown projection {other}"),
            ));
        },
    };
    let ty = ty.ok_or_else(|| BytecodeError::malformed(WHAT, "projection without type"))?;
    Ok(KmTypeProjection::Projection { variance, ty })
}

fn read_value_parameter(bytes: &[u8], table: &StringTable) -> BytecodeResult<KmValueParameter> {
    use proto::value_parameter::{FLAGS, NAME, TYPE};
    const WHAT: &str = "ValueParameter";

    let mut flags = ValueParameterFlags::empty();
    let mut name = None;
    let mut ty = None;
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field(WHAT)? {
        match field {
            FLAGS => {
                flags = ValueParameterFlags::from_bits_retain(flags::from_proto(
                    value.as_i32(WHAT)?,
                ));
            },
            NAME => name = Some(table.get(value.as_i32(WHAT)?)?.to_string()),
            TYPE => ty = Some(read_type(value.as_bytes(WHAT)?, table)?),
            other => trace!(field = other, "skipping value parameter field"),
        }
    }
    Ok(KmValueParameter {
        flags,
        name: name.ok_or_else(|| BytecodeError::malformed(WHAT, "parameter without name"))?,
        ty: ty.ok_or_else(|| BytecodeError::malformed(WHAT, "parameter without type"))?,
    })
}

/// Name and descriptor of a JVM method signature; either may be absent.
type RawSignature = (Option<String>, Option<String>);

fn read_method_signature(bytes: &[u8], table: &StringTable) -> BytecodeResult<RawSignature> {
    use proto::jvm_method_signature::{DESC, NAME};
    const WHAT: &str = "JvmMethodSignature";

    let mut name = None;
    let mut desc = None;
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field(WHAT)? {
        match field {
            NAME => name = Some(table.get(value.as_i32(WHAT)?)?.to_string()),
            DESC => desc = Some(table.get(value.as_i32(WHAT)?)?.to_string()),
            other => trace!(field = other, "skipping signature field"),
        }
    }
    Ok((name, desc))
}

fn read_function(bytes: &[u8], table: &StringTable) -> BytecodeResult<KmFunction> {
    use proto::function::{
        FLAGS, JVM_METHOD_SIGNATURE, NAME, RECEIVER_TYPE, RETURN_TYPE, VALUE_PARAMETER,
    };
    const WHAT: &str = "Function";

    let mut flags = FunctionFlags::from_bits_retain(FunctionFlags::PROTO_DEFAULT);
    let mut name = None;
    let mut return_type = None;
    let mut receiver_type = None;
    let mut value_parameters = Vec::new();
    let mut signature = None;
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field(WHAT)? {
        match field {
            NAME => name = Some(table.get(value.as_i32(WHAT)?)?.to_string()),
            RETURN_TYPE => return_type = Some(read_type(value.as_bytes(WHAT)?, table)?),
            RECEIVER_TYPE => receiver_type = Some(read_type(value.as_bytes(WHAT)?, table)?),
            VALUE_PARAMETER => {
                value_parameters.push(read_value_parameter(value.as_bytes(WHAT)?, table)?);
            },
            FLAGS => {
                flags = FunctionFlags::from_bits_retain(flags::from_proto(value.as_i32(WHAT)?));
            },
            JVM_METHOD_SIGNATURE => {
                signature = Some(read_method_signature(value.as_bytes(WHAT)?, table)?);
            },
            other => trace!(field = other, "skipping function field"),
        }
    }

    let name = name.ok_or_else(|| BytecodeError::malformed(WHAT, "function without name"))?;
    let signature = match signature {
        Some((method_name, Some(desc))) => Some(JvmMethodSignature::new(
            method_name.unwrap_or_else(|| name.clone()),
            desc,
        )),
        Some((_, None)) => {
            return Err(BytecodeError::malformed(
                WHAT,
                format!("signature of {name} has no descriptor"),
            ));
        },
        None => None,
    };
    Ok(KmFunction {
        flags,
        return_type: return_type
            .ok_or_else(|| BytecodeError::malformed(WHAT, "function without return type"))?,
        name,
        receiver_type,
        value_parameters,
        signature,
    })
}

fn read_property(bytes: &[u8], table: &StringTable) -> BytecodeResult<KmProperty> {
    use proto::property::{
        FLAGS, GETTER_FLAGS, JVM_PROPERTY_SIGNATURE, NAME, RECEIVER_TYPE, RETURN_TYPE,
    };
    const WHAT: &str = "Property";

    let mut flags = PropertyFlags::from_bits_retain(PropertyFlags::PROTO_DEFAULT);
    let mut getter_flags = None;
    let mut name = None;
    let mut return_type = None;
    let mut receiver_type = None;
    let mut getter = None;
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field(WHAT)? {
        match field {
            NAME => name = Some(table.get(value.as_i32(WHAT)?)?.to_string()),
            RETURN_TYPE => return_type = Some(read_type(value.as_bytes(WHAT)?, table)?),
            RECEIVER_TYPE => receiver_type = Some(read_type(value.as_bytes(WHAT)?, table)?),
            GETTER_FLAGS => {
                getter_flags = Some(AccessorFlags::from_bits_retain(flags::from_proto(
                    value.as_i32(WHAT)?,
                )));
            },
            FLAGS => {
                flags = PropertyFlags::from_bits_retain(flags::from_proto(value.as_i32(WHAT)?));
            },
            JVM_PROPERTY_SIGNATURE => getter = read_property_getter(value.as_bytes(WHAT)?, table)?,
            other => trace!(field = other, "skipping property field"),
        }
    }

    let name = name.ok_or_else(|| BytecodeError::malformed(WHAT, "property without name"))?;
    let getter_signature = match getter {
        Some((getter_name, Some(desc))) => Some(match getter_name {
            Some(getter_name) => JvmMethodSignature::new(getter_name, desc),
            None => jvm_getter_signature_for(&name, desc),
        }),
        Some((_, None)) => {
            return Err(BytecodeError::malformed(
                WHAT,
                format!("getter of {name} has no descriptor"),
            ));
        },
        None => None,
    };
    Ok(KmProperty {
        getter_flags: getter_flags.unwrap_or_else(|| flags.default_accessor_flags()),
        flags,
        return_type: return_type
            .ok_or_else(|| BytecodeError::malformed(WHAT, "property without return type"))?,
        name,
        receiver_type,
        getter_signature,
    })
}

fn read_property_getter(bytes: &[u8], table: &StringTable) -> BytecodeResult<Option<RawSignature>> {
    const WHAT: &str = "JvmPropertySignature";
    let mut getter = None;
    let mut reader = ProtoReader::new(bytes);
    while let Some((field, value)) = reader.next_field(WHAT)? {
        if field == proto::jvm_property_signature::GETTER {
            getter = Some(read_method_signature(value.as_bytes(WHAT)?, table)?);
        }
    }
    Ok(getter)
}
