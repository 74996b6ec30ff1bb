//! Class-file reader.
//!
//! Parses enough of a class file to inspect generated facades: the
//! constant pool, method signatures and code, and runtime-visible
//! annotations. Fields and unknown attributes are skipped.

use crate::cursor::ByteCursor;
use crate::error::{BytecodeError, BytecodeResult};
use crate::header::{DEFAULT_BYTECODE_VERSION, MetadataHeader, MetadataKind};
use crate::mutf8;

const MAGIC: u32 = 0xCAFE_BABE;
const KOTLIN_METADATA_DESCRIPTOR: &str = "Lkotlin/Metadata;";

#[derive(Debug, Clone)]
enum PoolEntry {
    Utf8(String),
    Integer(i32),
    Class(u16),
    Other,
}

struct Pool {
    entries: Vec<Option<PoolEntry>>,
}

impl Pool {
    fn parse(cursor: &mut ByteCursor<'_>) -> BytecodeResult<Self> {
        let count = cursor.u16("constant_pool_count")?;
        let mut entries: Vec<Option<PoolEntry>> = Vec::with_capacity(usize::from(count));
        entries.push(None);
        while entries.len() < usize::from(count) {
            let tag = cursor.u8("constant tag")?;
            let entry = match tag {
                1 => {
                    let len = cursor.u16("CONSTANT_Utf8 length")?;
                    let bytes = cursor.take(usize::from(len), "CONSTANT_Utf8")?;
                    PoolEntry::Utf8(mutf8::decode(bytes)?)
                },
                3 => PoolEntry::Integer(cursor.i32("CONSTANT_Integer")?),
                4 => {
                    cursor.take(4, "CONSTANT_Float")?;
                    PoolEntry::Other
                },
                5 | 6 => {
                    cursor.take(8, "CONSTANT_Long")?;
                    // Eight-byte constants occupy two slots.
                    entries.push(Some(PoolEntry::Other));
                    entries.push(None);
                    continue;
                },
                7 => PoolEntry::Class(cursor.u16("CONSTANT_Class")?),
                8 | 16 | 19 | 20 => {
                    cursor.take(2, "constant")?;
                    PoolEntry::Other
                },
                9..=12 | 17 | 18 => {
                    cursor.take(4, "constant")?;
                    PoolEntry::Other
                },
                15 => {
                    cursor.take(3, "CONSTANT_MethodHandle")?;
                    PoolEntry::Other
                },
                other => return Err(BytecodeError::UnsupportedConstant(other)),
            };
            entries.push(Some(entry));
        }
        if entries.len() > usize::from(count) {
            return Err(BytecodeError::malformed(
                "constant pool",
                "eight-byte constant overruns the pool",
            ));
        }
        Ok(Self { entries })
    }

    fn entry(&self, index: u16) -> Option<&PoolEntry> {
        self.entries.get(usize::from(index)).and_then(Option::as_ref)
    }

    fn utf8(&self, index: u16) -> BytecodeResult<&str> {
        match self.entry(index) {
            Some(PoolEntry::Utf8(value)) => Ok(value),
            _ => Err(BytecodeError::malformed(
                "constant pool",
                format!("entry {index} is not CONSTANT_Utf8"),
            )),
        }
    }

    fn integer(&self, index: u16) -> BytecodeResult<i32> {
        match self.entry(index) {
            Some(PoolEntry::Integer(value)) => Ok(*value),
            _ => Err(BytecodeError::malformed(
                "constant pool",
                format!("entry {index} is not CONSTANT_Integer"),
            )),
        }
    }

    fn class(&self, index: u16) -> BytecodeResult<&str> {
        match self.entry(index) {
            Some(PoolEntry::Class(name)) => self.utf8(*name),
            _ => Err(BytecodeError::malformed(
                "constant pool",
                format!("entry {index} is not CONSTANT_Class"),
            )),
        }
    }
}

/// A parsed class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    /// Minor version.
    pub minor_version: u16,
    /// Major version (52 = Java 8).
    pub major_version: u16,
    /// Class access flags.
    pub access_flags: u16,
    /// Internal name of this class.
    pub this_class: String,
    /// Internal name of the super class; `None` only for `java/lang/Object`.
    pub super_class: Option<String>,
    /// Internal names of implemented interfaces.
    pub interfaces: Vec<String>,
    /// Declared methods in class-file order.
    pub methods: Vec<MethodInfo>,
    /// Runtime-visible class annotations.
    pub annotations: Vec<Annotation>,
}

/// A declared method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// Method access flags.
    pub access_flags: u16,
    /// Method name.
    pub name: String,
    /// Method descriptor.
    pub descriptor: String,
    /// Generic signature, if present.
    pub signature: Option<String>,
    /// Declared exception classes.
    pub exceptions: Vec<String>,
    /// Method body; `None` for abstract and native methods.
    pub code: Option<CodeInfo>,
}

/// A `Code` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeInfo {
    /// Maximum operand stack depth.
    pub max_stack: u16,
    /// Local variable slots.
    pub max_locals: u16,
    /// Raw bytecode.
    pub code: Vec<u8>,
}

/// A runtime-visible annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Field descriptor of the annotation type.
    pub type_descriptor: String,
    /// Element name/value pairs in declaration order.
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    /// Value of element `name`, if present.
    #[must_use]
    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|(element, _)| element == name)
            .map(|(_, value)| value)
    }
}

/// An annotation element value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    /// `B`, `C`, `I`, `S` or `Z` constant.
    Int(i32),
    /// `s` constant.
    String(String),
    /// `e` constant.
    Enum {
        /// Enum type descriptor.
        type_descriptor: String,
        /// Constant name.
        name: String,
    },
    /// `c` class literal, as a return descriptor.
    Class(String),
    /// Nested annotation.
    Annotation(Annotation),
    /// Array of values.
    Array(Vec<ElementValue>),
    /// `J`, `D` or `F` constant, identified by tag.
    Other(u8),
}

impl ClassFile {
    /// Parse `bytes` as a class file.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is truncated, malformed, or uses a
    /// constant pool tag this reader does not know.
    pub fn parse(bytes: &[u8]) -> BytecodeResult<Self> {
        let mut cursor = ByteCursor::new(bytes);
        let magic = cursor.u32("magic")?;
        if magic != MAGIC {
            return Err(BytecodeError::malformed(
                "class file",
                format!("bad magic {magic:#010x}"),
            ));
        }
        let minor_version = cursor.u16("minor_version")?;
        let major_version = cursor.u16("major_version")?;
        let pool = Pool::parse(&mut cursor)?;
        let access_flags = cursor.u16("access_flags")?;
        let this_class = pool.class(cursor.u16("this_class")?)?.to_string();
        let super_index = cursor.u16("super_class")?;
        let super_class = if super_index == 0 {
            None
        } else {
            Some(pool.class(super_index)?.to_string())
        };

        let interface_count = cursor.u16("interfaces_count")?;
        let interfaces = (0..interface_count)
            .map(|_| Ok(pool.class(cursor.u16("interface")?)?.to_string()))
            .collect::<BytecodeResult<Vec<_>>>()?;

        let field_count = cursor.u16("fields_count")?;
        for _ in 0..field_count {
            cursor.take(6, "field_info")?;
            skip_attributes(&mut cursor)?;
        }

        let method_count = cursor.u16("methods_count")?;
        let methods = (0..method_count)
            .map(|_| parse_method(&mut cursor, &pool))
            .collect::<BytecodeResult<Vec<_>>>()?;

        let mut annotations = Vec::new();
        let attribute_count = cursor.u16("attributes_count")?;
        for _ in 0..attribute_count {
            let (name, payload) = read_attribute(&mut cursor, &pool)?;
            if name == "RuntimeVisibleAnnotations" {
                let mut inner = ByteCursor::new(payload);
                let count = inner.u16("num_annotations")?;
                for _ in 0..count {
                    annotations.push(parse_annotation(&mut inner, &pool)?);
                }
            }
        }

        if !cursor.remaining().is_empty() {
            return Err(BytecodeError::malformed(
                "class file",
                "trailing bytes after attributes",
            ));
        }

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            methods,
            annotations,
        })
    }

    /// Annotation of type `descriptor`, if present.
    #[must_use]
    pub fn annotation(&self, descriptor: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.type_descriptor == descriptor)
    }

    /// Method named `name`, if present.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// The class's `kotlin.Metadata` header.
    ///
    /// Missing elements take the annotation's declared defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BytecodeError::MissingMetadata`] if the annotation is
    /// absent, or [`BytecodeError::Malformed`] if an element has the wrong
    /// shape or the kind is unknown.
    pub fn kotlin_metadata(&self) -> BytecodeResult<MetadataHeader> {
        let annotation = self
            .annotation(KOTLIN_METADATA_DESCRIPTOR)
            .ok_or(BytecodeError::MissingMetadata)?;

        let kind_value = match annotation.element("k") {
            Some(value) => int_element("k", value)?,
            None => 1,
        };
        let kind = MetadataKind::from_i32(kind_value).ok_or_else(|| {
            BytecodeError::malformed("kotlin.Metadata", format!("unknown kind {kind_value}"))
        })?;

        Ok(MetadataHeader {
            metadata_version: annotation
                .element("mv")
                .map_or(Ok(Vec::new()), |v| int_array_element("mv", v))?,
            bytecode_version: annotation
                .element("bv")
                .map_or_else(|| Ok(DEFAULT_BYTECODE_VERSION.to_vec()), |v| {
                    int_array_element("bv", v)
                })?,
            kind,
            data1: annotation
                .element("d1")
                .map_or(Ok(Vec::new()), |v| string_array_element("d1", v))?,
            data2: annotation
                .element("d2")
                .map_or(Ok(Vec::new()), |v| string_array_element("d2", v))?,
            extra_int: annotation
                .element("xi")
                .map_or(Ok(0), |v| int_element("xi", v))?,
        })
    }
}

fn int_element(name: &str, value: &ElementValue) -> BytecodeResult<i32> {
    match value {
        ElementValue::Int(v) => Ok(*v),
        other => Err(BytecodeError::malformed(
            "kotlin.Metadata",
            format!("{name} is not an int: {other:?}"),
        )),
    }
}

fn int_array_element(name: &str, value: &ElementValue) -> BytecodeResult<Vec<i32>> {
    match value {
        ElementValue::Array(values) => values.iter().map(|v| int_element(name, v)).collect(),
        other => Err(BytecodeError::malformed(
            "kotlin.Metadata",
            format!("{name} is not an int array: {other:?}"),
        )),
    }
}

fn string_array_element(name: &str, value: &ElementValue) -> BytecodeResult<Vec<String>> {
    match value {
        ElementValue::Array(values) => values
            .iter()
            .map(|v| match v {
                ElementValue::String(s) => Ok(s.clone()),
                other => Err(BytecodeError::malformed(
                    "kotlin.Metadata",
                    format!("{name} element is not a string: {other:?}"),
                )),
            })
            .collect(),
        other => Err(BytecodeError::malformed(
            "kotlin.Metadata",
            format!("{name} is not a string array: {other:?}"),
        )),
    }
}

fn read_attribute<'c, 'p>(
    cursor: &mut ByteCursor<'c>,
    pool: &'p Pool,
) -> BytecodeResult<(&'p str, &'c [u8])> {
    let name = pool.utf8(cursor.u16("attribute_name_index")?)?;
    let len = cursor.u32("attribute_length")?;
    let len = usize::try_from(len).map_err(|_| BytecodeError::Truncated("attribute"))?;
    Ok((name, cursor.take(len, "attribute")?))
}

fn skip_attributes(cursor: &mut ByteCursor<'_>) -> BytecodeResult<()> {
    let count = cursor.u16("attributes_count")?;
    for _ in 0..count {
        cursor.take(2, "attribute_name_index")?;
        let len = cursor.u32("attribute_length")?;
        let len = usize::try_from(len).map_err(|_| BytecodeError::Truncated("attribute"))?;
        cursor.take(len, "attribute")?;
    }
    Ok(())
}

fn parse_method(cursor: &mut ByteCursor<'_>, pool: &Pool) -> BytecodeResult<MethodInfo> {
    let access_flags = cursor.u16("method access_flags")?;
    let name = pool.utf8(cursor.u16("method name_index")?)?.to_string();
    let descriptor = pool.utf8(cursor.u16("method descriptor_index")?)?.to_string();

    let mut method = MethodInfo {
        access_flags,
        name,
        descriptor,
        signature: None,
        exceptions: Vec::new(),
        code: None,
    };

    let attribute_count = cursor.u16("method attributes_count")?;
    for _ in 0..attribute_count {
        let (name, payload) = read_attribute(cursor, pool)?;
        let mut inner = ByteCursor::new(payload);
        match name {
            "Code" => {
                let max_stack = inner.u16("max_stack")?;
                let max_locals = inner.u16("max_locals")?;
                let code_len = inner.u32("code_length")?;
                let code_len =
                    usize::try_from(code_len).map_err(|_| BytecodeError::Truncated("code"))?;
                let code = inner.take(code_len, "code")?.to_vec();
                let handlers = inner.u16("exception_table_length")?;
                inner.take(usize::from(handlers).saturating_mul(8), "exception_table")?;
                skip_attributes(&mut inner)?;
                method.code = Some(CodeInfo {
                    max_stack,
                    max_locals,
                    code,
                });
            },
            "Signature" => {
                method.signature = Some(pool.utf8(inner.u16("signature_index")?)?.to_string());
            },
            "Exceptions" => {
                let count = inner.u16("number_of_exceptions")?;
                for _ in 0..count {
                    method
                        .exceptions
                        .push(pool.class(inner.u16("exception_index")?)?.to_string());
                }
            },
            _ => {},
        }
    }
    Ok(method)
}

fn parse_annotation(cursor: &mut ByteCursor<'_>, pool: &Pool) -> BytecodeResult<Annotation> {
    let type_descriptor = pool.utf8(cursor.u16("annotation type_index")?)?.to_string();
    let pairs = cursor.u16("num_element_value_pairs")?;
    let mut elements = Vec::with_capacity(usize::from(pairs));
    for _ in 0..pairs {
        let name = pool.utf8(cursor.u16("element_name_index")?)?.to_string();
        elements.push((name, parse_element_value(cursor, pool)?));
    }
    Ok(Annotation {
        type_descriptor,
        elements,
    })
}

fn parse_element_value(cursor: &mut ByteCursor<'_>, pool: &Pool) -> BytecodeResult<ElementValue> {
    let tag = cursor.u8("element_value tag")?;
    let value = match tag {
        b'B' | b'C' | b'I' | b'S' | b'Z' => {
            ElementValue::Int(pool.integer(cursor.u16("const_value_index")?)?)
        },
        b'J' | b'D' | b'F' => {
            cursor.u16("const_value_index")?;
            ElementValue::Other(tag)
        },
        b's' => ElementValue::String(pool.utf8(cursor.u16("const_value_index")?)?.to_string()),
        b'e' => ElementValue::Enum {
            type_descriptor: pool.utf8(cursor.u16("type_name_index")?)?.to_string(),
            name: pool.utf8(cursor.u16("const_name_index")?)?.to_string(),
        },
        b'c' => ElementValue::Class(pool.utf8(cursor.u16("class_info_index")?)?.to_string()),
        b'@' => ElementValue::Annotation(parse_annotation(cursor, pool)?),
        b'[' => {
            let count = cursor.u16("num_values")?;
            let values = (0..count)
                .map(|_| parse_element_value(cursor, pool))
                .collect::<BytecodeResult<Vec<_>>>()?;
            ElementValue::Array(values)
        },
        other => {
            return Err(BytecodeError::malformed(
                "element_value",
                format!("unknown tag {:?}", char::from(other)),
            ));
        },
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_writer::public_kotlin_class;
    use crate::header::write_file_facade_class_header;
    use crate::names::InternalName;
    use crate::signature::JvmMethodSignature;
    use crate::types::KmType;

    fn header() -> MetadataHeader {
        write_file_facade_class_header(|facade| {
            facade.write_property_of(
                KmType::class("org/gradle/api/Project"),
                KmType::class("kotlin/String"),
                "displayName",
                JvmMethodSignature::new(
                    "getDisplayName",
                    "(Lorg/gradle/api/Project;)Ljava/lang/String;",
                ),
            );
        })
    }

    #[test]
    fn test_metadata_annotation_round_trip() {
        let header = header();
        let bytes = public_kotlin_class(
            &InternalName::new("org/gradle/kotlin/dsl/DisplayNameKt"),
            &header,
            |_| Ok(()),
        )
        .unwrap();

        let class = ClassFile::parse(&bytes).unwrap();
        let annotation = class.annotation("Lkotlin/Metadata;").unwrap();
        let names: Vec<&str> = annotation.elements.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["mv", "bv", "k", "xi", "d1", "d2"]);
        assert_eq!(annotation.element("k"), Some(&ElementValue::Int(2)));
        assert_eq!(class.kotlin_metadata().unwrap(), header);
    }

    #[test]
    fn test_missing_metadata() {
        let bytes = crate::class_writer::ClassWriter::public_class(&InternalName::new("a/B"))
            .unwrap()
            .into_bytes()
            .unwrap();
        let class = ClassFile::parse(&bytes).unwrap();
        assert!(matches!(
            class.kotlin_metadata(),
            Err(BytecodeError::MissingMetadata)
        ));
    }

    #[test]
    fn test_bad_magic() {
        let err = ClassFile::parse(&[0, 0, 0, 0, 0, 0, 0, 52]).unwrap_err();
        assert!(matches!(err, BytecodeError::Malformed { .. }));
    }

    #[test]
    fn test_truncated_input() {
        let bytes = public_kotlin_class(&InternalName::new("a/BKt"), &header(), |_| Ok(())).unwrap();
        for len in [3, 10, bytes.len().saturating_sub(1)] {
            assert!(ClassFile::parse(&bytes[..len]).is_err(), "len {len}");
        }
    }

    #[test]
    fn test_unsupported_constant_tag() {
        // magic, version, pool count 2, tag 2 (unused by the JVM)
        let bytes = [0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 2, 2];
        assert!(matches!(
            ClassFile::parse(&bytes),
            Err(BytecodeError::UnsupportedConstant(2))
        ));
    }

    #[test]
    fn test_long_constant_takes_two_slots() {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
        // count 5: #1 Long (#2 unusable), #3 Utf8 "A", #4 Class #3
        bytes.extend_from_slice(&[0, 5]);
        bytes.extend_from_slice(&[5, 0, 0, 0, 0, 0, 0, 0, 1]);
        bytes.extend_from_slice(&[1, 0, 1, b'A']);
        bytes.extend_from_slice(&[7, 0, 3]);
        // access, this=#4, super=0, no interfaces/fields/methods/attributes
        bytes.extend_from_slice(&[0, 0x21, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.this_class, "A");
        assert_eq!(class.super_class, None);
    }

    #[test]
    fn test_unknown_kind_is_malformed() {
        let mut header = header();
        header.kind = MetadataKind::Class;
        let bytes = public_kotlin_class(&InternalName::new("a/BKt"), &header, |_| Ok(())).unwrap();
        // Patch the CONSTANT_Integer holding k=1 to 9.
        let needle = [3_u8, 0, 0, 0, 1];
        let at = bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap();
        let mut patched = bytes.clone();
        patched[at.saturating_add(4)] = 9;
        let class = ClassFile::parse(&patched).unwrap();
        assert!(matches!(
            class.kotlin_metadata(),
            Err(BytecodeError::Malformed { .. })
        ));
    }
}
