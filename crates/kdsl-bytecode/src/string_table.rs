//! The `d2` string table and its `StringTableTypes` record list.
//!
//! Plain strings share run-length records. Each class name gets its own
//! record whose operation turns the stored internal form back into a Kotlin
//! class name when read.

use std::collections::HashMap;

use crate::error::{BytecodeError, BytecodeResult};
use crate::names::ClassName;
use crate::wire::{ProtoReader, ProtoWriter};

// StringTableTypes
const TYPES_RECORD: u32 = 1;

// StringTableTypes.Record
const RECORD_RANGE: u32 = 1;
const RECORD_PREDEFINED_INDEX: u32 = 2;
const RECORD_OPERATION: u32 = 3;
const RECORD_SUBSTRING_INDEX: u32 = 4;
const RECORD_REPLACE_CHAR: u32 = 5;
const RECORD_STRING: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    None,
    /// `a/b/Outer$Inner` → `a/b/Outer.Inner`
    InternalToClassId,
    /// `La/b/Outer$Inner;` → `a/b/Outer.Inner`
    DescToClassId,
}

impl Operation {
    fn from_proto(value: i32) -> BytecodeResult<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::InternalToClassId),
            2 => Ok(Self::DescToClassId),
            other => Err(BytecodeError::malformed(
                "StringTableTypes.Record",
                format!("unknown operation {other}"),
            )),
        }
    }

    fn to_proto(self) -> i32 {
        match self {
            Self::None => 0,
            Self::InternalToClassId => 1,
            Self::DescToClassId => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Record {
    range: i32,
    operation: Operation,
}

/// Interns strings and class names while metadata is written.
#[derive(Debug, Default)]
pub(crate) struct StringTableBuilder {
    strings: Vec<String>,
    records: Vec<Record>,
    plain: HashMap<String, i32>,
    classes: HashMap<ClassName, i32>,
}

impl StringTableBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Index of `value` as a plain string.
    pub(crate) fn string_index(&mut self, value: &str) -> i32 {
        if let Some(index) = self.plain.get(value) {
            return *index;
        }
        let index = self.push(value.to_string());
        match self.records.last_mut() {
            Some(last) if last.operation == Operation::None => {
                last.range = last.range.saturating_add(1);
            },
            _ => self.records.push(Record {
                range: 1,
                operation: Operation::None,
            }),
        }
        self.plain.insert(value.to_string(), index);
        index
    }

    /// Index of `name` as a class name.
    pub(crate) fn class_name_index(&mut self, name: &ClassName) -> i32 {
        if let Some(index) = self.classes.get(name) {
            return *index;
        }
        let index = self.push(name.to_internal().as_str().to_string());
        self.records.push(Record {
            range: 1,
            operation: Operation::InternalToClassId,
        });
        self.classes.insert(name.clone(), index);
        index
    }

    fn push(&mut self, value: String) -> i32 {
        let index = i32::try_from(self.strings.len()).unwrap_or(i32::MAX);
        self.strings.push(value);
        index
    }

    /// Serialise into the `StringTableTypes` message and the `d2` strings.
    pub(crate) fn finish(self) -> (ProtoWriter, Vec<String>) {
        let mut types = ProtoWriter::new();
        for record in &self.records {
            let mut message = ProtoWriter::new();
            if record.range != 1 {
                message.int32(RECORD_RANGE, record.range);
            }
            if record.operation != Operation::None {
                message.int32(RECORD_OPERATION, record.operation.to_proto());
            }
            types.message(TYPES_RECORD, &message);
        }
        (types, self.strings)
    }
}

/// Resolves string table indexes of decoded metadata.
#[derive(Debug)]
pub(crate) struct StringTable {
    resolved: Vec<String>,
}

impl StringTable {
    /// Decode `StringTableTypes` and apply it to `strings`.
    pub(crate) fn parse(types: &[u8], strings: &[String]) -> BytecodeResult<Self> {
        const WHAT: &str = "StringTableTypes";
        let mut resolved = Vec::with_capacity(strings.len());
        let mut reader = ProtoReader::new(types);

        // Local class names (field 5) are never produced here.
        while let Some((field, value)) = reader.next_field(WHAT)? {
            if field != TYPES_RECORD {
                continue;
            }
            let record = RawRecord::parse(value.as_bytes(WHAT)?)?;
            for _ in 0..record.range {
                let Some(raw) = strings.get(resolved.len()) else {
                    return Err(BytecodeError::malformed(
                        WHAT,
                        "records cover more strings than d2 holds",
                    ));
                };
                resolved.push(record.apply(raw)?);
            }
        }

        // Strings past the last record are used verbatim.
        for raw in strings.iter().skip(resolved.len()) {
            resolved.push(raw.clone());
        }

        Ok(Self { resolved })
    }

    /// Resolved string at `index`.
    pub(crate) fn get(&self, index: i32) -> BytecodeResult<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.resolved.get(i))
            .map(String::as_str)
            .ok_or_else(|| {
                BytecodeError::malformed("string table", format!("index {index} out of range"))
            })
    }

    /// Class name at `index`.
    pub(crate) fn class_name(&self, index: i32) -> BytecodeResult<ClassName> {
        self.get(index).map(ClassName::from)
    }
}

struct RawRecord {
    range: u32,
    operation: Operation,
    string: Option<String>,
    substring: Vec<i32>,
    replace_char: Vec<i32>,
}

impl RawRecord {
    fn parse(bytes: &[u8]) -> BytecodeResult<Self> {
        const WHAT: &str = "StringTableTypes.Record";
        let mut record = Self {
            range: 1,
            operation: Operation::None,
            string: None,
            substring: Vec::new(),
            replace_char: Vec::new(),
        };
        let mut reader = ProtoReader::new(bytes);
        while let Some((field, value)) = reader.next_field(WHAT)? {
            match field {
                RECORD_RANGE => {
                    record.range = u32::try_from(value.as_i32(WHAT)?)
                        .map_err(|_| BytecodeError::malformed(WHAT, "negative range"))?;
                },
                RECORD_PREDEFINED_INDEX => {
                    return Err(BytecodeError::malformed(
                        WHAT,
                        "predefined strings are not supported",
                    ));
                },
                RECORD_OPERATION => record.operation = Operation::from_proto(value.as_i32(WHAT)?)?,
                RECORD_SUBSTRING_INDEX => value.push_int32s(&mut record.substring, WHAT)?,
                RECORD_REPLACE_CHAR => value.push_int32s(&mut record.replace_char, WHAT)?,
                RECORD_STRING => record.string = Some(value.as_string(WHAT)?),
                _ => {},
            }
        }
        Ok(record)
    }

    fn apply(&self, raw: &str) -> BytecodeResult<String> {
        const WHAT: &str = "StringTableTypes.Record";
        let mut value = self.string.clone().unwrap_or_else(|| raw.to_string());

        if let [begin, end, ..] = self.substring[..] {
            let chars: Vec<char> = value.chars().collect();
            let range = usize::try_from(begin)
                .ok()
                .zip(usize::try_from(end).ok())
                .and_then(|(b, e)| chars.get(b..e))
                .ok_or_else(|| BytecodeError::malformed(WHAT, "substring out of range"))?;
            value = range.iter().collect();
        }

        if let [from, to, ..] = self.replace_char[..] {
            let from = char_from(from)?;
            let to = char_from(to)?;
            value = value.replace(from, &to.to_string());
        }

        Ok(match self.operation {
            Operation::None => value,
            Operation::InternalToClassId => value.replace('$', "."),
            Operation::DescToClassId => {
                let mut chars = value.chars();
                chars.next();
                chars.next_back();
                chars.as_str().replace('$', ".")
            },
        })
    }
}

fn char_from(code: i32) -> BytecodeResult<char> {
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| BytecodeError::malformed("StringTableTypes.Record", "invalid replace char"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(builder: StringTableBuilder) -> (Vec<String>, StringTable) {
        let (types, strings) = builder.finish();
        let table = StringTable::parse(types.as_bytes(), &strings).unwrap();
        (strings, table)
    }

    #[test]
    fn test_interning_is_stable() {
        let mut builder = StringTableBuilder::new();
        let a = builder.string_index("name");
        let b = builder.string_index("getName");
        assert_eq!(builder.string_index("name"), a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_plain_strings_share_one_record() {
        let mut builder = StringTableBuilder::new();
        builder.string_index("a");
        builder.string_index("b");
        builder.string_index("c");
        let (types, _) = builder.finish();
        // one record: key 0x0A, length 2, range field (0x08 0x03)
        assert_eq!(types.as_bytes(), &[0x0A, 0x02, 0x08, 0x03]);
    }

    #[test]
    fn test_class_names_and_strings_are_separate() {
        let mut builder = StringTableBuilder::new();
        let plain = builder.string_index("kotlin/Unit");
        let class = builder.class_name_index(&ClassName::new("kotlin/Unit"));
        assert_ne!(plain, class);

        let (strings, table) = round_trip(builder);
        assert_eq!(strings, vec!["kotlin/Unit", "kotlin/Unit"]);
        assert_eq!(table.get(plain).unwrap(), "kotlin/Unit");
        assert_eq!(table.class_name(class).unwrap().as_str(), "kotlin/Unit");
    }

    #[test]
    fn test_nested_class_name_round_trip() {
        let mut builder = StringTableBuilder::new();
        let name = ClassName::new("kotlin/collections/Map.Entry");
        let index = builder.class_name_index(&name);
        let (strings, table) = round_trip(builder);
        assert_eq!(strings[0], "kotlin/collections/Map$Entry");
        assert_eq!(table.class_name(index).unwrap(), name);
    }

    #[test]
    fn test_record_operations_on_read() {
        let mut types = ProtoWriter::new();
        let mut desc = ProtoWriter::new();
        desc.int32(RECORD_OPERATION, 2);
        types.message(TYPES_RECORD, &desc);
        let mut replace = ProtoWriter::new();
        replace.packed_int32(RECORD_REPLACE_CHAR, &[i32::from(b'/'), i32::from(b'.')]);
        replace.packed_int32(RECORD_SUBSTRING_INDEX, &[0, 3]);
        types.message(TYPES_RECORD, &replace);

        let strings = vec!["La/B$C;".to_string(), "a/bcd".to_string()];
        let table = StringTable::parse(types.as_bytes(), &strings).unwrap();
        assert_eq!(table.get(0).unwrap(), "a/B.C");
        assert_eq!(table.get(1).unwrap(), "a.b");
    }

    #[test]
    fn test_out_of_range_index() {
        let table = StringTable::parse(&[], &[]).unwrap();
        assert!(table.get(0).is_err());
        assert!(table.get(-1).is_err());
    }
}
