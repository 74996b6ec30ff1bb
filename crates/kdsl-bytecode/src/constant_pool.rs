//! Class-file constant pool with de-duplication.

use std::collections::HashMap;

use crate::error::{BytecodeError, BytecodeResult};
use crate::mutf8;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Constant {
    Utf8(String),
    Integer(i32),
    Class(u16),
    String(u16),
    Fieldref(u16, u16),
    Methodref(u16, u16),
    InterfaceMethodref(u16, u16),
    NameAndType(u16, u16),
}

/// Kind of member reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberKind {
    Field,
    Method,
    InterfaceMethod,
}

/// Constant pool under construction. Index 0 is reserved.
#[derive(Debug, Default)]
pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
    index: HashMap<Constant, u16>,
}

impl ConstantPool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, constant: Constant) -> BytecodeResult<u16> {
        if let Some(index) = self.index.get(&constant) {
            return Ok(*index);
        }
        let index = self
            .entries
            .len()
            .checked_add(1)
            .and_then(|i| u16::try_from(i).ok())
            .filter(|i| *i < u16::MAX)
            .ok_or(BytecodeError::ConstantPoolOverflow)?;
        self.entries.push(constant.clone());
        self.index.insert(constant, index);
        Ok(index)
    }

    pub(crate) fn utf8(&mut self, value: &str) -> BytecodeResult<u16> {
        let len = mutf8::encoded_len(value);
        if len > usize::from(u16::MAX) {
            return Err(BytecodeError::AttributeTooLarge {
                what: "CONSTANT_Utf8",
                len,
            });
        }
        self.add(Constant::Utf8(value.to_string()))
    }

    pub(crate) fn integer(&mut self, value: i32) -> BytecodeResult<u16> {
        self.add(Constant::Integer(value))
    }

    pub(crate) fn class(&mut self, internal_name: &str) -> BytecodeResult<u16> {
        let name = self.utf8(internal_name)?;
        self.add(Constant::Class(name))
    }

    pub(crate) fn string(&mut self, value: &str) -> BytecodeResult<u16> {
        let utf8 = self.utf8(value)?;
        self.add(Constant::String(utf8))
    }

    pub(crate) fn name_and_type(&mut self, name: &str, desc: &str) -> BytecodeResult<u16> {
        let name = self.utf8(name)?;
        let desc = self.utf8(desc)?;
        self.add(Constant::NameAndType(name, desc))
    }

    pub(crate) fn member(
        &mut self,
        kind: MemberKind,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> BytecodeResult<u16> {
        let class = self.class(owner)?;
        let name_and_type = self.name_and_type(name, desc)?;
        self.add(match kind {
            MemberKind::Field => Constant::Fieldref(class, name_and_type),
            MemberKind::Method => Constant::Methodref(class, name_and_type),
            MemberKind::InterfaceMethod => Constant::InterfaceMethodref(class, name_and_type),
        })
    }

    /// `constant_pool_count` followed by the entries.
    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        // `add` keeps entries.len() + 1 below u16::MAX.
        let count = u16::try_from(self.entries.len().saturating_add(1)).unwrap_or(u16::MAX);
        out.extend_from_slice(&count.to_be_bytes());
        for entry in &self.entries {
            match entry {
                Constant::Utf8(value) => {
                    let bytes = mutf8::encode(value);
                    out.push(TAG_UTF8);
                    // `utf8` checked the length.
                    let len = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
                    out.extend_from_slice(&len.to_be_bytes());
                    out.extend_from_slice(&bytes);
                },
                Constant::Integer(value) => {
                    out.push(TAG_INTEGER);
                    out.extend_from_slice(&value.to_be_bytes());
                },
                Constant::Class(name) => write_u16_entry(out, TAG_CLASS, *name),
                Constant::String(utf8) => write_u16_entry(out, TAG_STRING, *utf8),
                Constant::Fieldref(a, b) => write_pair_entry(out, TAG_FIELDREF, *a, *b),
                Constant::Methodref(a, b) => write_pair_entry(out, TAG_METHODREF, *a, *b),
                Constant::InterfaceMethodref(a, b) => {
                    write_pair_entry(out, TAG_INTERFACE_METHODREF, *a, *b);
                },
                Constant::NameAndType(a, b) => write_pair_entry(out, TAG_NAME_AND_TYPE, *a, *b),
            }
        }
    }
}

fn write_u16_entry(out: &mut Vec<u8>, tag: u8, value: u16) {
    out.push(tag);
    out.extend_from_slice(&value.to_be_bytes());
}

fn write_pair_entry(out: &mut Vec<u8>, tag: u8, a: u16, b: u16) {
    out.push(tag);
    out.extend_from_slice(&a.to_be_bytes());
    out.extend_from_slice(&b.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexes_start_at_one_and_dedupe() {
        let mut pool = ConstantPool::new();
        assert_eq!(pool.utf8("a").unwrap(), 1);
        assert_eq!(pool.utf8("b").unwrap(), 2);
        assert_eq!(pool.utf8("a").unwrap(), 1);
        assert_eq!(pool.class("a").unwrap(), 3);
        assert_eq!(pool.class("a").unwrap(), 3);
    }

    #[test]
    fn test_member_reference_shares_entries() {
        let mut pool = ConstantPool::new();
        let m1 = pool
            .member(MemberKind::Method, "java/lang/Object", "<init>", "()V")
            .unwrap();
        let m2 = pool
            .member(MemberKind::Method, "java/lang/Object", "<init>", "()V")
            .unwrap();
        let i1 = pool
            .member(MemberKind::InterfaceMethod, "java/lang/Object", "<init>", "()V")
            .unwrap();
        assert_eq!(m1, m2);
        assert_ne!(m1, i1);
    }

    #[test]
    fn test_serialised_layout() {
        let mut pool = ConstantPool::new();
        pool.class("A").unwrap();
        let mut out = Vec::new();
        pool.write_to(&mut out);
        assert_eq!(out, vec![0, 3, 1, 0, 1, b'A', 7, 0, 1]);
    }

    #[test]
    fn test_oversized_utf8_rejected() {
        let mut pool = ConstantPool::new();
        let huge = "x".repeat(70_000);
        assert!(matches!(
            pool.utf8(&huge),
            Err(BytecodeError::AttributeTooLarge { what: "CONSTANT_Utf8", .. })
        ));
    }

    #[test]
    fn test_overflow() {
        let mut pool = ConstantPool::new();
        for i in 0..65534 {
            pool.integer(i).unwrap();
        }
        assert!(matches!(
            pool.integer(-1),
            Err(BytecodeError::ConstantPoolOverflow)
        ));
    }
}
