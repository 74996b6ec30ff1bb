//! Protocol Buffers wire format, limited to what Kotlin metadata uses:
//! varints, length-delimited fields, packed repeated `int32`.
//!
//! Fields are written in the order the caller emits them. Callers emit them
//! in ascending field number.

use crate::error::{BytecodeError, BytecodeResult};

const WIRE_VARINT: u32 = 0;
const WIRE_FIXED64: u32 = 1;
const WIRE_LEN: u32 = 2;
const WIRE_FIXED32: u32 = 5;

/// Growable protobuf message buffer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ProtoWriter {
    buf: Vec<u8>,
}

impl ProtoWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn int32(&mut self, field: u32, value: i32) {
        self.key(field, WIRE_VARINT);
        // Negative int32 values are sign-extended to ten bytes.
        self.varint(i64::from(value).cast_unsigned());
    }

    pub(crate) fn bool(&mut self, field: u32, value: bool) {
        self.key(field, WIRE_VARINT);
        self.varint(u64::from(value));
    }

    pub(crate) fn bytes(&mut self, field: u32, data: &[u8]) {
        self.key(field, WIRE_LEN);
        self.varint(data.len() as u64);
        self.buf.extend_from_slice(data);
    }

    pub(crate) fn string(&mut self, field: u32, value: &str) {
        self.bytes(field, value.as_bytes());
    }

    pub(crate) fn message(&mut self, field: u32, message: &ProtoWriter) {
        self.bytes(field, &message.buf);
    }

    /// Packed repeated `int32`; nothing is written for an empty slice.
    pub(crate) fn packed_int32(&mut self, field: u32, values: &[i32]) {
        if values.is_empty() {
            return;
        }
        let mut packed = ProtoWriter::new();
        for value in values {
            packed.varint(i64::from(*value).cast_unsigned());
        }
        self.bytes(field, &packed.buf);
    }

    /// Append `message` prefixed with its varint length.
    pub(crate) fn delimited(&mut self, message: &ProtoWriter) {
        self.varint(message.buf.len() as u64);
        self.buf.extend_from_slice(&message.buf);
    }

    /// Append a message body without a key.
    pub(crate) fn raw(&mut self, message: &ProtoWriter) {
        self.buf.extend_from_slice(&message.buf);
    }

    // Safety: field numbers used by this crate are < 2^29, so the shift fits.
    #[allow(clippy::arithmetic_side_effects)]
    fn key(&mut self, field: u32, wire_type: u32) {
        self.varint(u64::from((field << 3) | wire_type));
    }

    // Safety: right shifts by 7 on a u64 cannot overflow.
    #[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
    fn varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value & 0x7f) as u8 | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }
}

/// One decoded field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WireValue<'a> {
    Varint(u64),
    Fixed64(u64),
    Bytes(&'a [u8]),
    Fixed32(u32),
}

impl<'a> WireValue<'a> {
    /// Interpret as `int32`: the low 32 bits of the varint.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn as_i32(self, what: &'static str) -> BytecodeResult<i32> {
        match self {
            Self::Varint(v) => Ok((v as u32).cast_signed()),
            _ => Err(BytecodeError::malformed(what, "expected a varint field")),
        }
    }

    pub(crate) fn as_bool(self, what: &'static str) -> BytecodeResult<bool> {
        match self {
            Self::Varint(v) => Ok(v != 0),
            _ => Err(BytecodeError::malformed(what, "expected a varint field")),
        }
    }

    pub(crate) fn as_bytes(self, what: &'static str) -> BytecodeResult<&'a [u8]> {
        match self {
            Self::Bytes(b) => Ok(b),
            _ => Err(BytecodeError::malformed(
                what,
                "expected a length-delimited field",
            )),
        }
    }

    pub(crate) fn as_string(self, what: &'static str) -> BytecodeResult<String> {
        let bytes = self.as_bytes(what)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| BytecodeError::InvalidUtf8(what))
    }

    /// Append a repeated `int32`, accepting both packed and unpacked encodings.
    pub(crate) fn push_int32s(self, out: &mut Vec<i32>, what: &'static str) -> BytecodeResult<()> {
        match self {
            Self::Bytes(packed) => {
                let mut reader = ProtoReader::new(packed);
                while !reader.is_at_end() {
                    out.push(WireValue::Varint(reader.varint(what)?).as_i32(what)?);
                }
                Ok(())
            },
            value => {
                out.push(value.as_i32(what)?);
                Ok(())
            },
        }
    }
}

/// Sequential reader over one protobuf message.
pub(crate) struct ProtoReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ProtoReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read a varint length followed by that many bytes.
    pub(crate) fn delimited(&mut self, what: &'static str) -> BytecodeResult<&'a [u8]> {
        let len = self.varint(what)?;
        let len = usize::try_from(len).map_err(|_| BytecodeError::Truncated(what))?;
        self.take(len, what)
    }

    /// Everything not consumed yet.
    pub(crate) fn rest(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }

    /// Next `(field number, value)`, or `None` at the end of the message.
    // Safety: the shift by 3 cannot overflow a u64.
    #[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
    pub(crate) fn next_field(
        &mut self,
        what: &'static str,
    ) -> BytecodeResult<Option<(u32, WireValue<'a>)>> {
        if self.is_at_end() {
            return Ok(None);
        }
        let key = self.varint(what)?;
        let field = (key >> 3) as u32;
        if field == 0 {
            return Err(BytecodeError::malformed(what, "field number 0"));
        }
        let value = match (key & 0x7) as u32 {
            WIRE_VARINT => WireValue::Varint(self.varint(what)?),
            WIRE_FIXED64 => {
                let mut raw = [0_u8; 8];
                raw.copy_from_slice(self.take(8, what)?);
                WireValue::Fixed64(u64::from_le_bytes(raw))
            },
            WIRE_LEN => WireValue::Bytes(self.delimited(what)?),
            WIRE_FIXED32 => {
                let mut raw = [0_u8; 4];
                raw.copy_from_slice(self.take(4, what)?);
                WireValue::Fixed32(u32::from_le_bytes(raw))
            },
            other => {
                return Err(BytecodeError::malformed(
                    what,
                    format!("unsupported wire type {other}"),
                ));
            },
        };
        Ok(Some((field, value)))
    }

    // Safety: shift stays below 64 (checked) and pos < data.len() before increment.
    #[allow(clippy::arithmetic_side_effects)]
    fn varint(&mut self, what: &'static str) -> BytecodeResult<u64> {
        let mut value = 0_u64;
        let mut shift = 0_u32;
        loop {
            let byte = *self
                .data
                .get(self.pos)
                .ok_or(BytecodeError::Truncated(what))?;
            self.pos += 1;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(BytecodeError::malformed(what, "varint longer than ten bytes"));
            }
        }
    }

    fn take(&mut self, len: usize, what: &'static str) -> BytecodeResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(BytecodeError::Truncated(what))?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(BytecodeError::Truncated(what))?;
        self.pos = end;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_encoding() {
        let mut w = ProtoWriter::new();
        w.int32(1, 300);
        // key 0x08, 300 = 0b1_0010_1100 → AC 02
        assert_eq!(w.as_bytes(), &[0x08, 0xAC, 0x02]);
    }

    #[test]
    fn test_negative_int32_is_ten_bytes() {
        let mut w = ProtoWriter::new();
        w.int32(1, -1);
        assert_eq!(w.as_bytes().len(), 11);

        let mut r = ProtoReader::new(w.as_bytes());
        let (field, value) = r.next_field("test").unwrap().unwrap();
        assert_eq!(field, 1);
        assert_eq!(value.as_i32("test").unwrap(), -1);
    }

    #[test]
    fn test_string_and_nested_message() {
        let mut inner = ProtoWriter::new();
        inner.int32(2, 7);
        let mut outer = ProtoWriter::new();
        outer.string(1, "kotlin");
        outer.message(3, &inner);

        let mut r = ProtoReader::new(outer.as_bytes());
        let (f1, v1) = r.next_field("outer").unwrap().unwrap();
        assert_eq!((f1, v1.as_string("name").unwrap().as_str()), (1, "kotlin"));
        let (f3, v3) = r.next_field("outer").unwrap().unwrap();
        assert_eq!(f3, 3);
        let mut nested = ProtoReader::new(v3.as_bytes("inner").unwrap());
        let (f2, v2) = nested.next_field("inner").unwrap().unwrap();
        assert_eq!((f2, v2.as_i32("x").unwrap()), (2, 7));
        assert!(r.next_field("outer").unwrap().is_none());
    }

    #[test]
    fn test_packed_and_unpacked_int32s() {
        let mut packed = ProtoWriter::new();
        packed.packed_int32(5, &[1, 2, 150]);
        let mut unpacked = ProtoWriter::new();
        unpacked.int32(5, 1);
        unpacked.int32(5, 2);
        unpacked.int32(5, 150);

        for bytes in [packed.as_bytes(), unpacked.as_bytes()] {
            let mut r = ProtoReader::new(bytes);
            let mut out = Vec::new();
            while let Some((_, value)) = r.next_field("ints").unwrap() {
                value.push_int32s(&mut out, "ints").unwrap();
            }
            assert_eq!(out, vec![1, 2, 150]);
        }
    }

    #[test]
    fn test_empty_packed_writes_nothing() {
        let mut w = ProtoWriter::new();
        w.packed_int32(5, &[]);
        assert!(w.as_bytes().is_empty());
    }

    #[test]
    fn test_delimited_then_rest() {
        let mut head = ProtoWriter::new();
        head.int32(1, 1);
        let mut tail = ProtoWriter::new();
        tail.int32(2, 2);

        let mut out = ProtoWriter::new();
        out.delimited(&head);
        out.raw(&tail);

        let mut r = ProtoReader::new(out.as_bytes());
        assert_eq!(r.delimited("head").unwrap(), head.as_bytes());
        assert_eq!(r.rest(), tail.as_bytes());
    }

    #[test]
    fn test_truncated_length() {
        let mut r = ProtoReader::new(&[0x0A, 0x05, b'a']);
        assert!(matches!(
            r.next_field("short"),
            Err(BytecodeError::Truncated("short"))
        ));
    }
}
