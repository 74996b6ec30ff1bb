//! Modified UTF-8, the string encoding of class-file `CONSTANT_Utf8` entries.
//!
//! Differs from UTF-8 in two ways: U+0000 is written as `C0 80`, and
//! supplementary characters are written as two 3-byte surrogates.

use crate::error::{BytecodeError, BytecodeResult};

/// Number of bytes `unit` occupies in modified UTF-8.
fn unit_len(unit: u16) -> usize {
    match unit {
        0x0001..=0x007f => 1,
        0x0000 | 0x0080..=0x07ff => 2,
        _ => 3,
    }
}

/// Encoded length of `s` in modified UTF-8.
#[must_use]
pub fn encoded_len(s: &str) -> usize {
    s.encode_utf16().map(unit_len).sum()
}

/// Encode `s` as modified UTF-8.
#[must_use]
// Safety: shifts of a u16 by at most 12 bits cannot overflow.
#[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit_len(unit) {
            1 => out.push(unit as u8),
            2 => {
                out.push(0xc0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            },
            _ => {
                out.push(0xe0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            },
        }
    }
    out
}

/// Decode modified UTF-8 into a Rust string.
///
/// # Errors
///
/// Returns [`BytecodeError::InvalidUtf8`] for malformed sequences and for
/// unpaired surrogates, which a Rust `String` cannot hold.
// Safety: each shifted value is masked to fit its position in a u16.
#[allow(clippy::arithmetic_side_effects)]
pub fn decode(bytes: &[u8]) -> BytecodeResult<String> {
    const WHAT: &str = "CONSTANT_Utf8";
    let mut units = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();
    while let Some(b0) = iter.next() {
        let unit = match b0 {
            0x01..=0x7f => u16::from(b0),
            0xc0..=0xdf => {
                let b1 = continuation(iter.next())?;
                (u16::from(b0 & 0x1f) << 6) | b1
            },
            0xe0..=0xef => {
                let b1 = continuation(iter.next())?;
                let b2 = continuation(iter.next())?;
                (u16::from(b0 & 0x0f) << 12) | (b1 << 6) | b2
            },
            _ => return Err(BytecodeError::InvalidUtf8(WHAT)),
        };
        units.push(unit);
    }
    String::from_utf16(&units).map_err(|_| BytecodeError::InvalidUtf8(WHAT))
}

fn continuation(byte: Option<u8>) -> BytecodeResult<u16> {
    match byte {
        Some(b) if b & 0xc0 == 0x80 => Ok(u16::from(b & 0x3f)),
        _ => Err(BytecodeError::InvalidUtf8("CONSTANT_Utf8")),
    }
}
