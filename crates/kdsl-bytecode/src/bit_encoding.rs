//! Packing of binary metadata into the `d1` string array.
//!
//! Bytes are regrouped into 7-bit units (least significant bit first), each
//! unit is incremented by one modulo 128 so that the frequent zero unit does
//! not cost two bytes in modified UTF-8, and the result is split into strings
//! whose modified UTF-8 form fits a `CONSTANT_Utf8` entry.
//!
//! The decoder also accepts the UTF-8 mode of newer compilers, where the first
//! string starts with `\u{0}` and every following char is one byte.

use crate::error::{BytecodeError, BytecodeResult};

/// Largest modified UTF-8 length of one `CONSTANT_Utf8` entry.
pub const MAX_UTF8_INFO_LENGTH: usize = 65535;

const UTF8_MODE_MARKER: char = '\u{0}';
const EIGHT_TO_SEVEN_MODE_MARKER: char = '\u{ffff}';

/// Encode `data` into `d1` strings.
#[must_use]
pub fn encode_bytes(data: &[u8]) -> Vec<String> {
    let mut units = encode_8to7(data);
    for unit in &mut units {
        *unit = unit.wrapping_add(1) & 0x7f;
    }

    // A leading zero unit would read as the UTF-8 mode marker.
    let needs_marker = units.first() == Some(&0);
    split_to_strings(&units, needs_marker)
}

/// Decode `d1` strings back into bytes.
///
/// # Errors
///
/// Returns [`BytecodeError::Malformed`] if a char is out of range for the
/// detected mode.
pub fn decode_bytes<S: AsRef<str>>(data: &[S]) -> BytecodeResult<Vec<u8>> {
    let first = data.first().and_then(|s| s.as_ref().chars().next());
    let mut chars = data.iter().flat_map(|s| s.as_ref().chars());

    match first {
        Some(UTF8_MODE_MARKER) => {
            chars.next();
            return chars.map(|c| char_to_byte(c, 0xff)).collect();
        },
        Some(EIGHT_TO_SEVEN_MODE_MARKER) => {
            chars.next();
        },
        _ => {},
    }

    let units = chars
        .map(|c| char_to_byte(c, 0x7f).map(|b| b.wrapping_add(0x7f) & 0x7f))
        .collect::<BytecodeResult<Vec<u8>>>()?;
    Ok(decode_7to8(&units))
}

fn char_to_byte(c: char, max: u32) -> BytecodeResult<u8> {
    let code = u32::from(c);
    if code > max {
        return Err(BytecodeError::malformed(
            "d1",
            format!("char U+{code:04X} out of range"),
        ));
    }
    u8::try_from(code).map_err(|_| BytecodeError::malformed("d1", "char out of range"))
}

// Safety: the accumulator never holds more than 14 bits, so shifts stay in
// range; bit counters are bounded by 15.
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
fn encode_8to7(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len().saturating_mul(8).div_ceil(7));
    let mut acc = 0_u32;
    let mut bits = 0_u32;
    for byte in data {
        acc |= u32::from(*byte) << bits;
        bits += 8;
        while bits >= 7 {
            out.push((acc & 0x7f) as u8);
            acc >>= 7;
            bits -= 7;
        }
    }
    if bits > 0 {
        out.push((acc & 0x7f) as u8);
    }
    out
}

// Safety: the accumulator never holds more than 14 bits, so shifts stay in
// range; bit counters are bounded by 15.
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
fn decode_7to8(units: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(units.len().saturating_mul(7) / 8);
    let mut acc = 0_u32;
    let mut bits = 0_u32;
    for unit in units {
        acc |= u32::from(unit & 0x7f) << bits;
        bits += 7;
        if bits >= 8 {
            out.push((acc & 0xff) as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    out
}

fn split_to_strings(units: &[u8], with_marker: bool) -> Vec<String> {
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut current_len = 0_usize;
    if with_marker {
        current.push(EIGHT_TO_SEVEN_MODE_MARKER);
        // U+FFFF takes three bytes in modified UTF-8.
        current_len = 3;
    }
    for unit in units {
        let cost = if *unit == 0 { 2 } else { 1 };
        if current_len.saturating_add(cost) > MAX_UTF8_INFO_LENGTH {
            strings.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push(char::from(*unit));
        current_len = current_len.saturating_add(cost);
    }
    if !current.is_empty() {
        strings.push(current);
    }
    strings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutf8;

    #[test]
    fn test_empty_input() {
        assert!(encode_bytes(&[]).is_empty());
        assert!(decode_bytes::<String>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_group_counts_at_boundaries() {
        // ceil(8n / 7) units
        assert_eq!(encode_8to7(&[0xff]).len(), 2);
        assert_eq!(encode_8to7(&[0; 7]).len(), 8);
        assert_eq!(encode_8to7(&[0; 8]).len(), 10);
    }

    #[test]
    fn test_shifted_units_are_never_zero_for_zero_input() {
        let strings = encode_bytes(&[0; 16]);
        assert_eq!(strings.len(), 1);
        assert!(strings[0].chars().all(|c| c == '\u{1}'));
    }

    #[test]
    fn test_round_trip_all_byte_values() {
        let data: Vec<u8> = (0..=255).collect();
        for len in [1, 6, 7, 8, 9, 255, 256] {
            let slice = &data[..len];
            assert_eq!(decode_bytes(&encode_bytes(slice)).unwrap(), slice, "len {len}");
        }
    }

    #[test]
    fn test_leading_zero_unit_gets_marker() {
        // 0x7f shifts to 0 in the first unit.
        let strings = encode_bytes(&[0x7f, 0x00]);
        assert!(strings[0].starts_with(EIGHT_TO_SEVEN_MODE_MARKER));
        assert_eq!(decode_bytes(&strings).unwrap(), vec![0x7f, 0x00]);
    }

    #[test]
    fn test_split_respects_utf8_limit() {
        // 0x7f bytes produce many zero units, each costing two bytes.
        let data = vec![0xff_u8; 70_000];
        let strings = encode_bytes(&data);
        assert!(strings.len() > 1);
        for s in &strings {
            assert!(mutf8::encoded_len(s) <= MAX_UTF8_INFO_LENGTH);
        }
        assert_eq!(decode_bytes(&strings).unwrap(), data);
    }

    #[test]
    fn test_utf8_mode_is_accepted() {
        let strings = vec!["\u{0}ab".to_string(), "\u{ff}".to_string()];
        assert_eq!(decode_bytes(&strings).unwrap(), vec![b'a', b'b', 0xff]);
    }

    #[test]
    fn test_out_of_range_char_rejected() {
        let strings = vec!["a\u{100}".to_string()];
        assert!(decode_bytes(&strings).is_err());
    }
}
